//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{compile, deploy, verify},
    config::{Network, Secrets},
    constants::{
        DEFAULT_ABI_DIR, DEFAULT_ANCHOR, DEFAULT_CUSTODIAN, DEFAULT_IL_PROTECTION,
        DEFAULT_LIQUIDITY_PROTECTION, DEFAULT_LIQUIDITY_PROTECTION_STORE,
        DEFAULT_REWARD_RATE_PER_BLOCK, DEFAULT_REWARD_TOKEN, DEFAULT_SECRETS_PATH,
        DEFAULT_STAKED_TOKEN,
    },
    errors::ScriptError,
    types::Contract,
};

/// Deploy the DAPP staking pool & funder behind upgradeable proxies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the secrets file holding API keys & signing keys
    #[arg(long, env = "DEPLOY_SECRETS", default_value = DEFAULT_SECRETS_PATH)]
    pub secrets: PathBuf,

    /// The network profile to run against
    #[arg(short, long, value_enum, default_value_t = Network::LocalFork)]
    pub network: Network,

    /// Root directory of the contracts project
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Directory to which contract ABIs are exported after compiling
    #[arg(long, default_value = DEFAULT_ABI_DIR)]
    pub abi_dir: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available deploy script commands
#[derive(Subcommand)]
pub enum Command {
    /// Compile, deploy, hand over & verify both contracts
    Deploy(DeployArgs),
    /// Compile the contracts & export their ABIs
    Compile,
    /// Submit a single deployed contract for source verification
    Verify(VerifyArgs),
}

impl Command {
    /// Run the command against the given network
    pub async fn run(
        self,
        secrets: &Secrets,
        network: Network,
        project_root: PathBuf,
        abi_dir: PathBuf,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => {
                deploy(args, secrets, network, project_root, abi_dir).await
            }
            Command::Compile => compile(project_root, abi_dir).await,
            Command::Verify(args) => {
                verify(args, secrets, network, project_root, abi_dir).await
            }
        }
    }
}

/// Deploy the staking pool & funder behind upgradeable proxies, transfer
/// ownership of the proxy admin to the custodian, and verify both
/// implementations.
///
/// Concretely, each proxy is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/3.x/api/proxy#TransparentUpgradeableProxy)
/// administered by a single `ProxyAdmin` deployed alongside the first proxy.
///
/// Every run deploys brand new proxies; nothing from a previous run is reused.
#[derive(Args)]
pub struct DeployArgs {
    /// Liquidity protection contract address in hex
    #[arg(long, default_value = DEFAULT_LIQUIDITY_PROTECTION)]
    pub liquidity_protection: String,

    /// Liquidity protection store contract address in hex
    #[arg(long, default_value = DEFAULT_LIQUIDITY_PROTECTION_STORE)]
    pub liquidity_protection_store: String,

    /// DAPP/BNT anchor address in hex
    #[arg(long, default_value = DEFAULT_ANCHOR)]
    pub anchor: String,

    /// Staked (DAPP) token address in hex
    #[arg(long, default_value = DEFAULT_STAKED_TOKEN)]
    pub staked_token: String,

    /// Reward (BNT) token address in hex
    #[arg(long, default_value = DEFAULT_REWARD_TOKEN)]
    pub reward_token: String,

    /// Block at which rewards start, defaults to the current chain height
    #[arg(long)]
    pub start_block: Option<u64>,

    /// Reward tokens emitted per block, as a decimal with at most 4 places
    #[arg(long, default_value = DEFAULT_REWARD_RATE_PER_BLOCK)]
    pub reward_rate_per_block: String,

    /// Impermanent loss protection address in hex, receiving the funder
    /// allocation not directed to rewards
    #[arg(long, default_value = DEFAULT_IL_PROTECTION)]
    pub il_protection: String,

    /// Percentage of the funder's allocation initially directed to rewards
    #[arg(long, default_value_t = 0)]
    pub funder_rewards_percent: u8,

    /// Address that takes ownership of the proxy admin
    #[arg(long, default_value = DEFAULT_CUSTODIAN)]
    pub custodian: String,

    /// Path to a `deployments.json` file in which deployed addresses are recorded
    #[arg(short, long)]
    pub deployments_path: Option<PathBuf>,

    /// Log the verification requests instead of submitting them
    #[arg(long)]
    pub skip_verification: bool,
}

/// Verify the source of an already deployed contract
#[derive(Args)]
pub struct VerifyArgs {
    /// Address of the deployed contract in hex
    #[arg(short, long)]
    pub address: String,

    /// Which contract is deployed at the address
    #[arg(short, long)]
    pub contract: Contract,
}
