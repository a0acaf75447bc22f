//! Constants used in the deploy scripts

use alloy::primitives::{b256, B256};

// -----------
// | Proxies |
// -----------

/// The storage slot containing the implementation address in an upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The number of confirmations to wait for on each transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The name of the staking pool contract artifact
pub const STAKING_POOL_ARTIFACT: &str = "DappStakingPool";

/// The name of the funder contract artifact
pub const FUNDER_ARTIFACT: &str = "Funder";

/// The name of the proxy admin contract artifact
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v3.4.0/contracts/proxy/ProxyAdmin.sol
pub const PROXY_ADMIN_ARTIFACT: &str = "ProxyAdmin";

/// The name of the transparent upgradeable proxy contract artifact
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v3.4.0/contracts/proxy/TransparentUpgradeableProxy.sol
pub const PROXY_ARTIFACT: &str = "TransparentUpgradeableProxy";

// --------------------------
// | Deployment Parameters |
// --------------------------

/// The decimal precision of the per-block reward rate
pub const REWARD_RATE_DECIMALS: u8 = 4;

/// The largest allocation percentage the funder accepts
pub const MAX_PERCENT: u8 = 100;

/// Default liquidity protection contract address
pub const DEFAULT_LIQUIDITY_PROTECTION: &str = "0xa10a7ba303a4b635d28c0ad9e0317f2962a7c907";

/// Default liquidity protection store contract address
pub const DEFAULT_LIQUIDITY_PROTECTION_STORE: &str = "0xa10a7ba303a4b635d28c0ad9e0317f2962a7c907";

/// Default DAPP/BNT anchor address
pub const DEFAULT_ANCHOR: &str = "0xa10a7ba303a4b635d28c0ad9e0317f2962a7c907";

/// Default staked (DAPP) token address
pub const DEFAULT_STAKED_TOKEN: &str = "0xa10a7ba303a4b635d28c0ad9e0317f2962a7c907";

/// Default reward (BNT) token address
pub const DEFAULT_REWARD_TOKEN: &str = "0xa10a7ba303a4b635d28c0ad9e0317f2962a7c907";

/// Default per-block reward rate, 20.5 tokens per block
pub const DEFAULT_REWARD_RATE_PER_BLOCK: &str = "20.5";

/// Default impermanent loss protection address, which receives every
/// funder allocation not directed to rewards
pub const DEFAULT_IL_PROTECTION: &str = "0x939b462ee3311f8926c047d2b576c389092b1649";

/// Default custodian (multisig) that takes ownership of the proxy admin
pub const DEFAULT_CUSTODIAN: &str = "0x5288d36112fe21be1a24b236be887C90c3AE7090";

// ------------
// | Networks |
// ------------

/// The Alchemy Ethereum mainnet endpoint, without the API key
pub const ALCHEMY_MAINNET_URL: &str = "https://eth-mainnet.alchemyapi.io/v2/";

/// The Alchemy Rinkeby endpoint, without the API key
pub const ALCHEMY_RINKEBY_URL: &str = "https://eth-rinkeby.alchemyapi.io/v2/";

/// The mainnet block at which the local fork is pinned
pub const MAINNET_FORK_BLOCK: u64 = 12_786_615;

/// The block gas limit used on every network profile
pub const BLOCK_GAS_LIMIT: u64 = 12_000_000;

/// The Etherscan API endpoint for Rinkeby
pub const RINKEBY_ETHERSCAN_API_URL: &str = "https://api-rinkeby.etherscan.io/api";

// -------------
// | Toolchain |
// -------------

/// The name of the `forge` command
pub const FORGE_COMMAND: &str = "forge";

/// The name of the build command
pub const BUILD_COMMAND: &str = "build";

/// The solc version the contracts are compiled with
pub const SOLC_VERSION: &str = "0.6.12";

/// The number of optimizer runs the contracts are compiled with
pub const OPTIMIZER_RUNS: u32 = 2000;

/// The name of the compilation output directory
pub const OUT_PATH_SEGMENT: &str = "out";

/// The name of the build info directory within the output directory
pub const BUILD_INFO_PATH_SEGMENT: &str = "build-info";

/// The extension of artifact & build info files
pub const JSON_EXTENSION: &str = "json";

/// The default directory to which contract ABIs are exported
pub const DEFAULT_ABI_DIR: &str = "abi";

// ----------------
// | Verification |
// ----------------

/// The interval between verification status polls, in milliseconds
pub const VERIFICATION_POLL_INTERVAL_MS: u64 = 3_000;

/// The maximum number of verification status polls before giving up
pub const VERIFICATION_MAX_POLLS: usize = 20;

/// The code format under which standard JSON input is submitted
pub const STANDARD_JSON_CODE_FORMAT: &str = "solidity-standard-json-input";

// ----------------
// | Deployments |
// ----------------

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The staking pool proxy key in the `deployments.json` file
pub const STAKING_POOL_PROXY_KEY: &str = "staking_pool_proxy";

/// The staking pool implementation key in the `deployments.json` file
pub const STAKING_POOL_IMPLEMENTATION_KEY: &str = "staking_pool_implementation";

/// The funder proxy key in the `deployments.json` file
pub const FUNDER_PROXY_KEY: &str = "funder_proxy";

/// The funder implementation key in the `deployments.json` file
pub const FUNDER_IMPLEMENTATION_KEY: &str = "funder_implementation";

/// The proxy admin key in the `deployments.json` file
pub const PROXY_ADMIN_KEY: &str = "proxy_admin";

/// The proxy admin owner key in the `deployments.json` file
pub const PROXY_ADMIN_OWNER_KEY: &str = "proxy_admin_owner";

// -----------
// | General |
// -----------

/// The default location of the secrets file
pub const DEFAULT_SECRETS_PATH: &str = ".config.json";

/// The log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
