//! Configuration consumed by the deploy scripts: the secrets file, the
//! network profiles, and the deployment parameters
//!
//! All configuration is validated once, up front, so that a misconfigured
//! run fails before any transaction is sent.

use std::{
    fmt::{self, Display},
    fs,
    path::Path,
    str::FromStr,
};

use alloy::{
    primitives::{
        utils::{parse_units, ParseUnits},
        Address, U256,
    },
    signers::local::PrivateKeySigner,
};
use clap::ValueEnum;
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    cli::DeployArgs,
    constants::{
        ALCHEMY_MAINNET_URL, ALCHEMY_RINKEBY_URL, BLOCK_GAS_LIMIT, MAINNET_FORK_BLOCK,
        MAX_PERCENT, REWARD_RATE_DECIMALS, RINKEBY_ETHERSCAN_API_URL,
    },
    errors::ScriptError,
};

// -----------
// | Secrets |
// -----------

/// The secrets file as it appears on disk, before validation
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawSecrets {
    /// Alchemy API key
    alchemy_key: Option<String>,
    /// Hex-encoded signing keys
    keys: Option<Vec<String>>,
    /// CoinMarketCap API key
    coinmarketcap_key: Option<String>,
    /// Etherscan API key
    etherscan_api_key: Option<String>,
}

/// Validated secrets
pub struct Secrets {
    /// API key for the Alchemy RPC provider
    pub alchemy_key: String,
    /// Signing keys, in order; the first one deploys
    pub signers: Vec<PrivateKeySigner>,
    /// API key for the CoinMarketCap price feed, used in gas cost reports
    pub coinmarketcap_key: String,
    /// API key for the Etherscan explorer
    pub etherscan_api_key: String,
}

impl Secrets {
    /// Read & validate the secrets file at the given path
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ScriptError::Config(format!("cannot read secrets file {}: {}", path.display(), e))
        })?;

        Self::from_json(&contents)
    }

    /// Parse & validate secrets from their JSON representation.
    ///
    /// Every missing or empty field is reported in a single error.
    pub fn from_json(contents: &str) -> Result<Self, ScriptError> {
        let raw: RawSecrets = serde_json::from_str(contents)
            .map_err(|e| ScriptError::Config(format!("malformed secrets file: {}", e)))?;

        let alchemy_key = raw.alchemy_key.filter(|k| !k.is_empty());
        let keys = raw.keys.filter(|k| !k.is_empty());
        let coinmarketcap_key = raw.coinmarketcap_key.filter(|k| !k.is_empty());
        let etherscan_api_key = raw.etherscan_api_key.filter(|k| !k.is_empty());

        let missing = [
            ("alchemyKey", alchemy_key.is_none()),
            ("keys", keys.is_none()),
            ("coinmarketcapKey", coinmarketcap_key.is_none()),
            ("etherscanApiKey", etherscan_api_key.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, is_missing)| is_missing.then_some(field))
        .collect_vec();

        match (alchemy_key, keys, coinmarketcap_key, etherscan_api_key) {
            (Some(alchemy_key), Some(keys), Some(coinmarketcap_key), Some(etherscan_api_key)) => {
                let signers = keys
                    .iter()
                    .enumerate()
                    .map(|(i, key)| {
                        PrivateKeySigner::from_str(key).map_err(|e| {
                            ScriptError::Config(format!("malformed signing key #{}: {}", i, e))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Self {
                    alchemy_key,
                    signers,
                    coinmarketcap_key,
                    etherscan_api_key,
                })
            }
            _ => Err(ScriptError::Config(format!(
                "missing required secrets: {}",
                missing.iter().join(", ")
            ))),
        }
    }

    /// The signer that sends the deployment transactions
    pub fn deployer(&self) -> &PrivateKeySigner {
        // `from_json` rejects an empty key list
        &self.signers[0]
    }
}

// ------------
// | Networks |
// ------------

/// The networks the scripts can run against
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Network {
    /// A local anvil node forked from Ethereum mainnet at a pinned block
    LocalFork,
    /// The Rinkeby testnet
    Rinkeby,
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::LocalFork => write!(f, "local-fork"),
            Network::Rinkeby => write!(f, "rinkeby"),
        }
    }
}

/// The connection settings selected by a [`Network`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    /// The RPC endpoint; for a fork, the endpoint forked from
    pub rpc_url: String,
    /// The block a local fork is pinned at, `None` for remote networks
    pub fork_block: Option<u64>,
    /// The block gas limit of the chain
    pub block_gas_limit: u64,
    /// The Etherscan API endpoint, if the network has an explorer
    pub explorer_api_url: Option<String>,
}

impl Network {
    /// Resolve the connection settings for this network
    pub fn profile(&self, secrets: &Secrets) -> NetworkProfile {
        match self {
            Network::LocalFork => NetworkProfile {
                rpc_url: format!("{}{}", ALCHEMY_MAINNET_URL, secrets.alchemy_key),
                fork_block: Some(MAINNET_FORK_BLOCK),
                block_gas_limit: BLOCK_GAS_LIMIT,
                explorer_api_url: None,
            },
            Network::Rinkeby => NetworkProfile {
                rpc_url: format!("{}{}", ALCHEMY_RINKEBY_URL, secrets.alchemy_key),
                fork_block: None,
                block_gas_limit: BLOCK_GAS_LIMIT,
                explorer_api_url: Some(RINKEBY_ETHERSCAN_API_URL.to_string()),
            },
        }
    }
}

// -------------------------
// | Deployment Parameters |
// -------------------------

/// The parameters the staking pool & funder are initialized with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentParams {
    /// The liquidity protection contract
    pub liquidity_protection: Address,
    /// The liquidity protection store contract
    pub liquidity_protection_store: Address,
    /// The DAPP/BNT pool anchor
    pub anchor: Address,
    /// The staked token
    pub staked_token: Address,
    /// The reward token
    pub reward_token: Address,
    /// The block at which rewards start, `None` for the chain height at deploy time
    pub start_block: Option<u64>,
    /// Reward tokens per block, scaled by `10^REWARD_RATE_DECIMALS`
    pub reward_rate_per_block: U256,
    /// The impermanent loss protection recipient of the funder
    pub il_protection: Address,
    /// The percentage of the funder's allocation initially directed to rewards
    pub funder_rewards_percent: u8,
    /// The address that takes ownership of the proxy admin
    pub custodian: Address,
}

impl DeploymentParams {
    /// Validate the CLI deployment arguments
    pub fn from_args(args: &DeployArgs) -> Result<Self, ScriptError> {
        if args.funder_rewards_percent > MAX_PERCENT {
            return Err(ScriptError::Config(format!(
                "funder rewards percent must be at most {}, got {}",
                MAX_PERCENT, args.funder_rewards_percent
            )));
        }

        Ok(Self {
            liquidity_protection: parse_address("liquidity protection", &args.liquidity_protection)?,
            liquidity_protection_store: parse_address(
                "liquidity protection store",
                &args.liquidity_protection_store,
            )?,
            anchor: parse_address("anchor", &args.anchor)?,
            staked_token: parse_address("staked token", &args.staked_token)?,
            reward_token: parse_address("reward token", &args.reward_token)?,
            start_block: args.start_block,
            reward_rate_per_block: parse_reward_rate(&args.reward_rate_per_block)?,
            il_protection: parse_address("IL protection", &args.il_protection)?,
            funder_rewards_percent: args.funder_rewards_percent,
            custodian: parse_address("custodian", &args.custodian)?,
        })
    }
}

/// Parse a hex address, naming the offending parameter on failure
pub fn parse_address(name: &str, value: &str) -> Result<Address, ScriptError> {
    Address::from_str(value)
        .map_err(|e| ScriptError::Config(format!("invalid {} address {:?}: {}", name, value, e)))
}

/// Parse a decimal reward rate into its fixed precision representation
pub fn parse_reward_rate(value: &str) -> Result<U256, ScriptError> {
    let invalid = |reason: String| {
        ScriptError::Config(format!("invalid reward rate {:?}: {}", value, reason))
    };

    if let Some((_, fraction)) = value.split_once('.') {
        if fraction.len() > REWARD_RATE_DECIMALS as usize {
            return Err(invalid(format!(
                "at most {} decimal places are supported",
                REWARD_RATE_DECIMALS
            )));
        }
    }

    match parse_units(value, REWARD_RATE_DECIMALS).map_err(|e| invalid(e.to_string()))? {
        ParseUnits::U256(rate) => Ok(rate),
        ParseUnits::I256(_) => Err(invalid("must be non-negative".to_string())),
    }
}
