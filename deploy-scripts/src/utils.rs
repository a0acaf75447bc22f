//! Utilities for the deploy scripts.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    sol_types::SolCall,
    transports::http::reqwest::Url,
};
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::{
    config::{DeploymentParams, NetworkProfile, Secrets},
    constants::DEPLOYMENTS_KEY,
    errors::ScriptError,
    solidity::{IDappStakingPool, IFunder},
    types::CompiledContract,
};

// -------------
// | Providers |
// -------------

/// Sets up the provider through which all transactions are sent.
///
/// For a forking profile this spawns a local anvil node pinned at the
/// profile's fork block, signing with anvil's default accounts. Otherwise
/// the provider connects over HTTP and signs with the first secrets key.
pub async fn setup_provider(
    profile: &NetworkProfile,
    secrets: &Secrets,
) -> Result<DynProvider, ScriptError> {
    let provider = match profile.fork_block {
        Some(fork_block) => {
            let fork_url = profile.rpc_url.clone();
            let gas_limit = profile.block_gas_limit;
            let provider = ProviderBuilder::new()
                .connect_anvil_with_wallet_and_config(|anvil| {
                    anvil
                        .fork(fork_url)
                        .fork_block_number(fork_block)
                        .arg("--gas-limit")
                        .arg(gas_limit.to_string())
                })
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

            DynProvider::new(provider)
        }
        None => {
            let url = Url::parse(&profile.rpc_url)
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
            let provider = ProviderBuilder::new()
                .wallet(secrets.deployer().clone())
                .connect_http(url);

            DynProvider::new(provider)
        }
    };

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    debug!("Connected to chain {}", chain_id);

    Ok(provider)
}

/// Extract the address held in the low 20 bytes of a storage slot
pub fn address_from_slot(value: U256) -> Address {
    Address::from_word(B256::from(value.to_be_bytes::<32>()))
}

// ------------
// | Calldata |
// ------------

/// Prepare calldata for the staking pool contract's `initialize` method
pub fn staking_pool_initialize_calldata(params: &DeploymentParams, start_block: u64) -> Bytes {
    IDappStakingPool::initializeCall {
        liquidityProtection: params.liquidity_protection,
        liquidityProtectionStore: params.liquidity_protection_store,
        dappBntAnchor: params.anchor,
        dappToken: params.staked_token,
        bntToken: params.reward_token,
        startBlock: U256::from(start_block),
        dappPerBlock: params.reward_rate_per_block,
    }
    .abi_encode()
    .into()
}

/// Prepare calldata for the funder contract's `initialize` method
pub fn funder_initialize_calldata(params: &DeploymentParams, staking_pool: Address) -> Bytes {
    IFunder::initializeCall {
        dappStakingPool: staking_pool,
        dappILProtection: params.il_protection,
        percentToRewards: U256::from(params.funder_rewards_percent),
    }
    .abi_encode()
    .into()
}

// ---------
// | Files |
// ---------

/// Read & parse a JSON file
pub fn get_json_from_file(file_path: &Path) -> Result<Value, ScriptError> {
    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {}", file_path.display(), e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {}", file_path.display(), e)))
}

/// Record a deployed address under the given key in a deployments file,
/// creating the file if it doesn't exist
pub fn write_deployed_address(
    file_path: &Path,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    // If the file doesn't exist, create it
    if !file_path.exists() {
        fs::write(file_path, "{}").map_err(|e| ScriptError::WriteFile(e.to_string()))?;
    }
    let mut parsed_json = get_json_from_file(file_path)?;

    parsed_json[DEPLOYMENTS_KEY][contract_key] = Value::String(format!("{address:#x}"));

    let contents = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::WriteFile(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteFile(e.to_string()))
}

/// Write each contract's ABI to `<abi_dir>/<name>.json`, returning the written paths
pub fn export_abis<'a>(
    abi_dir: &Path,
    contracts: impl IntoIterator<Item = &'a CompiledContract>,
) -> Result<Vec<PathBuf>, ScriptError> {
    fs::create_dir_all(abi_dir).map_err(|e| ScriptError::WriteFile(e.to_string()))?;

    contracts
        .into_iter()
        .map(|contract| {
            let path = abi_dir.join(format!("{}.json", contract.contract.artifact_name()));
            let abi = serde_json::to_string_pretty(&contract.abi)
                .map_err(|e| ScriptError::WriteFile(e.to_string()))?;
            fs::write(&path, abi).map_err(|e| ScriptError::WriteFile(e.to_string()))?;
            Ok(path)
        })
        .collect()
}

// ------------
// | Commands |
// ------------

/// Run a subprocess to completion, streaming its output, and error with
/// `err_msg` if it exits unsuccessfully
pub async fn command_success_or(mut cmd: Command, err_msg: &str) -> Result<(), ScriptError> {
    let status = cmd
        .status()
        .await
        .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;

    if !status.success() {
        Err(ScriptError::ContractCompilation(format!(
            "{} ({})",
            err_msg, status
        )))
    } else {
        Ok(())
    }
}
