//! The deployment sequencer: compiles, deploys & initializes the staking
//! pool and funder behind upgradeable proxies, hands the proxy admin over to
//! the custodian, and verifies both implementations.
//!
//! Every step is awaited before the next one starts and the first failure
//! aborts the run. Nothing is retried or rolled back; transactions sent
//! before a failure stay on-chain, and running again deploys a fresh set of
//! proxies.

use std::path::PathBuf;

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::{
    clients::{ChainClient, Clients, Compiler, SourceVerifier},
    config::DeploymentParams,
    constants::{
        FUNDER_IMPLEMENTATION_KEY, FUNDER_PROXY_KEY, PROXY_ADMIN_KEY, PROXY_ADMIN_OWNER_KEY,
        STAKING_POOL_IMPLEMENTATION_KEY, STAKING_POOL_PROXY_KEY,
    },
    errors::ScriptError,
    types::{Contract, DeploymentOutcome, ProxyDeployment, ProxyRecord, VerificationRequest},
    utils::{funder_initialize_calldata, staking_pool_initialize_calldata, write_deployed_address},
};

/// Options controlling a deployment run
#[derive(Clone, Debug, Default)]
pub struct DeployOptions {
    /// A `deployments.json` file in which addresses are recorded as they are deployed
    pub deployments_path: Option<PathBuf>,
    /// Log the verification requests instead of submitting them
    pub skip_verification: bool,
}

impl DeployOptions {
    /// Record an address in the deployments file, if one is configured
    fn record(&self, key: &str, address: Address) -> Result<(), ScriptError> {
        match &self.deployments_path {
            Some(path) => write_deployed_address(path, key, address),
            None => Ok(()),
        }
    }
}

/// Run the full deployment sequence
pub async fn deploy<C, R, V>(
    params: &DeploymentParams,
    clients: &Clients<C, R, V>,
    options: &DeployOptions,
) -> Result<DeploymentOutcome, ScriptError>
where
    C: Compiler,
    R: ChainClient,
    V: SourceVerifier,
{
    // Compile
    info!("Compiling contracts...");
    let compilation = clients.compiler.compile().await?;
    let proxy_admin_artifact = compilation.contract(Contract::ProxyAdmin)?;
    let proxy_artifact = compilation.contract(Contract::TransparentUpgradeableProxy)?;
    let staking_pool_artifact = compilation.contract(Contract::StakingPool)?;
    let funder_artifact = compilation.contract(Contract::Funder)?;

    // Deploy the staking pool
    let start_block = match params.start_block {
        Some(start_block) => start_block,
        None => clients.chain.block_number().await?,
    };
    let staking_pool_proxy = clients
        .chain
        .deploy_proxy(
            ProxyDeployment {
                implementation: staking_pool_artifact,
                proxy_admin: proxy_admin_artifact,
                proxy: proxy_artifact,
            },
            staking_pool_initialize_calldata(params, start_block),
        )
        .await?;
    info!("Staking pool proxy deployed to: {:#x}", staking_pool_proxy);
    options.record(STAKING_POOL_PROXY_KEY, staking_pool_proxy)?;

    // Deploy the funder, pointed at the staking pool proxy
    let funder_proxy = clients
        .chain
        .deploy_proxy(
            ProxyDeployment {
                implementation: funder_artifact,
                proxy_admin: proxy_admin_artifact,
                proxy: proxy_artifact,
            },
            funder_initialize_calldata(params, staking_pool_proxy),
        )
        .await?;
    info!("Funder proxy deployed to: {:#x}", funder_proxy);
    options.record(FUNDER_PROXY_KEY, funder_proxy)?;

    // Hand the proxy admin over to the custodian. After this the deployer can
    // no longer upgrade either proxy.
    info!("Transferring ownership of ProxyAdmin...");
    let proxy_admin = clients
        .chain
        .transfer_proxy_admin_ownership(params.custodian)
        .await?;
    info!(
        "Transferred ownership of ProxyAdmin {:#x} to: {:#x}",
        proxy_admin, params.custodian
    );
    options.record(PROXY_ADMIN_KEY, proxy_admin)?;
    options.record(PROXY_ADMIN_OWNER_KEY, params.custodian)?;

    // Resolve the implementations
    let staking_pool = ProxyRecord {
        proxy: staking_pool_proxy,
        implementation: clients
            .chain
            .implementation_address(staking_pool_proxy)
            .await?,
    };
    let funder = ProxyRecord {
        proxy: funder_proxy,
        implementation: clients.chain.implementation_address(funder_proxy).await?,
    };
    options.record(STAKING_POOL_IMPLEMENTATION_KEY, staking_pool.implementation)?;
    options.record(FUNDER_IMPLEMENTATION_KEY, funder.implementation)?;

    // Verify
    info!("Verifying on etherscan...");
    info!("Staking pool contract: {:#x}", staking_pool.implementation);
    info!("Funder contract: {:#x}", funder.implementation);

    let requests = [
        VerificationRequest::new(staking_pool.implementation, staking_pool_artifact),
        VerificationRequest::new(funder.implementation, funder_artifact),
    ];
    for request in &requests {
        if options.skip_verification {
            warn!(
                "Skipping verification of {} at {:#x}",
                request.contract_name, request.address
            );
            continue;
        }

        clients.verifier.verify(request).await?;
    }

    Ok(DeploymentOutcome {
        staking_pool,
        funder,
        proxy_admin,
        custodian: params.custodian,
        start_block,
    })
}
