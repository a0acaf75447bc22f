//! Implementations of the various deploy scripts

use std::path::PathBuf;

use tracing::info;

use crate::{
    cli::{DeployArgs, VerifyArgs},
    clients::{AlloyChain, Clients, Compiler, EtherscanVerifier, ForgeCompiler, SourceVerifier},
    config::{parse_address, DeploymentParams, Network, Secrets},
    errors::ScriptError,
    sequencer::{self, DeployOptions},
    types::VerificationRequest,
    utils::setup_provider,
};

/// Build the verifier for the given network
fn etherscan_verifier(secrets: &Secrets, network: Network) -> EtherscanVerifier {
    EtherscanVerifier::new(
        network.profile(secrets).explorer_api_url,
        secrets.etherscan_api_key.clone(),
        network.to_string(),
    )
}

/// Run the full deployment against the given network
pub async fn deploy(
    args: DeployArgs,
    secrets: &Secrets,
    network: Network,
    project_root: PathBuf,
    abi_dir: PathBuf,
) -> Result<(), ScriptError> {
    let params = DeploymentParams::from_args(&args)?;
    let profile = network.profile(secrets);
    info!("Deploying to {}", network);

    let provider = setup_provider(&profile, secrets).await?;
    let clients = Clients {
        compiler: ForgeCompiler::new(project_root, Some(abi_dir)),
        chain: AlloyChain::new(provider),
        verifier: etherscan_verifier(secrets, network),
    };
    let options = DeployOptions {
        deployments_path: args.deployments_path,
        skip_verification: args.skip_verification,
    };

    let outcome = sequencer::deploy(&params, &clients, &options).await?;
    info!(
        "Deployment complete: staking pool {:#x}, funder {:#x}, proxy admin {:#x} owned by {:#x}",
        outcome.staking_pool.proxy, outcome.funder.proxy, outcome.proxy_admin, outcome.custodian
    );

    Ok(())
}

/// Compile the contracts & export their ABIs
pub async fn compile(project_root: PathBuf, abi_dir: PathBuf) -> Result<(), ScriptError> {
    let output = ForgeCompiler::new(project_root, Some(abi_dir)).compile().await?;
    info!("Compiled {} contracts", output.contracts.len());

    Ok(())
}

/// Verify the source of a single deployed contract
pub async fn verify(
    args: VerifyArgs,
    secrets: &Secrets,
    network: Network,
    project_root: PathBuf,
    abi_dir: PathBuf,
) -> Result<(), ScriptError> {
    let address = parse_address("address", &args.address)?;

    let output = ForgeCompiler::new(project_root, Some(abi_dir)).compile().await?;
    let contract = output.contract(args.contract)?;
    let request = VerificationRequest::new(address, contract);

    etherscan_verifier(secrets, network).verify(&request).await
}
