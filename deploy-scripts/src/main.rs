use clap::Parser;
use staking_deploy::{
    cli::Cli, config::Secrets, constants::DEFAULT_LOG_FILTER, errors::ScriptError,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        secrets,
        network,
        project_root,
        abi_dir,
        command,
    } = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let res = match Secrets::load(&secrets) {
        Ok(secrets) => command.run(&secrets, network, project_root, abi_dir).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &res {
        error!("{}", e);
    }

    res
}
