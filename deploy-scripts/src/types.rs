//! Type definitions used throughout the scripts

use std::{
    collections::HashMap,
    fmt::{self, Display},
    path::PathBuf,
};

use alloy::primitives::{Address, Bytes};
use clap::ValueEnum;
use serde_json::Value;

use crate::{
    constants::{FUNDER_ARTIFACT, PROXY_ADMIN_ARTIFACT, PROXY_ARTIFACT, STAKING_POOL_ARTIFACT},
    errors::ScriptError,
};

/// The contracts the scripts compile, deploy & verify
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Contract {
    /// The DAPP staking pool
    StakingPool,
    /// The funder, which splits incoming funds between rewards & IL protection
    Funder,
    /// The OpenZeppelin proxy admin
    ProxyAdmin,
    /// The OpenZeppelin transparent upgradeable proxy
    TransparentUpgradeableProxy,
}

impl Contract {
    /// Every contract the compile step must produce
    pub const ALL: [Contract; 4] = [
        Contract::StakingPool,
        Contract::Funder,
        Contract::ProxyAdmin,
        Contract::TransparentUpgradeableProxy,
    ];

    /// The name of the contract's compilation artifact
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Contract::StakingPool => STAKING_POOL_ARTIFACT,
            Contract::Funder => FUNDER_ARTIFACT,
            Contract::ProxyAdmin => PROXY_ADMIN_ARTIFACT,
            Contract::TransparentUpgradeableProxy => PROXY_ARTIFACT,
        }
    }
}

impl Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contract::StakingPool => write!(f, "staking-pool"),
            Contract::Funder => write!(f, "funder"),
            Contract::ProxyAdmin => write!(f, "proxy-admin"),
            Contract::TransparentUpgradeableProxy => write!(f, "transparent-upgradeable-proxy"),
        }
    }
}

/// A compiled contract, as loaded from the toolchain's artifacts
#[derive(Clone, Debug)]
pub struct CompiledContract {
    /// Which contract this is
    pub contract: Contract,
    /// The path of the source file defining the contract, relative to the project root
    pub source_path: String,
    /// The contract ABI
    pub abi: Value,
    /// The contract creation bytecode
    pub bytecode: Bytes,
    /// The compiler inputs of the build that produced this artifact
    pub source: SourceBundle,
}

impl CompiledContract {
    /// The fully qualified name of the contract, `<source path>:<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.source_path, self.contract.artifact_name())
    }
}

/// The compiler inputs a block explorer needs to reproduce a build
#[derive(Clone, Debug, PartialEq)]
pub struct SourceBundle {
    /// The full compiler version, e.g. `0.6.12+commit.27d51765`
    pub compiler_version: String,
    /// The standard JSON input the compiler was invoked with
    pub standard_json_input: Value,
}

/// The output of a successful compile step
#[derive(Clone, Debug)]
pub struct CompilationOutput {
    /// The compiled contracts
    pub contracts: HashMap<Contract, CompiledContract>,
    /// The directory ABIs were exported to, if any
    pub abi_dir: Option<PathBuf>,
}

impl CompilationOutput {
    /// Get a compiled contract, erroring if the build did not produce it
    pub fn contract(&self, contract: Contract) -> Result<&CompiledContract, ScriptError> {
        self.contracts.get(&contract).ok_or_else(|| {
            ScriptError::ContractCompilation(format!(
                "no artifact produced for {}",
                contract.artifact_name()
            ))
        })
    }
}

/// Everything needed to deploy one contract behind an upgradeable proxy
#[derive(Clone, Copy, Debug)]
pub struct ProxyDeployment<'a> {
    /// The implementation (logic) contract
    pub implementation: &'a CompiledContract,
    /// The proxy admin contract, deployed once and shared between proxies
    pub proxy_admin: &'a CompiledContract,
    /// The proxy contract
    pub proxy: &'a CompiledContract,
}

/// A deployed upgradeable proxy along with the implementation behind it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxyRecord {
    /// The address of the proxy
    pub proxy: Address,
    /// The address of the implementation the proxy delegates to
    pub implementation: Address,
}

/// A request to verify a deployed contract's source with a block explorer
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationRequest {
    /// The address of the deployed contract
    pub address: Address,
    /// The fully qualified contract name, `<source path>:<name>`
    pub contract_name: String,
    /// The sources & compiler settings of the build
    pub source: SourceBundle,
    /// ABI-encoded constructor arguments
    pub constructor_args: Bytes,
}

impl VerificationRequest {
    /// Build a verification request for a contract deployed without constructor arguments
    pub fn new(address: Address, contract: &CompiledContract) -> Self {
        Self {
            address,
            contract_name: contract.qualified_name(),
            source: contract.source.clone(),
            constructor_args: Bytes::new(),
        }
    }
}

/// The result of a completed deployment
#[derive(Clone, Copy, Debug)]
pub struct DeploymentOutcome {
    /// The staking pool proxy & implementation
    pub staking_pool: ProxyRecord,
    /// The funder proxy & implementation
    pub funder: ProxyRecord,
    /// The proxy admin shared by both proxies
    pub proxy_admin: Address,
    /// The new owner of the proxy admin
    pub custodian: Address,
    /// The block at which staking pool rewards start
    pub start_block: u64,
}
