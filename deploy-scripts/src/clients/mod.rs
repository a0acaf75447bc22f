//! The external collaborators the deployment sequencer drives: the Solidity
//! toolchain, the chain (including the upgradeable proxy mechanism), and the
//! source verification service.
//!
//! Each is a trait so the sequencer can run against in-memory fakes.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::{
    errors::ScriptError,
    types::{CompilationOutput, ProxyDeployment, VerificationRequest},
};

pub mod chain;
pub mod compiler;
pub mod etherscan;

pub use chain::AlloyChain;
pub use compiler::ForgeCompiler;
pub use etherscan::EtherscanVerifier;

/// Compiles (or validates the compilation of) the contracts
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile the contracts project, returning the artifacts it produced
    async fn compile(&self) -> Result<CompilationOutput, ScriptError>;
}

/// Reads chain state & deploys / administers upgradeable proxies
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The current chain height
    async fn block_number(&self) -> Result<u64, ScriptError>;

    /// Deploy the implementation & a proxy in front of it, calling the
    /// implementation with `init_calldata` from the proxy's constructor.
    ///
    /// Resolves once the proxy's creation is confirmed, returning its address.
    async fn deploy_proxy(
        &self,
        deployment: ProxyDeployment<'_>,
        init_calldata: Bytes,
    ) -> Result<Address, ScriptError>;

    /// Transfer ownership of the proxy admin to `new_owner`, returning the
    /// proxy admin's address
    async fn transfer_proxy_admin_ownership(
        &self,
        new_owner: Address,
    ) -> Result<Address, ScriptError>;

    /// The implementation currently behind the given proxy
    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError>;
}

/// Submits deployed contracts for public source verification
#[async_trait]
pub trait SourceVerifier: Send + Sync {
    /// Submit a verification request and wait for its verdict
    async fn verify(&self, request: &VerificationRequest) -> Result<(), ScriptError>;
}

/// The client handles the sequencer is run with
pub struct Clients<C, R, V> {
    /// The contract compiler
    pub compiler: C,
    /// The chain client
    pub chain: R,
    /// The source verifier
    pub verifier: V,
}
