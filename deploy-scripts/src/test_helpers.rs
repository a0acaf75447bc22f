//! Fixtures & in-memory client fakes for unit tests

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::primitives::{address, Address, Bytes, U256};
use async_trait::async_trait;
use serde_json::json;

use crate::{
    clients::{ChainClient, Clients, Compiler, SourceVerifier},
    config::DeploymentParams,
    errors::ScriptError,
    types::{
        CompilationOutput, CompiledContract, Contract, ProxyDeployment, SourceBundle,
        VerificationRequest,
    },
};

/// The chain height reported by [`FakeChain`]
pub const FAKE_BLOCK_NUMBER: u64 = 12_786_700;

/// The address of the proxy admin deployed by [`FakeChain`]
const FAKE_PROXY_ADMIN: Address = address!("00000000000000000000000000000000000000ad");

/// Deployment parameters resembling a mainnet deployment
pub fn test_params() -> DeploymentParams {
    DeploymentParams {
        liquidity_protection: address!("a10a7ba303a4b635d28c0ad9e0317f2962a7c907"),
        liquidity_protection_store: address!("00000000000000000000000000000000000000a1"),
        anchor: address!("00000000000000000000000000000000000000a2"),
        staked_token: address!("00000000000000000000000000000000000000a3"),
        reward_token: address!("00000000000000000000000000000000000000a4"),
        start_block: None,
        reward_rate_per_block: U256::from(205_000),
        il_protection: address!("939b462ee3311f8926c047d2b576c389092b1649"),
        funder_rewards_percent: 0,
        custodian: address!("5288d36112fe21be1a24b236be887C90c3AE7090"),
    }
}

/// A compiled contract with placeholder bytecode
pub fn compiled_contract(contract: Contract) -> CompiledContract {
    let name = contract.artifact_name();
    let source_path = match contract {
        Contract::StakingPool | Contract::Funder => format!("contracts/{name}.sol"),
        Contract::ProxyAdmin | Contract::TransparentUpgradeableProxy => {
            format!("@openzeppelin/contracts/proxy/{name}.sol")
        }
    };

    CompiledContract {
        contract,
        source_path,
        abi: json!([{ "type": "function", "name": "initialize", "inputs": [], "outputs": [] }]),
        bytecode: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]),
        source: source_bundle(),
    }
}

/// The source bundle of a solc 0.6.12 build
pub fn source_bundle() -> SourceBundle {
    SourceBundle {
        compiler_version: "0.6.12+commit.27d51765".to_string(),
        standard_json_input: json!({
            "language": "Solidity",
            "sources": { "contracts/DappStakingPool.sol": { "content": "" } },
            "settings": { "optimizer": { "enabled": true, "runs": 2000 } },
        }),
    }
}

/// A compilation producing every contract
pub fn compilation_output() -> CompilationOutput {
    CompilationOutput {
        contracts: Contract::ALL.iter().map(|c| (*c, compiled_contract(*c))).collect(),
        abi_dir: None,
    }
}

// ---------
// | Fakes |
// ---------

/// A call made against one of the fake clients
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    /// `Compiler::compile`
    Compile,
    /// `ChainClient::block_number`
    BlockNumber,
    /// `ChainClient::deploy_proxy`, with the proxy address (zero if it failed)
    DeployProxy {
        /// The implementation deployed behind the proxy
        contract: Contract,
        /// The initializer calldata
        init: Bytes,
        /// The resulting proxy
        proxy: Address,
    },
    /// `ChainClient::transfer_proxy_admin_ownership`
    TransferOwnership(Address),
    /// `ChainClient::implementation_address`
    Implementation(Address),
    /// `SourceVerifier::verify`
    Verify(VerificationRequest),
}

/// The ordered log of calls shared between the fakes
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    /// Append a call
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// The proxy deployments as `(implementation, init calldata, proxy)`
    pub fn proxy_deploys(&self) -> Vec<(Contract, Bytes, Address)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeployProxy { contract, init, proxy } => Some((contract, init, proxy)),
                _ => None,
            })
            .collect()
    }

    /// The verification requests submitted
    pub fn verifications(&self) -> Vec<VerificationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Verify(req) => Some(req),
                _ => None,
            })
            .collect()
    }
}

/// A compiler returning [`compilation_output`]
pub struct FakeCompiler {
    /// The call log
    log: CallLog,
}

#[async_trait]
impl Compiler for FakeCompiler {
    async fn compile(&self) -> Result<CompilationOutput, ScriptError> {
        self.log.push(Call::Compile);
        Ok(compilation_output())
    }
}

/// The mutable state of a [`FakeChain`]
#[derive(Default)]
struct ChainState {
    /// The number of contracts created so far
    nonce: u8,
    /// Proxy to implementation
    implementations: HashMap<Address, Address>,
}

/// An in-memory chain handing out sequential contract addresses
#[derive(Default)]
pub struct FakeChain {
    /// Fail the proxy deployment for this implementation
    fail_deploy_of: Option<Contract>,
    /// The call log
    log: CallLog,
    /// The chain state
    state: Mutex<ChainState>,
}

impl FakeChain {
    /// A chain on which deploying the proxy for `contract` reverts
    pub fn failing(contract: Contract) -> Self {
        Self {
            fail_deploy_of: Some(contract),
            ..Default::default()
        }
    }

    /// The address of the next created contract
    fn next_address(state: &mut ChainState) -> Address {
        state.nonce += 1;
        Address::with_last_byte(state.nonce)
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn block_number(&self) -> Result<u64, ScriptError> {
        self.log.push(Call::BlockNumber);
        Ok(FAKE_BLOCK_NUMBER)
    }

    async fn deploy_proxy(
        &self,
        deployment: ProxyDeployment<'_>,
        init_calldata: Bytes,
    ) -> Result<Address, ScriptError> {
        let contract = deployment.implementation.contract;
        if self.fail_deploy_of == Some(contract) {
            self.log.push(Call::DeployProxy {
                contract,
                init: init_calldata,
                proxy: Address::ZERO,
            });
            return Err(ScriptError::ContractDeployment(format!(
                "{contract} creation reverted"
            )));
        }

        let mut state = self.state.lock().unwrap();
        let implementation = Self::next_address(&mut state);
        let proxy = Self::next_address(&mut state);
        state.implementations.insert(proxy, implementation);

        self.log.push(Call::DeployProxy {
            contract,
            init: init_calldata,
            proxy,
        });
        Ok(proxy)
    }

    async fn transfer_proxy_admin_ownership(
        &self,
        new_owner: Address,
    ) -> Result<Address, ScriptError> {
        self.log.push(Call::TransferOwnership(new_owner));
        Ok(FAKE_PROXY_ADMIN)
    }

    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        self.log.push(Call::Implementation(proxy));
        let state = self.state.lock().unwrap();
        state.implementations.get(&proxy).copied().ok_or_else(|| {
            ScriptError::ContractInteraction(format!("{proxy:#x} has no implementation"))
        })
    }
}

/// A verifier accepting every request, or rejecting every request if `fail` is set
#[derive(Default)]
pub struct FakeVerifier {
    /// Reject submissions
    pub fail: bool,
    /// The call log
    log: CallLog,
}

#[async_trait]
impl SourceVerifier for FakeVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<(), ScriptError> {
        self.log.push(Call::Verify(request.clone()));
        if self.fail {
            return Err(ScriptError::Verification("Fail - Unable to verify".to_string()));
        }

        Ok(())
    }
}

/// Wire fakes around the given chain to a single call log
pub fn test_clients(
    mut chain: FakeChain,
) -> (Clients<FakeCompiler, FakeChain, FakeVerifier>, CallLog) {
    let log = CallLog::default();
    chain.log = log.clone();

    let clients = Clients {
        compiler: FakeCompiler { log: log.clone() },
        chain,
        verifier: FakeVerifier {
            fail: false,
            log: log.clone(),
        },
    };
    (clients, log)
}
