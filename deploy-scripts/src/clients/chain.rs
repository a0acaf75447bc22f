//! A chain client backed by an alloy provider

use std::future::Future;

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol_types::SolValue,
};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    constants::{IMPLEMENTATION_STORAGE_SLOT, NUM_DEPLOY_CONFIRMATIONS},
    errors::ScriptError,
    solidity::IProxyAdmin,
    types::{CompiledContract, ProxyDeployment},
    utils::address_from_slot,
};

use super::ChainClient;

/// The proxy admin shared by the proxies of a deployment
#[derive(Default)]
struct ProxyAdminSlot(Mutex<Option<Address>>);

impl ProxyAdminSlot {
    /// The current proxy admin, deploying one with `deploy` if there is none
    async fn get_or_deploy<F, Fut>(&self, deploy: F) -> Result<Address, ScriptError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Address, ScriptError>>,
    {
        let mut admin = self.0.lock().await;
        if let Some(address) = *admin {
            return Ok(address);
        }

        let address = deploy().await?;
        *admin = Some(address);
        Ok(address)
    }

    /// The current proxy admin, if one has been deployed
    async fn current(&self) -> Option<Address> {
        *self.0.lock().await
    }

    /// Forget the current proxy admin, so that the next proxy deploys a new one
    async fn release(&self) {
        self.0.lock().await.take();
    }
}

/// Deploys transparent upgradeable proxies through an alloy provider.
///
/// A single `ProxyAdmin` is deployed with the first proxy and administers
/// every proxy deployed until its ownership is transferred. Proxies deployed
/// after a transfer get a fresh `ProxyAdmin`.
pub struct AlloyChain {
    /// The signing provider
    provider: DynProvider,
    /// The proxy admin of the deployment in progress
    proxy_admin: ProxyAdminSlot,
}

impl AlloyChain {
    /// Create a chain client over the given provider
    pub fn new(provider: DynProvider) -> Self {
        Self {
            provider,
            proxy_admin: ProxyAdminSlot::default(),
        }
    }

    /// Send a creation transaction for the contract's bytecode with ABI-encoded
    /// `constructor_args` appended, returning the new contract's address
    async fn deploy_contract(
        &self,
        contract: &CompiledContract,
        constructor_args: &[u8],
    ) -> Result<Address, ScriptError> {
        let code = [&contract.bytecode[..], constructor_args].concat();
        let tx = TransactionRequest::default().with_deploy_code(code);

        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
            .with_required_confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        let address = created_address(&receipt, contract)?;
        debug!(
            "{} deployed at {:#x} (tx {:#x})",
            contract.contract.artifact_name(),
            address,
            receipt.transaction_hash
        );

        Ok(address)
    }
}

/// The address of the contract created in `receipt`, erroring if the
/// creation reverted
fn created_address(
    receipt: &TransactionReceipt,
    contract: &CompiledContract,
) -> Result<Address, ScriptError> {
    if !receipt.status() {
        return Err(ScriptError::ContractDeployment(format!(
            "{} creation reverted (tx {:#x})",
            contract.contract.artifact_name(),
            receipt.transaction_hash
        )));
    }

    receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!(
            "no contract address in receipt for {}",
            contract.contract.artifact_name()
        ))
    })
}

#[async_trait]
impl ChainClient for AlloyChain {
    async fn block_number(&self) -> Result<u64, ScriptError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn deploy_proxy(
        &self,
        deployment: ProxyDeployment<'_>,
        init_calldata: Bytes,
    ) -> Result<Address, ScriptError> {
        let implementation = self.deploy_contract(deployment.implementation, &[]).await?;

        let proxy_admin_artifact = deployment.proxy_admin;
        let proxy_admin = self
            .proxy_admin
            .get_or_deploy(move || async move {
                let address = self.deploy_contract(proxy_admin_artifact, &[]).await?;
                info!("ProxyAdmin deployed to: {:#x}", address);
                Ok(address)
            })
            .await?;

        // TransparentUpgradeableProxy(address _logic, address admin_, bytes memory _data)
        let constructor_args = (implementation, proxy_admin, init_calldata).abi_encode_params();
        self.deploy_contract(deployment.proxy, &constructor_args).await
    }

    async fn transfer_proxy_admin_ownership(
        &self,
        new_owner: Address,
    ) -> Result<Address, ScriptError> {
        let proxy_admin_address = self.proxy_admin.current().await.ok_or_else(|| {
            ScriptError::ContractInteraction("no proxy admin has been deployed".to_string())
        })?;
        let proxy_admin = IProxyAdmin::new(proxy_admin_address, self.provider.clone());

        proxy_admin
            .transferOwnership(new_owner)
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .with_required_confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        let owner = proxy_admin
            .owner()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        if owner != new_owner {
            return Err(ScriptError::ContractInteraction(format!(
                "proxy admin owned by {:#x} after transfer to {:#x}",
                owner, new_owner
            )));
        }

        self.proxy_admin.release().await;
        Ok(proxy_admin_address)
    }

    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        let slot = self
            .provider
            .get_storage_at(proxy, U256::from_be_bytes(IMPLEMENTATION_STORAGE_SLOT.0))
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        implementation_from_slot(proxy, slot)
    }
}

/// The implementation recorded in a proxy's implementation slot, erroring
/// if the slot is empty
fn implementation_from_slot(proxy: Address, slot: U256) -> Result<Address, ScriptError> {
    let implementation = address_from_slot(slot);
    if implementation.is_zero() {
        return Err(ScriptError::ContractInteraction(format!(
            "{:#x} has no implementation, is it a proxy?",
            proxy
        )));
    }

    Ok(implementation)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU8, Ordering};

    use alloy::{
        primitives::{address, Address, B256, U256},
        rpc::types::TransactionReceipt,
    };
    use eyre::Result;
    use serde_json::json;

    use super::{created_address, implementation_from_slot, ProxyAdminSlot};
    use crate::{errors::ScriptError, test_helpers::compiled_contract, types::Contract};

    /// A contract creation receipt
    fn creation_receipt(status: bool, contract_address: Option<Address>) -> TransactionReceipt {
        let status = if status { "0x1" } else { "0x0" };
        let contract_address = contract_address.map(|a| format!("{a:#x}"));
        serde_json::from_value(json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": format!("{:#x}", B256::with_last_byte(1)),
            "transactionIndex": "0x0",
            "blockHash": format!("{:#x}", B256::with_last_byte(2)),
            "blockNumber": "0x1",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": null,
            "contractAddress": contract_address,
        }))
        .unwrap()
    }

    #[test]
    fn test_created_address() -> Result<()> {
        let pool = compiled_contract(Contract::StakingPool);
        let created = address!("00000000000000000000000000000000000000aa");

        let receipt = creation_receipt(true, Some(created));
        assert_eq!(created_address(&receipt, &pool)?, created);
        Ok(())
    }

    #[test]
    fn test_reverted_creation() {
        let pool = compiled_contract(Contract::StakingPool);
        let created = address!("00000000000000000000000000000000000000aa");

        let res = created_address(&creation_receipt(false, Some(created)), &pool);
        assert!(matches!(res, Err(ScriptError::ContractDeployment(_))));
    }

    #[test]
    fn test_creation_without_contract_address() {
        let pool = compiled_contract(Contract::StakingPool);

        let res = created_address(&creation_receipt(true, None), &pool);
        assert!(matches!(res, Err(ScriptError::ContractDeployment(_))));
    }

    #[test]
    fn test_implementation_from_slot() -> Result<()> {
        let proxy = address!("00000000000000000000000000000000000000bb");
        let implementation = address!("5288d36112fe21be1a24b236be887C90c3AE7090");
        let slot = U256::from_be_bytes(implementation.into_word().0);

        assert_eq!(implementation_from_slot(proxy, slot)?, implementation);
        assert!(matches!(
            implementation_from_slot(proxy, U256::ZERO),
            Err(ScriptError::ContractInteraction(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_proxy_admin_shared_until_released() -> Result<()> {
        let slot = ProxyAdminSlot::default();
        let deploys = AtomicU8::new(0);
        let counter = &deploys;
        let deploy = move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Address::with_last_byte(n))
        };

        let first = slot.get_or_deploy(deploy).await?;
        let second = slot.get_or_deploy(deploy).await?;
        assert_eq!(first, second);
        assert_eq!(slot.current().await, Some(first));

        slot.release().await;
        assert_eq!(slot.current().await, None);

        let third = slot.get_or_deploy(deploy).await?;
        assert_ne!(third, first);
        assert_eq!(deploys.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_proxy_admin_deploy_not_cached() {
        let slot = ProxyAdminSlot::default();

        let res = slot
            .get_or_deploy(|| async {
                Err(ScriptError::ContractDeployment("reverted".to_string()))
            })
            .await;
        assert!(res.is_err());
        assert_eq!(slot.current().await, None);
    }
}
