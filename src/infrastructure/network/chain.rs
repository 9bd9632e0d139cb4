// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Capability-typed access to a chain-reading client. Log queries are
//! mandatory; storage reads and read-only calls are optional and gate the
//! resolver's heuristic fallback and the quoter respectively. Callers check
//! the `supports_*` flags instead of probing at call time.

use crate::domain::error::AppError;
use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{BlockNumberOrTag, Filter, Log, TransactionInput, TransactionRequest};
use async_trait::async_trait;

use super::provider::HttpProvider;

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Logs emitted by `address` for the human-readable `event_signature`,
    /// from `from_block` to `to_block` (`None` = latest).
    async fn get_logs(
        &self,
        address: Address,
        event_signature: &str,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<Log>, AppError>;

    fn supports_storage_reads(&self) -> bool {
        false
    }

    async fn get_storage_at(&self, _address: Address, _slot: u64) -> Result<B256, AppError> {
        Err(AppError::CapabilityMissing("getStorageAt".to_string()))
    }

    fn supports_contract_reads(&self) -> bool {
        false
    }

    /// Invokes a no-argument view function returning a single address.
    async fn read_address(
        &self,
        _contract: Address,
        _function_signature: &str,
    ) -> Result<Address, AppError> {
        Err(AppError::CapabilityMissing("readContract".to_string()))
    }

    /// Raw read-only call, used for per-hop quote invocations.
    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, AppError> {
        Err(AppError::CapabilityMissing("call".to_string()))
    }
}

/// Full-capability client backed by an alloy HTTP provider.
pub struct RpcChainClient {
    provider: HttpProvider,
}

impl RpcChainClient {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_logs(
        &self,
        address: Address,
        event_signature: &str,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<Log>, AppError> {
        let mut filter = Filter::new()
            .address(address)
            .event(event_signature)
            .from_block(from_block);
        filter = match to_block {
            Some(block) => filter.to_block(block),
            None => filter.to_block(BlockNumberOrTag::Latest),
        };
        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| AppError::Connection(format!("Log query failed: {}", e)))
    }

    fn supports_storage_reads(&self) -> bool {
        true
    }

    async fn get_storage_at(&self, address: Address, slot: u64) -> Result<B256, AppError> {
        let word = self
            .provider
            .get_storage_at(address, U256::from(slot))
            .await
            .map_err(|e| AppError::Connection(format!("Storage read failed: {}", e)))?;
        Ok(B256::from(word))
    }

    fn supports_contract_reads(&self) -> bool {
        true
    }

    async fn read_address(
        &self,
        contract: Address,
        function_signature: &str,
    ) -> Result<Address, AppError> {
        let selector = &keccak256(function_signature.as_bytes())[..4];
        let ret = self.call(contract, Bytes::copy_from_slice(selector)).await?;
        if ret.len() < 32 {
            return Err(AppError::Connection(format!(
                "{} returned {} bytes, expected a 32-byte word",
                function_signature,
                ret.len()
            )));
        }
        Ok(Address::from_slice(&ret[12..32]))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, AppError> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        self.provider
            .call(tx)
            .await
            .map_err(|e| AppError::Connection(format!("eth_call failed: {}", e)))
    }
}
