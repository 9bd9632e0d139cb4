// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Pool parameter discovery. The deployment event emitted by the chain's
//! launcher factory is authoritative; raw proxy storage is a best-effort
//! heuristic used only when the event path comes up empty. Results are
//! re-resolved on every call, never cached here.

use crate::domain::constants::{
    HOOK_SLOT_LOOKAHEAD, MAX_LP_FEE, MAX_TICK_SPACING, PROXY_SLOT_SCAN_LIMIT, pool_factory,
};
use crate::domain::error::AppError;
use crate::domain::types::PoolKey;
use crate::infrastructure::network::chain::ChainClient;
use alloy::primitives::{Address, B256, Bytes, keccak256};

/// Emitted by the factory when a token's pool is created. The embedded key
/// is already canonically sorted.
pub const POOL_DEPLOYED_EVENT: &str =
    "PoolDeployed(address,address,address,uint24,int24,address)";

/// View function on managed tokens reporting their paired quote currency.
const PAIRED_TOKEN_GETTER: &str = "pairedToken()";

pub struct PoolResolver {
    chain_id: u64,
    factory: Address,
}

impl PoolResolver {
    pub fn new(chain_id: u64) -> Result<Self, AppError> {
        let factory = pool_factory(chain_id).ok_or_else(|| {
            AppError::Config(format!("no pool factory known for chain {chain_id}"))
        })?;
        Ok(Self::with_factory(chain_id, factory))
    }

    pub fn with_factory(chain_id: u64, factory: Address) -> Self {
        Self { chain_id, factory }
    }

    /// Resolves the pool key for `token`, event path first. Deterministic
    /// for fixed on-chain state and safe to call concurrently.
    pub async fn resolve(
        &self,
        token: Address,
        client: &dyn ChainClient,
    ) -> Result<PoolKey, AppError> {
        match self.resolve_from_logs(token, client).await {
            Ok(Some(key)) => return Ok(key),
            Ok(None) => {
                tracing::debug!(
                    target: "pools",
                    chain_id = self.chain_id,
                    token = %token,
                    "No deployment event found; trying storage heuristic"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: "pools",
                    chain_id = self.chain_id,
                    token = %token,
                    error = %err,
                    "Deployment log scan failed; trying storage heuristic"
                );
            }
        }

        if !client.supports_storage_reads() || !client.supports_contract_reads() {
            return Err(AppError::PoolNotDiscoverable(token));
        }

        match self.resolve_from_storage(token, client).await {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(AppError::PoolNotDiscoverable(token)),
            Err(err) => {
                tracing::warn!(
                    target: "pools",
                    token = %token,
                    error = %err,
                    "Storage heuristic failed"
                );
                Err(AppError::PoolNotDiscoverable(token))
            }
        }
    }

    /// Authoritative path: scan factory deployment events from genesis and
    /// return the embedded key of the entry matching `token`.
    async fn resolve_from_logs(
        &self,
        token: Address,
        client: &dyn ChainClient,
    ) -> Result<Option<PoolKey>, AppError> {
        let logs = client
            .get_logs(self.factory, POOL_DEPLOYED_EVENT, 0, None)
            .await?;
        let expected_topic = keccak256(POOL_DEPLOYED_EVENT.as_bytes());

        for log in logs {
            let raw = &log.inner.data;
            let topics = raw.topics();
            if topics.len() < 2 || topics[0] != expected_topic {
                continue;
            }
            if Address::from_word(topics[1]) != token {
                continue;
            }
            match decode_deployed_key(raw.data.as_ref()) {
                Ok(key) => return Ok(Some(key)),
                Err(err) => {
                    tracing::warn!(
                        target: "pools",
                        token = %token,
                        error = %err,
                        "Skipping malformed deployment event"
                    );
                }
            }
        }
        Ok(None)
    }

    /// Heuristic path: decode the minimal proxy's packed pool-params slot.
    /// The only structural validation available is the fee/tick-spacing
    /// range check, so matches remain best-effort, never authoritative.
    async fn resolve_from_storage(
        &self,
        token: Address,
        client: &dyn ChainClient,
    ) -> Result<Option<PoolKey>, AppError> {
        let quote_currency = client.read_address(token, PAIRED_TOKEN_GETTER).await?;
        if quote_currency == Address::ZERO {
            return Ok(None);
        }

        let mut found: Option<(u64, u32, i32)> = None;
        for slot in 0..PROXY_SLOT_SCAN_LIMIT {
            let word = client.get_storage_at(token, slot).await?;
            let Some((fee, tick_spacing)) = decode_params_word(&word, quote_currency) else {
                continue;
            };
            if let Some((first_slot, first_fee, first_tick)) = found {
                // Two plausible layouts decode cleanly. Keep the first match
                // but flag it: a false positive here produces a wrong key.
                tracing::warn!(
                    target: "pools",
                    token = %token,
                    first_slot,
                    first_fee,
                    first_tick,
                    duplicate_slot = slot,
                    "Ambiguous proxy storage layout; keeping first match"
                );
                break;
            }
            found = Some((slot, fee, tick_spacing));
        }

        let Some((slot, fee, tick_spacing)) = found else {
            return Ok(None);
        };

        let mut hooks = Address::ZERO;
        for offset in 1..=HOOK_SLOT_LOOKAHEAD {
            let word = client.get_storage_at(token, slot + offset).await?;
            if word != B256::ZERO {
                hooks = Address::from_word(word);
                break;
            }
        }

        let key = PoolKey::try_new(token, quote_currency, fee, tick_spacing, hooks, Bytes::new())?;
        tracing::info!(
            target: "pools",
            token = %token,
            slot,
            fee,
            tick_spacing,
            hooks = %hooks,
            "Pool key recovered from proxy storage"
        );
        Ok(Some(key))
    }
}

/// Event data layout: five ABI words (currency0, currency1, fee,
/// tickSpacing, hooks). The indexed token lives in topic 1.
fn decode_deployed_key(data: &[u8]) -> Result<PoolKey, AppError> {
    if data.len() < 160 {
        return Err(AppError::validation(
            "event_data",
            format!("expected 160 bytes, got {}", data.len()),
        ));
    }
    let currency0 = Address::from_slice(&data[12..32]);
    let currency1 = Address::from_slice(&data[44..64]);
    let fee = u32::from_be_bytes([data[92], data[93], data[94], data[95]]);
    let tick_spacing = i32::from_be_bytes([data[124], data[125], data[126], data[127]]);
    let hooks = Address::from_slice(&data[140..160]);
    PoolKey::try_new(currency0, currency1, fee, tick_spacing, hooks, Bytes::new())
}

/// Packed params word of the minimal-proxy variant: low 20 bytes hold the
/// quote currency, byte 9 the tick-spacing multiplier, bytes 10..12 the
/// big-endian fee. Returns `None` unless the currency matches and both
/// decoded values pass the pool-manager range checks.
fn decode_params_word(word: &B256, quote_currency: Address) -> Option<(u32, i32)> {
    if Address::from_slice(&word[12..32]) != quote_currency {
        return None;
    }
    let fee = u32::from(u16::from_be_bytes([word[10], word[11]]));
    let tick_spacing = i32::from(word[9]);
    if fee == 0 || fee > MAX_LP_FEE {
        return None;
    }
    if tick_spacing <= 0 || tick_spacing > MAX_TICK_SPACING {
        return None;
    }
    Some((fee, tick_spacing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Log as PrimLog, LogData, U256, address};
    use alloy::rpc::types::eth::Log;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const FACTORY: Address = address!("00000000000000000000000000000000000000fa");
    const TOKEN: Address = address!("aaaa00000000000000000000000000000000aaaa");
    const QUOTE: Address = address!("4200000000000000000000000000000000000006");
    const HOOK: Address = address!("cccc00000000000000000000000000000000cccc");

    struct FakeChain {
        logs: Vec<Log>,
        fail_logs: bool,
        storage: HashMap<u64, B256>,
        paired: Option<Address>,
        storage_reads: bool,
        contract_reads: bool,
    }

    impl Default for FakeChain {
        fn default() -> Self {
            Self {
                logs: Vec::new(),
                fail_logs: false,
                storage: HashMap::new(),
                paired: None,
                storage_reads: false,
                contract_reads: false,
            }
        }
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn get_logs(
            &self,
            _address: Address,
            _event_signature: &str,
            _from_block: u64,
            _to_block: Option<u64>,
        ) -> Result<Vec<Log>, AppError> {
            if self.fail_logs {
                return Err(AppError::Connection("log query unavailable".into()));
            }
            Ok(self.logs.clone())
        }

        fn supports_storage_reads(&self) -> bool {
            self.storage_reads
        }

        async fn get_storage_at(&self, _address: Address, slot: u64) -> Result<B256, AppError> {
            Ok(self.storage.get(&slot).copied().unwrap_or(B256::ZERO))
        }

        fn supports_contract_reads(&self) -> bool {
            self.contract_reads
        }

        async fn read_address(
            &self,
            _contract: Address,
            _function_signature: &str,
        ) -> Result<Address, AppError> {
            self.paired
                .ok_or_else(|| AppError::Connection("no paired token".into()))
        }
    }

    fn deploy_log(token: Address, fee: u32, tick_spacing: i32, hooks: Address) -> Log {
        let (c0, c1) = if token < QUOTE {
            (token, QUOTE)
        } else {
            (QUOTE, token)
        };
        let mut data = Vec::with_capacity(160);
        data.extend_from_slice(B256::left_padding_from(c0.as_slice()).as_slice());
        data.extend_from_slice(B256::left_padding_from(c1.as_slice()).as_slice());
        data.extend_from_slice(&U256::from(fee).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(tick_spacing as u64).to_be_bytes::<32>());
        data.extend_from_slice(B256::left_padding_from(hooks.as_slice()).as_slice());

        let topics = vec![
            keccak256(POOL_DEPLOYED_EVENT.as_bytes()),
            B256::left_padding_from(token.as_slice()),
        ];
        Log {
            inner: PrimLog {
                address: FACTORY,
                data: LogData::new_unchecked(topics, data.into()),
            },
            ..Default::default()
        }
    }

    /// Params word: byte 9 = tick spacing, bytes 10..12 = fee, low 20 = currency.
    fn params_word(currency: Address, fee: u16, tick_spacing: u8) -> B256 {
        let mut word = [0u8; 32];
        word[9] = tick_spacing;
        word[10..12].copy_from_slice(&fee.to_be_bytes());
        word[12..32].copy_from_slice(currency.as_slice());
        B256::from(word)
    }

    fn resolver() -> PoolResolver {
        PoolResolver::with_factory(8453, FACTORY)
    }

    #[tokio::test]
    async fn event_path_returns_embedded_key() {
        let client = FakeChain {
            logs: vec![
                deploy_log(address!("bbbb00000000000000000000000000000000bbbb"), 10_000, 200, Address::ZERO),
                deploy_log(TOKEN, 3000, 60, HOOK),
            ],
            ..Default::default()
        };

        let key = resolver().resolve(TOKEN, &client).await.unwrap();
        assert_eq!(key.fee, 3000);
        assert_eq!(key.tick_spacing, 60);
        assert_eq!(key.hooks, HOOK);
        assert!(key.currency0 < key.currency1);
    }

    #[tokio::test]
    async fn storage_fallback_decodes_matching_slot_and_hook() {
        let mut storage = HashMap::new();
        storage.insert(5, params_word(QUOTE, 3000, 60));
        storage.insert(6, B256::left_padding_from(HOOK.as_slice()));
        let client = FakeChain {
            storage,
            paired: Some(QUOTE),
            storage_reads: true,
            contract_reads: true,
            ..Default::default()
        };

        let key = resolver().resolve(TOKEN, &client).await.unwrap();
        assert_eq!(key.fee, 3000);
        assert_eq!(key.tick_spacing, 60);
        assert_eq!(key.hooks, HOOK);
    }

    #[tokio::test]
    async fn storage_fallback_without_hook_slot_yields_zero_hooks() {
        let mut storage = HashMap::new();
        storage.insert(2, params_word(QUOTE, 500, 10));
        let client = FakeChain {
            storage,
            paired: Some(QUOTE),
            storage_reads: true,
            contract_reads: true,
            ..Default::default()
        };

        let key = resolver().resolve(TOKEN, &client).await.unwrap();
        assert_eq!(key.fee, 500);
        assert_eq!(key.tick_spacing, 10);
        assert_eq!(key.hooks, Address::ZERO);
    }

    #[tokio::test]
    async fn out_of_range_params_at_matching_slot_are_skipped() {
        let mut storage = HashMap::new();
        // Slot 3 matches the currency but decodes fee = 0: false positive.
        storage.insert(3, params_word(QUOTE, 0, 60));
        // Slot 4 matches but has zero tick spacing.
        storage.insert(4, params_word(QUOTE, 3000, 0));
        // Slot 7 is the real layout.
        storage.insert(7, params_word(QUOTE, 3000, 60));
        let client = FakeChain {
            storage,
            paired: Some(QUOTE),
            storage_reads: true,
            contract_reads: true,
            ..Default::default()
        };

        let key = resolver().resolve(TOKEN, &client).await.unwrap();
        assert_eq!(key.fee, 3000);
        assert_eq!(key.tick_spacing, 60);
    }

    #[tokio::test]
    async fn ambiguous_second_match_keeps_the_first_slot() {
        let mut storage = HashMap::new();
        // Both slots match the quote currency and pass the range checks.
        storage.insert(2, params_word(QUOTE, 500, 10));
        storage.insert(8, params_word(QUOTE, 3000, 60));
        let client = FakeChain {
            storage,
            paired: Some(QUOTE),
            storage_reads: true,
            contract_reads: true,
            ..Default::default()
        };

        let key = resolver().resolve(TOKEN, &client).await.unwrap();
        assert_eq!(key.fee, 500);
        assert_eq!(key.tick_spacing, 10);
    }

    #[tokio::test]
    async fn fails_when_no_event_and_no_storage_capability() {
        let client = FakeChain::default();
        let err = resolver().resolve(TOKEN, &client).await.unwrap_err();
        assert!(matches!(err, AppError::PoolNotDiscoverable(t) if t == TOKEN));
    }

    #[tokio::test]
    async fn log_failure_falls_back_to_storage() {
        let mut storage = HashMap::new();
        storage.insert(0, params_word(QUOTE, 10_000, 200));
        let client = FakeChain {
            fail_logs: true,
            storage,
            paired: Some(QUOTE),
            storage_reads: true,
            contract_reads: true,
            ..Default::default()
        };

        let key = resolver().resolve(TOKEN, &client).await.unwrap();
        assert_eq!(key.fee, 10_000);
        assert_eq!(key.tick_spacing, 200);
    }

    #[tokio::test]
    async fn no_matching_slot_is_not_discoverable() {
        let mut storage = HashMap::new();
        storage.insert(1, params_word(HOOK, 3000, 60)); // wrong currency
        let client = FakeChain {
            storage,
            paired: Some(QUOTE),
            storage_reads: true,
            contract_reads: true,
            ..Default::default()
        };

        let err = resolver().resolve(TOKEN, &client).await.unwrap_err();
        assert!(matches!(err, AppError::PoolNotDiscoverable(_)));
    }
}
