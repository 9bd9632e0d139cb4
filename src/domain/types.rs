// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{MAX_LP_FEE, MAX_TICK_SPACING};
use crate::domain::error::AppError;
use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Identifying parameters of a concentrated-liquidity pool. The exchange
/// indexes pools by the ascending-sorted currency pair, so `currency0 <
/// currency1` always holds here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    /// LP fee in pip-style units, (0, 100_000].
    pub fee: u32,
    /// Price-level granularity, (0, 16_384].
    pub tick_spacing: i32,
    /// Zero address means the pool runs without hook logic.
    pub hooks: Address,
    /// Opaque bytes forwarded to the hook on every quote/swap.
    pub hook_data: Bytes,
}

impl PoolKey {
    /// Builds a key from an unordered token pair, enforcing the sort order
    /// and parameter bounds the pool manager requires.
    pub fn try_new(
        token_a: Address,
        token_b: Address,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
        hook_data: Bytes,
    ) -> Result<Self, AppError> {
        if token_a == token_b {
            return Err(AppError::validation("currencies", "identical pool currencies"));
        }
        if fee == 0 || fee > MAX_LP_FEE {
            return Err(AppError::validation("fee", format!("fee {fee} out of range")));
        }
        if tick_spacing <= 0 || tick_spacing > MAX_TICK_SPACING {
            return Err(AppError::validation(
                "tick_spacing",
                format!("tick spacing {tick_spacing} out of range"),
            ));
        }
        let (currency0, currency1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
            hooks,
            hook_data,
        })
    }

    pub fn has_hook(&self) -> bool {
        self.hooks != Address::ZERO
    }
}

/// An ordered token route with one pool key per consecutive pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPath {
    pub tokens: Vec<Address>,
    pub pools: Vec<PoolKey>,
}

impl SwapPath {
    pub fn try_new(tokens: Vec<Address>, pools: Vec<PoolKey>) -> Result<Self, AppError> {
        if tokens.is_empty() {
            return Err(AppError::validation("tokens", "path needs at least one token"));
        }
        if pools.len() + 1 != tokens.len() {
            return Err(AppError::validation(
                "pools",
                format!(
                    "expected {} pool keys for {} tokens, got {}",
                    tokens.len() - 1,
                    tokens.len(),
                    pools.len()
                ),
            ));
        }
        Ok(Self { tokens, pools })
    }

    pub fn hop_count(&self) -> usize {
        self.pools.len()
    }

    /// Same route walked in the opposite direction. Pool keys are unordered
    /// pairs, so they carry over unchanged.
    pub fn reversed(&self) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.reverse();
        let mut pools = self.pools.clone();
        pools.reverse();
        Self { tokens, pools }
    }
}

/// Output estimate of a quote. Ephemeral by design: recomputed per request,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteResult {
    pub amount_out: U256,
}

/// Account-abstraction execution request in the packed v0.7 wire shape.
/// The routing core treats it as opaque beyond submit/classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub signature: Bytes,
}

/// Relay gas estimate for an unsent user operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
}

/// Inclusion receipt returned once a relay has landed the operation on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOpReceipt {
    pub user_op_hash: B256,
    pub success: bool,
    pub actual_gas_cost: U256,
    pub actual_gas_used: U256,
}

/// One scheduled sub-trade of a dripped order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DripEvent {
    pub wallet_id: u64,
    pub amount: U256,
    pub delay_ms: u64,
}

/// Time-ordered drip plan. Pure value: the core never tracks its execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DripSchedule {
    pub events: Vec<DripEvent>,
}

impl DripSchedule {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_for_wallet(&self, wallet_id: u64) -> U256 {
        self.events
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .fold(U256::ZERO, |acc, e| acc + e.amount)
    }
}
