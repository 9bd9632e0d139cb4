// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Multi-hop price quoting. Hops are quoted one at a time through the
//! exchange's single-hop quoter: the batched multi-hop call reverts whenever
//! any hop crosses a pool with hook logic the quoter does not understand.
//! One extra round trip per hop buys us hook-agnostic quotes; inter-hop
//! price movement is acceptable for a read-only estimate.

use crate::domain::constants::{swap_quoter, wrapped_native};
use crate::domain::error::AppError;
use crate::domain::types::{PoolKey, QuoteResult, SwapPath};
use crate::infrastructure::network::chain::ChainClient;
use alloy::primitives::{
    Address, Bytes, U256,
    aliases::{I24, U24},
};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct QuotePoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct QuoteExactSingleParams {
        QuotePoolKey poolKey;
        bool zeroForOne;
        uint128 exactAmount;
        bytes hookData;
    }

    function quoteExactInputSingle(QuoteExactSingleParams params)
        external
        returns (uint256 amountOut, uint256 gasEstimate);
}

/// Builds the canonical pool key for an ordered swap pair. The exchange
/// indexes pools by ascending-sorted currencies, so every key construction
/// in the codebase goes through here.
pub fn canonical_pool_key(
    token_in: Address,
    token_out: Address,
    fee: u32,
    tick_spacing: i32,
    hooks: Address,
    hook_data: Bytes,
) -> Result<(PoolKey, bool), AppError> {
    let key = PoolKey::try_new(token_in, token_out, fee, tick_spacing, hooks, hook_data)?;
    let zero_for_one = token_in == key.currency0;
    Ok((key, zero_for_one))
}

pub struct Quoter {
    chain_id: u64,
    quoter: Address,
}

impl Quoter {
    pub fn new(chain_id: u64) -> Result<Self, AppError> {
        let quoter = swap_quoter(chain_id).ok_or_else(|| {
            AppError::Config(format!("no swap quoter known for chain {chain_id}"))
        })?;
        Ok(Self::with_address(chain_id, quoter))
    }

    pub fn with_address(chain_id: u64, quoter: Address) -> Self {
        Self { chain_id, quoter }
    }

    /// Quotes a path hop by hop, carrying each hop's output forward as the
    /// next hop's input. A single-token path has no hops and returns the
    /// input amount unchanged. Per-hop call failures propagate unmodified;
    /// a failed hop invalidates the running amount, so retry is the
    /// caller's whole-chain decision.
    pub async fn quote_multi_hop(
        &self,
        path: &SwapPath,
        amount_in: U256,
        client: &dyn ChainClient,
    ) -> Result<QuoteResult, AppError> {
        let mut running = amount_in;
        for (hop, pool) in path.pools.iter().enumerate() {
            let token_in = path.tokens[hop];
            let token_out = path.tokens[hop + 1];
            running = self
                .quote_single_hop(token_in, token_out, pool, running, client)
                .await?;
        }
        Ok(QuoteResult {
            amount_out: running,
        })
    }

    /// Sell-side convenience: walk a buy path backwards to the chain's
    /// wrapped native asset and price it through the same hop chain.
    pub async fn quote_to_native(
        &self,
        buy_path: &SwapPath,
        amount_in: U256,
        client: &dyn ChainClient,
    ) -> Result<QuoteResult, AppError> {
        let native = wrapped_native(self.chain_id).ok_or_else(|| {
            AppError::Config(format!("no wrapped native asset for chain {}", self.chain_id))
        })?;
        let sell_path = buy_path.reversed();
        match sell_path.tokens.last() {
            Some(last) if *last == native => {}
            _ => {
                return Err(AppError::validation(
                    "path",
                    "reversed path does not terminate at the wrapped native asset",
                ));
            }
        }
        self.quote_multi_hop(&sell_path, amount_in, client).await
    }

    async fn quote_single_hop(
        &self,
        token_in: Address,
        token_out: Address,
        pool: &PoolKey,
        amount_in: U256,
        client: &dyn ChainClient,
    ) -> Result<U256, AppError> {
        if !(pool.currency0 == token_in && pool.currency1 == token_out)
            && !(pool.currency0 == token_out && pool.currency1 == token_in)
        {
            return Err(AppError::validation(
                "pool",
                "hop pool key does not cover the hop's token pair",
            ));
        }
        let zero_for_one = token_in == pool.currency0;

        let exact_amount: u128 = amount_in.try_into().map_err(|_| {
            AppError::validation("amount_in", "hop input exceeds the quoter's uint128 range")
        })?;
        let fee = U24::try_from(pool.fee)
            .map_err(|_| AppError::validation("fee", "fee exceeds uint24"))?;
        let tick_spacing = I24::try_from(pool.tick_spacing)
            .map_err(|_| AppError::validation("tick_spacing", "tick spacing exceeds int24"))?;

        let call = quoteExactInputSingleCall {
            params: QuoteExactSingleParams {
                poolKey: QuotePoolKey {
                    currency0: pool.currency0,
                    currency1: pool.currency1,
                    fee,
                    tickSpacing: tick_spacing,
                    hooks: pool.hooks,
                },
                zeroForOne: zero_for_one,
                exactAmount: exact_amount,
                hookData: pool.hook_data.clone(),
            },
        };

        let ret = client.call(self.quoter, call.abi_encode().into()).await?;
        if ret.len() < 32 {
            return Err(AppError::Connection(format!(
                "quoter returned {} bytes, expected at least 32",
                ret.len()
            )));
        }
        Ok(U256::from_be_slice(&ret[..32]))
    }
}
