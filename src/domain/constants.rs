// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};

// Wrapped native assets
pub const WETH_MAINNET: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");
pub const WETH_ARBITRUM: Address = address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1");

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_BASE: u64 = 8453;
pub const CHAIN_ARBITRUM: u64 = 42161;
pub const CHAIN_BASE_SEPOLIA: u64 = 84532;

pub fn wrapped_native(chain_id: u64) -> Option<Address> {
    match chain_id {
        CHAIN_ETHEREUM => Some(WETH_MAINNET),
        CHAIN_BASE | CHAIN_BASE_SEPOLIA => Some(WETH_BASE),
        CHAIN_ARBITRUM => Some(WETH_ARBITRUM),
        _ => None,
    }
}

// =============================================================================
// EXCHANGE CONSTANTS
// =============================================================================

/// Launcher factories that emit the pool deployment event for managed tokens.
pub fn pool_factory(chain_id: u64) -> Option<Address> {
    match chain_id {
        CHAIN_BASE => Some(address!("E85A59c628F7d27878ACeB4bf3b35733630083a9")),
        CHAIN_BASE_SEPOLIA => Some(address!("49C8b43b20Ca97BF1f58aB9a5a8cd77e7a2eE706")),
        _ => None,
    }
}

/// View-only quoter contracts for single-hop exact-input quotes.
pub fn swap_quoter(chain_id: u64) -> Option<Address> {
    match chain_id {
        CHAIN_ETHEREUM => Some(address!("52F0E24D1c21C8A0cB1e5a5dD6198556BD9E1203")),
        CHAIN_BASE => Some(address!("0d5e0F971ED27FBfF6c2837bf31316121532048D")),
        CHAIN_BASE_SEPOLIA => Some(address!("4A6513c898fe1B2d0E78d3b0e0A4a151589B1cBa")),
        _ => None,
    }
}

/// Canonical ERC-4337 v0.7 entry point, identical across supported chains.
pub const ENTRY_POINT_V07: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

// =============================================================================
// POOL KEY BOUNDS
// =============================================================================

/// LP fee ceiling in pip-style units.
pub const MAX_LP_FEE: u32 = 100_000;
/// Tick spacing ceiling enforced by the pool manager.
pub const MAX_TICK_SPACING: i32 = 16_384;

// =============================================================================
// PROXY STORAGE HEURISTIC
// =============================================================================

/// Slots 0..=14 cover every observed minimal-proxy layout variant.
pub const PROXY_SLOT_SCAN_LIMIT: u64 = 15;
/// Hook addresses, when present, sit within two slots of the pool-params word.
pub const HOOK_SLOT_LOOKAHEAD: u64 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_native_known_chains() {
        assert_eq!(wrapped_native(CHAIN_ETHEREUM), Some(WETH_MAINNET));
        assert_eq!(wrapped_native(CHAIN_BASE), Some(WETH_BASE));
        assert_eq!(wrapped_native(999_999), None);
    }

    #[test]
    fn factory_only_on_launcher_chains() {
        assert!(pool_factory(CHAIN_BASE).is_some());
        assert!(pool_factory(CHAIN_ETHEREUM).is_none());
    }
}
