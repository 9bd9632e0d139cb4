// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Drip scheduling: one large order becomes many small, time-distributed
//! sub-trades so no single wallet produces a detectable burst. Pure
//! computation, no I/O; waiting out the delays and firing submissions is
//! the caller's job.

use crate::domain::error::AppError;
use crate::domain::types::{DripEvent, DripSchedule};
use alloy::primitives::U256;
use rand::Rng;

/// Plans with the process-wide generator. Use [`plan_schedule_with_rng`]
/// with a seeded generator when outputs must be reproducible.
pub fn plan_schedule(
    wallet_ids: &[u64],
    amounts: &[U256],
    duration_ms: u64,
    intervals: u32,
    randomize: bool,
) -> Result<DripSchedule, AppError> {
    plan_schedule_with_rng(
        wallet_ids,
        amounts,
        duration_ms,
        intervals,
        randomize,
        &mut rand::thread_rng(),
    )
}

/// Splits each wallet's total into exactly `intervals` sub-amounts summing
/// exactly to the total, and spreads them over `duration_ms` so that every
/// window of the schedule contains one event per wallet. Events are
/// returned sorted by delay.
pub fn plan_schedule_with_rng<R: Rng>(
    wallet_ids: &[u64],
    amounts: &[U256],
    duration_ms: u64,
    intervals: u32,
    randomize: bool,
    rng: &mut R,
) -> Result<DripSchedule, AppError> {
    if wallet_ids.len() != amounts.len() {
        return Err(AppError::validation(
            "amounts",
            format!(
                "{} wallets but {} amounts",
                wallet_ids.len(),
                amounts.len()
            ),
        ));
    }
    if wallet_ids.is_empty() {
        return Err(AppError::validation("wallet_ids", "at least one wallet required"));
    }
    if duration_ms == 0 {
        return Err(AppError::validation("duration_ms", "duration must be positive"));
    }
    if intervals == 0 {
        return Err(AppError::validation("intervals", "intervals must be positive"));
    }

    let window = duration_ms / u64::from(intervals);
    let wallet_count = wallet_ids.len() as u64;
    let mut events = Vec::with_capacity(wallet_ids.len() * intervals as usize);

    for (wallet_idx, (&wallet_id, &total)) in wallet_ids.iter().zip(amounts.iter()).enumerate() {
        let mut parts = split_even(total, intervals);
        if randomize {
            jiggle(&mut parts, rng);
        }
        for (slot, amount) in parts.into_iter().enumerate() {
            // One event per wallet in every window keeps wallets interleaved:
            // no wallet's sequence ever fully precedes another's.
            let window_start = slot as u64 * window;
            let offset = if window == 0 {
                0
            } else if randomize {
                rng.gen_range(0..window)
            } else {
                window * wallet_idx as u64 / wallet_count
            };
            events.push(DripEvent {
                wallet_id,
                amount,
                delay_ms: (window_start + offset).min(duration_ms),
            });
        }
    }

    events.sort_by_key(|e| e.delay_ms);
    Ok(DripSchedule { events })
}

/// Equal split with the remainder spread one unit at a time, so the parts
/// differ by at most one and the sum is exact.
fn split_even(total: U256, intervals: u32) -> Vec<U256> {
    let n = U256::from(intervals);
    let base = total / n;
    let remainder = (total % n).to::<u64>();
    (0..u64::from(intervals))
        .map(|i| {
            if i < remainder {
                base + U256::from(1)
            } else {
                base
            }
        })
        .collect()
}

/// Sum-preserving perturbation: each adjacent pair trades a random slice of
/// up to a quarter of the left part. Nothing is created or lost.
fn jiggle<R: Rng>(parts: &mut [U256], rng: &mut R) {
    let mut i = 0;
    while i + 1 < parts.len() {
        let cap: U256 = parts[i] >> 2;
        if !cap.is_zero() {
            let cap128 = cap.min(U256::from(u128::MAX)).to::<u128>();
            let delta = U256::from(rng.gen_range(0..=cap128));
            parts[i] -= delta;
            parts[i + 1] += delta;
        }
        i += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn per_wallet_sums_are_exact() {
        let schedule = plan_schedule_with_rng(
            &[1, 2],
            &[U256::from(1_000_000u64), U256::from(2_000_000u64)],
            60_000,
            5,
            true,
            &mut seeded(),
        )
        .unwrap();

        assert_eq!(schedule.total_for_wallet(1), U256::from(1_000_000u64));
        assert_eq!(schedule.total_for_wallet(2), U256::from(2_000_000u64));
    }

    #[test]
    fn schedule_length_is_wallets_times_intervals() {
        let schedule = plan_schedule_with_rng(
            &[1, 2, 3],
            &[U256::from(10u64), U256::from(20u64), U256::from(30u64)],
            10_000,
            4,
            true,
            &mut seeded(),
        )
        .unwrap();
        assert_eq!(schedule.len(), 12);
    }

    #[test]
    fn delays_are_sorted_and_bounded() {
        let duration = 45_000;
        let schedule = plan_schedule_with_rng(
            &[1, 2],
            &[U256::from(999u64), U256::from(1001u64)],
            duration,
            7,
            true,
            &mut seeded(),
        )
        .unwrap();

        let delays: Vec<u64> = schedule.events.iter().map(|e| e.delay_ms).collect();
        let mut sorted = delays.clone();
        sorted.sort_unstable();
        assert_eq!(delays, sorted);
        assert!(delays.iter().all(|&d| d <= duration));
    }

    #[test]
    fn single_interval_emits_full_amount_per_wallet() {
        let schedule = plan_schedule_with_rng(
            &[1, 2],
            &[U256::from(500u64), U256::from(700u64)],
            1_000,
            1,
            true,
            &mut seeded(),
        )
        .unwrap();

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.total_for_wallet(1), U256::from(500u64));
        assert_eq!(schedule.total_for_wallet(2), U256::from(700u64));
        for event in &schedule.events {
            assert!(event.amount > U256::ZERO);
        }
    }

    #[test]
    fn disabled_randomization_splits_as_evenly_as_integers_allow() {
        let schedule = plan_schedule_with_rng(
            &[9],
            &[U256::from(1_000_001u64)],
            10_000,
            4,
            false,
            &mut seeded(),
        )
        .unwrap();

        let mut amounts: Vec<U256> = schedule.events.iter().map(|e| e.amount).collect();
        amounts.sort();
        let spread = *amounts.last().unwrap() - *amounts.first().unwrap();
        assert_eq!(spread, U256::from(1));
        assert_eq!(schedule.total_for_wallet(9), U256::from(1_000_001u64));
    }

    #[test]
    fn early_window_mixes_wallets() {
        let duration = 10_000;
        let intervals = 5;
        let schedule = plan_schedule_with_rng(
            &[1, 2, 3],
            &[
                U256::from(100_000u64),
                U256::from(200_000u64),
                U256::from(300_000u64),
            ],
            duration,
            intervals,
            true,
            &mut seeded(),
        )
        .unwrap();

        let window = duration / u64::from(intervals);
        let first_window: Vec<u64> = schedule
            .events
            .iter()
            .filter(|e| e.delay_ms < window)
            .map(|e| e.wallet_id)
            .collect();
        assert!(first_window.contains(&1));
        assert!(first_window.contains(&2));
        assert!(first_window.contains(&3));
    }

    #[test]
    fn same_seed_reproduces_the_schedule() {
        let args = (
            [4u64, 5u64],
            [U256::from(1234u64), U256::from(5678u64)],
            30_000u64,
            6u32,
        );
        let a = plan_schedule_with_rng(&args.0, &args.1, args.2, args.3, true, &mut seeded())
            .unwrap();
        let b = plan_schedule_with_rng(&args.0, &args.1, args.2, args.3, true, &mut seeded())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let one = [U256::from(1u64)];
        assert!(plan_schedule(&[1, 2], &one, 1_000, 2, true).is_err());
        assert!(plan_schedule(&[], &[], 1_000, 2, true).is_err());
        assert!(plan_schedule(&[1], &one, 0, 2, true).is_err());
        assert!(plan_schedule(&[1], &one, 1_000, 0, true).is_err());
    }
}
