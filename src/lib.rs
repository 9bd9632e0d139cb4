// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod app;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Shorthand re-exports for the most used seams.
pub use domain::error::AppError;
pub use domain::types::{
    DripEvent, DripSchedule, GasEstimate, PoolKey, QuoteResult, SwapPath, UserOpReceipt,
    UserOperation,
};
pub use infrastructure::network;
pub use services::trading as core;
