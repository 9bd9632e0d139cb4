// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Client capability missing: {0}")]
    CapabilityMissing(String),

    #[error("No pool discoverable for token {0}")]
    PoolNotDiscoverable(Address),

    #[error("Relay {relay} transient failure: {reason}")]
    RelayTransient { relay: String, reason: String },

    #[error("Relay {relay} rejected request: {reason}")]
    RelayRejected { relay: String, reason: String },

    #[error("Transaction failed: {hash:?}, reason: {reason}")]
    Transaction { hash: String, reason: String },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Address {0} is invalid or not checksummed")]
    InvalidAddress(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Only transient relay failures justify retrying the identical request
    /// against another relay. A rejected request is invalid on every relay,
    /// and retrying an unclassified submission risks double execution.
    pub fn is_failover_worthy(&self) -> bool {
        matches!(self, AppError::RelayTransient { .. })
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
