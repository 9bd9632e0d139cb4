// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::infrastructure::network::bundler::BundlerConfig;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub http_provider: Option<String>,

    // Relay endpoints. Exactly one primary is mandatory; the secondary is
    // optional and shares the primary entry point unless overridden.
    pub bundler_primary_url: String,
    #[serde(default = "default_primary_name")]
    pub bundler_primary_name: String,
    pub bundler_secondary_url: Option<String>,
    #[serde(default = "default_secondary_name")]
    pub bundler_secondary_name: String,
    pub entry_point: Option<Address>,
    pub secondary_entry_point: Option<Address>,

    #[serde(default = "default_send_timeout_ms")]
    pub bundler_send_timeout_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_false")]
    pub log_json: bool,
}

// Defaults
fn default_chain_id() -> u64 {
    constants::CHAIN_BASE
}
fn default_primary_name() -> String {
    "primary".to_string()
}
fn default_secondary_name() -> String {
    "secondary".to_string()
}
fn default_send_timeout_ms() -> u64 {
    4_000
}
fn default_receipt_poll_ms() -> u64 {
    500
}
fn default_receipt_timeout_ms() -> u64 {
    12_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_false() -> bool {
    false
}

impl GlobalSettings {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: env/.env > profile file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if settings.bundler_primary_url.trim().is_empty() {
            return Err(AppError::Config("BUNDLER_PRIMARY_URL is missing".to_string()));
        }

        Ok(settings)
    }

    pub fn get_http_provider(&self) -> Result<String, AppError> {
        if let Some(url) = &self.http_provider {
            if !url.trim().is_empty() {
                return Ok(url.trim().to_string());
            }
        }
        let candidates = [
            format!("http_provider_{}", self.chain_id),
            "http_provider".to_string(),
        ];
        for key in candidates {
            if let Ok(v) = std::env::var(&key) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }
        Err(AppError::Config(format!(
            "No RPC URL found for chain {}",
            self.chain_id
        )))
    }

    pub fn entry_point_value(&self) -> Address {
        self.entry_point.unwrap_or(constants::ENTRY_POINT_V07)
    }

    pub fn send_timeout_value(&self) -> Duration {
        Duration::from_millis(self.bundler_send_timeout_ms.max(250))
    }

    pub fn receipt_poll_value(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(100))
    }

    pub fn receipt_timeout_value(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms.max(self.receipt_poll_ms.max(100)))
    }

    pub fn primary_bundler(&self) -> Result<BundlerConfig, AppError> {
        let endpoint = parse_endpoint(&self.bundler_primary_url, "bundler_primary_url")?;
        Ok(BundlerConfig {
            name: self.bundler_primary_name.clone(),
            endpoint,
            chain_id: self.chain_id,
            entry_point: self.entry_point_value(),
            send_timeout: self.send_timeout_value(),
        })
    }

    pub fn secondary_bundler(&self) -> Result<Option<BundlerConfig>, AppError> {
        let Some(raw) = self.bundler_secondary_url.as_deref() else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let endpoint = parse_endpoint(raw, "bundler_secondary_url")?;
        Ok(Some(BundlerConfig {
            name: self.bundler_secondary_name.clone(),
            endpoint,
            chain_id: self.chain_id,
            entry_point: self
                .secondary_entry_point
                .unwrap_or_else(|| self.entry_point_value()),
            send_timeout: self.send_timeout_value(),
        }))
    }
}

fn parse_endpoint(raw: &str, field: &str) -> Result<Url, AppError> {
    Url::parse(raw.trim())
        .map_err(|e| AppError::Config(format!("{field} is not a valid URL: {e}")))
}
