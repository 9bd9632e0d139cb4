// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! ERC-4337 relay adapter. Each adapter wraps one bundler endpoint and speaks
//! the user-operation JSON-RPC surface against a configured entry point.
//! Failures are classified on the way out: transient failures may be retried
//! on another relay, rejected requests are invalid everywhere.

use crate::common::parsing::parse_b256_hex;
use crate::domain::error::AppError;
use crate::domain::types::{GasEstimate, UserOpReceipt, UserOperation};
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct BundlerConfig {
    pub name: String,
    pub endpoint: Url,
    pub chain_id: u64,
    pub entry_point: Address,
    pub send_timeout: Duration,
}

#[async_trait]
pub trait Bundler: Send + Sync {
    fn name(&self) -> &str;
    fn send_timeout(&self) -> Duration;

    /// Submits the operation, returning the relay-assigned operation hash.
    async fn submit(&self, op: &UserOperation) -> Result<B256, AppError>;

    async fn estimate_gas(&self, op: &UserOperation) -> Result<GasEstimate, AppError>;

    /// One receipt poll; `None` means still pending.
    async fn poll_receipt(&self, hash: B256) -> Result<Option<UserOpReceipt>, AppError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC bundler adapter.
pub struct HttpBundler {
    config: BundlerConfig,
    client: reqwest::Client,
}

impl HttpBundler {
    pub fn try_new(config: BundlerConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.send_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn entry_point(&self) -> Address {
        self.config.entry_point
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, AppError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1u64,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(self.config.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_send_error(&self.config.name, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(&self.config.name, status));
        }

        // A 2xx response means the relay handled the request; a body that
        // then fails to decode is a post-acceptance anomaly, not a transient
        // transport fault, and must not trigger a replay elsewhere.
        let body: RpcResponse = resp.json().await.map_err(|e| AppError::RelayRejected {
            relay: self.config.name.clone(),
            reason: format!("{method} response decode failed: {e}"),
        })?;

        if let Some(err) = body.error {
            return Err(classify_rpc_error(&self.config.name, err.code, &err.message));
        }
        body.result.ok_or_else(|| AppError::RelayRejected {
            relay: self.config.name.clone(),
            reason: format!("{method} response missing result"),
        })
    }
}

#[async_trait]
impl Bundler for HttpBundler {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn send_timeout(&self) -> Duration {
        self.config.send_timeout
    }

    async fn submit(&self, op: &UserOperation) -> Result<B256, AppError> {
        let result = self
            .request(
                "eth_sendUserOperation",
                json!([op, format!("{:#x}", self.config.entry_point)]),
            )
            .await?;
        let hash = decode_submit_hash(&self.config.name, &result)?;
        tracing::info!(
            target: "bundler",
            relay = %self.config.name,
            sender = %op.sender,
            hash = %hash,
            "User operation submitted"
        );
        Ok(hash)
    }

    async fn estimate_gas(&self, op: &UserOperation) -> Result<GasEstimate, AppError> {
        let result = self
            .request(
                "eth_estimateUserOperationGas",
                json!([op, format!("{:#x}", self.config.entry_point)]),
            )
            .await?;
        serde_json::from_value(result).map_err(|e| AppError::RelayRejected {
            relay: self.config.name.clone(),
            reason: format!("gas estimate decode failed: {e}"),
        })
    }

    async fn poll_receipt(&self, hash: B256) -> Result<Option<UserOpReceipt>, AppError> {
        let result = self
            .request("eth_getUserOperationReceipt", json!([format!("{hash:#x}")]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt = serde_json::from_value(result).map_err(|e| AppError::RelayRejected {
            relay: self.config.name.clone(),
            reason: format!("receipt decode failed: {e}"),
        })?;
        Ok(Some(receipt))
    }
}

/// A submission that returned a result was accepted by the relay, whatever
/// the hash looks like. Replaying it on another relay could land the
/// operation twice, so a malformed hash is classified non-retryable.
fn decode_submit_hash(relay: &str, result: &Value) -> Result<B256, AppError> {
    result
        .as_str()
        .and_then(parse_b256_hex)
        .ok_or_else(|| AppError::RelayRejected {
            relay: relay.to_string(),
            reason: format!("accepted submission returned a malformed hash: {result}"),
        })
}

fn classify_send_error(relay: &str, err: &reqwest::Error) -> AppError {
    // Anything that never reached the relay (or died mid-flight) is
    // retryable on the other endpoint.
    AppError::RelayTransient {
        relay: relay.to_string(),
        reason: if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            format!("transport error: {err}")
        },
    }
}

fn classify_status(relay: &str, status: StatusCode) -> AppError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AppError::RelayTransient {
            relay: relay.to_string(),
            reason: format!("relay returned {status}"),
        }
    } else {
        AppError::RelayRejected {
            relay: relay.to_string(),
            reason: format!("relay returned {status}"),
        }
    }
}

fn classify_rpc_error(relay: &str, code: i64, message: &str) -> AppError {
    let lowered = message.to_ascii_lowercase();
    let transient = lowered.contains("timeout")
        || lowered.contains("timed out")
        || lowered.contains("rate limit")
        || lowered.contains("too many requests")
        || lowered.contains("temporarily")
        || lowered.contains("overloaded")
        || lowered.contains("try again");
    if transient {
        AppError::RelayTransient {
            relay: relay.to_string(),
            reason: format!("rpc error {code}: {message}"),
        }
    } else {
        // Signature, nonce, balance and shape errors land here, as does
        // anything unrecognized: an unclassified submission must not be
        // replayed on another relay.
        AppError::RelayRejected {
            relay: relay.to_string(),
            reason: format!("rpc error {code}: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_errors_and_rate_limits_are_transient() {
        assert!(classify_status("a", StatusCode::BAD_GATEWAY).is_failover_worthy());
        assert!(classify_status("a", StatusCode::TOO_MANY_REQUESTS).is_failover_worthy());
        assert!(!classify_status("a", StatusCode::BAD_REQUEST).is_failover_worthy());
    }

    #[test]
    fn rpc_rejections_never_fail_over() {
        let err = classify_rpc_error("a", -32507, "AA24 signature error");
        assert!(!err.is_failover_worthy());
        let err = classify_rpc_error("a", -32601, "AA25 invalid account nonce");
        assert!(!err.is_failover_worthy());
        // Unknown errors default to rejected: replaying them risks double execution.
        let err = classify_rpc_error("a", -32000, "something unexpected");
        assert!(!err.is_failover_worthy());
    }

    #[test]
    fn malformed_hash_after_acceptance_never_fails_over() {
        // Truncated hash string.
        let err = decode_submit_hash("a", &json!("0x1234")).unwrap_err();
        assert!(!err.is_failover_worthy());
        // Wrong JSON shape entirely.
        let err = decode_submit_hash("a", &json!(42)).unwrap_err();
        assert!(!err.is_failover_worthy());

        let full = format!("0x{}", "ab".repeat(32));
        let hash = decode_submit_hash("a", &json!(full)).unwrap();
        assert_eq!(hash, B256::repeat_byte(0xab));
    }

    #[test]
    fn rate_limit_messages_are_transient() {
        assert!(classify_rpc_error("a", -32005, "rate limit exceeded").is_failover_worthy());
        assert!(classify_rpc_error("a", -32000, "request timed out").is_failover_worthy());
    }
}
