// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Failover routing across redundant bundler relays. One primary adapter is
//! mandatory, one secondary is optional. Attempts are strictly sequential:
//! racing two relays with the same state-changing operation could land it
//! twice, so latency is traded for submission safety.

use crate::app::config::GlobalSettings;
use crate::domain::error::AppError;
use crate::domain::types::{GasEstimate, UserOpReceipt, UserOperation};
use alloy::primitives::B256;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

use super::bundler::{Bundler, HttpBundler};

/// Result of a routed operation, tagged with the relay that served it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed<T> {
    pub relay: String,
    pub value: T,
}

/// Built once by the composition root and shared read-only afterwards.
pub struct BundlerRouter {
    primary: Arc<dyn Bundler>,
    secondary: Option<Arc<dyn Bundler>>,
    receipt_poll: Duration,
    receipt_timeout: Duration,
}

impl BundlerRouter {
    pub fn new(
        primary: Arc<dyn Bundler>,
        secondary: Option<Arc<dyn Bundler>>,
        receipt_poll: Duration,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            receipt_poll,
            receipt_timeout,
        }
    }

    pub fn from_settings(settings: &GlobalSettings) -> Result<Self, AppError> {
        let primary: Arc<dyn Bundler> =
            Arc::new(HttpBundler::try_new(settings.primary_bundler()?)?);
        let secondary: Option<Arc<dyn Bundler>> = match settings.secondary_bundler()? {
            Some(config) => Some(Arc::new(HttpBundler::try_new(config)?)),
            None => None,
        };
        Ok(Self::new(
            primary,
            secondary,
            settings.receipt_poll_value(),
            settings.receipt_timeout_value(),
        ))
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub async fn submit(&self, op: &UserOperation) -> Result<Routed<B256>, AppError> {
        self.route(|relay| async move { relay.submit(op).await })
            .await
    }

    pub async fn estimate_gas(&self, op: &UserOperation) -> Result<Routed<GasEstimate>, AppError> {
        self.route(|relay| async move { relay.estimate_gas(op).await })
            .await
    }

    pub async fn poll_receipt(
        &self,
        hash: B256,
    ) -> Result<Routed<Option<UserOpReceipt>>, AppError> {
        self.route(|relay| async move { relay.poll_receipt(hash).await })
            .await
    }

    /// Polls until the operation is included or the receipt timeout elapses.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<Routed<UserOpReceipt>, AppError> {
        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            let routed = self.poll_receipt(hash).await?;
            if let Some(receipt) = routed.value {
                return Ok(Routed {
                    relay: routed.relay,
                    value: receipt,
                });
            }
            if Instant::now() + self.receipt_poll > deadline {
                return Err(AppError::Transaction {
                    hash: format!("{hash:#x}"),
                    reason: format!("no receipt within {:?}", self.receipt_timeout),
                });
            }
            sleep(self.receipt_poll).await;
        }
    }

    /// Primary first, bounded by its own send timeout. Failover to the
    /// secondary happens only for transient classifications, and only after
    /// the primary attempt has fully resolved.
    async fn route<T, F, Fut>(&self, make: F) -> Result<Routed<T>, AppError>
    where
        F: Fn(Arc<dyn Bundler>) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let primary_err = match attempt(&self.primary, &make).await {
            Ok(value) => {
                return Ok(Routed {
                    relay: self.primary.name().to_string(),
                    value,
                });
            }
            Err(err) => err,
        };

        if primary_err.is_failover_worthy() {
            if let Some(secondary) = &self.secondary {
                tracing::warn!(
                    target: "bundler",
                    primary = %self.primary.name(),
                    secondary = %secondary.name(),
                    error = %primary_err,
                    "Primary relay failed transiently; failing over"
                );
                return match attempt(secondary, &make).await {
                    Ok(value) => Ok(Routed {
                        relay: secondary.name().to_string(),
                        value,
                    }),
                    Err(err) => Err(err),
                };
            }
        }

        Err(primary_err)
    }
}

async fn attempt<T, F, Fut>(adapter: &Arc<dyn Bundler>, make: &F) -> Result<T, AppError>
where
    F: Fn(Arc<dyn Bundler>) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match timeout(adapter.send_timeout(), make(Arc::clone(adapter))).await {
        Ok(result) => result,
        Err(_) => Err(AppError::RelayTransient {
            relay: adapter.name().to_string(),
            reason: format!("no response within {:?}", adapter.send_timeout()),
        }),
    }
}
