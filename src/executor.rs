//! Retrying transaction executor.
//!
//! [`TxExecutor::execute`] submits one state-changing call, walking an ordered
//! [`GasStrategy`] until an attempt confirms:
//!
//! ```text
//! for options in strategy:
//!     estimate_gas(options)        advisory, logged only
//!     send(options) → PendingTx
//!     confirm()      → Confirmed    return
//!     error:
//!         terminal   → classify     return Err
//!         retryable  → sleep(retry_delay), next options
//! exhausted → classify(last error)  return Err
//! ```
//!
//! Attempts never overlap. Each one may consume the account's next nonce, so
//! the next attempt starts only after the previous one has fully failed.

use std::{future::Future, time::Duration};

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::Network,
    primitives::B256,
    providers::{PendingTransactionBuilder, Provider},
};

use crate::ext::{
    classify, should_retry, Confirmed, GasOptions, GasStrategy, PendingTx, RawTxError, TxError,
};

// ============================================================================
// Configuration
// ============================================================================

/// Default pause between a retryable failure and the next strategy entry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Gas limit for the first approval attempt.
pub const APPROVE_GAS_LIMIT: u64 = 80_000;

/// Gas limit for the max-amount approval fallback.
pub const APPROVE_FALLBACK_GAS_LIMIT: u64 = 100_000;

/// Gas limits used by the token approval helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalConfig {
    /// Gas limit of the exact-amount attempt (default: 80 000)
    pub gas_limit: u64,
    /// Gas limit of the `U256::MAX` fallback attempt (default: 100 000)
    pub fallback_gas_limit: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            gas_limit: APPROVE_GAS_LIMIT,
            fallback_gas_limit: APPROVE_FALLBACK_GAS_LIMIT,
        }
    }
}

/// Configuration for the retry executor.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Pause between retryable failures (default: 2 seconds)
    pub retry_delay: Duration,
    /// Run an advisory gas estimate before each attempt (default: true)
    pub estimate_cost: bool,
    /// Strategy for general writes (default: `GasStrategy::standard()`)
    pub default_strategy: GasStrategy,
    /// Strategy for fund/withdraw (default: `GasStrategy::funding()`)
    pub funding_strategy: GasStrategy,
    pub approval: ApprovalConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            estimate_cost: true,
            default_strategy: GasStrategy::standard(),
            funding_strategy: GasStrategy::funding(),
            approval: ApprovalConfig::default(),
        }
    }
}

impl RetryConfig {
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Enable or disable the advisory gas estimate
    pub fn with_cost_estimate(mut self, enabled: bool) -> Self {
        self.estimate_cost = enabled;
        self
    }

    pub fn with_default_strategy(mut self, strategy: GasStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_funding_strategy(mut self, strategy: GasStrategy) -> Self {
        self.funding_strategy = strategy;
        self
    }

    pub fn with_approval(mut self, approval: ApprovalConfig) -> Self {
        self.approval = approval;
        self
    }
}

// ============================================================================
// TxOperation
// ============================================================================

/// A state-changing call that can be submitted with a given option-set.
///
/// Call arguments are bound into the operation value; only gas options vary
/// between attempts.
#[allow(async_fn_in_trait)]
pub trait TxOperation {
    type Pending: PendingTx;

    /// Submit the call with `options` applied.
    async fn send(&mut self, options: &GasOptions) -> Result<Self::Pending, RawTxError>;

    /// Estimate gas for the call with `options` applied.
    ///
    /// Only used for logging. The default reports that no estimate is
    /// available.
    async fn estimate_gas(&self, _options: &GasOptions) -> Result<u64, RawTxError> {
        Err(RawTxError::from_message("gas estimation not supported"))
    }
}

impl<P, D, N> TxOperation for CallBuilder<P, D, N>
where
    P: Provider<N> + Clone,
    D: CallDecoder + Clone,
    N: Network,
{
    type Pending = PendingTransactionBuilder<N>;

    async fn send(&mut self, options: &GasOptions) -> Result<Self::Pending, RawTxError> {
        options
            .apply(self.clone())
            .send()
            .await
            .map_err(RawTxError::from)
    }

    async fn estimate_gas(&self, options: &GasOptions) -> Result<u64, RawTxError> {
        options
            .apply(self.clone())
            .estimate_gas()
            .await
            .map_err(RawTxError::from)
    }
}

/// Adapter turning a closure into a [`TxOperation`]. See [`from_fn`].
pub struct FnOperation<F> {
    f: F,
}

/// Wrap `f(&GasOptions) -> Future<Output = Result<PendingTx, RawTxError>>`
/// as an operation without gas estimation.
pub fn from_fn<F, Fut, T>(f: F) -> FnOperation<F>
where
    F: FnMut(&GasOptions) -> Fut,
    Fut: Future<Output = Result<T, RawTxError>>,
    T: PendingTx,
{
    FnOperation { f }
}

impl<F, Fut, T> TxOperation for FnOperation<F>
where
    F: FnMut(&GasOptions) -> Fut,
    Fut: Future<Output = Result<T, RawTxError>>,
    T: PendingTx,
{
    type Pending = T;

    async fn send(&mut self, options: &GasOptions) -> Result<T, RawTxError> {
        (self.f)(options).await
    }
}

// ============================================================================
// TxExecutor
// ============================================================================

/// Receipt type produced by an operation.
pub type ReceiptOf<O> = <<O as TxOperation>::Pending as PendingTx>::Receipt;

/// Executes operations with strategy-based retries.
#[derive(Debug, Clone, Default)]
pub struct TxExecutor {
    config: RetryConfig,
}

impl TxExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Submit `operation`, retrying across `strategy` (or the configured
    /// default strategy when `None`).
    ///
    /// Returns the first confirmed attempt. Terminal failures stop the
    /// sequence at once; otherwise the last failure is normalized after the
    /// final entry.
    pub async fn execute<O: TxOperation>(
        &self,
        mut operation: O,
        operation_name: &str,
        strategy: Option<&GasStrategy>,
    ) -> Result<Confirmed<ReceiptOf<O>>, TxError> {
        let strategy = strategy.unwrap_or(&self.config.default_strategy);
        let total = strategy.len();
        let mut last_error: Option<RawTxError> = None;

        for (index, options) in strategy.iter().enumerate() {
            let attempt = index + 1;

            if self.config.estimate_cost {
                log_gas_estimate(&operation, options, operation_name, attempt).await;
            }

            tracing::debug!(
                operation = operation_name,
                attempt,
                total,
                options = %options,
                "submitting transaction"
            );

            match submit_and_confirm(&mut operation, options).await {
                Ok((tx_hash, receipt)) => {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        %tx_hash,
                        "transaction confirmed"
                    );
                    return Ok(Confirmed {
                        tx_hash,
                        receipt,
                        options: *options,
                        attempts: attempt,
                    });
                }

                Err(error) if !should_retry(Some(&error)) => {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        error = %error,
                        "terminal error, not retrying"
                    );
                    return Err(classify(Some(&error), operation_name));
                }

                Err(error) => {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        total,
                        error = %error,
                        "attempt failed"
                    );
                    last_error = Some(error);

                    if attempt < total {
                        tracing::debug!(
                            operation = operation_name,
                            delay = ?self.config.retry_delay,
                            "retrying with next gas strategy"
                        );
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        tracing::warn!(
            operation = operation_name,
            attempts = total,
            "all gas strategies exhausted"
        );
        Err(classify(last_error.as_ref(), operation_name))
    }
}

/// Execute with the default [`RetryConfig`].
///
/// `strategy` overrides the standard `[{}, {gas_limit: 500_000}]` list.
pub async fn execute_with_retry<O: TxOperation>(
    operation: O,
    operation_name: &str,
    strategy: Option<&GasStrategy>,
) -> Result<Confirmed<ReceiptOf<O>>, TxError> {
    TxExecutor::default()
        .execute(operation, operation_name, strategy)
        .await
}

/// Send one attempt and wait for it to be mined.
pub(crate) async fn submit_and_confirm<O: TxOperation>(
    operation: &mut O,
    options: &GasOptions,
) -> Result<(B256, ReceiptOf<O>), RawTxError> {
    let pending = operation.send(options).await?;
    let tx_hash = pending.tx_hash();
    tracing::debug!(%tx_hash, "transaction sent, waiting for confirmation");
    let receipt = pending.confirm().await?;
    Ok((tx_hash, receipt))
}

/// Advisory gas estimate. The outcome is logged and discarded.
async fn log_gas_estimate<O: TxOperation>(
    operation: &O,
    options: &GasOptions,
    operation_name: &str,
    attempt: usize,
) {
    match operation.estimate_gas(options).await {
        Ok(gas) => {
            tracing::debug!(operation = operation_name, attempt, gas, "estimated gas");
        }
        Err(e) => {
            tracing::debug!(
                operation = operation_name,
                attempt,
                error = %e,
                "gas estimation failed, continuing"
            );
        }
    }
}
