//! Error scenario tests for the retry executor.
//!
//! Organized by where the failure happens:
//!
//! - Phase 1: send() errors (wallet rejection, nonce, network)
//! - Phase 2: confirm() errors (reverted receipt, watcher failure)
//! - Phase 3: exhaustion and normalization
//!
//! Test naming convention:
//! - `test_e{N}_{error_name}` - Single error scenario
//! - `test_r{N}_{result_name}` - Retry result scenario

use std::time::Duration;

use alloy::primitives::Bytes;

use super::{Expected, RetryScenario, ScriptedChain, Step};
use crate::ext::{
    execute_with_retry, from_fn, ErrorCode, ErrorKind, GasOptions, GasStrategy, RawTxError,
    RetryConfig, TxExecutor, TxOperation, ValidationFailure, DEFAULT_RETRY_DELAY,
};

fn executor() -> TxExecutor {
    TxExecutor::new(RetryConfig::default().with_cost_estimate(false))
}

// ============================================================================
// Phase 1: send() Errors
// ============================================================================

/// E1: Wallet rejects the request
///
/// Expected: one attempt, no retry, rejection message
#[test_log::test(tokio::test(start_paused = true))]
async fn test_e1_user_rejected() {
    let result = RetryScenario::new("submit claim")
        .step(Step::send_error("MetaMask Tx Signature: User denied transaction signature."))
        .step(Step::Confirm)
        .expect(Expected::Failed(ErrorKind::UserRejected))
        .expect_attempts(1)
        .run()
        .await;

    result.assert_passed();
    assert_eq!(result.error().message, "Transaction was rejected by user.");
    assert!(result.error().is_user_rejection());
}

/// E2: Rejection signalled only by code 4001
#[tokio::test(start_paused = true)]
async fn test_e2_user_rejected_by_code() {
    let chain = ScriptedChain::new([
        Step::SendError(RawTxError::from_message("request failed").with_code(ErrorCode::Numeric(4001))),
        Step::Confirm,
    ]);

    let err = executor()
        .execute(chain.operation(), "process claim", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UserRejected);
    assert_eq!(chain.attempts().len(), 1);
    assert_eq!(chain.remaining(), 1);
}

/// E3: Nonce conflict on every attempt of the standard strategy
///
/// Expected: two attempts separated by the retry delay
#[tokio::test(start_paused = true)]
async fn test_e3_nonce_too_low_exhausts_standard_strategy() {
    let result = RetryScenario::new("submit claim")
        .step(Step::send_error("nonce too low"))
        .step(Step::send_error("nonce too low"))
        .expect(Expected::Failed(ErrorKind::NonceConflict))
        .expect_attempts(2)
        .run()
        .await;

    result.assert_passed();
    assert_eq!(result.delays(), vec![DEFAULT_RETRY_DELAY]);

    let options: Vec<_> = result.attempts.iter().map(|a| a.options).collect();
    assert_eq!(
        options,
        vec![GasOptions::default(), GasOptions::with_gas_limit(500_000)]
    );
}

/// E4: Network failures across the funding strategy
#[tokio::test(start_paused = true)]
async fn test_e4_network_errors_exhaust_funding_strategy() {
    let result = RetryScenario::new("fund policy")
        .strategy(GasStrategy::funding())
        .step(Step::send_error("request timed out"))
        .step(Step::send_error("connection reset by peer"))
        .step(Step::send_error("could not detect network"))
        .expect(Expected::Failed(ErrorKind::Network))
        .expect_attempts(3)
        .run()
        .await;

    result.assert_passed();
    assert_eq!(result.delays(), vec![DEFAULT_RETRY_DELAY, DEFAULT_RETRY_DELAY]);

    let limits: Vec<_> = result.attempts.iter().map(|a| a.options.gas_limit).collect();
    assert_eq!(limits, vec![None, Some(200_000), Some(300_000)]);
    assert!(!result.error().is_terminal());
}

/// E5: Terminal error on a later attempt stops the sequence there
#[tokio::test(start_paused = true)]
async fn test_e5_terminal_error_after_retryable() {
    let chain = ScriptedChain::new([
        Step::send_error("internal JSON-RPC error"),
        Step::send_error("user rejected transaction"),
        Step::Confirm,
    ]);

    let err = executor()
        .execute(chain.operation(), "withdraw funds", Some(&GasStrategy::funding()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UserRejected);
    assert_eq!(chain.attempts().len(), 2);
    assert_eq!(chain.remaining(), 1);
}

// ============================================================================
// Phase 2: confirm() Errors
// ============================================================================

/// E6: Policy validation revert surfaces while waiting for the receipt
#[tokio::test(start_paused = true)]
async fn test_e6_validation_revert_on_confirm() {
    let result = RetryScenario::new("submit claim")
        .step(Step::ConfirmError(RawTxError::from_reason(
            "execution reverted: Amount exceeds policy maximum",
        )))
        .step(Step::Confirm)
        .expect(Expected::Failed(ErrorKind::Validation(
            ValidationFailure::AmountExceedsLimit,
        )))
        .expect_attempts(1)
        .run()
        .await;

    result.assert_passed();
    assert_eq!(
        result.error().message,
        "Claim amount exceeds the policy maximum allowed amount."
    );
}

/// E7: Custom error revert data decodes to a validation kind
#[tokio::test(start_paused = true)]
async fn test_e7_custom_error_revert_data() {
    use alloy::sol_types::SolError;

    use crate::ext::ReimbursementPolicy;

    let data = Bytes::from(ReimbursementPolicy::InvalidAccessCode {}.abi_encode());
    let raw = RawTxError::from_message("execution reverted").with_revert_data(&data);

    let result = RetryScenario::new("submit claim")
        .step(Step::SendError(raw))
        .expect(Expected::Failed(ErrorKind::Validation(
            ValidationFailure::InvalidAccessCode,
        )))
        .expect_attempts(1)
        .run()
        .await;

    result.assert_passed();
}

/// E8: Mined with failed status counts as a failed attempt and is retried
#[tokio::test(start_paused = true)]
async fn test_e8_reverted_receipt_is_retried() {
    let result = RetryScenario::new("process claim")
        .step(Step::confirm_error("execution reverted (transaction 0x01)"))
        .step(Step::Confirm)
        .expect(Expected::ConfirmedOn(2))
        .expect_attempts(2)
        .run()
        .await;

    result.assert_passed();
}

// ============================================================================
// Phase 3: Exhaustion and Normalization
// ============================================================================

/// E9: Unrecognized error is prefixed with the operation name
#[tokio::test(start_paused = true)]
async fn test_e9_unknown_error_prefixed() {
    let result = RetryScenario::new("deploy policy")
        .step(Step::send_error("something odd happened"))
        .step(Step::send_error("something odd happened"))
        .expect(Expected::Failed(ErrorKind::Unknown))
        .run()
        .await;

    result.assert_passed();
    assert_eq!(
        result.error().message,
        "Failed to deploy policy: something odd happened"
    );
}

/// E10: Error with no usable text
#[tokio::test(start_paused = true)]
async fn test_e10_empty_error() {
    let result = RetryScenario::new("submit claim")
        .step(Step::SendError(RawTxError::default()))
        .step(Step::SendError(RawTxError::default()))
        .expect(Expected::Failed(ErrorKind::Unknown))
        .run()
        .await;

    result.assert_passed();
    assert_eq!(
        result.error().message,
        "Failed to submit claim: Unknown error occurred"
    );
}

/// E11: The last failure is the one normalized
#[tokio::test(start_paused = true)]
async fn test_e11_last_error_wins() {
    let result = RetryScenario::new("fund policy")
        .step(Step::send_error("nonce too low"))
        .step(Step::send_error("insufficient funds for gas * price + value"))
        .expect(Expected::Failed(ErrorKind::InsufficientFunds))
        .run()
        .await;

    result.assert_passed();
}

// ============================================================================
// Retry Results
// ============================================================================

/// R1: First attempt fails, second succeeds; no third submission
#[test_log::test(tokio::test(start_paused = true))]
async fn test_r1_second_attempt_succeeds() {
    let strategy = GasStrategy::new(vec![
        GasOptions::default(),
        GasOptions::with_gas_limit(200_000),
    ]);
    let chain = ScriptedChain::new([
        Step::send_error("replacement transaction underpriced"),
        Step::Confirm,
        Step::Confirm,
    ]);

    let confirmed = executor()
        .execute(chain.operation(), "fund policy", Some(&strategy))
        .await
        .unwrap();

    assert_eq!(confirmed.attempts, 2);
    assert_eq!(confirmed.options, GasOptions::with_gas_limit(200_000));
    assert_eq!(confirmed.receipt.attempt, 2);
    assert_eq!(confirmed.tx_hash(), confirmed.receipt.tx_hash);
    assert_eq!(chain.attempts().len(), 2);
    assert_eq!(chain.remaining(), 1);
}

/// R2: First attempt succeeds without any delay
#[tokio::test(start_paused = true)]
async fn test_r2_first_attempt_succeeds() {
    let start = tokio::time::Instant::now();
    let result = RetryScenario::new("process claim")
        .step(Step::Confirm)
        .expect(Expected::ConfirmedOn(1))
        .expect_attempts(1)
        .run()
        .await;

    result.assert_passed();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

/// R3: Single-entry strategy never sleeps
#[tokio::test(start_paused = true)]
async fn test_r3_single_entry_no_delay() {
    let start = tokio::time::Instant::now();
    let result = RetryScenario::new("approve tokens")
        .strategy(GasStrategy::new(vec![GasOptions::with_gas_limit(80_000)]))
        .step(Step::send_error("network error"))
        .expect(Expected::Failed(ErrorKind::Network))
        .expect_attempts(1)
        .run()
        .await;

    result.assert_passed();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

/// R4: Empty strategy degrades to one default attempt
#[tokio::test(start_paused = true)]
async fn test_r4_empty_strategy() {
    let result = RetryScenario::new("submit claim")
        .strategy(GasStrategy::new(Vec::new()))
        .step(Step::Confirm)
        .expect(Expected::ConfirmedOn(1))
        .run()
        .await;

    result.assert_passed();
    assert_eq!(result.attempts[0].options, GasOptions::default());
}

/// R5: Custom retry delay
#[tokio::test(start_paused = true)]
async fn test_r5_custom_retry_delay() {
    let result = RetryScenario::new("submit claim")
        .retry_delay(Duration::from_millis(250))
        .step(Step::send_error("timeout"))
        .step(Step::Confirm)
        .expect(Expected::ConfirmedOn(2))
        .run()
        .await;

    result.assert_passed();
    assert_eq!(result.delays(), vec![Duration::from_millis(250)]);
}

/// R6: Failed gas estimation does not change the attempt count
#[tokio::test(start_paused = true)]
async fn test_r6_estimate_failure_ignored() {
    let chain = ScriptedChain::new([Step::send_error("nonce too low"), Step::Confirm])
        .with_estimate(Err(RawTxError::from_message("cannot estimate gas")));

    let confirmed = TxExecutor::default()
        .execute(chain.operation(), "submit claim", None)
        .await
        .unwrap();

    assert_eq!(confirmed.attempts, 2);
    assert_eq!(chain.attempts().len(), 2);
    assert_eq!(
        chain.estimates(),
        vec![GasOptions::default(), GasOptions::with_gas_limit(500_000)]
    );
}

/// R7: Estimation is skipped when disabled
#[tokio::test(start_paused = true)]
async fn test_r7_estimate_disabled() {
    let chain = ScriptedChain::new([Step::Confirm]).with_estimate(Ok(21_000));

    executor()
        .execute(chain.operation(), "submit claim", None)
        .await
        .unwrap();

    assert!(chain.estimates().is_empty());
}

/// R8: Closure-based operation
#[tokio::test(start_paused = true)]
async fn test_r8_from_fn_operation() {
    let chain = ScriptedChain::new([Step::send_error("timeout"), Step::Confirm]);
    let source = chain.clone();

    let operation = from_fn(move |options: &GasOptions| {
        let mut op = source.operation();
        let options = *options;
        async move { op.send(&options).await }
    });

    let confirmed = executor()
        .execute(operation, "withdraw funds", Some(&GasStrategy::funding()))
        .await
        .unwrap();

    assert_eq!(confirmed.attempts, 2);
    assert_eq!(confirmed.options.gas_limit, Some(200_000));
}

/// R9: Free function uses the standard strategy and default delay
#[tokio::test(start_paused = true)]
async fn test_r9_execute_with_retry_defaults() {
    let chain = ScriptedChain::new([Step::send_error("failed to fetch"), Step::Confirm]);
    let start = tokio::time::Instant::now();

    let confirmed = execute_with_retry(chain.operation(), "submit claim", None)
        .await
        .unwrap();

    assert_eq!(confirmed.attempts, 2);
    assert_eq!(confirmed.options.gas_limit, Some(500_000));
    assert!(start.elapsed() >= DEFAULT_RETRY_DELAY);
}
