//! Retry behavior scenario framework.
//!
//! `RetryScenario` wires a script of [`Step`]s to a [`TxExecutor`] and
//! checks the outcome against expectations in one place.

use std::time::Duration;

use crate::ext::{Confirmed, ErrorKind, GasStrategy, RetryConfig, TxError, TxExecutor};

use super::{Attempt, MockReceipt, ScriptedChain, Step};

// ============================================================================
// Expected
// ============================================================================

/// Expected final outcome of a scenario
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// Confirmed on the given 1-based attempt
    ConfirmedOn(usize),
    /// Failed with the given kind
    Failed(ErrorKind),
}

// ============================================================================
// RetryScenario
// ============================================================================

/// A configurable retry scenario
///
/// # Example
///
/// ```ignore
/// RetryScenario::new("fund policy")
///     .strategy(GasStrategy::funding())
///     .step(Step::send_error("could not coalesce error"))
///     .step(Step::Confirm)
///     .expect(Expected::ConfirmedOn(2))
///     .run()
///     .await
///     .assert_passed();
/// ```
pub struct RetryScenario {
    operation_name: String,
    steps: Vec<Step>,
    strategy: Option<GasStrategy>,
    config: RetryConfig,
    expected: Option<Expected>,
    expected_attempts: Option<usize>,
}

impl RetryScenario {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            steps: Vec::new(),
            strategy: None,
            config: RetryConfig::default().with_cost_estimate(false),
            expected: None,
            expected_attempts: None,
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn strategy(mut self, strategy: GasStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_retry_delay(delay);
        self
    }

    pub fn expect(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Number of submissions the executor must make
    pub fn expect_attempts(mut self, attempts: usize) -> Self {
        self.expected_attempts = Some(attempts);
        self
    }

    /// Run the scenario against a fresh script
    pub async fn run(self) -> ScenarioResult {
        let chain = ScriptedChain::new(self.steps);
        let executor = TxExecutor::new(self.config);

        let outcome = executor
            .execute(chain.operation(), &self.operation_name, self.strategy.as_ref())
            .await;
        let attempts = chain.attempts();

        let mut failures = Vec::new();
        match (&self.expected, &outcome) {
            (Some(Expected::ConfirmedOn(n)), Ok(confirmed)) => {
                if confirmed.attempts != *n || confirmed.receipt.attempt != *n {
                    failures.push(format!(
                        "expected confirmation on attempt {n}, got {}",
                        confirmed.attempts
                    ));
                }
            }
            (Some(Expected::Failed(kind)), Err(err)) => {
                if err.kind != *kind {
                    failures.push(format!("expected {kind:?}, got {:?}", err.kind));
                }
            }
            (Some(expected), actual) => {
                failures.push(format!("expected {expected:?}, got {actual:?}"));
            }
            (None, _) => {}
        }

        if let Some(n) = self.expected_attempts {
            if attempts.len() != n {
                failures.push(format!("expected {n} attempts, got {}", attempts.len()));
            }
        }

        ScenarioResult {
            name: self.operation_name,
            outcome,
            attempts,
            failures,
        }
    }
}

// ============================================================================
// ScenarioResult
// ============================================================================

/// Result of running a scenario
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Result<Confirmed<MockReceipt>, TxError>,
    pub attempts: Vec<Attempt>,
    pub failures: Vec<String>,
}

impl ScenarioResult {
    pub fn assert_passed(&self) {
        assert!(
            self.failures.is_empty(),
            "Scenario '{}' failed: {:?}",
            self.name,
            self.failures
        );
    }

    /// Gaps between consecutive attempts
    pub fn delays(&self) -> Vec<Duration> {
        self.attempts
            .windows(2)
            .map(|w| w[1].at.duration_since(w[0].at))
            .collect()
    }

    pub fn error(&self) -> &TxError {
        match &self.outcome {
            Err(e) => e,
            Ok(c) => panic!("Scenario '{}' confirmed on attempt {}", self.name, c.attempts),
        }
    }
}
