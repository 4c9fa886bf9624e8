//! Error types for transaction submission.
//!
//! Two layers:
//!
//! - [`RawTxError`]: whatever a provider, wallet, or contract call produced,
//!   flattened into the handful of fields the classifier reads (nested
//!   provider-data message, revert reason, top-level message, code).
//! - [`TxError`]: the normalized error handed back to callers. It always
//!   carries one stable, user-facing sentence and an [`ErrorKind`].
//!
//! Conversions from alloy's transport, contract, and pending-transaction
//! errors live here so every call site can use `map_err(RawTxError::from)`.

use std::fmt;

use alloy::{
    contract::Error as ContractError,
    primitives::Bytes,
    providers::PendingTransactionError,
    transports::{RpcError, TransportError},
};
use serde_json::Value;

use crate::ext::decode_revert_data;

/// Text used when a failure carries no message at all.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

// ============================================================================
// Error Classification Types
// ============================================================================

/// Whether another gas strategy could plausibly succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient or gas-related; try the next strategy.
    Retryable,
    /// Will fail the same way again; stop immediately.
    Terminal,
}

/// Contract-level validation failures raised by the policy contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    AmountExceedsLimit,
    PolicyInactive,
    InvalidAccessCode,
    MissingReceipt,
    NotAuthorized,
    InsufficientContractBalance,
}

/// Classified failure kinds, one per normalized message family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user dismissed the wallet prompt
    UserRejected,
    /// Wallet/provider reported an internal JSON-RPC error
    ProviderInternal,
    /// Wallet does not recognize the requesting account
    UnrecognizedAccount,
    /// Malformed call arguments
    InvalidArguments,
    /// Nonce already consumed
    NonceConflict,
    /// A pending transaction with the same nonce blocks this one
    ReplacementUnderpriced,
    /// Rejected by a contract `require`/custom error
    Validation(ValidationFailure),
    /// Wallet cannot pay value + gas
    InsufficientFunds,
    /// ERC20 transfer/allowance failure
    TokenTransfer,
    /// Gas estimation failed
    GasEstimation,
    /// RPC connectivity problem
    Network,
    /// No contract code at the target address
    ContractNotFound,
    /// Generic revert without a recognized reason
    ExecutionReverted,
    /// Nothing in the rule table matched
    Unknown,
}

impl ErrorKind {
    /// Retry disposition for this kind.
    ///
    /// User rejection and contract validation failures are terminal;
    /// everything else, including unknown failures, is retryable.
    pub fn disposition(&self) -> Disposition {
        match self {
            ErrorKind::UserRejected | ErrorKind::Validation(_) => Disposition::Terminal,
            _ => Disposition::Retryable,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.disposition() == Disposition::Terminal
    }
}

// ============================================================================
// Raw errors
// ============================================================================

/// Machine-readable error code attached to a raw failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// JSON-RPC / EIP-1193 numeric code (e.g. `4001`, `-32603`)
    Numeric(i64),
    /// Library code name (e.g. `ACTION_REJECTED`, `CALL_EXCEPTION`)
    Named(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Numeric(code) => write!(f, "{code}"),
            ErrorCode::Named(name) => f.write_str(name),
        }
    }
}

/// A failure as produced by the underlying call, before normalization.
///
/// Any field may be missing. [`extract_message`](crate::ext::extract_message)
/// picks the most specific one available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTxError {
    /// Message nested in the provider's `data` payload
    pub data_message: Option<String>,
    /// Decoded revert reason
    pub reason: Option<String>,
    /// Top-level error message
    pub message: Option<String>,
    pub code: Option<ErrorCode>,
    /// Rendered text of the source error, used when nothing above is set
    pub rendered: Option<String>,
}

impl RawTxError {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn from_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_data_message(mut self, message: impl Into<String>) -> Self {
        self.data_message = Some(message.into());
        self
    }

    /// Decode revert bytes into `reason`, leaving it untouched if nothing decodes.
    pub fn with_revert_data(mut self, data: &Bytes) -> Self {
        if let Some(reason) = decode_revert_data(data) {
            self.reason = Some(reason);
        }
        self
    }

    /// Parse a wallet-style JSON error object.
    ///
    /// Recognized shapes:
    ///
    /// ```text
    /// "plain string"
    /// { "code": 4001 | "ACTION_REJECTED", "message": "...", "reason": "...",
    ///   "data": { "message": "..." } | "0x<revert data>",
    ///   "error": { "data": { "message": "..." } } }
    /// ```
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::String(s) => Self::from_message(s.clone()),
            Value::Object(map) => {
                let code = match map.get("code") {
                    Some(Value::Number(n)) => n.as_i64().map(ErrorCode::Numeric),
                    Some(Value::String(s)) => Some(ErrorCode::Named(s.clone())),
                    _ => None,
                };

                let mut raw = Self {
                    message: string_field(map.get("message")),
                    reason: string_field(map.get("reason")),
                    code,
                    rendered: Some(value.to_string()),
                    ..Default::default()
                };

                let data = map
                    .get("data")
                    .or_else(|| map.get("error").and_then(|e| e.get("data")));
                match data {
                    Some(Value::Object(data)) => {
                        raw.data_message = string_field(data.get("message"));
                    }
                    Some(Value::String(hex)) if raw.reason.is_none() => {
                        if let Ok(bytes) = hex.parse::<Bytes>() {
                            raw.reason = decode_revert_data(&bytes);
                        }
                    }
                    _ => {}
                }

                raw
            }
            other => Self {
                rendered: Some(other.to_string()),
                ..Default::default()
            },
        }
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

impl fmt::Display for RawTxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ext::extract_message(Some(self)))
    }
}

impl From<TransportError> for RawTxError {
    fn from(err: TransportError) -> Self {
        match &err {
            RpcError::ErrorResp(payload) => {
                let mut raw = Self {
                    message: Some(payload.message.to_string()),
                    code: Some(ErrorCode::Numeric(payload.code)),
                    rendered: Some(err.to_string()),
                    ..Default::default()
                };
                if let Some(data) = &payload.data {
                    if let Ok(bytes) = serde_json::from_str::<Bytes>(data.get()) {
                        raw.reason = decode_revert_data(&bytes);
                    } else if let Ok(Value::Object(map)) =
                        serde_json::from_str::<Value>(data.get())
                    {
                        raw.data_message = string_field(map.get("message"));
                    }
                }
                raw
            }
            _ => Self {
                rendered: Some(err.to_string()),
                ..Default::default()
            },
        }
    }
}

impl From<ContractError> for RawTxError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::TransportError(err) => err.into(),
            other => Self {
                rendered: Some(other.to_string()),
                ..Default::default()
            },
        }
    }
}

impl From<PendingTransactionError> for RawTxError {
    fn from(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(err) => err.into(),
            other => Self {
                rendered: Some(other.to_string()),
                ..Default::default()
            },
        }
    }
}

// ============================================================================
// Normalized error
// ============================================================================

/// Normalized transaction error returned to callers.
///
/// `message` is always one sentence from the closed set in the rule table,
/// or `"Failed to <operation>: <original message>"` when nothing matched.
///
/// `disposition` is how the executor treated the failure. It can be
/// `Terminal` while `kind` is retryable, e.g. a provider-internal wrapper
/// around a policy validation revert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TxError {
    pub kind: ErrorKind,
    pub disposition: Disposition,
    pub message: String,
    pub code: Option<ErrorCode>,
}

impl TxError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            disposition: kind.disposition(),
            message: message.into(),
            code: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.disposition == Disposition::Terminal
    }

    pub fn is_user_rejection(&self) -> bool {
        self.kind == ErrorKind::UserRejected
    }
}
