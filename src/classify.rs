//! Error classification and normalization.
//!
//! Matching is driven by [`RULES`], an ordered table of
//! `(kind, phrases, codes, normalized message)` rows evaluated top to bottom.
//! The first row that matches decides the normalized message and kind. The
//! retry disposition is terminal if any terminal row matches at all.
//!
//! ## Message extraction
//!
//! ```text
//! data_message → reason → message → rendered → "Unknown error occurred"
//! ```
//!
//! Provider-wrapped errors (MetaMask's `Internal JSON-RPC error` with a
//! nested `data.message`) therefore surface the revert text rather than the
//! wrapper text.

use crate::ext::{
    Disposition, ErrorCode, ErrorKind, RawTxError, TxError, ValidationFailure,
    UNKNOWN_ERROR_MESSAGE,
};

/// Prefix of the fallback message produced when no rule matches.
const FALLBACK_PREFIX: &str = "Failed to ";

// ============================================================================
// Rule table
// ============================================================================

/// One row of the classification table.
///
/// Phrases are matched case-insensitively against the extracted message and
/// must be written in lowercase. Named codes compare exactly.
#[derive(Debug)]
pub struct Rule {
    pub kind: ErrorKind,
    pub phrases: &'static [&'static str],
    pub numeric_codes: &'static [i64],
    pub named_codes: &'static [&'static str],
    /// Normalized, user-facing message
    pub message: &'static str,
}

impl Rule {
    const fn new(kind: ErrorKind, phrases: &'static [&'static str], message: &'static str) -> Self {
        Self {
            kind,
            phrases,
            numeric_codes: &[],
            named_codes: &[],
            message,
        }
    }

    const fn numeric(self, codes: &'static [i64]) -> Self {
        Self {
            numeric_codes: codes,
            ..self
        }
    }

    const fn named(self, codes: &'static [&'static str]) -> Self {
        Self {
            named_codes: codes,
            ..self
        }
    }

    pub fn disposition(&self) -> Disposition {
        self.kind.disposition()
    }

    /// True when the lowercased message contains one of the phrases, the
    /// message already is this rule's normalized output, or the code matches.
    pub fn matches(&self, lowered: &str, code: Option<&ErrorCode>) -> bool {
        if self.phrases.iter().any(|p| lowered.contains(p)) {
            return true;
        }
        if lowered.starts_with(&self.message.to_lowercase()) {
            return true;
        }
        match code {
            Some(ErrorCode::Numeric(n)) => self.numeric_codes.contains(n),
            Some(ErrorCode::Named(name)) => self.named_codes.contains(&name.as_str()),
            None => false,
        }
    }
}

use ErrorKind as K;
use ValidationFailure as V;

/// Classification rules in priority order.
pub static RULES: &[Rule] = &[
    Rule::new(
        K::UserRejected,
        &["user rejected", "user denied", "user cancelled", "user canceled", "rejected by user"],
        "Transaction was rejected by user.",
    )
    .numeric(&[4001])
    .named(&["ACTION_REJECTED"]),
    Rule::new(
        K::ProviderInternal,
        &["internal json-rpc error"],
        "Wallet provider returned an internal error. Please try again.",
    ),
    Rule::new(
        K::UnrecognizedAccount,
        &["unknown account", "unrecognized account"],
        "Wallet account not recognized. Please reconnect your wallet.",
    )
    .numeric(&[4100]),
    Rule::new(
        K::InvalidArguments,
        &["invalid argument", "invalid address", "invalid bignumber"],
        "Invalid transaction parameters. Please check your inputs.",
    )
    .named(&["INVALID_ARGUMENT"]),
    Rule::new(
        K::NonceConflict,
        &["nonce too low", "nonce has already been used"],
        "Transaction nonce conflict. Please reset your wallet's pending transactions and try again.",
    )
    .named(&["NONCE_EXPIRED"]),
    Rule::new(
        K::ReplacementUnderpriced,
        &["replacement transaction underpriced", "replacement fee too low"],
        "A pending transaction is blocking this one. Wait for it to confirm or speed it up in your wallet.",
    )
    .named(&["REPLACEMENT_UNDERPRICED"]),
    Rule::new(
        K::Validation(V::AmountExceedsLimit),
        &["amount exceeds policy maximum", "amountexceedsmaximum"],
        "Claim amount exceeds the policy maximum allowed amount.",
    ),
    Rule::new(
        K::Validation(V::PolicyInactive),
        &["policy is not active", "policyinactive"],
        "This policy is not currently active.",
    ),
    Rule::new(
        K::Validation(V::InvalidAccessCode),
        &["invalid access code", "invalidaccesscode"],
        "The access code provided is invalid.",
    ),
    Rule::new(
        K::Validation(V::MissingReceipt),
        &["receipt required", "missing receipt", "receiptrequired"],
        "A receipt is required to submit this claim.",
    ),
    Rule::new(
        K::Validation(V::NotAuthorized),
        &["not authorized", "notauthorized", "caller is not the owner"],
        "You are not authorized to perform this action.",
    ),
    Rule::new(
        K::Validation(V::InsufficientContractBalance),
        &["insufficient contract balance", "insufficientcontractbalance"],
        "The policy contract does not have enough funds for this payment.",
    ),
    Rule::new(
        K::InsufficientFunds,
        &["insufficient funds"],
        "Insufficient funds in your wallet to cover this transaction and gas fees.",
    )
    .named(&["INSUFFICIENT_FUNDS"]),
    Rule::new(
        K::TokenTransfer,
        &[
            "transfer amount exceeds balance",
            "transfer amount exceeds allowance",
            "insufficient allowance",
            "transfer failed",
        ],
        "Token transfer failed. Please check your token balance and allowance.",
    ),
    Rule::new(
        K::GasEstimation,
        &["cannot estimate gas", "gas required exceeds allowance", "unpredictable_gas_limit"],
        "Unable to estimate gas for this transaction. It may fail on-chain.",
    )
    .named(&["UNPREDICTABLE_GAS_LIMIT"]),
    Rule::new(
        K::Network,
        &[
            "network error",
            "could not detect network",
            "failed to fetch",
            "timeout",
            "timed out",
            "connection",
        ],
        "Network error. Please check your connection and try again.",
    )
    .named(&["NETWORK_ERROR", "TIMEOUT"]),
    Rule::new(
        K::ContractNotFound,
        &["contract not deployed", "call to non-contract", "contract not found", "no contract code"],
        "Contract not found at this address. Please check the network and address.",
    ),
    Rule::new(
        K::ExecutionReverted,
        &["execution reverted", "revert"],
        "Transaction reverted by the contract.",
    )
    .named(&["CALL_EXCEPTION"]),
];

// ============================================================================
// Classification Functions
// ============================================================================

/// Pick the most specific message available on a raw error.
///
/// Precedence: nested provider-data message, revert reason, top-level message,
/// rendered source error, then [`UNKNOWN_ERROR_MESSAGE`]. Empty or
/// whitespace-only strings are skipped.
pub fn extract_message(raw: Option<&RawTxError>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_ERROR_MESSAGE.to_string();
    };
    [&raw.data_message, &raw.reason, &raw.message, &raw.rendered]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string())
}

/// Find the first rule matching a raw error.
pub fn find_rule(raw: Option<&RawTxError>) -> Option<&'static Rule> {
    let lowered = extract_message(raw).to_lowercase();
    let code = raw.and_then(|r| r.code.as_ref());
    RULES.iter().find(|rule| rule.matches(&lowered, code))
}

/// Whether a failed attempt is worth retrying with the next strategy.
///
/// Returns `false` if any terminal rule (user rejection or a contract
/// validation failure) matches, even when an earlier retryable rule would
/// win the normalization.
pub fn should_retry(raw: Option<&RawTxError>) -> bool {
    let lowered = extract_message(raw).to_lowercase();
    let code = raw.and_then(|r| r.code.as_ref());
    !RULES
        .iter()
        .filter(|rule| rule.disposition() == Disposition::Terminal)
        .any(|rule| rule.matches(&lowered, code))
}

/// Normalize a raw failure into a [`TxError`].
///
/// Already-normalized messages come back unchanged, so classifying twice is
/// harmless. The returned disposition is terminal whenever [`should_retry`]
/// would refuse the raw error, even if the winning rule's kind is retryable.
pub fn classify(raw: Option<&RawTxError>, operation_name: &str) -> TxError {
    let message = extract_message(raw);
    let code = raw.and_then(|r| r.code.clone());

    if let Some(rule) = RULES.iter().find(|rule| rule.message == message) {
        return TxError {
            kind: rule.kind,
            disposition: rule.disposition(),
            message,
            code,
        };
    }

    let disposition = if should_retry(raw) {
        Disposition::Retryable
    } else {
        Disposition::Terminal
    };

    match find_rule(raw) {
        Some(rule) => TxError {
            kind: rule.kind,
            disposition,
            message: rule.message.to_string(),
            code,
        },
        // a fallback message from an earlier pass
        None if message.starts_with(FALLBACK_PREFIX) => TxError {
            kind: ErrorKind::Unknown,
            disposition,
            message,
            code,
        },
        None => TxError {
            kind: ErrorKind::Unknown,
            disposition,
            message: format!("{FALLBACK_PREFIX}{operation_name}: {message}"),
            code,
        },
    }
}

/// Normalize a plain message, as when re-classifying an error's text.
pub fn classify_message(message: &str, operation_name: &str) -> TxError {
    classify(Some(&RawTxError::from_message(message)), operation_name)
}
