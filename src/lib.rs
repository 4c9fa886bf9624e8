//! # reimbursement-tx
//!
//! Transaction plumbing for the reimbursement-policy contracts, built on Alloy.
//!
//! ## Core Features
//!
//! - **Gas Strategy Retries**: Each write walks an ordered list of gas option-sets until one confirms
//! - **Error Normalization**: Raw provider, wallet, and revert errors become one `TxError` with a stable kind
//! - **Approval Fallback**: ERC20 approvals retry once with an unlimited amount
//! - **Contract Error Parsing**: Distributed registry pattern for Solidity revert decoding
//!
//! ## Usage
//!
//! ```ignore
//! use reimbursement_tx::ext::*;
//!
//! let client = PolicyClient::connect(&ClientConfig::new(rpc_url), signer).await?;
//! let policy = client.deploy_policy(factory, &params).await?;
//! client.fund_policy(policy.address, params.token, amount).await?;
//! ```

// ============================================================================
// Internal Module Declarations
// ============================================================================

/// ERC20 approval with a max-amount fallback
mod approval;

/// Rule table and message normalization for raw transaction errors
mod classify;

/// High-level policy operations
mod client;

/// Contract error parser registry for decoding Solidity revert errors
mod contract_error;

/// Solidity bindings for the factory, policy, and token contracts
mod contracts;

/// Raw and normalized error types
mod error;

/// Retrying transaction executor
mod executor;

/// Gas option-sets and strategies
mod gas;

/// Pending transaction seam and confirmed result
mod pending_tx;

/// Wallet-backed provider construction
mod provider;


// ============================================================================
// Public Exports
// ============================================================================

/// Re-export all public APIs from the alloy crate.
pub use alloy::*;

/// Internal module for macro usage.
#[doc(hidden)]
pub mod __private {
    /// inventory crate - distributed plugin registration for contract error parsers
    pub use inventory;
    /// paste crate - identifier concatenation in macros
    pub use paste;
}

/// Everything this crate adds on top of alloy:
///
/// - `TxExecutor` / `execute_with_retry` - strategy-based retry loop
/// - `classify` / `should_retry` / `extract_message` - error normalization
/// - `approve_with_fallback` - ERC20 approval helper
/// - `PolicyClient` - factory, policy, and token operations
/// - `ContractErrorParser` - contract error parser registry
pub mod ext {
    pub use super::approval::*;
    pub use super::classify::*;
    pub use super::client::*;
    pub use super::contract_error::*;
    pub use super::contracts::*;
    pub use super::error::*;
    pub use super::executor::*;
    pub use super::gas::*;
    pub use super::pending_tx::*;
    pub use super::provider::*;
}
