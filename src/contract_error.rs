//! Revert data decoding for policy contract errors.
//!
//! Revert payloads arrive as raw bytes in an RPC error's `data` field. They
//! are decoded in order:
//!
//! 1. Standard Solidity reasons (`Error(string)`, `Panic(uint256)`).
//! 2. Custom errors of every contract registered through
//!    [`register_contract_errors!`](crate::register_contract_errors).
//! 3. The raw bytes as UTF-8 text.
//!
//! The decoded text becomes the raw error's `reason`, which the classifier
//! matches against its validation phrases.
//!
//! ```text
//! register_contract_errors!(ReimbursementPolicy)
//!     │
//!     ▼ (at link time)
//! inventory::iter::<ContractErrorParser>
//!     │
//!     ▼ (at runtime)
//! decode_revert_data(&data) → "ReimbursementPolicy::PolicyInactive(..)"
//! ```

use alloy::{
    primitives::Bytes,
    sol_types::{decode_revert_reason, GenericContractError, SolInterface},
};

/// Contract error parser entry for the registry.
pub struct ContractErrorParser {
    /// Name of the contract (prefixed to decoded errors)
    pub name: &'static str,
    /// Attempts to decode error data
    pub parse: fn(&Bytes) -> Option<String>,
}

inventory::collect!(ContractErrorParser);

/// Try every registered parser, returning the first successful decode.
pub fn parse_contract_error(data: &Bytes) -> Option<String> {
    inventory::iter::<ContractErrorParser>
        .into_iter()
        .find_map(|parser| (parser.parse)(data))
}

/// Decode revert bytes into readable text.
///
/// Standard `Error(string)`/`Panic(uint256)` payloads are tried first, then
/// registered custom errors, then the bytes as plain UTF-8 text. Returns
/// `None` for empty data or when nothing recognizes it.
pub fn decode_revert_data(data: &Bytes) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if let Ok(standard) = GenericContractError::abi_decode(data) {
        return Some(standard.to_string());
    }
    parse_contract_error(data).or_else(|| decode_revert_reason(data))
}

/// Register error parsers for contracts defined with `alloy::sol!`.
///
/// The contract must declare at least one custom error so that
/// `<Contract>Errors` exists.
///
/// ```ignore
/// alloy::sol! {
///     #[sol(rpc, all_derives)]
///     contract ReimbursementPolicy { error PolicyInactive(); }
/// }
///
/// register_contract_errors!(ReimbursementPolicy);
/// ```
#[macro_export]
macro_rules! register_contract_errors {
    ($($contract:ident),* $(,)?) => {
        $(
            $crate::__private::paste::paste! {
                $crate::__private::inventory::submit! {
                    $crate::ext::ContractErrorParser {
                        name: stringify!($contract),
                        parse: |data| {
                            use $crate::sol_types::SolInterface;
                            $contract::[<$contract Errors>]::abi_decode(data)
                                .ok()
                                .map(|e| format!("{}::{:?}", stringify!($contract), e))
                        },
                    }
                }
            }
        )*
    };
}
