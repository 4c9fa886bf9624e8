//! ERC20 allowance approval with a single max-amount fallback.
//!
//! Some tokens (and some wallets) reject an approval for an exact amount or
//! under-estimate its gas. The helper makes at most two attempts:
//!
//! 1. `approve(amount)` with `ApprovalConfig::gas_limit`
//! 2. `approve(U256::MAX)` with `ApprovalConfig::fallback_gas_limit`
//!
//! If both fail, the error of the first attempt is the one normalized, since
//! it describes the approval the caller actually asked for.

use alloy::primitives::U256;

use crate::{
    executor::submit_and_confirm,
    ext::{classify, ApprovalConfig, Confirmed, GasOptions, ReceiptOf, TxError, TxOperation},
};

/// Approve `amount`, falling back once to an unlimited approval.
///
/// `approve` builds the approval call for a given amount, e.g.
/// `|amount| token.approve(spender, amount)`.
pub async fn approve_with_fallback<F, O>(
    mut approve: F,
    amount: U256,
    operation_name: &str,
    config: &ApprovalConfig,
) -> Result<Confirmed<ReceiptOf<O>>, TxError>
where
    F: FnMut(U256) -> O,
    O: TxOperation,
{
    let options = GasOptions::with_gas_limit(config.gas_limit);
    let first_error = match submit_and_confirm(&mut approve(amount), &options).await {
        Ok((tx_hash, receipt)) => {
            tracing::info!(operation = operation_name, %tx_hash, %amount, "approval confirmed");
            return Ok(Confirmed {
                tx_hash,
                receipt,
                options,
                attempts: 1,
            });
        }
        Err(e) => e,
    };

    tracing::warn!(
        operation = operation_name,
        %amount,
        error = %first_error,
        "exact approval failed, retrying with max amount"
    );

    let fallback_options = GasOptions::with_gas_limit(config.fallback_gas_limit);
    match submit_and_confirm(&mut approve(U256::MAX), &fallback_options).await {
        Ok((tx_hash, receipt)) => {
            tracing::info!(operation = operation_name, %tx_hash, "max approval confirmed");
            Ok(Confirmed {
                tx_hash,
                receipt,
                options: fallback_options,
                attempts: 2,
            })
        }
        Err(e) => {
            tracing::warn!(
                operation = operation_name,
                error = %e,
                "max approval failed"
            );
            Err(classify(Some(&first_error), operation_name))
        }
    }
}
