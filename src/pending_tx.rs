//! Pending transaction seam and the confirmed result type.
//!
//! The executor only needs two things from a submitted transaction: its hash
//! and a way to wait for it to be mined. [`PendingTx`] captures exactly that,
//! so alloy's `PendingTransactionBuilder` and in-memory test doubles can be
//! driven by the same retry loop.
//!
//! ## Confirmation
//!
//! ```text
//! send() → PendingTx ──confirm()──► receipt (status = 1)  → Confirmed
//!                          │
//!                          ├──────► receipt (status = 0)  → RawTxError "execution reverted"
//!                          └──────► transport / watcher error → RawTxError
//! ```

use alloy::{
    network::{Network, ReceiptResponse},
    primitives::B256,
    providers::PendingTransactionBuilder,
};

use crate::ext::{GasOptions, RawTxError};

/// A submitted transaction that can be waited on.
#[allow(async_fn_in_trait)]
pub trait PendingTx {
    type Receipt;

    fn tx_hash(&self) -> B256;

    /// Wait until the transaction is mined.
    ///
    /// A mined transaction whose execution failed must be reported as an
    /// error, not as a receipt.
    async fn confirm(self) -> Result<Self::Receipt, RawTxError>;
}

impl<N: Network> PendingTx for PendingTransactionBuilder<N> {
    type Receipt = N::ReceiptResponse;

    fn tx_hash(&self) -> B256 {
        *PendingTransactionBuilder::tx_hash(self)
    }

    async fn confirm(self) -> Result<Self::Receipt, RawTxError> {
        let tx_hash = *PendingTransactionBuilder::tx_hash(&self);
        let receipt = self.get_receipt().await.map_err(RawTxError::from)?;

        if !receipt.status() {
            tracing::debug!(%tx_hash, "transaction mined with failed status");
            return Err(RawTxError {
                message: Some(format!("execution reverted (transaction {tx_hash})")),
                ..Default::default()
            });
        }

        Ok(receipt)
    }
}

/// A transaction that was sent and mined successfully.
#[derive(Debug, Clone)]
pub struct Confirmed<R> {
    pub tx_hash: B256,
    pub receipt: R,
    /// The option-set the successful attempt used
    pub options: GasOptions,
    /// 1-based number of the successful attempt
    pub attempts: usize,
}

impl<R> Confirmed<R> {
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    pub fn receipt(&self) -> &R {
        &self.receipt
    }

    pub fn into_receipt(self) -> R {
        self.receipt
    }
}
