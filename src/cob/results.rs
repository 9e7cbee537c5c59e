// 9.0.2: result types and errors for orchestrator calls.

use crate::accounting::AccountingError;
use crate::state_machine::{TransitionError, TransitionKind};
use crate::store::StoreError;
use crate::transfer::ExternalAssetOwnerTransfer;
use crate::types::{LoanId, OwnerId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    // None when nothing was due
    pub kind: Option<TransitionKind>,
    // records finalized by the transition, as stored
    pub transfers: Vec<ExternalAssetOwnerTransfer>,
}

impl StepOutcome {
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.kind.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("No active ownership transfer found for loan {loan_id} and owner {owner}")]
    ActiveTransferNotFound { loan_id: LoanId, owner: OwnerId },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Accounting error: {0}")]
    Accounting(#[from] AccountingError),
}

impl TransferError {
    // corrupted transfer state, needs manual repair
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, TransferError::Transition(_) | TransferError::ActiveTransferNotFound { .. })
    }

    // nothing was committed; the next cycle re-queries and tries again
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Store(_) | TransferError::Accounting(_))
    }
}
