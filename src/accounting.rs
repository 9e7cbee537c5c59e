// 5.0 accounting.rs: journal boundary. the core only says "post a sale" / "post a buyback";
// how the entries are laid out belongs to the accounting side.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::loan::LoanSnapshot;
use crate::transfer::ExternalAssetOwnerTransfer;
use crate::types::{ExternalId, LoanId, OwnerId, TransferId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    Sale,
    Buyback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub kind: JournalKind,
    pub loan_id: LoanId,
    pub loan_external_id: Option<ExternalId>,
    pub transfer_id: Option<TransferId>,
    pub owner: OwnerId,
    // outstanding balance moved off (sale) or back onto (buyback) the books
    pub amount: Decimal,
}

impl JournalEntry {
    pub fn for_transfer(kind: JournalKind, loan: &LoanSnapshot, transfer: &ExternalAssetOwnerTransfer) -> Self {
        let amount = transfer
            .details
            .as_ref()
            .map(|d| d.total_outstanding)
            .unwrap_or_else(|| loan.total_outstanding());
        Self {
            kind,
            loan_id: loan.id,
            loan_external_id: loan.external_id.clone(),
            transfer_id: transfer.id,
            owner: transfer.owner.clone(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountingError {
    #[error("Journal rejected entry for loan {loan_id}: {reason}")]
    Rejected { loan_id: LoanId, reason: String },

    #[error("Accounting unavailable: {0}")]
    Unavailable(String),

    #[error("Journal transaction already in progress")]
    TransactionInProgress,
}

// 5.1: invoked exactly once per finalized sale or buyback, inside the transfer's unit of work.
// posts between begin() and commit() stay invisible; rollback() discards them.
pub trait AccountingService {
    fn begin(&mut self) -> Result<(), AccountingError>;

    fn post_sale_entries(&mut self, loan: &LoanSnapshot, transfer: &ExternalAssetOwnerTransfer) -> Result<(), AccountingError>;

    fn post_buyback_entries(&mut self, loan: &LoanSnapshot, transfer: &ExternalAssetOwnerTransfer) -> Result<(), AccountingError>;

    // called only after the store committed
    fn commit(&mut self);

    fn rollback(&mut self);
}

// In memory journal for testing and simulation
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    entries: Vec<JournalEntry>,
    staged: Option<Vec<JournalEntry>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    // committed entries only
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entries_for(&self, loan_id: LoanId) -> Vec<&JournalEntry> {
        self.entries.iter().filter(|e| e.loan_id == loan_id).collect()
    }

    pub fn in_transaction(&self) -> bool {
        self.staged.is_some()
    }

    fn post(&mut self, entry: JournalEntry) {
        match self.staged.as_mut() {
            Some(staged) => staged.push(entry),
            None => self.entries.push(entry),
        }
    }
}

impl AccountingService for InMemoryJournal {
    fn begin(&mut self) -> Result<(), AccountingError> {
        if self.staged.is_some() {
            return Err(AccountingError::TransactionInProgress);
        }
        self.staged = Some(Vec::new());
        Ok(())
    }

    fn post_sale_entries(&mut self, loan: &LoanSnapshot, transfer: &ExternalAssetOwnerTransfer) -> Result<(), AccountingError> {
        self.post(JournalEntry::for_transfer(JournalKind::Sale, loan, transfer));
        Ok(())
    }

    fn post_buyback_entries(&mut self, loan: &LoanSnapshot, transfer: &ExternalAssetOwnerTransfer) -> Result<(), AccountingError> {
        self.post(JournalEntry::for_transfer(JournalKind::Buyback, loan, transfer));
        Ok(())
    }

    fn commit(&mut self) {
        if let Some(staged) = self.staged.take() {
            self.entries.extend(staged);
        }
    }

    fn rollback(&mut self) {
        self.staged = None;
    }
}
