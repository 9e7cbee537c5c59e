// 3.0 store.rs: transfer persistence boundary. the trait is what the orchestrators need,
// the in-memory impl is for tests and the simulator. a real backend would be a SQL table
// with a unique index on (loan_id, owner) for open-ended ACTIVE rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::transfer::{ExternalAssetOwnerTransfer, LoanTransferMapping};
use crate::types::{is_far_future, LoanId, OwnerId, TransferId, TransferStatus};

// 3.1: the fixed "open transfer set" predicate.
// loan_id = X AND status IN (..) AND effective_date_to = sentinel [AND settlement_date = Y]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTransferQuery {
    pub loan_id: LoanId,
    pub settlement_date: Option<NaiveDate>,
    pub statuses: Vec<TransferStatus>,
}

impl OpenTransferQuery {
    // requests settling on exactly this business date
    pub fn settling_on(loan_id: LoanId, settlement_date: NaiveDate) -> Self {
        Self {
            loan_id,
            settlement_date: Some(settlement_date),
            statuses: TransferStatus::OPEN.to_vec(),
        }
    }

    // every open request regardless of settlement date
    pub fn any_settlement(loan_id: LoanId) -> Self {
        Self {
            loan_id,
            settlement_date: None,
            statuses: TransferStatus::OPEN.to_vec(),
        }
    }

    pub fn matches(&self, record: &ExternalAssetOwnerTransfer) -> bool {
        record.loan_id == self.loan_id
            && self.statuses.contains(&record.status)
            && is_far_future(record.effective_date_to)
            && self
                .settlement_date
                .map_or(true, |date| record.settlement_date == date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Transfer {0} not found")]
    NotFound(TransferId),

    #[error("Loan {loan_id} already has an active transfer for owner {owner}")]
    DuplicateActive { loan_id: LoanId, owner: OwnerId },

    #[error("A transaction is already in progress")]
    TransactionInProgress,

    #[error("No transaction in progress")]
    NoTransaction,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// 3.2: what the orchestrators need from persistence.
// writes between begin and commit are one unit: rollback must discard all of them.
pub trait TransferStore {
    // open set, ascending by id
    fn query_open(&self, query: &OpenTransferQuery) -> StoreResult<Vec<ExternalAssetOwnerTransfer>>;

    fn find_active(&self, loan_id: LoanId, owner: &OwnerId) -> StoreResult<Option<ExternalAssetOwnerTransfer>>;

    // inserts when id is None, updates otherwise. returns the stored row.
    fn save(&mut self, record: ExternalAssetOwnerTransfer) -> StoreResult<ExternalAssetOwnerTransfer>;

    fn save_mapping(&mut self, mapping: LoanTransferMapping) -> StoreResult<()>;

    fn delete_mapping(&mut self, loan_id: LoanId, transfer_id: TransferId) -> StoreResult<()>;

    fn begin(&mut self) -> StoreResult<()>;

    fn commit(&mut self) -> StoreResult<()>;

    fn rollback(&mut self);
}

#[derive(Debug, Clone, Default)]
struct Tables {
    transfers: BTreeMap<TransferId, ExternalAssetOwnerTransfer>,
    mappings: Vec<LoanTransferMapping>,
    next_id: u64,
}

// 3.3: in-memory store. begin() checkpoints the tables, rollback() restores them.
#[derive(Debug, Default)]
pub struct InMemoryTransferStore {
    tables: Tables,
    checkpoint: Option<Tables>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TransferId) -> Option<&ExternalAssetOwnerTransfer> {
        self.tables.transfers.get(&id)
    }

    // full chain for a loan, ascending by id
    pub fn transfers_for(&self, loan_id: LoanId) -> Vec<&ExternalAssetOwnerTransfer> {
        self.tables
            .transfers
            .values()
            .filter(|t| t.loan_id == loan_id)
            .collect()
    }

    pub fn mappings_for(&self, loan_id: LoanId) -> Vec<LoanTransferMapping> {
        self.tables
            .mappings
            .iter()
            .filter(|m| m.loan_id == loan_id)
            .copied()
            .collect()
    }

    pub fn transfer_count(&self) -> usize {
        self.tables.transfers.len()
    }

    pub fn in_transaction(&self) -> bool {
        self.checkpoint.is_some()
    }

    fn check_unique_active(&self, record: &ExternalAssetOwnerTransfer) -> StoreResult<()> {
        if !record.is_current_ownership() {
            return Ok(());
        }
        let clash = self.tables.transfers.values().any(|t| {
            t.id != record.id
                && t.loan_id == record.loan_id
                && t.owner == record.owner
                && t.is_current_ownership()
        });
        if clash {
            return Err(StoreError::DuplicateActive {
                loan_id: record.loan_id,
                owner: record.owner.clone(),
            });
        }
        Ok(())
    }
}

impl TransferStore for InMemoryTransferStore {
    fn query_open(&self, query: &OpenTransferQuery) -> StoreResult<Vec<ExternalAssetOwnerTransfer>> {
        // BTreeMap iteration is already ascending by id
        Ok(self
            .tables
            .transfers
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    fn find_active(&self, loan_id: LoanId, owner: &OwnerId) -> StoreResult<Option<ExternalAssetOwnerTransfer>> {
        Ok(self
            .tables
            .transfers
            .values()
            .find(|t| t.loan_id == loan_id && &t.owner == owner && t.is_current_ownership())
            .cloned())
    }

    fn save(&mut self, mut record: ExternalAssetOwnerTransfer) -> StoreResult<ExternalAssetOwnerTransfer> {
        self.check_unique_active(&record)?;
        let id = match record.id {
            Some(id) => {
                if !self.tables.transfers.contains_key(&id) {
                    return Err(StoreError::NotFound(id));
                }
                id
            }
            None => {
                self.tables.next_id += 1;
                let id = TransferId(self.tables.next_id);
                record.id = Some(id);
                id
            }
        };
        self.tables.transfers.insert(id, record.clone());
        Ok(record)
    }

    fn save_mapping(&mut self, mapping: LoanTransferMapping) -> StoreResult<()> {
        if !self.tables.transfers.contains_key(&mapping.transfer_id) {
            return Err(StoreError::NotFound(mapping.transfer_id));
        }
        if !self.tables.mappings.contains(&mapping) {
            self.tables.mappings.push(mapping);
        }
        Ok(())
    }

    fn delete_mapping(&mut self, loan_id: LoanId, transfer_id: TransferId) -> StoreResult<()> {
        self.tables
            .mappings
            .retain(|m| !(m.loan_id == loan_id && m.transfer_id == transfer_id));
        Ok(())
    }

    fn begin(&mut self) -> StoreResult<()> {
        if self.checkpoint.is_some() {
            return Err(StoreError::TransactionInProgress);
        }
        self.checkpoint = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.checkpoint.take().map(|_| ()).ok_or(StoreError::NoTransaction)
    }

    fn rollback(&mut self) {
        if let Some(saved) = self.checkpoint.take() {
            self.tables = saved;
        }
    }
}
