// 2.0: the versioned transfer record. one row per step of an ownership episode.
// rows are never deleted: a row is closed by moving effective_date_to off the
// sentinel and a successor row carries the episode forward.

use crate::types::{
    far_future_date, is_far_future, ExternalId, LoanId, OwnerId, TransferId, TransferStatus,
    TransferSubStatus,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAssetOwnerTransfer {
    // None until the store saves it
    pub id: Option<TransferId>,
    pub owner: OwnerId,
    pub external_id: ExternalId,
    pub loan_id: LoanId,
    pub external_loan_id: Option<ExternalId>,
    pub status: TransferStatus,
    pub sub_status: Option<TransferSubStatus>,
    pub settlement_date: NaiveDate,
    // first settlement date before any rewrite by the closure path
    pub original_settlement_date: Option<NaiveDate>,
    pub effective_date_from: NaiveDate,
    pub effective_date_to: NaiveDate,
    pub purchase_price_ratio: Decimal,
    pub details: Option<TransferDetails>,
}

impl ExternalAssetOwnerTransfer {
    // 2.1: a new request (PENDING or BUYBACK) as the intake side would create it.
    pub fn request(
        status: TransferStatus,
        owner: OwnerId,
        external_id: ExternalId,
        loan_id: LoanId,
        settlement_date: NaiveDate,
        purchase_price_ratio: Decimal,
    ) -> Self {
        Self {
            id: None,
            owner,
            external_id,
            loan_id,
            external_loan_id: None,
            status,
            sub_status: None,
            settlement_date,
            original_settlement_date: None,
            effective_date_from: settlement_date,
            effective_date_to: far_future_date(),
            purchase_price_ratio,
            details: None,
        }
    }

    pub fn with_external_loan_id(mut self, external_loan_id: ExternalId) -> Self {
        self.external_loan_id = Some(external_loan_id);
        self
    }

    // still effective: window not closed yet
    pub fn is_open_ended(&self) -> bool {
        is_far_future(self.effective_date_to)
    }

    // the one row per (loan, owner) that currently owns the receivable
    pub fn is_current_ownership(&self) -> bool {
        self.status == TransferStatus::Active && self.is_open_ended()
    }

    pub fn close_at(&mut self, date: NaiveDate) {
        self.effective_date_to = date;
    }

    // 2.2: move the settlement date, keeping the first value for audit
    pub fn reschedule(&mut self, date: NaiveDate) {
        if self.settlement_date == date {
            return;
        }
        if self.original_settlement_date.is_none() {
            self.original_settlement_date = Some(self.settlement_date);
        }
        self.settlement_date = date;
    }

    // 2.3: successor row. identity fields are copied, everything else is the caller's.
    pub fn successor(
        &self,
        status: TransferStatus,
        sub_status: Option<TransferSubStatus>,
        settlement_date: NaiveDate,
        effective_date_from: NaiveDate,
        effective_date_to: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            owner: self.owner.clone(),
            external_id: self.external_id.clone(),
            loan_id: self.loan_id,
            external_loan_id: self.external_loan_id.clone(),
            status,
            sub_status,
            settlement_date,
            original_settlement_date: None,
            effective_date_from,
            effective_date_to,
            purchase_price_ratio: self.purchase_price_ratio,
            details: None,
        }
    }
}

/** 2.4: financial snapshot frozen when a sale or buyback is finalized */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDetails {
    pub total_outstanding: Decimal,
    pub total_principal_outstanding: Decimal,
    pub total_interest_outstanding: Decimal,
    pub total_fee_charges_outstanding: Decimal,
    pub total_penalty_charges_outstanding: Decimal,
    pub total_overpaid: Decimal,
}

// 2.5: secondary index loan -> currently active transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanTransferMapping {
    pub loan_id: LoanId,
    pub transfer_id: TransferId,
}
