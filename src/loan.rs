//! Read-only view of the loan a transfer belongs to.
//!
//! Amounts come from the loan summary and may be absent; every rule here
//! reads an absent amount as zero.

use crate::transfer::TransferDetails;
use crate::types::{ExternalId, LoanId, TransferSubStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub total_outstanding: Option<Decimal>,
    pub total_principal_outstanding: Option<Decimal>,
    pub total_interest_outstanding: Option<Decimal>,
    pub total_fee_charges_outstanding: Option<Decimal>,
    pub total_penalty_charges_outstanding: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub id: LoanId,
    pub external_id: Option<ExternalId>,
    pub summary: LoanSummary,
    pub total_overpaid: Option<Decimal>,
}

impl LoanSnapshot {
    pub fn new(id: LoanId) -> Self {
        Self {
            id,
            external_id: None,
            summary: LoanSummary::default(),
            total_overpaid: None,
        }
    }

    pub fn with_external_id(mut self, external_id: ExternalId) -> Self {
        self.external_id = Some(external_id);
        self
    }

    pub fn with_outstanding(mut self, total: Decimal) -> Self {
        self.summary.total_outstanding = Some(total);
        self
    }

    pub fn with_overpaid(mut self, overpaid: Decimal) -> Self {
        self.total_overpaid = Some(overpaid);
        self
    }

    pub fn with_summary(mut self, summary: LoanSummary) -> Self {
        self.summary = summary;
        self
    }

    pub fn total_outstanding(&self) -> Decimal {
        self.summary.total_outstanding.unwrap_or(Decimal::ZERO)
    }

    pub fn total_overpaid(&self) -> Decimal {
        self.total_overpaid.unwrap_or(Decimal::ZERO)
    }

    /// A receivable can only change hands while something is still owed.
    pub fn is_transferable(&self) -> bool {
        self.total_outstanding() > Decimal::ZERO
    }

    /// Reason code used when a transfer is declined or cancelled because of
    /// the loan balance.
    pub fn balance_sub_status(&self) -> TransferSubStatus {
        if self.total_overpaid() > Decimal::ZERO {
            TransferSubStatus::BalanceNegative
        } else {
            TransferSubStatus::BalanceZero
        }
    }

    /// Snapshot attached to a transfer the moment it is finalized.
    pub fn transfer_details(&self) -> TransferDetails {
        let s = &self.summary;
        TransferDetails {
            total_outstanding: s.total_outstanding.unwrap_or_default(),
            total_principal_outstanding: s.total_principal_outstanding.unwrap_or_default(),
            total_interest_outstanding: s.total_interest_outstanding.unwrap_or_default(),
            total_fee_charges_outstanding: s.total_fee_charges_outstanding.unwrap_or_default(),
            total_penalty_charges_outstanding: s.total_penalty_charges_outstanding.unwrap_or_default(),
            total_overpaid: self.total_overpaid(),
        }
    }
}
