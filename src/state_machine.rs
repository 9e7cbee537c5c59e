// 4.0 state_machine.rs: pure transition planning. no store, no clock, no events.
// input: the open transfer set for one loan + the loan snapshot + the business date.
// output: a Transition the orchestrator writes in one unit of work.
//
// status flow per episode:
//   PENDING  -> ACTIVE | DECLINED | CANCELLED
//   ACTIVE   -> closed when a BUYBACK settles
//   BUYBACK  -> settled (closes the ACTIVE chain) | CANCELLED

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::loan::LoanSnapshot;
use crate::transfer::ExternalAssetOwnerTransfer;
use crate::types::{
    far_future_date, next_day, LoanId, TransferId, TransferStatus, TransferSubStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Sale,
    Declined,
    Buyback,
    EarlyBuyback,
    SameDayCancel,
    ClosureCancel,
    ClosureDecline,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionKind::Sale => "sale",
            TransitionKind::Declined => "declined sale",
            TransitionKind::Buyback => "buyback",
            TransitionKind::EarlyBuyback => "early buyback",
            TransitionKind::SameDayCancel => "same-day sale and buyback",
            TransitionKind::ClosureCancel => "closure cancel",
            TransitionKind::ClosureDecline => "closure decline",
        };
        f.write_str(name)
    }
}

/// Corrupted transfer state. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Illegal transfer found. Expected PENDING and BUYBACK, found: {first} and {second}")]
    IllegalTransferPair {
        first: TransferStatus,
        second: TransferStatus,
    },

    #[error("Illegal transfer found. Expected at most 2 open transfers for loan {loan_id}, found: {count}")]
    TooManyOpenTransfers { loan_id: LoanId, count: usize },

    #[error("Unexpected open transfer {transfer_id:?} with status {status}")]
    UnexpectedTransferStatus {
        transfer_id: Option<TransferId>,
        status: TransferStatus,
    },

    #[error("Transfer for loan {loan_id} with status {status} has not been saved")]
    UnsavedTransfer { loan_id: LoanId, status: TransferStatus },
}

// 4.1: close old, open new. every transition goes through here.
#[derive(Debug, Clone, PartialEq)]
pub struct Supersession {
    pub closed: ExternalAssetOwnerTransfer,
    pub successor: ExternalAssetOwnerTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessorSpec {
    pub status: TransferStatus,
    pub sub_status: Option<TransferSubStatus>,
    pub effective_date_from: NaiveDate,
    pub effective_date_to: NaiveDate,
}

impl SuccessorSpec {
    // zero-length window on a single day, used by every non-active outcome
    pub fn on_day(status: TransferStatus, sub_status: TransferSubStatus, date: NaiveDate) -> Self {
        Self {
            status,
            sub_status: Some(sub_status),
            effective_date_from: date,
            effective_date_to: date,
        }
    }
}

pub fn supersede(
    existing: &ExternalAssetOwnerTransfer,
    spec: SuccessorSpec,
    settlement_date: NaiveDate,
    old_settlement_date: Option<NaiveDate>,
) -> Supersession {
    let successor = existing.successor(
        spec.status,
        spec.sub_status,
        settlement_date,
        spec.effective_date_from,
        spec.effective_date_to,
    );
    let mut closed = existing.clone();
    closed.close_at(settlement_date);
    if let Some(date) = old_settlement_date {
        closed.reschedule(date);
    }
    Supersession { closed, successor }
}

// 4.2: one paired write. each yields exactly one finalized record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    Supersede(Supersession),
    // buyback settles in place: the ACTIVE row closes, the BUYBACK row is finalized
    Settle {
        active: ExternalAssetOwnerTransfer,
        buyback: ExternalAssetOwnerTransfer,
    },
}

impl RecordWrite {
    // the record carried by the ownership-transfer event
    pub fn finalized(&self) -> &ExternalAssetOwnerTransfer {
        match self {
            RecordWrite::Supersede(s) => &s.successor,
            RecordWrite::Settle { buyback, .. } => buyback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingChange {
    // link the loan to the record finalized by the first write
    LinkFinalized,
    Unlink(TransferId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingRequest {
    Sale,
    Buyback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub loan_id: LoanId,
    pub writes: Vec<RecordWrite>,
    pub mapping: Option<MappingChange>,
    pub accounting: Option<AccountingRequest>,
    // declined and cancelled outcomes do not touch the loan's books
    pub publish_loan_snapshot: bool,
}

impl Transition {
    pub fn finalized(&self) -> impl Iterator<Item = &ExternalAssetOwnerTransfer> {
        self.writes.iter().map(RecordWrite::finalized)
    }
}

// 4.3: what the open set asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Noop,
    Sale(ExternalAssetOwnerTransfer),
    Buyback(ExternalAssetOwnerTransfer),
    Pair(ExternalAssetOwnerTransfer, ExternalAssetOwnerTransfer),
}

fn dispatch_single(transfer: ExternalAssetOwnerTransfer) -> Result<Dispatch, TransitionError> {
    match transfer.status {
        TransferStatus::Pending => Ok(Dispatch::Sale(transfer)),
        TransferStatus::Buyback => Ok(Dispatch::Buyback(transfer)),
        status => Err(TransitionError::UnexpectedTransferStatus {
            transfer_id: transfer.id,
            status,
        }),
    }
}

/// Daily step: a pair must be exactly PENDING then BUYBACK.
pub fn dispatch_daily(
    loan_id: LoanId,
    mut open: Vec<ExternalAssetOwnerTransfer>,
) -> Result<Dispatch, TransitionError> {
    match open.len() {
        0 => Ok(Dispatch::Noop),
        1 => dispatch_single(open.remove(0)),
        2 => {
            let second = open.remove(1);
            let first = open.remove(0);
            if first.status != TransferStatus::Pending || second.status != TransferStatus::Buyback {
                return Err(TransitionError::IllegalTransferPair {
                    first: first.status,
                    second: second.status,
                });
            }
            Ok(Dispatch::Pair(first, second))
        }
        count => Err(TransitionError::TooManyOpenTransfers { loan_id, count }),
    }
}

/// Closure: any two open requests are cancelled together.
pub fn dispatch_closure(
    loan_id: LoanId,
    mut open: Vec<ExternalAssetOwnerTransfer>,
) -> Result<Dispatch, TransitionError> {
    match open.len() {
        0 => Ok(Dispatch::Noop),
        1 => dispatch_single(open.remove(0)),
        2 => {
            let second = open.remove(1);
            let first = open.remove(0);
            Ok(Dispatch::Pair(first, second))
        }
        count => Err(TransitionError::TooManyOpenTransfers { loan_id, count }),
    }
}

// 4.4: PENDING settles. ACTIVE if the loan still owes something, DECLINED otherwise.
pub fn plan_sale(
    loan: &LoanSnapshot,
    settlement_date: NaiveDate,
    pending: &ExternalAssetOwnerTransfer,
) -> Transition {
    if loan.is_transferable() {
        let spec = SuccessorSpec {
            status: TransferStatus::Active,
            sub_status: None,
            effective_date_from: next_day(settlement_date),
            effective_date_to: far_future_date(),
        };
        let mut pair = supersede(pending, spec, settlement_date, None);
        pair.successor.details = Some(loan.transfer_details());
        Transition {
            kind: TransitionKind::Sale,
            loan_id: loan.id,
            writes: vec![RecordWrite::Supersede(pair)],
            mapping: Some(MappingChange::LinkFinalized),
            accounting: Some(AccountingRequest::Sale),
            publish_loan_snapshot: true,
        }
    } else {
        let spec = SuccessorSpec::on_day(TransferStatus::Declined, loan.balance_sub_status(), settlement_date);
        Transition {
            kind: TransitionKind::Declined,
            loan_id: loan.id,
            writes: vec![RecordWrite::Supersede(supersede(pending, spec, settlement_date, None))],
            mapping: None,
            accounting: None,
            publish_loan_snapshot: false,
        }
    }
}

fn settle_buyback(
    kind: TransitionKind,
    loan: &LoanSnapshot,
    settled_on: NaiveDate,
    mut active: ExternalAssetOwnerTransfer,
    mut buyback: ExternalAssetOwnerTransfer,
) -> Result<Transition, TransitionError> {
    let active_id = active.id.ok_or(TransitionError::UnsavedTransfer {
        loan_id: active.loan_id,
        status: active.status,
    })?;
    active.close_at(settled_on);
    buyback.close_at(settled_on);
    buyback.details = Some(loan.transfer_details());
    Ok(Transition {
        kind,
        loan_id: loan.id,
        writes: vec![RecordWrite::Settle { active, buyback }],
        mapping: Some(MappingChange::Unlink(active_id)),
        accounting: Some(AccountingRequest::Buyback),
        publish_loan_snapshot: true,
    })
}

// 4.5: BUYBACK settles on its own date and closes the ACTIVE chain.
pub fn plan_buyback(
    loan: &LoanSnapshot,
    settlement_date: NaiveDate,
    buyback: &ExternalAssetOwnerTransfer,
    active: &ExternalAssetOwnerTransfer,
) -> Result<Transition, TransitionError> {
    settle_buyback(TransitionKind::Buyback, loan, settlement_date, active.clone(), buyback.clone())
}

// 4.6: loan closed before the buyback date. settle today, tag with the balance reason.
pub fn plan_early_buyback(
    loan: &LoanSnapshot,
    today: NaiveDate,
    buyback: &ExternalAssetOwnerTransfer,
    active: &ExternalAssetOwnerTransfer,
) -> Result<Transition, TransitionError> {
    let mut buyback = buyback.clone();
    buyback.reschedule(today);
    buyback.sub_status = Some(loan.balance_sub_status());
    settle_buyback(TransitionKind::EarlyBuyback, loan, today, active.clone(), buyback)
}

// 4.7: sale and buyback on the same day net out. both cancelled, nothing posted.
pub fn plan_same_day(
    loan_id: LoanId,
    settlement_date: NaiveDate,
    pending: &ExternalAssetOwnerTransfer,
    buyback: &ExternalAssetOwnerTransfer,
) -> Transition {
    let spec = SuccessorSpec::on_day(TransferStatus::Cancelled, TransferSubStatus::SamedayTransfers, settlement_date);
    Transition {
        kind: TransitionKind::SameDayCancel,
        loan_id,
        writes: vec![
            RecordWrite::Supersede(supersede(pending, spec, settlement_date, None)),
            RecordWrite::Supersede(supersede(buyback, spec, settlement_date, None)),
        ],
        mapping: None,
        accounting: None,
        publish_loan_snapshot: false,
    }
}

// 4.8: loan closed with two open requests. both cancelled as of today.
pub fn plan_closure_cancel(
    loan: &LoanSnapshot,
    today: NaiveDate,
    first: &ExternalAssetOwnerTransfer,
    second: &ExternalAssetOwnerTransfer,
) -> Transition {
    let sub_status = if first.settlement_date == second.settlement_date {
        TransferSubStatus::SamedayTransfers
    } else {
        loan.balance_sub_status()
    };
    let spec = SuccessorSpec::on_day(TransferStatus::Cancelled, sub_status, today);
    Transition {
        kind: TransitionKind::ClosureCancel,
        loan_id: loan.id,
        writes: vec![
            RecordWrite::Supersede(supersede(first, spec, today, Some(today))),
            RecordWrite::Supersede(supersede(second, spec, today, Some(today))),
        ],
        mapping: None,
        accounting: None,
        publish_loan_snapshot: false,
    }
}

// 4.9: loan closed with a pending sale. nothing left to sell.
pub fn plan_closure_decline(
    loan: &LoanSnapshot,
    today: NaiveDate,
    pending: &ExternalAssetOwnerTransfer,
) -> Transition {
    let spec = SuccessorSpec::on_day(TransferStatus::Declined, loan.balance_sub_status(), today);
    Transition {
        kind: TransitionKind::ClosureDecline,
        loan_id: loan.id,
        writes: vec![RecordWrite::Supersede(supersede(pending, spec, today, Some(today)))],
        mapping: None,
        accounting: None,
        publish_loan_snapshot: false,
    }
}
