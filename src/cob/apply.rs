//! Writes a planned transition as one unit of work.
//!
//! Record pairs, the mapping change and the journal post happen between
//! `begin` and `commit`. Any failure rolls back both the store and the
//! journal. Events go out only after the commit succeeded.

use tracing::{info, warn};

use super::core::OwnershipTransferService;
use super::results::{StepOutcome, TransferError};
use crate::accounting::AccountingService;
use crate::events::{EventEmitter, EventPayload, LoanSnapshotEvent, OwnershipTransferEvent};
use crate::loan::LoanSnapshot;
use crate::state_machine::{AccountingRequest, MappingChange, RecordWrite, Transition, TransitionError};
use crate::store::TransferStore;
use crate::transfer::{ExternalAssetOwnerTransfer, LoanTransferMapping};
use crate::types::BusinessContext;

impl<S, A, N> OwnershipTransferService<S, A, N>
where
    S: TransferStore,
    A: AccountingService,
    N: EventEmitter,
{
    pub(super) fn apply(
        &mut self,
        loan: &LoanSnapshot,
        ctx: BusinessContext,
        transition: Transition,
    ) -> Result<StepOutcome, TransferError> {
        self.store.begin()?;
        if let Err(e) = self.accounting.begin() {
            self.store.rollback();
            return Err(e.into());
        }

        let finalized = match self.write(loan, &transition) {
            Ok(finalized) => finalized,
            Err(e) => {
                self.rollback_all();
                warn!(loan_id = %loan.id, kind = %transition.kind, error = %e, "transfer rolled back");
                return Err(e);
            }
        };

        if let Err(e) = self.store.commit() {
            self.rollback_all();
            warn!(loan_id = %loan.id, kind = %transition.kind, error = %e, "transfer commit failed");
            return Err(e.into());
        }
        // staged journal lines become visible only once the records are durable
        self.accounting.commit();

        for transfer in &finalized {
            info!(
                loan_id = %loan.id,
                owner = %transfer.owner,
                transfer_id = ?transfer.id,
                status = %transfer.status,
                kind = %transition.kind,
                "ownership transfer finalized"
            );
            self.emit_event(
                ctx,
                EventPayload::OwnershipTransfer(OwnershipTransferEvent {
                    loan_id: loan.id,
                    transfer: transfer.clone(),
                }),
            );
        }
        if transition.publish_loan_snapshot {
            self.emit_event(ctx, EventPayload::LoanSnapshot(LoanSnapshotEvent { loan: loan.clone() }));
        }

        Ok(StepOutcome {
            kind: Some(transition.kind),
            transfers: finalized,
        })
    }

    fn rollback_all(&mut self) {
        self.store.rollback();
        self.accounting.rollback();
    }

    fn write(
        &mut self,
        loan: &LoanSnapshot,
        transition: &Transition,
    ) -> Result<Vec<ExternalAssetOwnerTransfer>, TransferError> {
        let mut finalized = Vec::with_capacity(transition.writes.len());
        for write in &transition.writes {
            // closing side first so the store never sees two open rows for one episode
            let saved = match write {
                RecordWrite::Supersede(pair) => {
                    self.store.save(pair.closed.clone())?;
                    self.store.save(pair.successor.clone())?
                }
                RecordWrite::Settle { active, buyback } => {
                    self.store.save(active.clone())?;
                    self.store.save(buyback.clone())?
                }
            };
            finalized.push(saved);
        }

        match transition.mapping {
            Some(MappingChange::LinkFinalized) => {
                if let Some(transfer) = finalized.first() {
                    let transfer_id = transfer.id.ok_or(TransitionError::UnsavedTransfer {
                        loan_id: transition.loan_id,
                        status: transfer.status,
                    })?;
                    self.store.save_mapping(LoanTransferMapping {
                        loan_id: transition.loan_id,
                        transfer_id,
                    })?;
                }
            }
            Some(MappingChange::Unlink(transfer_id)) => {
                self.store.delete_mapping(transition.loan_id, transfer_id)?;
            }
            None => {}
        }

        if let (Some(request), Some(transfer)) = (transition.accounting, finalized.first()) {
            match request {
                AccountingRequest::Sale => self.accounting.post_sale_entries(loan, transfer)?,
                AccountingRequest::Buyback => self.accounting.post_buyback_entries(loan, transfer)?,
            }
        }

        Ok(finalized)
    }
}
