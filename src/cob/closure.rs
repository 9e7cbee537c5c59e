//! Loan closed or overpaid before the open requests were due.
//!
//! Every open request is resolved today: pairs are cancelled, a lone sale is
//! declined and a lone buyback settles early.

use tracing::{debug, warn};

use super::core::OwnershipTransferService;
use super::results::{StepOutcome, TransferError};
use crate::accounting::AccountingService;
use crate::events::EventEmitter;
use crate::loan::LoanSnapshot;
use crate::state_machine::{
    dispatch_closure, plan_closure_cancel, plan_closure_decline, plan_early_buyback, Dispatch,
};
use crate::store::{OpenTransferQuery, TransferStore};
use crate::types::BusinessContext;

impl<S, A, N> OwnershipTransferService<S, A, N>
where
    S: TransferStore,
    A: AccountingService,
    N: EventEmitter,
{
    pub fn handle_loan_closed_or_overpaid(
        &mut self,
        loan: &LoanSnapshot,
        ctx: BusinessContext,
    ) -> Result<StepOutcome, TransferError> {
        if self.skip_disabled(loan.id) {
            return Ok(StepOutcome::noop());
        }
        debug!(loan_id = %loan.id, "resolving open ownership transfers for closed loan");

        let result = self.resolve_open(loan, ctx);
        if let Err(e) = &result {
            if e.is_consistency_violation() {
                warn!(loan_id = %loan.id, error = %e, "inconsistent ownership transfers on closure");
            }
        }
        result
    }

    fn resolve_open(&mut self, loan: &LoanSnapshot, ctx: BusinessContext) -> Result<StepOutcome, TransferError> {
        let today = ctx.business_date;
        let open = self.store.query_open(&OpenTransferQuery::any_settlement(loan.id))?;

        let transition = match dispatch_closure(loan.id, open)? {
            Dispatch::Noop => return Ok(StepOutcome::noop()),
            Dispatch::Pair(first, second) => plan_closure_cancel(loan, today, &first, &second),
            Dispatch::Sale(pending) => plan_closure_decline(loan, today, &pending),
            Dispatch::Buyback(buyback) => {
                let active = self.active_transfer_for(loan.id, &buyback.owner)?;
                plan_early_buyback(loan, today, &buyback, &active)?
            }
        };
        self.apply(loan, ctx, transition)
    }
}
