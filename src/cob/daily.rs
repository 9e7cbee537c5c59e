//! Daily settlement: runs once per loan per business day.

use tracing::{debug, warn};

use super::core::OwnershipTransferService;
use super::results::{StepOutcome, TransferError};
use crate::accounting::AccountingService;
use crate::events::EventEmitter;
use crate::loan::LoanSnapshot;
use crate::state_machine::{dispatch_daily, plan_buyback, plan_sale, plan_same_day, Dispatch};
use crate::store::{OpenTransferQuery, TransferStore};
use crate::transfer::ExternalAssetOwnerTransfer;
use crate::types::BusinessContext;

pub const STEP_ENUM_NAME: &str = "EXTERNAL_ASSET_OWNER_TRANSFER";
pub const STEP_HUMAN_NAME: &str = "Execute external asset owner transfer";

impl<S, A, N> OwnershipTransferService<S, A, N>
where
    S: TransferStore,
    A: AccountingService,
    N: EventEmitter,
{
    /// Settles whatever is due for `loan` on the business date.
    ///
    /// Open requests are PENDING/BUYBACK rows with an open-ended window
    /// settling today. Already finalized rows drop out of that set, so a rerun
    /// after a successful run is a no-op.
    pub fn execute(&mut self, loan: &LoanSnapshot, ctx: BusinessContext) -> Result<StepOutcome, TransferError> {
        if self.skip_disabled(loan.id) {
            return Ok(StepOutcome::noop());
        }
        debug!(loan_id = %loan.id, "start processing loan ownership transfer business step");

        let result = self.settle_due(loan, ctx);
        if let Err(e) = &result {
            if e.is_consistency_violation() {
                warn!(loan_id = %loan.id, error = %e, "inconsistent ownership transfers");
            }
        }

        debug!(loan_id = %loan.id, "end processing loan ownership transfer business step");
        result
    }

    fn settle_due(&mut self, loan: &LoanSnapshot, ctx: BusinessContext) -> Result<StepOutcome, TransferError> {
        let query = OpenTransferQuery::settling_on(loan.id, ctx.business_date);
        let open = self.store.query_open(&query)?;

        match dispatch_daily(loan.id, open)? {
            Dispatch::Noop => Ok(StepOutcome::noop()),
            Dispatch::Sale(pending) => self.handle_sale(loan, ctx, &pending),
            Dispatch::Buyback(buyback) => self.handle_buyback(loan, ctx, &buyback),
            Dispatch::Pair(pending, buyback) => self.handle_same_day_sale_and_buyback(loan, ctx, &pending, &buyback),
        }
    }

    pub fn handle_sale(
        &mut self,
        loan: &LoanSnapshot,
        ctx: BusinessContext,
        pending: &ExternalAssetOwnerTransfer,
    ) -> Result<StepOutcome, TransferError> {
        let transition = plan_sale(loan, ctx.business_date, pending);
        self.apply(loan, ctx, transition)
    }

    pub fn handle_buyback(
        &mut self,
        loan: &LoanSnapshot,
        ctx: BusinessContext,
        buyback: &ExternalAssetOwnerTransfer,
    ) -> Result<StepOutcome, TransferError> {
        let active = self.active_transfer_for(loan.id, &buyback.owner)?;
        let transition = plan_buyback(loan, ctx.business_date, buyback, &active)?;
        self.apply(loan, ctx, transition)
    }

    pub fn handle_same_day_sale_and_buyback(
        &mut self,
        loan: &LoanSnapshot,
        ctx: BusinessContext,
        pending: &ExternalAssetOwnerTransfer,
        buyback: &ExternalAssetOwnerTransfer,
    ) -> Result<StepOutcome, TransferError> {
        let transition = plan_same_day(loan.id, ctx.business_date, pending, buyback);
        self.apply(loan, ctx, transition)
    }
}
