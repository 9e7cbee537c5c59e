// 9.0 cob/core.rs: the service. owns the three collaborators, like the batch step
// would hold its repository, journal and event bus.

use tracing::debug;

use super::results::TransferError;
use crate::accounting::{AccountingService, InMemoryJournal};
use crate::config::TransferConfig;
use crate::events::{Event, EventCollector, EventEmitter, EventId, EventPayload};
use crate::store::{InMemoryTransferStore, TransferStore};
use crate::transfer::ExternalAssetOwnerTransfer;
use crate::types::{BusinessContext, LoanId, OwnerId};

/** 9.1: orchestrator state. collaborators are generic so tests can swap them */
#[derive(Debug)]
pub struct OwnershipTransferService<S, A, N> {
    pub(super) config: TransferConfig,
    pub(super) store: S,
    pub(super) accounting: A,
    pub(super) notifier: N,
    pub(super) next_event_id: u64,
}

impl OwnershipTransferService<InMemoryTransferStore, InMemoryJournal, EventCollector> {
    pub fn in_memory(config: TransferConfig) -> Self {
        Self::new(config, InMemoryTransferStore::new(), InMemoryJournal::new(), EventCollector::new())
    }
}

impl<S, A, N> OwnershipTransferService<S, A, N>
where
    S: TransferStore,
    A: AccountingService,
    N: EventEmitter,
{
    pub fn new(config: TransferConfig, store: S, accounting: A, notifier: N) -> Self {
        Self {
            config,
            store,
            accounting,
            notifier,
            next_event_id: 1,
        }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // intake side: new PENDING / BUYBACK requests are saved through here
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn accounting(&self) -> &A {
        &self.accounting
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn into_parts(self) -> (S, A, N) {
        (self.store, self.accounting, self.notifier)
    }

    pub(super) fn skip_disabled(&self, loan_id: LoanId) -> bool {
        if !self.config.enabled {
            debug!(loan_id = %loan_id, "ownership transfers disabled, skipping loan");
        }
        !self.config.enabled
    }

    // current ownership row for the owner a buyback refers to
    pub(super) fn active_transfer_for(
        &self,
        loan_id: LoanId,
        owner: &OwnerId,
    ) -> Result<ExternalAssetOwnerTransfer, TransferError> {
        self.store
            .find_active(loan_id, owner)?
            .ok_or_else(|| TransferError::ActiveTransferNotFound {
                loan_id,
                owner: owner.clone(),
            })
    }

    pub(super) fn emit_event(&mut self, ctx: BusinessContext, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), ctx.tenant, ctx.business_date, payload);
        self.next_event_id += 1;
        self.notifier.emit(event);
    }
}
