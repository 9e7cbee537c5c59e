// 6.0: every finalized transfer produces an event. downstream listeners (external
// event bus, reporting) consume them. ordering inside one transition: transfer
// events first, then the loan snapshot.

use crate::loan::LoanSnapshot;
use crate::transfer::ExternalAssetOwnerTransfer;
use crate::types::{LoanId, TenantId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub tenant: TenantId,
    pub business_date: NaiveDate,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, tenant: TenantId, business_date: NaiveDate, payload: EventPayload) -> Self {
        Self {
            id,
            tenant,
            business_date,
            payload,
        }
    }

    pub fn loan_id(&self) -> LoanId {
        match &self.payload {
            EventPayload::OwnershipTransfer(e) => e.loan_id,
            EventPayload::LoanSnapshot(e) => e.loan.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    OwnershipTransfer(OwnershipTransferEvent),
    LoanSnapshot(LoanSnapshotEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipTransferEvent {
    pub loan_id: LoanId,
    pub transfer: ExternalAssetOwnerTransfer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshotEvent {
    pub loan: LoanSnapshot,
}

pub trait EventEmitter {
    fn emit(&mut self, event: Event);
}

#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<Event>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn ownership_transfers(&self) -> impl Iterator<Item = &OwnershipTransferEvent> {
        self.events.iter().filter_map(|e| match &e.payload {
            EventPayload::OwnershipTransfer(t) => Some(t),
            EventPayload::LoanSnapshot(_) => None,
        })
    }

    pub fn loan_snapshots(&self) -> impl Iterator<Item = &LoanSnapshotEvent> {
        self.events.iter().filter_map(|e| match &e.payload {
            EventPayload::LoanSnapshot(s) => Some(s),
            EventPayload::OwnershipTransfer(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventEmitter for EventCollector {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExternalId, OwnerId, TransferStatus};
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn event_collector() {
        let mut collector = EventCollector::new();
        collector.emit(Event::new(
            EventId(1),
            TenantId(1),
            day(),
            EventPayload::LoanSnapshot(LoanSnapshotEvent {
                loan: LoanSnapshot::new(LoanId(3)),
            }),
        ));

        assert_eq!(collector.events().len(), 1);
        assert_eq!(collector.events()[0].loan_id(), LoanId(3));
        assert_eq!(collector.loan_snapshots().count(), 1);
        assert_eq!(collector.ownership_transfers().count(), 0);

        collector.clear();
        assert!(collector.events().is_empty());
    }

    #[test]
    fn ownership_event_serializes() {
        let transfer = ExternalAssetOwnerTransfer::request(
            TransferStatus::Pending,
            OwnerId::new("o"),
            ExternalId::new("e"),
            LoanId(9),
            day(),
            dec!(1),
        );
        let event = Event::new(
            EventId(1),
            TenantId(1),
            day(),
            EventPayload::OwnershipTransfer(OwnershipTransferEvent {
                loan_id: LoanId(9),
                transfer,
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"PENDING\""));
        assert!(json.contains("9999-12-31"));
    }
}
