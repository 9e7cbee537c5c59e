//! Property-based tests for the transition rules.
//!
//! These tests verify the sale/decline split, pair validation and idempotent
//! reruns hold under random inputs.

use asset_transfer_core::state_machine::{dispatch_daily, Dispatch};
use asset_transfer_core::*;
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000i64..100_000i64).prop_map(|x| Decimal::new(x, 2)) // -1,000.00 to 999.99
}

fn overpaid_strategy() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![
        Just(None),
        (0i64..50_000i64).prop_map(|x| Some(Decimal::new(x, 2))),
    ]
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..3_000u64).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(offset))
            .unwrap()
    })
}

fn status_strategy() -> impl Strategy<Value = TransferStatus> {
    prop_oneof![
        Just(TransferStatus::Pending),
        Just(TransferStatus::Active),
        Just(TransferStatus::Buyback),
        Just(TransferStatus::Declined),
        Just(TransferStatus::Cancelled),
    ]
}

fn request(status: TransferStatus, id: u64, settle: NaiveDate) -> ExternalAssetOwnerTransfer {
    let mut transfer = ExternalAssetOwnerTransfer::request(
        status,
        OwnerId::new("fund-a"),
        ExternalId::new(format!("ext-{id}")),
        LoanId(1),
        settle,
        dec!(1),
    );
    transfer.id = Some(TransferId(id));
    transfer
}

fn loan(outstanding: Decimal, overpaid: Option<Decimal>) -> LoanSnapshot {
    let mut loan = LoanSnapshot::new(LoanId(1)).with_outstanding(outstanding);
    loan.total_overpaid = overpaid;
    loan
}

proptest! {
    /// A due sale activates iff something is still owed
    #[test]
    fn sale_outcome_follows_balance(
        outstanding in balance_strategy(),
        overpaid in overpaid_strategy(),
        settle in date_strategy(),
    ) {
        let mut service = OwnershipTransferService::in_memory(TransferConfig::test());
        let mut pending = request(TransferStatus::Pending, 0, settle);
        pending.id = None;
        service.store_mut().save(pending).unwrap();
        let loan = loan(outstanding, overpaid);

        let outcome = service
            .execute(&loan, BusinessContext::new(TenantId(1), settle))
            .unwrap();
        let finalized = &outcome.transfers[0];

        if outstanding > Decimal::ZERO {
            prop_assert_eq!(finalized.status, TransferStatus::Active);
            prop_assert_eq!(finalized.effective_date_from, next_day(settle));
            prop_assert!(finalized.is_open_ended());
            prop_assert_eq!(service.notifier().loan_snapshots().count(), 1);
            prop_assert_eq!(service.accounting().entries().len(), 1);
        } else {
            let expected = if overpaid.unwrap_or_default() > Decimal::ZERO {
                TransferSubStatus::BalanceNegative
            } else {
                TransferSubStatus::BalanceZero
            };
            prop_assert_eq!(finalized.status, TransferStatus::Declined);
            prop_assert_eq!(finalized.sub_status, Some(expected));
            prop_assert_eq!(finalized.effective_date_from, settle);
            prop_assert_eq!(finalized.effective_date_to, settle);
            prop_assert_eq!(service.notifier().loan_snapshots().count(), 0);
            prop_assert!(service.accounting().entries().is_empty());
        }
        prop_assert_eq!(service.notifier().ownership_transfers().count(), 1);
    }

    /// Every ordered pair other than (PENDING, BUYBACK) is rejected, naming both
    #[test]
    fn illegal_pairs_name_both_statuses(
        first in status_strategy(),
        second in status_strategy(),
        settle in date_strategy(),
    ) {
        let open = vec![request(first, 1, settle), request(second, 2, settle)];
        let result = dispatch_daily(LoanId(1), open);

        if first == TransferStatus::Pending && second == TransferStatus::Buyback {
            prop_assert!(matches!(result, Ok(Dispatch::Pair(_, _))));
        } else {
            let message = result.unwrap_err().to_string();
            prop_assert_eq!(
                message,
                format!("Illegal transfer found. Expected PENDING and BUYBACK, found: {first} and {second}")
            );
        }
    }

    /// More than two open records is never dispatched
    #[test]
    fn oversized_open_set_rejected(count in 3usize..8, settle in date_strategy()) {
        let open = (0..count)
            .map(|i| request(TransferStatus::Pending, i as u64 + 1, settle))
            .collect();
        let result = dispatch_daily(LoanId(1), open);
        prop_assert_eq!(
            result,
            Err(TransitionError::TooManyOpenTransfers { loan_id: LoanId(1), count })
        );
    }

    /// Running the step twice on the same day changes nothing the second time
    #[test]
    fn rerun_is_noop(
        outstanding in balance_strategy(),
        with_buyback in any::<bool>(),
        settle in date_strategy(),
    ) {
        let mut service = OwnershipTransferService::in_memory(TransferConfig::test());
        let mut pending = request(TransferStatus::Pending, 0, settle);
        pending.id = None;
        service.store_mut().save(pending).unwrap();
        if with_buyback {
            let mut buyback = request(TransferStatus::Buyback, 0, settle);
            buyback.id = None;
            service.store_mut().save(buyback).unwrap();
        }
        let loan = loan(outstanding, None);
        let ctx = BusinessContext::new(TenantId(1), settle);

        prop_assert!(!service.execute(&loan, ctx).unwrap().is_noop());
        let records = service.store().transfer_count();
        let events = service.notifier().events().len();
        let entries = service.accounting().entries().len();

        prop_assert!(service.execute(&loan, ctx).unwrap().is_noop());
        prop_assert_eq!(service.store().transfer_count(), records);
        prop_assert_eq!(service.notifier().events().len(), events);
        prop_assert_eq!(service.accounting().entries().len(), entries);
    }

    /// Rescheduling keeps the first settlement date ever recorded
    #[test]
    fn reschedule_preserves_first_date(
        first in date_strategy(),
        moves in prop::collection::vec(date_strategy(), 1..5),
    ) {
        let mut transfer = request(TransferStatus::Buyback, 1, first);
        for date in &moves {
            transfer.reschedule(*date);
        }
        prop_assert_eq!(transfer.settlement_date, *moves.last().unwrap());
        if moves.iter().all(|d| *d == first) {
            prop_assert_eq!(transfer.original_settlement_date, None);
        } else {
            prop_assert_eq!(transfer.original_settlement_date, Some(first));
        }
    }
}
