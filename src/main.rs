//! Ownership transfer simulation.
//!
//! Walks one loan book through a sale, a buyback, a same-day wash, a declined
//! sale and an early buyback on closure, printing the transfer chain after each.

use asset_transfer_core::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn main() {
    let config = TransferConfig::development();
    logging::init_logging(&config.logging);

    println!("Loan Ownership Transfer Simulation\n");

    scenario_1_sale_then_buyback(&config);
    scenario_2_same_day_wash(&config);
    scenario_3_declined_sale(&config);
    scenario_4_early_buyback_on_closure(&config);
    scenario_5_illegal_pair(&config);

    println!("\nAll simulations completed.");
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap_or(NaiveDate::MIN)
}

fn ctx(d: u32) -> BusinessContext {
    BusinessContext::new(TenantId(1), day(d))
}

fn request(status: TransferStatus, loan: u64, settle: u32) -> ExternalAssetOwnerTransfer {
    ExternalAssetOwnerTransfer::request(
        status,
        OwnerId::new("investor-a"),
        ExternalId::new(format!("{}-{loan}-{settle}", status.as_str().to_lowercase())),
        LoanId(loan),
        day(settle),
        dec!(1.02),
    )
}

fn print_chain(store: &InMemoryTransferStore, loan_id: LoanId) {
    for t in store.transfers_for(loan_id) {
        let id = t.id.map(|id| id.0).unwrap_or_default();
        let sub = t.sub_status.map(|s| s.as_str()).unwrap_or("-");
        println!(
            "    #{id:<3} {:<9} {:<17} settle {}  effective {} .. {}",
            t.status.as_str(),
            sub,
            t.settlement_date,
            t.effective_date_from,
            t.effective_date_to
        );
    }
    let mapped: Vec<u64> = store.mappings_for(loan_id).iter().map(|m| m.transfer_id.0).collect();
    println!("    mapping -> {mapped:?}\n");
}

fn scenario_1_sale_then_buyback(config: &TransferConfig) {
    println!("Scenario 1: Sale on the 10th, buyback on the 20th\n");
    let mut service = OwnershipTransferService::in_memory(config.clone());
    let loan = LoanSnapshot::new(LoanId(1))
        .with_external_id(ExternalId::new("LN-0001"))
        .with_outstanding(dec!(500));

    let _ = service.store_mut().save(request(TransferStatus::Pending, 1, 10));
    match service.execute(&loan, ctx(10)) {
        Ok(outcome) => println!("  day 10: {:?}", outcome.kind),
        Err(e) => println!("  day 10 failed: {e}"),
    }
    print_chain(service.store(), loan.id);

    let _ = service.store_mut().save(request(TransferStatus::Buyback, 1, 20));
    match service.execute(&loan, ctx(20)) {
        Ok(outcome) => println!("  day 20: {:?}", outcome.kind),
        Err(e) => println!("  day 20 failed: {e}"),
    }
    print_chain(service.store(), loan.id);
    for entry in service.accounting().entries() {
        let external = entry.loan_external_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        println!("  journal: {:?} loan {} ({external}) amount {}", entry.kind, entry.loan_id, entry.amount);
    }
    println!("  events: {}\n", service.notifier().events().len());
}

fn scenario_2_same_day_wash(config: &TransferConfig) {
    println!("Scenario 2: Sale and buyback settling the same day\n");
    let mut service = OwnershipTransferService::in_memory(config.clone());
    let loan = LoanSnapshot::new(LoanId(2)).with_outstanding(dec!(800));

    let _ = service.store_mut().save(request(TransferStatus::Pending, 2, 15));
    let _ = service.store_mut().save(request(TransferStatus::Buyback, 2, 15));
    match service.execute(&loan, ctx(15)) {
        Ok(outcome) => println!("  day 15: {:?}, {} records cancelled", outcome.kind, outcome.transfers.len()),
        Err(e) => println!("  day 15 failed: {e}"),
    }
    print_chain(service.store(), loan.id);
}

fn scenario_3_declined_sale(config: &TransferConfig) {
    println!("Scenario 3: Sale of a fully repaid loan\n");
    let mut service = OwnershipTransferService::in_memory(config.clone());
    let loan = LoanSnapshot::new(LoanId(3)).with_outstanding(dec!(0)).with_overpaid(dec!(25));

    let _ = service.store_mut().save(request(TransferStatus::Pending, 3, 10));
    match service.execute(&loan, ctx(10)) {
        Ok(outcome) => println!("  day 10: {:?}", outcome.kind),
        Err(e) => println!("  day 10 failed: {e}"),
    }
    print_chain(service.store(), loan.id);
}

fn scenario_4_early_buyback_on_closure(config: &TransferConfig) {
    println!("Scenario 4: Loan repaid before the scheduled buyback\n");
    let mut service = OwnershipTransferService::in_memory(config.clone());
    let loan = LoanSnapshot::new(LoanId(4)).with_outstanding(dec!(300));

    let _ = service.store_mut().save(request(TransferStatus::Pending, 4, 5));
    let _ = service.execute(&loan, ctx(5));
    let _ = service.store_mut().save(request(TransferStatus::Buyback, 4, 28));

    let closed = LoanSnapshot::new(LoanId(4)).with_outstanding(dec!(0));
    match service.handle_loan_closed_or_overpaid(&closed, ctx(12)) {
        Ok(outcome) => println!("  day 12 closure: {:?}", outcome.kind),
        Err(e) => println!("  day 12 closure failed: {e}"),
    }
    print_chain(service.store(), loan.id);
}

fn scenario_5_illegal_pair(config: &TransferConfig) {
    println!("Scenario 5: Two sales settling the same day\n");
    let mut service = OwnershipTransferService::in_memory(config.clone());
    let loan = LoanSnapshot::new(LoanId(5)).with_outstanding(dec!(100));

    let _ = service.store_mut().save(request(TransferStatus::Pending, 5, 10));
    let _ = service.store_mut().save(request(TransferStatus::Pending, 5, 10));
    match service.execute(&loan, ctx(10)) {
        Ok(outcome) => println!("  unexpected success: {:?}", outcome.kind),
        Err(e) => println!("  rejected: {e}"),
    }
}
