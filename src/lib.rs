// asset-transfer-core: external asset ownership transfers for loan accounts.
// a loan's receivable is sold to an investor (PENDING -> ACTIVE) or bought back
// (BUYBACK closes the ACTIVE chain) during the daily close-of-business run.
// planning is pure; persistence, journals and event delivery sit behind traits.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: ids, TransferStatus, TransferSubStatus, sentinel date, BusinessContext
//   2.x  transfer.rs: transfer record, details snapshot, loan mapping
//   3.x  store.rs: open-transfer query, TransferStore trait, in-memory store
//   4.x  state_machine.rs: supersession, dispatch, sale/buyback/same-day/closure plans
//   5.x  accounting.rs: journal boundary
//   6.x  events.rs: ownership transfer + loan snapshot events
//   7.x  config.rs: module toggle, logging, env presets
//   8.x  logging.rs: tracing subscriber setup
//   9.x  cob/: daily settlement + closure orchestrators, unit of work
//   loan.rs: read-only loan snapshot

// domain
pub mod loan;
pub mod state_machine;
pub mod transfer;
pub mod types;

// boundaries
pub mod accounting;
pub mod events;
pub mod store;

// orchestration
pub mod cob;
pub mod config;
pub mod logging;

// re exports for convenience
pub use accounting::{AccountingError, AccountingService, InMemoryJournal, JournalEntry, JournalKind};
pub use cob::{OwnershipTransferService, StepOutcome, TransferError, STEP_ENUM_NAME, STEP_HUMAN_NAME};
pub use config::{ConfigError, Environment, LoggingConfig, TransferConfig};
pub use events::*;
pub use loan::*;
pub use state_machine::{TransitionError, TransitionKind};
pub use store::{InMemoryTransferStore, OpenTransferQuery, StoreError, TransferStore};
pub use transfer::*;
pub use types::*;
