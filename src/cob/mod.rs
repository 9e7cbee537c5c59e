// 9.0: close-of-business orchestration. one service per tenant batch, one call per
// loan per business day. queries the open set, asks the state machine for a plan,
// writes the plan in one unit of work, then publishes events.

mod apply;
mod closure;
mod core;
mod daily;
mod results;

pub use self::core::OwnershipTransferService;
pub use self::daily::{STEP_ENUM_NAME, STEP_HUMAN_NAME};
pub use self::results::{StepOutcome, TransferError};
