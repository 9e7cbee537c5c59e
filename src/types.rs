// 1.0: all the primitives live here. ids, statuses, the sentinel date and the business context.
// ids are newtypes so a loan id never gets passed where a transfer id belongs.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanId(pub u64);

// assigned by the store on first save. ascending = creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransferId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub u64);

// investor identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId(pub String);

impl ExternalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })*
    };
}

display_inner!(LoanId, TransferId, TenantId, OwnerId, ExternalId);

// 1.1: lifecycle status. PENDING and BUYBACK are the only "open" requests,
// ACTIVE marks current ownership, DECLINED and CANCELLED end an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Active,
    Buyback,
    Declined,
    Cancelled,
}

impl TransferStatus {
    // statuses picked up by the open-transfer query
    pub const OPEN: [TransferStatus; 2] = [TransferStatus::Pending, TransferStatus::Buyback];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Active => "ACTIVE",
            TransferStatus::Buyback => "BUYBACK",
            TransferStatus::Declined => "DECLINED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 1.2: why a transfer was declined or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferSubStatus {
    // loan is overpaid
    BalanceNegative,
    BalanceZero,
    SamedayTransfers,
}

impl TransferSubStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferSubStatus::BalanceNegative => "BALANCE_NEGATIVE",
            TransferSubStatus::BalanceZero => "BALANCE_ZERO",
            TransferSubStatus::SamedayTransfers => "SAMEDAY_TRANSFERS",
        }
    }
}

impl fmt::Display for TransferSubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 1.3: 9999-12-31 marks an open-ended effective window.
pub fn far_future_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

pub fn is_far_future(date: NaiveDate) -> bool {
    date >= far_future_date()
}

pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

// 1.4: tenant and business date threaded through every orchestrator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub tenant: TenantId,
    pub business_date: NaiveDate,
}

impl BusinessContext {
    pub fn new(tenant: TenantId, business_date: NaiveDate) -> Self {
        Self {
            tenant,
            business_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_year_9999() {
        let sentinel = far_future_date();
        assert_eq!(sentinel.to_string(), "9999-12-31");
        assert!(is_far_future(sentinel));
        assert!(!is_far_future(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));
    }

    #[test]
    fn next_day_rolls_month() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(next_day(d), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn status_names() {
        assert_eq!(TransferStatus::Pending.to_string(), "PENDING");
        assert_eq!(TransferStatus::Buyback.to_string(), "BUYBACK");
        assert!(TransferStatus::Pending.is_open());
        assert!(!TransferStatus::Active.is_open());
        assert_eq!(TransferSubStatus::SamedayTransfers.to_string(), "SAMEDAY_TRANSFERS");
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&TransferStatus::Declined).unwrap();
        assert_eq!(json, "\"DECLINED\"");
        let sub = serde_json::to_string(&TransferSubStatus::BalanceNegative).unwrap();
        assert_eq!(sub, "\"BALANCE_NEGATIVE\"");
    }
}
