//! `subrecon-core` — Domain model shared by every subrecon crate.
//!
//! Pure data crate: contracts, rate tiers, canonical schedules, and
//! integer minor-unit money. No I/O dependencies.

pub mod bank;
pub mod contract;
pub mod error;
pub mod money;
pub mod schedule;

pub use bank::Bank;
pub use contract::{Contract, ContractRecord, RateTier, DEFAULT_YEAR_COUNT};
pub use error::CoreError;
pub use money::{format_minor, parse_minor, round_half_up, RATE_SCALE};
pub use schedule::{FeeColumn, Schedule, ScheduleRow};
