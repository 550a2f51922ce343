//! `subrecon-engine` — Multi-variant reconciliation engine.
//!
//! Pure engine crate: receives a canonical schedule and contract data,
//! applies every day-count / subsidy-sum / balance-check combination from
//! the formula catalog, scores each candidate, self-corrects near-miss rows
//! of the winner, and returns the best reconciliation. No I/O dependencies.

pub mod config;
pub mod corrector;
pub mod engine;
pub mod error;
pub mod model;
pub mod strategy;
pub mod timeline;

pub use config::EngineConfig;
pub use engine::reconcile;
pub use error::EngineError;
pub use model::{ComputedRow, ReconOutcome, ReconciliationResult, RunMeta, ValidationResult};
pub use strategy::{CalculationVariant, FormulaCatalog};
pub use timeline::RateTimeline;
