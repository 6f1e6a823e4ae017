//! Gesture guard module
//!
//! Debounces disallowed gestures, escalates repeat offences per day and
//! computes the region to mask over an offending hand.

pub mod debounce;
pub mod escalation;
pub mod region;
pub mod store;

pub use debounce::Debouncer;
pub use escalation::{EscalationState, EscalationTracker, PenaltyLevel, RecordOutcome, Statistics};
pub use region::{BoundingBox, RegionSmoother};
pub use store::{JsonFileStore, MemoryStore, StateStore};
