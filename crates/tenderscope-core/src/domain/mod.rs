//! Domain models for tenderscope.
//!
//! Canonical definitions for the core entities:
//! - `Criterion` / `Category`: what is evaluated and its weight budget
//! - `Vendor`: who is evaluated
//! - `RawCriterionValue` / `Submission`: upstream raw inputs
//! - `Score`: normalized per-criterion result with provenance
//! - `PriceObservation`: market data for benchmarking

pub mod criterion;
pub mod error;
pub mod price;
pub mod raw;
pub mod score;

// Re-export main types and errors
pub use criterion::{Category, Criterion, CriterionId, Vendor, VendorId};
pub use error::{Machine, Result, SourceError, TenderError, TransitionRejected};
pub use price::PriceObservation;
pub use raw::{RawCriterionValue, Submission};
pub use score::{Provenance, Score};
