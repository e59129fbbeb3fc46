//! # boleta-license
//!
//! Machine-bound licensing for the fiscal point of sale.
//!
//! ## Scope
//!
//! This crate decides whether the installation may emit fiscal documents:
//! - Stable machine fingerprint from local hardware/OS attributes
//! - License record validation (expiry, binding, key check)
//! - Keyed license-key derivation for the issuer side
//!
//! Storage of the license record is owned by the data layer; validation here
//! is a pure function over the record so it can be tested without a store.
//!
//! ## Example
//!
//! ```ignore
//! use boleta_license::{machine_fingerprint, validate, LicenseRecord};
//!
//! let fp = machine_fingerprint().unwrap_or_default();
//! let outcome = validate(&record, &fp, today, issuer_secret);
//! if outcome.record != record {
//!     store.save_license(&outcome.record)?; // first-run fingerprint bind
//! }
//! outcome.ensure_valid()?;
//! ```

mod error;
mod fingerprint;
mod license;

// Re-exports
pub use error::{LicenseError, LicenseResult};
pub use fingerprint::{fingerprint_with_fallback, machine_fingerprint};
pub use license::{LicenseRecord, LicenseStatus, Validation, derive_key, normalize_key, validate};
