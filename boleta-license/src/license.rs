//! License record validation and key derivation
//!
//! The record lives in the settings store owned by the data layer. Validation
//! is pure: it takes the stored record plus the current machine fingerprint
//! and returns a [`Validation`] carrying the (possibly updated) record and an
//! outcome. The only mutation ever produced is the one-time first-run
//! fingerprint bind, expressed as `Unbound -> Bound` on the returned copy so
//! the caller decides when to persist it.

use chrono::NaiveDate;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};

use crate::error::{LicenseError, LicenseResult};

/// Number of key characters kept from the HMAC hex output
const KEY_LEN: usize = 32;

/// Stored license record
///
/// Created with defaults at first application start (`enabled = false`, so a
/// fresh install runs unlicensed but unblocked until a key is loaded).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// When false the license machinery is off and emission is blocked
    #[serde(default)]
    pub enabled: bool,
    /// Holder name, part of the key derivation input
    #[serde(default)]
    pub owner: String,
    /// Expiry date as `YYYY-MM-DD`; empty means the record was never issued
    #[serde(default)]
    pub valid_until: String,
    /// Issuer-provided key, checked against the derived key
    #[serde(default)]
    pub license_key: String,
    /// Machine binding; empty until the first validated run
    #[serde(default)]
    pub fingerprint: String,
}

impl LicenseRecord {
    /// Whether the record has been bound to a machine yet
    pub fn is_bound(&self) -> bool {
        !self.fingerprint.trim().is_empty()
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseStatus {
    Valid,
    Disabled,
    Expired,
    FingerprintMismatch,
    Invalid,
}

impl LicenseStatus {
    /// Only `Valid` permits fiscal emission
    pub fn may_emit(self) -> bool {
        matches!(self, LicenseStatus::Valid)
    }
}

/// Result of [`validate`]: the record (bound on first run) plus the outcome.
///
/// Callers persist `record` when it differs from the input; that is the one
/// intentional write in the whole license lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub record: LicenseRecord,
    pub status: LicenseStatus,
}

impl Validation {
    /// The "may emit" contract: `Ok` only for a fully valid license.
    pub fn ensure_valid(&self) -> LicenseResult<()> {
        match self.status {
            LicenseStatus::Valid => Ok(()),
            LicenseStatus::Disabled => Err(LicenseError::Disabled),
            LicenseStatus::Expired => Err(LicenseError::Expired(self.record.valid_until.clone())),
            LicenseStatus::FingerprintMismatch => Err(LicenseError::FingerprintMismatch),
            LicenseStatus::Invalid => Err(LicenseError::Invalid),
        }
    }
}

/// Validate a stored record against the current machine fingerprint.
///
/// Order of checks: disabled, first-run bind, binding mismatch, expiry, key.
/// A missing or malformed `valid_until` yields `Invalid`; an issued record
/// always carries its expiry date.
pub fn validate(
    record: &LicenseRecord,
    fingerprint: &str,
    today: NaiveDate,
    secret: &[u8],
) -> Validation {
    if !record.enabled {
        return Validation {
            record: record.clone(),
            status: LicenseStatus::Disabled,
        };
    }

    let mut record = record.clone();

    if !record.is_bound() {
        info!("binding license to this machine (first run)");
        record.fingerprint = fingerprint.to_string();
    } else if record.fingerprint != fingerprint {
        warn!("license fingerprint does not match this machine");
        return Validation {
            record,
            status: LicenseStatus::FingerprintMismatch,
        };
    }

    let valid_until = match NaiveDate::parse_from_str(record.valid_until.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            warn!(valid_until = %record.valid_until, "license expiry date missing or malformed");
            return Validation {
                record,
                status: LicenseStatus::Invalid,
            };
        }
    };

    if today > valid_until {
        return Validation {
            record,
            status: LicenseStatus::Expired,
        };
    }

    let expected = derive_key(
        secret,
        &record.fingerprint,
        &record.owner,
        record.valid_until.trim(),
    );
    if normalize_key(&record.license_key) != normalize_key(&expected) {
        return Validation {
            record,
            status: LicenseStatus::Invalid,
        };
    }

    Validation {
        record,
        status: LicenseStatus::Valid,
    }
}

/// Derive the expected license key for a record.
///
/// Keyed HMAC-SHA256 over `fingerprint|owner|valid_until`, hex-encoded,
/// uppercased and truncated to a hand-typeable length. Changing any input
/// field invalidates the key; the issuer secret cannot be recovered from it.
pub fn derive_key(secret: &[u8], fingerprint: &str, owner: &str, valid_until: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(fingerprint.as_bytes());
    mac.update(b"|");
    mac.update(owner.as_bytes());
    mac.update(b"|");
    mac.update(valid_until.as_bytes());

    let mut key = hex::encode(mac.finalize().into_bytes()).to_uppercase();
    key.truncate(KEY_LEN);
    key
}

/// Normalize a key for comparison: drop separators, uppercase.
///
/// Lets users type keys with dashes or spaces without failing validation.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}
