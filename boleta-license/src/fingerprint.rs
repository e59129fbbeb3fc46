//! Machine fingerprint
//!
//! Derives a stable identifier for the local machine so a license can be
//! bound to one installation. The fingerprint aggregates OS and hardware
//! attributes that survive reboots; it makes no uniqueness guarantee across
//! physically identical virtual clones. That is a documented limitation of
//! the scheme, not a defect.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::{info, warn};
use uuid::Uuid;

/// Compute the machine fingerprint from local hardware/OS attributes.
///
/// Factors considered:
/// - OS name, version and architecture
/// - Host name
/// - CPU brand and vendor ID
/// - Number of physical cores
/// - Total memory size
///
/// Returns `None` when no attribute source yields data (seen on some
/// stripped-down containers); callers that need a value regardless should
/// use [`fingerprint_with_fallback`].
pub fn machine_fingerprint() -> Option<String> {
    let parts = attribute_sources();
    if parts.is_empty() {
        warn!("no hardware attribute source available for fingerprint");
        return None;
    }
    Some(digest(&parts))
}

/// Compute the machine fingerprint, falling back to a persisted token.
///
/// When no hardware attribute is readable, a random token is generated once,
/// stored at `token_path` and hashed instead. Stability then depends on the
/// token file surviving, not on hardware.
pub fn fingerprint_with_fallback(token_path: &Path) -> io::Result<String> {
    if let Some(fp) = machine_fingerprint() {
        return Ok(fp);
    }

    let token = if token_path.exists() {
        fs::read_to_string(token_path)?.trim().to_string()
    } else {
        let token = Uuid::new_v4().to_string();
        if let Some(parent) = token_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(token_path, &token)?;
        info!(path = %token_path.display(), "persisted fallback fingerprint token");
        token
    };

    Ok(digest(&[token]))
}

/// Collect the raw attribute strings that feed the fingerprint digest.
fn attribute_sources() -> Vec<String> {
    let mut parts = Vec::new();

    if let Some(name) = System::name() {
        parts.push(name);
    }
    if let Some(version) = System::os_version() {
        parts.push(version);
    }
    parts.push(System::cpu_arch());
    if let Some(host) = System::host_name() {
        parts.push(host);
    }

    let refresh = RefreshKind::nothing()
        .with_cpu(CpuRefreshKind::everything())
        .with_memory(MemoryRefreshKind::everything());
    let sys = System::new_with_specifics(refresh);

    if let Some(cpu) = sys.cpus().first() {
        parts.push(cpu.brand().to_string());
        parts.push(cpu.vendor_id().to_string());
    }

    let physical_cores = System::physical_core_count().unwrap_or(sys.cpus().len());
    parts.push(physical_cores.to_string());
    parts.push(sys.total_memory().to_string());

    parts.retain(|p| !p.is_empty());
    parts
}

/// SHA-256 hex over the parts joined with a fixed separator.
fn digest(parts: &[String]) -> String {
    let mut hasher = Sha256::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let fp1 = machine_fingerprint();
        let fp2 = machine_fingerprint();
        assert_eq!(fp1, fp2);

        if let Some(fp) = fp1 {
            assert_eq!(fp.len(), 64, "fingerprint should be SHA-256 hex");
            assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn fallback_token_is_written_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("machine-token");

        let fp1 = fingerprint_with_fallback(&token_path).unwrap();
        let fp2 = fingerprint_with_fallback(&token_path).unwrap();
        assert_eq!(fp1, fp2);

        // On machines with readable hardware attributes the token file is
        // never created; when it is, a second call must not rewrite it.
        if token_path.exists() {
            let before = fs::read_to_string(&token_path).unwrap();
            fingerprint_with_fallback(&token_path).unwrap();
            let after = fs::read_to_string(&token_path).unwrap();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn digest_separator_prevents_concatenation_collisions() {
        let a = digest(&["ab".into(), "c".into()]);
        let b = digest(&["a".into(), "bc".into()]);
        assert_ne!(a, b);
    }
}
