//! Print configuration
//!
//! Configuration is injected into the dispatcher at call time, never read
//! from ambient global state; the settings store lifecycle belongs to the
//! data layer and tests construct these values directly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::PrintError;

/// Output backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    /// Raw ESC/POS command stream (thermal printers)
    #[default]
    EscPos,
    /// Rasterized page handed to a driver printer (incl. print-to-file)
    Gdi,
}

impl FromStr for PrintMode {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "escpos" => Ok(PrintMode::EscPos),
            "gdi" | "raster" => Ok(PrintMode::Gdi),
            other => Err(PrintError::InvalidConfig(format!(
                "unknown print mode: {other}"
            ))),
        }
    }
}

/// Per-dispatch print configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintConfig {
    pub mode: PrintMode,
    /// Case-insensitive device name substring; `None` matches the first
    /// enumerated device
    #[serde(default)]
    pub printer_name_contains: Option<String>,
    /// Ticket width in characters for the command-stream path
    #[serde(default = "default_paper_width")]
    pub paper_width: usize,
    /// Bound on device I/O per job
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_paper_width() -> usize {
    // 58mm paper: 32 characters
    32
}

fn default_timeout_secs() -> u64 {
    10
}

impl PrintConfig {
    pub fn new(mode: PrintMode) -> Self {
        Self {
            mode,
            printer_name_contains: None,
            paper_width: default_paper_width(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the device name substring matcher
    pub fn with_printer_match(mut self, contains: impl Into<String>) -> Self {
        self.printer_name_contains = Some(contains.into());
        self
    }

    /// Set the ticket character width (command-stream path)
    pub fn with_paper_width(mut self, chars: usize) -> Self {
        self.paper_width = chars;
        self
    }

    /// Set the device I/O bound
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self::new(PrintMode::default())
    }
}

/// Persisted application settings this core reads.
///
/// `openssl_path` only gates that the authority-communication collaborator is
/// configured; it is carried here untouched, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub openssl_path: Option<String>,
    #[serde(default)]
    pub printer_name_contains: Option<String>,
    #[serde(default)]
    pub print_mode: PrintMode,
}

impl Settings {
    /// Build the dispatch configuration from the stored settings
    pub fn print_config(&self) -> PrintConfig {
        PrintConfig {
            mode: self.print_mode,
            printer_name_contains: self.printer_name_contains.clone(),
            paper_width: default_paper_width(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_the_stored_strings() {
        assert_eq!("escpos".parse::<PrintMode>().unwrap(), PrintMode::EscPos);
        assert_eq!("gdi".parse::<PrintMode>().unwrap(), PrintMode::Gdi);
        assert_eq!("GDI ".parse::<PrintMode>().unwrap(), PrintMode::Gdi);
        assert!("dot-matrix".parse::<PrintMode>().is_err());
    }

    #[test]
    fn mode_serde_matches_the_settings_store() {
        assert_eq!(serde_json::to_string(&PrintMode::EscPos).unwrap(), "\"escpos\"");
        assert_eq!(serde_json::to_string(&PrintMode::Gdi).unwrap(), "\"gdi\"");
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.print_mode, PrintMode::EscPos);
        assert!(s.printer_name_contains.is_none());

        let s: Settings = serde_json::from_str(
            r#"{"openssl_path":"C:\\openssl\\bin","printer_name_contains":"PDF","print_mode":"gdi"}"#,
        )
        .unwrap();
        let config = s.print_config();
        assert_eq!(config.mode, PrintMode::Gdi);
        assert_eq!(config.printer_name_contains.as_deref(), Some("PDF"));
        assert_eq!(config.paper_width, 32);
    }
}
