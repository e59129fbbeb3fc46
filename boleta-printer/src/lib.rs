//! # boleta-printer
//!
//! Backend-agnostic print dispatch for fiscal tickets.
//!
//! ## Scope
//!
//! This crate handles HOW a resolved ticket reaches paper:
//! - ESC/POS command stream for thermal printers (fixed character width)
//! - Raster page rendering for driver printers, including "print to file"
//! - Device selection by case-insensitive name substring
//! - Bounded-wait emission with per-job device acquisition
//!
//! What to print (template resolution, QR payload) lives in `boleta-ticket`;
//! this crate receives fully resolved text plus an optional QR URL.
//!
//! Dispatch is not idempotent: each call consumes printer media or writes a
//! file. Reprints are an explicit caller action, never an automatic retry.
//! Callers must hold the per-register emission lock across render+dispatch.
//!
//! ## Example
//!
//! ```ignore
//! use boleta_printer::{Dispatcher, PrintConfig, PrintJob, PrintMode, NetworkSink};
//!
//! let config = PrintConfig::new(PrintMode::EscPos).with_printer_match("TM-T20");
//! let job = PrintJob::new(resolved_text).with_qr(qr_url);
//! let sink = NetworkSink::new("192.168.1.50", 9100)?;
//! Dispatcher::new(config).dispatch_escpos(&job, &sink).await?;
//! ```

mod config;
mod device;
mod dispatch;
mod encoding;
mod escpos;
mod raster;

mod error;

// Re-exports
pub use config::{PrintConfig, PrintMode, Settings};
pub use device::{FilePageSink, NetworkSink, PageSink, RawSink, select_device};
pub use dispatch::{Dispatcher, PrintJob};
pub use encoding::{encode_cp1252, pad_text, text_width, truncate_text};
pub use error::{PrintError, PrintResult};
pub use escpos::{EscPosBuilder, render_escpos};
pub use raster::{render_page, render_qr, scale_to_device};

#[cfg(windows)]
pub use device::{SpoolerSink, list_spooler_devices};
