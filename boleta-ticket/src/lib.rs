//! # boleta-ticket
//!
//! Fiscal ticket rendering: template substitution and the tax-authority QR
//! payload.
//!
//! ## Scope
//!
//! This crate turns a completed transaction into printable content:
//! - Token substitution of a stored template against transaction fields
//! - Assembly of the field set for a sale (amount/date formatting, items
//!   block, approval code)
//! - AFIP QR payload: canonical JSON, URL-safe base64, verification URL
//!
//! No business computation happens at render time: totals, tax breakdown and
//! the approval code must already be present in the fields. Rendering is pure
//! and idempotent, so a reprint re-renders the same bytes.
//!
//! Callers must hold the per-register emission lock before rendering and
//! dispatching a fiscal document; two in-flight emissions for the same point
//! of sale would race on the authority-assigned sequence number.

mod error;
mod fields;
mod qr;
mod template;

// Re-exports
pub use error::{QrError, QrResult, RenderError, RenderResult};
pub use fields::{SaleItem, SaleTicket, TransactionFields, items_block};
pub use qr::{QR_URL_BASE, QrPayload, build_qr_url};
pub use template::{DocType, TicketTemplate, render};
