//! AFIP QR payload
//!
//! The tax authority publishes the exact format scanning apps verify: a JSON
//! object with a fixed key order, encoded as URL-safe base64 without padding,
//! carried as the single `p` query parameter of the verification URL. Field
//! names and ordering here follow that published spec; do not reorder the
//! struct fields.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QrError, QrResult};

/// Authority verification endpoint the encoded payload is appended to
pub const QR_URL_BASE: &str = "https://www.afip.gob.ar/fe/qr/?p=";

/// Structured fiscal fields embedded in the QR code.
///
/// Serialization order is the authority's published key order; serde emits
/// struct fields in declaration order, which is what makes the output
/// deterministic and verifiable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// Payload format version, currently 1
    pub ver: u32,
    /// Issue date, `YYYY-MM-DD`
    pub fecha: String,
    /// Issuer tax id (CUIT)
    pub cuit: u64,
    /// Point of sale number
    pub pto_vta: u32,
    /// Document type code
    pub tipo_cmp: u32,
    /// Document number
    pub nro_cmp: u64,
    /// Total amount
    pub importe: f64,
    /// Currency code, "PES" for pesos
    pub moneda: String,
    /// Exchange rate against the currency
    pub ctz: f64,
    /// Approval code type, "E" for CAE
    pub tipo_cod_aut: String,
    /// Approval code, embedded verbatim
    pub cod_aut: String,
    /// Receiver document type, present only for identified receivers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_doc_rec: Option<u32>,
    /// Receiver document number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nro_doc_rec: Option<u64>,
}

impl QrPayload {
    /// Payload for a sale in pesos with a CAE approval code.
    pub fn new(
        fecha: NaiveDate,
        cuit: u64,
        pto_vta: u32,
        tipo_cmp: u32,
        nro_cmp: u64,
        importe: f64,
        cod_aut: impl Into<String>,
    ) -> Self {
        Self {
            ver: 1,
            fecha: fecha.format("%Y-%m-%d").to_string(),
            cuit,
            pto_vta,
            tipo_cmp,
            nro_cmp,
            importe,
            moneda: "PES".to_string(),
            ctz: 1.0,
            tipo_cod_aut: "E".to_string(),
            cod_aut: cod_aut.into(),
            tipo_doc_rec: None,
            nro_doc_rec: None,
        }
    }

    /// Attach an identified receiver (document type + number)
    pub fn with_receiver(mut self, tipo_doc: u32, nro_doc: u64) -> Self {
        self.tipo_doc_rec = Some(tipo_doc);
        self.nro_doc_rec = Some(nro_doc);
        self
    }

    /// Check that every mandatory field is present and non-empty.
    fn check_complete(&self) -> QrResult<()> {
        if self.fecha.trim().is_empty() {
            return Err(QrError::IncompleteFields("fecha"));
        }
        if self.cuit == 0 {
            return Err(QrError::IncompleteFields("cuit"));
        }
        if self.pto_vta == 0 {
            return Err(QrError::IncompleteFields("ptoVta"));
        }
        if self.tipo_cmp == 0 {
            return Err(QrError::IncompleteFields("tipoCmp"));
        }
        if self.nro_cmp == 0 {
            return Err(QrError::IncompleteFields("nroCmp"));
        }
        if !self.importe.is_finite() || self.importe <= 0.0 {
            return Err(QrError::IncompleteFields("importe"));
        }
        if self.moneda.trim().is_empty() {
            return Err(QrError::IncompleteFields("moneda"));
        }
        if self.cod_aut.trim().is_empty() {
            return Err(QrError::IncompleteFields("codAut"));
        }
        Ok(())
    }
}

/// Encode the payload into the authority's verification URL.
///
/// Compact JSON, URL-safe base64 with padding stripped (the scanning apps
/// reject padded output). Deterministic and idempotent for identical input.
pub fn build_qr_url(payload: &QrPayload) -> QrResult<String> {
    payload.check_complete()?;

    let mut payload = payload.clone();
    payload.importe = (payload.importe * 100.0).round() / 100.0;

    let json = serde_json::to_string(&payload)?;
    let encoded = URL_SAFE_NO_PAD.encode(json.as_bytes());
    debug!(len = encoded.len(), "encoded QR payload");

    Ok(format!("{QR_URL_BASE}{encoded}"))
}
