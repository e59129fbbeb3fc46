//! Transaction field assembly
//!
//! [`TransactionFields`] is the flat name→value map a template is resolved
//! against. It is assembled once per receipt and treated as immutable from
//! then on; the renderer never computes values, it only substitutes them.
//!
//! [`SaleTicket`] builds the field set for a fiscal sale the way the rest of
//! the system expects it: amounts with two decimals, `YYYY-MM-DD HH:MM:SS`
//! timestamps, the approval code verbatim, and a pre-formatted items block
//! sized for the ticket paper width.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered name→value set a template is rendered against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFields(BTreeMap<String, String>);

impl TransactionFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One sold line on the ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub name: String,
    pub qty: f64,
    pub price: f64,
    pub subtotal: f64,
}

/// Completed fiscal sale, ready to be turned into template fields.
///
/// The approval code (`cae`) and its due date come from the external tax
/// authority and are carried verbatim; reformatting either would break the
/// fiscal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleTicket {
    /// Document type label as shown on paper (e.g. "FACTURA C")
    pub doc_type_label: String,
    /// Point-of-sale number in the fiscal numbering scheme
    pub point_of_sale: u32,
    /// Authority-assigned document number
    pub doc_number: u64,
    pub issued_at: NaiveDateTime,
    pub client_label: String,
    pub items: Vec<SaleItem>,
    pub total: f64,
    /// Approval code, embedded verbatim
    pub cae: String,
    /// Approval code due date as received (`YYYYMMDD`)
    pub cae_due_yyyymmdd: String,
}

impl SaleTicket {
    /// Assemble the template field set for this sale.
    ///
    /// `width` is the ticket character width used to size the items block.
    pub fn to_fields(&self, width: usize) -> TransactionFields {
        let cae_due_fmt = format_cae_due(&self.cae_due_yyyymmdd);

        TransactionFields::new()
            .with("cbte_tipo_label", &self.doc_type_label)
            .with("pv", self.point_of_sale.to_string())
            .with("cbte_nro", self.doc_number.to_string())
            .with("fecha", self.issued_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .with("cliente_label", &self.client_label)
            .with("total", format!("{:.2}", self.total))
            .with("cae", &self.cae)
            .with("cae_vto_yyyymmdd", &self.cae_due_yyyymmdd)
            .with("cae_vto_fmt", cae_due_fmt)
            .with("items_block", items_block(&self.items, width))
    }
}

/// Format the items block for a narrow ticket.
///
/// Two lines per item: the description truncated to the paper width, then a
/// compact `qty x unit = subtotal` line.
pub fn items_block(items: &[SaleItem], width: usize) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(items.len() * 2);
    for item in items {
        let name = item.name.trim();
        if !name.is_empty() {
            lines.push(truncate(name, width));
        }
        let detail = format!(
            "{} x {:.2} = {:.2}",
            format_qty(item.qty),
            item.price,
            item.subtotal
        );
        lines.push(truncate(&detail, width));
    }
    lines.join("\n")
}

/// Quantity without trailing zeros: `2` not `2.000`, but `0.5` stays `0.5`.
fn format_qty(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        let s = format!("{:.3}", qty);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Dash an authority `YYYYMMDD` date for display; anything else is passed
/// through untouched.
fn format_cae_due(raw: &str) -> String {
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
    } else {
        raw.to_string()
    }
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}
