//! Ticket template rendering
//!
//! Templates are plain text with `{token}` placeholders. Substitution is
//! literal: no arithmetic, no conditionals. `{{` and `}}` print literal
//! braces. A token missing from the fields or an unbalanced delimiter fails
//! the whole render; no partial output is ever produced.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::fields::TransactionFields;

/// Document types a template can be stored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    SaleTicket,
    Invoice,
}

/// Stored ticket template
///
/// Edited in the settings screen, read-only here at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTemplate {
    pub doc_type: DocType,
    /// Template text with `{token}` placeholders
    pub text: String,
    /// Print mode affinity: "escpos" | "gdi"
    #[serde(default = "default_print_mode")]
    pub print_mode: String,
}

fn default_print_mode() -> String {
    "escpos".to_string()
}

impl TicketTemplate {
    /// Resolve this template against the transaction fields
    pub fn render(&self, fields: &TransactionFields) -> RenderResult<String> {
        render(&self.text, fields)
    }
}

/// Resolve `{token}` placeholders in `template` from `fields`.
///
/// Pure and idempotent: the same `(template, fields)` pair always yields the
/// same text, so a reprint is a plain re-render.
pub fn render(template: &str, fields: &TransactionFields) -> RenderResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        // A nested or unterminated token is a template bug,
                        // not a missing field.
                        Some('{') | None => return Err(RenderError::MalformedTemplate),
                        Some(ch) => name.push(ch),
                    }
                }
                match fields.get(&name) {
                    Some(value) => out.push_str(value),
                    None => return Err(RenderError::MissingField(name)),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(RenderError::MalformedTemplate);
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> TransactionFields {
        TransactionFields::new()
            .with("total", "150.00")
            .with("cae", "74123456789012")
    }

    #[test]
    fn substitutes_tokens_literally() {
        let out = render("Total: {total}", &fields()).unwrap();
        assert_eq!(out, "Total: 150.00");
    }

    #[test]
    fn missing_field_fails_without_partial_output() {
        let err = render("Total: {total} CAE: {missing}", &fields()).unwrap_err();
        assert_eq!(err, RenderError::MissingField("missing".to_string()));
    }

    #[test]
    fn empty_fields_fail_on_first_token() {
        let err = render("Total: {total}", &TransactionFields::new()).unwrap_err();
        assert_eq!(err, RenderError::MissingField("total".to_string()));
    }

    #[test]
    fn unbalanced_delimiters_are_malformed() {
        let f = fields();
        assert_eq!(
            render("Total: {total", &f).unwrap_err(),
            RenderError::MalformedTemplate
        );
        assert_eq!(
            render("Total: total}", &f).unwrap_err(),
            RenderError::MalformedTemplate
        );
        assert_eq!(
            render("Total: {to{tal}", &f).unwrap_err(),
            RenderError::MalformedTemplate
        );
    }

    #[test]
    fn doubled_braces_print_literal_braces() {
        let out = render("{{total}} = {total}", &fields()).unwrap();
        assert_eq!(out, "{total} = 150.00");
    }

    #[test]
    fn render_is_idempotent() {
        let template = "CAE: {cae}\nTotal: {total}";
        let f = fields();
        assert_eq!(render(template, &f).unwrap(), render(template, &f).unwrap());
    }

    #[test]
    fn template_struct_defaults_to_escpos_affinity() {
        let t: TicketTemplate =
            serde_json::from_str(r#"{"doc_type":"sale_ticket","text":"Total: {total}"}"#).unwrap();
        assert_eq!(t.doc_type, DocType::SaleTicket);
        assert_eq!(t.print_mode, "escpos");
        assert_eq!(t.render(&fields()).unwrap(), "Total: 150.00");
    }
}
