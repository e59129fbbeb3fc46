//! Windows-1252 encoding utilities
//!
//! The thermal printers this system targets run a Latin single-byte code
//! page for Spanish text. This module provides:
//! - Width/padding helpers for column layout
//! - Encoding text to Windows-1252 for the ESC/POS stream
//!
//! Only text goes through [`encode_cp1252`]; command sequences and their
//! parameter bytes are appended to the stream as-is and never re-encoded,
//! so a parameter byte >= 0x80 (a QR payload length, for instance) cannot
//! be mistaken for text.

/// Get the Windows-1252 byte width of a string
///
/// One byte per character; unmappable characters still count one cell
/// because the printer prints a substitute.
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within a column width
pub fn truncate_text(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific column width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_text(s: &str, width: usize, align_right: bool) -> String {
    let current = text_width(s);
    if current >= width {
        return truncate_text(s, width);
    }
    let spaces = width - current;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Encode text to Windows-1252 bytes.
///
/// The printer must already have the WPC1252 code table selected
/// (`ESC t 16`) for these bytes to print correctly.
pub fn encode_cp1252(s: &str) -> Vec<u8> {
    let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(s);
    encoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_padding() {
        assert_eq!(text_width("total"), 5);
        assert_eq!(text_width("años"), 4);
        assert_eq!(pad_text("hi", 5, false), "hi   ");
        assert_eq!(pad_text("hi", 5, true), "   hi");
        assert_eq!(pad_text("hello world", 5, false), "hello");
        assert_eq!(truncate_text("señor", 3), "señ");
    }

    #[test]
    fn spanish_accents_encode_to_single_bytes() {
        let out = encode_cp1252("año: camión");
        // "año: camión" is 11 characters -> 11 bytes in cp1252
        assert_eq!(out.len(), 11);
        assert_eq!(out[1], 0xF1); // ñ
        assert_eq!(out[9], 0xF3); // ó
    }

    #[test]
    fn ascii_passes_through_unchanged() {
        assert_eq!(encode_cp1252("TOTAL: 150.00"), b"TOTAL: 150.00");
    }
}
