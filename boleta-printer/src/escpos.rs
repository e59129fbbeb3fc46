//! ESC/POS command builder
//!
//! Builds the linear command stream for the thermal path: text cells at a
//! fixed character width, no scaling involved. Once these bytes are handed to
//! the device there is no cancellation; that matches the hardware.

use crate::dispatch::PrintJob;
use crate::encoding::{encode_cp1252, text_width};

/// ESC/POS command builder
///
/// Text is encoded to Windows-1252 as it is written; command sequences and
/// their parameter bytes go into the stream verbatim and are never
/// re-encoded.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(4096);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        // Select character code table WPC1252 (ESC t 16). Must come after
        // init: ESC @ resets the code table.
        buf.extend_from_slice(&[0x1B, 0x74, 16]);
        Self { buf, width }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write text, encoded to Windows-1252
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&encode_cp1252(s));
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Alignment ===

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x11]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Separators ===

    /// Print a line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line, spaces filling the gap
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = text_width(left);
        let rw = text_width(right);

        if lw + rw >= self.width {
            // Too long, just print with a space between
            self.text(left);
            self.text(" ");
            self.line(right);
        } else {
            let spaces = self.width - lw - rw;
            self.text(left);
            self.text(&" ".repeat(spaces));
            self.line(right);
        }
        self
    }

    // === Paper Control ===

    /// Partial cut after feeding n lines (GS V 65 n)
    ///
    /// The partial cut leaves a small connection so the ticket does not fall.
    pub fn cut_partial_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x41, lines]);
        self
    }

    // === QR Code ===

    /// Print a QR code block (GS ( k function set)
    ///
    /// Size: 1-16 (module size in dots)
    pub fn qr_code(&mut self, data: &str, size: u8) -> &mut Self {
        let size = size.clamp(1, 16);

        // Function 165: Select model (Model 2)
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x31, 0x00]);

        // Function 167: Set module size
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, size]);

        // Function 169: Set error correction (L)
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x31]);

        // Function 180: Store data
        let data_bytes = data.as_bytes();
        let len = data_bytes.len() + 3;
        let p_l = (len & 0xFF) as u8;
        let p_h = ((len >> 8) & 0xFF) as u8;
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, p_l, p_h, 0x31, 0x50, 0x30]);
        self.buf.extend_from_slice(data_bytes);

        // Function 181: Print
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);

        self
    }

    // === Build ===

    /// Take the finished byte stream
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Translate a resolved ticket into the full ESC/POS stream.
///
/// Text lines first, then the QR block centered below, then a partial cut
/// with feed. One fiscal ticket per dispatch.
pub fn render_escpos(job: &PrintJob, width: usize) -> Vec<u8> {
    let mut b = EscPosBuilder::new(width);

    for line in job.text.lines() {
        b.line(line);
    }

    if let Some(qr) = &job.qr_url {
        b.newline();
        b.center();
        b.qr_code(qr, 4);
        b.left();
    }

    b.newline();
    b.cut_partial_feed(0x10);
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subslice_at(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn builder_selects_code_table_after_init() {
        let data = EscPosBuilder::new(32).build();
        // ESC @ resets the code table, so ESC t 16 has to follow it.
        assert_eq!(&data[..5], &[0x1B, 0x40, 0x1B, 0x74, 16]);
    }

    #[test]
    fn line_lr_fills_the_gap() {
        let mut b = EscPosBuilder::new(20);
        b.line_lr("TOTAL", "150.00");
        let data = b.build();
        assert!(subslice_at(&data, b"TOTAL         150.00\n").is_some());
    }

    #[test]
    fn separators_match_paper_width() {
        let mut b = EscPosBuilder::new(10);
        b.sep_double().sep_single();
        let data = b.build();
        assert!(subslice_at(&data, b"==========\n").is_some());
        assert!(subslice_at(&data, b"----------\n").is_some());
    }

    #[test]
    fn style_commands_emit_expected_sequences() {
        let mut b = EscPosBuilder::new(32);
        b.bold().text("TOTAL").bold_off();
        b.double_size().text("1500.00").reset_size();
        b.feed(3);
        let data = b.build();

        assert!(subslice_at(&data, &[0x1B, 0x45, 0x01]).is_some());
        assert!(subslice_at(&data, &[0x1B, 0x45, 0x00]).is_some());
        assert!(subslice_at(&data, &[0x1D, 0x21, 0x11]).is_some());
        assert!(subslice_at(&data, &[0x1D, 0x21, 0x00]).is_some());
        assert!(subslice_at(&data, &[0x1B, 0x64, 0x03]).is_some());
    }

    #[test]
    fn accented_text_encodes_between_commands() {
        let mut b = EscPosBuilder::new(32);
        b.bold().line("Señor").bold_off();
        let data = b.build();
        // ñ as a single cp1252 byte, commands around it intact
        assert!(subslice_at(&data, &[b'S', b'e', 0xF1, b'o', b'r', b'\n']).is_some());
        assert!(subslice_at(&data, &[0x1B, 0x45, 0x01]).is_some());
        assert!(subslice_at(&data, &[0x1B, 0x45, 0x00]).is_some());
    }

    #[test]
    fn rendered_ticket_has_qr_and_cut() {
        let job = PrintJob::new("Total: 150.00").with_qr("https://www.afip.gob.ar/fe/qr/?p=abc");
        let data = render_escpos(&job, 32);

        // QR store-data function present, carrying the URL
        assert!(subslice_at(&data, b"https://www.afip.gob.ar/fe/qr/?p=abc").is_some());
        assert!(subslice_at(&data, &[0x31, 0x50, 0x30]).is_some());
        // Partial cut with feed at the end
        assert_eq!(&data[data.len() - 4..], &[0x1D, 0x56, 0x41, 0x10]);
    }

    #[test]
    fn qr_store_header_survives_for_long_urls() {
        // A production verification URL runs around 250 bytes, which puts
        // the length low byte above 0x7F. It must reach the stream verbatim.
        let url = format!(
            "{}{}",
            "https://www.afip.gob.ar/fe/qr/?p=",
            "A".repeat(214)
        );
        assert_eq!(url.len(), 247);

        let job = PrintJob::new("Total: 150.00").with_qr(&url);
        let data = render_escpos(&job, 32);

        // 247 + 3 = 250 = 0xFA
        let header = [0x1D, 0x28, 0x6B, 0xFA, 0x00, 0x31, 0x50, 0x30];
        let at = subslice_at(&data, &header).expect("store-data header intact");
        assert_eq!(&data[at + header.len()..at + header.len() + url.len()], url.as_bytes());
    }

    #[test]
    fn rendered_ticket_without_qr_has_no_qr_commands() {
        let job = PrintJob::new("Ticket interno\nTotal: 10.00");
        let data = render_escpos(&job, 32);
        assert!(subslice_at(&data, &[0x1D, 0x28, 0x6B]).is_none());
        assert!(subslice_at(&data, b"Ticket interno").is_some());
    }
}
