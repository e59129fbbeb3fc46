//! Raster page rendering
//!
//! The driver-printer path: the resolved ticket is drawn onto a white page
//! bitmap (monospaced glyphs plus the QR image), then the page is scaled to
//! the device's printable width before the sink commits it. Dropping the
//! rendered page before the commit cancels the job safely.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::imageops::FilterType;
use image::{GrayImage, Luma};
use qrcode::QrCode;
use tracing::instrument;

use crate::dispatch::PrintJob;
use crate::error::{PrintError, PrintResult};

/// Integer upscale applied to the 8x8 glyphs (2 -> 16px line height)
const GLYPH_SCALE: u32 = 2;
/// Page padding in pixels
const PAGE_PAD: u32 = 24;
/// Vertical gap between text lines
const LINE_GAP: u32 = 8;
/// Target edge length for the QR image on the page
const QR_TARGET: u32 = 320;
/// Gap above and below the QR image
const QR_GAP: u32 = 12;

const BLACK: Luma<u8> = Luma([0u8]);
const WHITE: Luma<u8> = Luma([255u8]);

/// Render a resolved ticket onto a page-sized monochrome bitmap.
///
/// `page_width` is the logical page width in pixels; height grows with the
/// content. Text is drawn with a fixed-cell font, the QR (when present) is
/// centered below it.
#[instrument(skip(job))]
pub fn render_page(job: &PrintJob, page_width: u32) -> PrintResult<GrayImage> {
    let lines: Vec<&str> = job.text.lines().collect();
    let cell = 8 * GLYPH_SCALE;
    let line_height = cell + LINE_GAP;

    let qr = match &job.qr_url {
        Some(data) => Some(render_qr(data, QR_TARGET)?),
        None => None,
    };

    let mut height = PAGE_PAD * 2 + lines.len() as u32 * line_height;
    if let Some(qr) = &qr {
        height += QR_GAP + qr.height() + QR_GAP;
    }

    let mut page = GrayImage::from_pixel(page_width, height.max(1), WHITE);

    let mut y = PAGE_PAD;
    for line in &lines {
        draw_text_line(&mut page, PAGE_PAD, y, line);
        y += line_height;
    }

    if let Some(qr) = &qr {
        y += QR_GAP;
        let x = page_width.saturating_sub(qr.width()) / 2;
        image::imageops::overlay(&mut page, qr, i64::from(x), i64::from(y));
    }

    Ok(page)
}

/// Render QR data as a black-on-white bitmap close to `target` pixels wide.
///
/// Modules are scaled by a whole factor so the code stays crisp; the result
/// is never wider than `target` (one pixel per module at worst).
pub fn render_qr(data: &str, target: u32) -> PrintResult<GrayImage> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| PrintError::InvalidConfig(format!("QR encode failed: {e}")))?;
    let modules = code.to_colors();
    let module_count = code.width() as u32;

    let scale = (target / module_count).max(1);
    let size = module_count * scale;

    let mut img = GrayImage::from_pixel(size, size, WHITE);
    for (i, color) in modules.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let mx = (i as u32) % module_count;
        let my = (i as u32) / module_count;
        for dx in 0..scale {
            for dy in 0..scale {
                img.put_pixel(mx * scale + dx, my * scale + dy, BLACK);
            }
        }
    }

    Ok(img)
}

/// Scale a rendered page to the device's printable width.
///
/// Downscale only, aspect ratio preserved, with a 5% margin on each side.
/// A page narrower than the device prints at its natural size.
pub fn scale_to_device(page: &GrayImage, printable_width: u32) -> GrayImage {
    let margin = printable_width / 20;
    let max_w = printable_width.saturating_sub(margin * 2).max(1);

    if page.width() <= max_w {
        return page.clone();
    }

    let scale = f64::from(max_w) / f64::from(page.width());
    let h = ((f64::from(page.height()) * scale).round() as u32).max(1);
    image::imageops::resize(page, max_w, h, FilterType::Nearest)
}

/// Draw one line of text with the fixed-cell font, clipped at the page edge.
fn draw_text_line(page: &mut GrayImage, x: u32, y: u32, text: &str) {
    let cell = 8 * GLYPH_SCALE;
    for (col, ch) in text.chars().enumerate() {
        let gx = x + col as u32 * cell;
        if gx + cell > page.width() {
            break;
        }
        draw_glyph(page, gx, y, glyph(ch));
    }
}

fn draw_glyph(page: &mut GrayImage, x: u32, y: u32, rows: [u8; 8]) {
    for (row, bits) in rows.iter().enumerate() {
        for bit in 0..8u32 {
            if bits & (1 << bit) == 0 {
                continue;
            }
            for dx in 0..GLYPH_SCALE {
                for dy in 0..GLYPH_SCALE {
                    let px = x + bit * GLYPH_SCALE + dx;
                    let py = y + row as u32 * GLYPH_SCALE + dy;
                    if px < page.width() && py < page.height() {
                        page.put_pixel(px, py, BLACK);
                    }
                }
            }
        }
    }
}

/// Look up the glyph for a character, falling back through the Latin block
/// (accented Spanish letters) to '?' for anything unmapped.
fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark_pixels(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn page_contains_text_and_qr() {
        let job = PrintJob::new("Total: 150.00").with_qr("https://www.afip.gob.ar/fe/qr/?p=abc");
        let page = render_page(&job, 760).unwrap();
        assert_eq!(page.width(), 760);
        assert!(page.height() > QR_TARGET);
        assert!(dark_pixels(&page) > 0);
    }

    #[test]
    fn page_without_qr_is_shorter() {
        let with = render_page(
            &PrintJob::new("linea").with_qr("https://example.invalid/p=x"),
            760,
        )
        .unwrap();
        let without = render_page(&PrintJob::new("linea"), 760).unwrap();
        assert!(with.height() > without.height());
    }

    #[test]
    fn qr_is_square_and_monochrome() {
        let qr = render_qr("https://www.afip.gob.ar/fe/qr/?p=abc", QR_TARGET).unwrap();
        assert_eq!(qr.width(), qr.height());
        assert!(qr.width() <= QR_TARGET);
        assert!(qr.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert!(dark_pixels(&qr) > 0);
    }

    #[test]
    fn scaling_preserves_aspect_ratio() {
        let page = GrayImage::from_pixel(800, 400, Luma([255]));
        let scaled = scale_to_device(&page, 400);

        let margin = 400 / 20;
        let expected_w = 400 - margin * 2;
        assert_eq!(scaled.width(), expected_w);

        let in_ratio = 800.0 / 400.0;
        let out_ratio = f64::from(scaled.width()) / f64::from(scaled.height());
        assert!((in_ratio - out_ratio).abs() < 0.02);
    }

    #[test]
    fn narrow_pages_are_not_upscaled() {
        let page = GrayImage::from_pixel(200, 100, Luma([255]));
        let scaled = scale_to_device(&page, 1000);
        assert_eq!((scaled.width(), scaled.height()), (200, 100));
    }
}
