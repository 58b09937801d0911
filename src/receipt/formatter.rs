//! # Receipt Formatter
//!
//! Lays a [`ReceiptDocument`] out on a fixed-width character grid and emits
//! it as an IR [`Program`].
//!
//! ## Layout
//!
//! ```text
//!          KOPI BREWASA           ← bold, double height, centered
//!          brewasa.com
//! --------------------------------
//!  Jl. Jalur I No.5, Surgi Mufti,  ← address, centered
//! --------------------------------
//! Tgl: 16/10/2026, 09.30.00        ← left aligned from here
//! Cus: Guest
//! --------------------------------
//! Kopi Renjana
//! 2 x 28.000                56.000
//! --------------------------------
//! Subtotal                  88.000 ← bold
//! Diskon                    -5.000 ← only when discount > 0
//! TOTAL                     83.000 ← bold, double size
//! --------------------------------
//!       WIFI: Kopi Brewasa         ← bold, centered
//! --------------------------------
//!          Terima Kasih!
//! ```
//!
//! followed by the trailing feed that clears the tear bar.

use chrono::Local;
use tracing::warn;

use super::document::{ReceiptDocument, StoreProfile};
use super::money::format_amount;
use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::ir::{Op, Program};
use crate::printer::PrinterConfig;
use crate::protocol::text::{Alignment, TextSize};
use crate::render::raster;

/// Timestamp line format (`16/10/2026, 09.30.00`).
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H.%M.%S";

/// Label on the left, value flush right, `width` characters in total.
///
/// When the two do not fit side by side the line degrades to
/// `label + " " + value` and may run past `width`; nothing is truncated.
///
/// ```
/// use struk::receipt::line_pair;
///
/// assert_eq!(line_pair("TOTAL", "88.000", 16), "TOTAL     88.000");
/// assert_eq!(line_pair("Very long label", "88.000", 16), "Very long label 88.000");
/// ```
pub fn line_pair(label: &str, value: &str, width: usize) -> String {
    let used = label.chars().count() + value.chars().count();
    match width.checked_sub(used) {
        Some(space) => format!("{}{}{}", label, " ".repeat(space), value),
        None => format!("{} {}", label, value),
    }
}

/// A full-width rule of dashes.
pub fn divider(width: usize) -> String {
    "-".repeat(width)
}

/// Renders receipts for one printer configuration.
#[derive(Debug, Clone, Default)]
pub struct ReceiptFormatter {
    config: PrinterConfig,
    logo: Option<Vec<u8>>,
}

impl ReceiptFormatter {
    pub fn new(config: PrinterConfig) -> Self {
        Self { config, logo: None }
    }

    /// Print this encoded image above the store name on every receipt.
    pub fn with_logo(mut self, encoded: Vec<u8>) -> Self {
        self.logo = Some(encoded);
        self
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Lay out a receipt.
    ///
    /// A logo that fails to decode or rasterize is logged and left out; the
    /// rest of the receipt is unaffected.
    pub fn layout(&self, doc: &ReceiptDocument) -> Program {
        let width = self.config.columns;
        let rule = divider(width);
        let store = &doc.store;

        let mut program = Program::with_init();
        program.push(Op::SetAlign(Alignment::Center));

        if let Some(logo) = &self.logo {
            match raster::rasterize_bytes(logo, &self.config) {
                Ok(image) => {
                    program.push(Op::Raster(image));
                    program.push(Op::Feed { lines: 1 });
                }
                Err(e) => warn!(error = %e, "Logo skipped"),
            }
        }

        // Header
        program.push(Op::SetBold(true));
        program.push(Op::SetSize(TextSize::DoubleHeight));
        program.line(store.name.as_str());
        program.push(Op::SetSize(TextSize::Normal));
        program.push(Op::SetBold(false));
        program.line(store.tagline.as_str());
        program.line(rule.as_str());
        program.push(Op::SetAlign(Alignment::Center));
        for line in &store.address {
            program.line(line.as_str());
        }
        program.line(rule.as_str());

        // Metadata
        let printed_at = doc
            .printed_at
            .unwrap_or_else(|| Local::now().naive_local());
        program.push(Op::SetAlign(Alignment::Left));
        program.line(format!("Tgl: {}", printed_at.format(TIMESTAMP_FORMAT)));
        program.line(format!("Cus: {}", doc.customer_label()));
        program.line(rule.as_str());

        // Items
        for item in &doc.items {
            program.line(item.name.as_str());
            let qty_price = format!("{} x {}", item.quantity, format_amount(item.unit_price));
            program.line(line_pair(&qty_price, &format_amount(item.line_total()), width));
        }
        program.line(rule.as_str());

        // Totals
        program.push(Op::SetBold(true));
        program.line(line_pair("Subtotal", &format_amount(doc.subtotal), width));
        if doc.discount > 0 {
            let discount = format!("-{}", format_amount(doc.discount));
            program.line(line_pair("Diskon", &discount, width));
        }
        program.push(Op::SetSize(TextSize::Double));
        program.line(line_pair("TOTAL", &format_amount(doc.total), width));
        program.push(Op::SetSize(TextSize::Normal));
        program.push(Op::SetBold(false));
        program.line(rule.as_str());

        // Venue
        program.push(Op::SetAlign(Alignment::Center));
        program.push(Op::SetBold(true));
        for line in &store.venue_info {
            program.line(line.as_str());
        }
        program.push(Op::SetBold(false));
        program.line(rule.as_str());

        // Closing
        program.push(Op::SetAlign(Alignment::Center));
        for line in &store.thanks {
            program.line(line.as_str());
        }

        self.finish(&mut program);
        program
    }

    /// Lay out and encode a receipt.
    pub fn render(&self, doc: &ReceiptDocument) -> CommandBuffer {
        CommandBuffer::from(&self.layout(doc))
    }

    /// A minimal banner for checking connectivity without business data.
    pub fn test_page(&self, store: &StoreProfile) -> Program {
        let mut program = Program::with_init();
        program.push(Op::SetAlign(Alignment::Center));
        program.push(Op::Newline);
        program.line("TEST PRINT SUCCESS!");
        program.line(store.name.as_str());
        self.finish(&mut program);
        program
    }

    /// A standalone image print: the raster followed by one feed line.
    ///
    /// Unlike the receipt logo, a failure here is the whole job and is
    /// returned to the caller.
    pub fn image_page(&self, encoded: &[u8]) -> Result<Program, PrinterError> {
        let image = raster::rasterize_bytes(encoded, &self.config)?;
        Ok(Program::from_iter([
            Op::Raster(image),
            Op::Feed { lines: 1 },
        ]))
    }

    fn finish(&self, program: &mut Program) {
        program.push(Op::Feed {
            lines: self.config.trailing_feed,
        });
        if self.config.cut {
            program.push(Op::Cut);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::document::LineItem;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn sample() -> ReceiptDocument {
        ReceiptDocument::new(vec![
            LineItem::new("Kopi Renjana", 2, 28_000),
            LineItem::new("Latte Jeda", 1, 32_000),
        ])
        .printed_at(fixed_time())
    }

    #[test]
    fn test_line_pair_fills_width() {
        let line = line_pair("Subtotal", "88.000", 32);
        assert_eq!(line.len(), 32);
        assert!(line.starts_with("Subtotal "));
        assert!(line.ends_with(" 88.000"));
    }

    #[test]
    fn test_line_pair_never_exceeds_width_when_it_fits() {
        for label_len in 0..=31 {
            let value_len = 31 - label_len;
            let label = "L".repeat(label_len);
            let value = "9".repeat(value_len);
            let line = line_pair(&label, &value, 32);
            assert_eq!(line.chars().count(), 32);
            assert!(line.starts_with(&label));
            assert!(line.ends_with(&value));
        }
    }

    #[test]
    fn test_line_pair_exact_fit_has_no_gap() {
        let label = "A".repeat(26);
        assert_eq!(line_pair(&label, "88.000", 32), format!("{}88.000", label));
    }

    #[test]
    fn test_line_pair_overflow_concatenates() {
        let label = "Es Kopi Susu Gula Aren Extra Shot";
        let line = line_pair(label, "120.000", 32);
        assert_eq!(line, format!("{} 120.000", label));
    }

    #[test]
    fn test_layout_text() {
        let lines = ReceiptFormatter::default().layout(&sample()).text_lines();
        let rule = "-".repeat(32);
        assert_eq!(
            lines,
            vec![
                "KOPI BREWASA".to_string(),
                "brewasa.com".to_string(),
                rule.clone(),
                "Jl. Jalur I No.5, Surgi Mufti,".to_string(),
                "Banjarmasin Utara,".to_string(),
                "Kota Banjarmasin, Kalsel 70122".to_string(),
                rule.clone(),
                "Tgl: 16/10/2026, 09.30.00".to_string(),
                "Cus: Guest".to_string(),
                rule.clone(),
                "Kopi Renjana".to_string(),
                "2 x 28.000                56.000".to_string(),
                "Latte Jeda".to_string(),
                "1 x 32.000                32.000".to_string(),
                rule.clone(),
                "Subtotal                  88.000".to_string(),
                "TOTAL                     88.000".to_string(),
                rule.clone(),
                "WIFI: Kopi Brewasa".to_string(),
                "PASS: ngopidulu".to_string(),
                rule,
                "Terima Kasih!".to_string(),
                "Selamat Menikmati".to_string(),
            ]
        );
    }

    #[test]
    fn test_discount_row_only_when_positive() {
        let formatter = ReceiptFormatter::default();

        let none = formatter.layout(&sample()).text_lines();
        assert!(!none.iter().any(|l| l.starts_with("Diskon")));

        let discounted = formatter.layout(&sample().discount(5_000)).text_lines();
        let rows: Vec<&String> = discounted.iter().filter(|l| l.starts_with("Diskon")).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].ends_with("-5.000"));
        assert_eq!(rows[0].len(), 32);
        assert!(discounted.contains(&"TOTAL                     83.000".to_string()));
    }

    #[test]
    fn test_extreme_amounts_do_not_panic() {
        let doc = ReceiptDocument::new(vec![LineItem::new("Kopi", 4, 1 << 62)]).discount(i64::MAX);
        let lines = ReceiptFormatter::default().layout(&doc).text_lines();
        assert!(lines.contains(&"4 x 4.611.686.018.427.387.904 9.223.372.036.854.775.807".to_string()));
        assert!(lines.iter().any(|l| l.ends_with("-9.223.372.036.854.775.807")));

        // Not printed at all, so nothing is negated
        let mut negative = sample();
        negative.discount = i64::MIN;
        let lines = ReceiptFormatter::default().layout(&negative).text_lines();
        assert!(!lines.iter().any(|l| l.starts_with("Diskon")));
    }

    #[test]
    fn test_total_is_bold_double_size() {
        let program = ReceiptFormatter::default().layout(&sample());
        let pos = program
            .ops
            .iter()
            .position(|op| matches!(op, Op::Text(t) if t.starts_with("TOTAL")))
            .unwrap();
        assert_eq!(program.ops[pos - 1], Op::SetSize(TextSize::Double));
        // Bold was switched on before Subtotal and is still on
        let bold_on = program.ops[..pos]
            .iter()
            .rposition(|op| *op == Op::SetBold(true))
            .unwrap();
        let bold_off = program.ops[..pos]
            .iter()
            .rposition(|op| *op == Op::SetBold(false))
            .unwrap();
        assert!(bold_on > bold_off);
    }

    #[test]
    fn test_render_ends_with_three_feed_lines() {
        let buffer = ReceiptFormatter::default().render(&sample());
        let bytes = buffer.as_bytes();
        assert_eq!(&bytes[..2], &[0x1B, 0x40]);
        assert_eq!(&bytes[bytes.len() - 3..], &[0x1B, 0x64, 0x03]);
    }

    #[test]
    fn test_cut_when_configured() {
        let config = PrinterConfig {
            cut: true,
            ..PrinterConfig::MM58
        };
        let program = ReceiptFormatter::new(config).layout(&sample());
        let n = program.len();
        assert_eq!(program.ops[n - 2], Op::Feed { lines: 3 });
        assert_eq!(program.ops[n - 1], Op::Cut);
    }

    #[test]
    fn test_bad_logo_is_skipped() {
        let formatter = ReceiptFormatter::default().with_logo(b"not a png".to_vec());
        let program = formatter.layout(&sample());
        assert!(!program.iter().any(|op| matches!(op, Op::Raster(_))));
        assert_eq!(
            program.text_lines(),
            ReceiptFormatter::default().layout(&sample()).text_lines()
        );
    }

    #[test]
    fn test_logo_printed_before_header() {
        use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
        use std::io::Cursor;

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 16, Rgb([0, 0, 0])))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let program = ReceiptFormatter::default().with_logo(png).layout(&sample());
        assert!(matches!(&program.ops[2], Op::Raster(img) if img.width() == 64));
        assert_eq!(program.ops[3], Op::Feed { lines: 1 });
    }

    #[test]
    fn test_test_page() {
        let program = ReceiptFormatter::default().test_page(&StoreProfile::default());
        assert_eq!(
            program.text_lines(),
            vec!["", "TEST PRINT SUCCESS!", "KOPI BREWASA"]
        );
        assert_eq!(program.ops.last(), Some(&Op::Feed { lines: 3 }));
    }

    #[test]
    fn test_image_page_is_raster_then_one_feed() {
        use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
        use std::io::Cursor;

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 2, Rgb([0, 0, 0])))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let program = ReceiptFormatter::default().image_page(&png).unwrap();
        assert_eq!(program.len(), 2);
        match &program.ops[0] {
            Op::Raster(img) => {
                assert_eq!((img.width(), img.height()), (16, 2));
                assert_eq!(img.data(), &[0xFF; 4]);
            }
            other => panic!("expected raster, got {:?}", other),
        }
        assert_eq!(program.ops[1], Op::Feed { lines: 1 });
    }

    #[test]
    fn test_image_page_propagates_decode_failure() {
        let err = ReceiptFormatter::default().image_page(b"\x89PNG broken").unwrap_err();
        assert!(matches!(err, PrinterError::ImageDecodeFailed(_)));
    }
}
