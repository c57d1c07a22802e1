//! PDF rendering.
#![allow(clippy::float_arithmetic)]

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use thiserror::Error;

use super::snapshot::{DocumentKind, DocumentSnapshot};
use crate::records::PaymentDirection;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_RIGHT: f32 = 195.0;
const TOP: f32 = 282.0;
const BOTTOM: f32 = 25.0;
const LAYER: &str = "Layer 1";

/// Rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The PDF library failed.
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

/// Turns a snapshot into document bytes.
pub trait DocumentRenderer: Send + Sync {
    /// Renders `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the document cannot be produced.
    fn render(&self, snapshot: &DocumentSnapshot) -> Result<Vec<u8>, RenderError>;
}

/// A4 PDF renderer using the builtin Helvetica fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn render(&self, snapshot: &DocumentSnapshot) -> Result<Vec<u8>, RenderError> {
        let mut page = Page::new(snapshot.kind.title())?;

        page.text_bold(&snapshot.company.name, 16.0, MARGIN_LEFT, TOP);
        page.text_bold(snapshot.kind.title(), 18.0, 135.0, TOP);
        page.text_bold(&snapshot.reference_no, 12.0, 135.0, TOP - 8.0);
        let mut y = TOP - 7.0;
        for detail in [&snapshot.company.phone, &snapshot.company.address]
            .into_iter()
            .flatten()
        {
            page.text(detail, 10.0, MARGIN_LEFT, y);
            y -= 5.0;
        }

        page.y = TOP - 20.0;
        page.rule();
        page.advance(10.0);
        let party_label = match (snapshot.kind, snapshot.direction) {
            (DocumentKind::PurchaseBill, _) => "Supplier:",
            (DocumentKind::PaymentReceipt, Some(PaymentDirection::PaymentOut)) => "Paid to:",
            (DocumentKind::PaymentReceipt, _) => "Received from:",
            (DocumentKind::SaleInvoice, _) => "Bill to:",
        };
        page.text_bold(party_label, 11.0, MARGIN_LEFT, page.y);
        page.text(
            &format!("Date: {}", snapshot.date.format("%d-%m-%Y")),
            10.0,
            135.0,
            page.y,
        );
        page.advance(6.0);
        page.text(&snapshot.party_name, 10.0, MARGIN_LEFT, page.y);
        page.advance(5.0);
        page.text(&snapshot.party_phone, 10.0, MARGIN_LEFT, page.y);
        page.advance(12.0);

        if snapshot.lines.is_empty() {
            page.text_bold("Amount", 11.0, MARGIN_LEFT, page.y);
            page.text_bold(&snapshot.total_amount.to_string(), 11.0, 150.0, page.y);
            page.advance(8.0);
        } else {
            page.table_header();
            for (index, line) in snapshot.lines.iter().enumerate() {
                page.ensure_room();
                let y = page.y;
                page.text(&format!("{}. {}", index + 1, line.item_name), 10.0, MARGIN_LEFT, y);
                page.text(&line.quantity_kg.to_string(), 10.0, 95.0, y);
                page.text(&line.bags.to_string(), 10.0, 120.0, y);
                page.text(&line.rate.to_string(), 10.0, 140.0, y);
                page.text_bold(&line.total.to_string(), 10.0, 170.0, y);
                page.advance(6.0);
            }
            page.rule();
            page.advance(8.0);
            page.text_bold("Total", 12.0, 140.0, page.y);
            page.text_bold(&snapshot.total_amount.to_string(), 12.0, 170.0, page.y);
            page.advance(8.0);
        }

        page.ensure_room();
        page.text("Previous balance", 10.0, 120.0, page.y);
        page.text(&snapshot.balance_before.to_string(), 10.0, 170.0, page.y);
        page.advance(6.0);
        page.text_bold("Current balance", 11.0, 120.0, page.y);
        page.text_bold(&snapshot.balance_after.to_string(), 11.0, 170.0, page.y);
        page.advance(10.0);

        if let Some(notes) = snapshot.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            page.ensure_room();
            page.text_bold("Notes:", 10.0, MARGIN_LEFT, page.y);
            page.advance(5.0);
            for line in notes.lines() {
                page.ensure_room();
                page.text(line, 10.0, MARGIN_LEFT, page.y);
                page.advance(5.0);
            }
        }

        page.finish()
    }
}

/// Cursor over the current page of a document being written.
struct Page {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Page {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let layer = doc.get_page(page).get_layer(layer);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: TOP,
        })
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(y), &self.font);
    }

    fn text_bold(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(y), &self.bold);
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    fn rule(&self) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y)), false),
                (Point::new(Mm(MARGIN_RIGHT), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn table_header(&mut self) {
        let y = self.y;
        self.text_bold("Item", 10.0, MARGIN_LEFT, y);
        self.text_bold("Kg", 10.0, 95.0, y);
        self.text_bold("Bags", 10.0, 120.0, y);
        self.text_bold("Rate", 10.0, 140.0, y);
        self.text_bold("Total", 10.0, 170.0, y);
        self.advance(3.5);
        self.rule();
        self.advance(7.0);
    }

    /// Starts a new page when the cursor reaches the bottom margin.
    fn ensure_room(&mut self) {
        if self.y >= BOTTOM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}
