use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;

use crate::domain::order::Order;

// ============================================================================
// Invoice Renderer
// ============================================================================
//
// Pure function of the order: renders the invoice PDF for download. No
// side effects on the order itself.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}

pub trait InvoiceRenderer: Send + Sync {
    fn render(&self, order: &Order) -> Result<Vec<u8>, InvoiceError>;
}

enum Line {
    Heading(String),
    Text(String),
    Emphasis(String),
    Gap,
}

#[derive(Default)]
pub struct PdfInvoiceRenderer;

impl PdfInvoiceRenderer {
    pub fn new() -> Self {
        Self
    }

    fn layout(order: &Order) -> Vec<Line> {
        let addr = &order.shipping_address;
        let mut lines = vec![
            Line::Heading("Invoice".into()),
            Line::Text(format!("Order ID: {}", order.id)),
            Line::Text(format!("Date: {}", order.created_at.format("%Y-%m-%d"))),
            Line::Gap,
            Line::Text(format!("Customer: {} {}", addr.first_name, addr.last_name)),
            Line::Text(format!("Email: {}", addr.email)),
            Line::Text(format!("Phone: {}", addr.phone)),
            Line::Text(format!("Address: {}", addr.address)),
            Line::Gap,
            Line::Emphasis("Products:".into()),
        ];
        for (index, item) in order.line_items.iter().enumerate() {
            lines.push(Line::Text(format!(
                "{}. {} - {} x {}",
                index + 1,
                item.title,
                item.quantity,
                item.price
            )));
        }
        lines.extend([
            Line::Gap,
            Line::Text(format!("Subtotal: {}", order.subtotal)),
            Line::Text(format!("Discount: {}", order.discount_amount)),
            Line::Emphasis(format!("Total: {}", order.final_amount)),
            Line::Gap,
            Line::Text(format!("Payment Mode: {}", order.payment_mode.as_str())),
            Line::Text(format!("Payment Status: {}", order.payment_status)),
            Line::Gap,
            Line::Text("Thank you for shopping with us!".into()),
        ]);
        lines
    }
}

impl InvoiceRenderer for PdfInvoiceRenderer {
    fn render(&self, order: &Order) -> Result<Vec<u8>, InvoiceError> {
        let (doc, page, layer) = PdfDocument::new("Invoice", Mm(210.0), Mm(297.0), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        let mut y = 275.0;
        for line in Self::layout(order) {
            match line {
                Line::Heading(text) => {
                    layer.use_text(text, 25.0, Mm(20.0), Mm(y), &bold);
                    y -= 14.0;
                }
                Line::Emphasis(text) => {
                    layer.use_text(text, 12.0, Mm(20.0), Mm(y), &bold);
                    y -= 7.0;
                }
                Line::Text(text) => {
                    layer.use_text(text, 12.0, Mm(20.0), Mm(y), &regular);
                    y -= 7.0;
                }
                Line::Gap => y -= 5.0,
            }
        }

        let mut buffer = BufWriter::new(Vec::new());
        doc.save(&mut buffer)
            .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
        buffer
            .into_inner()
            .map_err(|e| InvoiceError::Pdf(e.to_string()))
    }
}
