//! PDF rendering for quotations and the business report.
//!
//! Both documents are drawn onto A4 pages with the builtin Helvetica faces,
//! tracking the cursor from the top of the page. Rendering is CPU-bound, so
//! handlers call these builders inside `spawn_blocking`.

use ancestra_core::money::{format_zmw, format_zmw_grouped};
use ancestra_core::quote::{QuoteLine, QuoteTotals};
use ancestra_core::ReportSummary;
use chrono::{DateTime, FixedOffset, NaiveDate};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use crate::error::ApiError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Y position past which a table row spills onto a fresh page.
const PAGE_BREAK_Y: f32 = PAGE_HEIGHT - 20.0;

/// Everything the quotation renderer needs, resolved by the handler.
#[derive(Debug, Clone)]
pub struct QuotationDocument {
    pub quote_number: String,
    pub quote_date: NaiveDate,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub customer_city: Option<String>,
    pub company_name: String,
    pub company_address: String,
    pub lines: Vec<QuoteLine>,
    pub totals: QuoteTotals,
    pub tax_rate: f64,
    pub terms: String,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

fn pdf_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Internal(format!("Failed to render PDF: {err}"))
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn black() -> Color {
    rgb(0, 0, 0)
}

/// Approximate Helvetica string width in mm at `size` points.
fn text_width(txt: &str, size: f32) -> f32 {
    txt.chars().count() as f32 * size * 0.2
}

/// Draw text inside a cell box whose top edge sits `y` mm from the page top.
fn cell_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    size: f32,
    txt: &str,
    align: Align,
) {
    let text_x = match align {
        Align::Left => x + 1.0,
        Align::Center => x + (w - text_width(txt, size)) / 2.0,
        Align::Right => x + w - 1.0 - text_width(txt, size),
    };
    let baseline = y + h / 2.0 + size * 0.12;

    layer.begin_text_section();
    layer.set_font(font, size);
    layer.set_text_cursor(Mm(text_x), Mm(PAGE_HEIGHT - baseline));
    layer.write_text(txt, font);
    layer.end_text_section();
}

fn rect_points(x: f32, y: f32, w: f32, h: f32) -> Vec<(Point, bool)> {
    vec![
        (Point::new(Mm(x), Mm(PAGE_HEIGHT - y)), false),
        (Point::new(Mm(x + w), Mm(PAGE_HEIGHT - y)), false),
        (Point::new(Mm(x + w), Mm(PAGE_HEIGHT - y - h)), false),
        (Point::new(Mm(x), Mm(PAGE_HEIGHT - y - h)), false),
    ]
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32) {
    layer.add_polygon(Polygon {
        rings: vec![rect_points(x, y, w, h)],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

fn stroke_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32) {
    layer.add_line(Line {
        points: rect_points(x, y, w, h),
        is_closed: true,
    });
}

/// Bordered table cell, optionally filled.
///
/// Text is painted with the fill color, so the fill is laid down first and
/// the text color restored afterwards.
#[allow(clippy::too_many_arguments)]
fn table_cell(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    size: f32,
    txt: &str,
    align: Align,
    fill: Option<Color>,
    text_color: Color,
) {
    if let Some(color) = fill {
        layer.set_fill_color(color);
        fill_rect(layer, x, y, w, h);
    }
    stroke_rect(layer, x, y, w, h);
    layer.set_fill_color(text_color);
    cell_text(layer, font, x, y, w, h, size, txt, align);
}

/// Tax rate rendered the way it reads in the payload, `5.0` not `5`.
fn display_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{rate:.1}")
    } else {
        format!("{rate}")
    }
}

/// First `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Greedy word wrap by character count.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Render a quotation document.
pub fn build_quotation_pdf(quotation: &QuotationDocument) -> Result<Vec<u8>, ApiError> {
    let (doc, page1, layer1) = PdfDocument::new(
        format!("Quotation {}", quotation.quote_number),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    layer.set_outline_color(black());
    layer.set_outline_thickness(0.2);
    layer.set_fill_color(black());

    let mut y = MARGIN;

    // Company header
    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 8.0, 12.0, &quotation.company_name, Align::Left);
    y += 8.0;
    for line in quotation.company_address.lines() {
        cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 5.0, 10.0, line, Align::Left);
        y += 5.0;
    }
    y += 5.0;

    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 15.0, 32.0, "QUOTE", Align::Right);
    y += 15.0 + 5.0;

    // Bill-to block on the left, quote details on the right
    let columns_y = y;
    cell_text(&layer, &bold, MARGIN, y, 90.0, 6.0, 10.0, "Bill To", Align::Left);
    y += 6.0;
    cell_text(&layer, &regular, MARGIN, y, 90.0, 6.0, 10.0, &quotation.customer_name, Align::Left);
    y += 6.0;
    if let Some(address) = &quotation.customer_address {
        cell_text(&layer, &regular, MARGIN, y, 90.0, 6.0, 10.0, address, Align::Left);
        y += 6.0;
    }
    if let Some(city) = &quotation.customer_city {
        cell_text(&layer, &regular, MARGIN, y, 90.0, 6.0, 10.0, city, Align::Left);
        y += 6.0;
    }

    let details = [
        ("Quote #", quotation.quote_number.clone()),
        ("Quote date", quotation.quote_date.format("%d-%m-%Y").to_string()),
        ("Due date", quotation.due_date.format("%d-%m-%Y").to_string()),
    ];
    let mut detail_y = columns_y;
    for (label, value) in &details {
        cell_text(&layer, &bold, 110.0, detail_y, 40.0, 6.0, 10.0, label, Align::Left);
        cell_text(&layer, &regular, 150.0, detail_y, 50.0, 6.0, 10.0, value, Align::Right);
        detail_y += 6.0;
    }
    y = detail_y + 10.0;

    // Items table
    let header_fill = rgb(240, 240, 240);
    table_cell(&layer, &bold, MARGIN, y, 20.0, 8.0, 10.0, "QTY", Align::Left, Some(header_fill.clone()), black());
    table_cell(&layer, &bold, 30.0, y, 95.0, 8.0, 10.0, "Description", Align::Left, Some(header_fill.clone()), black());
    table_cell(&layer, &bold, 125.0, y, 35.0, 8.0, 10.0, "Unit Price", Align::Right, Some(header_fill.clone()), black());
    table_cell(&layer, &bold, 160.0, y, 40.0, 8.0, 10.0, "Amount", Align::Right, Some(header_fill), black());
    y += 8.0;

    for line in &quotation.lines {
        if y + 8.0 > PAGE_BREAK_Y {
            let (page, layer_index) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_index);
            layer.set_outline_color(black());
            layer.set_outline_thickness(0.2);
            layer.set_fill_color(black());
            y = MARGIN;
        }
        table_cell(&layer, &regular, MARGIN, y, 20.0, 8.0, 10.0, &format!("{:.2}", line.quantity), Align::Left, None, black());
        table_cell(&layer, &regular, 30.0, y, 95.0, 8.0, 10.0, &truncate_chars(&line.description, 40), Align::Left, None, black());
        table_cell(&layer, &regular, 125.0, y, 35.0, 8.0, 10.0, &format_zmw(line.unit_price), Align::Right, None, black());
        table_cell(&layer, &regular, 160.0, y, 40.0, 8.0, 10.0, &format_zmw(line.amount), Align::Right, None, black());
        y += 8.0;
    }
    y += 5.0;

    // Totals
    cell_text(&layer, &bold, MARGIN, y, 150.0, 6.0, 10.0, "Subtotal", Align::Right);
    cell_text(&layer, &regular, 160.0, y, 40.0, 6.0, 10.0, &format_zmw(quotation.totals.subtotal), Align::Right);
    y += 6.0;
    let tax_label = format!("Sales Tax ({}%)", display_rate(quotation.tax_rate));
    cell_text(&layer, &bold, MARGIN, y, 150.0, 6.0, 10.0, &tax_label, Align::Right);
    cell_text(&layer, &regular, 160.0, y, 40.0, 6.0, 10.0, &format_zmw(quotation.totals.tax), Align::Right);
    y += 6.0;
    cell_text(&layer, &bold, MARGIN, y, 150.0, 8.0, 11.0, "Total (ZMW)", Align::Right);
    cell_text(&layer, &bold, 160.0, y, 40.0, 8.0, 11.0, &format_zmw(quotation.totals.total), Align::Right);
    y += 8.0 + 10.0;

    if !quotation.terms.is_empty() {
        cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, "Terms and Conditions", Align::Left);
        y += 6.0;
        for line in wrap_text(&quotation.terms, 95) {
            cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 5.0, 10.0, &line, Align::Left);
            y += 5.0;
        }
        y += 2.0;
        let payable = format!("Please make checks payable to: {}", quotation.company_name);
        cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 5.0, 10.0, &payable, Align::Left);
        y += 5.0 + 10.0;
    }
    y += 10.0;

    // Signature line
    cell_text(&layer, &regular, 110.0, y, 80.0, 6.0, 10.0, &"_".repeat(50), Align::Right);
    y += 6.0;
    cell_text(&layer, &regular, 110.0, y, 80.0, 5.0, 9.0, "customer signature", Align::Right);

    doc.save_to_bytes().map_err(pdf_error)
}

/// Render the business report document.
pub fn build_report_pdf(
    summary: &ReportSummary,
    issued_at: DateTime<FixedOffset>,
) -> Result<Vec<u8>, ApiError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Ancestra Business Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    layer.set_outline_color(black());
    layer.set_outline_thickness(0.2);

    let purple = rgb(59, 2, 112);
    let header_fill = rgb(111, 0, 255);
    let white = rgb(255, 255, 255);

    let mut y = MARGIN;

    layer.set_fill_color(purple.clone());
    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 15.0, 24.0, "ANCESTRA BUSINESS REPORT", Align::Center);
    y += 15.0;

    layer.set_fill_color(rgb(102, 102, 102));
    cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, "Financial Overview & Performance Analysis", Align::Center);
    y += 6.0;
    let issued = issued_at.format("%d %b %Y %H:%M CAT").to_string();
    cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, &issued, Align::Center);
    y += 6.0 + 10.0;

    // Summary cards
    let cards = [
        (20.0_f32, 55.0_f32, "Total Sales", summary.total_sales),
        (75.0, 60.0, "Total Expenses", summary.total_expenses),
        (135.0, 55.0, "Net Profit", summary.total_profit),
    ];
    for (x, w, label, value) in &cards {
        table_cell(&layer, &bold, *x, y, *w, 8.0, 12.0, label, Align::Center, None, purple.clone());
        table_cell(&layer, &bold, *x, y + 8.0, *w, 10.0, 14.0, &format_zmw_grouped(*value), Align::Center, None, purple.clone());
    }
    y += 25.0;

    // Period summaries
    layer.set_fill_color(purple.clone());
    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 8.0, 12.0, "Period Summaries", Align::Left);
    y += 8.0;

    let period_widths = [50.0_f32, 45.0, 45.0, 50.0];
    let period_headers = ["Period", "Sales", "Expenses", "Profit"];
    let mut x = MARGIN;
    for (i, header) in period_headers.iter().enumerate() {
        let align = if i == 0 { Align::Left } else { Align::Center };
        table_cell(&layer, &bold, x, y, period_widths[i], 8.0, 10.0, header, align, Some(header_fill.clone()), white.clone());
        x += period_widths[i];
    }
    y += 8.0;

    for period in &summary.period_summaries {
        let cells = [
            period.label.clone(),
            format_zmw_grouped(period.sales),
            format_zmw_grouped(period.expenses),
            format_zmw_grouped(period.profit),
        ];
        let mut x = MARGIN;
        for (i, value) in cells.iter().enumerate() {
            let align = if i == 0 { Align::Left } else { Align::Center };
            table_cell(&layer, &regular, x, y, period_widths[i], 8.0, 10.0, value, align, None, black());
            x += period_widths[i];
        }
        y += 8.0;
    }
    y += 8.0;

    // Last seven days
    layer.set_fill_color(purple.clone());
    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 8.0, 12.0, "Sales vs Expenses (Last 7 Days)", Align::Left);
    y += 8.0;

    let day_headers = ["Date", "Sales", "Expenses", "Profit"];
    let mut x = MARGIN;
    for (i, header) in day_headers.iter().enumerate() {
        let align = if i == 0 { Align::Left } else { Align::Center };
        table_cell(&layer, &bold, x, y, period_widths[i], 8.0, 10.0, header, align, Some(header_fill.clone()), white.clone());
        x += period_widths[i];
    }
    y += 8.0;

    for point in &summary.sales_vs_expenses {
        if y + 8.0 > PAGE_BREAK_Y {
            let (page, layer_index) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_index);
            layer.set_outline_color(black());
            layer.set_outline_thickness(0.2);
            y = MARGIN;
        }
        let cells = [
            point.period.format("%d %b %Y").to_string(),
            format_zmw_grouped(point.sales),
            format_zmw_grouped(point.expenses),
            format_zmw_grouped(point.profit),
        ];
        let mut x = MARGIN;
        for (i, value) in cells.iter().enumerate() {
            let align = if i == 0 { Align::Left } else { Align::Center };
            table_cell(&layer, &regular, x, y, period_widths[i], 8.0, 10.0, value, align, None, black());
            x += period_widths[i];
        }
        y += 8.0;
    }
    y += 8.0;

    // Best sellers
    layer.set_fill_color(purple.clone());
    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 8.0, 12.0, "Best Selling Products", Align::Left);
    y += 8.0;

    let seller_widths = [60.0_f32, 30.0, 25.0, 40.0, 35.0];
    let seller_headers = ["Product", "Price", "Qty", "Revenue", "Status"];
    let mut x = MARGIN;
    for (i, header) in seller_headers.iter().enumerate() {
        let align = if i == 0 { Align::Left } else { Align::Center };
        table_cell(&layer, &bold, x, y, seller_widths[i], 8.0, 10.0, header, align, Some(header_fill.clone()), white.clone());
        x += seller_widths[i];
    }
    y += 8.0;

    for seller in &summary.best_sellers {
        if y + 8.0 > PAGE_BREAK_Y {
            let (page, layer_index) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_index);
            layer.set_outline_color(black());
            layer.set_outline_thickness(0.2);
            y = MARGIN;
        }
        let cells = [
            truncate_chars(&seller.product_name, 25),
            format_zmw_grouped(seller.unit_price),
            seller.total_quantity.to_string(),
            format_zmw_grouped(seller.total_revenue),
            seller.status.clone(),
        ];
        let mut x = MARGIN;
        for (i, value) in cells.iter().enumerate() {
            let align = if i == 0 { Align::Left } else { Align::Center };
            table_cell(&layer, &regular, x, y, seller_widths[i], 8.0, 10.0, value, align, None, black());
            x += seller_widths[i];
        }
        y += 8.0;
    }
    y += 8.0;

    // Low stock
    layer.set_fill_color(purple);
    cell_text(&layer, &bold, MARGIN, y, CONTENT_WIDTH, 8.0, 12.0, "Low Stock Items", Align::Left);
    y += 8.0;

    if summary.low_stock.is_empty() {
        layer.set_fill_color(rgb(5, 150, 105));
        cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, "All products are adequately stocked", Align::Left);
        y += 6.0;
    } else {
        layer.set_fill_color(rgb(255, 78, 0));
        for line in wrap_text(&summary.low_stock.join(", "), 95) {
            cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, &line, Align::Left);
            y += 6.0;
        }
    }
    y += 6.0;

    layer.set_fill_color(black());
    cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, &format!("Total Orders: {}", summary.total_orders), Align::Left);
    y += 6.0;
    let sales_today = format!("Sales Today: {}", format_zmw_grouped(summary.sales_today));
    cell_text(&layer, &regular, MARGIN, y, CONTENT_WIDTH, 6.0, 10.0, &sales_today, Align::Left);

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancestra_core::quote::compute_totals;
    use ancestra_core::time::now_cat;
    use ancestra_core::{BestSeller, PeriodSummary, ProfitPoint};

    #[test]
    fn rate_renders_like_a_float() {
        assert_eq!(display_rate(5.0), "5.0");
        assert_eq!(display_rate(16.5), "16.5");
        assert_eq!(display_rate(0.0), "0.0");
    }

    #[test]
    fn wrap_respects_word_boundaries() {
        let lines = wrap_text("Sugar (2), Salt (1), Bread (0)", 14);
        assert_eq!(lines, vec!["Sugar (2),", "Salt (1),", "Bread (0)"]);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("ab", 4), "ab");
    }

    #[test]
    fn quotation_pdf_renders() {
        let lines = vec![
            QuoteLine::new("Maize Flour 25kg", 2.0, 120.0),
            QuoteLine::new("Cooking Oil 5L", 1.0, 90.0),
        ];
        let totals = compute_totals(&lines, 5.0);
        let quotation = QuotationDocument {
            quote_number: "QT0001_0101_2025".into(),
            quote_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            customer_name: "Chileshe Trading".into(),
            customer_address: Some("12 Cairo Road".into()),
            customer_city: Some("Lusaka".into()),
            company_name: "Ancestra Business".into(),
            company_address: "Plot 5, Great East Road, Lusaka".into(),
            lines,
            totals,
            tax_rate: 5.0,
            terms: "Payment is due in 14 days".into(),
        };

        let bytes = build_quotation_pdf(&quotation).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn report_pdf_renders() {
        let summary = ReportSummary {
            total_sales: 1500.0,
            total_expenses: 400.0,
            total_profit: 1100.0,
            total_orders: 12,
            sales_today: 350.0,
            low_stock: vec!["Sugar 1kg (2)".into()],
            sales_vs_expenses: vec![ProfitPoint {
                period: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                sales: 200.0,
                expenses: 50.0,
                profit: 150.0,
            }],
            period_summaries: vec![PeriodSummary {
                label: "Daily".into(),
                sales: 350.0,
                expenses: 20.0,
                profit: 330.0,
            }],
            best_sellers: vec![BestSeller {
                product_id: "p1".into(),
                product_name: "Mealie Meal 25kg".into(),
                unit_price: 250.0,
                total_quantity: 40,
                total_revenue: 10_000.0,
                status: "In stock".into(),
            }],
            sales_by_user: Vec::new(),
        };

        let bytes = build_report_pdf(&summary, now_cat()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
