//! Printable sale receipt rendering.
//!
//! Produces a self-contained HTML document sized for a 58mm thermal printer,
//! with the company logo and QR code inlined as data URIs so the frontend can
//! print it without further requests.

use std::path::Path;

use ancestra_core::time::{format_cat, RECEIPT_TIME_FORMAT};
use ancestra_core::{ReceiptSettings, Sale, SaleItem};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use qrcode_generator::QrCodeEcc;

use crate::error::ApiError;
use crate::media::{content_type_for, MEDIA_URL};

/// Company name printed when settings leave it blank.
pub const DEFAULT_COMPANY_NAME: &str = "Ancestra Business";

/// Tagline printed when settings leave it blank.
pub const DEFAULT_TAGLINE: &str = "Small Business Sales Receipt";

/// Footer printed when settings leave it blank.
pub const DEFAULT_FOOTER: &str = "Thank you for supporting our business!";

const RECEIPT_CSS: &str = "\
            body {
                font-family: 'Satoshi', system-ui, sans-serif;
                background-color: #ffffff;
                color: #000000;
                margin: 0;
                padding: 0;
            }
            .receipt {
                width: 320px;
                margin: 0 auto;
                padding: 16px;
            }
            .header {
                text-align: center;
                margin-bottom: 8px;
            }
            .header .logo {
                height: 120px;
                margin-bottom: 6px;
                object-fit: contain;
            }
            .header h1 {
                font-size: 18px;
                margin: 0;
            }
            .tagline {
                font-size: 12px;
                margin: 4px 0 0;
            }
            .section {
                font-size: 12px;
                margin-bottom: 12px;
            }
            .meta-row {
                display: flex;
                justify-content: space-between;
                margin-bottom: 4px;
            }
            .meta-row span {
                font-weight: 500;
            }
            .meta-row strong {
                font-weight: 600;
            }
            .divider {
                border-top: 1px dashed #000000;
                margin: 12px 0;
            }
            table {
                width: 100%;
                border-collapse: collapse;
                font-size: 12px;
            }
            th, td {
                padding: 4px 0;
                text-align: left;
                border-bottom: 1px dashed #000000;
            }
            tbody tr:last-child td {
                border-bottom: none;
            }
            th {
                font-size: 10px;
                text-transform: uppercase;
                letter-spacing: 0.05em;
            }
            .align-center {
                text-align: center;
            }
            .align-right {
                text-align: right;
            }
            .totals {
                text-align: right;
                font-size: 14px;
                font-weight: 700;
                margin-top: 8px;
            }
            .footer {
                margin-top: 16px;
                text-align: center;
                font-size: 11px;
            }
            .footer-message {
                margin-bottom: 8px;
            }
            .footer img {
                width: 100px;
                height: 100px;
            }
            @media print {
                body {
                    margin: 0;
                }
                .receipt {
                    width: 58mm;
                    padding: 12px;
                }
                th, td {
                    border-bottom: 1px dashed #000000;
                }
            }";

/// Company name with the blank fallback applied.
pub fn display_company_name(settings: &ReceiptSettings) -> String {
    if settings.company_name.is_empty() {
        DEFAULT_COMPANY_NAME.to_string()
    } else {
        settings.company_name.clone()
    }
}

fn display_tagline(settings: &ReceiptSettings) -> String {
    match settings.company_tagline.as_deref() {
        Some(tagline) if !tagline.is_empty() => tagline.to_string(),
        _ => DEFAULT_TAGLINE.to_string(),
    }
}

fn display_footer(settings: &ReceiptSettings) -> String {
    if settings.footer_message.is_empty() {
        DEFAULT_FOOTER.to_string()
    } else {
        settings.footer_message.clone()
    }
}

/// Payload encoded into the receipt QR code.
///
/// Settings may pin a fixed payload (a verification URL, say); otherwise the
/// code carries `receipt_number|total|timestamp` for offline checking.
pub fn qr_payload(settings: &ReceiptSettings, sale: &Sale) -> String {
    match settings.qr_code_content.as_deref() {
        Some(content) if !content.is_empty() => content.to_string(),
        _ => format!(
            "{}|{:.2}|{}",
            sale.receipt_number,
            sale.total_amount,
            sale.created_at.to_rfc3339()
        ),
    }
}

/// Render the QR payload as a PNG data URI.
pub fn qr_data_uri(payload: &str) -> Result<String, ApiError> {
    let png = qrcode_generator::to_png_to_vec(payload, QrCodeEcc::Medium, 250)
        .map_err(|err| ApiError::Internal(format!("Failed to render QR code: {err}")))?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}

/// Turn the stored logo URL into something an `<img>` tag can load.
///
/// External and data URIs pass through; protocol-relative URLs get `https:`
/// prepended; files under the media root are inlined as base64 so printed
/// receipts keep their logo offline.
pub async fn resolve_logo_src(media_root: &Path, logo_url: Option<&str>) -> Option<String> {
    let url = logo_url?.trim();
    if url.is_empty() {
        return None;
    }
    if url.starts_with("data:") {
        return Some(url.to_string());
    }
    if url.starts_with("//") {
        return Some(format!("https:{url}"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url.to_string());
    }

    let relative = url
        .strip_prefix(MEDIA_URL)
        .unwrap_or(url)
        .trim_start_matches(['/', '\\']);
    let bytes = tokio::fs::read(media_root.join(relative)).await.ok()?;
    let mime = content_type_for(relative);
    let mime = if mime == "application/octet-stream" {
        "image/png"
    } else {
        mime
    };
    Some(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
}

/// Build the printable receipt document.
pub fn build_receipt_markup(
    settings: &ReceiptSettings,
    sale: &Sale,
    items: &[SaleItem],
    logo_src: Option<&str>,
    qr_src: &str,
) -> String {
    let issued_at = format_cat(sale.created_at, RECEIPT_TIME_FORMAT);
    let company_name = display_company_name(settings);
    let tagline = display_tagline(settings);
    let footer_message = display_footer(settings);
    let customer = sale.customer_name.as_deref().unwrap_or("Walk-in");
    let payment_method = sale.payment_method.label();

    let logo_markup = logo_src
        .map(|src| format!(r#"<img src="{src}" alt="{company_name} logo" class="logo" />"#))
        .unwrap_or_default();

    let items_rows: String = items
        .iter()
        .map(|item| {
            format!(
                "\
                    <tr>
                        <td>{}</td>
                        <td class=\"align-center\">{}</td>
                        <td class=\"align-right\">ZMW {:.2}</td>
                        <td class=\"align-right\">ZMW {:.2}</td>
                    </tr>
",
                item.product_name, item.quantity, item.unit_price, item.subtotal
            )
        })
        .collect();

    format!(
        r#"<!doctype html>
    <html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>Receipt {receipt_number}</title>
        <style>
{css}
        </style>
    </head>
    <body>
        <article class="receipt">
            <header class="header">
                {logo_markup}
                <h1>{company_name}</h1>
                <p class="tagline">{tagline}</p>
            </header>
            <section class="section">
                <div class="meta-row"><span>Receipt:</span><strong>{receipt_number}</strong></div>
                <div class="meta-row"><span>Date:</span><strong>{issued_at}</strong></div>
                <div class="meta-row"><span>Customer:</span><strong>{customer}</strong></div>
                <div class="meta-row"><span>Payment:</span><strong>{payment_method}</strong></div>
            </section>
            <div class="divider"></div>
            <table>
                <thead>
                    <tr>
                        <th>Item</th>
                        <th class="align-center">Qty</th>
                        <th class="align-right">Price</th>
                        <th class="align-right">Subtotal</th>
                    </tr>
                </thead>
                <tbody>
{items_rows}                </tbody>
            </table>
            <div class="divider"></div>
            <div class="totals">
                Total ZMW {total:.2}
            </div>
            <section class="footer">
                <div class="footer-message">{footer_message}</div>
                <img src="{qr_src}" alt="Receipt QR code" />
            </section>
        </article>
    </body>
    </html>"#,
        receipt_number = sale.receipt_number,
        css = RECEIPT_CSS,
        total = sale.total_amount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancestra_core::PaymentMethod;
    use chrono::{TimeZone, Utc};

    fn settings() -> ReceiptSettings {
        ReceiptSettings {
            company_name: String::new(),
            company_address: None,
            company_logo_url: None,
            company_tagline: None,
            footer_message: String::new(),
            qr_code_content: None,
            updated_at: Utc::now(),
        }
    }

    fn sale() -> Sale {
        Sale {
            id: "s1".into(),
            customer_name: None,
            receipt_number: "AB-20250101-ABCDEF".into(),
            payment_method: PaymentMethod::Cash,
            total_amount: 150.0,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap(),
            created_by: Some("u1".into()),
        }
    }

    #[test]
    fn blank_settings_fall_back_to_defaults() {
        let html = build_receipt_markup(&settings(), &sale(), &[], None, "data:qr");
        assert!(html.contains("<h1>Ancestra Business</h1>"));
        assert!(html.contains("Small Business Sales Receipt"));
        assert!(html.contains("Thank you for supporting our business!"));
        assert!(html.contains("<strong>Walk-in</strong>"));
        assert!(html.contains("Total ZMW 150.00"));
        assert!(!html.contains("class=\"logo\""));
    }

    #[test]
    fn items_render_snapshot_names() {
        let items = vec![SaleItem {
            id: "i1".into(),
            sale_id: "s1".into(),
            product_id: None,
            product_name: "Mealie Meal 25kg".into(),
            quantity: 3,
            unit_price: 50.0,
            subtotal: 150.0,
        }];
        let html = build_receipt_markup(&settings(), &sale(), &items, None, "data:qr");
        assert!(html.contains("<td>Mealie Meal 25kg</td>"));
        assert!(html.contains("ZMW 50.00"));
    }

    #[test]
    fn qr_payload_defaults_to_receipt_summary() {
        let payload = qr_payload(&settings(), &sale());
        assert!(payload.starts_with("AB-20250101-ABCDEF|150.00|2025-01-01T10:00:00"));
    }

    #[test]
    fn qr_payload_prefers_configured_content() {
        let mut s = settings();
        s.qr_code_content = Some("https://verify.test/r".into());
        assert_eq!(qr_payload(&s, &sale()), "https://verify.test/r");
    }

    #[test]
    fn qr_data_uri_is_png() {
        let uri = qr_data_uri("AB-1|10.00|2025").unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn logo_passthrough_variants() {
        let root = Path::new("/tmp/does-not-matter");
        assert_eq!(
            resolve_logo_src(root, Some("data:image/png;base64,AA==")).await,
            Some("data:image/png;base64,AA==".to_string())
        );
        assert_eq!(
            resolve_logo_src(root, Some("//cdn.test/logo.png")).await,
            Some("https://cdn.test/logo.png".to_string())
        );
        assert_eq!(
            resolve_logo_src(root, Some("https://cdn.test/logo.png")).await,
            Some("https://cdn.test/logo.png".to_string())
        );
        assert_eq!(resolve_logo_src(root, Some("   ")).await, None);
        assert_eq!(resolve_logo_src(root, None).await, None);
    }
}
