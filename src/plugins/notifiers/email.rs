use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::models::Listing;
use crate::plugins::traits::Notifier;
use crate::utils::error::NotifierError;

/// Sends each digest batch as one multipart email over SMTP.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifierError> {
        let (username, password) = match (&config.username, &config.password) {
            (Some(u), Some(p)) => (u.clone(), p.clone()),
            _ => {
                return Err(NotifierError::Config(
                    "SMTP username and password are required (EMAIL_USER, EMAIL_PASSWORD)".into(),
                ));
            }
        };

        let from_address = config
            .from_address
            .as_deref()
            .ok_or_else(|| NotifierError::Config("Missing sender address".into()))?;
        let to_address = config
            .to_address
            .as_deref()
            .ok_or_else(|| NotifierError::Config("Missing recipient address (RECIPIENT_EMAIL)".into()))?;

        let from = Mailbox::new(Some(config.from_name.clone()), from_address.parse()?);
        let to = Mailbox::new(None, to_address.parse()?);

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self { transport, from, to })
    }

    fn build_message(
        &self,
        batch: &[Listing],
        batch_index: usize,
        total_batches: usize,
    ) -> Result<Message, NotifierError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format_subject(batch.len(), batch_index, total_batches))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(format_text_body(batch)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(format_html_body(batch)),
                    ),
            )?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(
        &self,
        batch: &[Listing],
        batch_index: usize,
        total_batches: usize,
    ) -> Result<(), NotifierError> {
        let message = self.build_message(batch, batch_index, total_batches)?;
        self.transport.send(message).await?;

        tracing::info!(
            listings = batch.len(),
            batch = batch_index,
            total = total_batches,
            "Digest email sent"
        );
        Ok(())
    }
}

fn format_subject(count: usize, batch_index: usize, total_batches: usize) -> String {
    let noun = if count == 1 { "item" } else { "items" };
    if total_batches > 1 {
        format!(
            "New Vintage Clothing Listings - {} {} ({}/{})",
            count, noun, batch_index, total_batches
        )
    } else {
        format!("New Vintage Clothing Listings - {} {}", count, noun)
    }
}

/// Listings grouped by search term, groups in order of first appearance.
fn group_by_search_term(batch: &[Listing]) -> Vec<(&str, Vec<&Listing>)> {
    let mut groups: Vec<(&str, Vec<&Listing>)> = Vec::new();
    for listing in batch {
        match groups.iter_mut().find(|(term, _)| *term == listing.search_term()) {
            Some((_, items)) => items.push(listing),
            None => groups.push((listing.search_term(), vec![listing])),
        }
    }
    groups
}

fn format_html_body(batch: &[Listing]) -> String {
    let groups = group_by_search_term(batch);
    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 15px; line-height: 1.4; }}
        .header {{ background: #3498db; color: white; padding: 15px; border-radius: 8px; margin-bottom: 20px; }}
        .search-group {{ margin: 15px 0; border: 1px solid #ddd; border-radius: 6px; }}
        .search-header {{ background: #f8f9fa; padding: 8px 12px; font-weight: bold; border-bottom: 1px solid #ddd; }}
        .listing {{ padding: 10px; border-bottom: 1px solid #eee; }}
        .listing img {{ width: 80px; height: 80px; object-fit: cover; margin-right: 12px; border-radius: 4px; }}
        .platform {{ background: #2ecc71; color: white; padding: 2px 6px; border-radius: 3px; font-size: 11px; }}
        .title {{ font-size: 14px; font-weight: bold; }}
        .price {{ font-size: 16px; font-weight: bold; color: #e74c3c; }}
        .no-image {{ width: 80px; height: 80px; background: #ecf0f1; color: #7f8c8d; font-size: 10px; }}
    </style>
</head>
<body>
    <div class="header">
        <h2 style="margin: 0;">New Vintage Clothing Listings</h2>
        <p style="margin: 5px 0 0 0;">Found <strong>{}</strong> new listings across <strong>{}</strong> search terms</p>
    </div>
"#,
        batch.len(),
        groups.len()
    ));

    for (term, listings) in &groups {
        html.push_str(&format!(
            r#"    <div class="search-group">
        <div class="search-header">{} ({} listings)</div>
"#,
            escape_html(term),
            listings.len()
        ));

        for listing in listings {
            let image = match listing.image_url() {
                Some(src) => format!(r#"<img src="{}" alt="Listing Image">"#, escape_html(src)),
                None => r#"<div class="no-image">No Image</div>"#.to_string(),
            };

            html.push_str(&format!(
                r#"        <div class="listing">
            {}
            <span class="platform">{}</span>
            <div class="title">{}</div>
            <div class="price">{}</div>
            <a href="{}" target="_blank">View Listing</a>
        </div>
"#,
                image,
                listing.platform().display_name(),
                escape_html(listing.title()),
                escape_html(listing.price()),
                escape_html(listing.url())
            ));
        }

        html.push_str("    </div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn format_text_body(batch: &[Listing]) -> String {
    let mut text = String::new();

    text.push_str("NEW VINTAGE CLOTHING LISTINGS\n\n");
    text.push_str(&format!("Found {} new listings\n", batch.len()));

    for (term, listings) in group_by_search_term(batch) {
        text.push_str(&format!("\n== {} ({}) ==\n", term, listings.len()));
        for listing in listings {
            text.push_str(&format!(
                "[{}] {}\n  {}\n  {}\n",
                listing.platform().display_name(),
                listing.title(),
                listing.price(),
                listing.url()
            ));
        }
    }

    text
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
