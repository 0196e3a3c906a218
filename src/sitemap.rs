//! Sitemap XML parsing.
//!
//! Reads the `<loc>` text of every `<url>` element in a standard
//! `<urlset>` document. Element names are matched by local name, so a
//! namespaced `<sm:url>` counts too. Sitemap index files (`<sitemap><loc>`)
//! yield nothing.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::SitemapError;

/// Extract page URLs from a sitemap document, in document order.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => {
                    in_loc = true;
                    loc.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => {
                let text = t.unescape().map_err(|e| SitemapError {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                loc.push_str(&text);
            }
            Ok(Event::CData(t)) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" if in_loc => {
                    in_loc = false;
                    let trimmed = loc.trim();
                    if !trimmed.is_empty() {
                        urls.push(trimmed.to_string());
                    }
                }
                b"url" => in_url = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SitemapError {
                    position: reader.error_position() as u64,
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }

    Ok(urls)
}
