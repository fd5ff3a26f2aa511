//! Page record encoding
//!
//! Two formats are supported:
//!
//! **Text**: a header block per page, one tab-indented link per line:
//!
//! ```text
//! URL:
//! 	http://localhost:7777/
//! Links: 
//! 	http://www.test.com/
//! 	http://localhost:7777/one
//! ```
//!
//! **Json**: one `{"url": ..., "links": [...]}` object per line.

use crate::crawler::Page;
use serde::Deserialize;
use std::io;
use url::Url;

const URL_HEADER: &str = "URL:";
const LINKS_HEADER: &str = "Links: ";

/// Page record format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Header lines with tab-indented URLs
    #[default]
    Text,
    /// JSON lines
    Json,
}

/// Encodes a page as a single record
///
/// # Errors
///
/// Only the JSON encoder can fail; its error is surfaced as an I/O error so
/// the caller can treat it like any other write failure.
pub fn encode_page(page: &Page, format: RecordFormat) -> io::Result<Vec<u8>> {
    match format {
        RecordFormat::Text => Ok(encode_text(page)),
        RecordFormat::Json => {
            let mut out = serde_json::to_vec(page)?;
            out.push(b'\n');
            Ok(out)
        }
    }
}

fn encode_text(page: &Page) -> Vec<u8> {
    let mut out = format!("{}\n\t{}\n{}\n", URL_HEADER, page.url, LINKS_HEADER);
    for link in &page.links {
        out.push('\t');
        out.push_str(link.as_str());
        out.push('\n');
    }
    out.into_bytes()
}

/// Decodes every record in `input`
///
/// This is the inverse of [`encode_page`]: a stream of records written in
/// one format yields exactly one page per record.
pub fn decode_records(input: &str, format: RecordFormat) -> io::Result<Vec<Page>> {
    match format {
        RecordFormat::Text => decode_text(input),
        RecordFormat::Json => input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(io::Error::from))
            .collect(),
    }
}

fn decode_text(input: &str) -> io::Result<Vec<Page>> {
    let mut pages = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if line != URL_HEADER {
            return Err(invalid_record(format!("expected '{}', got '{}'", URL_HEADER, line)));
        }

        let url = match lines.next().and_then(|l| l.strip_prefix('\t')) {
            Some(url) => parse_record_url(url)?,
            None => return Err(invalid_record("missing page URL".to_string())),
        };

        match lines.next() {
            Some(LINKS_HEADER) => {}
            other => {
                return Err(invalid_record(format!(
                    "expected '{}', got {:?}",
                    LINKS_HEADER, other
                )))
            }
        }

        let mut links = Vec::new();
        while let Some(link) = lines.peek().and_then(|l| l.strip_prefix('\t')) {
            links.push(parse_record_url(link)?);
            lines.next();
        }

        pages.push(Page { url, links });
    }

    Ok(pages)
}

fn parse_record_url(s: &str) -> io::Result<Url> {
    Url::parse(s).map_err(|e| invalid_record(format!("bad URL '{}': {}", s, e)))
}

fn invalid_record(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
