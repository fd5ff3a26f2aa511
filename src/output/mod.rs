//! Output module for page records and crawl summaries
//!
//! This module handles:
//! - Encoding each crawled page as one self-delimiting record
//! - Writing records to the caller's sink as pages complete
//! - Recording crawl statistics

mod record;
pub mod stats;
mod writer;

pub use record::{decode_records, encode_page, RecordFormat};
pub use stats::{log_summary, CrawlSummary};
pub use writer::PageWriter;
