use crate::crawler::Page;
use crate::output::record::{encode_page, RecordFormat};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes page records to an append-only sink
///
/// Each record is flushed as soon as it is written, so a crawl that aborts
/// part-way leaves only whole records behind.
pub struct PageWriter<W> {
    sink: W,
    format: RecordFormat,
}

impl<W: AsyncWrite + Unpin> PageWriter<W> {
    /// Creates a writer over `sink`
    pub fn new(sink: W, format: RecordFormat) -> Self {
        Self {
            sink,
            format,
        }
    }

    /// Encodes and writes one page record
    pub async fn write_page(&mut self, page: &Page) -> io::Result<()> {
        let record = encode_page(page, self.format)?;
        self.sink.write_all(&record).await?;
        self.sink.flush().await?;
        Ok(())
    }
}
