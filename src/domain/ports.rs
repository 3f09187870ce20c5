use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// A byte stream consumed one chunk at a time.
#[async_trait]
pub trait ByteSource: Send {
    /// Returns `None` once the stream is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Opens the response stream for a request URL.
#[async_trait]
pub trait StreamOpener: Send + Sync {
    type Source: ByteSource;

    async fn open(&self, url: &Url) -> Result<Self::Source>;
}

/// How rows reach the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// One handle for the whole run, buffered and flushed on close.
    #[default]
    Held,
    /// Open, append, flush and close for every row.
    PerRecord,
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn csv_directory(&self) -> &str;
    fn encoding(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn write_mode(&self) -> WriteMode;
}
