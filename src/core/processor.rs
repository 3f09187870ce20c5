use crate::adapters::http::HttpStreamOpener;
use crate::core::csv_sink::CsvSink;
use crate::core::naming::csv_file_name;
use crate::core::reader::RecordReader;
use crate::core::request_url::request_url;
use crate::domain::model::FlatRecord;
use crate::domain::ports::{ByteSource, ConfigProvider, StreamOpener, WriteMode};
use crate::utils::encoding::TextEncoding;
use crate::utils::error::{LookupError, QueryProcessingError, Result};
use crate::utils::validation::validate_non_empty_string;
use chrono::Local;
use std::future::Future;
use std::path::PathBuf;
use url::Url;

/// Looks up a location and streams the answer into a new CSV file.
///
/// Each call owns its response stream and output file; both are released
/// before the call returns, whether it succeeds or not. Rows already written
/// stay in the file when a later record fails.
pub struct QueryProcessor<O: StreamOpener = HttpStreamOpener> {
    base_url: String,
    csv_directory: PathBuf,
    encoding: String,
    write_mode: WriteMode,
    opener: O,
}

impl QueryProcessor<HttpStreamOpener> {
    pub fn from_config<C: ConfigProvider>(config: &C) -> std::result::Result<Self, QueryProcessingError> {
        let opener = HttpStreamOpener::new(config.request_timeout())
            .map_err(|e| QueryProcessingError::new(format!("cannot build HTTP client: {}", e), e))?;
        Self::with_opener(config, opener)
    }
}

impl<O: StreamOpener> QueryProcessor<O> {
    pub fn with_opener<C: ConfigProvider>(
        config: &C,
        opener: O,
    ) -> std::result::Result<Self, QueryProcessingError> {
        let checks = [
            ("base_url", config.base_url()),
            ("csv_directory", config.csv_directory()),
            ("encoding", config.encoding()),
        ];
        for (field, value) in checks {
            validate_non_empty_string(field, value)
                .map_err(|e| QueryProcessingError::new(e.to_string(), e))?;
        }

        Ok(Self {
            base_url: config.base_url().to_string(),
            csv_directory: PathBuf::from(config.csv_directory()),
            encoding: config.encoding().to_string(),
            write_mode: config.write_mode(),
            opener,
        })
    }

    /// Runs the lookup and returns the path of the CSV file it wrote.
    pub async fn process(&self, location: &str) -> std::result::Result<PathBuf, QueryProcessingError> {
        let started = Local::now();
        if location.trim().is_empty() {
            return Err(QueryProcessingError::new(
                "location must not be blank",
                LookupError::InvalidLocation,
            ));
        }

        let encoding: TextEncoding = self
            .encoding
            .parse()
            .map_err(|e| failure(location, &self.base_url, e))?;
        let request = request_url(&self.base_url, location, encoding);
        let url = Url::parse(&request).map_err(|e| failure(location, &request, e.into()))?;
        tracing::debug!("Request url built: {}", url);

        let source = self
            .opener
            .open(&url)
            .await
            .map_err(|e| failure(location, &request, e))?;
        let mut reader = RecordReader::new(source, encoding);
        reader
            .begin_array()
            .await
            .map_err(|e| failure(location, &request, e))?;
        tracing::debug!("Response stream opened");

        std::fs::create_dir_all(&self.csv_directory)
            .map_err(|e| failure(location, &request, e.into()))?;

        let path = self.csv_directory.join(csv_file_name(&started));
        let mut sink = CsvSink::create(path, encoding, self.write_mode)
            .map_err(|e| failure(location, &request, e))?;
        tracing::debug!("Output file created: {}", sink.path().display());

        let streamed = stream_rows(&mut reader, &mut sink).await;

        // Release in reverse acquisition order: output file first, then the response.
        let rows = sink.rows();
        let closed = sink.finish();
        drop(reader);
        tracing::debug!("Resources released after {} rows", rows);

        match (streamed, closed) {
            (Ok(()), Ok(path)) => {
                tracing::info!("Wrote {} rows for \"{}\" to {}", rows, location, path.display());
                Ok(path)
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    tracing::warn!("Closing output file also failed: {}", close_error);
                }
                tracing::error!("Stopped after {} rows: {}", rows, e);
                Err(failure(location, &request, e))
            }
            (Ok(()), Err(e)) => Err(failure(location, &request, e)),
        }
    }

    /// Like [`process`](Self::process), but gives up as soon as `cancel` completes.
    /// `cancel` is polled first, so an already-completed signal always wins.
    ///
    /// Dropping the in-flight lookup closes the response stream and output file.
    pub async fn process_until<F>(
        &self,
        location: &str,
        cancel: F,
    ) -> std::result::Result<PathBuf, QueryProcessingError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::warn!("Lookup for \"{}\" cancelled", location);
                Err(QueryProcessingError::new(
                    format!("processing of location \"{}\" was cancelled", location),
                    LookupError::Cancelled,
                ))
            }
            result = self.process(location) => result,
        }
    }
}

async fn stream_rows<S: ByteSource>(reader: &mut RecordReader<S>, sink: &mut CsvSink) -> Result<()> {
    while let Some(record) = reader.next_record().await? {
        let row = FlatRecord::try_from(&record)?;
        sink.write_record(&row)?;
    }
    Ok(())
}

fn failure(location: &str, url: &str, cause: LookupError) -> QueryProcessingError {
    QueryProcessingError::new(
        format!(
            "failed to process location \"{}\" using \"{}\": {}",
            location, url, cause
        ),
        cause,
    )
}
