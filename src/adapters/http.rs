use crate::domain::ports::{ByteSource, StreamOpener};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Opens location-service responses over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStreamOpener {
    client: Client,
}

impl HttpStreamOpener {
    /// `None` means requests wait for the server indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl StreamOpener for HttpStreamOpener {
    type Source = HttpBody;

    async fn open(&self, url: &Url) -> Result<HttpBody> {
        tracing::debug!("Making API request to: {}", url);
        let response = self.client.get(url.clone()).send().await?;

        tracing::debug!("API response status: {}", response.status());
        let response = response.error_for_status()?;

        Ok(HttpBody { response })
    }
}

/// A response body read chunk by chunk as it arrives.
#[derive(Debug)]
pub struct HttpBody {
    response: Response,
}

#[async_trait]
impl ByteSource for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.response.chunk().await?.map(|bytes| bytes.to_vec()))
    }
}
