use crate::domain::ports::Fetcher;
use crate::utils::error::{MappingError, Result};
use crate::utils::validation::is_remote;
use flate2::read::MultiGzDecoder;
use reqwest::Client;
use std::io::{BufRead, BufReader, Cursor, Read};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fetches http(s) sources with reqwest and everything else from disk.
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        if !is_remote(source) {
            tracing::debug!("Reading local source: {}", source);
            return Ok(tokio::fs::read(source).await?);
        }

        tracing::debug!("Making HTTP request to: {}", source);
        let response = self.client.get(source).send().await?;
        tracing::debug!("Source response status: {}", response.status());

        if !response.status().is_success() {
            return Err(MappingError::SourceStatusError {
                url: source.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes", body.len());
        Ok(body.to_vec())
    }
}

/// Wraps `data` in a line reader, gunzipping it when it carries the gzip magic.
///
/// Concatenated gzip members (pigz, bgzip, `cat a.gz b.gz`) are decoded as one stream.
pub fn decompressed_reader(data: Vec<u8>) -> Box<dyn BufRead + Send> {
    let inner: Box<dyn Read + Send> = if data.starts_with(&GZIP_MAGIC) {
        Box::new(MultiGzDecoder::new(Cursor::new(data)))
    } else {
        Box::new(Cursor::new(data))
    };
    Box::new(BufReader::new(inner))
}
