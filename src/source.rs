//! Where a flight dataset comes from, and how to read its bytes.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use flate2::read::GzDecoder;
use tracing::debug;

use crate::fetch::{BasicClient, fetch_bytes};

/// A dataset location: a local file or an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

/// Stable identity of a [`Source`], used as the load-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        SourceKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Source {
    /// Interprets `http://` and `https://` strings as URLs, anything else as a path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::File(PathBuf::from(raw))
        }
    }

    /// Cache identity: canonical path for files, the URL itself otherwise.
    pub fn key(&self) -> SourceKey {
        match self {
            Source::File(path) => {
                let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
                SourceKey(resolved.display().to_string())
            }
            Source::Url(url) => SourceKey(url.clone()),
        }
    }

    /// Whether the source is gzip-compressed, judged by a `.gz` suffix.
    pub fn is_gzip(&self) -> bool {
        match self {
            Source::File(path) => path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gz")),
            Source::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url.as_str());
                path.to_ascii_lowercase().ends_with(".gz")
            }
        }
    }

    /// Reads the raw bytes, fetching over HTTP for URLs.
    pub async fn read_bytes(&self) -> Result<Bytes> {
        let bytes = match self {
            Source::File(path) => Bytes::from(
                tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
            ),
            Source::Url(url) => {
                let client = BasicClient::new();
                fetch_bytes(&client, url).await?
            }
        };
        debug!(source = %self, bytes = bytes.len(), "Dataset bytes read");
        Ok(bytes)
    }

    /// Reads the source and undoes gzip compression when present.
    pub async fn read_decoded(&self) -> Result<Bytes> {
        let bytes = self.read_bytes().await?;
        if self.is_gzip() {
            gunzip(&bytes).with_context(|| format!("failed to decompress {self}"))
        } else {
            Ok(bytes)
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::File(path.to_path_buf())
    }
}

fn gunzip(bytes: &[u8]) -> Result<Bytes> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(Bytes::from(out))
}
