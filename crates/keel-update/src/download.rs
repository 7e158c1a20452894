//! Streaming download of gzip-compressed release artifacts
//!
//! Artifacts are always published as `<url>.gz`. The response body is
//! decompressed on the fly straight into the staging file, which is
//! truncated on every attempt and created executable.

use flate2::write::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::ACCEPT_ENCODING;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, UpdateError};

/// Suffix of the published, compressed artifact
const COMPRESSED_SUFFIX: &str = ".gz";

/// Downloads artifacts into the staging file
pub struct BinaryDownloader {
    /// HTTP client
    client: reqwest::Client,

    /// Show a byte progress bar while downloading
    show_progress: bool,
}

impl BinaryDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            show_progress: false,
        }
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download `url.gz`, decompressing into `staging`
    ///
    /// A failed download leaves whatever was written in place; the next
    /// attempt truncates it.
    pub async fn download(&self, url: &str, staging: &Path) -> Result<PathBuf> {
        let file = open_staging(staging)?;

        let gz_url = format!("{}{}", url, COMPRESSED_SUFFIX);
        debug!("Downloading {} -> {:?}", gz_url, staging);

        let response = self
            .client
            .get(&gz_url)
            .header(ACCEPT_ENCODING, "gzip")
            .send()
            .await
            .map_err(|source| UpdateError::Network {
                context: format!("downloading {}", gz_url),
                source,
            })?;

        if !response.status().is_success() {
            return Err(UpdateError::HttpStatus {
                url: gz_url,
                status: response.status(),
            });
        }

        let progress = self.progress_bar(response.content_length(), &gz_url);

        let mut decoder = GzDecoder::new(file);
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk: bytes::Bytes = chunk_result.map_err(|source| UpdateError::Network {
                context: format!("reading {}", gz_url),
                source,
            })?;
            decoder
                .write_all(&chunk)
                .map_err(|e| classify_write_error(e, staging))?;

            received += chunk.len() as u64;
            if let Some(pb) = &progress {
                pb.set_position(received);
            }
        }

        let mut file = decoder
            .finish()
            .map_err(|e| classify_write_error(e, staging))?;
        file.flush()
            .map_err(|e| UpdateError::filesystem("write", staging, e))?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        info!(
            "Downloaded {} ({} compressed)",
            gz_url,
            human_readable_size(received)
        );
        Ok(staging.to_path_buf())
    }

    fn progress_bar(&self, total: Option<u64>, url: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(url.to_string());
        Some(pb)
    }
}

/// Open the staging file for writing, truncating prior content
fn open_staging(staging: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }

    options
        .open(staging)
        .map_err(|e| UpdateError::filesystem("open", staging, e))
}

/// Corrupt or truncated gzip data surfaces as an invalid-input error from
/// the decoder; anything else comes from writing the staging file.
fn classify_write_error(err: io::Error, staging: &Path) -> UpdateError {
    match err.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            UpdateError::Decode {
                what: "gzip stream",
                message: err.to_string(),
            }
        }
        _ => UpdateError::filesystem("write", staging, err),
    }
}

/// Convert bytes to human-readable size
fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
