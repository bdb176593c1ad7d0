use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;

use crate::ui::Ui;

/// Fetches remote files into a stage
pub struct StageClient {
    client: Client,
}

impl StageClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("sales-insights")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// Download `url` to `dest`, reporting progress through the UI
    pub fn download(&self, url: &str, dest: &Path, ui: &mut impl Ui) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to start download of {}", url))?;

        if !response.status().is_success() {
            bail!("Download of {} failed with status {}", url, response.status());
        }

        let total_size = response.content_length().unwrap_or(0);

        let mut file = std::fs::File::create(dest).context("Failed to create staged file")?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];
        let mut reader = response;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .context("Failed to read from response")?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])
                .context("Failed to write staged file")?;

            downloaded += bytes_read as u64;
            ui.set_progress(downloaded, total_size, format_bytes(downloaded, total_size));
        }

        ui.clear_progress();
        ui.log(format!("Downloaded {}", format_bytes(downloaded, downloaded)));
        Ok(downloaded)
    }
}

/// Whether a put source should be fetched over HTTP
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// File name at the end of a URL path
pub fn url_file_name(url: &str) -> Option<&str> {
    let url = url.split(['?', '#']).next()?;
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let (_host, path) = rest.split_once('/')?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Format bytes as human-readable string
pub fn format_bytes(current: u64, total: u64) -> String {
    fn fmt(bytes: u64) -> String {
        if bytes >= 1_000_000_000 {
            format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
        } else if bytes >= 1_000_000 {
            format!("{:.1} MB", bytes as f64 / 1_000_000.0)
        } else if bytes >= 1_000 {
            format!("{:.1} KB", bytes as f64 / 1_000.0)
        } else {
            format!("{} B", bytes)
        }
    }
    format!("{} / {}", fmt(current), fmt(total))
}
