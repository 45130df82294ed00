mod client;
mod basic;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse()?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads a data source from a local path or an `http(s)://` URL.
///
/// Sources whose name ends in `.gz` are gunzipped after loading.
#[tracing::instrument(skip(client))]
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("failed to fetch {source}"))?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");

    if source.ends_with(".gz") {
        return gunzip(&bytes).with_context(|| format!("failed to decompress {source}"));
    }
    Ok(bytes)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}
