//! Asset listing and download over HTTP.
//!
//! The board only needs two capabilities from the REST layer: list the
//! images the local user uploaded, and list the images another account
//! shares with the session. [`AssetApi`] names those plus the raw image
//! download; [`HttpAssetApi`] is the `reqwest` implementation. Listing
//! bodies use the `{status, msg, objs}` envelope; parsing is a pure function
//! so it can be tested without a server.

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;

use std::time::Duration;

use canvas::assets::{AssetScope, Image};
use futures_util::future::join_all;
use serde::Deserialize;

use crate::error::AssetError;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// One entry of an asset listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub url: String,
}

/// Asset capabilities consumed by the session. Enables fakes in tests.
#[async_trait::async_trait]
pub trait AssetApi: Send + Sync {
    /// Images uploaded by the holder of `token`.
    async fn fetch_owned_assets(&self, token: &str) -> Result<Vec<AssetInfo>, AssetError>;

    /// Images uploaded by `owner_id` and visible to the holder of `token`.
    async fn fetch_assets_of(&self, token: &str, owner_id: i64) -> Result<Vec<AssetInfo>, AssetError>;

    /// Raw bytes behind a listing `url`.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAssetApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAssetApi {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AssetError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AssetError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    async fn list(&self, path: &str, token: &str) -> Result<Vec<AssetInfo>, AssetError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| AssetError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| AssetError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(AssetError::Status { status, msg: text });
        }
        parse_listing(&text)
    }
}

#[async_trait::async_trait]
impl AssetApi for HttpAssetApi {
    async fn fetch_owned_assets(&self, token: &str) -> Result<Vec<AssetInfo>, AssetError> {
        self.list("/api/objs/owned", token).await
    }

    async fn fetch_assets_of(&self, token: &str, owner_id: i64) -> Result<Vec<AssetInfo>, AssetError> {
        self.list(&format!("/api/objs/of/{owner_id}"), token).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.http.get(url).send().await.map_err(|e| AssetError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(AssetError::Status { status, msg: format!("GET {url}") });
        }
        let bytes = response.bytes().await.map_err(|e| AssetError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    objs: Vec<AssetInfo>,
}

/// Parse a listing body.
///
/// # Errors
///
/// Returns [`AssetError::Parse`] for malformed bodies and
/// [`AssetError::Status`] when the envelope reports `status: false`.
pub fn parse_listing(text: &str) -> Result<Vec<AssetInfo>, AssetError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| AssetError::Parse(e.to_string()))?;
    if !envelope.status {
        return Err(AssetError::Status {
            status: 200,
            msg: envelope.msg.unwrap_or_else(|| "request refused".to_owned()),
        });
    }
    Ok(envelope.objs)
}

// =============================================================================
// LOADING
// =============================================================================

/// Fetch the listing for `scope` and download every image in it.
///
/// A download that fails keeps its entry with no bytes, so the board draws
/// the asset at its placed size without pixels instead of asking again.
///
/// # Errors
///
/// Returns an error only if the listing itself fails.
pub async fn load_images(api: &dyn AssetApi, token: &str, scope: AssetScope) -> Result<Vec<Image>, AssetError> {
    let listing = match scope {
        AssetScope::Owned => api.fetch_owned_assets(token).await?,
        AssetScope::SharedBy(owner_id) => api.fetch_assets_of(token, owner_id).await?,
    };
    tracing::debug!(?scope, count = listing.len(), "asset listing");

    let downloads = listing.iter().map(|info| api.fetch_image(&info.url));
    let images = join_all(downloads)
        .await
        .into_iter()
        .zip(listing)
        .map(|(bytes, info)| {
            let bytes = bytes.unwrap_or_else(|e| {
                tracing::warn!(id = info.id, url = %info.url, error = %e, "image download failed");
                Vec::new()
            });
            Image::new(info.id, info.name, info.url, bytes)
        })
        .collect();
    Ok(images)
}
