use crate::craedl_api::types::{ApiError, AuthError, CraedlError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Default base URL for the Craedl API
pub const DEFAULT_BASE_URL: &str = "https://api.craedl.org";

/// Data uploads are split into sequential PUTs of this many bytes.
const UPLOAD_CHUNK_SIZE: u64 = 104_857_600;

/// HTTP client for the Craedl API
///
/// Holds the base URL and the bearer token, and centralizes request
/// formatting and response processing for every resource handle. Cloning
/// is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct CraedlClient {
    /// Base URL for the Craedl API
    base_url: String,
    /// Opaque bearer token attached to every request
    token: String,
    /// HTTP client for making requests
    client: reqwest::Client,
}

impl CraedlClient {
    /// Create a new Craedl API client
    ///
    /// # Arguments
    ///
    /// * `base_url` - The Craedl API base URL (see [`DEFAULT_BASE_URL`])
    /// * `token` - The access token to send as `Authorization: Bearer`
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        tracing::debug!("Creating CraedlClient with base URL: {}", base_url);

        Self {
            base_url,
            token: token.into().trim().to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Get the base URL for this client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Perform a JSON GET request against an API method path
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CraedlError> {
        let url = self.endpoint(path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET {}: {}", url, e);
                ApiError::from(e)
            })?;

        self.process(path, response).await
    }

    /// Perform a JSON POST request against an API method path
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CraedlError> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST {}: {}", url, e);
                ApiError::from(e)
            })?;

        self.process(path, response).await
    }

    /// Upload the contents of a local file to a data endpoint
    ///
    /// The file is sent as sequential PUTs of at most 100 MiB each, with a
    /// `Content-Disposition` header as the API expects. Returns the parsed
    /// body of the final chunk's response, or `Ok(None)` for an empty file
    /// (nothing is sent in that case).
    pub async fn put_data(
        &self,
        path: &str,
        local_path: &Path,
    ) -> Result<Option<serde_json::Value>, CraedlError> {
        let url = self.endpoint(path);

        let size = tokio::fs::metadata(local_path).await?.len();
        if size == 0 {
            tracing::debug!("Skipping upload of empty file {:?}", local_path);
            return Ok(None);
        }

        tracing::debug!("PUT {} ({} bytes from {:?})", url, size, local_path);

        let mut file = tokio::fs::File::open(local_path).await?;
        let mut remaining = size;
        let mut last = None;

        while remaining > 0 {
            let take = remaining.min(UPLOAD_CHUNK_SIZE) as usize;
            let mut chunk = vec![0u8; take];
            file.read_exact(&mut chunk).await?;
            remaining -= take as u64;

            let response = self
                .client
                .put(&url)
                .header("Authorization", self.bearer())
                .header(
                    "Content-Disposition",
                    "attachment; filename=\"craedl-upload\"",
                )
                .body(chunk)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("Failed to send PUT {}: {}", url, e);
                    ApiError::from(e)
                })?;

            if remaining > 0 {
                // Intermediate chunk: check the status, discard the body.
                self.check(path, response).await?;
            } else {
                last = Some(self.process(path, response).await?);
            }
        }

        Ok(last)
    }

    /// Perform a streaming GET against a data endpoint
    ///
    /// Returns the raw response after status checking so the caller can
    /// consume the body as a byte stream.
    pub async fn get_data(&self, path: &str) -> Result<reqwest::Response, CraedlError> {
        let url = self.endpoint(path);
        tracing::debug!("GET {} (streaming)", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET {}: {}", url, e);
                ApiError::from(e)
            })?;

        self.check(path, response).await
    }

    /// Map a non-success status to the matching error
    ///
    /// 400 means the server could not parse the request, 401 means the
    /// token was rejected (revoked or regenerated), 403 means the token
    /// lacks access to the resource, and 404 maps to a not-found error for
    /// the requested path. Everything else keeps its status code and body.
    async fn check(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CraedlError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Request to {} failed: HTTP {} - {}", path, status, body);

        match status.as_u16() {
            400 => Err(ApiError::BadRequest(body).into()),
            401 => Err(AuthError::InvalidToken.into()),
            403 => Err(CraedlError::PermissionDenied(path.to_string())),
            404 => Err(CraedlError::NotFound(path.to_string())),
            s => Err(ApiError::Http {
                status: s,
                message: body,
            }
            .into()),
        }
    }

    /// Check the status and parse the JSON body of a response
    async fn process<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, CraedlError> {
        let response = self.check(path, response).await?;

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read response body from {}: {}", path, e);
            ApiError::from(e)
        })?;

        // Some write endpoints answer with an empty body.
        let result = if bytes.is_empty() {
            serde_json::from_str("null")
        } else {
            serde_json::from_slice(&bytes)
        };

        result.map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", path, e);
            ApiError::Parse(format!("Failed to parse response JSON: {}", e)).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = CraedlClient::new("https://api.example.org", "tok");
        assert_eq!(client.base_url(), "https://api.example.org");
    }

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        let client = CraedlClient::new("https://api.example.org/", "tok");
        assert_eq!(
            client.endpoint("profile/whoami/"),
            "https://api.example.org/profile/whoami/"
        );
        assert_eq!(
            client.endpoint("/directory/7/"),
            "https://api.example.org/directory/7/"
        );
    }

    #[test]
    fn token_is_trimmed() {
        let client = CraedlClient::new("https://api.example.org", "  tok\n");
        assert_eq!(client.bearer(), "Bearer tok");
    }
}
