//! Rust client for the Craedl research data platform
//!
//! Craedl (<https://craedl.org>) hosts research data organized into
//! projects, directories, and versioned files. This crate wraps the
//! Craedl REST API: authenticate with a stored access token, then walk
//! the object graph from your [`Profile`].
//!
//! # Getting started
//!
//! Generate an access token on the Craedl website and store it with the
//! bundled CLI:
//!
//! ```text
//! craedl token
//! ```
//!
//! Then authenticate and use the API:
//!
//! ```no_run
//! use craedl::auth;
//!
//! # async fn run() -> Result<(), craedl::CraedlError> {
//! let profile = auth().await?;
//! for project in profile.get_projects().await? {
//!     println!("{}", project.name());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Tokens are valid for 28 days and are invalidated when revoked or
//! regenerated on the website. The token is stored in the OS keyring
//! when one is available, otherwise in an age-encrypted file under the
//! configuration directory.
//!
//! # Environment variables
//!
//! - `CRAEDL_BASE_URL` - override the API base URL
//! - `CRAEDL_CONFIG_DIR` - override the configuration directory
//! - `CRAEDL_DISABLE_KEYRING` - force encrypted filesystem token storage
//! - `CRAEDL_ENCRYPTION_KEY` - base64-encoded age identity for file storage

pub mod craedl_api;
pub mod storage;

pub use craedl_api::client::{CraedlClient, DEFAULT_BASE_URL};
pub use craedl_api::resources::{
    ChildEntry, Directory, DirectoryData, Entry, EntryKind, File, FileData, Profile, ProfileData,
    Project, ProjectData, Publication, PublicationData, ResearchGroup, ResearchGroupData,
};
pub use craedl_api::token_storage::{
    clear_token, load_token, save_token, AccessToken, TOKEN_VALIDITY_DAYS,
};
pub use craedl_api::types::{ApiError, AuthError, CraedlError};
pub use storage::{
    config_dir, EncryptedFilesystemStorage, KeyringStorage, StorageBackend, StorageError,
};

/// Authenticate against the Craedl API using the stored access token
///
/// Loads the token saved by `craedl token`, verifies it is still within
/// its 28-day validity window, and fetches the caller's [`Profile`]. The
/// base URL comes from `CRAEDL_BASE_URL` when set.
///
/// Fails with [`AuthError::MissingToken`] when no token has been stored
/// and [`AuthError::ExpiredToken`] when the stored one has aged out; both
/// are fixed by re-running `craedl token`.
pub async fn auth() -> Result<Profile, CraedlError> {
    let base_url =
        std::env::var("CRAEDL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    auth_with_base_url(&base_url).await
}

/// Authenticate against a specific Craedl API endpoint
///
/// Same as [`auth`] but with an explicit base URL, useful for self-hosted
/// Craedl instances and tests.
pub async fn auth_with_base_url(base_url: &str) -> Result<Profile, CraedlError> {
    let access_token = load_token()
        .await?
        .ok_or(CraedlError::Auth(AuthError::MissingToken))?;

    if access_token.is_expired() {
        tracing::debug!("Stored access token has exceeded its validity window");
        return Err(CraedlError::Auth(AuthError::ExpiredToken));
    }

    let client = CraedlClient::new(base_url, &access_token.token);
    Profile::whoami(&client).await
}
