//! Craedl API client
//!
//! Talks to the Craedl REST API with a bearer access token. Tokens are
//! generated on the Craedl website and persisted locally via
//! [`token_storage`]; every request carries `Authorization: Bearer <token>`.
//!
//! The usual entry point is [`crate::auth`], which loads the stored token,
//! checks its validity window, and returns the authenticated [`Profile`].

pub mod client;
pub mod resources;
pub mod token_storage;
pub mod types;

pub use client::{CraedlClient, DEFAULT_BASE_URL};
pub use resources::{
    Directory, Entry, File, Profile, Project, Publication, ResearchGroup,
};
pub use token_storage::{clear_token, load_token, save_token, AccessToken};
pub use types::{ApiError, AuthError, CraedlError};
