//! Read-only client for the Pleasant Password Server v5 REST API.
//!
//! Authenticates with the OAuth2 password grant, fetches the folder and
//! entry hierarchy in a single round-trip, and resolves slash-delimited
//! paths to folders, entries, attachments, or custom-field values.
//! Passwords and attachment contents are never stored in the tree; they
//! are fetched from the server at the moment of access.
//!
//! # Architecture
//!
//! - **`api`**: blocking HTTP client, token handling, raw wire types
//! - **`tree`**: typed credential tree (`Database`/`Folder`/`Entry`/`Attachment`)
//! - **`resolve`**: path resolution over the tree
//! - **`error`**: the crate-wide [`Error`] enum
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pleasant_client::{ApiClient, ApiConfig, Database, Resolved};
//!
//! let api = ApiClient::new(ApiConfig {
//!     server_url: "https://pleasant.example.com:10001".to_string(),
//!     username: "alice".to_string(),
//!     password: zeroize::Zeroizing::new("master password".to_string()),
//!     danger_accept_invalid_certs: false,
//! })?;
//!
//! let database = Database::fetch(Arc::new(api))?;
//! let entry = database.lookup_entry("/Development/git")?;
//! println!("{}", entry.password()?.as_str());
//! ```

pub mod api;
pub mod error;
pub mod resolve;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use api::{ApiClient, ApiConfig, RawAttachment, RawEntry, RawFolder, StoreClient};
pub use error::Error;
pub use resolve::{Resolved, lookup};
pub use tree::{Attachment, Database, Entry, Folder, Node};
