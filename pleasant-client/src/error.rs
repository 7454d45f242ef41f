//! Error types for the Pleasant client.

/// All failure modes surfaced by this crate.
///
/// The two path-resolution errors carry the complete path exactly as the
/// caller supplied it, so the message pinpoints which segment broke a
/// multi-level lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path segment (folder or entry child, or entry sub-field) does not exist.
    #[error("could not find {element} in {path}")]
    ElementNotFound { path: String, element: String },

    /// A sub-field name exists both as a custom field and as an attachment
    /// of the same entry, so the lookup cannot pick one.
    #[error("{field} from {path} exists in custom fields and attachments")]
    EntryNotDistinct { path: String, field: String },

    /// The resolved element was expected to be an entry but is not.
    #[error("{0} is not an entry")]
    NotAnEntry(String),

    /// The token endpoint rejected the supplied identity.
    #[error("invalid username or password")]
    BadCredentials,

    /// Non-success HTTP status or a malformed response body.
    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
