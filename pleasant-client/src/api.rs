//! Pleasant Password Server HTTP API client.
//!
//! Implements the OAuth2 password-grant token flow and the v5 REST
//! endpoints for the folder hierarchy, single entries, entry passwords,
//! and attachment contents.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::Error;

/// Fixed client identifier the v5 API expects on every REST request.
/// https://pleasantsolutions.com/info/pleasant-password-server/x-common-issues#v5APIError500
const CLIENT_IDENTIFIER: &str = "7f1b1ccc-747a-4459-bf93-f2a10c24e7a8";

/// The remote credential store, as seen by the tree and resolver layers.
///
/// [`ApiClient`] is the production implementation; tests substitute a
/// counting mock to observe fetch behaviour without a server.
pub trait StoreClient {
    /// One round-trip returning the entire folder/entry hierarchy
    /// (without passwords or attachment contents).
    fn fetch_hierarchy(&self) -> Result<RawFolder, Error>;

    /// Fetch a single entry by its identifier, bypassing the hierarchy.
    fn fetch_entry(&self, entry_id: &str) -> Result<RawEntry, Error>;

    /// Fetch the password of an entry. One round-trip per call, no caching.
    fn fetch_password(&self, entry_id: &str) -> Result<Zeroizing<String>, Error>;

    /// Fetch the binary content of an attachment. One round-trip per call,
    /// no caching.
    fn fetch_attachment(&self, entry_id: &str, attachment_id: &str) -> Result<Vec<u8>, Error>;
}

/// Connection parameters for [`ApiClient::new`].
pub struct ApiConfig {
    /// Base server URL, e.g. `https://pleasant.example.com:10001`.
    pub server_url: String,
    pub username: String,
    pub password: Zeroizing<String>,
    /// Accept self-signed certificates. Only for deployments whose CA
    /// cannot be installed locally.
    pub danger_accept_invalid_certs: bool,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field(
                "danger_accept_invalid_certs",
                &self.danger_accept_invalid_certs,
            )
            .finish()
    }
}

/// Blocking Pleasant API client.
///
/// Holds the user's credentials so an expired access token can be
/// re-requested transparently mid-session. Every secret-bearing field is
/// scrubbed from memory on drop.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: Zeroizing<String>,
    token: Mutex<Option<CachedToken>>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, Error> {
        if config.danger_accept_invalid_certs {
            warn!("HTTPS certificate verification is disabled");
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("pleasant/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            token: Mutex::new(None),
        })
    }

    /// Return a valid access token, requesting a fresh one from the
    /// token endpoint if none is cached or the cached one has expired.
    fn access_token(&self) -> Result<Zeroizing<String>, Error> {
        let mut cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
        match cached.as_ref() {
            Some(t) if !t.expired() => Ok(t.access_token.clone()),
            _ => {
                let fresh = self.obtain_token()?;
                let token = fresh.access_token.clone();
                *cached = Some(fresh);
                Ok(token)
            }
        }
    }

    /// OAuth2 `grant_type=password` request against `/oauth2/token`.
    fn obtain_token(&self) -> Result<CachedToken, Error> {
        let url = format!("{}/oauth2/token", self.base_url);

        debug!(user = %self.username, "requesting access token");

        let resp = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            if status == reqwest::StatusCode::BAD_REQUEST
                && serde_json::from_str::<OAuthErrorResponse>(&body)
                    .is_ok_and(|e| e.error.as_deref() == Some("invalid_grant"))
            {
                return Err(Error::BadCredentials);
            }
            return Err(Error::Api(format!("token request failed ({status}): {body}")));
        }

        let token: TokenResponse = resp.json()?;
        debug!(expires_in = token.expires_in, "access token obtained");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    /// Authenticated GET returning the raw response on 2xx.
    fn request(&self, url: &str) -> Result<reqwest::blocking::Response, Error> {
        let token = self.access_token()?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.as_str())
            .header("Content-Type", "application/json")
            .header("Cache-Control", "no-cache")
            .header("X-Pleasant-Client-Identifier", CLIENT_IDENTIFIER)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Api(format!("request failed ({status}): {body}")));
        }
        Ok(resp)
    }
}

impl StoreClient for ApiClient {
    fn fetch_hierarchy(&self) -> Result<RawFolder, Error> {
        let url = format!("{}/api/v5/rest/folders", self.base_url);
        debug!("fetching folder hierarchy");
        Ok(self.request(&url)?.json()?)
    }

    fn fetch_entry(&self, entry_id: &str) -> Result<RawEntry, Error> {
        let url = format!("{}/api/v5/rest/entries/{entry_id}", self.base_url);
        debug!(entry_id, "fetching entry");
        Ok(self.request(&url)?.json()?)
    }

    fn fetch_password(&self, entry_id: &str) -> Result<Zeroizing<String>, Error> {
        let url = format!("{}/api/v5/rest/entries/{entry_id}/password", self.base_url);
        debug!(entry_id, "fetching password");
        let body = self.request(&url)?.text()?;
        decode_password_body(&body)
    }

    fn fetch_attachment(&self, entry_id: &str, attachment_id: &str) -> Result<Vec<u8>, Error> {
        let url = format!(
            "{}/api/v5/rest/entries/{entry_id}/attachments/{attachment_id}",
            self.base_url
        );
        debug!(entry_id, attachment_id, "fetching attachment");
        let resp: AttachmentContentResponse = self.request(&url)?.json()?;
        decode_file_data(&resp.file_data)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The password endpoint returns the secret as a JSON-encoded string.
/// Proper JSON decoding (rather than stripping the surrounding quotes)
/// keeps escaped characters inside the password intact.
fn decode_password_body(body: &str) -> Result<Zeroizing<String>, Error> {
    serde_json::from_str::<String>(body)
        .map(Zeroizing::new)
        .map_err(|e| Error::Api(format!("password response parse: {e}")))
}

/// Decode the base64 `FileData` payload of an attachment response.
fn decode_file_data(file_data: &str) -> Result<Vec<u8>, Error> {
    STANDARD
        .decode(file_data)
        .map_err(|e| Error::Api(format!("attachment decode: {e}")))
}

// --- Token state ---

struct CachedToken {
    access_token: Zeroizing<String>,
    expires_at: Instant,
}

impl CachedToken {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

// --- Request / Response types ---

/// Deserialize a `String` field directly into a `Zeroizing<String>`.
fn deser_zeroizing_string<'de, D>(de: D) -> Result<Zeroizing<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    Ok(Zeroizing::new(s))
}

/// Token response — the access token is sensitive and scrubbed on drop.
/// `derive(Debug)` is intentionally omitted; use the manual impl below.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(deserialize_with = "deser_zeroizing_string")]
    access_token: Zeroizing<String>,
    expires_in: u64,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachmentContentResponse {
    file_data: String,
}

/// A folder node of the raw hierarchy, exactly as the server sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawFolder {
    pub name: String,
    #[serde(default)]
    pub children: Vec<RawFolder>,
    #[serde(default)]
    pub credentials: Vec<RawEntry>,
}

/// A credential entry of the raw hierarchy. Passwords are never part of
/// this payload; they are fetched per entry on demand.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub custom_user_fields: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

/// An attachment descriptor: the identifier pair plus the file name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawAttachment {
    pub credential_object_id: String,
    pub attachment_id: String,
    pub file_name: String,
}
