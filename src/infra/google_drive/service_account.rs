// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Google's two-legged OAuth flow for service accounts:
// 1. Sign a JWT with the account's private key (RS256)
// 2. POST it to the token endpoint as a `jwt-bearer` grant
// 3. Use the returned access token as a Bearer header
//
// The key file is the JSON downloaded from Cloud Console ("Keys" tab >
// "Add Key" > JSON). The files being converted must be shared with the
// service account's email, or live in its own drive.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::conversion::DriveError;

/// Full read/write access to the account's drive.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Could not read key file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Key file is not a valid service account key: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid private key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

impl From<CredentialError> for DriveError {
    fn from(e: CredentialError) -> Self {
        DriveError::Credential(e.to_string())
    }
}

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for access token).
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    /// Space-separated scopes.
    scope: String,
    aud: String,
    iat: u64,
    /// Max 1 hour after `iat`.
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    encoding_key: EncodingKey,
    scopes: Vec<String>,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &Path, scopes: &[&str]) -> Result<Self, CredentialError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CredentialError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::from_json(&content, scopes)
    }

    /// Creates a new authenticator from JSON content.
    ///
    /// The private key is parsed here so a broken key fails at startup, not
    /// on the first request.
    pub fn from_json(json: &str, scopes: &[&str]) -> Result<Self, CredentialError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)?;
        let encoding_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
        Ok(Self {
            credentials,
            encoding_key,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String, CredentialError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if is_fresh(token.expires_at, SystemTime::now()) {
                    return Ok(token.token.clone());
                }
            }
        }

        let response = self.fetch_new_token().await?;

        let mut cached = self.cached_token.write().await;
        *cached = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        });

        Ok(response.access_token)
    }

    fn claims(&self, now: u64) -> JwtClaims {
        JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        }
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse, CredentialError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CredentialError::TokenExchange(format!("system clock error: {}", e)))?
            .as_secs();

        let header = Header::new(Algorithm::RS256);
        let jwt = encode(&header, &self.claims(now), &self.encoding_key)?;

        tracing::debug!(account = %self.credentials.client_email, "Requesting access token");

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())])
            .send()
            .await
            .map_err(|e| CredentialError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CredentialError::TokenExchange(format!(
                "{}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CredentialError::TokenExchange(e.to_string()))
    }
}

fn is_fresh(expires_at: SystemTime, now: SystemTime) -> bool {
    expires_at > now + REFRESH_MARGIN
}
