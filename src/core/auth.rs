//! Login flow for the anycrud engine
//!
//! The engine does not authenticate anyone itself. It asks a
//! [`CredentialCheck`] whether a username/secret pair is valid, builds a
//! claim set for accepted users and hands it to a [`TokenIssuer`].
//!
//! - [`StaticCredentialCheck`]: fixed user table, for development and tests
//! - [`JwtTokenIssuer`]: HS256 signed JSON Web Tokens

use crate::config::JwtConfig;
use crate::core::error::AuthError;
use crate::core::service::OperationResult;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Answer of a credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// No user with this name
    UnknownUser,

    /// The user exists but the secret does not match
    Rejected,

    /// The secret matches; carries the user's role names
    Accepted { roles: Vec<String> },
}

/// External credential store
#[async_trait]
pub trait CredentialCheck: Send + Sync {
    async fn check(&self, username: &str, secret: &str) -> Result<CredentialOutcome, AuthError>;
}

/// Signs a claim set into a bearer token
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, claims: &Claims) -> Result<String, AuthError>;
}

/// Claims carried by an issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User name
    pub name: String,
    /// Unique token id
    pub jti: String,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub secret: String,
}

/// Issues tokens for users accepted by a [`CredentialCheck`]
#[derive(Clone)]
pub struct LoginService {
    credentials: Arc<dyn CredentialCheck>,
    issuer: Arc<dyn TokenIssuer>,
    config: JwtConfig,
}

impl LoginService {
    pub fn new(
        credentials: Arc<dyn CredentialCheck>,
        issuer: Arc<dyn TokenIssuer>,
        config: JwtConfig,
    ) -> Self {
        Self {
            credentials,
            issuer,
            config,
        }
    }

    /// Check the credentials and issue a token
    ///
    /// - unknown user: `None`
    /// - wrong secret: `{data: None, rows_affected: 0}`
    /// - accepted: `{data: Some(token), rows_affected: 1}`
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<Option<OperationResult<Option<String>>>, AuthError> {
        let outcome = self
            .credentials
            .check(&request.username, &request.secret)
            .await?;

        match outcome {
            CredentialOutcome::UnknownUser => {
                tracing::debug!(username = %request.username, "login for unknown user");
                Ok(None)
            }
            CredentialOutcome::Rejected => {
                tracing::debug!(username = %request.username, "login rejected");
                Ok(Some(OperationResult::new(None, 0)))
            }
            CredentialOutcome::Accepted { roles } => {
                let claims = self.claims_for(&request.username, roles)?;
                let token = self.issuer.issue(&claims)?;
                tracing::info!(username = %request.username, jti = %claims.jti, "token issued");
                Ok(Some(OperationResult::new(Some(token), 1)))
            }
        }
    }

    fn claims_for(&self, username: &str, roles: Vec<String>) -> Result<Claims, AuthError> {
        let now = Utc::now();
        let expires = Duration::try_hours(self.config.expiry_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::TokenIssuance {
                message: format!("expiry of {} hours is out of range", self.config.expiry_hours),
            })?;

        Ok(Claims {
            name: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            roles,
            iss: self.config.valid_issuer.clone(),
            aud: self.config.valid_audience.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        })
    }
}

/// HS256 token issuer keyed by a shared secret
pub struct JwtTokenIssuer {
    key: EncodingKey,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret)
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.key).map_err(|e| {
            AuthError::TokenIssuance {
                message: e.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone)]
struct StaticUser {
    secret: String,
    roles: Vec<String>,
}

/// In-process credential table (for development)
///
/// Secrets are compared verbatim; do not use with real passwords.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialCheck {
    users: HashMap<String, StaticUser>,
}

impl StaticCredentialCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(
        mut self,
        username: impl Into<String>,
        secret: impl Into<String>,
        roles: &[&str],
    ) -> Self {
        self.users.insert(
            username.into(),
            StaticUser {
                secret: secret.into(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl CredentialCheck for StaticCredentialCheck {
    async fn check(&self, username: &str, secret: &str) -> Result<CredentialOutcome, AuthError> {
        Ok(match self.users.get(username) {
            None => CredentialOutcome::UnknownUser,
            Some(user) if user.secret == secret => CredentialOutcome::Accepted {
                roles: user.roles.clone(),
            },
            Some(_) => CredentialOutcome::Rejected,
        })
    }
}
