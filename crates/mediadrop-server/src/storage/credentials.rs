//! Storage credentials
//!
//! Requests carry credentials in a loose wire shape ([`RawCredentials`]) that
//! is checked structurally at admission and turned into the typed
//! [`StorageCredentials`]. Whether the credentials actually work is only known
//! after a live provider call.

use serde::Deserialize;
use thiserror::Error;

/// Credentials for the storage provider
#[derive(Clone, PartialEq, Eq)]
pub enum StorageCredentials {
    /// Long-lived service identity
    ServiceAccount {
        project_id: String,
        client_email: String,
        private_key: String,
    },
    /// Delegated user grant
    OAuth {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

impl StorageCredentials {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageCredentials::ServiceAccount { .. } => "service_account",
            StorageCredentials::OAuth { .. } => "oauth",
        }
    }
}

// Secrets never reach logs
impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageCredentials::ServiceAccount {
                project_id,
                client_email,
                ..
            } => f
                .debug_struct("ServiceAccount")
                .field("project_id", project_id)
                .field("client_email", client_email)
                .field("private_key", &"<redacted>")
                .finish(),
            StorageCredentials::OAuth { client_id, .. } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("refresh_token", &"<redacted>")
                .finish(),
        }
    }
}

/// Structural problems with submitted credentials
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("credentials.type is required (service_account or oauth)")]
    MissingType,

    #[error("credentials.type '{0}' is not supported; use service_account or oauth")]
    UnknownType(String),

    #[error("credentials.{field} is required for {kind} credentials")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// Credentials as submitted; every field optional until validated
///
/// Field names follow Google's key files (`client_email`, `private_key`, ...)
/// and also accept their camelCase spellings.
#[derive(Clone, Default, Deserialize)]
pub struct RawCredentials {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(alias = "clientEmail")]
    pub client_email: Option<String>,
    #[serde(alias = "privateKey")]
    pub private_key: Option<String>,
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(alias = "clientSecret")]
    pub client_secret: Option<String>,
    #[serde(alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCredentials")
            .field("kind", &self.kind)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

fn required(
    value: Option<String>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, CredentialsError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(CredentialsError::MissingField { kind, field })
}

#[derive(Clone, Copy)]
enum Kind {
    ServiceAccount,
    OAuth,
}

impl RawCredentials {
    /// Resolve the discriminant; infer it from the fields when `type` is absent
    fn resolved_kind(&self) -> Result<Kind, CredentialsError> {
        match self.kind.as_deref().map(str::trim) {
            Some("service_account") => Ok(Kind::ServiceAccount),
            Some("oauth") | Some("oauth2") | Some("authorized_user") => Ok(Kind::OAuth),
            Some(other) => Err(CredentialsError::UnknownType(other.to_string())),
            None if self.private_key.is_some() || self.client_email.is_some() => {
                Ok(Kind::ServiceAccount)
            },
            None if self.refresh_token.is_some() => Ok(Kind::OAuth),
            None => Err(CredentialsError::MissingType),
        }
    }

    /// Check the fields required by the discriminant
    pub fn validate(self) -> Result<StorageCredentials, CredentialsError> {
        match self.resolved_kind()? {
            Kind::ServiceAccount => {
                let kind = "service_account";
                Ok(StorageCredentials::ServiceAccount {
                    project_id: required(self.project_id, kind, "project_id")?,
                    client_email: required(self.client_email, kind, "client_email")?,
                    private_key: required(self.private_key, kind, "private_key")?,
                })
            },
            Kind::OAuth => {
                let kind = "oauth";
                Ok(StorageCredentials::OAuth {
                    client_id: required(self.client_id, kind, "client_id")?,
                    client_secret: required(self.client_secret, kind, "client_secret")?,
                    refresh_token: required(self.refresh_token, kind, "refresh_token")?,
                })
            },
        }
    }
}
