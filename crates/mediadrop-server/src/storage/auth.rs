//! Access tokens for the storage provider
//!
//! Service accounts use the JWT bearer grant (RFC 7523) with an RS256
//! assertion; delegated grants use the refresh-token grant.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{StorageCredentials, StorageError};

/// Full Drive scope; the folder check, upload and sharing all need it
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Sign the assertion a service account trades for an access token
pub fn service_account_assertion(
    client_email: &str,
    private_key: &str,
    token_uri: &str,
) -> Result<String, StorageError> {
    // Keys pasted through env files or shells often arrive with escaped newlines
    let pem = private_key.replace("\\n", "\n");
    let key = EncodingKey::from_rsa_pem(pem.as_bytes())?;

    let iat = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: client_email,
        scope: DRIVE_SCOPE,
        aud: token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?)
}

/// Exchange credentials for a bearer token
#[instrument(skip(client, credentials), fields(kind = credentials.kind()))]
pub async fn access_token(
    client: &reqwest::Client,
    token_uri: &str,
    credentials: &StorageCredentials,
) -> Result<String, StorageError> {
    let form: Vec<(&str, String)> = match credentials {
        StorageCredentials::ServiceAccount {
            client_email,
            private_key,
            ..
        } => vec![
            ("grant_type", JWT_BEARER_GRANT.to_string()),
            (
                "assertion",
                service_account_assertion(client_email, private_key, token_uri)?,
            ),
        ],
        StorageCredentials::OAuth {
            client_id,
            client_secret,
            refresh_token,
        } => vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", client_id.clone()),
            ("client_secret", client_secret.clone()),
            ("refresh_token", refresh_token.clone()),
        ],
    };

    let response = client.post(token_uri).form(&form).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<TokenErrorResponse>(&body)
            .ok()
            .and_then(|e| e.error_description.or(e.error))
            .unwrap_or_else(|| format!("token endpoint returned {status}"));
        return Err(StorageError::Auth(message));
    }

    let token: TokenResponse = response.json().await?;
    debug!("Obtained storage access token");
    Ok(token.access_token)
}
