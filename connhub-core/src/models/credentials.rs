//! Credential shapes, one variant per authentication kind.
//!
//! Credentials arrive pre-resolved; the core never stores or encrypts them
//! itself. Secret material is held in [`SecretString`] so it is redacted
//! from `Debug` output and logs.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default header used for API keys
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Authentication kind, without the credential payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    /// No authentication
    #[default]
    None,
    /// API key in a header or query parameter
    ApiKey,
    /// Bearer token
    BearerToken,
    /// HTTP Basic
    BasicAuth,
    /// OAuth 1.0a
    #[serde(rename = "oauth1")]
    OAuth1,
    /// OAuth 2.0 access token
    #[serde(rename = "oauth2")]
    OAuth2,
    /// Verbatim custom headers
    CustomHeader,
    /// Client certificate
    Certificate,
    /// JSON Web Token
    Jwt,
}

impl AuthKind {
    /// Returns the wire name of this kind
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "api_key",
            Self::BearerToken => "bearer_token",
            Self::BasicAuth => "basic_auth",
            Self::OAuth1 => "oauth1",
            Self::OAuth2 => "oauth2",
            Self::CustomHeader => "custom_header",
            Self::Certificate => "certificate",
            Self::Jwt => "jwt",
        }
    }
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an API key is placed on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    /// Request header
    #[default]
    Header,
    /// URL query parameter
    Query,
}

/// Pre-resolved credentials for a connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Credentials {
    /// No authentication
    #[default]
    None,
    /// API key
    ApiKey {
        /// The key
        #[serde(with = "secret_string")]
        key: SecretString,
        /// Header or query parameter name
        #[serde(default = "default_api_key_name")]
        name: String,
        /// Placement of the key
        #[serde(default)]
        location: ApiKeyLocation,
    },
    /// Bearer token sent as `Authorization: Bearer`
    BearerToken {
        /// The token
        #[serde(with = "secret_string")]
        token: SecretString,
    },
    /// HTTP Basic authentication
    BasicAuth {
        /// Username
        username: String,
        /// Password
        #[serde(with = "secret_string")]
        password: SecretString,
    },
    /// OAuth 1.0a; request signing is left to provider-specific probes
    #[serde(rename = "oauth1")]
    OAuth1 {
        /// Consumer key
        consumer_key: String,
        /// Consumer secret
        #[serde(with = "secret_string")]
        consumer_secret: SecretString,
        /// Access token
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        /// Access token secret
        #[serde(default, with = "optional_secret_string", skip_serializing_if = "Option::is_none")]
        token_secret: Option<SecretString>,
    },
    /// OAuth 2.0 with an already-resolved access token
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Access token
        #[serde(with = "secret_string")]
        access_token: SecretString,
        /// Refresh token, unused by the tester
        #[serde(default, with = "optional_secret_string", skip_serializing_if = "Option::is_none")]
        refresh_token: Option<SecretString>,
        /// Token type for the Authorization header
        #[serde(default = "default_token_type")]
        token_type: String,
    },
    /// Headers sent verbatim
    CustomHeader {
        /// Header name to value
        headers: BTreeMap<String, String>,
    },
    /// Client certificate authentication
    Certificate {
        /// PEM-encoded certificate or path to it
        certificate: String,
        /// PEM-encoded private key
        #[serde(default, with = "optional_secret_string", skip_serializing_if = "Option::is_none")]
        private_key: Option<SecretString>,
        /// CA bundle
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ca_certificate: Option<String>,
    },
    /// JSON Web Token sent bearer-style
    Jwt {
        /// The token
        #[serde(with = "secret_string")]
        token: SecretString,
    },
}

fn default_api_key_name() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Creates API key credentials sent in the default header
    #[must_use]
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey {
            key: SecretString::from(key.into()),
            name: default_api_key_name(),
            location: ApiKeyLocation::Header,
        }
    }

    /// Creates bearer token credentials
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::BearerToken {
            token: SecretString::from(token.into()),
        }
    }

    /// Creates HTTP Basic credentials
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::BasicAuth {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Returns the authentication kind
    #[must_use]
    pub const fn kind(&self) -> AuthKind {
        match self {
            Self::None => AuthKind::None,
            Self::ApiKey { .. } => AuthKind::ApiKey,
            Self::BearerToken { .. } => AuthKind::BearerToken,
            Self::BasicAuth { .. } => AuthKind::BasicAuth,
            Self::OAuth1 { .. } => AuthKind::OAuth1,
            Self::OAuth2 { .. } => AuthKind::OAuth2,
            Self::CustomHeader { .. } => AuthKind::CustomHeader,
            Self::Certificate { .. } => AuthKind::Certificate,
            Self::Jwt { .. } => AuthKind::Jwt,
        }
    }

    /// Checks that every field required by this kind is present
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first missing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::None => Ok(()),
            Self::ApiKey { key, name, .. } => {
                require_secret(key, "credentials.key")?;
                require(name, "credentials.name")
            }
            Self::BearerToken { token } | Self::Jwt { token } => {
                require_secret(token, "credentials.token")
            }
            Self::BasicAuth { username, password } => {
                require(username, "credentials.username")?;
                require_secret(password, "credentials.password")
            }
            Self::OAuth1 {
                consumer_key,
                consumer_secret,
                ..
            } => {
                require(consumer_key, "credentials.consumerKey")?;
                require_secret(consumer_secret, "credentials.consumerSecret")
            }
            Self::OAuth2 {
                access_token,
                token_type,
                ..
            } => {
                require_secret(access_token, "credentials.accessToken")?;
                require(token_type, "credentials.tokenType")
            }
            Self::CustomHeader { headers } => {
                if headers.is_empty() {
                    return Err(ValidationError::new(
                        "credentials.headers",
                        "at least one header is required",
                    ));
                }
                if let Some(name) = headers.keys().find(|k| !is_header_name(k)) {
                    return Err(ValidationError::new(
                        "credentials.headers",
                        format!("'{name}' is not a valid header name"),
                    ));
                }
                Ok(())
            }
            Self::Certificate { certificate, .. } => {
                require(certificate, "credentials.certificate")
            }
        }
    }
}

fn require(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(())
    }
}

fn require_secret(value: &SecretString, field: &str) -> Result<(), ValidationError> {
    require(value.expose_secret(), field)
}

/// RFC 7230 token characters
fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Serializes a secret as a plain string for the persistence wire format
mod secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(secret.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        String::deserialize(deserializer).map(SecretString::from)
    }
}

mod optional_secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        secret: &Option<SecretString>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match secret {
            Some(s) => serializer.serialize_some(s.expose_secret()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SecretString>, D::Error> {
        Option::<String>::deserialize(deserializer).map(|o| o.map(SecretString::from))
    }
}
