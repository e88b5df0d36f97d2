use serde::{Deserialize, Serialize};
use std::fmt;

/// Password wrapper that never prints its contents.
///
/// Serializes as a plain string so inline passwords survive a settings
/// round-trip; `Debug` and `Display` are redacted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A named set of XL Release login details.
///
/// An empty `password` means the password is kept in the system keychain
/// under the credential name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Secret::is_empty")]
    pub password: Secret,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl Credential {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: Secret::new(password),
            server_url: None,
            proxy_url: None,
        }
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn resolve_server_url(&self, default_url: Option<&str>) -> String {
        resolve_override(self.server_url.as_deref(), default_url)
    }

    pub fn resolve_proxy_url(&self, default_url: Option<&str>) -> String {
        resolve_override(self.proxy_url.as_deref(), default_url)
    }
}

// Blank strings count as unset at both levels.
fn resolve_override(own: Option<&str>, default: Option<&str>) -> String {
    own.filter(|v| !v.trim().is_empty())
        .or(default.filter(|v| !v.trim().is_empty()))
        .unwrap_or_default()
        .to_string()
}
