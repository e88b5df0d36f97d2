use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    CredentialNotFound,
    CredentialRegistryEmpty,
    TemplateNotFound,

    RemoteConnectFailed,
    RemoteTimeout,
    RemoteStatus,
    RemoteInvalidResponse,

    KeychainFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::CredentialNotFound => "credential.not_found",
            ErrorCode::CredentialRegistryEmpty => "credential.registry_empty",
            ErrorCode::TemplateNotFound => "template.not_found",

            ErrorCode::RemoteConnectFailed => "remote.connect_failed",
            ErrorCode::RemoteTimeout => "remote.timeout",
            ErrorCode::RemoteStatus => "remote.status",
            ErrorCode::RemoteInvalidResponse => "remote.invalid_response",

            ErrorCode::KeychainFailed => "keychain.failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Transport-level failures: the server was never reached or never answered.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ErrorCode::RemoteConnectFailed | ErrorCode::RemoteTimeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialNotFoundDetails {
    pub name: String,
    pub available: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNotFoundDetails {
    pub filter: String,
    pub searched: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTransportDetails {
    pub method: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatusDetails {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInvalidResponseDetails {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                id,
            }),
        )
    }

    pub fn credential_not_found(name: impl Into<String>, available: Vec<String>) -> Self {
        let name = name.into();
        let err = Self::new(
            ErrorCode::CredentialNotFound,
            format!("No credential named '{}' is configured", name),
            to_details(CredentialNotFoundDetails { name, available }),
        );
        err.with_hint("Run 'xlrelease credential list' to see configured credentials")
    }

    pub fn credential_registry_empty() -> Self {
        Self::new(
            ErrorCode::CredentialRegistryEmpty,
            "No credentials defined in the system configuration",
            Value::Object(serde_json::Map::new()),
        )
        .with_hint("Run 'xlrelease credential add <name> --username <user>' to add one")
    }

    pub fn template_not_found(filter: impl Into<String>, searched: usize) -> Self {
        let filter = filter.into();
        Self::new(
            ErrorCode::TemplateNotFound,
            format!("No release template title contains '{}'", filter),
            to_details(TemplateNotFoundDetails { filter, searched }),
        )
        .with_hint("Run 'xlrelease templates <filter>' to see matching templates")
    }

    pub fn remote_connect_failed(
        method: &str,
        url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::RemoteConnectFailed,
            "Could not reach the XL Release server",
            to_details(RemoteTransportDetails {
                method: method.to_string(),
                url: url.into(),
                error: error.into(),
            }),
        )
    }

    pub fn remote_timeout(method: &str, url: impl Into<String>, error: impl Into<String>) -> Self {
        let mut err = Self::new(
            ErrorCode::RemoteTimeout,
            "Request to the XL Release server timed out",
            to_details(RemoteTransportDetails {
                method: method.to_string(),
                url: url.into(),
                error: error.into(),
            }),
        );
        err.retryable = Some(true);
        err.with_hint("Raise 'timeoutSecs' with 'xlrelease config set --timeout-secs <n>'")
    }

    pub fn remote_status(
        method: &str,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        let err = Self::new(
            ErrorCode::RemoteStatus,
            format!("XL Release returned HTTP {}", status),
            to_details(RemoteStatusDetails {
                method: method.to_string(),
                url: url.into(),
                status,
                body: body.into(),
            }),
        );
        if status == 401 || status == 403 {
            err.with_hint("Check the credential's username and password")
        } else {
            err
        }
    }

    pub fn remote_invalid_response(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::RemoteInvalidResponse,
            "Unexpected response body from XL Release",
            to_details(RemoteInvalidResponseDetails {
                url: url.into(),
                error: error.into(),
            }),
        )
    }

    pub fn keychain_failed(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::KeychainFailed,
            format!("Keychain error: {}", error.into()),
            Value::Null,
        )
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            to_details(ConfigMissingKeyDetails {
                key: key.into(),
                path,
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_not_found_lists_available_names() {
        let err = Error::credential_not_found("prod", vec!["dev".to_string(), "qa".to_string()]);

        assert_eq!(err.code, ErrorCode::CredentialNotFound);
        assert_eq!(err.details["name"], "prod");
        assert_eq!(err.details["available"][1], "qa");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn timeout_is_retryable_connectivity_failure() {
        let err = Error::remote_timeout("GET", "http://xlr/releases", "operation timed out");

        assert!(err.code.is_connectivity());
        assert_eq!(err.retryable, Some(true));
    }

    #[test]
    fn status_error_is_not_connectivity() {
        let err = Error::remote_status("POST", "http://xlr/releases", 500, "boom");

        assert!(!err.code.is_connectivity());
        assert_eq!(err.details["status"], 500);
        assert!(err.hints.is_empty());
    }

    #[test]
    fn unauthorized_status_carries_credential_hint() {
        let err = Error::remote_status("GET", "http://xlr/releases", 401, "");
        assert_eq!(err.hints.len(), 1);
    }
}
