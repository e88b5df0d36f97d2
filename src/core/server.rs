//! REST client for one resolved XL Release server.
//!
//! One blocking `reqwest` client is built per connection (basic auth, proxy,
//! timeout) and reused for every call made through it.

use crate::credential::Secret;
use crate::error::{Error, Result};
use crate::release::{CreateReleaseBody, ReleaseOptions, ReleaseTemplateView, ReleaseView};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("xlrelease-notifier/", env!("CARGO_PKG_VERSION"));

/// Fully resolved coordinates for one XL Release server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConnection {
    pub server_url: String,
    pub proxy_url: String,
    pub username: String,
    pub password: Secret,
}

impl ServerConnection {
    pub fn new(
        server_url: impl Into<String>,
        proxy_url: impl Into<String>,
        username: impl Into<String>,
        password: Secret,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            proxy_url: proxy_url.into(),
            username: username.into(),
            password,
        }
    }
}

/// The four remote operations a build step needs.
pub trait ReleaseServer {
    /// Probes `GET /releases` and describes the response.
    fn check_connectivity(&self) -> Result<String>;
    /// Templates whose title contains `title_filter`, in server order.
    fn search_templates(&self, title_filter: &str) -> Result<Vec<ReleaseTemplateView>>;
    fn create_release(
        &self,
        template_id: &str,
        version: &str,
        options: &ReleaseOptions,
    ) -> Result<ReleaseView>;
    fn start_release(&self, release_id: &str) -> Result<()>;
}

/// HTTP implementation of [`ReleaseServer`].
pub struct XlReleaseServer {
    client: Client,
    base_url: String,
    username: String,
    password: Secret,
}

impl XlReleaseServer {
    pub fn connect(connection: &ServerConnection) -> Result<Self> {
        Self::with_timeout(connection, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(connection: &ServerConnection, timeout: Duration) -> Result<Self> {
        let base_url = connection.server_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config_missing_key("serverUrl", None).with_hint(
                "Set a default with 'xlrelease config set --server-url <url>' or a per-credential override",
            ));
        }
        reqwest::Url::parse(&base_url).map_err(|e| {
            Error::config_invalid_value("serverUrl", Some(base_url.clone()), e.to_string())
        })?;

        let mut builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);

        let proxy_url = connection.proxy_url.trim();
        if proxy_url.is_empty() {
            // Only the configured proxy is used, never HTTP_PROXY and friends.
            builder = builder.no_proxy();
        } else {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                Error::config_invalid_value("proxyUrl", Some(proxy_url.to_string()), e.to_string())
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::internal_unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            username: connection.username.clone(),
            password: connection.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `releases/<id>/<action>`, each id segment percent-encoded. XL Release
    /// ids are paths such as `Applications/Release1`, so `/` is kept.
    fn release_url(&self, release_id: &str, action: &str) -> Result<String> {
        let invalid = |problem: String| {
            Error::config_invalid_value("serverUrl", Some(self.base_url.clone()), problem)
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("releases")
            .extend(release_id.split('/'))
            .push(action);
        Ok(url.to_string())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.username, Some(self.password.expose()))
            .header(ACCEPT, "application/json")
    }

    fn send(&self, method: &str, url: &str, request: RequestBuilder) -> Result<Response> {
        self.authorized(request)
            .send()
            .map_err(|e| transport_error(method, url, e))
    }
}

impl ReleaseServer for XlReleaseServer {
    fn check_connectivity(&self) -> Result<String> {
        crate::log_status!("server", "Check that XL Release is running at {}", self.base_url);

        let url = self.url("releases");
        let response = self.send("GET", &url, self.client.get(&url))?;
        let status = response.status();
        let diagnostic = format!("GET {} returned a response status of {}", url, status);

        expect_success("GET", &url, response)?;
        crate::log_status!("server", "{}", diagnostic);

        Ok(diagnostic)
    }

    fn search_templates(&self, title_filter: &str) -> Result<Vec<ReleaseTemplateView>> {
        let url = self.url("releases/templates");
        let response = self.send("GET", &url, self.client.get(&url))?;
        let templates: Vec<ReleaseTemplateView> = parse_json_response("GET", &url, response)?;

        Ok(templates
            .into_iter()
            .filter(|t| t.title.contains(title_filter))
            .collect())
    }

    fn create_release(
        &self,
        template_id: &str,
        version: &str,
        options: &ReleaseOptions,
    ) -> Result<ReleaseView> {
        crate::log_status!("server", "Create a release for {}", template_id);

        let url = self.url("releases");
        let body = CreateReleaseBody {
            template_id,
            version,
            options,
        };
        let response = self.send("POST", &url, self.client.post(&url).json(&body))?;
        parse_json_response("POST", &url, response)
    }

    fn start_release(&self, release_id: &str) -> Result<()> {
        crate::log_status!("server", "Start the release {}", release_id);

        let url = self.release_url(release_id, "start")?;
        let response = self.send("POST", &url, self.client.post(&url))?;
        expect_success("POST", &url, response)?;
        Ok(())
    }
}

fn transport_error(method: &str, url: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::remote_timeout(method, url, e.to_string())
    } else {
        Error::remote_connect_failed(method, url, e.to_string())
    }
}

fn read_body(method: &str, url: &str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| transport_error(method, url, e))?;

    if !status.is_success() {
        return Err(Error::remote_status(method, url, status.as_u16(), body));
    }

    Ok(body)
}

fn expect_success(method: &str, url: &str, response: Response) -> Result<()> {
    read_body(method, url, response).map(|_| ())
}

fn parse_json_response<T: DeserializeOwned>(method: &str, url: &str, response: Response) -> Result<T> {
    let body = read_body(method, url, response)?;

    serde_json::from_str(&body)
        .map_err(|e| Error::remote_invalid_response(url, format!("Invalid JSON response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn connection(url: &str, proxy: &str) -> ServerConnection {
        ServerConnection::new(url, proxy, "admin", Secret::new("admin"))
    }

    #[test]
    fn empty_server_url_is_a_config_error() {
        let err = XlReleaseServer::connect(&connection("", "")).err().unwrap();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
    }

    #[test]
    fn malformed_server_url_is_rejected() {
        let err = XlReleaseServer::connect(&connection("not a url", "")).err().unwrap();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
        assert_eq!(err.details["key"], "serverUrl");
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_base() {
        let server = XlReleaseServer::connect(&connection("http://xlr:5516/api/", "")).unwrap();
        assert_eq!(server.base_url(), "http://xlr:5516/api");
        assert_eq!(server.url("/releases"), "http://xlr:5516/api/releases");
        assert_eq!(
            server.url("releases/Release1/start"),
            "http://xlr:5516/api/releases/Release1/start"
        );
    }

    #[test]
    fn release_ids_are_escaped_per_segment() {
        let server = XlReleaseServer::connect(&connection("http://xlr:5516/api/", "")).unwrap();

        assert_eq!(
            server.release_url("Applications/Release1", "start").unwrap(),
            "http://xlr:5516/api/releases/Applications/Release1/start"
        );
        assert_eq!(
            server.release_url("Release 9?x#y", "start").unwrap(),
            "http://xlr:5516/api/releases/Release%209%3Fx%23y/start"
        );
    }
}
