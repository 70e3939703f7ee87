//! reqwest implementation of the gateway admin API

use super::{
    ApiError, ErrorResponse, LoginResponse, MutationResponse, TypeResponse, VpnApi,
};
use crate::config::{self, ApiConfig};
use crate::flavor::VpnFlavor;
use crate::registry::{UserEntry, Username};
use crate::session::Credentials;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the gateway admin API
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder =
            Client::builder().user_agent(concat!("vpn-dashboard/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    /// Create a client for a base URL with default settings
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout: None,
        })
    }

    /// The base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Direct download link for a user's config, credentials included
    ///
    /// Anyone holding this link holds the admin password.
    pub fn config_url(&self, credentials: &Credentials, name: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(&["getConfig", name])?;
        url.query_pairs_mut()
            .append_pair("username", credentials.username())
            .append_pair("password", credentials.password().expose());
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_bytes(
        &self,
        endpoint: &'static str,
        url: Url,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<u8>, ApiError> {
        let mut request = self.client.get(url);
        if let Some(credentials) = credentials {
            request = request.query(&[
                ("username", credentials.username()),
                ("password", credentials.password().expose()),
            ]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "API response");
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
        credentials: Option<&Credentials>,
    ) -> Result<T, ApiError> {
        let body = self.get_bytes(endpoint, url, credentials).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::UnexpectedResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    config::parse_base_url(raw).map_err(|e| ApiError::InvalidUrl(e.to_string()))
}

#[async_trait]
impl VpnApi for HttpApi {
    async fn vpn_type(&self) -> Result<VpnFlavor, ApiError> {
        let url = self.endpoint(&["type"])?;
        let response: TypeResponse = self.get_json("type", url, None).await?;
        Ok(response.flavor)
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["login"])?;
        self.get_json("login", url, Some(credentials)).await
    }

    async fn list_users(&self, credentials: &Credentials) -> Result<Vec<UserEntry>, ApiError> {
        let url = self.endpoint(&["list"])?;
        self.get_json("list", url, Some(credentials)).await
    }

    async fn create_user(
        &self,
        credentials: &Credentials,
        name: &Username,
    ) -> Result<MutationResponse, ApiError> {
        let url = self.endpoint(&["create", name.as_str()])?;
        self.get_json("create", url, Some(credentials)).await
    }

    async fn remove_user(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<MutationResponse, ApiError> {
        let url = self.endpoint(&["remove", name])?;
        self.get_json("remove", url, Some(credentials)).await
    }

    async fn download_config(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["getConfig", name])?;
        let body = self.get_bytes("getConfig", url, Some(credentials)).await?;

        // The gateway answers bad credentials with a JSON error body and
        // unknown users with an empty file.
        if let Ok(error) = serde_json::from_slice::<ErrorResponse>(&body) {
            return Err(ApiError::Rejected {
                endpoint: "getConfig",
                message: error.error,
            });
        }
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ApiError::UnexpectedResponse {
                endpoint: "getConfig",
                reason: format!("empty config for {}", name),
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("admin", "s3cret&x")
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = HttpApi::with_base_url("http://vpn.example.com:5000/admin").unwrap();
        assert_eq!(api.base_url().as_str(), "http://vpn.example.com:5000/admin/");
    }

    #[test]
    fn test_rejects_relative_and_foreign_urls() {
        assert!(matches!(
            HttpApi::with_base_url("/"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpApi::with_base_url("ftp://vpn.example.com/"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpApi::with_base_url("http://gw:notaport/"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoints_resolve_under_base() {
        let api = HttpApi::with_base_url("http://127.0.0.1:5000/").unwrap();
        assert_eq!(
            api.endpoint(&["create", "bob"]).unwrap().as_str(),
            "http://127.0.0.1:5000/create/bob"
        );

        let nested = HttpApi::with_base_url("https://gw.example.com/vpn/").unwrap();
        assert_eq!(
            nested.endpoint(&["list"]).unwrap().as_str(),
            "https://gw.example.com/vpn/list"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let api = HttpApi::with_base_url("http://127.0.0.1:5000/").unwrap();
        let url = api.endpoint(&["remove", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/remove/a%2Fb%20c");
    }

    #[test]
    fn test_config_url_carries_credentials() {
        let api = HttpApi::with_base_url("http://127.0.0.1:5000/").unwrap();
        let url = api.config_url(&creds(), "alice").unwrap();
        assert_eq!(url.path(), "/getConfig/alice");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("username".to_string(), "admin".to_string()),
                ("password".to_string(), "s3cret&x".to_string()),
            ]
        );
    }
}
