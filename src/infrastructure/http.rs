//! Catalog service client over ureq

use std::io;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::Settings;
use crate::infrastructure::traits::{ApiClient, ApiResponse, HttpMethod};

/// Blocking client for the Fritz/SkyPortal REST API.
pub struct UreqApiClient {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl UreqApiClient {
    pub fn new(base_url: &str, auth_scheme: &str, token: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: format!("{} {}", auth_scheme, token),
        }
    }

    /// Build a client from settings and a resolved token.
    pub fn from_settings(settings: &Settings, token: &str) -> Self {
        Self::new(
            &settings.base_url,
            &settings.auth_scheme,
            token,
            settings.timeout_secs.map(Duration::from_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn into_api_response(response: ureq::Response) -> io::Result<ApiResponse> {
        let status = response.status();
        let text = response.into_string()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };
        trace!("response {}: {}", status, text);
        Ok(ApiResponse::new(status, body))
    }
}

impl ApiClient for UreqApiClient {
    fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> io::Result<ApiResponse> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let request = self
            .agent
            .request(method.as_str(), &url)
            .set("Authorization", &self.authorization)
            .set("Accept", "application/json");

        let result = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };

        match result {
            Ok(response) => Self::into_api_response(response),
            Err(ureq::Error::Status(_, response)) => Self::into_api_response(response),
            Err(ureq::Error::Transport(transport)) => Err(io::Error::other(format!(
                "{} {}: {}",
                method, url, transport
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_trailing_slash_base_when_building_url_then_joins_once() {
        let client = UreqApiClient::new("https://fritz.science/", "token", "abc", None);
        assert_eq!(
            client.url("/api/sources/ZTF21abc/annotations"),
            "https://fritz.science/api/sources/ZTF21abc/annotations"
        );
    }

    #[test]
    fn given_scheme_and_token_when_created_then_builds_authorization_header() {
        let client = UreqApiClient::new("https://fritz.science", "Bearer", "abc", None);
        assert_eq!(client.authorization, "Bearer abc");
    }
}
