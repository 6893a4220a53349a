//! HTTP transport for geocoding requests.
//!
//! [`GeocodeTransport`] lets the pacing and parsing logic of
//! [`crate::NominatimGeocoder`] run against scripted responses in tests.

use async_trait::async_trait;

use crate::GeocodeError;

/// Performs one GET request and returns the decoded JSON body.
#[async_trait]
pub trait GeocodeTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] for network failures, timeouts, and
    /// undecodable bodies, [`GeocodeError::RateLimited`] for HTTP 429, and
    /// [`GeocodeError::Status`] for other non-success responses.
    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, GeocodeError>;
}

/// [`GeocodeTransport`] over a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str, timeout: std::time::Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GeocodeTransport for HttpTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, GeocodeError> {
        let resp = self.client.get(url).query(params).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}
