//! HTTP transport for cadastre requests.
//!
//! [`CadastreTransport`] is the seam that lets the retry and parsing logic
//! run against scripted responses in tests.

use async_trait::async_trait;

use crate::CadastreError;

/// Performs one GET request and returns the response body.
#[async_trait]
pub trait CadastreTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CadastreError::Transport`] for network failures and
    /// timeouts, [`CadastreError::Status`] for non-success responses.
    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, CadastreError>;
}

/// [`CadastreTransport`] over a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`CadastreError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(user_agent: &str, timeout: std::time::Duration) -> Result<Self, CadastreError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CadastreTransport for HttpTransport {
    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, CadastreError> {
        let resp = self.client.get(url).query(params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CadastreError::Status {
                status: status.as_u16(),
            });
        }

        Ok(resp.text().await?)
    }
}
