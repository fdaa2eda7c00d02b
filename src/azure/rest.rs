//! Transport that calls the Resource Manager REST endpoint directly.
//!
//! Tokens come from an `azure_identity` credential; for the service
//! principal case this is a [`ClientSecretCredential`] bound to the
//! authority host of the selected [`Cloud`].

use super::transport::{decode_body, ArmRequest, ArmResponse, ArmTransport, Method};
use super::Cloud;
use crate::config::ServicePrincipal;
use crate::error::{ArmError, ArmResult};
use azure_core::auth::TokenCredential;
use azure_identity::{ClientSecretCredential, TokenCredentialOptions};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Sends ARM requests over HTTPS with a bearer token.
pub struct RestTransport {
    client: Client,
    cloud: Cloud,
    credential: Arc<dyn TokenCredential>,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("cloud", &self.cloud)
            .finish_non_exhaustive()
    }
}

impl RestTransport {
    pub fn new(cloud: Cloud, credential: Arc<dyn TokenCredential>) -> ArmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ArmError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(RestTransport {
            client,
            cloud,
            credential,
        })
    }

    /// Authenticate as a service principal against `cloud`.
    pub fn with_service_principal(cloud: Cloud, sp: &ServicePrincipal) -> ArmResult<Self> {
        let authority = url::Url::parse(cloud.authority_host())
            .map_err(|e| ArmError::Auth(format!("Bad authority host: {e}")))?;
        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            sp.tenant_id.clone(),
            sp.client_id.clone(),
            sp.client_secret.clone(),
            TokenCredentialOptions::new(authority),
        );
        log::info!(
            "Using service principal {} on {}",
            sp.client_id,
            cloud.az_cli_name()
        );
        RestTransport::new(cloud, Arc::new(credential))
    }

    /// Full URL of a request.
    pub fn url(&self, request: &ArmRequest) -> String {
        format!("{}{}", self.cloud.resource_manager(), request.path_and_query())
    }

    async fn bearer_token(&self) -> ArmResult<String> {
        let scope = self.cloud.scope();
        let token = self
            .credential
            .get_token(&[scope.as_str()])
            .await
            .map_err(|e| ArmError::Auth(e.to_string()))?;
        Ok(token.token.secret().to_string())
    }
}

impl ArmTransport for RestTransport {
    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
        let token = self.bearer_token().await?;
        let url = self.url(&request);
        log::debug!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Put => self.client.put(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = builder.bearer_auth(token);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ArmError::Transport(format!("{} {url}: {e}", request.method)))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ArmError::Transport(format!("Reading body of {url}: {e}")))?;
        log::trace!("status={status} body.len()={}", text.len());

        let body = decode_body(&text)?;
        Ok(ArmResponse { status, body })
    }
}
