use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::EncodedPayload;
use crate::models::classify_types::{ClassificationResult, ClassifyRequest};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for the remote classifier.
#[derive(Clone)]
pub struct ClassifierClient {
    client: Client,
    endpoint: Url,
}

impl ClassifierClient {
    pub fn new(config: &PipelineConfig) -> PipelineResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PipelineError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// POST the payload once and validate the answer.
    pub async fn submit(&self, payload: &EncodedPayload) -> PipelineResult<ClassificationResult> {
        submit_with(&self.client, payload, &self.endpoint, || {}).await
    }

    /// Like [`submit`](Self::submit), calling `on_sent` once the request is
    /// built, right before the client starts waiting on the endpoint.
    pub async fn submit_observed<F>(
        &self,
        payload: &EncodedPayload,
        on_sent: F,
    ) -> PipelineResult<ClassificationResult>
    where
        F: FnOnce() + Send,
    {
        submit_with(&self.client, payload, &self.endpoint, on_sent).await
    }
}

/// Send `{"image": <base64>}` to `endpoint`.
///
/// Non-2xx statuses become [`PipelineError::Remote`] with the body kept
/// verbatim; 2xx bodies go through [`ClassificationResult::from_response_body`].
pub async fn submit_with<F>(
    client: &Client,
    payload: &EncodedPayload,
    endpoint: &Url,
    on_sent: F,
) -> PipelineResult<ClassificationResult>
where
    F: FnOnce() + Send,
{
    debug!(endpoint = %endpoint, base64_chars = payload.base64.len(), "submitting payload");

    let request = client.post(endpoint.clone()).json(&ClassifyRequest {
        image: &payload.base64,
    });
    on_sent();
    let response = request.send().await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), body = %body, "classifier returned failure status");
        return Err(PipelineError::Remote {
            status_code: status.as_u16(),
            body,
        });
    }

    ClassificationResult::from_response_body(&body).inspect_err(|e| {
        warn!(error = %e, body = %body, "classifier response failed validation");
    })
}
