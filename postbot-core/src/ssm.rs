//! AWS Systems Manager Parameter Store over the JSON 1.1 API.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AwsConfig;
use crate::error::{PostbotError, Result};
use crate::sigv4::{self, AwsCredentials, SigningRequest};
use crate::store::ParameterStore;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetParameterRequest<'a> {
    name: &'a str,
    with_decryption: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetParameterResponse {
    parameter: SsmParameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SsmParameter {
    value: String,
    #[serde(default)]
    version: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutParameterRequest<'a> {
    name: &'a str,
    value: &'a str,
    #[serde(rename = "Type")]
    kind: &'a str,
    overwrite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteParameterRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SsmErrorResponse {
    #[serde(rename = "__type")]
    kind: Option<String>,
}

fn error_kind(body: &str) -> Option<String> {
    serde_json::from_str::<SsmErrorResponse>(body)
        .ok()
        .and_then(|e| e.kind)
        // "__type" is sometimes namespaced: "com.amazonaws.ssm#ParameterNotFound"
        .map(|k| k.rsplit('#').next().unwrap_or_default().to_string())
}

/// SSM-backed [`ParameterStore`]. Values are written as `StringList`.
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: Client,
    credentials: AwsCredentials,
    region: String,
    endpoint: Url,
}

impl SsmParameterStore {
    pub fn from_config(config: &AwsConfig) -> Result<Self> {
        let region = config
            .region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .ok_or_else(|| PostbotError::MissingCredential("AWS_REGION".to_string()))?;
        let endpoint = config
            .ssm_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://ssm.{}.amazonaws.com/", region));

        Self::with_endpoint(AwsCredentials::from_env()?, region, &endpoint)
    }

    /// Create a store against a custom endpoint (for testing / LocalStack)
    pub fn with_endpoint(
        credentials: AwsCredentials,
        region: String,
        endpoint: &str,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            PostbotError::StorageUnavailable(format!("invalid SSM endpoint {}: {}", endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            credentials,
            region,
            endpoint,
        })
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Sends one signed SSM action. Returns `(status, body)`; transport
    /// failures become `StorageUnavailable`.
    async fn call<T: Serialize>(&self, target: &str, payload: &T) -> Result<(u16, String)> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            PostbotError::StorageUnavailable(format!("failed to encode {}: {}", target, e))
        })?;
        let amz_target = format!("AmazonSSM.{}", target);
        let host = self.host();

        let unsigned = [
            ("content-type", CONTENT_TYPE),
            ("x-amz-target", amz_target.as_str()),
        ];
        let signed = sigv4::sign(
            &SigningRequest {
                method: "POST",
                host: &host,
                path: self.endpoint.path(),
                headers: &unsigned,
                body: &body,
            },
            &self.credentials,
            &self.region,
            "ssm",
            Utc::now(),
        );

        let mut request = self.client.post(self.endpoint.clone());
        for (name, value) in unsigned.iter() {
            request = request.header(*name, *value);
        }
        for (name, value) in signed.iter() {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(body).send().await.map_err(|e| {
            tracing::error!(target_action = %target, error = %e, "SSM request failed");
            PostbotError::StorageUnavailable(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PostbotError::StorageUnavailable(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str, with_decryption: bool) -> Result<Option<String>> {
        let (status, body) = self
            .call(
                "GetParameter",
                &GetParameterRequest {
                    name,
                    with_decryption,
                },
            )
            .await?;

        if status == 200 {
            let parsed: GetParameterResponse = serde_json::from_str(&body).map_err(|e| {
                PostbotError::StorageUnavailable(format!("unexpected GetParameter response: {}", e))
            })?;
            tracing::debug!(parameter = %name, version = ?parsed.parameter.version, "Read parameter");
            return Ok(Some(parsed.parameter.value));
        }

        if error_kind(&body).as_deref() == Some("ParameterNotFound") {
            tracing::debug!(parameter = %name, "Parameter not found");
            return Ok(None);
        }

        tracing::error!(parameter = %name, status, body = %body, "SSM GetParameter failed");
        Err(PostbotError::StorageUnavailable(format!(
            "GetParameter {} returned {}: {}",
            name, status, body
        )))
    }

    async fn put(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        let (status, body) = self
            .call(
                "PutParameter",
                &PutParameterRequest {
                    name,
                    value,
                    kind: "StringList",
                    overwrite,
                },
            )
            .await?;

        if status == 200 {
            tracing::debug!(parameter = %name, "Wrote parameter");
            return Ok(());
        }

        tracing::error!(parameter = %name, status, body = %body, "SSM PutParameter failed");
        Err(PostbotError::StorageUnavailable(format!(
            "PutParameter {} returned {}: {}",
            name, status, body
        )))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let (status, body) = self
            .call("DeleteParameter", &DeleteParameterRequest { name })
            .await?;

        if status == 200 || error_kind(&body).as_deref() == Some("ParameterNotFound") {
            return Ok(());
        }

        Err(PostbotError::StorageUnavailable(format!(
            "DeleteParameter {} returned {}: {}",
            name, status, body
        )))
    }

    fn name(&self) -> &str {
        "ssm"
    }
}
