use serde::{Deserialize, Serialize};

use crate::config::Job;
use crate::error::PostbotError;

/// Scheduler payload. Only the optional `job` field is interpreted; the rest
/// of the event is opaque.
#[derive(Debug, Default, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub job: Option<String>,
}

impl InvocationEvent {
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// The job named by the event, falling back to `default`.
    pub fn job_or(&self, default: Job) -> Result<Job, String> {
        match &self.job {
            Some(name) => name.parse(),
            None => Ok(default),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    /// 200 with the posting API's response pretty-printed as the body.
    pub fn ok(data: &serde_json::Value) -> Self {
        Self {
            status_code: 200,
            body: serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        }
    }

    pub fn no_content(msg: impl Into<String>) -> Self {
        Self::message(400, msg.into())
    }

    pub fn err(msg: impl std::fmt::Display) -> Self {
        Self::message(500, format!("Error: {}", msg))
    }

    /// Status from `PostbotError::status_code`; only 500s carry the
    /// `Error: ` prefix.
    pub fn from_error(error: &PostbotError) -> Self {
        match error.status_code() {
            500 => Self::err(error),
            status => Self::message(status, error.to_string()),
        }
    }

    /// Body is a JSON-encoded string.
    fn message(status_code: u16, msg: String) -> Self {
        Self {
            status_code,
            body: serde_json::Value::String(msg).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serializes_with_status_code_field() {
        let resp = InvocationResponse::no_content("No image URL found for the article.");
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["body"], "\"No image URL found for the article.\"");
    }

    #[test]
    fn test_upstream_error_maps_to_500_with_status_in_body() {
        let error = PostbotError::UpstreamApi {
            service: "X",
            status: 403,
            body: "{\"detail\":\"Forbidden\"}".to_string(),
        };
        let resp = InvocationResponse::from_error(&error);

        assert_eq!(resp.status_code, 500);
        assert!(resp.body.contains("403"));
        assert!(resp.body.contains("Forbidden"));
    }

    #[test]
    fn test_from_error_follows_error_status_code() {
        let no_content = PostbotError::NoContentFound("No headlines available".to_string());
        let resp = InvocationResponse::from_error(&no_content);
        assert_eq!(resp.status_code, no_content.status_code());
        assert_eq!(resp.body, "\"No headlines available\"");

        let missing = PostbotError::MissingCredential("CONSUMER_KEY".to_string());
        let resp = InvocationResponse::from_error(&missing);
        assert_eq!(resp.status_code, missing.status_code());
        assert_eq!(resp.body, "\"Error: Missing credential: CONSUMER_KEY\"");
    }

    #[test]
    fn test_event_job_override() {
        let event = InvocationEvent::from_value(&serde_json::json!({
            "job": "headlines",
            "source": "aws.events"
        }));
        assert_eq!(event.job_or(Job::RandomFact).unwrap(), Job::Headlines);

        let scheduled = InvocationEvent::from_value(&serde_json::json!({"detail-type": "Scheduled Event"}));
        assert_eq!(scheduled.job_or(Job::Wikimedia).unwrap(), Job::Wikimedia);

        let odd = InvocationEvent::from_value(&serde_json::json!("not an object"));
        assert_eq!(odd.job_or(Job::YearProgress).unwrap(), Job::YearProgress);
    }
}
