use crate::error::Error;
use crate::solver::ChallengeRequest;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub(super) const API_VERSION: &str = "acme.cert-manager.io/v1alpha1";
pub(super) const KIND: &str = "ChallengePayload";

/// The envelope cert-manager posts challenges in, and expects the outcome back in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChallengePayload {
    #[serde(default = "api_version")]
    pub api_version: String,
    #[serde(default = "kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

fn api_version() -> String {
    API_VERSION.to_string()
}

fn kind() -> String {
    KIND.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ChallengeResponse {
    pub uid: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ResponseStatus {
    pub message: String,
}

impl ChallengePayload {
    pub fn respond(response: ChallengeResponse) -> Self {
        Self {
            api_version: api_version(),
            kind: kind(),
            request: None,
            response: Some(response),
        }
    }
}

impl ChallengeResponse {
    pub fn success(uid: String) -> Self {
        Self {
            uid,
            success: true,
            status: None,
        }
    }

    /// A failed response whose message carries `err` and each of its sources.
    pub fn failure(uid: String, err: &Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            let _ = write!(message, ": {cause}");
            source = std::error::Error::source(cause);
        }
        Self {
            uid,
            success: false,
            status: Some(ResponseStatus { message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_includes_causes() {
        let err = Error::Write(tonic::Status::unavailable("mindns is down"));
        let response = ChallengeResponse::failure("1234".to_string(), &err);
        assert!(!response.success);
        let message = response.status.unwrap().message;
        assert!(message.starts_with("failed to set TXT records: "), "{message}");
        assert!(message.contains("mindns is down"), "{message}");
    }
}
