//! Error types.

use axum::extract::rejection::JsonRejection;
use std::time::Duration;

/// Error enumerates the possible solver error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when the per-issuer solver configuration in a challenge request can't be
    /// decoded into a [`SolverConfig`][crate::solver::config::SolverConfig].
    #[error("error decoding solver config")]
    ConfigDecode(#[source] serde_json::Error),

    /// Returned when a client for the configured mindns server address can't be created.
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// Returned when the bearer token contains bytes that can't be sent as gRPC metadata.
    #[error("bearer token is not a valid metadata value")]
    InvalidToken,

    /// Returned when fetching the existing TXT RRset fails for a reason other than the
    /// RRset not existing.
    #[error("failed to get TXT records")]
    Fetch(#[source] tonic::Status),

    /// Returned when writing the updated TXT RRset fails.
    #[error("failed to set TXT records")]
    Write(#[source] tonic::Status),

    /// Returned when deleting an emptied TXT RRset fails.
    #[error("failed to delete TXT records")]
    Delete(#[source] tonic::Status),

    /// Returned when a mindns RPC doesn't complete within the configured RPC timeout.
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// Returned when the challenge's resolved FQDN isn't fully qualified.
    #[error("challenge name is not a fully qualified name: \"{0}\"")]
    NotFQDN(String),

    /// Returned when a `tokenSecretRef` names a secret, or a key within a secret, that
    /// doesn't exist.
    #[error("secret \"{namespace}/{name}\" has no key \"{key}\"")]
    MissingSecret {
        namespace: String,
        name: String,
        key: String,
    },

    /// Returned when a `tokenSecretRef` is configured but the solver was initialized without
    /// a Kubernetes client configuration to look secrets up with.
    #[error("tokenSecretRef is set but no secret store is configured")]
    SecretStoreUnavailable,

    /// Returned when the Kubernetes API can't be reached or rejects a secret lookup.
    #[error("kubernetes API request failed")]
    KubeAPI(#[from] kube::Error),

    /// Returned when a secret value isn't valid UTF-8 text.
    #[error("secret \"{namespace}/{name}\" key \"{key}\" is not valid UTF-8 text")]
    InvalidSecretEncoding {
        namespace: String,
        name: String,
        key: String,
    },

    /// Returned at startup when the `GROUP_NAME` environment variable is unset or empty.
    #[error("GROUP_NAME must be specified")]
    MissingGroupName,

    /// Returned when the webhook is called for an API group or solver it doesn't serve.
    #[error("no solver \"{resource}\" in group \"{group}\"")]
    UnknownSolver { group: String, resource: String },

    /// Returned when a `ChallengePayload` is posted without a `request`.
    #[error("challenge payload has no request")]
    MissingChallengeRequest,

    /// Returned when clients `POST` invalid JSON.
    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when [loading a `Config`][crate::config::Config::try_from_file] fails due to
    /// invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}
