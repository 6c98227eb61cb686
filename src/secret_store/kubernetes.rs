//! A Kubernetes API-backed implementation of the [`SecretStore`][super::SecretStore] trait.
//!
//! Nothing is cached: each lookup reads the `Secret` as it is at that moment, so rotated
//! tokens take effect on the next challenge.
use crate::error::Error;
use crate::secret_store::SecretStore;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};

#[derive(Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn missing(namespace: &str, name: &str, key: &str) -> Error {
    Error::MissingSecret {
        namespace: namespace.to_string(),
        name: name.to_string(),
        key: key.to_string(),
    }
}

/// The value under `key` in `secret`. Values are stored base64 encoded by the API server;
/// `k8s-openapi` hands them over already decoded.
fn secret_value(secret: &Secret, namespace: &str, name: &str, key: &str) -> Result<String, Error> {
    let value = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .ok_or_else(|| missing(namespace, name, key))?;
    String::from_utf8(value.0.clone()).map_err(|_| Error::InvalidSecretEncoding {
        namespace: namespace.to_string(),
        name: name.to_string(),
        key: key.to_string(),
    })
}

#[async_trait::async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str, key: &str) -> Result<String, Error> {
        tracing::debug!("fetching secret {namespace}/{name}");
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get_opt(name)
            .await?
            .ok_or_else(|| missing(namespace, name, key))?;
        secret_value(&secret, namespace, name, key)
    }
}
