//! Bearer token lookup for `tokenSecretRef` solver configurations.
//!
//! Two implementations are provided, [`memory::InMemorySecretStore`] and
//! [`kubernetes::KubeSecretStore`]. The former holds secrets handed to it directly. The latter reads
//! Kubernetes `Secret` objects through the cluster API with the webhook's own credentials.

use crate::error::Error;
use std::sync::Arc;

pub mod kubernetes;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use kubernetes::KubeSecretStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemorySecretStore;

/// `DynSecretStore` is a type alias for a [`SecretStore`] shared between concurrent challenge
/// operations.
#[allow(clippy::module_name_repetitions)]
pub type DynSecretStore = Arc<dyn SecretStore + Send + Sync>;

/// An async trait describing read-only access to namespaced secrets.
#[async_trait::async_trait]
pub trait SecretStore {
    /// Get the value stored under `key` in secret `name` of `namespace`.
    ///
    /// Returns [`Error::MissingSecret`] when either the secret or the key doesn't exist.
    async fn get_secret(&self, namespace: &str, name: &str, key: &str) -> Result<String, Error>;
}
