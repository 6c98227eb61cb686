use crate::error::Error;
use crate::secret_store::SecretStore;
use std::collections::HashMap;

type SecretKey = (String, String, String);

#[derive(Default, Debug, Clone)]
pub struct InMemorySecretStore {
    secrets: HashMap<SecretKey, String>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn with_secret(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.secrets
            .insert((namespace.into(), name.into(), key.into()), value.into());
        self
    }
}

#[async_trait::async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, namespace: &str, name: &str, key: &str) -> Result<String, Error> {
        self.secrets
            .get(&(namespace.to_string(), name.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::MissingSecret {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.to_string(),
            })
    }
}
