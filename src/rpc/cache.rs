//! A lazily created, memoized [`RecordService`][super::RecordService] client.
//!
//! The cache holds at most one binding of `(server address, token) -> client`. Lookups that
//! match the current binding only take a shared lock. A lookup for a different address or
//! token takes the exclusive lock, checks again (another caller may have rebound already),
//! then swaps the binding out in one step. The stale client is dropped exactly once, when the
//! last clone still in use by an in-flight call goes away.
use crate::error::Error;
use crate::rpc::Connector;
use tokio::sync::RwLock;

struct Binding<C> {
    addr: String,
    token: Option<String>,
    client: C,
}

impl<C: Clone> Binding<C> {
    fn matches(&self, addr: &str, token: Option<&str>) -> bool {
        self.addr == addr && self.token.as_deref() == token
    }
}

#[allow(clippy::module_name_repetitions)]
pub struct ConnectionCache<K: Connector> {
    connector: K,
    current: RwLock<Option<Binding<K::Client>>>,
}

impl<K: Connector> ConnectionCache<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            current: RwLock::new(None),
        }
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Get the client bound to `addr` and `token`, creating it (and dropping any client bound
    /// to something else) if needed. An empty token is treated as no token.
    ///
    /// # Errors
    ///
    /// Returns whatever error the [`Connector`] returns; nothing is retried.
    pub async fn client(&self, addr: &str, token: Option<&str>) -> Result<K::Client, Error> {
        let token = token.filter(|t| !t.is_empty());
        {
            let current = self.current.read().await;
            if let Some(binding) = current.as_ref().filter(|b| b.matches(addr, token)) {
                return Ok(binding.client.clone());
            }
        }

        let mut current = self.current.write().await;
        if let Some(binding) = current.as_ref().filter(|b| b.matches(addr, token)) {
            return Ok(binding.client.clone());
        }
        if let Some(stale) = current.take() {
            tracing::debug!("dropping connection to {}", stale.addr);
        }

        let client = self.connector.connect(addr, token).await?;
        tracing::debug!("connected to {addr}");
        *current = Some(Binding {
            addr: addr.to_string(),
            token: token.map(str::to_string),
            client: client.clone(),
        });
        Ok(client)
    }

    /// Drop the current binding, if any.
    pub async fn reset(&self) {
        if let Some(stale) = self.current.write().await.take() {
            tracing::debug!("dropping connection to {}", stale.addr);
        }
    }

    /// Whether a client is currently cached.
    pub async fn is_bound(&self) -> bool {
        self.current.read().await.is_some()
    }
}
