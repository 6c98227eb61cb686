//! The DNS-01 solver.
//!
//! [`MindnsSolver`] publishes challenge TXT records by editing the TXT RRset for the challenge
//! name on a mindns server:
//!
//! * **Present** fetches the RRset (a missing RRset counts as empty). If a record already
//!   carries the challenge key nothing is written. Otherwise a record with the key as its only
//!   value and a TTL of 60 seconds is appended and the whole RRset written back.
//! * **CleanUp** fetches the RRset and drops every record carrying the key. What's left is
//!   written back, or the RRset is deleted if nothing is left. A failed fetch means there's
//!   nothing to clean up.
//!
//! Each RPC gets its own timeout and nothing is retried: cert-manager schedules retries.
//! Operations on the same name are serialized within a solver, but not across processes; two
//! solvers editing the same RRset at once can still lose an update.

use crate::error::Error;
use crate::rpc::{ConnectionCache, Connector, GrpcConnector, RRset, RecordService};
use crate::secret_store::{DynSecretStore, KubeSecretStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use trust_dns_proto::rr::{Name, RecordType};

pub mod challenge;
pub mod config;
pub mod reconcile;

pub use challenge::{Action, ChallengeRequest};
pub use config::{SolverConfig, TOKEN_ENV};

use reconcile::{NameLocks, CHALLENGE_TTL};

/// Name the solver is registered under in `Issuer` webhook configurations.
pub const SOLVER_NAME: &str = "mindns";

/// Default timeout for each RPC made while handling a challenge.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// `DynSolver` is a type alias for a [`Solver`] shared with the webhook API.
pub type DynSolver = Arc<dyn Solver + Send + Sync>;

/// The lifecycle cert-manager drives a DNS-01 solver through.
#[async_trait::async_trait]
pub trait Solver: Send + Sync {
    /// The name `Issuer` resources use to select this solver.
    fn name(&self) -> &'static str;

    /// Called once when the webhook starts. `kube` is a client for the host's Kubernetes
    /// cluster, if it has one. `stop` flips to `true` when the webhook shuts down.
    async fn initialize(
        &self,
        kube: Option<kube::Client>,
        stop: watch::Receiver<bool>,
    ) -> Result<(), Error>;

    /// Publish the TXT record for `challenge`.
    async fn present(&self, challenge: &ChallengeRequest) -> Result<(), Error>;

    /// Remove the TXT record for `challenge`.
    async fn cleanup(&self, challenge: &ChallengeRequest) -> Result<(), Error>;
}

pub struct MindnsSolver<K: Connector = GrpcConnector> {
    connections: Arc<ConnectionCache<K>>,
    secrets: RwLock<Option<DynSecretStore>>,
    locks: NameLocks,
    rpc_timeout: Duration,
}

impl Default for MindnsSolver {
    fn default() -> Self {
        Self::new(GrpcConnector)
    }
}

/// Where a challenge record lives, and who to ask about it.
struct Target<C> {
    client: C,
    zone: String,
    name: String,
}

impl<K: Connector> MindnsSolver<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connections: Arc::new(ConnectionCache::new(connector)),
            secrets: RwLock::new(None),
            locks: NameLocks::default(),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Use `secrets` to resolve `tokenSecretRef`s, in place of whatever
    /// [`Solver::initialize`] set up.
    pub async fn set_secret_store(&self, secrets: DynSecretStore) {
        *self.secrets.write().await = Some(secrets);
    }

    pub fn connections(&self) -> &ConnectionCache<K> {
        &self.connections
    }

    async fn target(&self, challenge: &ChallengeRequest) -> Result<Target<K::Client>, Error> {
        let config = SolverConfig::load(challenge.config.as_ref())?;
        let name = fqdn(&challenge.resolved_fqdn)?;
        let token = {
            let secrets = self.secrets.read().await;
            config
                .resolve_token(
                    &challenge.resource_namespace,
                    secrets.as_ref(),
                    std::env::var(TOKEN_ENV).ok(),
                )
                .await?
        };
        let client = self
            .connections
            .client(&config.server_addr, token.as_deref())
            .await?;
        Ok(Target {
            client,
            zone: config.zone_for(&challenge.resolved_zone),
            name,
        })
    }

    async fn timed<T, F>(
        &self,
        op: &'static str,
        call: F,
    ) -> Result<Result<T, tonic::Status>, Error>
    where
        F: std::future::Future<Output = Result<T, tonic::Status>>,
    {
        tokio::time::timeout(self.rpc_timeout, call)
            .await
            .map_err(|_| Error::Timeout {
                op,
                after: self.rpc_timeout,
            })
    }
}

fn fqdn(resolved_fqdn: &str) -> Result<String, Error> {
    match Name::from_ascii(resolved_fqdn) {
        Ok(name) if name.is_fqdn() && !name.is_root() => Ok(resolved_fqdn.to_string()),
        _ => Err(Error::NotFQDN(resolved_fqdn.to_string())),
    }
}

#[async_trait::async_trait]
impl<K: Connector> Solver for MindnsSolver<K>
where
    K: 'static,
{
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn initialize(
        &self,
        kube: Option<kube::Client>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), Error> {
        if let Some(kube) = kube {
            tracing::info!("resolving token secrets through the Kubernetes API");
            self.set_secret_store(Arc::new(KubeSecretStore::new(kube)))
                .await;
        }

        let connections = self.connections.clone();
        tokio::spawn(async move {
            let _ = stop.wait_for(|stopped| *stopped).await;
            connections.reset().await;
        });
        Ok(())
    }

    async fn present(&self, challenge: &ChallengeRequest) -> Result<(), Error> {
        let Target { client, zone, name } = self.target(challenge).await?;
        let _guard = self.locks.lock(&zone, &name).await;

        let existing = match self
            .timed("GetRRset", client.get_rrset(&zone, &name, RecordType::TXT))
            .await?
        {
            Ok(rrset) => rrset.records,
            Err(status) if status.code() == tonic::Code::NotFound => Vec::new(),
            Err(status) => return Err(Error::Fetch(status)),
        };

        let Some(records) = reconcile::merge(existing, &name, &challenge.key) else {
            tracing::debug!("TXT record for \"{name}\" already present");
            return Ok(());
        };

        let rrset = RRset::txt(name.as_str(), CHALLENGE_TTL, records);
        self.timed("SetRRset", client.set_rrset(&zone, rrset))
            .await?
            .map_err(Error::Write)?;
        tracing::info!("presented TXT record for \"{name}\" in zone \"{zone}\"");
        Ok(())
    }

    async fn cleanup(&self, challenge: &ChallengeRequest) -> Result<(), Error> {
        let Target { client, zone, name } = self.target(challenge).await?;
        let _guard = self.locks.lock(&zone, &name).await;

        let existing = match self
            .timed("GetRRset", client.get_rrset(&zone, &name, RecordType::TXT))
            .await
        {
            Ok(Ok(rrset)) => rrset.records,
            Ok(Err(status)) if status.code() == tonic::Code::NotFound => {
                tracing::debug!("no TXT records for \"{name}\", nothing to clean up");
                return Ok(());
            }
            Ok(Err(status)) => {
                tracing::warn!("skipping clean up of \"{name}\": {status}");
                return Ok(());
            }
            Err(err) => {
                tracing::warn!("skipping clean up of \"{name}\": {err}");
                return Ok(());
            }
        };

        let (ours, remaining) = reconcile::partition(existing, &challenge.key);
        if remaining.is_empty() {
            self.timed("DeleteRRset", client.delete_rrset(&zone, &name, RecordType::TXT))
                .await?
                .map_err(Error::Delete)?;
        } else {
            let rrset = RRset::txt(name.as_str(), CHALLENGE_TTL, remaining);
            self.timed("SetRRset", client.set_rrset(&zone, rrset))
                .await?
                .map_err(Error::Write)?;
        }
        tracing::info!(
            "cleaned up {} TXT record(s) for \"{name}\" in zone \"{zone}\"",
            ours.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_names_must_be_fully_qualified() {
        assert_eq!(
            fqdn("_acme-challenge.example.com.").unwrap(),
            "_acme-challenge.example.com."
        );
        assert!(matches!(
            fqdn("_acme-challenge.example.com"),
            Err(Error::NotFQDN(_))
        ));
        assert!(matches!(fqdn(""), Err(Error::NotFQDN(_))));
        assert!(matches!(fqdn("."), Err(Error::NotFQDN(_))));
    }

    #[test]
    fn solver_name() {
        assert_eq!(MindnsSolver::<GrpcConnector>::default().name(), "mindns");
    }
}
