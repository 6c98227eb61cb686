use crate::error::Error;
use crate::rpc::{Connector, RRset, RecordService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::Status;
use trust_dns_proto::rr::RecordType;

type RRsetKey = (String, String, RecordType);

/// An in-process [`RecordService`] holding RRsets keyed by zone, name and type. Clones share
/// the same records.
#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryRecordService {
    rrsets: Arc<RwLock<HashMap<RRsetKey, RRset>>>,
}

impl InMemoryRecordService {
    /// A snapshot of the RRset of type `rtype` for `name` in `zone`, if one exists.
    pub async fn rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Option<RRset> {
        self.rrsets
            .read()
            .await
            .get(&(zone.to_string(), name.to_string(), rtype))
            .cloned()
    }
}

#[async_trait::async_trait]
impl RecordService for InMemoryRecordService {
    async fn get_rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Result<RRset, Status> {
        self.rrset(zone, name, rtype)
            .await
            .ok_or_else(|| Status::not_found(format!("no {rtype} RRset for {name} in {zone}")))
    }

    async fn set_rrset(&self, zone: &str, rrset: RRset) -> Result<(), Status> {
        let key = (zone.to_string(), rrset.name.clone(), rrset.rtype);
        self.rrsets.write().await.insert(key, rrset);
        Ok(())
    }

    async fn delete_rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Result<(), Status> {
        let key = (zone.to_string(), name.to_string(), rtype);
        match self.rrsets.write().await.remove(&key) {
            Some(_) => Ok(()),
            None => Err(Status::not_found(format!(
                "no {rtype} RRset for {name} in {zone}"
            ))),
        }
    }
}

/// Hands out clients of one shared [`InMemoryRecordService`], counting how many connections
/// were made and remembering the last binding.
#[derive(Default, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryConnector {
    service: InMemoryRecordService,
    connects: AtomicUsize,
    last_binding: std::sync::Mutex<Option<(String, Option<String>)>>,
}

impl InMemoryConnector {
    pub fn new(service: InMemoryRecordService) -> Self {
        Self {
            service,
            ..Self::default()
        }
    }

    /// The number of clients created so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// The address and token of the most recently created client.
    pub fn last_binding(&self) -> Option<(String, Option<String>)> {
        self.last_binding
            .lock()
            .map_or(None, |binding| binding.clone())
    }
}

#[async_trait::async_trait]
impl Connector for InMemoryConnector {
    type Client = InMemoryRecordService;

    async fn connect(&self, addr: &str, token: Option<&str>) -> Result<Self::Client, Error> {
        if addr.is_empty() {
            return Err(Error::Connect {
                addr: addr.to_string(),
                reason: "empty server address".to_string(),
            });
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut binding) = self.last_binding.lock() {
            *binding = Some((addr.to_string(), token.map(str::to_string)));
        }
        Ok(self.service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::TxtRecord;

    #[tokio::test]
    async fn missing_rrset_is_not_found() {
        let service = InMemoryRecordService::default();
        let err = service
            .get_rrset("example.com.", "_acme-challenge.example.com.", RecordType::TXT)
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
        let err = service
            .delete_rrset("example.com.", "_acme-challenge.example.com.", RecordType::TXT)
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn rrsets_are_scoped_by_zone() {
        let service = InMemoryRecordService::default();
        let name = "_acme-challenge.example.com.";
        let rrset = RRset::txt(name, 60, vec![TxtRecord::new(name, 60, "abc")]);
        service.set_rrset("example.com.", rrset.clone()).await.unwrap();

        assert_eq!(
            service.get_rrset("example.com.", name, RecordType::TXT).await.unwrap(),
            rrset
        );
        assert!(service
            .get_rrset("example.org.", name, RecordType::TXT)
            .await
            .is_err());
    }
}
