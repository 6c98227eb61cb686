//! Typed access to the mindns record management service.
//!
//! The solver only ever reads and writes whole RRsets: it fetches the TXT RRset for a
//! challenge name, edits the record list locally, and writes the result back with a single
//! [`RecordService::set_rrset`] (or removes it with [`RecordService::delete_rrset`]).
//!
//! Two [`RecordService`] implementations are provided. [`grpc::GrpcRecordService`] talks to a
//! remote mindns server. [`memory::InMemoryRecordService`] keeps RRsets in process and is
//! useful for tests and local experiments.

use crate::error::Error;
use tonic::Status;
use trust_dns_proto::rr::RecordType;

pub mod cache;
pub mod grpc;
pub mod memory;
pub mod proto;

pub use cache::ConnectionCache;
pub use grpc::{GrpcConnector, GrpcRecordService};
pub use memory::{InMemoryConnector, InMemoryRecordService};

/// A single TXT record: an owner name, a TTL, and one or more text values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxtRecord {
    pub name: String,
    pub ttl: u32,
    pub values: Vec<String>,
}

impl TxtRecord {
    pub fn new(name: impl Into<String>, ttl: u32, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl,
            values: vec![value.into()],
        }
    }

    /// Whether `value` is one of this record's text values.
    pub fn carries(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// The records sharing a name and type. Only TXT records are modelled; records of any other
/// kind returned by the server are dropped when decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRset {
    pub name: String,
    pub rtype: RecordType,
    pub ttl: u32,
    pub records: Vec<TxtRecord>,
}

impl RRset {
    pub fn txt(name: impl Into<String>, ttl: u32, records: Vec<TxtRecord>) -> Self {
        Self {
            name: name.into(),
            rtype: RecordType::TXT,
            ttl,
            records,
        }
    }
}

/// An async trait describing the three RRset operations the solver needs from the remote DNS
/// management service. Errors are reported as gRPC [`Status`] values so callers can tell
/// `NOT_FOUND` apart from other failures.
#[async_trait::async_trait]
pub trait RecordService: Send + Sync {
    /// Get the RRset of type `rtype` for `name` in `zone`.
    async fn get_rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Result<RRset, Status>;

    /// Replace the RRset matching `rrset`'s name and type in `zone`.
    async fn set_rrset(&self, zone: &str, rrset: RRset) -> Result<(), Status>;

    /// Delete the RRset of type `rtype` for `name` in `zone`.
    async fn delete_rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Result<(), Status>;
}

/// Creates [`RecordService`] clients bound to a server address and an optional bearer token.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Client: RecordService + Clone + Send + Sync + 'static;

    /// Create a client for `addr`, attaching `token` to every call when present.
    async fn connect(&self, addr: &str, token: Option<&str>) -> Result<Self::Client, Error>;
}
