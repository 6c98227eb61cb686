//! A gRPC implementation of the [`RecordService`][super::RecordService] trait.
//!
//! Channels are plaintext and established lazily: creating a client never dials the server,
//! the first call does. When a bearer token is configured it is attached to every call as
//! `authorization: Bearer <token>` metadata.
use crate::error::Error;
use crate::rpc::proto::{self, wire_type};
use crate::rpc::{Connector, RRset, RecordService};
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::{InterceptedService, StdError};
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use trust_dns_proto::rr::RecordType;

const AUTHORIZATION: &str = "authorization";

/// Attaches an optional bearer token to outgoing requests.
#[derive(Debug, Clone, Default)]
pub struct BearerAuth {
    header: Option<AsciiMetadataValue>,
}

impl BearerAuth {
    /// Build an interceptor for `token`. An absent or empty token attaches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if the token can't be carried in a metadata value.
    pub fn new(token: Option<&str>) -> Result<Self, Error> {
        let header = match token {
            Some(token) if !token.is_empty() => Some(
                format!("Bearer {token}")
                    .parse::<AsciiMetadataValue>()
                    .map_err(|_| Error::InvalidToken)?,
            ),
            _ => None,
        };
        Ok(Self { header })
    }
}

impl Interceptor for BearerAuth {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(header) = &self.header {
            request.metadata_mut().insert(AUTHORIZATION, header.clone());
        }
        Ok(request)
    }
}

type AuthChannel = InterceptedService<Channel, BearerAuth>;

/// A mindns client over a shared tonic [`Channel`]. Cloning is cheap and clones share the
/// underlying connection.
#[derive(Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct GrpcRecordService {
    inner: Grpc<AuthChannel>,
}

impl GrpcRecordService {
    /// Create a lazily connecting client for `addr`. Addresses without a scheme are treated
    /// as `http://` authorities, e.g. `mindns.default.svc:50051`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if `addr` isn't a valid endpoint URI, or
    /// [`Error::InvalidToken`] if `token` can't be sent as metadata.
    pub fn connect_lazy(addr: &str, token: Option<&str>) -> Result<Self, Error> {
        let auth = BearerAuth::new(token)?;
        let channel = Endpoint::from_shared(endpoint_uri(addr))
            .map_err(|err| Error::Connect {
                addr: addr.to_string(),
                reason: err.to_string(),
            })?
            .connect_lazy();
        tracing::debug!("created {} client for {addr}", proto::SERVICE_NAME);
        Ok(Self {
            inner: Grpc::new(InterceptedService::new(channel, auth)),
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, message: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready().await.map_err(|err| {
            let err: StdError = err.into();
            Status::unavailable(format!("service was not ready: {err}"))
        })?;
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(Request::new(message), PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

fn endpoint_uri(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

#[async_trait::async_trait]
impl RecordService for GrpcRecordService {
    async fn get_rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Result<RRset, Status> {
        let request = proto::GetRRsetRequest {
            zone: zone.to_string(),
            name: name.to_string(),
            r#type: wire_type(rtype),
        };
        let rrset: proto::RRset = self.unary(proto::GET_RRSET_PATH, request).await?;
        Ok(rrset.into())
    }

    async fn set_rrset(&self, zone: &str, rrset: RRset) -> Result<(), Status> {
        let request = proto::SetRRsetRequest {
            zone: zone.to_string(),
            rrset: Some(proto::RRset::from(&rrset)),
        };
        let _: proto::SetRRsetResponse = self.unary(proto::SET_RRSET_PATH, request).await?;
        Ok(())
    }

    async fn delete_rrset(&self, zone: &str, name: &str, rtype: RecordType) -> Result<(), Status> {
        let request = proto::DeleteRRsetRequest {
            zone: zone.to_string(),
            name: name.to_string(),
            r#type: wire_type(rtype),
        };
        let _: proto::DeleteRRsetResponse = self.unary(proto::DELETE_RRSET_PATH, request).await?;
        Ok(())
    }
}

/// Creates [`GrpcRecordService`] clients.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct GrpcConnector;

#[async_trait::async_trait]
impl Connector for GrpcConnector {
    type Client = GrpcRecordService;

    async fn connect(&self, addr: &str, token: Option<&str>) -> Result<Self::Client, Error> {
        GrpcRecordService::connect_lazy(addr, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_attached() {
        let mut auth = BearerAuth::new(Some("s3cret")).unwrap();
        let request = auth.call(Request::new(())).unwrap();
        let header = request.metadata().get(AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer s3cret");
    }

    #[test]
    fn empty_token_attaches_nothing() {
        for token in [None, Some("")] {
            let mut auth = BearerAuth::new(token).unwrap();
            let request = auth.call(Request::new(())).unwrap();
            assert!(request.metadata().get(AUTHORIZATION).is_none());
        }
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(matches!(
            BearerAuth::new(Some("bad\ntoken")),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn bare_address_gets_http_scheme() {
        assert_eq!(
            endpoint_uri("mindns.default.svc:50051"),
            "http://mindns.default.svc:50051"
        );
        assert_eq!(endpoint_uri("http://127.0.0.1:50051"), "http://127.0.0.1:50051");
    }

    #[tokio::test]
    async fn connect_does_not_dial() {
        // Nothing listens here; a lazy channel must still be created.
        assert!(GrpcConnector
            .connect("127.0.0.1:9", Some("token"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn invalid_address_fails_to_connect() {
        assert!(matches!(
            GrpcConnector.connect("not a uri", None).await,
            Err(Error::Connect { .. })
        ));
    }
}
