use crate::api::api_error::APIError;
use crate::api::model::{ChallengePayload, ChallengeResponse};
use crate::api::server::AppState;
use crate::error::Error;
use crate::solver::Action;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/apis/:group/v1alpha1/:resource", post(solve))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn solve(
    State(state): State<AppState>,
    Path((group, resource)): Path<(String, String)>,
    WithRejection(Json(payload), _): WithRejection<Json<ChallengePayload>, APIError>,
) -> Result<Json<ChallengePayload>, APIError> {
    if group != state.config.group_name || resource != state.solver.name() {
        tracing::debug!("rejected challenge for unknown solver \"{group}/{resource}\"");
        return Err(Error::UnknownSolver { group, resource }.into());
    }
    let request = payload.request.ok_or(Error::MissingChallengeRequest)?;

    let fqdn = &request.resolved_fqdn;
    let result = match request.action {
        Action::Present => state.solver.present(&request).await,
        Action::CleanUp => state.solver.cleanup(&request).await,
    };
    let response = match result {
        Ok(()) => ChallengeResponse::success(request.uid.clone()),
        Err(err) => {
            tracing::warn!("{:?} for \"{fqdn}\" failed: {err}", request.action);
            ChallengeResponse::failure(request.uid.clone(), &err)
        }
    };
    Ok(Json(ChallengePayload::respond(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rpc::{InMemoryConnector, InMemoryRecordService};
    use crate::solver::MindnsSolver;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    const GROUP: &str = "acme.example.com";

    fn router(service: InMemoryRecordService) -> Router {
        let config = Config::default()
            .with_group_name(Some(GROUP.to_string()))
            .unwrap();
        new(AppState {
            config: Arc::new(config),
            solver: Arc::new(MindnsSolver::new(InMemoryConnector::new(service))),
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn challenge(action: &str, server_addr: &str) -> serde_json::Value {
        json!({
            "apiVersion": "acme.cert-manager.io/v1alpha1",
            "kind": "ChallengePayload",
            "request": {
                "uid": "7f1c",
                "action": action,
                "type": "dns-01",
                "dnsName": "example.com",
                "key": "token-test-key",
                "resourceNamespace": "sandbox",
                "resolvedFQDN": "_acme-challenge.example.com.",
                "resolvedZone": "example.com.",
                "config": {"serverAddr": server_addr}
            }
        })
    }

    async fn payload(response: axum::response::Response) -> ChallengePayload {
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_check_is_ok() {
        let response = router(InMemoryRecordService::default())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn present_then_cleanup() {
        let service = InMemoryRecordService::default();
        let uri = format!("/apis/{GROUP}/v1alpha1/mindns");

        let response = router(service.clone())
            .oneshot(post_json(&uri, challenge("Present", "localhost:50051")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply = payload(response).await.response.unwrap();
        assert_eq!(reply, ChallengeResponse::success("7f1c".to_string()));
        assert!(service
            .rrset(
                "example.com.",
                "_acme-challenge.example.com.",
                trust_dns_proto::rr::RecordType::TXT
            )
            .await
            .is_some());

        let response = router(service.clone())
            .oneshot(post_json(&uri, challenge("CleanUp", "localhost:50051")))
            .await
            .unwrap();
        assert!(payload(response).await.response.unwrap().success);
        assert!(service
            .rrset(
                "example.com.",
                "_acme-challenge.example.com.",
                trust_dns_proto::rr::RecordType::TXT
            )
            .await
            .is_none());
    }

    #[tokio::test]
    async fn solver_failure_is_reported_in_payload() {
        let uri = format!("/apis/{GROUP}/v1alpha1/mindns");
        let response = router(InMemoryRecordService::default())
            .oneshot(post_json(&uri, challenge("Present", "")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply = payload(response).await.response.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.uid, "7f1c");
        assert!(reply.status.unwrap().message.contains("failed to connect"));
    }

    #[tokio::test]
    async fn unknown_solver_is_not_found() {
        for uri in [
            "/apis/other.example.com/v1alpha1/mindns",
            "/apis/acme.example.com/v1alpha1/cloudflare",
        ] {
            let response = router(InMemoryRecordService::default())
                .oneshot(post_json(uri, challenge("Present", "localhost:50051")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn bad_payloads_are_rejected() {
        let uri = format!("/apis/{GROUP}/v1alpha1/mindns");
        let cases = [
            (
                post_json(&uri, json!({"kind": "ChallengePayload"})),
                StatusCode::BAD_REQUEST,
            ),
            (
                post_json(&uri, json!({"request": {"action": "Explode"}})),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                Request::post(&uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{invalid"))
                    .unwrap(),
                StatusCode::BAD_REQUEST,
            ),
            (
                Request::post(&uri).body(Body::from("{}")).unwrap(),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
        ];
        for (request, want) in cases {
            let response = router(InMemoryRecordService::default())
                .oneshot(request)
                .await
                .unwrap();
            assert_eq!(response.status(), want);
            let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(body["error"].is_string(), "{body}");
        }
    }
}
