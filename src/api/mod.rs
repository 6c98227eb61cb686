//! HTTP API cert-manager calls the solver through.
//!
//! # API Endpoints
//!
//! ## `/healthz` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/apis/{group}/v1alpha1/{solver}` (POST)
//!
//!   Expects a cert-manager `ChallengePayload` JSON request body of the form:
//!
//!   ```json
//!   {
//!     "apiVersion": "acme.cert-manager.io/v1alpha1",
//!     "kind": "ChallengePayload",
//!     "request": {
//!       "uid": "7f1c...",
//!       "action": "Present",
//!       "type": "dns-01",
//!       "dnsName": "example.com",
//!       "key": "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX",
//!       "resourceNamespace": "cert-manager",
//!       "resolvedFQDN": "_acme-challenge.example.com.",
//!       "resolvedZone": "example.com.",
//!       "config": { "serverAddr": "mindns.default.svc:50051" }
//!     }
//!   }
//!   ```
//!
//!  Where `group` is the `GROUP_NAME` the webhook was started with, `solver` is
//!  [`SOLVER_NAME`][crate::solver::SOLVER_NAME] and `action` is either `Present` or `CleanUp`.
//!  Any other group or solver returns HTTP 404 (Not Found).
//!
//!  Returns HTTP 200 (OK) once the challenge has been handled, with the outcome in the
//!  `response` of the returned payload:
//!
//!  ```json
//!  {
//!    "apiVersion": "acme.cert-manager.io/v1alpha1",
//!    "kind": "ChallengePayload",
//!    "response": { "uid": "7f1c...", "success": false, "status": { "message": "..." } }
//!  }
//!  ```
//!
//!  The API is plain HTTP. Serving it to the Kubernetes API server (TLS, aggregated API
//!  authentication) is left to the deployment.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
