//! mindns solver
//!
//! A [cert-manager] webhook solving [RFC-8555][RFC-8555] [DNS-01] challenges by publishing
//! TXT records on a [mindns] authoritative DNS server through its gRPC management API.
//!
//! cert-manager hands the webhook a challenge to present or clean up; the
//! [solver][crate::solver] edits the TXT RRset for the challenge name on the mindns server
//! configured in the issuer, authenticating with an optional bearer token.
//!
//! [cert-manager]: https://cert-manager.io
//! [mindns]: https://github.com/greatliontech/mindns
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod error;
pub mod rpc;
pub mod secret_store;
pub mod solver;

pub use api::new as new_http;
pub use config::{Config, SharedConfig};
pub use solver::{MindnsSolver, Solver};
