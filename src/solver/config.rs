//! Per-issuer solver configuration.
//!
//! Users configure the solver in their `Issuer`/`ClusterIssuer` webhook config:
//!
//! ```json
//! {
//!   "serverAddr": "mindns.default.svc:50051",
//!   "zone": "example.com.",
//!   "tokenSecretRef": { "name": "mindns-token", "key": "token" }
//! }
//! ```
//!
//! Only `serverAddr` is needed. Without `zone` the zone cert-manager resolved for the
//! challenge is used. The bearer token is taken from `token`, then from the secret named by
//! `tokenSecretRef` (in the challenge's resource namespace), then from the `MINDNS_TOKEN`
//! environment variable.
use crate::error::Error;
use crate::secret_store::DynSecretStore;
use serde::Deserialize;

/// Environment variable holding the fallback bearer token.
pub const TOKEN_ENV: &str = "MINDNS_TOKEN";

const DEFAULT_SECRET_KEY: &str = "token";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    /// Address of the mindns gRPC server, e.g. `mindns.default.svc:50051`.
    #[serde(default)]
    pub server_addr: String,
    /// DNS zone to manage, e.g. `example.com.`.
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_secret_ref: Option<SecretKeySelector>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretKeySelector {
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl SecretKeySelector {
    pub fn key(&self) -> &str {
        self.key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_SECRET_KEY)
    }
}

impl SolverConfig {
    /// Decode the solver configuration. An absent or `null` payload yields the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigDecode`] if the payload doesn't have the expected shape.
    pub fn load(raw: Option<&serde_json::Value>) -> Result<Self, Error> {
        match raw {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(raw) => Self::deserialize(raw).map_err(Error::ConfigDecode),
        }
    }

    /// The zone to write records in: the configured zone if set, else `resolved_zone`.
    pub fn zone_for(&self, resolved_zone: &str) -> String {
        match self.zone.as_deref() {
            Some(zone) if !zone.is_empty() => zone.to_string(),
            _ => extract_zone(resolved_zone),
        }
    }

    /// Resolve the bearer token for a challenge in `namespace`. `env_token` is the value of
    /// [`TOKEN_ENV`], if set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SecretStoreUnavailable`] if a `tokenSecretRef` is configured without a
    /// secret store, or whatever the store returns if the lookup fails.
    pub async fn resolve_token(
        &self,
        namespace: &str,
        secrets: Option<&DynSecretStore>,
        env_token: Option<String>,
    ) -> Result<Option<String>, Error> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Some(token.clone()));
        }
        if let Some(selector) = &self.token_secret_ref {
            let secrets = secrets.ok_or(Error::SecretStoreUnavailable)?;
            let token = secrets
                .get_secret(namespace, &selector.name, selector.key())
                .await?;
            return Ok(Some(token));
        }
        Ok(env_token.filter(|t| !t.is_empty()))
    }
}

/// Ensure `resolved_zone` ends with exactly the one trailing dot of a fully qualified name.
pub fn extract_zone(resolved_zone: &str) -> String {
    if resolved_zone.ends_with('.') {
        resolved_zone.to_string()
    } else {
        format!("{resolved_zone}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_store::InMemorySecretStore;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn load_config() {
        let cases = [
            (None, Some(SolverConfig::default())),
            (Some(json!(null)), Some(SolverConfig::default())),
            (Some(json!({})), Some(SolverConfig::default())),
            (
                Some(json!({"serverAddr": "mindns.default.svc:50051", "zone": "example.com."})),
                Some(SolverConfig {
                    server_addr: "mindns.default.svc:50051".to_string(),
                    zone: Some("example.com.".to_string()),
                    ..SolverConfig::default()
                }),
            ),
            (
                Some(json!({"serverAddr": "localhost:50051"})),
                Some(SolverConfig {
                    server_addr: "localhost:50051".to_string(),
                    ..SolverConfig::default()
                }),
            ),
            (
                Some(json!({
                    "serverAddr": "localhost:50051",
                    "token": "t",
                    "tokenSecretRef": {"name": "mindns-token", "key": "bearer"}
                })),
                Some(SolverConfig {
                    server_addr: "localhost:50051".to_string(),
                    token: Some("t".to_string()),
                    token_secret_ref: Some(SecretKeySelector {
                        name: "mindns-token".to_string(),
                        key: Some("bearer".to_string()),
                    }),
                    ..SolverConfig::default()
                }),
            ),
            (Some(json!({"serverAddr": 50051})), None),
            (Some(json!("{invalid}")), None),
            (Some(json!({"tokenSecretRef": {"key": "token"}})), None),
        ];

        for (raw, want) in cases {
            let got = SolverConfig::load(raw.as_ref());
            match want {
                Some(want) => assert_eq!(got.unwrap(), want, "payload {raw:?}"),
                None => assert!(
                    matches!(got, Err(Error::ConfigDecode(_))),
                    "payload {raw:?}"
                ),
            }
        }
    }

    #[test]
    fn zone_normalization() {
        assert_eq!(extract_zone("example.com."), "example.com.");
        assert_eq!(extract_zone("example.com"), "example.com.");
        assert_eq!(extract_zone("sub.example.com."), "sub.example.com.");
    }

    #[test]
    fn zone_override_wins() {
        let config = SolverConfig {
            zone: Some("example.org.".to_string()),
            ..SolverConfig::default()
        };
        assert_eq!(config.zone_for("example.com"), "example.org.");
        let config = SolverConfig {
            zone: Some(String::new()),
            ..SolverConfig::default()
        };
        assert_eq!(config.zone_for("example.com"), "example.com.");
    }

    fn store() -> DynSecretStore {
        Arc::new(InMemorySecretStore::default().with_secret(
            "sandbox",
            "mindns-token",
            "token",
            "from-secret",
        ))
    }

    #[tokio::test]
    async fn config_token_comes_first() {
        let config = SolverConfig {
            token: Some("from-config".to_string()),
            token_secret_ref: Some(SecretKeySelector {
                name: "mindns-token".to_string(),
                key: None,
            }),
            ..SolverConfig::default()
        };
        let token = config
            .resolve_token("sandbox", Some(&store()), Some("from-env".to_string()))
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("from-config"));
    }

    #[tokio::test]
    async fn secret_ref_beats_environment() {
        let config = SolverConfig {
            token: Some(String::new()),
            token_secret_ref: Some(SecretKeySelector {
                name: "mindns-token".to_string(),
                key: None,
            }),
            ..SolverConfig::default()
        };
        let token = config
            .resolve_token("sandbox", Some(&store()), Some("from-env".to_string()))
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("from-secret"));
    }

    #[tokio::test]
    async fn environment_is_the_fallback() {
        let config = SolverConfig::default();
        let token = config
            .resolve_token("sandbox", None, Some("from-env".to_string()))
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("from-env"));
        let token = config
            .resolve_token("sandbox", None, Some(String::new()))
            .await
            .unwrap();
        assert_eq!(token, None);
    }

    #[tokio::test]
    async fn unresolvable_secret_ref_fails() {
        let config = SolverConfig {
            token_secret_ref: Some(SecretKeySelector {
                name: "nonexistent".to_string(),
                key: None,
            }),
            ..SolverConfig::default()
        };
        assert!(matches!(
            config
                .resolve_token("sandbox", Some(&store()), Some("from-env".to_string()))
                .await,
            Err(Error::MissingSecret { .. })
        ));
        assert!(matches!(
            config.resolve_token("sandbox", None, None).await,
            Err(Error::SecretStoreUnavailable)
        ));
    }
}
