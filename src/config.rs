use crate::error::Error;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

/// Environment variable naming the API group the webhook is registered under.
pub const GROUP_NAME_ENV: &str = "GROUP_NAME";

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub group_name: String,
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub rpc_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            api_bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8443),
            api_timeout: Duration::from_secs(30),
            rpc_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        Ok(conf)
    }

    /// Set the group name the webhook serves. An unset or empty value is fatal: the host
    /// can't route any challenge to a solver without one.
    pub fn with_group_name(mut self, group_name: Option<String>) -> Result<Self, Error> {
        match group_name {
            Some(group_name) if !group_name.is_empty() => {
                self.group_name = group_name;
                Ok(self)
            }
            _ => Err(Error::MissingGroupName),
        }
    }
}
