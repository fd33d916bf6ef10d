use std::net::IpAddr;
use std::sync::Arc;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::cache::Cache;

pub use file::FileProvider;

mod file;

#[cfg(test)]
pub(crate) mod fixture;


/// Stable public identifier of a fabric object.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct PubKey(pub [u8; 32]);

/// Point-in-time view of the network fabric.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users:     Vec<User>,
    #[serde(default)]
    pub devices:   Vec<Device>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub pubkey: PubKey,
    pub dz_ip:  IpAddr,
    pub device: PubKey,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub pubkey:   PubKey,
    pub code:     String,
    pub location: PubKey,
    pub exchange: PubKey,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub pubkey: PubKey,
    pub code:   String,
    #[serde(default)]
    pub name:   String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub pubkey: PubKey,
    pub code:   String,
    #[serde(default)]
    pub name:   String,
}

/// Current topology, shared between the enricher that refreshes it and
/// the annotators that read it.
pub type Topology = Arc<Cache<Snapshot>>;

#[async_trait]
pub trait TopologyProvider: Send + Sync {
    async fn snapshot(&self) -> Result<Snapshot>;
}
