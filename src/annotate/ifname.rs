use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clickhouse::{Client, Row};
use clickhouse::sql::Identifier;
use log::{debug, warn};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use crate::cache::Cache;
use crate::flow::FlowSample;
use crate::metrics::Metrics;
use crate::refresh;
use super::Annotator;

/// One observation of an interface name on a device.
#[derive(Clone, Debug, PartialEq, Row, Deserialize)]
pub struct IfName {
    pub device_ip: String,
    pub ifindex:   u32,
    pub name:      String,
    pub last_seen: u32,
}

#[async_trait]
pub trait IfNameSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<IfName>>;
}

/// Interface names from the latest row per (device, index) of a
/// ClickHouse reference table.
pub struct ClickhouseIfNames {
    client: Client,
    table:  String,
}

impl ClickhouseIfNames {
    pub fn new(client: Client, table: String) -> Self {
        Self { client, table }
    }
}

#[async_trait]
impl IfNameSource for ClickhouseIfNames {
    async fn fetch(&self) -> Result<Vec<IfName>> {
        let query = "
            SELECT device_ip, ifindex, argMax(ifname, timestamp) AS name, max(timestamp) AS last_seen
            FROM ?
            GROUP BY device_ip, ifindex
        ";

        let rows = self.client.query(query)
            .bind(Identifier(&self.table))
            .fetch_all::<IfName>()
            .await?;

        Ok(rows)
    }
}

pub(super) type Names = HashMap<(IpAddr, u32), IfName>;

/// Resolves ingress and egress interface indices to names using the
/// sampler address as the device key.
pub struct InterfaceNameAnnotator {
    source:   Arc<dyn IfNameSource>,
    interval: Duration,
    metrics:  Arc<Metrics>,
    names:    Arc<Cache<Names>>,
}

impl InterfaceNameAnnotator {
    pub fn new(source: Arc<dyn IfNameSource>, metrics: Arc<Metrics>) -> Self {
        Self {
            source:   source,
            interval: Duration::from_secs(60),
            metrics:  metrics,
            names:    Arc::new(Cache::default()),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    async fn refresh(source: &dyn IfNameSource, names: &Cache<Names>) -> Result<()> {
        let rows = source.fetch().await?;
        if rows.is_empty() {
            return Err(anyhow!("no interface names returned"));
        }

        let built = build(rows);
        debug!("loaded {} interface names", built.len());
        names.store(built);

        Ok(())
    }
}

pub(super) fn build(rows: Vec<IfName>) -> Names {
    let mut names = HashMap::new();

    for row in rows {
        let addr = match row.device_ip.parse::<IpAddr>() {
            Ok(addr) => addr,
            Err(e)   => {
                warn!("invalid device address {:?}: {}", row.device_ip, e);
                continue;
            }
        };

        match names.entry((addr, row.ifindex)) {
            Entry::Occupied(mut e) => {
                let cur: &mut IfName = e.get_mut();
                if row.last_seen >= cur.last_seen {
                    *cur = row;
                }
            },
            Entry::Vacant(e) => {
                e.insert(row);
            },
        }
    }

    names
}

#[async_trait]
impl Annotator for InterfaceNameAnnotator {
    fn name(&self) -> &str {
        "ifname"
    }

    async fn init(&self, shutdown: CancellationToken) -> Result<()> {
        Self::refresh(self.source.as_ref(), &self.names).await?;

        let source  = self.source.clone();
        let names   = self.names.clone();
        let metrics = self.metrics.clone();

        refresh::spawn(self.name().to_owned(), self.interval, shutdown, move || {
            metrics.refresh_errors.inc();
        }, move || {
            let source = source.clone();
            let names  = names.clone();
            async move {
                Self::refresh(source.as_ref(), &names).await
            }
        });

        Ok(())
    }

    fn annotate(&self, s: &mut FlowSample) -> Result<()> {
        if s.in_if == 0 && s.out_if == 0 {
            return Ok(());
        }

        let sampler = s.sampler_address.ok_or_else(|| anyhow!("missing sampler address"))?;
        let names   = self.names.load();

        let lookup = |index: u32| match index {
            0     => String::new(),
            index => names.get(&(sampler, index)).map(|n| n.name.clone()).unwrap_or_default(),
        };

        s.in_ifname  = lookup(s.in_if);
        s.out_ifname = lookup(s.out_if);

        Ok(())
    }
}
