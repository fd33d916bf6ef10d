use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use tokio_util::sync::CancellationToken;
use crate::cache::Cache;
use crate::flow::FlowSample;
use crate::metrics::Metrics;
use crate::refresh;
use crate::topology::{Device, Exchange, Location, PubKey, Snapshot, Topology, User};
use super::Annotator;

/// Resolves source and destination addresses to the device, location
/// and exchange codes of the user they are assigned to.
pub struct TopologyAnnotator {
    topology: Topology,
    interval: Duration,
    metrics:  Arc<Metrics>,
    maps:     Arc<Cache<Maps>>,
}

#[derive(Debug, Default)]
struct Maps {
    snapshot:  Arc<Snapshot>,
    users:     HashMap<IpAddr, User>,
    devices:   HashMap<PubKey, Device>,
    locations: HashMap<PubKey, Location>,
    exchanges: HashMap<PubKey, Exchange>,
}

#[derive(Debug, Default)]
struct Codes<'a> {
    device:   &'a str,
    location: &'a str,
    exchange: &'a str,
}

impl TopologyAnnotator {
    pub fn new(topology: Topology, metrics: Arc<Metrics>) -> Self {
        Self {
            topology: topology,
            interval: Duration::from_secs(10),
            metrics:  metrics,
            maps:     Arc::new(Cache::default()),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn refresh(topology: &Topology, maps: &Cache<Maps>) -> Result<()> {
        let snapshot = topology.load();
        if Arc::ptr_eq(&maps.load().snapshot, &snapshot) {
            return Ok(());
        }

        let built = Maps::build(snapshot);
        debug!("topology maps: {} addresses, {} devices", built.users.len(), built.devices.len());
        maps.store(built);
        Ok(())
    }

    /// Maps for the snapshot currently stored, rebuilt first if the
    /// snapshot was replaced since they were built.
    fn maps(&self) -> Result<Arc<Maps>> {
        Self::refresh(&self.topology, &self.maps)?;
        Ok(self.maps.load())
    }
}

impl Maps {
    fn build(snapshot: Arc<Snapshot>) -> Self {
        let users = snapshot.users.iter().map(|u| {
            (u.dz_ip, u.clone())
        }).collect();

        let devices = snapshot.devices.iter().map(|d| {
            (d.pubkey, d.clone())
        }).collect();

        let locations = snapshot.locations.iter().map(|l| {
            (l.pubkey, l.clone())
        }).collect();

        let exchanges = snapshot.exchanges.iter().map(|x| {
            (x.pubkey, x.clone())
        }).collect();

        Self { snapshot, users, devices, locations, exchanges }
    }

    fn resolve(&self, addr: Option<IpAddr>) -> Codes<'_> {
        let mut codes = Codes::default();

        let device = match addr.and_then(|a| self.users.get(&a)) {
            Some(user) => self.devices.get(&user.device),
            None       => None,
        };

        if let Some(device) = device {
            codes.device = &device.code;
            if let Some(location) = self.locations.get(&device.location) {
                codes.location = &location.code;
            }
            if let Some(exchange) = self.exchanges.get(&device.exchange) {
                codes.exchange = &exchange.code;
            }
        }

        codes
    }
}

#[async_trait]
impl Annotator for TopologyAnnotator {
    fn name(&self) -> &str {
        "topology"
    }

    async fn init(&self, shutdown: CancellationToken) -> Result<()> {
        Self::refresh(&self.topology, &self.maps)?;

        let topology = self.topology.clone();
        let maps     = self.maps.clone();
        let metrics  = self.metrics.clone();

        refresh::spawn(self.name().to_owned(), self.interval, shutdown, move || {
            metrics.refresh_errors.inc();
        }, move || {
            let result = Self::refresh(&topology, &maps);
            async move { result }
        });

        Ok(())
    }

    fn annotate(&self, s: &mut FlowSample) -> Result<()> {
        let maps = self.maps()?;

        let src = maps.resolve(s.src_addr);
        s.src_device_code = src.device.to_owned();
        s.src_location    = src.location.to_owned();
        s.src_exchange    = src.exchange.to_owned();

        let dst = maps.resolve(s.dst_addr);
        s.dst_device_code = dst.device.to_owned();
        s.dst_location    = dst.location.to_owned();
        s.dst_exchange    = dst.exchange.to_owned();

        Ok(())
    }
}
