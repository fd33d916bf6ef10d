use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use pcap::{Capture, Linktype};
use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::udp::UdpPacket;
use crate::flow::{self, FlowSample};
use crate::metrics::Metrics;
use super::RecordSource;

// DLT_RAW (12 or 14), LINKTYPE_RAW, LINKTYPE_IPV4, LINKTYPE_IPV6
const RAW_LINKTYPES: [i32; 5] = [12, 14, 101, 228, 229];

/// Flow samples from the UDP payloads of a pcap capture. The whole file
/// is delivered as a single batch.
pub struct ReplaySource {
    path:    PathBuf,
    metrics: Arc<Metrics>,
    batch:   Option<Vec<FlowSample>>,
    done:    bool,
}

impl ReplaySource {
    pub fn new<P: Into<PathBuf>>(path: P, metrics: Arc<Metrics>) -> Self {
        Self {
            path:    path.into(),
            metrics: metrics,
            batch:   None,
            done:    false,
        }
    }
}

#[async_trait]
impl RecordSource for ReplaySource {
    async fn consume(&mut self) -> Result<Option<Vec<FlowSample>>> {
        if self.done {
            return Ok(None);
        }

        let batch = match &self.batch {
            Some(batch) => batch.clone(),
            None        => {
                let path    = self.path.clone();
                let metrics = self.metrics.clone();
                let batch   = tokio::task::spawn_blocking(move || {
                    read(&path, &metrics)
                }).await??;
                info!("replaying {} samples from {}", batch.len(), self.path.display());
                self.batch = Some(batch.clone());
                batch
            }
        };

        self.done = true;

        Ok(Some(batch))
    }

    async fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    async fn rewind(&mut self) -> Result<()> {
        self.done = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.batch = None;
        Ok(())
    }
}

fn read(path: &Path, metrics: &Metrics) -> Result<Vec<FlowSample>> {
    let mut cap = Capture::from_file(path).with_context(|| {
        format!("opening capture {}", path.display())
    })?;

    let link = cap.get_datalink();
    let mut samples = Vec::new();

    loop {
        let packet = match cap.next_packet() {
            Ok(packet)                      => packet,
            Err(pcap::Error::NoMorePackets) => break,
            Err(e)                          => return Err(e.into()),
        };

        let payload = match datagram(link, packet.data) {
            Some(payload) => payload,
            None          => continue,
        };

        let ts = packet.header.ts;
        let received = UNIX_EPOCH
            + Duration::from_secs(ts.tv_sec as u64)
            + Duration::from_micros(ts.tv_usec as u64);

        metrics.messages_consumed.inc();

        match flow::decode(payload, received) {
            Ok(mut batch) => samples.append(&mut batch),
            Err(e)        => {
                debug!("skipping datagram: {}", e);
                metrics.decode_errors.inc();
            }
        }
    }

    Ok(samples)
}

fn datagram(link: Linktype, data: &[u8]) -> Option<&[u8]> {
    match link {
        Linktype::ETHERNET                        => ethernet(data),
        Linktype(n) if RAW_LINKTYPES.contains(&n) => ip(data),
        _                                         => None,
    }
}

fn ethernet(data: &[u8]) -> Option<&[u8]> {
    let eth   = EthernetPacket::new(data)?;
    let start = data.len() - eth.payload().len();

    match eth.get_ethertype() {
        EtherTypes::Ipv4 | EtherTypes::Ipv6 => ip(&data[start..]),
        _                                   => None,
    }
}

fn ip(data: &[u8]) -> Option<&[u8]> {
    let (proto, start) = match data.first()? >> 4 {
        4 => {
            let ip = Ipv4Packet::new(data)?;
            (ip.get_next_level_protocol(), ip.get_header_length() as usize * 4)
        },
        6 => {
            let ip = Ipv6Packet::new(data)?;
            (ip.get_next_header(), Ipv6Packet::minimum_packet_size())
        },
        _ => return None,
    };

    udp(proto, data.get(start..)?)
}

fn udp(proto: IpNextHeaderProtocol, data: &[u8]) -> Option<&[u8]> {
    if proto != IpNextHeaderProtocols::Udp {
        return None;
    }

    let udp   = UdpPacket::new(data)?;
    let start = data.len() - udp.payload().len();

    Some(&data[start..])
}
