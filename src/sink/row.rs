use std::net::IpAddr;
use std::time::UNIX_EPOCH;
use anyhow::{Context, Error};
use clickhouse::Row;
use serde::Serialize;
use crate::flow::FlowSample;

/// Persisted shape of a flow sample, one column per field. See
/// `schema/flows.sql`.
#[derive(Clone, Debug, PartialEq, Row, Serialize)]
pub struct FlowRow {
    pub time_received_ns: i64,
    pub sequence_num:     u32,
    pub sampling_rate:    u32,
    pub sampler_address:  String,
    pub in_if:            u32,
    pub out_if:           u32,
    pub in_ifname:        String,
    pub out_ifname:       String,
    pub src_mac:          String,
    pub dst_mac:          String,
    pub etype:            String,
    pub src_vlan:         u32,
    pub dst_vlan:         u32,
    pub mpls_labels:      Vec<u32>,
    pub src_addr:         String,
    pub dst_addr:         String,
    pub proto:            String,
    pub src_port:         u16,
    pub dst_port:         u16,
    pub tcp_flags:        u16,
    pub bytes:            u64,
    pub packets:          u64,
    pub ip_ttl:           u8,
    pub ip_tos:           u8,
    pub ip_flags:         u8,
    pub ip_length:        u16,
    pub ipv6_flow_label:  u32,
    pub src_as:           u32,
    pub dst_as:           u32,
    pub src_device_code:  String,
    pub dst_device_code:  String,
    pub src_location:     String,
    pub dst_location:     String,
    pub src_exchange:     String,
    pub dst_exchange:     String,
}

impl TryFrom<&FlowSample> for FlowRow {
    type Error = Error;

    fn try_from(s: &FlowSample) -> Result<Self, Self::Error> {
        let since = s.time_received.duration_since(UNIX_EPOCH).context("receive time before epoch")?;
        let nanos = i64::try_from(since.as_nanos()).context("receive time out of range")?;

        Ok(Self {
            time_received_ns: nanos,
            sequence_num:     s.sequence_num,
            sampling_rate:    s.sampling_rate,
            sampler_address:  addr(s.sampler_address),
            in_if:            s.in_if,
            out_if:           s.out_if,
            in_ifname:        s.in_ifname.clone(),
            out_ifname:       s.out_ifname.clone(),
            src_mac:          s.src_mac.to_string(),
            dst_mac:          s.dst_mac.to_string(),
            etype:            s.etype_name(),
            src_vlan:         s.src_vlan,
            dst_vlan:         s.dst_vlan,
            mpls_labels:      s.mpls_labels.clone(),
            src_addr:         addr(s.src_addr),
            dst_addr:         addr(s.dst_addr),
            proto:            s.proto_name(),
            src_port:         s.src_port,
            dst_port:         s.dst_port,
            tcp_flags:        s.tcp_flags,
            bytes:            s.bytes,
            packets:          s.packets,
            ip_ttl:           s.ip_ttl,
            ip_tos:           s.ip_tos,
            ip_flags:         s.ip_flags,
            ip_length:        s.ip_length,
            ipv6_flow_label:  s.ipv6_flow_label,
            src_as:           s.src_as,
            dst_as:           s.dst_as,
            src_device_code:  s.src_device_code.clone(),
            dst_device_code:  s.dst_device_code.clone(),
            src_location:     s.src_location.clone(),
            dst_location:     s.dst_location.clone(),
            src_exchange:     s.src_exchange.clone(),
            dst_exchange:     s.dst_exchange.clone(),
        })
    }
}

fn addr(addr: Option<IpAddr>) -> String {
    addr.map(|a| a.to_string()).unwrap_or_default()
}
