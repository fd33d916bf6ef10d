//! Byte-level builders for sFlow datagrams, the frames they carry, and
//! pcap files wrapping them.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use super::decode::*;

pub const SRC_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
pub const DST_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02];

pub type Record = (u32, Vec<u8>);

fn put16(v: &mut Vec<u8>, n: u16) {
    v.extend_from_slice(&n.to_be_bytes());
}

fn put32(v: &mut Vec<u8>, n: u32) {
    v.extend_from_slice(&n.to_be_bytes());
}

fn opaque(v: &mut Vec<u8>, format: u32, data: &[u8]) {
    put32(v, format);
    opaque_data(v, data);
}

pub fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&DST_MAC);
    v.extend_from_slice(&SRC_MAC);
    put16(&mut v, ethertype);
    v.extend_from_slice(payload);
    v
}

pub fn vlan(id: u16, ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    put16(&mut v, id & 0x0fff);
    put16(&mut v, ethertype);
    v.extend_from_slice(payload);
    v
}

pub fn mpls(labels: &[u32], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        let bottom = if i + 1 == labels.len() { 0x100 } else { 0 };
        put32(&mut v, *label << 12 | bottom | 64);
    }
    v.extend_from_slice(payload);
    v
}

pub fn gre(proto: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    put16(&mut v, 0);
    put16(&mut v, proto);
    v.extend_from_slice(payload);
    v
}

pub fn gre_keyed(proto: u16, key: u32, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    put16(&mut v, 0x2000);
    put16(&mut v, proto);
    put32(&mut v, key);
    v.extend_from_slice(payload);
    v
}

pub fn ipv4(src: Ipv4Addr, dst: Ipv4Addr, proto: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = vec![0x45, 0x00];
    put16(&mut v, 20 + payload.len() as u16);
    put16(&mut v, 0x1234);
    put16(&mut v, 0x4000);
    v.push(64);
    v.push(proto);
    put16(&mut v, 0);
    v.extend_from_slice(&src.octets());
    v.extend_from_slice(&dst.octets());
    v.extend_from_slice(payload);
    v
}

pub fn ipv6(src: Ipv6Addr, dst: Ipv6Addr, next: u8, flow_label: u32, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    put32(&mut v, 0x6000_0000 | (flow_label & 0x000f_ffff));
    put16(&mut v, payload.len() as u16);
    v.push(next);
    v.push(32);
    v.extend_from_slice(&src.octets());
    v.extend_from_slice(&dst.octets());
    v.extend_from_slice(payload);
    v
}

pub fn udp(sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    put16(&mut v, sport);
    put16(&mut v, dport);
    put16(&mut v, 8 + payload.len() as u16);
    put16(&mut v, 0);
    v.extend_from_slice(payload);
    v
}

pub fn tcp(sport: u16, dport: u16, flags: u8) -> Vec<u8> {
    let mut v = Vec::new();
    put16(&mut v, sport);
    put16(&mut v, dport);
    put32(&mut v, 1);
    put32(&mut v, 0);
    v.push(0x50);
    v.push(flags);
    put16(&mut v, 65535);
    put16(&mut v, 0);
    put16(&mut v, 0);
    v
}

/// Ethernet / IPv4 / UDP.
pub fn udp_frame(src: Ipv4Addr, dst: Ipv4Addr, sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
    ethernet(0x0800, &ipv4(src, dst, 17, &udp(sport, dport, payload)))
}

/// Ethernet / IPv4 / GRE / IPv4 / UDP.
pub fn gre_frame(outer: (Ipv4Addr, Ipv4Addr), inner: (Ipv4Addr, Ipv4Addr), sport: u16, dport: u16) -> Vec<u8> {
    let inner = ipv4(inner.0, inner.1, 17, &udp(sport, dport, b"user traffic"));
    ethernet(0x0800, &ipv4(outer.0, outer.1, 47, &gre(0x0800, &inner)))
}

pub fn raw_header(frame: &[u8]) -> Record {
    let mut v = Vec::new();
    put32(&mut v, HEADER_ETHERNET);
    put32(&mut v, frame.len() as u32 + 4);
    put32(&mut v, 4);
    opaque_data(&mut v, frame);
    (RAW_PACKET_HEADER, v)
}

pub fn raw_header_protocol(protocol: u32, frame: &[u8]) -> Record {
    let (format, mut v) = raw_header(frame);
    v[..4].copy_from_slice(&protocol.to_be_bytes());
    (format, v)
}

pub fn switch(src_vlan: u32, dst_vlan: u32) -> Record {
    let mut v = Vec::new();
    put32(&mut v, src_vlan);
    put32(&mut v, 0);
    put32(&mut v, dst_vlan);
    put32(&mut v, 0);
    (EXTENDED_SWITCH, v)
}

pub fn router() -> Record {
    let mut v = Vec::new();
    put32(&mut v, 1);
    v.extend_from_slice(&[10, 0, 0, 1]);
    put32(&mut v, 24);
    put32(&mut v, 24);
    (EXTENDED_ROUTER, v)
}

fn opaque_data(v: &mut Vec<u8>, data: &[u8]) {
    put32(v, data.len() as u32);
    v.extend_from_slice(data);
    v.resize(v.len() + (4 - data.len() % 4) % 4, 0);
}

fn records(v: &mut Vec<u8>, records: &[Record]) {
    put32(v, records.len() as u32);
    for (format, data) in records {
        opaque(v, *format, data);
    }
}

pub fn flow_sample(rate: u32, input: u32, output: u32, recs: &[Record]) -> Record {
    let mut v = Vec::new();
    put32(&mut v, 7);
    put32(&mut v, input);
    put32(&mut v, rate);
    put32(&mut v, rate * 10);
    put32(&mut v, 0);
    put32(&mut v, input);
    put32(&mut v, output);
    records(&mut v, recs);
    (FLOW_SAMPLE, v)
}

pub fn expanded_sample(rate: u32, input: u32, output: u32, recs: &[Record]) -> Record {
    let mut v = Vec::new();
    put32(&mut v, 7);
    put32(&mut v, 0);
    put32(&mut v, input);
    put32(&mut v, rate);
    put32(&mut v, rate * 10);
    put32(&mut v, 0);
    put32(&mut v, 0);
    put32(&mut v, input);
    put32(&mut v, 0);
    put32(&mut v, output);
    records(&mut v, recs);
    (EXPANDED_FLOW_SAMPLE, v)
}

pub fn counter_sample() -> Record {
    let mut v = Vec::new();
    put32(&mut v, 3);
    put32(&mut v, 1);
    put32(&mut v, 0);
    (COUNTER_SAMPLE, v)
}

pub fn datagram(agent: IpAddr, sequence: u32, samples: &[Record]) -> Vec<u8> {
    let mut v = Vec::new();
    put32(&mut v, VERSION);
    match agent {
        IpAddr::V4(a) => {
            put32(&mut v, 1);
            v.extend_from_slice(&a.octets());
        },
        IpAddr::V6(a) => {
            put32(&mut v, 2);
            v.extend_from_slice(&a.octets());
        },
    }
    put32(&mut v, 0);
    put32(&mut v, sequence);
    put32(&mut v, 123_456);
    put32(&mut v, samples.len() as u32);
    for (format, data) in samples {
        opaque(&mut v, *format, data);
    }
    v
}

/// Datagram with `n` flow samples of a plain UDP flow on interfaces 1 -> 2.
pub fn udp_datagram(agent: Ipv4Addr, sequence: u32, n: usize) -> Vec<u8> {
    let frame  = udp_frame(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2), 4000, 53, b"q");
    let sample = flow_sample(1000, 1, 2, &[raw_header(&frame)]);
    let samples = vec![sample; n];
    datagram(IpAddr::V4(agent), sequence, &samples)
}

/// Little-endian classic pcap file with Ethernet link type.
pub fn pcap(packets: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    v.extend_from_slice(&2u16.to_le_bytes());
    v.extend_from_slice(&4u16.to_le_bytes());
    v.extend_from_slice(&0i32.to_le_bytes());
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(&65535u32.to_le_bytes());
    v.extend_from_slice(&1u32.to_le_bytes());
    for (secs, frame) in packets {
        v.extend_from_slice(&secs.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        v.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        v.extend_from_slice(frame);
    }
    v
}
