use std::net::IpAddr;
use byteorder::{ByteOrder, BE};
use pnet::packet::Packet;
use pnet::packet::ethernet::{EthernetPacket, EtherType, EtherTypes};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::vlan::VlanPacket;
use crate::flow::{Error, FlowSample};

const MPLS_UNICAST:   EtherType = EtherType(0x8847);
const MPLS_MULTICAST: EtherType = EtherType(0x8848);

const ETHERNET_BRIDGING: u16 = 0x6558;

const GRE_CHECKSUM: u16 = 0x8000;
const GRE_ROUTING:  u16 = 0x4000;
const GRE_KEY:      u16 = 0x2000;
const GRE_SEQUENCE: u16 = 0x1000;
const GRE_VERSION:  u16 = 0x0007;

const MPLS_BOTTOM: u32 = 0x100;

const MAX_DEPTH: usize = 4;

/// Decode a sampled Ethernet frame into `sample`. Tunnels are peeled
/// so the sample ends up describing the innermost IP packet; layers
/// that are missing or cut off by the sampler are left zeroed.
pub fn decode(frame: &[u8], sample: &mut FlowSample) -> Result<(), Error> {
    let eth = EthernetPacket::new(frame).ok_or(Error::Truncated("ethernet header"))?;
    ethernet(&eth, sample, 0);
    Ok(())
}

fn ethernet(eth: &EthernetPacket<'_>, s: &mut FlowSample, depth: usize) {
    s.src_mac = eth.get_source();
    s.dst_mac = eth.get_destination();

    let mut ethertype = eth.get_ethertype();
    let mut payload   = eth.payload();

    while matches!(ethertype.0, 0x8100 | 0x88a8 | 0x9100) {
        match VlanPacket::new(payload) {
            Some(pkt) => {
                ethertype = pkt.get_ethertype();
                payload   = &payload[VlanPacket::minimum_packet_size()..];
            },
            None => return,
        }
    }

    network(ethertype, payload, s, depth);
}

fn network(ethertype: EtherType, payload: &[u8], s: &mut FlowSample, depth: usize) {
    s.etype = ethertype.0;
    match ethertype {
        EtherTypes::Ipv4 => ipv4(payload, s, depth),
        EtherTypes::Ipv6 => ipv6(payload, s, depth),
        MPLS_UNICAST     => mpls(payload, s, depth),
        MPLS_MULTICAST   => mpls(payload, s, depth),
        _                => (),
    }
}

fn mpls(payload: &[u8], s: &mut FlowSample, depth: usize) {
    let mut rest = payload;

    loop {
        if rest.len() < 4 {
            return;
        }

        let shim = BE::read_u32(rest);
        rest = &rest[4..];
        s.mpls_labels.push(shim >> 12);

        if shim & MPLS_BOTTOM != 0 {
            break;
        }
    }

    match rest.first().map(|b| b >> 4) {
        Some(4) => network(EtherTypes::Ipv4, rest, s, depth),
        Some(6) => network(EtherTypes::Ipv6, rest, s, depth),
        _       => (),
    }
}

fn ipv4(payload: &[u8], s: &mut FlowSample, depth: usize) {
    let ip = match Ipv4Packet::new(payload) {
        Some(ip) => ip,
        None     => return,
    };

    s.src_addr        = Some(IpAddr::V4(ip.get_source()));
    s.dst_addr        = Some(IpAddr::V4(ip.get_destination()));
    s.proto           = ip.get_next_level_protocol().0;
    s.ip_ttl          = ip.get_ttl();
    s.ip_tos          = ip.get_dscp() << 2 | ip.get_ecn();
    s.ip_flags        = ip.get_flags();
    s.ip_length       = ip.get_total_length();
    s.ipv6_flow_label = 0;

    let n = ip.get_header_length() as usize * 4;
    if n < Ipv4Packet::minimum_packet_size() || n > payload.len() {
        return;
    }

    // only the first fragment carries the transport header
    if ip.get_fragment_offset() != 0 {
        return;
    }

    transport(ip.get_next_level_protocol(), &payload[n..], s, depth);
}

fn ipv6(payload: &[u8], s: &mut FlowSample, depth: usize) {
    let ip = match Ipv6Packet::new(payload) {
        Some(ip) => ip,
        None     => return,
    };

    let n = Ipv6Packet::minimum_packet_size();

    s.src_addr        = Some(IpAddr::V6(ip.get_source()));
    s.dst_addr        = Some(IpAddr::V6(ip.get_destination()));
    s.proto           = ip.get_next_header().0;
    s.ip_ttl          = ip.get_hop_limit();
    s.ip_tos          = ip.get_traffic_class();
    s.ip_flags        = 0;
    s.ip_length       = ip.get_payload_length().saturating_add(n as u16);
    s.ipv6_flow_label = ip.get_flow_label();

    transport(ip.get_next_header(), &payload[n..], s, depth);
}

fn transport(proto: IpNextHeaderProtocol, payload: &[u8], s: &mut FlowSample, depth: usize) {
    match proto {
        IpNextHeaderProtocols::Tcp => {
            if let Some(tcp) = TcpPacket::new(payload) {
                s.src_port  = tcp.get_source();
                s.dst_port  = tcp.get_destination();
                s.tcp_flags = u16::from(tcp.get_flags());
            }
        },
        IpNextHeaderProtocols::Udp => {
            if let Some(udp) = UdpPacket::new(payload) {
                s.src_port  = udp.get_source();
                s.dst_port  = udp.get_destination();
                s.tcp_flags = 0;
            }
        },
        IpNextHeaderProtocols::Gre if depth < MAX_DEPTH => gre(payload, s, depth + 1),
        _ => (),
    }
}

fn gre(payload: &[u8], s: &mut FlowSample, depth: usize) {
    if payload.len() < 4 {
        return;
    }

    let flags = BE::read_u16(payload);
    let proto = BE::read_u16(&payload[2..]);

    if flags & (GRE_VERSION | GRE_ROUTING) != 0 {
        return;
    }

    let mut n = 4;
    for bit in &[GRE_CHECKSUM, GRE_KEY, GRE_SEQUENCE] {
        if flags & bit != 0 {
            n += 4;
        }
    }

    if payload.len() < n {
        return;
    }

    let inner = &payload[n..];

    match proto {
        ETHERNET_BRIDGING => {
            if let Some(eth) = EthernetPacket::new(inner) {
                ethernet(&eth, s, depth);
            }
        },
        ethertype => network(EtherType(ethertype), inner, s, depth),
    }
}
