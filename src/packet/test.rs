use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use anyhow::Result;
use crate::flow::{Error, FlowSample};
use crate::flow::fixture::*;
use super::decode;

fn v4(a: u8, b: u8, c: u8, d: u8) -> Option<IpAddr> {
    Some(IpAddr::V4(Ipv4Addr::new(a, b, c, d)))
}

#[test]
fn stacked_vlan_tags() -> Result<()> {
    let ip    = ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2), 17, &udp(5353, 5353, b""));
    let frame = ethernet(0x88a8, &vlan(10, 0x8100, &vlan(20, 0x0800, &ip)));

    let mut s = FlowSample::default();
    decode(&frame, &mut s)?;

    assert_eq!(s.etype,    0x0800);
    assert_eq!(s.src_addr, v4(10, 0, 0, 1));
    assert_eq!(s.src_port, 5353);
    assert_eq!(s.ip_ttl,   64);
    assert_eq!(s.ip_flags, 0b010);

    Ok(())
}

#[test]
fn keyed_gre_inner_wins() -> Result<()> {
    let inner = ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2), 6, &tcp(80, 12345, 0x11));
    let outer = ipv4(Ipv4Addr::new(172, 16, 0, 1), Ipv4Addr::new(172, 16, 0, 2), 47, &gre_keyed(0x0800, 7, &inner));
    let frame = ethernet(0x0800, &outer);

    let mut s = FlowSample::default();
    decode(&frame, &mut s)?;

    assert_eq!(s.src_addr,  v4(192, 168, 1, 1));
    assert_eq!(s.dst_addr,  v4(192, 168, 1, 2));
    assert_eq!(s.proto,     6);
    assert_eq!(s.src_port,  80);
    assert_eq!(s.dst_port,  12345);
    assert_eq!(s.tcp_flags, 0x11);

    Ok(())
}

#[test]
fn gre_bridged_ethernet() -> Result<()> {
    let inner = udp_frame(Ipv4Addr::new(100, 64, 0, 1), Ipv4Addr::new(100, 64, 0, 2), 1, 2, b"");
    let outer = ipv4(Ipv4Addr::new(172, 16, 0, 1), Ipv4Addr::new(172, 16, 0, 2), 47, &gre(0x6558, &inner));
    let frame = ethernet(0x0800, &outer);

    let mut s = FlowSample::default();
    decode(&frame, &mut s)?;

    assert_eq!(s.src_addr, v4(100, 64, 0, 1));
    assert_eq!(s.dst_addr, v4(100, 64, 0, 2));
    assert_eq!(s.proto,    17);

    Ok(())
}

#[test]
fn gre_routing_not_followed() -> Result<()> {
    let inner   = ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2), 17, &udp(1, 2, b""));
    let mut gre = gre(0x0800, &inner);
    gre[0] = 0x40;
    let frame   = ethernet(0x0800, &ipv4(Ipv4Addr::new(172, 16, 0, 1), Ipv4Addr::new(172, 16, 0, 2), 47, &gre));

    let mut s = FlowSample::default();
    decode(&frame, &mut s)?;

    assert_eq!(s.src_addr, v4(172, 16, 0, 1));
    assert_eq!(s.proto,    47);
    assert_eq!(s.src_port, 0);

    Ok(())
}

#[test]
fn ipv6_over_mpls() -> Result<()> {
    let src   = "fd00::1".parse::<Ipv6Addr>()?;
    let dst   = "fd00::2".parse::<Ipv6Addr>()?;
    let frame = ethernet(0x8847, &mpls(&[3000], &ipv6(src, dst, 17, 1, &udp(443, 443, b"quic"))));

    let mut s = FlowSample::default();
    decode(&frame, &mut s)?;

    assert_eq!(s.mpls_labels,     vec![3000]);
    assert_eq!(s.etype,           0x86dd);
    assert_eq!(s.src_addr,        Some(IpAddr::V6(src)));
    assert_eq!(s.ipv6_flow_label, 1);
    assert_eq!(s.ip_length,       40 + 12);
    assert_eq!(s.dst_port,        443);

    Ok(())
}

#[test]
fn non_ip_leaves_network_empty() -> Result<()> {
    let frame = ethernet(0x0806, &[0u8; 28]);

    let mut s = FlowSample::default();
    decode(&frame, &mut s)?;

    assert_eq!(s.etype_name(), "ARP");
    assert_eq!(s.src_addr,     None);
    assert_eq!(s.proto_name(), "");

    Ok(())
}

#[test]
fn short_frame_is_an_error() {
    let mut s = FlowSample::default();
    assert_eq!(decode(&[0u8; 10], &mut s), Err(Error::Truncated("ethernet header")));
}
