use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use pnet::util::MacAddr;

pub const FIN: u16 = 0b000001;
pub const SYN: u16 = 0b000010;
pub const RST: u16 = 0b000100;
pub const ACK: u16 = 0b010000;

/// One decoded flow observation. Annotators fill in the trailing
/// name/code fields; nothing touches a sample once the sink has it.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowSample {
    pub time_received:   SystemTime,
    pub sequence_num:    u32,
    pub sampling_rate:   u32,
    pub sampler_address: Option<IpAddr>,
    pub in_if:           u32,
    pub out_if:          u32,
    pub in_ifname:       String,
    pub out_ifname:      String,
    pub src_mac:         MacAddr,
    pub dst_mac:         MacAddr,
    pub etype:           u16,
    pub src_vlan:        u32,
    pub dst_vlan:        u32,
    pub mpls_labels:     Vec<u32>,
    pub src_addr:        Option<IpAddr>,
    pub dst_addr:        Option<IpAddr>,
    pub proto:           u8,
    pub src_port:        u16,
    pub dst_port:        u16,
    pub tcp_flags:       u16,
    pub bytes:           u64,
    pub packets:         u64,
    pub ip_ttl:          u8,
    pub ip_tos:          u8,
    pub ip_flags:        u8,
    pub ip_length:       u16,
    pub ipv6_flow_label: u32,
    pub src_as:          u32,
    pub dst_as:          u32,
    pub src_device_code: String,
    pub dst_device_code: String,
    pub src_location:    String,
    pub dst_location:    String,
    pub src_exchange:    String,
    pub dst_exchange:    String,
}

impl FlowSample {
    pub fn etype_name(&self) -> String {
        match self.etype {
            0      => String::new(),
            0x0800 => "IPv4".to_owned(),
            0x0806 => "ARP".to_owned(),
            0x8100 => "802.1Q".to_owned(),
            0x86dd => "IPv6".to_owned(),
            0x8847 => "MPLS".to_owned(),
            0x8848 => "MPLS".to_owned(),
            n      => format!("0x{:04x}", n),
        }
    }

    pub fn proto_name(&self) -> String {
        match self.proto {
            0 if self.src_addr.is_none() => String::new(),
            1   => "ICMP".to_owned(),
            6   => "TCP".to_owned(),
            17  => "UDP".to_owned(),
            47  => "GRE".to_owned(),
            50  => "ESP".to_owned(),
            58  => "ICMPv6".to_owned(),
            132 => "SCTP".to_owned(),
            n   => n.to_string(),
        }
    }
}

impl Default for FlowSample {
    fn default() -> Self {
        Self {
            time_received:   UNIX_EPOCH,
            sequence_num:    0,
            sampling_rate:   0,
            sampler_address: None,
            in_if:           0,
            out_if:          0,
            in_ifname:       String::new(),
            out_ifname:      String::new(),
            src_mac:         MacAddr::zero(),
            dst_mac:         MacAddr::zero(),
            etype:           0,
            src_vlan:        0,
            dst_vlan:        0,
            mpls_labels:     Vec::new(),
            src_addr:        None,
            dst_addr:        None,
            proto:           0,
            src_port:        0,
            dst_port:        0,
            tcp_flags:       0,
            bytes:           0,
            packets:         0,
            ip_ttl:          0,
            ip_tos:          0,
            ip_flags:        0,
            ip_length:       0,
            ipv6_flow_label: 0,
            src_as:          0,
            dst_as:          0,
            src_device_code: String::new(),
            dst_device_code: String::new(),
            src_location:    String::new(),
            dst_location:    String::new(),
            src_exchange:    String::new(),
            dst_exchange:    String::new(),
        }
    }
}
