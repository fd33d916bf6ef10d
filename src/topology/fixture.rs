use std::net::{IpAddr, Ipv4Addr};
use super::*;

pub const DEVICE1:   PubKey = PubKey([1; 32]);
pub const DEVICE2:   PubKey = PubKey([2; 32]);
pub const LOCATION1: PubKey = PubKey([11; 32]);
pub const LOCATION2: PubKey = PubKey([12; 32]);
pub const EXCHANGE1: PubKey = PubKey([21; 32]);
pub const EXCHANGE2: PubKey = PubKey([22; 32]);

pub const ADDR1: Ipv4Addr = Ipv4Addr::new(137, 174, 145, 144);
pub const ADDR2: Ipv4Addr = Ipv4Addr::new(137, 174, 145, 145);

/// Two users on two devices in distinct locations and exchanges.
pub fn snapshot() -> Snapshot {
    Snapshot {
        users: vec![
            User { pubkey: PubKey([31; 32]), dz_ip: IpAddr::V4(ADDR1), device: DEVICE1 },
            User { pubkey: PubKey([32; 32]), dz_ip: IpAddr::V4(ADDR2), device: DEVICE2 },
        ],
        devices: vec![
            Device { pubkey: DEVICE1, code: "test-device-1".into(), location: LOCATION1, exchange: EXCHANGE1 },
            Device { pubkey: DEVICE2, code: "test-device-2".into(), location: LOCATION2, exchange: EXCHANGE2 },
        ],
        locations: vec![
            Location { pubkey: LOCATION1, code: "TEST-LOC1".into(), name: "Test Location 1".into() },
            Location { pubkey: LOCATION2, code: "TEST-LOC2".into(), name: "Test Location 2".into() },
        ],
        exchanges: vec![
            Exchange { pubkey: EXCHANGE1, code: "tst1".into(), name: "Test Exchange 1".into() },
            Exchange { pubkey: EXCHANGE2, code: "tst2".into(), name: "Test Exchange 2".into() },
        ],
    }
}
