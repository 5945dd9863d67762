//! Context tagging for IPv4 artifacts
//!
//! Located addresses get their country, an "Anon Proxy" flag, the first matching
//! named network and the first matching blacklist. Addresses missing from the
//! geolocation database get a single special-purpose label instead, or nothing
//! when none applies.

use crate::error::Result;
use crate::lookups::{Blacklist, GeoLocator};
use crate::settings::NamedNetwork;
use ipnetwork::Ipv4Network;
use std::net::{IpAddr, Ipv4Addr};

pub const ANON_PROXY_TAG: &str = "Anon Proxy";

/// Special-purpose blocks in precedence order. The "Private" list follows the
/// IANA special-purpose registry, so it also covers 0.0.0.0/8 and 240.0.0.0/4.
const SPECIAL_PURPOSE: &[(&str, &[&str])] = &[
    ("Link Local", &["169.254.0.0/16"]),
    ("Loopback", &["127.0.0.0/8"]),
    ("Multicast", &["224.0.0.0/4"]),
    (
        "Private",
        &[
            "0.0.0.0/8",
            "10.0.0.0/8",
            "127.0.0.0/8",
            "169.254.0.0/16",
            "172.16.0.0/12",
            "192.0.0.0/29",
            "192.0.0.170/31",
            "192.0.2.0/24",
            "192.168.0.0/16",
            "198.18.0.0/15",
            "198.51.100.0/24",
            "203.0.113.0/24",
            "240.0.0.0/4",
            "255.255.255.255/32",
        ],
    ),
    ("Reserved", &["240.0.0.0/4"]),
    ("Unspecified", &["0.0.0.0/32"]),
];

fn in_block(ip: Ipv4Addr, block: &str) -> bool {
    block
        .parse::<Ipv4Network>()
        .map(|network| network.contains(ip))
        .unwrap_or(false)
}

/// Label of the first special-purpose category containing the address
pub fn special_purpose_label(ip: Ipv4Addr) -> Option<&'static str> {
    SPECIAL_PURPOSE
        .iter()
        .find(|(_, blocks)| blocks.iter().any(|block| in_block(ip, block)))
        .map(|(label, _)| *label)
}

/// Label of the first configured named network containing the address
pub fn named_network_lookup(ip: IpAddr, named_networks: &[NamedNetwork]) -> Option<&str> {
    named_networks
        .iter()
        .find(|named| named.contains(ip))
        .map(|named| named.name.as_str())
}

/// Tags IPv4 addresses against one set of loaded lookups
pub struct Enricher<'a> {
    locator: &'a dyn GeoLocator,
    named_networks: &'a [NamedNetwork],
    blacklist: &'a Blacklist,
}

impl<'a> Enricher<'a> {
    pub fn new(
        locator: &'a dyn GeoLocator,
        named_networks: &'a [NamedNetwork],
        blacklist: &'a Blacklist,
    ) -> Self {
        Self {
            locator,
            named_networks,
            blacklist,
        }
    }

    /// Tags for one address, each category contributing at most once
    pub fn tags_for(&self, ip: Ipv4Addr) -> Result<Vec<String>> {
        let mut tags = Vec::new();

        match self.locator.locate(ip)? {
            Some(record) => {
                match record.country {
                    Some(country) => tags.push(country),
                    None => tracing::warn!("Geolocation record for {} has no country name", ip),
                }
                if record.anonymous_proxy {
                    tags.push(ANON_PROXY_TAG.to_string());
                }

                let addr = IpAddr::V4(ip);
                if let Some(name) = named_network_lookup(addr, self.named_networks) {
                    tags.push(name.to_string());
                }
                if let Some(name) = self.blacklist.lookup(addr) {
                    tags.push(name.to_string());
                }
            }
            None => {
                if let Some(label) = special_purpose_label(ip) {
                    tags.push(label.to_string());
                }
            }
        }

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookups::{GeoRecord, StaticLocator};
    use crate::settings::parse_network;

    fn named(name: &str, ranges: &[&str]) -> NamedNetwork {
        NamedNetwork {
            name: name.to_string(),
            ranges: ranges.iter().map(|r| parse_network(r).unwrap()).collect(),
        }
    }

    fn blacklist(json: &str) -> Blacklist {
        Blacklist::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_special_purpose_precedence() {
        let cases = [
            (Ipv4Addr::new(169, 254, 10, 1), Some("Link Local")),
            (Ipv4Addr::new(127, 0, 0, 1), Some("Loopback")),
            (Ipv4Addr::new(239, 1, 2, 3), Some("Multicast")),
            (Ipv4Addr::new(192, 168, 1, 5), Some("Private")),
            (Ipv4Addr::new(172, 31, 255, 255), Some("Private")),
            (Ipv4Addr::new(250, 1, 1, 1), Some("Private")),
            (Ipv4Addr::new(0, 0, 0, 0), Some("Private")),
            (Ipv4Addr::new(172, 32, 0, 1), None),
            (Ipv4Addr::new(8, 8, 8, 8), None),
        ];
        for (ip, expected) in cases {
            assert_eq!(special_purpose_label(ip), expected, "{}", ip);
        }
    }

    #[test]
    fn test_special_purpose_blocks_parse() {
        for (label, blocks) in SPECIAL_PURPOSE {
            for block in *blocks {
                assert!(block.parse::<Ipv4Network>().is_ok(), "{}: {}", label, block);
            }
        }
    }

    #[test]
    fn test_in_block_edges() {
        assert!(in_block(Ipv4Addr::new(1, 2, 3, 4), "0.0.0.0/0"));
        assert!(in_block(Ipv4Addr::BROADCAST, "255.255.255.255/32"));
        assert!(!in_block(Ipv4Addr::new(255, 255, 255, 254), "255.255.255.255/32"));
        assert!(in_block(Ipv4Addr::new(192, 0, 0, 171), "192.0.0.170/31"));
        assert!(!in_block(Ipv4Addr::new(192, 0, 0, 172), "192.0.0.170/31"));
    }

    #[test]
    fn test_located_address_tags() {
        let locator = StaticLocator::new().with(
            Ipv4Addr::new(8, 8, 8, 8),
            GeoRecord::country("United States"),
        );
        let networks = vec![named("GOOG", &["8.8.0.0/16"])];
        let blacklist = Blacklist::default();

        let enricher = Enricher::new(&locator, &networks, &blacklist);
        let tags = enricher.tags_for(Ipv4Addr::new(8, 8, 8, 8)).unwrap();
        assert_eq!(tags, vec!["United States", "GOOG"]);
    }

    #[test]
    fn test_all_categories_in_order() {
        let ip = Ipv4Addr::new(87, 236, 220, 167);
        let locator = StaticLocator::new().with(
            ip,
            GeoRecord {
                country: Some("Spain".to_string()),
                anonymous_proxy: true,
            },
        );
        let networks = vec![
            named("WATCH", &["87.236.220.0/24"]),
            named("WIDER", &["87.0.0.0/8"]),
        ];
        let blacklist = blacklist(
            r#"[
                {"name": "dshield_7D", "type": "ip_network", "value": "87.236.220.0/24"},
                {"name": "alienvault", "type": "ip_address", "value": "87.236.220.167"}
            ]"#,
        );

        let enricher = Enricher::new(&locator, &networks, &blacklist);
        let tags = enricher.tags_for(ip).unwrap();
        assert_eq!(tags, vec!["Spain", ANON_PROXY_TAG, "WATCH", "dshield_7D"]);
    }

    #[test]
    fn test_unlocated_address_skips_named_and_blacklist() {
        let ip = Ipv4Addr::new(10, 1, 1, 1);
        let locator = StaticLocator::new();
        let networks = vec![named("CORP", &["10.0.0.0/8"])];
        let blacklist = blacklist(r#"[{"name": "bl", "type": "ip_address", "value": "10.1.1.1"}]"#);

        let enricher = Enricher::new(&locator, &networks, &blacklist);
        assert_eq!(enricher.tags_for(ip).unwrap(), vec!["Private"]);
    }

    #[test]
    fn test_unlocated_public_address_has_no_tags() {
        let locator = StaticLocator::new();
        let blacklist = Blacklist::default();
        let enricher = Enricher::new(&locator, &[], &blacklist);

        assert!(enricher
            .tags_for(Ipv4Addr::new(45, 33, 32, 156))
            .unwrap()
            .is_empty());
    }
}
