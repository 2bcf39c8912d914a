//! Tenant and node identity
//!
//! Resolved once per generator. A configured node id is used as-is (masked);
//! otherwise the first usable local IPv4 address supplies it, and a random id
//! covers hosts without one or with an address that does not parse.

use std::fmt;
use std::net::UdpSocket;

use rand::Rng;
use tracing::{debug, warn};

use crate::layout::BitLayout;

/// Supplies the local addresses considered for node id resolution
pub trait AddressResolver: Send + Sync {
    /// Candidate addresses in preference order; empty when none are known
    fn local_addresses(&self) -> Vec<String>;
}

/// Reports the address of the interface used for outbound traffic
///
/// Connecting a UDP socket sends no packets; it only selects a route.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAddressResolver;

impl SystemAddressResolver {
    const PROBE_TARGET: &'static str = "8.8.8.8:80";
}

impl AddressResolver for SystemAddressResolver {
    fn local_addresses(&self) -> Vec<String> {
        let probe = UdpSocket::bind("0.0.0.0:0").and_then(|socket| {
            socket.connect(Self::PROBE_TARGET)?;
            socket.local_addr()
        });
        match probe {
            Ok(addr) => vec![addr.ip().to_string()],
            Err(err) => {
                debug!(error = %err, "no outbound interface found");
                Vec::new()
            }
        }
    }
}

/// A fixed list of addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAddressResolver(pub Vec<String>);

impl StaticAddressResolver {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(addresses.into_iter().map(Into::into).collect())
    }
}

impl AddressResolver for StaticAddressResolver {
    fn local_addresses(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Where the node id came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSource {
    Configured,
    Address(String),
    Random,
}

impl fmt::Display for NodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSource::Configured => f.write_str("configured"),
            NodeSource::Address(addr) => write!(f, "address {addr}"),
            NodeSource::Random => f.write_str("random"),
        }
    }
}

/// Masked tenant and node ids of one generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    tenant_id: u64,
    node_id: u64,
    source: NodeSource,
}

impl NodeIdentity {
    /// Resolve tenant and node ids for a layout
    pub fn resolve(
        tenant_id: u64,
        node_id: Option<u64>,
        layout: &BitLayout,
        resolver: &dyn AddressResolver,
    ) -> Self {
        let max_node = layout.max_node();
        let (raw, source) = match node_id {
            Some(id) => (id, NodeSource::Configured),
            None => Self::auto_node_id(max_node, resolver),
        };

        Self {
            tenant_id: tenant_id & layout.max_tenant(),
            node_id: raw & max_node,
            source,
        }
    }

    fn auto_node_id(max_node: u64, resolver: &dyn AddressResolver) -> (u64, NodeSource) {
        let addresses = resolver.local_addresses();
        if let Some(addr) = select_ipv4(&addresses) {
            match parse_ipv4(addr) {
                Some(ip) => return (ip as u64, NodeSource::Address(addr.to_string())),
                None => warn!(
                    address = addr,
                    "local address is not dotted-quad IPv4, using a random node id"
                ),
            }
        }
        (rand::rng().random_range(0..=max_node), NodeSource::Random)
    }

    #[inline(always)]
    pub const fn tenant_id(&self) -> u64 {
        self.tenant_id
    }

    #[inline(always)]
    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn source(&self) -> &NodeSource {
        &self.source
    }
}

/// First non-empty, non-loopback address containing a `.`
pub fn select_ipv4(addresses: &[String]) -> Option<&str> {
    addresses
        .iter()
        .map(String::as_str)
        .find(|addr| !addr.is_empty() && addr.contains('.') && *addr != "127.0.0.1")
}

/// Parse a dotted quad into `(o0 << 24) | (o1 << 16) | (o2 << 8) | o3`
///
/// Returns `None` for fewer than three dots or any octet that is not a
/// number in `0..=255`.
pub fn parse_ipv4(addr: &str) -> Option<u32> {
    let p1 = addr.find('.')?;
    let p2 = p1 + 1 + addr[p1 + 1..].find('.')?;
    let p3 = p2 + 1 + addr[p2 + 1..].find('.')?;

    let octet = |part: &str| part.parse::<u8>().ok().map(u32::from);
    Some(
        octet(&addr[..p1])? << 24
            | octet(&addr[p1 + 1..p2])? << 16
            | octet(&addr[p2 + 1..p3])? << 8
            | octet(&addr[p3 + 1..])?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BitWidths;

    fn layout() -> BitLayout {
        BitLayout::new(BitWidths::MILLIS_DEFAULT).unwrap()
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.168.1.44"), Some(0xC0A8012C));
        assert_eq!(parse_ipv4("0.0.0.0"), Some(0));
        assert_eq!(parse_ipv4("255.255.255.255"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_ipv4_malformed() {
        assert_eq!(parse_ipv4("10.0.1"), None);
        assert_eq!(parse_ipv4("10.0.x.1"), None);
        assert_eq!(parse_ipv4("10.0.1.2.3"), None);
        assert_eq!(parse_ipv4("10.0.1.256"), None);
        assert_eq!(parse_ipv4("...."), None);
        assert_eq!(parse_ipv4(""), None);
    }

    #[test]
    fn test_select_ipv4_skips_loopback_and_v6() {
        let addrs = vec![
            "fe80::1".to_string(),
            "127.0.0.1".to_string(),
            String::new(),
            "10.1.2.3".to_string(),
            "10.9.9.9".to_string(),
        ];
        assert_eq!(select_ipv4(&addrs), Some("10.1.2.3"));
        assert_eq!(select_ipv4(&addrs[..3]), None);
    }

    #[test]
    fn test_configured_ids_are_masked() {
        let resolver = StaticAddressResolver::default();
        let identity = NodeIdentity::resolve(9, Some(300), &layout(), &resolver);
        assert_eq!(identity.tenant_id(), 1);
        assert_eq!(identity.node_id(), 44);
        assert_eq!(identity.source(), &NodeSource::Configured);
    }

    #[test]
    fn test_node_from_address() {
        let resolver = StaticAddressResolver::new(["127.0.0.1", "192.168.1.44"]);
        let identity = NodeIdentity::resolve(0, None, &layout(), &resolver);
        assert_eq!(identity.node_id(), 44);
        assert_eq!(
            identity.source(),
            &NodeSource::Address("192.168.1.44".to_string())
        );
    }

    #[test]
    fn test_malformed_address_falls_back_to_random() {
        let resolver = StaticAddressResolver::new(["not.an.address"]);
        let identity = NodeIdentity::resolve(0, None, &layout(), &resolver);
        assert_eq!(identity.source(), &NodeSource::Random);
        assert!(identity.node_id() <= 255);
    }

    #[test]
    fn test_no_address_falls_back_to_random() {
        let resolver = StaticAddressResolver::new(["127.0.0.1", "::1"]);
        for _ in 0..50 {
            let identity = NodeIdentity::resolve(0, None, &layout(), &resolver);
            assert_eq!(identity.source(), &NodeSource::Random);
            assert!(identity.node_id() <= 255);
        }
    }

    #[test]
    fn test_zero_width_node() {
        let layout = BitLayout::new(BitWidths::new(40, 0, 0, 12)).unwrap();
        let resolver = StaticAddressResolver::default();
        let identity = NodeIdentity::resolve(5, None, &layout, &resolver);
        assert_eq!(identity.node_id(), 0);
        assert_eq!(identity.tenant_id(), 0);
    }

    #[test]
    fn test_system_resolver_never_panics() {
        let addrs = SystemAddressResolver.local_addresses();
        assert!(addrs.len() <= 1);
    }
}
