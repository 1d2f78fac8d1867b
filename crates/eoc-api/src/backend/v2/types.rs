// Response documents of the older (v2) controller firmware.
//
// Only the fields that feed the canonical metrics are declared. Numeric
// values may arrive quoted; maps keyed by hardware address use the
// controller's own key spelling and are not interpreted.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::backend::RawCounters;
use crate::model::PortOrder;
use crate::quoted;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub cookie: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Board {
    #[serde(default)]
    pub serial: String,
    #[serde(default, alias = "eth_mac", alias = "ethMac")]
    pub ethmac: String,
    #[serde(default)]
    pub release: Release,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Release {
    #[serde(default)]
    pub revision: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SysInfo {
    #[serde(default)]
    pub memory: SysMemory,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub uptime: u64,
    #[serde(default)]
    pub load: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SysMemory {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub buffered: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub free: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub shared: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub total: u64,
}

/// EoC system configuration; only the port ordering is of interest.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EocConfig {
    #[serde(default, deserialize_with = "port_list")]
    pub macaddr: PortOrder,
}

/// `macaddr` is one whitespace-separated string, port 1 first.
fn port_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PortOrder, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(PortOrder::new(raw.split_whitespace()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhnPortStatus {
    #[serde(default)]
    pub mac: String,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub connected: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub registered: u64,
}

/// `node/status` answers with a map keyed by a mangled hardware address.
pub(crate) type NodeTable = BTreeMap<String, Node>;

#[derive(Debug, Deserialize)]
pub(crate) struct Node {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mac: String,
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "quoted::int")]
    pub statusid: i64,
    #[serde(default)]
    pub status: String,
    pub ghn_master: Option<String>,
    pub ghn_stats: Option<NodeGhnStats>,
    pub sysinfo: Option<NodeSysInfo>,
    /// Unix timestamp of the last registration, as a string.
    pub regts: Option<String>,
    #[serde(default)]
    pub statistics: Statistics,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeGhnStats {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub rxbps: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub txbps: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeSysInfo {
    #[serde(default)]
    pub load: f64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub uptime: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Statistics {
    #[serde(default)]
    pub ethernet: Vec<EthernetStats>,
    #[serde(default)]
    pub wireless: Vec<WirelessStats>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EthernetStats {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub port: u64,
    #[serde(default)]
    pub link: bool,
    #[serde(default)]
    pub counters: RawCounters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirelessStats {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub band: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub clients: u64,
    #[serde(default)]
    pub counters: RawCounters,
}
