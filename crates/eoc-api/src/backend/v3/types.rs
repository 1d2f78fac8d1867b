// Response documents of the newer (v3) controller firmware.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::backend::RawCounters;
use crate::model::Snr;
use crate::quoted;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Capabilities {
    #[serde(default)]
    pub product: Product,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Product {
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub mac: String,
}

/// `cgi.lua/status?type=system,ghn,ethernet,remote`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub system: System,
    #[serde(default)]
    pub ghn: Ghn,
    /// Managed endpoints keyed by hardware address.
    #[serde(default)]
    pub remote: Option<BTreeMap<String, Remote>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct System {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub uptime: u64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub memory: SystemMemory,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SystemMemory {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub used: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub total: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Ghn {
    /// Controller-side link view keyed by endpoint hardware address.
    #[serde(default)]
    pub nodes: Option<BTreeMap<String, GhnNode>>,
    #[serde(default)]
    pub modems: Option<BTreeMap<String, Modem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GhnNode {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub wire_length: u64,
    #[serde(default)]
    pub snr: SnrRange,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Modem {
    /// 0-based port index.
    #[serde(default, deserialize_with = "quoted::uint")]
    pub index: u64,
    #[serde(default)]
    pub mac: String,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub endpoint_registered: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub endpoint_count: u64,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub(crate) struct SnrRange {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub avg: f64,
    #[serde(default)]
    pub max: f64,
}

impl From<SnrRange> for Snr {
    fn from(range: SnrRange) -> Self {
        Self {
            min: range.min,
            avg: range.avg,
            max: range.max,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Remote {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default, deserialize_with = "quoted::int")]
    pub state: i64,
    #[serde(default)]
    pub status: String,
    pub system: Option<RemoteSystem>,
    #[serde(default)]
    pub ethernet: Vec<RemoteEthernet>,
    #[serde(default)]
    pub wireless: Vec<RemoteWireless>,
    #[serde(default)]
    pub ghn: Vec<RemoteGhn>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteSystem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    /// Absent while the endpoint is offline.
    #[serde(default, deserialize_with = "quoted::opt_uint")]
    pub uptime: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteEthernet {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub port: u64,
    #[serde(default)]
    pub link: bool,
    #[serde(default)]
    pub counters: RawCounters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteWireless {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub band: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub clients: u64,
    #[serde(default)]
    pub counters: RawCounters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteGhn {
    /// Only reported once the link is established.
    pub status: Option<bool>,
    pub bitrate: Option<Bitrate>,
    pub snr: Option<SnrRange>,
    #[serde(default)]
    pub master: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Bitrate {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub tx: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub rx: u64,
}
