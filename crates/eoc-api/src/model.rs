// ── Canonical metrics ──
//
// Backend-agnostic snapshot of one controller, produced fresh by every
// collection. Firmware-specific response types are translated into these
// structs by the backends; rendering into metric tuples lives in
// `crate::metrics`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Everything one collection learned about a controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub controller: ControllerInfo,
    /// Controller uptime in seconds.
    pub uptime: u64,
    pub load: Option<f64>,
    pub memory: Memory,
    /// G.hn ports keyed by their lower-cased hardware address.
    pub ghn_ports: BTreeMap<String, GhnPort>,
    pub endpoints: Vec<Endpoint>,
    /// Controller-side view of each G.hn link (newer firmware only).
    pub ghn_links: Vec<GhnLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerInfo {
    pub serial: String,
    pub mac: String,
    pub version: String,
}

/// Controller memory in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    pub total: u64,
    pub free: u64,
    pub buffered: Option<u64>,
    pub shared: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhnPort {
    pub number: PortNumber,
    pub registered: u64,
    pub online: u64,
}

/// 1-based position of a G.hn port on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortNumber {
    Known(u32),
    /// The port's hardware address is not in the controller's port list.
    Unknown,
}

impl PortNumber {
    pub fn known(self) -> Option<u32> {
        match self {
            Self::Known(n) => Some(n),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{n}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// The authoritative port ordering of a controller: hardware addresses in
/// port order, stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortOrder(Vec<String>);

impl PortOrder {
    pub fn new<I, S>(macs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            macs.into_iter()
                .map(|mac| mac.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    /// Case-insensitive linear search; the first port is number 1.
    pub fn position(&self, mac: &str) -> PortNumber {
        if mac.is_empty() {
            return PortNumber::Unknown;
        }
        self.0
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(mac))
            .and_then(|i| u32::try_from(i + 1).ok())
            .map_or(PortNumber::Unknown, PortNumber::Known)
    }
}

/// A managed node behind the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub name: String,
    pub mac: String,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub status: i64,
    pub status_text: String,
    pub presence: Presence,
    pub load: Option<f64>,
    /// The controller port this endpoint is attached to.
    pub ghn_port: Option<PortRef>,
    pub interfaces: Vec<InterfaceCounters>,
    pub wireless: Vec<WirelessBand>,
    pub ghn: Option<GhnStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Online for this many seconds.
    Online { uptime: u64 },
    /// Offline, last registered at the given instant.
    OfflineSince(DateTime<Utc>),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    pub mac: String,
    pub number: PortNumber,
}

/// Traffic counters of one interface (`eth0`, `wifi5`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub counters: Counters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirelessBand {
    /// Frequency band in GHz (2 or 5).
    pub band: u64,
    pub clients: u64,
}

/// G.hn link statistics as reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhnStats {
    pub rx_bps: Option<u64>,
    pub tx_bps: Option<u64>,
    pub snr: Option<Snr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snr {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// G.hn link statistics as reported by the controller for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GhnLink {
    /// Endpoint name, or its hardware address if the name is unknown.
    pub name: String,
    pub wire_length: u64,
    pub snr: Snr,
}
