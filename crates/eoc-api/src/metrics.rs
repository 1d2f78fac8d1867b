// ── Metric table and sink contract ──
//
// Canonical metrics are flattened into `(descriptor, value, label values)`
// tuples and pushed into a `MetricSink`. The sink decides how to expose
// them; the exporter renders Prometheus text.

use crate::model::{Counters, Endpoint, Metrics, Presence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Static description of one metric family.
#[derive(Debug, PartialEq, Eq)]
pub struct Desc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

/// One value of a metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub desc: &'static Desc,
    pub value: f64,
    pub labels: Vec<String>,
}

/// Receiver of metric tuples.
pub trait MetricSink: Send {
    fn record(&mut self, sample: Sample);
}

impl MetricSink for Vec<Sample> {
    fn record(&mut self, sample: Sample) {
        self.push(sample);
    }
}

macro_rules! desc {
    ($ident:ident, $subsystem:literal, $name:literal, $kind:ident, $help:literal, [$($label:literal),*]) => {
        pub static $ident: Desc = Desc {
            name: concat!("triax_", $subsystem, "_", $name),
            help: $help,
            kind: MetricKind::$kind,
            labels: &[$($label),*],
        };
    };
}

// ── Controller ──────────────────────────────────────────────────────

desc!(CTRL_UP, "eoc_controller", "up", Gauge, "indicator whether controller is reachable", []);
desc!(CTRL_INFO, "eoc_controller", "info", Gauge, "controller infos about the installed software", ["serial", "eth_mac", "version"]);
desc!(CTRL_UPTIME, "eoc_controller", "uptime", Counter, "uptime of controller in seconds", []);
desc!(CTRL_LOAD, "eoc_controller", "load", Gauge, "current system load of controller", []);
desc!(CTRL_MEM_TOTAL, "eoc_controller", "mem_total", Gauge, "total system memory of controller in bytes", []);
desc!(CTRL_MEM_FREE, "eoc_controller", "mem_free", Gauge, "free system memory of controller in bytes", []);
desc!(CTRL_MEM_BUFFERED, "eoc_controller", "mem_buffered", Gauge, "buffered system memory of controller in bytes", []);
desc!(CTRL_MEM_SHARED, "eoc_controller", "mem_shared", Gauge, "shared system memory of controller in bytes", []);
desc!(CTRL_GHN_ONLINE, "eoc_controller", "ghn_endpoints_online", Gauge, "number of endpoints online for a G.hn port", ["port"]);
desc!(CTRL_GHN_REGISTERED, "eoc_controller", "ghn_endpoints_registered", Gauge, "number of endpoints registered for a G.hn port", ["port"]);

// ── Endpoint ────────────────────────────────────────────────────────

desc!(NODE_INFO, "eoc_endpoint", "info", Gauge, "endpoint hardware information", ["name", "serial", "mac", "model"]);
desc!(NODE_STATUS, "eoc_endpoint", "status", Gauge, "current endpoint status", ["name"]);
desc!(NODE_UPTIME, "eoc_endpoint", "uptime", Counter, "uptime of endpoint in seconds", ["name"]);
desc!(NODE_OFFLINE, "eoc_endpoint", "offline_since", Gauge, "offline since unix timestamp", ["name"]);
desc!(NODE_LOAD, "eoc_endpoint", "load", Gauge, "current system load of endpoint", ["name"]);
desc!(NODE_GHN_PORT, "eoc_endpoint", "ghn_port", Gauge, "G.hn port number", ["name", "ghn_mac"]);
desc!(NODE_CLIENTS, "eoc_endpoint", "clients", Gauge, "number of connected WLAN clients", ["name", "band"]);

desc!(COUNTER_BYTES, "eoc_endpoint", "interface_bytes", Counter, "total bytes transmitted or received", ["name", "interface", "direction"]);
desc!(COUNTER_PACKETS, "eoc_endpoint", "interface_packets", Counter, "total packets transmitted or received", ["name", "interface", "direction"]);
desc!(COUNTER_ERRORS, "eoc_endpoint", "interface_errors", Counter, "total number of errors", ["name", "interface", "direction"]);

desc!(GHN_RXBPS, "eoc_endpoint", "ghn_rxbps", Gauge, "negotiated RX rate in bps", ["name"]);
desc!(GHN_TXBPS, "eoc_endpoint", "ghn_txbps", Gauge, "negotiated TX rate in bps", ["name"]);
desc!(GHN_SNR_MIN, "eoc_endpoint", "ghn_snr_min", Gauge, "minimum G.hn signal to noise ratio", ["name", "side"]);
desc!(GHN_SNR_AVG, "eoc_endpoint", "ghn_snr_avg", Gauge, "average G.hn signal to noise ratio", ["name", "side"]);
desc!(GHN_SNR_MAX, "eoc_endpoint", "ghn_snr_max", Gauge, "maximum G.hn signal to noise ratio", ["name", "side"]);
desc!(GHN_WIRE_LENGTH, "eoc_endpoint", "ghn_wire_length", Gauge, "estimated G.hn wire length in meters", ["name"]);

/// Every metric family, in exposition order.
pub static ALL: &[&Desc] = &[
    &CTRL_UP,
    &CTRL_INFO,
    &CTRL_UPTIME,
    &CTRL_LOAD,
    &CTRL_MEM_TOTAL,
    &CTRL_MEM_FREE,
    &CTRL_MEM_BUFFERED,
    &CTRL_MEM_SHARED,
    &CTRL_GHN_ONLINE,
    &CTRL_GHN_REGISTERED,
    &NODE_INFO,
    &NODE_STATUS,
    &NODE_UPTIME,
    &NODE_OFFLINE,
    &NODE_LOAD,
    &NODE_GHN_PORT,
    &NODE_CLIENTS,
    &COUNTER_BYTES,
    &COUNTER_PACKETS,
    &COUNTER_ERRORS,
    &GHN_RXBPS,
    &GHN_TXBPS,
    &GHN_SNR_MIN,
    &GHN_SNR_AVG,
    &GHN_SNR_MAX,
    &GHN_WIRE_LENGTH,
];

const SIDE_ENDPOINT: &str = "endpoint";
const SIDE_CONTROLLER: &str = "controller";

/// Lossy by nature: metric values are floats.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn float(v: u64) -> f64 {
    v as f64
}

struct Emitter<'a> {
    sink: &'a mut dyn MetricSink,
}

impl Emitter<'_> {
    fn emit(&mut self, desc: &'static Desc, value: f64, labels: &[&str]) {
        debug_assert_eq!(desc.labels.len(), labels.len(), "label mismatch for {}", desc.name);
        self.sink.record(Sample {
            desc,
            value,
            labels: labels.iter().map(|l| (*l).to_owned()).collect(),
        });
    }

    fn counters(&mut self, counters: &Counters, node: &str, ifname: &str) {
        self.emit(&COUNTER_BYTES, float(counters.rx_bytes), &[node, ifname, "rx"]);
        self.emit(&COUNTER_BYTES, float(counters.tx_bytes), &[node, ifname, "tx"]);
        self.emit(&COUNTER_PACKETS, float(counters.rx_packets), &[node, ifname, "rx"]);
        self.emit(&COUNTER_PACKETS, float(counters.tx_packets), &[node, ifname, "tx"]);
        self.emit(&COUNTER_ERRORS, float(counters.rx_errors), &[node, ifname, "rx"]);
        self.emit(&COUNTER_ERRORS, float(counters.tx_errors), &[node, ifname, "tx"]);
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn endpoint(&mut self, node: &Endpoint) {
        let name = node.name.as_str();

        if let Some(serial) = &node.serial {
            let model = node.model.as_deref().unwrap_or_default();
            self.emit(&NODE_INFO, 1.0, &[name, serial, &node.mac, model]);
        }
        self.emit(&NODE_STATUS, node.status as f64, &[name]);

        match node.presence {
            Presence::Online { uptime } => self.emit(&NODE_UPTIME, float(uptime), &[name]),
            Presence::OfflineSince(since) => {
                self.emit(&NODE_OFFLINE, since.timestamp() as f64, &[name]);
            }
            Presence::Unknown => {}
        }

        if let Some(load) = node.load {
            self.emit(&NODE_LOAD, load, &[name]);
        }

        if let Some(port) = &node.ghn_port {
            if let Some(number) = port.number.known() {
                self.emit(&NODE_GHN_PORT, f64::from(number), &[name, &port.mac]);
            }
        }

        for iface in &node.interfaces {
            self.counters(&iface.counters, name, &iface.name);
        }

        for band in &node.wireless {
            self.emit(&NODE_CLIENTS, float(band.clients), &[name, &band.band.to_string()]);
        }

        if let Some(ghn) = &node.ghn {
            if let Some(rx) = ghn.rx_bps {
                self.emit(&GHN_RXBPS, float(rx), &[name]);
            }
            if let Some(tx) = ghn.tx_bps {
                self.emit(&GHN_TXBPS, float(tx), &[name]);
            }
            if let Some(snr) = ghn.snr {
                self.emit(&GHN_SNR_MIN, snr.min, &[name, SIDE_ENDPOINT]);
                self.emit(&GHN_SNR_AVG, snr.avg, &[name, SIDE_ENDPOINT]);
                self.emit(&GHN_SNR_MAX, snr.max, &[name, SIDE_ENDPOINT]);
            }
        }
    }
}

impl Metrics {
    /// Flatten this snapshot into metric tuples.
    ///
    /// The `up` indicator is not part of a snapshot; whoever drives the
    /// collection records it.
    pub fn emit(&self, sink: &mut dyn MetricSink) {
        let mut out = Emitter { sink };
        let ctrl = &self.controller;

        out.emit(&CTRL_INFO, 1.0, &[&ctrl.serial, &ctrl.mac, &ctrl.version]);
        out.emit(&CTRL_UPTIME, float(self.uptime), &[]);
        if let Some(load) = self.load {
            out.emit(&CTRL_LOAD, load, &[]);
        }

        out.emit(&CTRL_MEM_TOTAL, float(self.memory.total), &[]);
        out.emit(&CTRL_MEM_FREE, float(self.memory.free), &[]);
        if let Some(buffered) = self.memory.buffered {
            out.emit(&CTRL_MEM_BUFFERED, float(buffered), &[]);
        }
        if let Some(shared) = self.memory.shared {
            out.emit(&CTRL_MEM_SHARED, float(shared), &[]);
        }

        for port in self.ghn_ports.values() {
            let number = port.number.to_string();
            out.emit(&CTRL_GHN_REGISTERED, float(port.registered), &[&number]);
            out.emit(&CTRL_GHN_ONLINE, float(port.online), &[&number]);
        }

        for node in &self.endpoints {
            out.endpoint(node);
        }

        for link in &self.ghn_links {
            let name = link.name.as_str();
            out.emit(&GHN_WIRE_LENGTH, float(link.wire_length), &[name]);
            out.emit(&GHN_SNR_MIN, link.snr.min, &[name, SIDE_CONTROLLER]);
            out.emit(&GHN_SNR_AVG, link.snr.avg, &[name, SIDE_CONTROLLER]);
            out.emit(&GHN_SNR_MAX, link.snr.max, &[name, SIDE_CONTROLLER]);
        }
    }
}

/// Helper for sinks: the `up` sample for a finished collection.
pub fn up(ok: bool) -> Sample {
    Sample {
        desc: &CTRL_UP,
        value: if ok { 1.0 } else { 0.0 },
        labels: Vec::new(),
    }
}
