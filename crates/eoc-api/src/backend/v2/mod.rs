// Older controller firmware (2.x)
//
// Login: `POST api/login/`, session token in the body field `cookie`.
// Collection: five read-only documents under `api/`, joined on hardware
// addresses.

mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use tracing::debug;

use self::types::{Board, EocConfig, GhnPortStatus, LoginResponse, Node, NodeTable, SysInfo};
use crate::backend::{Backend, login_rejection};
use crate::client::SessionClient;
use crate::error::Error;
use crate::model::{
    ControllerInfo, Endpoint, GhnPort, GhnStats, InterfaceCounters, Memory, Metrics, PortOrder,
    PortRef, Presence, WirelessBand,
};
use crate::quoted;

pub const NAME: &str = "v2";

const LOGIN_PATH: &str = "api/login/";
const BOARD_PATH: &str = "api/system/board";
const SYSINFO_PATH: &str = "api/system/info";
const SYSEOC_PATH: &str = "api/config/system/eoc";
const GHN_STATUS_PATH: &str = "api/ghn/status";
const NODE_STATUS_PATH: &str = "api/node/status/";

/// Backend for 2.x firmware.
#[derive(Debug, Clone, Copy, Default)]
pub struct V2;

#[async_trait]
impl Backend for V2 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn api_root(&self) -> &'static str {
        "api/"
    }

    async fn login(&self, client: &SessionClient) -> Result<(), Error> {
        let body = serde_json::to_value(client.credentials().login_request())
            .map_err(Error::Encode)?;
        let resp = client
            .request_raw(Method::POST, LOGIN_PATH, Some(&body))
            .await
            .map_err(login_rejection)?;

        let login: LoginResponse = resp.json()?;
        if login.cookie.is_empty() {
            return Err(if login.message.is_empty() {
                Error::Protocol {
                    message: "login response carries no session cookie".into(),
                }
            } else {
                Error::Authentication {
                    message: login.message,
                }
            });
        }

        client.set_cookie(&login.cookie)
    }

    async fn metrics(&self, client: &SessionClient) -> Result<Metrics, Error> {
        let status = Status {
            board: client.get(BOARD_PATH).await?,
            sysinfo: client.get(SYSINFO_PATH).await?,
            syseoc: client.get(SYSEOC_PATH).await?,
            ghn: client
                .get::<Option<Vec<GhnPortStatus>>>(GHN_STATUS_PATH)
                .await?
                .unwrap_or_default(),
            nodes: client
                .get::<Option<NodeTable>>(NODE_STATUS_PATH)
                .await?
                .unwrap_or_default(),
        };
        debug!(
            ports = status.ghn.len(),
            nodes = status.nodes.len(),
            "v2 status fetched"
        );
        status.assemble()
    }
}

/// Everything one collection fetches, before translation.
struct Status {
    board: Board,
    sysinfo: SysInfo,
    syseoc: EocConfig,
    ghn: Vec<GhnPortStatus>,
    nodes: NodeTable,
}

impl Status {
    fn assemble(self) -> Result<Metrics, Error> {
        let ports = &self.syseoc.macaddr;

        let ghn_ports = self
            .ghn
            .iter()
            .map(|port| {
                (
                    port.mac.to_ascii_lowercase(),
                    GhnPort {
                        number: ports.position(&port.mac),
                        registered: port.registered,
                        online: port.connected,
                    },
                )
            })
            .collect();

        let endpoints = self
            .nodes
            .values()
            .map(|node| endpoint(node, ports))
            .collect::<Result<Vec<_>, _>>()?;

        let mem = &self.sysinfo.memory;
        Ok(Metrics {
            controller: ControllerInfo {
                serial: self.board.serial,
                mac: self.board.ethmac,
                version: self.board.release.revision,
            },
            uptime: self.sysinfo.uptime,
            load: Some(self.sysinfo.load),
            memory: Memory {
                total: mem.total,
                free: mem.free,
                buffered: Some(mem.buffered),
                shared: Some(mem.shared),
            },
            ghn_ports,
            endpoints,
            ghn_links: Vec::new(),
        })
    }
}

fn endpoint(node: &Node, ports: &PortOrder) -> Result<Endpoint, Error> {
    // A malformed timestamp fails the collection even for online nodes.
    let registered = node
        .regts
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(registration_time)
        .transpose()?;

    let presence = match (&node.sysinfo, registered) {
        (Some(sys), _) => Presence::Online { uptime: sys.uptime },
        (None, Some(since)) => Presence::OfflineSince(since),
        (None, None) => Presence::Unknown,
    };

    let ghn_port = node
        .ghn_master
        .as_deref()
        .filter(|mac| !mac.is_empty())
        .map(|mac| PortRef {
            mac: mac.to_owned(),
            number: ports.position(mac),
        });

    let stats = &node.statistics;
    let interfaces = stats
        .ethernet
        .iter()
        .filter(|eth| eth.link)
        .map(|eth| InterfaceCounters {
            name: format!("eth{}", eth.port),
            counters: (&eth.counters).into(),
        })
        .chain(stats.wireless.iter().map(|wl| InterfaceCounters {
            name: format!("wifi{}", wl.band),
            counters: (&wl.counters).into(),
        }))
        .collect();

    Ok(Endpoint {
        name: node.name.clone(),
        mac: node.mac.clone(),
        serial: node.serial.clone().filter(|s| !s.is_empty()),
        model: None,
        status: node.statusid,
        status_text: node.status.clone(),
        presence,
        load: node.sysinfo.as_ref().map(|sys| sys.load),
        ghn_port,
        interfaces,
        wireless: stats
            .wireless
            .iter()
            .map(|wl| WirelessBand {
                band: wl.band,
                clients: wl.clients,
            })
            .collect(),
        ghn: node.ghn_stats.as_ref().map(|ghn| GhnStats {
            rx_bps: Some(ghn.rxbps),
            tx_bps: Some(ghn.txbps),
            snr: None,
        }),
    })
}

fn registration_time(raw: &str) -> Result<DateTime<Utc>, Error> {
    let secs = quoted::parse_int(raw).map_err(|source| Error::Parse {
        field: "regts",
        value: raw.to_owned(),
        source,
    })?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| Error::Protocol {
        message: format!("registration timestamp {secs} out of range"),
    })
}
