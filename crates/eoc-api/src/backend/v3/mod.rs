// Newer controller firmware (3.x)
//
// Login: `POST cgi.lua/login`; the body only reports success, the session
// token arrives in `Set-Cookie`. Collection: capabilities plus one combined
// status document.

mod types;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::SET_COOKIE;
use tracing::debug;

use self::types::{Capabilities, LoginResponse, Modem, Remote, StatusResponse};
use crate::backend::{Backend, login_rejection};
use crate::client::SessionClient;
use crate::error::Error;
use crate::model::{
    ControllerInfo, Endpoint, GhnLink, GhnPort, GhnStats, InterfaceCounters, Memory, Metrics,
    PortNumber, PortOrder, PortRef, Presence, WirelessBand,
};

pub const NAME: &str = "v3";

const LOGIN_PATH: &str = "cgi.lua/login";
const CAPABILITIES_PATH: &str = "cgi.lua/capabilities";
const STATUS_PATH: &str = "cgi.lua/status?type=system,ghn,ethernet,remote";

/// Modem indexes at or above this are not placed in the port ordering.
const MAX_PORTS: usize = 256;

/// Backend for 3.x firmware.
#[derive(Debug, Clone, Copy, Default)]
pub struct V3;

#[async_trait]
impl Backend for V3 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn api_root(&self) -> &'static str {
        "cgi.lua/"
    }

    async fn login(&self, client: &SessionClient) -> Result<(), Error> {
        let body = serde_json::to_value(client.credentials().login_request())
            .map_err(Error::Encode)?;
        let resp = client
            .request_raw(Method::POST, LOGIN_PATH, Some(&body))
            .await
            .map_err(login_rejection)?;

        let login: LoginResponse = resp.json()?;
        if !login.status {
            return Err(Error::Authentication {
                message: if login.message.is_empty() {
                    "login refused".into()
                } else {
                    login.message
                },
            });
        }

        let cookie = resp.header(SET_COOKIE.as_str()).ok_or_else(|| Error::Protocol {
            message: "login succeeded without a Set-Cookie header".into(),
        })?;
        client.set_cookie(cookie)
    }

    async fn metrics(&self, client: &SessionClient) -> Result<Metrics, Error> {
        let capabilities: Capabilities = client.get(CAPABILITIES_PATH).await?;
        let status: StatusResponse = client.get(STATUS_PATH).await?;
        debug!(
            remotes = status.remote.as_ref().map_or(0, |r| r.len()),
            "v3 status fetched"
        );
        Ok(assemble(capabilities, status))
    }
}

/// Port ordering from the modem table: each modem sits at its `index`.
fn port_order(modems: &[(&String, &Modem)]) -> PortOrder {
    let slots = modems
        .iter()
        .filter_map(|(_, m)| usize::try_from(m.index).ok())
        .filter(|i| *i < MAX_PORTS)
        .max()
        .map_or(0, |max| max + 1);
    let mut macs = vec![String::new(); slots];
    for (key, modem) in modems {
        if let Some(slot) = usize::try_from(modem.index)
            .ok()
            .and_then(|i| macs.get_mut(i))
        {
            *slot = modem_mac(key, modem).to_owned();
        }
    }
    PortOrder::new(macs)
}

fn modem_mac<'a>(key: &'a str, modem: &'a Modem) -> &'a str {
    if modem.mac.is_empty() { key } else { &modem.mac }
}

fn assemble(capabilities: Capabilities, status: StatusResponse) -> Metrics {
    let modems: Vec<_> = status.ghn.modems.iter().flatten().collect();
    let ports = port_order(&modems);

    let ghn_ports = modems
        .iter()
        .map(|(key, modem)| {
            let number = u32::try_from(modem.index.saturating_add(1))
                .map_or(PortNumber::Unknown, PortNumber::Known);
            (
                modem_mac(key, modem).to_ascii_lowercase(),
                GhnPort {
                    number,
                    registered: modem.endpoint_registered,
                    online: modem.endpoint_count,
                },
            )
        })
        .collect();

    let remotes = status.remote.unwrap_or_default();
    let mut names: HashMap<String, String> = HashMap::with_capacity(remotes.len());
    let mut endpoints = Vec::with_capacity(remotes.len());
    for (key, remote) in &remotes {
        let node = endpoint(key, remote, &ports);
        names.insert(key.to_ascii_lowercase(), node.name.clone());
        endpoints.push(node);
    }

    let ghn_links = status
        .ghn
        .nodes
        .unwrap_or_default()
        .into_iter()
        .map(|(mac, node)| GhnLink {
            name: names.get(&mac.to_ascii_lowercase()).cloned().unwrap_or(mac),
            wire_length: node.wire_length,
            snr: node.snr.into(),
        })
        .collect();

    let system = status.system;
    Metrics {
        controller: ControllerInfo {
            serial: capabilities.product.serial,
            mac: capabilities.product.mac,
            version: system.version,
        },
        uptime: system.uptime,
        load: None,
        memory: Memory {
            total: system.memory.total,
            free: system.memory.total.saturating_sub(system.memory.used),
            buffered: None,
            shared: None,
        },
        ghn_ports,
        endpoints,
        ghn_links,
    }
}

fn endpoint(key: &str, remote: &Remote, ports: &PortOrder) -> Endpoint {
    let mac = if remote.mac.is_empty() { key } else { &remote.mac };
    let system = remote.system.as_ref();
    let name = system
        .map(|s| s.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(mac);

    let presence = system
        .and_then(|s| s.uptime)
        .map_or(Presence::Unknown, |uptime| Presence::Online { uptime });

    let link = remote.ghn.first();
    let ghn_port = link.filter(|l| !l.master.is_empty()).map(|l| PortRef {
        mac: l.master.clone(),
        number: ports.position(&l.master),
    });
    let ghn = link.filter(|l| l.status.is_some()).map(|l| GhnStats {
        rx_bps: l.bitrate.as_ref().map(|b| b.rx),
        tx_bps: l.bitrate.as_ref().map(|b| b.tx),
        snr: l.snr.map(Into::into),
    });

    let interfaces = remote
        .ethernet
        .iter()
        .filter(|eth| eth.link)
        .map(|eth| InterfaceCounters {
            name: format!("eth{}", eth.port),
            counters: (&eth.counters).into(),
        })
        .chain(remote.wireless.iter().map(|wl| InterfaceCounters {
            name: format!("wifi{}", wl.band),
            counters: (&wl.counters).into(),
        }))
        .collect();

    Endpoint {
        name: name.to_owned(),
        mac: mac.to_owned(),
        serial: Some(remote.serial.clone()),
        model: system.map(|s| s.model.clone()),
        status: remote.state,
        status_text: remote.status.clone(),
        presence,
        load: None,
        ghn_port,
        interfaces,
        wireless: remote
            .wireless
            .iter()
            .map(|wl| WirelessBand {
                band: wl.band,
                clients: wl.clients,
            })
            .collect(),
        ghn,
    }
}
