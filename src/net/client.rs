//! Backend client: the two endpoints the node talks to.
//!
//! | Call               | Request                               |
//! |--------------------|---------------------------------------|
//! | `push_telemetry`   | `POST /api/data/{device_id}`          |
//! | `fetch_commands`   | `GET  /api/data/{device_id}/commands` |

use log::{debug, warn};

use crate::app::commands::RemoteCommand;
use crate::app::ports::BackendPort;
use crate::app::telemetry::TelemetryPayload;
use crate::config::BackendConfig;
use crate::error::{ProtocolFault, Result};

use super::http::{HttpTransport, RequestHeaders};
use super::transport::Connector;

pub struct BackendClient<C: Connector> {
    http: HttpTransport<C>,
    telemetry_path: String,
    commands_path: String,
}

impl<C: Connector> BackendClient<C> {
    pub fn new(connector: C, backend: &BackendConfig, max_response_bytes: usize) -> Self {
        let headers = RequestHeaders {
            host: backend.host.clone(),
            api_key: backend.api_key.clone(),
            user_agent: backend.user_agent.clone(),
        };
        Self {
            http: HttpTransport::new(connector, headers, backend.port, max_response_bytes),
            telemetry_path: format!("/api/data/{}", backend.device_id),
            commands_path: format!("/api/data/{}/commands", backend.device_id),
        }
    }
}

impl<C: Connector> BackendPort for BackendClient<C> {
    /// An explicit non-2xx status is a fault.  A body that is not a JSON
    /// object (including the raw fallback) decodes to "no commands".
    fn fetch_commands(&mut self) -> Result<RemoteCommand> {
        let resp = self.http.get(&self.commands_path)?;
        if let Some(code) = resp.status.filter(|c| !(200..300).contains(c)) {
            return Err(ProtocolFault::Status(code).into());
        }
        if resp.body.is_raw() {
            debug!("SYNC: non-JSON command body, treating as no commands");
        }
        Ok(RemoteCommand::from_json(&resp.body.into_value()))
    }

    /// Success only on a 2xx status.
    fn push_telemetry(&mut self, payload: &TelemetryPayload) -> Result<()> {
        let resp = self.http.post_json(&self.telemetry_path, payload)?;
        match resp.status {
            Some(200..=299) => Ok(()),
            Some(code) => Err(ProtocolFault::Status(code).into()),
            None => {
                warn!("UPLINK: response had no status line");
                Err(ProtocolFault::MissingStatus.into())
            }
        }
    }
}
