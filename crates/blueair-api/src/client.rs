// Device API HTTP client.
//
// Typed wrappers over the three gateway endpoints: registered-devices,
// the per-device info query, and attribute writes. Every operation asks
// the session manager for fresh headers first, so an expired session is
// renewed before the dependent request goes out.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::SessionManager;
use crate::error::Error;
use crate::models::{
    CommandBody, CommandValue, DeviceInfoRecord, DeviceInfoResponse, DeviceSummary,
    RegisteredDevicesResponse,
};

/// Typed client for the Blueair device endpoints.
///
/// Cheaply cloneable -- the session manager is shared behind an `Arc` and
/// the underlying `reqwest::Client` is itself a handle. One clone per
/// coordinator is the expected usage.
#[derive(Clone)]
pub struct ApiClient {
    session: Arc<SessionManager>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client on top of an existing session manager.
    pub fn new(session: Arc<SessionManager>) -> Self {
        let http = session.http().clone();
        Self { session, http }
    }

    /// List the devices registered to the authenticated account.
    pub async fn list_devices(&self) -> Result<Vec<DeviceSummary>, Error> {
        let url = self.gateway_url("prod/c/registered-devices")?;
        let headers = self.session.authorize().await?;

        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(Error::Transport)?;

        let body: RegisteredDevicesResponse = parse_response(resp).await?;
        Ok(body.devices)
    }

    /// Fetch sensor data and state attributes for one device.
    ///
    /// The query is filtered server-side by uuid; the response must contain
    /// exactly one matching record, otherwise the device is treated as
    /// not found.
    pub async fn get_device_info(
        &self,
        device_name: &str,
        device_uuid: &str,
    ) -> Result<DeviceInfoRecord, Error> {
        let url = self.gateway_url(&format!("prod/c/{device_name}/r/initial"))?;
        let headers = self.session.authorize().await?;

        let body = json!({
            "deviceconfigquery": [
                {
                    "id": device_uuid,
                    "r": { "r": ["sensors"] },
                },
            ],
            "includestates": true,
            "eventsubscription": {
                "include": [
                    { "filter": { "o": format!("= {device_uuid}") } },
                ],
            },
        });

        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let mut info: DeviceInfoResponse = parse_response(resp).await?;

        // The uuid filter must identify exactly one device.
        if info.device_info.len() != 1 {
            return Err(Error::DeviceNotFound {
                uuid: device_uuid.to_owned(),
            });
        }
        Ok(info.device_info.remove(0))
    }

    /// Write one attribute on a device.
    ///
    /// The wire key follows the runtime type of `value` (`v` for numbers,
    /// `vb` for booleans). Not retried on failure.
    pub async fn send_command(
        &self,
        device_uuid: &str,
        attribute: &str,
        value: CommandValue,
    ) -> Result<(), Error> {
        let url = self.gateway_url(&format!("prod/c/{device_uuid}/a/{attribute}"))?;
        let headers = self.session.authorize().await?;
        let body = CommandBody::new(attribute, value);

        debug!(attribute, ?value, "POST {}", url);
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    fn gateway_url(&self, path: &str) -> Result<Url, Error> {
        self.session
            .gateway_url()
            .join(path)
            .map_err(Error::InvalidUrl)
    }
}

/// Check the status and decode the JSON body, keeping the raw text for
/// diagnostics when the shape is unexpected.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
