// Wire types for the device endpoints.
//
// The gateway speaks a compact key scheme: `n` names an attribute, `v`
// carries a numeric value and `vb` a boolean one. The same scheme appears
// in device state reports and in command bodies.

use serde::{Deserialize, Serialize};

// ── Registered devices ──────────────────────────────────────────────

/// One device registered to the authenticated account.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    /// Opaque cloud identifier for the device.
    pub uuid: String,
    /// Cloud-side device name; also the path segment for the info query.
    pub name: String,
    /// Hardware MAC, when the cloud reports it.
    #[serde(default)]
    pub mac: Option<String>,
}

/// Response envelope for `GET /prod/c/registered-devices`.
#[derive(Debug, Deserialize)]
pub(crate) struct RegisteredDevicesResponse {
    pub devices: Vec<DeviceSummary>,
}

// ── Device info ─────────────────────────────────────────────────────

/// Response envelope for `POST /prod/c/{name}/r/initial`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceInfoResponse {
    pub device_info: Vec<DeviceInfoRecord>,
}

/// Full cloud-side picture of one device: static configuration, sensor
/// readings, and writable state attributes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfoRecord {
    pub configuration: DeviceConfiguration,
    #[serde(default)]
    pub sensor_data: Vec<SensorReading>,
    #[serde(default)]
    pub states: Vec<StateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfiguration {
    /// Device identity block (`di`): display name, hardware id, firmware...
    #[serde(default)]
    pub di: DeviceIdentity,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceIdentity {
    #[serde(default)]
    pub name: Option<String>,
    /// Hardware id, e.g. `"nb_m_1.0"`. Absent on some firmware revisions.
    #[serde(default)]
    pub hw: Option<String>,
    /// Remaining identity fields we don't interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One sensor datapoint: `{"n": "pm2_5", "v": 4.0}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SensorReading {
    pub n: String,
    pub v: f64,
}

/// One state attribute. Numeric states carry `v`, boolean states `vb`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateEntry {
    pub n: String,
    #[serde(default)]
    pub v: Option<f64>,
    #[serde(default)]
    pub vb: Option<bool>,
}

// ── Commands ────────────────────────────────────────────────────────

/// Value for an attribute write.
///
/// The wire key is chosen by the runtime type of the value -- `v` for
/// numbers, `vb` for booleans -- never by the attribute name. Some
/// attributes accept either form depending on firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandValue {
    Number(i64),
    Bool(bool),
}

impl From<i64> for CommandValue {
    fn from(v: i64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for CommandValue {
    fn from(v: u32) -> Self {
        Self::Number(i64::from(v))
    }
}

impl From<bool> for CommandValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Body for `POST /prod/c/{uuid}/a/{attribute}`.
#[derive(Debug, Serialize)]
pub(crate) struct CommandBody<'a> {
    pub n: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vb: Option<bool>,
}

impl<'a> CommandBody<'a> {
    pub(crate) fn new(attribute: &'a str, value: CommandValue) -> Self {
        match value {
            CommandValue::Number(v) => Self {
                n: attribute,
                v: Some(v),
                vb: None,
            },
            CommandValue::Bool(vb) => Self {
                n: attribute,
                v: None,
                vb: Some(vb),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_command_serializes_under_v() {
        let body = CommandBody::new("fanspeed", CommandValue::Number(42));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"n": "fanspeed", "v": 42})
        );
    }

    #[test]
    fn boolean_command_serializes_under_vb() {
        let body = CommandBody::new("nightmode", CommandValue::Bool(true));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"n": "nightmode", "vb": true})
        );
    }

    #[test]
    fn state_entries_accept_either_value_key() {
        let numeric: StateEntry =
            serde_json::from_value(json!({"n": "fanspeed", "v": 30})).unwrap();
        assert_eq!(numeric.v, Some(30.0));
        assert_eq!(numeric.vb, None);

        let boolean: StateEntry =
            serde_json::from_value(json!({"n": "standby", "vb": false})).unwrap();
        assert_eq!(boolean.v, None);
        assert_eq!(boolean.vb, Some(false));
    }
}
