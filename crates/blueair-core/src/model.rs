// ── Device snapshot model ──
//
// The coordinator's full picture of one device, built wholesale from a
// single info response and replaced atomically per poll. Optimistic
// writes patch individual attributes between polls.

use std::collections::HashMap;

use blueair_api::models::{CommandValue, DeviceInfoRecord};

/// A state-attribute value. The cloud distinguishes numeric and boolean
/// attributes at the wire level (`v` vs `vb`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Number(_) => None,
        }
    }
}

impl From<CommandValue> for AttributeValue {
    fn from(value: CommandValue) -> Self {
        match value {
            #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
            CommandValue::Number(v) => Self::Number(v as f64),
            CommandValue::Bool(v) => Self::Bool(v),
        }
    }
}

/// Static identity attributes reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: Option<String>,
    pub hardware_id: Option<String>,
}

/// The current full picture of one device.
///
/// Created empty at coordinator construction; an unknown reading is an
/// absent key, never a default value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub info: DeviceIdentity,
    /// Sensor readings by name (e.g. `pm2_5`, `tmp`).
    pub sensors: HashMap<String, f64>,
    /// Writable state attributes by name (e.g. `fanspeed`, `standby`).
    pub attributes: HashMap<String, AttributeValue>,
}

impl From<DeviceInfoRecord> for DeviceSnapshot {
    fn from(record: DeviceInfoRecord) -> Self {
        let info = DeviceIdentity {
            name: record.configuration.di.name,
            hardware_id: record.configuration.di.hw,
        };

        let sensors = record
            .sensor_data
            .into_iter()
            .map(|reading| (reading.n, reading.v))
            .collect();

        let attributes = record
            .states
            .into_iter()
            .filter_map(|state| {
                let value = match (state.v, state.vb) {
                    (Some(v), _) => AttributeValue::Number(v),
                    (None, Some(vb)) => AttributeValue::Bool(vb),
                    (None, None) => return None,
                };
                Some((state.n, value))
            })
            .collect();

        Self {
            info,
            sensors,
            attributes,
        }
    }
}

/// Map a hardware id to a marketing model name.
///
/// Unrecognized ids get the generic name; callers with no hardware id at
/// all fall back to the device uuid instead.
pub fn model_name(hardware_id: &str) -> &'static str {
    match hardware_id {
        "nb_m_1.0" => "Blue Pure 311i Max",
        _ => "Blueair Wi-Fi Enabled Purifier",
    }
}
