// ── Device models ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum DroneModel {
    #[strum(serialize = "anafi4k")]
    Anafi4k,
    #[strum(serialize = "anafiThermal")]
    AnafiThermal,
    #[strum(serialize = "anafiUa")]
    AnafiUa,
    #[strum(serialize = "anafiUsa")]
    AnafiUsa,
}

impl DroneModel {
    pub const fn internal_id(self) -> u16 {
        match self {
            Self::Anafi4k => 0x0914,
            Self::AnafiThermal => 0x0919,
            Self::AnafiUa => 0x091b,
            Self::AnafiUsa => 0x091e,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum RemoteControlModel {
    #[strum(serialize = "skyCtrl3")]
    SkyCtrl3,
    #[strum(serialize = "skyCtrlUA")]
    SkyCtrlUa,
}

impl RemoteControlModel {
    pub const fn internal_id(self) -> u16 {
        match self {
            Self::SkyCtrl3 => 0x0918,
            Self::SkyCtrlUa => 0x091c,
        }
    }
}

/// Any supported device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    Drone(DroneModel),
    RemoteControl(RemoteControlModel),
}

impl DeviceModel {
    pub const fn internal_id(self) -> u16 {
        match self {
            Self::Drone(model) => model.internal_id(),
            Self::RemoteControl(model) => model.internal_id(),
        }
    }

    /// Uid used for the per-model default device entry.
    pub fn default_model_uid(self) -> String {
        format!("default-{self}")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn from_internal_id(id: u16) -> Option<Self> {
        Self::all().find(|model| model.internal_id() == id)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        DroneModel::iter()
            .map(Self::Drone)
            .chain(RemoteControlModel::iter().map(Self::RemoteControl))
    }

    pub const fn is_drone(self) -> bool {
        matches!(self, Self::Drone(_))
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drone(model) => fmt::Display::fmt(model, f),
            Self::RemoteControl(model) => fmt::Display::fmt(model, f),
        }
    }
}

/// Error returned when parsing an unknown model name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for DeviceModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DroneModel::from_str(s)
            .map(Self::Drone)
            .or_else(|_| RemoteControlModel::from_str(s).map(Self::RemoteControl))
            .map_err(|_| UnknownModel(s.to_owned()))
    }
}

impl Serialize for DeviceModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_and_ids_resolve_both_ways() {
        for model in DeviceModel::all() {
            assert_eq!(DeviceModel::from_name(&model.to_string()), Some(model));
            assert_eq!(DeviceModel::from_internal_id(model.internal_id()), Some(model));
        }
        assert_eq!(
            DeviceModel::from_name("skyCtrlUA"),
            Some(DeviceModel::RemoteControl(RemoteControlModel::SkyCtrlUa))
        );
        assert_eq!(DeviceModel::from_internal_id(0x0914).unwrap().to_string(), "anafi4k");
        assert!(DeviceModel::from_name("bebop").is_none());
    }

    #[test]
    fn default_model_uid_uses_name() {
        let model = DeviceModel::Drone(DroneModel::AnafiThermal);
        assert_eq!(model.default_model_uid(), "default-anafiThermal");
    }
}
