// ── Alarms instrument ──

use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Instrument, Instruments,
};
use crate::store::ComponentStoreCore;

/// Alarm kinds, in table order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlarmKind {
    /// Drone battery is low or critical.
    Power,
    /// Motors were cut out.
    MotorCutOut,
    /// Emergency triggered by the user.
    UserEmergency,
    /// A motor reported an error.
    MotorError,
    BatteryTooHot,
    BatteryTooCold,
    /// Hovering is hard without GPS because it is too dark.
    HoveringDifficultiesNoGpsTooDark,
    /// Hovering is hard without GPS because the drone is too high.
    HoveringDifficultiesNoGpsTooHigh,
    /// Automatic landing is imminent because of the battery.
    AutomaticLandingBatteryIssue,
    Wind,
    VerticalCamera,
    StrongVibrations,
    MagnetometerPerturbation,
    MagnetometerLowEarthField,
    /// Controller location is too imprecise for following the pilot.
    UnreliableControllerLocation,
}

impl AlarmKind {
    pub const COUNT: usize = 15;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Power,
        Self::MotorCutOut,
        Self::UserEmergency,
        Self::MotorError,
        Self::BatteryTooHot,
        Self::BatteryTooCold,
        Self::HoveringDifficultiesNoGpsTooDark,
        Self::HoveringDifficultiesNoGpsTooHigh,
        Self::AutomaticLandingBatteryIssue,
        Self::Wind,
        Self::VerticalCamera,
        Self::StrongVibrations,
        Self::MagnetometerPerturbation,
        Self::MagnetometerLowEarthField,
        Self::UnreliableControllerLocation,
    ];

    #[allow(clippy::as_conversions)]
    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlarmLevel {
    /// The drone does not support this alarm.
    NotAvailable,
    Off,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alarm {
    pub kind: AlarmKind,
    pub level: AlarmLevel,
}

/// Published alarms snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarms {
    levels: [AlarmLevel; AlarmKind::COUNT],
    automatic_landing_delay: Duration,
}

impl Alarms {
    fn new(supported: &[AlarmKind]) -> Self {
        let mut levels = [AlarmLevel::NotAvailable; AlarmKind::COUNT];
        for kind in supported {
            levels[kind.index()] = AlarmLevel::Off;
        }
        Self {
            levels,
            automatic_landing_delay: Duration::ZERO,
        }
    }

    pub fn alarm(&self, kind: AlarmKind) -> Alarm {
        Alarm {
            kind,
            level: self.level(kind),
        }
    }

    pub fn level(&self, kind: AlarmKind) -> AlarmLevel {
        self.levels[kind.index()]
    }

    /// Delay before the automatic landing. Meaningful only while
    /// [`AlarmKind::AutomaticLandingBatteryIssue`] is not off.
    pub fn automatic_landing_delay(&self) -> Duration {
        self.automatic_landing_delay
    }

    /// Alarms currently at warning or critical level.
    pub fn active(&self) -> impl Iterator<Item = Alarm> + '_ {
        AlarmKind::ALL
            .into_iter()
            .map(move |kind| self.alarm(kind))
            .filter(|alarm| matches!(alarm.level, AlarmLevel::Warning | AlarmLevel::Critical))
    }
}

impl Component for Alarms {
    fn uid(&self) -> ComponentUid {
        Instruments::ALARMS.uid()
    }
}

impl Instrument for Alarms {}

impl Serialize for Alarms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(AlarmKind::COUNT + 1))?;
        for kind in AlarmKind::ALL {
            let name: &'static str = kind.into();
            map.serialize_entry(name, &self.level(kind))?;
        }
        map.serialize_entry(
            "automatic_landing_delay_secs",
            &self.automatic_landing_delay.as_secs_f64(),
        )?;
        map.end()
    }
}

/// Mutable alarms component owned by its feature controller.
#[derive(Debug)]
pub struct AlarmsCore {
    core: ComponentCore<Alarms>,
}

impl AlarmsCore {
    /// Supported kinds start `Off`, the others `NotAvailable`.
    pub fn new(store: &ComponentStoreCore, supported: &[AlarmKind]) -> Self {
        Self {
            core: ComponentCore::new(store, Alarms::new(supported)),
        }
    }

    pub fn update_level(&mut self, kind: AlarmKind, level: AlarmLevel) -> &mut Self {
        self.core.update_field(|a| &mut a.levels[kind.index()], level);
        self
    }

    pub fn update_automatic_landing_delay(&mut self, delay: Duration) -> &mut Self {
        self.core
            .update_field(|a| &mut a.automatic_landing_delay, delay);
        self
    }
}

impl ComponentLifecycle for AlarmsCore {
    type Snapshot = Alarms;

    fn core(&self) -> &ComponentCore<Alarms> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<Alarms> {
        &mut self.core
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn table_covers_every_kind_in_order() {
        assert_eq!(AlarmKind::iter().count(), AlarmKind::COUNT);
        for (index, kind) in AlarmKind::iter().enumerate() {
            assert_eq!(kind.index(), index);
            assert_eq!(AlarmKind::ALL[index], kind);
        }
    }

    #[test]
    fn unsupported_kinds_are_not_available() {
        let store = ComponentStoreCore::new();
        let core = AlarmsCore::new(&store, &[AlarmKind::Power, AlarmKind::Wind]);
        let alarms = core.snapshot();

        assert_eq!(alarms.level(AlarmKind::Power), AlarmLevel::Off);
        assert_eq!(alarms.level(AlarmKind::Wind), AlarmLevel::Off);
        assert_eq!(alarms.level(AlarmKind::MotorError), AlarmLevel::NotAvailable);
        assert_eq!(alarms.automatic_landing_delay(), Duration::ZERO);
    }

    #[test]
    fn batch_updates_notify_once_and_repeat_is_silent() {
        let store = ComponentStoreCore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let _reference = store.observe(Instruments::ALARMS, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let mut core = AlarmsCore::new(&store, &AlarmKind::ALL);
        core.publish();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        core.update_level(AlarmKind::Power, AlarmLevel::Critical)
            .update_level(AlarmKind::MotorCutOut, AlarmLevel::Warning)
            .notify_updated();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let alarms = store.get(Instruments::ALARMS).unwrap();
        assert_eq!(alarms.level(AlarmKind::Power), AlarmLevel::Critical);
        assert_eq!(alarms.level(AlarmKind::MotorCutOut), AlarmLevel::Warning);
        assert_eq!(alarms.level(AlarmKind::UserEmergency), AlarmLevel::Off);

        core.update_level(AlarmKind::Power, AlarmLevel::Critical)
            .notify_updated();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn landing_delay_is_published() {
        let store = ComponentStoreCore::new();
        let mut core = AlarmsCore::new(&store, &[AlarmKind::AutomaticLandingBatteryIssue]);
        core.publish();

        core.update_level(AlarmKind::AutomaticLandingBatteryIssue, AlarmLevel::Warning)
            .update_automatic_landing_delay(Duration::from_secs(12))
            .notify_updated();

        let alarms = store.get(Instruments::ALARMS).unwrap();
        assert_eq!(alarms.automatic_landing_delay(), Duration::from_secs(12));
        assert_eq!(
            alarms.active().collect::<Vec<_>>(),
            vec![Alarm {
                kind: AlarmKind::AutomaticLandingBatteryIssue,
                level: AlarmLevel::Warning,
            }]
        );
    }
}
