// ── Component model ──
//
// A component is one published facet of a device (an instrument, a
// peripheral or a piloting interface). Each kind has a fixed integer uid and
// at most one live snapshot per device store.

mod base;

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

pub use base::{ComponentCore, ComponentLifecycle};

use crate::instrument::{Alarms, Altimeter, BatteryInfo, FlyingIndicators, Gps, Speedometer};
use crate::peripheral::CopterMotors;
use crate::piloting_itf::ManualCopterPilotingItf;

/// Integer identity of a component kind inside one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ComponentUid(pub u32);

impl fmt::Display for ComponentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable component snapshot that can live in a [`ComponentStoreCore`].
///
/// [`ComponentStoreCore`]: crate::store::ComponentStoreCore
pub trait Component: fmt::Debug + Send + Sync + 'static {
    /// Kind identity, used as the store slot.
    fn uid(&self) -> ComponentUid;
}

/// Marker for components published in a device instrument store.
pub trait Instrument: Component {}

/// Marker for components published in a device peripheral store.
pub trait Peripheral: Component {}

/// Marker for components published in a device piloting interface store.
pub trait PilotingItf: Component {}

/// Typed key binding a component uid to its snapshot type.
pub struct ComponentDescriptor<T> {
    uid: ComponentUid,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentDescriptor<T> {
    pub const fn new(uid: ComponentUid, name: &'static str) -> Self {
        Self {
            uid,
            name,
            _marker: PhantomData,
        }
    }

    pub const fn uid(&self) -> ComponentUid {
        self.uid
    }

    /// Short kind name, for logs and CLI output.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ComponentDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentDescriptor<T> {}

impl<T> fmt::Debug for ComponentDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .finish()
    }
}

// ── Kind enumerations ──

/// Instrument kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum InstrumentUid {
    Alarms,
    Altimeter,
    BatteryInfo,
    FlyingIndicators,
    Gps,
    Speedometer,
}

/// Peripheral kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PeripheralUid {
    CopterMotors,
}

/// Piloting interface kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PilotingItfUid {
    ManualCopter,
}

impl InstrumentUid {
    #[allow(clippy::as_conversions)]
    pub const fn uid(self) -> ComponentUid {
        ComponentUid(self as u32)
    }
}

impl PeripheralUid {
    #[allow(clippy::as_conversions)]
    pub const fn uid(self) -> ComponentUid {
        ComponentUid(self as u32)
    }
}

impl PilotingItfUid {
    #[allow(clippy::as_conversions)]
    pub const fn uid(self) -> ComponentUid {
        ComponentUid(self as u32)
    }
}

impl From<InstrumentUid> for ComponentUid {
    fn from(uid: InstrumentUid) -> Self {
        uid.uid()
    }
}

impl From<PeripheralUid> for ComponentUid {
    fn from(uid: PeripheralUid) -> Self {
        uid.uid()
    }
}

impl From<PilotingItfUid> for ComponentUid {
    fn from(uid: PilotingItfUid) -> Self {
        uid.uid()
    }
}

// ── Descriptors ──

/// Instrument descriptors.
pub struct Instruments;

impl Instruments {
    pub const ALARMS: ComponentDescriptor<Alarms> =
        ComponentDescriptor::new(InstrumentUid::Alarms.uid(), "alarms");
    pub const ALTIMETER: ComponentDescriptor<Altimeter> =
        ComponentDescriptor::new(InstrumentUid::Altimeter.uid(), "altimeter");
    pub const BATTERY_INFO: ComponentDescriptor<BatteryInfo> =
        ComponentDescriptor::new(InstrumentUid::BatteryInfo.uid(), "battery_info");
    pub const FLYING_INDICATORS: ComponentDescriptor<FlyingIndicators> =
        ComponentDescriptor::new(InstrumentUid::FlyingIndicators.uid(), "flying_indicators");
    pub const GPS: ComponentDescriptor<Gps> =
        ComponentDescriptor::new(InstrumentUid::Gps.uid(), "gps");
    pub const SPEEDOMETER: ComponentDescriptor<Speedometer> =
        ComponentDescriptor::new(InstrumentUid::Speedometer.uid(), "speedometer");
}

/// Peripheral descriptors.
pub struct Peripherals;

impl Peripherals {
    pub const COPTER_MOTORS: ComponentDescriptor<CopterMotors> =
        ComponentDescriptor::new(PeripheralUid::CopterMotors.uid(), "copter_motors");
}

/// Piloting interface descriptors.
pub struct PilotingItfs;

impl PilotingItfs {
    pub const MANUAL_COPTER: ComponentDescriptor<ManualCopterPilotingItf> =
        ComponentDescriptor::new(PilotingItfUid::ManualCopter.uid(), "manual_copter");
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn instrument_uids_are_distinct() {
        let uids: HashSet<_> = InstrumentUid::iter().map(InstrumentUid::uid).collect();
        assert_eq!(uids.len(), InstrumentUid::iter().count());
    }

    #[test]
    fn descriptors_match_their_kind() {
        assert_eq!(Instruments::GPS.uid(), InstrumentUid::Gps.uid());
        assert_eq!(Instruments::ALARMS.name(), "alarms");
        assert_eq!(
            PilotingItfs::MANUAL_COPTER.uid(),
            ComponentUid::from(PilotingItfUid::ManualCopter)
        );
    }
}
