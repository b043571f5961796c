// ── Feature controllers ──
//
// Each controller owns one component core of a device, translates received
// feature messages into `update_*` batches and publishes or unpublishes its
// component as the link comes and goes.

mod alarms;
mod altimeter;
mod battery_info;
mod copter_motors;
mod flying_indicators;
mod gps;
mod manual_copter;
mod speedometer;

use std::sync::Arc;

use groundlink_core::DeviceCore;

pub use alarms::AlarmsController;
pub use altimeter::AltimeterController;
pub use battery_info::BatteryInfoController;
pub use copter_motors::CopterMotorsController;
pub use flying_indicators::FlyingIndicatorsController;
pub use gps::GpsController;
pub use manual_copter::ManualCopterController;
pub use speedometer::SpeedometerController;

use crate::engine::EngineConfig;
use crate::message::FeatureMessage;
use crate::settings::SettingsStore;
use crate::transport::Transport;

/// Link lifecycle and message hooks of a feature controller.
pub trait ComponentController: Send {
    fn did_connect(&mut self) {}

    fn did_disconnect(&mut self) {}

    /// The device is about to be forgotten; drop persisted data.
    fn will_forget(&mut self) {}

    fn did_receive(&mut self, message: &FeatureMessage);
}

/// What a controller needs from its device at construction.
pub struct ControllerContext<'a> {
    pub device: &'a DeviceCore,
    /// Settings dictionary of the device.
    pub settings: &'a SettingsStore,
    pub config: &'a EngineConfig,
    pub transport: &'a Arc<dyn Transport>,
}

/// Controllers for every drone feature.
pub(crate) fn drone_controllers(ctx: &ControllerContext<'_>) -> Vec<Box<dyn ComponentController>> {
    vec![
        Box::new(AlarmsController::new(ctx)),
        Box::new(GpsController::new(ctx)),
        Box::new(AltimeterController::new(ctx)),
        Box::new(FlyingIndicatorsController::new(ctx)),
        Box::new(BatteryInfoController::new(ctx)),
        Box::new(SpeedometerController::new(ctx)),
        Box::new(CopterMotorsController::new(ctx)),
        Box::new(ManualCopterController::new(ctx)),
    ]
}

/// Remote controls only report their own battery.
pub(crate) fn remote_control_controllers(
    ctx: &ControllerContext<'_>,
) -> Vec<Box<dyn ComponentController>> {
    vec![Box::new(BatteryInfoController::new(ctx))]
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use groundlink_core::{
        DeviceConnector, DeviceCore, DeviceCoreDelegate, DeviceModel, DroneModel,
    };
    use parking_lot::Mutex;

    use super::ControllerContext;
    use crate::engine::EngineConfig;
    use crate::settings::{PersistentStore, SettingsStore};
    use crate::transport::{DeviceCommand, Transport};

    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<DeviceCommand>>,
        pub connects: Mutex<Vec<String>>,
        pub disconnects: Mutex<Vec<String>>,
    }

    impl Transport for RecordingTransport {
        fn connect(&self, uid: &str, _connector: &DeviceConnector, _password: Option<&str>) -> bool {
            self.connects.lock().push(uid.to_owned());
            true
        }

        fn disconnect(&self, uid: &str) -> bool {
            self.disconnects.lock().push(uid.to_owned());
            true
        }

        fn send(&self, _uid: &str, command: DeviceCommand) -> bool {
            self.sent.lock().push(command);
            true
        }
    }

    struct NoopDelegate;

    impl DeviceCoreDelegate for NoopDelegate {
        fn forget(&self) -> bool {
            false
        }

        fn connect(&self, _connector: &DeviceConnector, _password: Option<&str>) -> bool {
            false
        }

        fn disconnect(&self) -> bool {
            false
        }
    }

    /// A lone drone with in-memory settings, for driving one controller.
    pub struct Harness {
        pub device: DeviceCore,
        pub settings: SettingsStore,
        pub config: EngineConfig,
        pub recorder: Arc<RecordingTransport>,
        pub transport: Arc<dyn Transport>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_store(&PersistentStore::in_memory(), EngineConfig::default())
        }

        pub fn with_store(store: &PersistentStore, config: EngineConfig) -> Self {
            let recorder = Arc::new(RecordingTransport::default());
            let transport: Arc<dyn Transport> = recorder.clone();
            Self {
                device: DeviceCore::new(
                    "PI040416AA0000",
                    DeviceModel::Drone(DroneModel::Anafi4k),
                    "ANAFI-0000",
                    Arc::new(NoopDelegate),
                ),
                settings: store.device("PI040416AA0000"),
                config,
                recorder,
                transport,
            }
        }

        pub fn context(&self) -> ControllerContext<'_> {
            ControllerContext {
                device: &self.device,
                settings: &self.settings,
                config: &self.config,
                transport: &self.transport,
            }
        }
    }
}
