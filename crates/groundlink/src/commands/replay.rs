//! `replay` subcommand: drives an engine from a JSON session script.
//!
//! A script is `{"steps": [...]}`; every step has an `op` field:
//!
//! ```json
//! {"op": "discover", "uid": "PI01", "model": "anafi4k", "name": "ANAFI",
//!  "connector": {"type": "local", "technology": "wifi"}}
//! {"op": "link_connected", "uid": "PI01"}
//! {"op": "message", "uid": "PI01", "message": {"feature": "common_state",
//!  "event": {"type": "battery_state_changed", "percent": 80}}}
//! {"op": "pilot", "uid": "PI01", "command": "smart_take_off_land"}
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use groundlink_config::Config;
use groundlink_core::peripheral::CopterMotors;
use groundlink_core::piloting_itf::ManualCopterPilotingItf;
use groundlink_core::{
    ComponentDescriptor, ConnectionStateCause, DeviceConnector, DeviceConnectorTechnology,
    DeviceHandle, DeviceModel, DeviceState, Instrument, Instruments, Peripherals, PilotingItfs,
};
use groundlink_engine::{DeviceCommand, Engine, FeatureMessage, PersistentStore, Transport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::output::Printer;

// ── Script format ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Discover {
        uid: String,
        model: DeviceModel,
        name: String,
        connector: ConnectorSpec,
    },
    Lost {
        uid: String,
        connector: ConnectorSpec,
    },
    /// Application-side connect request.
    Connect {
        uid: String,
        #[serde(default)]
        connector: Option<ConnectorSpec>,
        #[serde(default)]
        password: Option<String>,
    },
    Disconnect {
        uid: String,
    },
    LinkConnecting {
        uid: String,
        connector: ConnectorSpec,
    },
    LinkConnected {
        uid: String,
    },
    LinkDisconnected {
        uid: String,
        #[serde(default)]
        cause: CauseSpec,
    },
    Message {
        uid: String,
        message: FeatureMessage,
    },
    /// Application-side manual piloting command.
    Pilot {
        uid: String,
        command: PilotCommand,
    },
    /// Application-side forget request.
    Forget {
        uid: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ConnectorSpec {
    Local { technology: TechnologySpec },
    RemoteControl { uid: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TechnologySpec {
    Wifi,
    Usb,
    Ble,
}

impl From<ConnectorSpec> for DeviceConnector {
    fn from(spec: ConnectorSpec) -> Self {
        match spec {
            ConnectorSpec::Local { technology } => DeviceConnector::local(match technology {
                TechnologySpec::Wifi => DeviceConnectorTechnology::Wifi,
                TechnologySpec::Usb => DeviceConnectorTechnology::Usb,
                TechnologySpec::Ble => DeviceConnectorTechnology::Ble,
            }),
            ConnectorSpec::RemoteControl { uid } => DeviceConnector::remote_control(uid),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CauseSpec {
    #[default]
    None,
    UserRequest,
    ConnectionLost,
    Refused,
    BadPassword,
    Failure,
}

impl From<CauseSpec> for ConnectionStateCause {
    fn from(spec: CauseSpec) -> Self {
        match spec {
            CauseSpec::None => Self::None,
            CauseSpec::UserRequest => Self::UserRequest,
            CauseSpec::ConnectionLost => Self::ConnectionLost,
            CauseSpec::Refused => Self::Refused,
            CauseSpec::BadPassword => Self::BadPassword,
            CauseSpec::Failure => Self::Failure,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PilotCommand {
    TakeOff,
    ThrownTakeOff,
    Land,
    SmartTakeOffLand,
    EmergencyCutOut,
    Hover,
    Pitch(i32),
    Roll(i32),
    YawRotationSpeed(i32),
    VerticalSpeed(i32),
    MaxPitchRoll(f64),
    MaxVerticalSpeed(f64),
    MaxYawRotationSpeed(f64),
    ThrownTakeOffForSmartTakeOff(bool),
}

// ── Transport ────────────────────────────────────────────────────────

/// Prints what would go out to the device instead of sending it.
#[derive(Debug)]
struct ReplayTransport {
    printer: Printer,
}

impl Transport for ReplayTransport {
    fn connect(&self, uid: &str, connector: &DeviceConnector, password: Option<&str>) -> bool {
        let value = json!({
            "request": "connect",
            "connector": connector.to_string(),
            "with_password": password.is_some(),
        });
        self.printer.notify(uid, "transport", Some(&value));
        true
    }

    fn disconnect(&self, uid: &str) -> bool {
        self.printer
            .notify(uid, "transport", Some(&json!({ "request": "disconnect" })));
        true
    }

    fn send(&self, uid: &str, command: DeviceCommand) -> bool {
        match serde_json::to_value(&command) {
            Ok(value) => self.printer.notify(uid, "transport", Some(&value)),
            Err(e) => warn!(device = %uid, error = %e, "cannot render command"),
        }
        true
    }
}

// ── Observers ────────────────────────────────────────────────────────

/// Live observer references per device.
struct Watchers {
    printer: Printer,
    refs: HashMap<String, Vec<Box<dyn Any>>>,
}

impl Watchers {
    fn new(printer: Printer) -> Self {
        Self {
            printer,
            refs: HashMap::new(),
        }
    }

    fn watch(&mut self, device: &DeviceHandle) {
        if self.refs.contains_key(device.uid()) {
            return;
        }
        let uid = device.uid();
        let p = self.printer;
        let mut refs: Vec<Box<dyn Any>> = Vec::new();
        refs.push(Box::new(device.observe_name(p.observer::<String>(uid, "name"))));
        refs.push(Box::new(
            device.observe_state(p.observer::<DeviceState>(uid, "state")),
        ));
        refs.push(self.instrument(device, Instruments::ALARMS));
        refs.push(self.instrument(device, Instruments::ALTIMETER));
        refs.push(self.instrument(device, Instruments::BATTERY_INFO));
        refs.push(self.instrument(device, Instruments::FLYING_INDICATORS));
        refs.push(self.instrument(device, Instruments::GPS));
        refs.push(self.instrument(device, Instruments::SPEEDOMETER));
        refs.push(Box::new(device.observe_peripheral(
            Peripherals::COPTER_MOTORS,
            p.observer::<CopterMotors>(uid, Peripherals::COPTER_MOTORS.name()),
        )));
        refs.push(Box::new(device.observe_piloting_itf(
            PilotingItfs::MANUAL_COPTER,
            p.observer::<ManualCopterPilotingItf>(uid, PilotingItfs::MANUAL_COPTER.name()),
        )));
        self.refs.insert(uid.to_owned(), refs);
    }

    fn instrument<T: Instrument + Serialize>(
        &self,
        device: &DeviceHandle,
        descriptor: ComponentDescriptor<T>,
    ) -> Box<dyn Any> {
        let observer = self.printer.observer::<T>(device.uid(), descriptor.name());
        Box::new(device.observe_instrument(descriptor, observer))
    }

    /// Drops observers of devices the engine no longer knows.
    fn prune(&mut self, engine: &Engine) {
        self.refs.retain(|uid, _| engine.device(uid).is_some());
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub fn handle(args: &ReplayArgs, config: &Config, printer: Printer) -> Result<(), CliError> {
    let script = load_script(&args.script)?;

    let store = if args.ephemeral {
        PersistentStore::in_memory()
    } else {
        let path = args
            .settings
            .clone()
            .unwrap_or_else(|| config.settings_path());
        PersistentStore::open(path)?
    };
    let transport: Arc<dyn Transport> = Arc::new(ReplayTransport { printer });
    let mut engine = Engine::new(config.engine_config(), transport, store);
    let mut watchers = Watchers::new(printer);

    engine.start();
    for device in engine.devices() {
        watchers.watch(&device);
    }

    let total = script.steps.len();
    for (index, step) in script.steps.into_iter().enumerate() {
        let step_no = index + 1;
        debug!(step = step_no, ?step, "replaying step");
        apply(&mut engine, &mut watchers, step_no, step)?;
        engine.process_requests();
        watchers.prune(&engine);
    }

    info!(steps = total, devices = engine.devices().len(), "replay complete");
    Ok(())
}

fn load_script(path: &Path) -> Result<Script, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ScriptRead {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ScriptFormat {
        path: path.to_owned(),
        source,
    })
}

fn apply(
    engine: &mut Engine,
    watchers: &mut Watchers,
    step_no: usize,
    step: Step,
) -> Result<(), CliError> {
    let at = |err| CliError::at_step(step_no, err);
    match step {
        Step::Discover {
            uid,
            model,
            name,
            connector,
        } => {
            let device = engine.device_discovered(&uid, model, &name, connector.into());
            watchers.watch(&device);
        }
        Step::Lost { uid, connector } => engine.device_lost(&uid, &connector.into()).map_err(at)?,
        Step::Connect {
            uid,
            connector,
            password,
        } => {
            let connector = connector.map(DeviceConnector::from);
            if !device(engine, step_no, &uid)?.connect(connector.as_ref(), password.as_deref()) {
                warn!(step = step_no, device = %uid, "connect refused");
            }
        }
        Step::Disconnect { uid } => {
            if !device(engine, step_no, &uid)?.disconnect() {
                warn!(step = step_no, device = %uid, "disconnect refused");
            }
        }
        Step::LinkConnecting { uid, connector } => {
            engine.link_connecting(&uid, connector.into()).map_err(at)?;
        }
        Step::LinkConnected { uid } => engine.link_connected(&uid).map_err(at)?,
        Step::LinkDisconnected { uid, cause } => {
            engine.link_disconnected(&uid, cause.into()).map_err(at)?;
        }
        Step::Message { uid, message } => engine.message(&uid, &message).map_err(at)?,
        Step::Pilot { uid, command } => pilot(&device(engine, step_no, &uid)?, step_no, command)?,
        Step::Forget { uid } => {
            if !device(engine, step_no, &uid)?.forget() {
                warn!(step = step_no, device = %uid, "forget refused");
            }
        }
    }
    Ok(())
}

fn device(engine: &Engine, step_no: usize, uid: &str) -> Result<DeviceHandle, CliError> {
    engine.device(uid).ok_or_else(|| CliError::DeviceNotFound {
        step: step_no,
        uid: uid.to_owned(),
    })
}

fn pilot(device: &DeviceHandle, step_no: usize, command: PilotCommand) -> Result<(), CliError> {
    let itf = device
        .piloting_itf(PilotingItfs::MANUAL_COPTER)
        .ok_or_else(|| CliError::Step {
            step: step_no,
            reason: format!("device '{}' has no manual piloting interface", device.uid()),
        })?;
    let sent = match command {
        PilotCommand::TakeOff => {
            itf.take_off();
            true
        }
        PilotCommand::ThrownTakeOff => {
            itf.thrown_take_off();
            true
        }
        PilotCommand::Land => {
            itf.land();
            true
        }
        PilotCommand::SmartTakeOffLand => {
            itf.smart_take_off_land();
            true
        }
        PilotCommand::EmergencyCutOut => {
            itf.emergency_cut_out();
            true
        }
        PilotCommand::Hover => {
            itf.hover();
            true
        }
        PilotCommand::Pitch(value) => {
            itf.set_pitch(value);
            true
        }
        PilotCommand::Roll(value) => {
            itf.set_roll(value);
            true
        }
        PilotCommand::YawRotationSpeed(value) => {
            itf.set_yaw_rotation_speed(value);
            true
        }
        PilotCommand::VerticalSpeed(value) => {
            itf.set_vertical_speed(value);
            true
        }
        PilotCommand::MaxPitchRoll(value) => itf.set_max_pitch_roll(value),
        PilotCommand::MaxVerticalSpeed(value) => itf.set_max_vertical_speed(value),
        PilotCommand::MaxYawRotationSpeed(value) => itf.set_max_yaw_rotation_speed(value),
        PilotCommand::ThrownTakeOffForSmartTakeOff(enabled) => {
            itf.set_use_thrown_take_off_for_smart_take_off(enabled)
        }
    };
    if !sent {
        debug!(step = step_no, ?command, "setting unchanged, nothing sent");
    }
    Ok(())
}
