use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use fill_traits::Clock;
use serialport::SerialPort;

use crate::command::Command;
use crate::error::HwError;
use crate::frame;
use crate::pressure::{PressureConverter, clip_raw};
use crate::sim::{SimShadow, SimulationMode};
use crate::snapshot::{FootSwitchLatch, SensorSnapshot, WeightHistory};

/// Device paths probed in order at startup. Neither existing is fatal.
pub const DEVICE_CANDIDATES: [&str; 2] = ["/dev/ttyACM0", "/dev/ttyUSB0"];
pub const BAUD_RATE: u32 = 19200;
pub const TICK: Duration = Duration::from_millis(5);
pub const READ_TIMEOUT: Duration = Duration::from_millis(50);
const COMMAND_QUEUE_CAPACITY: usize = 16;
const CONNECTED_WINDOW_MS: u64 = 1000;

struct Shared {
    snapshot: Mutex<SensorSnapshot>,
    history: Mutex<WeightHistory>,
    foot_latch: FootSwitchLatch,
    previous_foot_raw: AtomicBool,
}

/// Cheaply-cloneable handle into the running engine. The sequencer and the
/// UI adapter hold this; only the engine's own thread touches the serial
/// port directly.
#[derive(Clone)]
pub struct HardwareHandle {
    shared: Arc<Shared>,
    commands: Sender<Command>,
    stop: Arc<AtomicBool>,
    mode: SimulationMode,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl HardwareHandle {
    pub fn read_snapshot(&self) -> SensorSnapshot {
        let mut snap = *self
            .shared
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        snap.foot_switch_latched = self.shared.foot_latch.peek();
        snap
    }

    /// True iff a frame was successfully parsed within the last second.
    pub fn connected(&self) -> bool {
        match self.read_snapshot().last_rx_monotonic {
            Some(t) => self.clock.ms_since(t) < CONNECTED_WINDOW_MS,
            None => false,
        }
    }

    /// Sequencer-facing acknowledgment of a pedal press.
    pub fn try_consume_foot_switch(&self) -> bool {
        self.shared.foot_latch.try_consume()
    }

    /// Enqueue a command; drops and logs on a full queue rather than
    /// blocking the caller.
    pub fn post(&self, cmd: Command) {
        if self.commands.try_send(cmd).is_err() {
            tracing::warn!(?cmd, "command queue full; dropping");
        }
    }

    pub fn simulation_mode(&self) -> &SimulationMode {
        &self.mode
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Owns the engine's background thread. Dropping it stops and joins the
/// thread; clone `handle()` to share read/write access with other threads.
pub struct HardwareEngine {
    handle: HardwareHandle,
    join: Option<JoinHandle<()>>,
}

impl HardwareEngine {
    /// Spawns the background serial thread. In `SimulationMode::Real`,
    /// probes `DEVICE_CANDIDATES` and fails fatally if neither path
    /// exists; the same path is retried (non-fatally) every tick if the
    /// open itself fails once the thread is running.
    pub fn spawn(
        mode: SimulationMode,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, HwError> {
        let device_path = if mode.is_simulated() {
            None
        } else {
            Some(discover_device(&DEVICE_CANDIDATES)?)
        };

        let shared = Arc::new(Shared {
            snapshot: Mutex::new(SensorSnapshot::default()),
            history: Mutex::new(WeightHistory::new()),
            foot_latch: FootSwitchLatch::new(),
            previous_foot_raw: AtomicBool::new(false),
        });
        let (tx, rx) = crossbeam_channel::bounded(COMMAND_QUEUE_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));

        let handle = HardwareHandle {
            shared: shared.clone(),
            commands: tx,
            stop: stop.clone(),
            mode: mode.clone(),
            clock: clock.clone(),
        };

        let thread_clock = clock.clone();
        let join = thread::Builder::new()
            .name("fill-hardware".into())
            .spawn(move || run_loop(shared, rx, stop, mode, device_path, thread_clock))
            .map_err(HwError::Io)?;

        Ok(Self {
            handle,
            join: Some(join),
        })
    }

    pub fn handle(&self) -> HardwareHandle {
        self.handle.clone()
    }
}

impl Drop for HardwareEngine {
    fn drop(&mut self) {
        self.handle.request_stop();
        if let Some(join) = self.join.take() {
            match join.join() {
                Ok(()) => {}
                Err(_) => tracing::error!("hardware engine thread panicked"),
            }
        }
    }
}

fn discover_device(candidates: &[&str]) -> Result<String, HwError> {
    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Ok((*candidate).to_string());
        }
    }
    Err(HwError::NoDevice(
        candidates.iter().map(|s| s.to_string()).collect(),
    ))
}

fn open_serial(path: &str) -> Result<BufReader<Box<dyn SerialPort>>, HwError> {
    let port = serialport::new(path, BAUD_RATE)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|e| HwError::Open(e.to_string()))?;
    Ok(BufReader::new(port))
}

fn read_line(reader: &mut BufReader<Box<dyn SerialPort>>) -> Result<Option<String>, HwError> {
    use std::io::BufRead;
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf)),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(HwError::Io(e)),
    }
}

fn run_loop(
    shared: Arc<Shared>,
    commands: Receiver<Command>,
    stop: Arc<AtomicBool>,
    mode: SimulationMode,
    device_path: Option<String>,
    clock: Arc<dyn Clock + Send + Sync>,
) {
    tracing::debug!("hardware engine thread running");
    let converter = PressureConverter::new();
    let mut port: Option<BufReader<Box<dyn SerialPort>>> = None;

    while !stop.load(Ordering::Acquire) {
        match &mode {
            SimulationMode::Simulated(shadow) => {
                apply_simulated(&shared, shadow, &converter, &clock);
            }
            SimulationMode::Real => {
                let path = device_path
                    .as_deref()
                    .expect("device_path is Some whenever mode is Real");
                if port.is_none() {
                    match open_serial(path) {
                        Ok(p) => port = Some(p),
                        Err(e) => {
                            tracing::warn!(error = %e, path, "serial open failed; retrying");
                        }
                    }
                }
                if let Some(p) = port.as_mut() {
                    match read_line(p) {
                        Ok(Some(line)) => handle_line(&shared, &converter, &clock, &line),
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "serial read error; will reopen");
                            port = None;
                        }
                    }
                }
            }
        }

        if stop.load(Ordering::Acquire) {
            break;
        }

        if let Ok(cmd) = commands.try_recv() {
            match (&mode, port.as_mut()) {
                (SimulationMode::Simulated(_), _) => {
                    tracing::debug!(?cmd, "simulated command (not transmitted)");
                }
                (SimulationMode::Real, Some(p)) => {
                    let wire = cmd.encode();
                    if let Err(e) = std::io::Write::write_all(p.get_mut(), wire.as_bytes()) {
                        tracing::warn!(error = %e, "serial write failed; not retried");
                    }
                }
                (SimulationMode::Real, None) => {
                    tracing::warn!(?cmd, "no open port; command dropped");
                }
            }
        }

        clock.sleep(TICK);
    }

    tracing::debug!("hardware engine thread stopped");
}

fn handle_line(
    shared: &Shared,
    converter: &PressureConverter,
    clock: &Arc<dyn Clock + Send + Sync>,
    line: &str,
) {
    match frame::parse_line(line) {
        Ok(parsed) => {
            let raw_clipped = clip_raw(parsed.pressure_raw);
            let stable = {
                let mut hist = shared.history.lock().unwrap_or_else(|e| e.into_inner());
                hist.push(parsed.weight_cg)
            };
            let prev_foot = shared
                .previous_foot_raw
                .swap(parsed.foot_switch, Ordering::AcqRel);
            shared
                .foot_latch
                .set_on_rising_edge(parsed.foot_switch, prev_foot);

            let mut snap = shared.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            snap.weight_cg = parsed.weight_cg;
            snap.pressure_raw = raw_clipped;
            snap.pressure_psi = converter.raw_to_psi(raw_clipped);
            snap.stop_switch = parsed.stop_switch;
            snap.foot_switch = parsed.foot_switch;
            snap.stable = stable;
            snap.last_rx_monotonic = Some(clock.now());
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed frame discarded");
        }
    }
}

fn apply_simulated(
    shared: &Shared,
    shadow: &SimShadow,
    converter: &PressureConverter,
    clock: &Arc<dyn Clock + Send + Sync>,
) {
    let weight_cg = shadow.weight_cg();
    let stable = {
        let mut hist = shared.history.lock().unwrap_or_else(|e| e.into_inner());
        hist.push(weight_cg)
    };
    let raw_clipped = clip_raw(shadow.pressure_raw());
    let foot = shadow.foot_switch();
    let prev_foot = shared.previous_foot_raw.swap(foot, Ordering::AcqRel);
    shared.foot_latch.set_on_rising_edge(foot, prev_foot);

    let mut snap = shared.snapshot.lock().unwrap_or_else(|e| e.into_inner());
    snap.weight_cg = weight_cg;
    snap.pressure_raw = raw_clipped;
    snap.pressure_psi = converter.raw_to_psi(raw_clipped);
    snap.stop_switch = shadow.stop_switch();
    snap.foot_switch = foot;
    snap.stable = stable;
    snap.last_rx_monotonic = Some(clock.now());
}
