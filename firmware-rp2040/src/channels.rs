//! Timer channel implementations on Embassy primitives.
//!
//! The RP2040 has no input-capture units, so each channel is split in two:
//! a handle stored in the port registry that records what the driver asked
//! for, and a task that owns the waiting. [`run_capture`] waits for pin
//! edges and compare deadlines and feeds them to the registry;
//! [`run_tick`] paces the transmitter while the tick channel is armed.
//!
//! # Timing
//!
//! Timestamps come from the Embassy time driver, which on RP2040 runs at
//! 1 MHz, so bit periods are programmed with a prescaler of 1.

use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer, TICK_HZ};
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal_async::digital::Wait;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use softserial_core::{
    BitTiming, CaptureChannel, EdgeEvent, EdgePolarity, RxEvent, SoftSerialPortIndex,
    SoftSerialRegistry, TickChannel, TimerHardware,
};

/// Current time truncated to the 32-bit capture counter.
#[inline]
fn counter() -> u32 {
    Instant::now().as_ticks() as u32
}

/// Instant at which the 32-bit counter next reads `at`, or has just read it.
fn instant_at(at: u32) -> Instant {
    let now = Instant::now().as_ticks();
    let ahead = at.wrapping_sub(now as u32) as i32;
    Instant::from_ticks(now.saturating_add_signed(i64::from(ahead)))
}

/// Capture settings shared between a [`PicoCapture`] and its task.
pub struct CaptureState {
    enabled: AtomicBool,
    deadline_armed: AtomicBool,
    deadline: AtomicU32,
    /// Wakes the task after configure or shutdown.
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl CaptureState {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            deadline_armed: AtomicBool::new(false),
            deadline: AtomicU32::new(0),
            changed: Signal::new(),
        }
    }

    fn pending_deadline(&self) -> Option<u32> {
        self.deadline_armed
            .load(Ordering::Acquire)
            .then(|| self.deadline.load(Ordering::Relaxed))
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::new()
    }
}

/// RX side of a port: GPIO edges plus a system timer deadline.
pub struct PicoCapture {
    resource: &'static TimerHardware,
    state: &'static CaptureState,
}

impl PicoCapture {
    #[must_use]
    pub fn new(resource: &'static TimerHardware, state: &'static CaptureState) -> Self {
        Self { resource, state }
    }
}

impl CaptureChannel for PicoCapture {
    fn resource(&self) -> &'static TimerHardware {
        self.resource
    }

    fn clock_hz(&self) -> u32 {
        TICK_HZ as u32
    }

    fn configure(&mut self, timing: &BitTiming) {
        defmt::debug!(
            "GPIO{}: capture {} ticks per bit",
            self.resource.pin.pin,
            timing.bit_period()
        );
        self.state.enabled.store(true, Ordering::Release);
        self.state.changed.signal(());
    }

    // GPIO edge detection waits for both directions
    fn listen(&mut self, _polarity: EdgePolarity) {}

    fn schedule_deadline(&mut self, at: u32) {
        self.state.deadline.store(at, Ordering::Relaxed);
        self.state.deadline_armed.store(true, Ordering::Release);
    }

    fn cancel_deadline(&mut self) {
        self.state.deadline_armed.store(false, Ordering::Release);
    }

    fn shutdown(&mut self) {
        self.state.enabled.store(false, Ordering::Release);
        self.state.deadline_armed.store(false, Ordering::Release);
        self.state.changed.signal(());
    }
}

/// Tick settings shared between a [`PicoTick`] and its task.
pub struct TickState {
    armed: AtomicBool,
    period: AtomicU32,
    /// Wakes the task when armed or shut down.
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl TickState {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            period: AtomicU32::new(0),
            changed: Signal::new(),
        }
    }
}

impl Default for TickState {
    fn default() -> Self {
        Self::new()
    }
}

/// TX side of a port: owns the output pin.
pub struct PicoTick<P = embassy_rp::gpio::Output<'static>> {
    resource: &'static TimerHardware,
    pin: P,
    state: &'static TickState,
}

impl<P: OutputPin> PicoTick<P> {
    #[must_use]
    pub fn new(resource: &'static TimerHardware, pin: P, state: &'static TickState) -> Self {
        Self {
            resource,
            pin,
            state,
        }
    }
}

impl<P: OutputPin> TickChannel for PicoTick<P> {
    fn resource(&self) -> &'static TimerHardware {
        self.resource
    }

    fn clock_hz(&self) -> u32 {
        TICK_HZ as u32
    }

    fn configure(&mut self, timing: &BitTiming) {
        self.state.period.store(timing.bit_period(), Ordering::Relaxed);
    }

    fn set_level(&mut self, level: PinState) {
        // RP2040 GPIO writes can't fail
        let _ = self.pin.set_state(level);
    }

    fn arm(&mut self) {
        self.state.armed.store(true, Ordering::Release);
        self.state.changed.signal(());
    }

    fn disarm(&mut self) {
        self.state.armed.store(false, Ordering::Release);
    }

    fn shutdown(&mut self) {
        self.state.armed.store(false, Ordering::Release);
        self.state.changed.signal(());
    }
}

/// Feed edges on `pin` and expired deadlines to port `index`.
///
/// Runs forever; spawn it on a high-priority executor so edges are
/// timestamped promptly.
pub async fn run_capture<C, T, P>(
    ports: &'static SoftSerialRegistry<C, T>,
    index: SoftSerialPortIndex,
    mut pin: P,
    state: &'static CaptureState,
) -> !
where
    C: CaptureChannel,
    T: TickChannel,
    P: InputPin + Wait,
{
    loop {
        if !state.enabled.load(Ordering::Acquire) {
            state.changed.wait().await;
            continue;
        }

        let edge = match state.pending_deadline() {
            Some(at) => {
                match select3(
                    pin.wait_for_any_edge(),
                    Timer::at(instant_at(at)),
                    state.changed.wait(),
                )
                .await
                {
                    Either3::First(result) => result.is_ok(),
                    Either3::Second(()) => {
                        state.deadline_armed.store(false, Ordering::Release);
                        ports.on_capture(index, RxEvent::Deadline { timestamp: at });
                        false
                    }
                    Either3::Third(()) => false,
                }
            }
            None => match select(pin.wait_for_any_edge(), state.changed.wait()).await {
                Either::First(result) => result.is_ok(),
                Either::Second(()) => false,
            },
        };

        if edge {
            let timestamp = counter();
            let polarity = match pin.is_high() {
                Ok(true) => EdgePolarity::Rising,
                _ => EdgePolarity::Falling,
            };
            ports.on_capture(index, RxEvent::Edge(EdgeEvent { timestamp, polarity }));
        }
    }
}

/// Tick port `index` at its bit rate while its tick channel is armed.
pub async fn run_tick<C, T>(
    ports: &'static SoftSerialRegistry<C, T>,
    index: SoftSerialPortIndex,
    state: &'static TickState,
) -> !
where
    C: CaptureChannel,
    T: TickChannel,
{
    loop {
        while !state.armed.load(Ordering::Acquire) {
            state.changed.wait().await;
        }

        let period = u64::from(state.period.load(Ordering::Relaxed));
        // First tick lands one bit period after arming
        let mut ticker = Ticker::every(Duration::from_ticks(period));
        while state.armed.load(Ordering::Acquire) {
            ticker.next().await;
            ports.on_tick(index);
        }
    }
}
