//! Port configuration and per-port driver state.

use crate::board::TimerHardware;
use crate::frame::{FrameFormat, Inversion, StopBits};
use crate::hal::{CaptureChannel, TickChannel};
use crate::ring::{RingBuffer, SOFTSERIAL_BUFFER_SIZE};
use crate::rx::{RxDecoder, RxEvent};
use crate::serial::SerialError;
use crate::timing::{BitTiming, ConfigError};
use crate::tx::{TickOutcome, TxScheduler};
use critical_section::CriticalSection;
use portable_atomic::{AtomicU32, Ordering};

/// Number of soft serial ports.
pub const SOFTSERIAL_PORT_COUNT: usize = 2;

/// Logical soft serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoftSerialPortIndex {
    SoftSerial1 = 0,
    SoftSerial2 = 1,
}

impl SoftSerialPortIndex {
    pub const ALL: [SoftSerialPortIndex; SOFTSERIAL_PORT_COUNT] =
        [SoftSerialPortIndex::SoftSerial1, SoftSerialPortIndex::SoftSerial2];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SoftSerialPortIndex::SoftSerial1),
            1 => Some(SoftSerialPortIndex::SoftSerial2),
            _ => None,
        }
    }
}

/// Directions enabled on a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortMode {
    Rx,
    Tx,
    #[default]
    RxTx,
}

impl PortMode {
    #[inline]
    #[must_use]
    pub const fn has_rx(self) -> bool {
        matches!(self, PortMode::Rx | PortMode::RxTx)
    }

    #[inline]
    #[must_use]
    pub const fn has_tx(self) -> bool {
        matches!(self, PortMode::Tx | PortMode::RxTx)
    }
}

/// Called from interrupt context with each received byte instead of
/// queueing it.
pub type ReceiveCallback = fn(u8);

/// Settings a port is opened with.
#[derive(Debug, Clone, Copy)]
pub struct PortConfig {
    pub baud: u32,
    pub inversion: Inversion,
    pub mode: PortMode,
    pub format: FrameFormat,
    pub callback: Option<ReceiveCallback>,
}

impl PortConfig {
    /// 8N1, non-inverted, both directions.
    #[must_use]
    pub const fn new(baud: u32) -> Self {
        Self {
            baud,
            inversion: Inversion::Normal,
            mode: PortMode::RxTx,
            format: FrameFormat::new(StopBits::One),
            callback: None,
        }
    }

    #[must_use]
    pub fn inverted(self) -> Self {
        self.inversion(Inversion::Inverted)
    }

    #[must_use]
    pub fn inversion(mut self, inversion: Inversion) -> Self {
        self.inversion = inversion;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: PortMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.format = FrameFormat::new(stop_bits);
        self
    }

    #[must_use]
    pub fn with_callback(mut self, callback: ReceiveCallback) -> Self {
        self.callback = Some(callback);
        self
    }
}

/// Error type for opening a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
    /// Port is already open; close it first.
    AlreadyOpen,
    /// A timer channel is shared with the other direction or another port.
    ResourceBusy,
    /// Board table has no entry at the assigned index.
    InvalidResource,
    /// Baud rate can't be realised by the timer.
    Config(ConfigError),
}

impl From<ConfigError> for OpenError {
    fn from(err: ConfigError) -> Self {
        OpenError::Config(err)
    }
}

/// Diagnostic counters for a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortStats {
    /// Frames discarded by the decoder.
    pub rx_errors: u32,
    /// Ticks that arrived with nothing to send.
    pub tx_errors: u32,
    /// Received bytes dropped on a full RX buffer.
    pub rx_overflows: u32,
    /// Written bytes dropped on a full TX buffer.
    pub tx_overflows: u32,
}

/// Port state touched lock-free from both contexts.
pub(crate) struct PortShared {
    pub(crate) rx_buffer: RingBuffer<SOFTSERIAL_BUFFER_SIZE>,
    pub(crate) tx_buffer: RingBuffer<SOFTSERIAL_BUFFER_SIZE>,
    pub(crate) reception_errors: AtomicU32,
    pub(crate) transmission_errors: AtomicU32,
    pub(crate) baud: AtomicU32,
}

impl PortShared {
    pub(crate) const fn new() -> Self {
        Self {
            rx_buffer: RingBuffer::new(),
            tx_buffer: RingBuffer::new(),
            reception_errors: AtomicU32::new(0),
            transmission_errors: AtomicU32::new(0),
            baud: AtomicU32::new(0),
        }
    }

    pub(crate) fn reset(&self, cs: CriticalSection<'_>) {
        self.rx_buffer.reset(cs);
        self.tx_buffer.reset(cs);
        self.reception_errors.store(0, Ordering::Relaxed);
        self.transmission_errors.store(0, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> PortStats {
        PortStats {
            rx_errors: self.reception_errors.load(Ordering::Relaxed),
            tx_errors: self.transmission_errors.load(Ordering::Relaxed),
            rx_overflows: self.rx_buffer.overflow_count(),
            tx_overflows: self.tx_buffer.overflow_count(),
        }
    }
}

/// Open port: hardware channels plus RX/TX state machines.
///
/// Only ever accessed inside a critical section.
pub(crate) struct SoftSerial<C, T> {
    index: SoftSerialPortIndex,
    config: PortConfig,
    capture: C,
    tick: T,
    rx: RxDecoder,
    tx: TxScheduler,
}

impl<C: CaptureChannel, T: TickChannel> SoftSerial<C, T> {
    /// Derive timings and bring both channels up with the line idle.
    pub(crate) fn open(
        index: SoftSerialPortIndex,
        config: PortConfig,
        mut capture: C,
        mut tick: T,
    ) -> Result<Self, OpenError> {
        let rx_timing = BitTiming::for_baud(capture.clock_hz(), config.baud)?;
        let tx_timing = BitTiming::for_baud(tick.clock_hz(), config.baud)?;

        tick.configure(&tx_timing);
        tick.set_level(config.inversion.idle_level());

        let rx = RxDecoder::new(config.format, config.inversion, rx_timing);
        capture.configure(&rx_timing);
        capture.listen(rx.expected_polarity());

        Ok(Self {
            index,
            config,
            capture,
            tick,
            rx,
            tx: TxScheduler::new(config.format),
        })
    }

    /// True if either timer channel is backed by `resource`.
    pub(crate) fn uses(&self, resource: &TimerHardware) -> bool {
        self.capture.resource().same_channel(resource) || self.tick.resource().same_channel(resource)
    }

    pub(crate) fn on_rx_event(&mut self, event: RxEvent, shared: &PortShared) {
        if !self.config.mode.has_rx() {
            return;
        }

        let outcome = self.rx.on_event(event);
        match outcome.frame {
            Some(Ok(byte)) => self.deliver(byte, shared),
            Some(Err(error)) => {
                shared.reception_errors.fetch_add(1, Ordering::Relaxed);
                trace!("{:?}: framing error {:?}", self.index, error);
            }
            None => {}
        }

        match outcome.deadline {
            Some(at) => self.capture.schedule_deadline(at),
            None if self.rx.is_searching() => self.capture.cancel_deadline(),
            None => {}
        }
        self.capture.listen(self.rx.expected_polarity());
    }

    pub(crate) fn on_tick(&mut self, shared: &PortShared) {
        match self.tx.on_tick(|| shared.tx_buffer.pop()) {
            TickOutcome::Bit { mark, done } => {
                self.tick.set_level(self.config.inversion.level(mark));
                if done {
                    self.tick.disarm();
                }
            }
            TickOutcome::Spurious => {
                shared.transmission_errors.fetch_add(1, Ordering::Relaxed);
                warn!("{:?}: tick while idle", self.index);
            }
        }
    }

    /// Start sending if the scheduler is idle and a byte is queued.
    pub(crate) fn kick_transmitter(&mut self, shared: &PortShared) {
        if self.tx.is_transmitting() {
            return;
        }
        if let Some(byte) = shared.tx_buffer.pop() {
            self.tx.begin(byte);
            self.tick.arm();
        }
    }

    /// Re-derive both timer periods. Refused while a frame is in flight in
    /// either direction.
    pub(crate) fn set_baud_rate(&mut self, baud: u32) -> Result<(), SerialError> {
        if self.tx.is_transmitting() || !self.rx.is_searching() {
            return Err(SerialError::Busy);
        }

        let rx_timing = BitTiming::for_baud(self.capture.clock_hz(), baud)?;
        let tx_timing = BitTiming::for_baud(self.tick.clock_hz(), baud)?;

        self.tick.configure(&tx_timing);
        self.rx.set_timing(rx_timing);
        self.capture.configure(&rx_timing);
        self.capture.listen(self.rx.expected_polarity());
        self.config.baud = baud;

        debug!("{:?}: baud rate now {}", self.index, baud);
        Ok(())
    }

    /// Stop both channels and hand them back.
    pub(crate) fn shutdown(mut self) -> (C, T) {
        self.tx.stop();
        self.tick.disarm();
        self.tick.set_level(self.config.inversion.idle_level());
        self.tick.shutdown();

        self.rx.reset();
        self.capture.cancel_deadline();
        self.capture.shutdown();

        (self.capture, self.tick)
    }

    fn deliver(&self, byte: u8, shared: &PortShared) {
        match self.config.callback {
            Some(callback) => callback(byte),
            None => {
                if !shared.rx_buffer.push(byte) {
                    trace!("{:?}: rx buffer full, dropped {}", self.index, byte);
                }
            }
        }
    }
}
