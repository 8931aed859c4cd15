//! Board resource table types.
//!
//! A target describes every timer channel routed to a connector as a
//! [`TimerHardware`] entry, and names which entries each soft serial port may
//! use. The driver only reads these tables; it never builds them.

use crate::port::{OpenError, SoftSerialPortIndex, SOFTSERIAL_PORT_COUNT};

/// Hardware timer instance (`TIM1` = 1, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub u8);

/// Capture/compare channel of a timer, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerChannel(pub u8);

/// Interrupt vector number serving the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqNumber(pub u16);

/// GPIO bank a pin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioBank {
    A,
    B,
    C,
    D,
    E,
    F,
    /// Single-bank parts (RP2040 user bank).
    Bank0,
}

/// Physical pin identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinTag {
    pub bank: GpioBank,
    pub pin: u8,
}

impl PinTag {
    #[must_use]
    pub const fn new(bank: GpioBank, pin: u8) -> Self {
        Self { bank, pin }
    }
}

/// Electrical configuration applied to the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoConfig {
    /// Alternate function, push-pull.
    AfPushPull,
    /// Alternate function, push-pull with pull-down.
    AfPushPullPullDown,
    /// Alternate function, push-pull with pull-up.
    AfPushPullPullUp,
    /// Plain input with pull-up.
    InputPullUp,
    /// Plain push-pull output.
    OutputPushPull,
}

/// One timer channel wired to a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerHardware {
    pub timer: TimerId,
    pub pin: PinTag,
    pub channel: TimerChannel,
    pub irq: IrqNumber,
    /// Advanced-control timer needing its main output enabled.
    pub output_enable: bool,
    pub io_config: IoConfig,
    pub alternate_function: u8,
    /// Output polarity inverted by default.
    pub inverted: bool,
}

impl TimerHardware {
    /// True if both entries drive the same timer channel.
    #[inline]
    #[must_use]
    pub const fn same_channel(&self, other: &TimerHardware) -> bool {
        self.timer.0 == other.timer.0 && self.channel.0 == other.channel.0
    }
}

/// Indices into a board's timer table for one soft serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftSerialResources {
    pub rx: usize,
    pub tx: usize,
}

/// A target's timer table plus its soft serial assignment.
#[derive(Debug, Clone, Copy)]
pub struct BoardTable {
    pub name: &'static str,
    pub timers: &'static [TimerHardware],
    pub softserial: [SoftSerialResources; SOFTSERIAL_PORT_COUNT],
}

impl BoardTable {
    /// Look up the RX and TX entries assigned to `port`.
    pub fn softserial_resources(
        &self,
        port: SoftSerialPortIndex,
    ) -> Result<(&'static TimerHardware, &'static TimerHardware), OpenError> {
        let timers: &'static [TimerHardware] = self.timers;
        let resources = self.softserial[port.index()];

        let rx = timers.get(resources.rx).ok_or(OpenError::InvalidResource)?;
        let tx = timers.get(resources.tx).ok_or(OpenError::InvalidResource)?;
        if rx.same_channel(tx) {
            return Err(OpenError::ResourceBusy);
        }
        Ok((rx, tx))
    }
}
