//! Baud rate to timer prescaler/period conversion.
//!
//! Both channels of a port run from a timer whose input clock is known to the
//! board binding. [`BitTiming::for_baud`] picks the smallest power-of-two
//! prescaler that fits one bit period into a 16-bit auto-reload register and
//! rejects rates that would leave the timer with a degenerate period.

/// Largest value a 16-bit timer period register can hold.
pub const MAX_TIMER_PERIOD: u32 = 0xFFFF;

/// Fewest timer ticks per bit cell. Edge timing is rounded to half a cell, so
/// anything shorter can't tell neighbouring cells apart.
pub const MIN_BIT_PERIOD: u32 = 4;

/// Highest baud rate software serial is offered at.
pub const MAX_BAUD_RATE: u32 = 19_200;

/// Baud rates a soft serial port is expected to be configured with.
pub const SOFTSERIAL_BAUD_RATES: [u32; 5] = [1_200, 2_400, 4_800, 9_600, 19_200];

/// Error raised when a baud rate can't be realised by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Baud rate of zero.
    ZeroBaud,
    /// Timer clock of zero.
    ZeroClock,
    /// Above [`MAX_BAUD_RATE`] or too fast for the timer clock.
    BaudTooHigh,
    /// Needs a prescaler larger than the timer supports.
    BaudTooLow,
}

/// Prescaler and period derived for one baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    baud: u32,
    clock_hz: u32,
    prescaler: u16,
    period: u16,
}

impl BitTiming {
    /// Derive timer settings for `baud` on a timer clocked at `clock_hz`.
    ///
    /// The prescaler starts at 1 and doubles until the bit period fits
    /// [`MAX_TIMER_PERIOD`].
    pub fn for_baud(clock_hz: u32, baud: u32) -> Result<Self, ConfigError> {
        if baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }
        if clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }
        if baud > MAX_BAUD_RATE {
            return Err(ConfigError::BaudTooHigh);
        }

        let mut prescaler: u32 = 1;
        let mut period = clock_hz / baud;
        while period > MAX_TIMER_PERIOD {
            prescaler *= 2;
            if prescaler > u32::from(u16::MAX) {
                return Err(ConfigError::BaudTooLow);
            }
            period = clock_hz / prescaler / baud;
        }

        if period < MIN_BIT_PERIOD {
            return Err(ConfigError::BaudTooHigh);
        }

        Ok(Self {
            baud,
            clock_hz,
            prescaler: prescaler as u16,
            period: period as u16,
        })
    }

    #[inline]
    #[must_use]
    pub const fn baud(&self) -> u32 {
        self.baud
    }

    /// Timer input clock before the prescaler.
    #[inline]
    #[must_use]
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Clock divider to program into the timer (1 = undivided).
    #[inline]
    #[must_use]
    pub const fn prescaler(&self) -> u16 {
        self.prescaler
    }

    /// Rate of the prescaled timer counter.
    #[inline]
    #[must_use]
    pub const fn tick_hz(&self) -> u32 {
        self.clock_hz / self.prescaler as u32
    }

    /// One bit cell, in prescaled timer ticks.
    #[inline]
    #[must_use]
    pub const fn bit_period(&self) -> u32 {
        self.period as u32
    }

    #[inline]
    #[must_use]
    pub const fn half_period(&self) -> u32 {
        self.period as u32 / 2
    }

    /// Number of whole bit cells covered by `delta` ticks, rounded to nearest.
    #[inline]
    #[must_use]
    pub const fn cells_in(&self, delta: u32) -> u32 {
        delta.saturating_add(self.half_period()) / self.bit_period()
    }

    /// Timestamp of the middle of cell `cell`, for a frame starting at `start`.
    #[inline]
    #[must_use]
    pub const fn cell_center(&self, start: u32, cell: u32) -> u32 {
        start
            .wrapping_add(cell * self.bit_period())
            .wrapping_add(self.half_period())
    }
}
