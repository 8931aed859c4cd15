//! Transmit-side bit scheduler.
//!
//! Driven by a periodic compare interrupt at the bit rate. Each tick shifts
//! one logical bit out of the frame register; the caller maps it to a pin
//! level. When a frame runs out the next queued byte is loaded straight away,
//! so consecutive bytes go out without an idle gap.

use crate::frame::FrameFormat;

/// What a tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Drive this logical bit onto the pin. `done` is set on the last bit
    /// before the scheduler went idle; the tick source should be disarmed.
    Bit { mark: bool, done: bool },
    /// Tick arrived while idle; nothing was output.
    Spurious,
}

#[derive(Debug, Clone)]
pub struct TxScheduler {
    format: FrameFormat,
    transmitting: bool,
    /// Bits of the current frame not yet driven, -1 while idle.
    bits_remaining: i8,
    shift_register: u16,
}

impl TxScheduler {
    #[must_use]
    pub const fn new(format: FrameFormat) -> Self {
        Self {
            format,
            transmitting: false,
            bits_remaining: -1,
            shift_register: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    #[inline]
    #[must_use]
    pub fn bits_remaining(&self) -> i8 {
        self.bits_remaining
    }

    /// Load `byte` as the next frame. The scheduler must be idle.
    pub fn begin(&mut self, byte: u8) {
        debug_assert!(!self.transmitting);
        self.load(byte);
    }

    /// Emit the next bit. `next` is asked for another byte when the current
    /// frame has been fully driven.
    pub fn on_tick(&mut self, next: impl FnOnce() -> Option<u8>) -> TickOutcome {
        if !self.transmitting {
            return TickOutcome::Spurious;
        }

        let mark = self.shift_register & 1 != 0;
        self.shift_register >>= 1;
        self.bits_remaining -= 1;

        if self.bits_remaining > 0 {
            return TickOutcome::Bit { mark, done: false };
        }

        match next() {
            Some(byte) => {
                self.load(byte);
                TickOutcome::Bit { mark, done: false }
            }
            None => {
                self.stop();
                TickOutcome::Bit { mark, done: true }
            }
        }
    }

    /// Abandon the frame in flight.
    pub fn stop(&mut self) {
        self.transmitting = false;
        self.bits_remaining = -1;
        self.shift_register = 0;
    }

    fn load(&mut self, byte: u8) {
        self.shift_register = self.format.encode(byte);
        self.bits_remaining = self.format.frame_bits() as i8;
        self.transmitting = true;
    }
}
