//! Timer channel traits implemented by the board binding.
//!
//! Each soft serial port needs two timer channels. The capture channel
//! timestamps RX edges and can fire one compare deadline; the tick channel
//! fires periodically at the bit rate and owns the TX pin. Implementations
//! forward their interrupts to
//! [`SoftSerialRegistry::on_capture`](crate::SoftSerialRegistry::on_capture) and
//! [`SoftSerialRegistry::on_tick`](crate::SoftSerialRegistry::on_tick).

use crate::board::TimerHardware;
use crate::frame::EdgePolarity;
use crate::timing::BitTiming;
use embedded_hal::digital::PinState;

/// Input-capture channel watching a port's RX pin.
pub trait CaptureChannel {
    /// Board entry this channel was built from.
    fn resource(&self) -> &'static TimerHardware;

    /// Timer input clock before prescaling.
    fn clock_hz(&self) -> u32;

    /// Program prescaler and period and enable capture.
    fn configure(&mut self, timing: &BitTiming);

    /// Select the polarity of the next edge to capture. Channels that
    /// capture both edges may ignore this.
    fn listen(&mut self, polarity: EdgePolarity);

    /// Fire [`RxEvent::Deadline`](crate::RxEvent::Deadline) carrying `at` once
    /// the counter reaches `at`. Replaces any pending deadline.
    fn schedule_deadline(&mut self, at: u32);

    fn cancel_deadline(&mut self);

    /// Stop capturing and detach the interrupt.
    fn shutdown(&mut self);
}

/// Periodic compare channel pacing a port's TX pin.
pub trait TickChannel {
    /// Board entry this channel was built from.
    fn resource(&self) -> &'static TimerHardware;

    /// Timer input clock before prescaling.
    fn clock_hz(&self) -> u32;

    /// Program prescaler and period. Does not start ticking.
    fn configure(&mut self, timing: &BitTiming);

    /// Drive the TX pin.
    fn set_level(&mut self, level: PinState);

    /// Start ticking; the first tick fires one bit period from now.
    fn arm(&mut self);

    fn disarm(&mut self);

    /// Stop the timer and detach the interrupt.
    fn shutdown(&mut self);
}
