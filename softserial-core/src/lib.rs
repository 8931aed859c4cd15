//! Timer-driven software serial ports, chip-agnostic.
//!
//! This crate turns two timer channels per port into a UART: an input-capture
//! channel timestamps edges on the RX pin and a periodic compare channel
//! paces bits out of the TX pin. It contains everything except register
//! access, so the whole receive and transmit path runs on host in tests.
//!
//! # Overview
//!
//! - [`frame`]: Frame layout, stop bits and line inversion ([`FrameFormat`], [`Inversion`])
//! - [`timing`]: Prescaler and bit period derivation ([`BitTiming`])
//! - [`rx`]: Edge-timing frame decoder ([`RxDecoder`])
//! - [`tx`]: Bit scheduler driven by the tick interrupt ([`TxScheduler`])
//! - [`ring`]: Lock-free single-producer/single-consumer byte buffer ([`RingBuffer`])
//! - [`hal`]: Timer channel traits a board implements ([`CaptureChannel`], [`TickChannel`])
//! - [`board`]: Board resource tables ([`BoardTable`], [`TimerHardware`])
//! - [`port`]: Port configuration ([`PortConfig`]) and per-port state
//! - [`registry`]: Port table and handles ([`SoftSerialRegistry`], [`SoftSerialHandle`])
//! - [`serial`]: Transport-agnostic [`SerialPort`] trait
//! - [`passthrough`]: Byte pump between two ports ([`SerialPassthrough`])
//!
//! # Example
//!
//! ```rust,ignore
//! use softserial_core::{PortConfig, SerialPort, SoftSerialPortIndex, SoftSerialRegistry};
//!
//! static PORTS: SoftSerialRegistry<MyCapture, MyTick> = SoftSerialRegistry::new();
//!
//! let mut gps = PORTS.open(SoftSerialPortIndex::SoftSerial1, PortConfig::new(9_600), capture, tick)?;
//! gps.write_byte(b'$')?;
//!
//! // From the timer interrupts:
//! PORTS.on_capture(SoftSerialPortIndex::SoftSerial1, event);
//! PORTS.on_tick(SoftSerialPortIndex::SoftSerial1);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Route internal logging through the `log` facade (for host)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations. Shared
//! state is guarded with `critical-section`, so the final binary must provide
//! an implementation.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod board;
pub mod frame;
pub mod hal;
pub mod passthrough;
pub mod port;
pub mod registry;
pub mod ring;
pub mod rx;
pub mod serial;
pub mod timing;
pub mod tx;

#[cfg(test)]
mod sim;

// Re-export main types at crate root
pub use board::{
    BoardTable, GpioBank, IoConfig, IrqNumber, PinTag, SoftSerialResources, TimerChannel,
    TimerHardware, TimerId,
};
pub use frame::{EdgePolarity, FrameError, FrameFormat, Inversion, StopBits};
pub use hal::{CaptureChannel, TickChannel};
pub use passthrough::{PassthroughError, SerialPassthrough};
pub use port::{
    OpenError, PortConfig, PortMode, PortStats, ReceiveCallback, SoftSerialPortIndex,
    SOFTSERIAL_PORT_COUNT,
};
pub use registry::{SoftSerialHandle, SoftSerialRegistry};
pub use ring::{RingBuffer, SOFTSERIAL_BUFFER_SIZE};
pub use rx::{EdgeEvent, RxDecoder, RxEvent, RxOutcome};
pub use serial::{SerialBackend, SerialError, SerialPort};
pub use timing::{BitTiming, ConfigError, MAX_BAUD_RATE, SOFTSERIAL_BAUD_RATES};
pub use tx::{TickOutcome, TxScheduler};
