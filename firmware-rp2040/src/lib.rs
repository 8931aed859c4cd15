//! Software serial ports for RP2040.
//!
//! Binds [`softserial_core`] to the RP2040: RX pins are watched with the
//! GPIO edge interrupt and timestamped from the 1 MHz system timer, TX pins
//! are driven from a ticker at the bit rate.
//!
//! # Hardware Configuration
//!
//! | Function       | GPIO | Description |
//! |----------------|------|-------------|
//! | SOFTSERIAL1 TX | 0    | Soft serial 1 transmit |
//! | SOFTSERIAL1 RX | 1    | Soft serial 1 receive |
//! | SOFTSERIAL2 TX | 4    | Soft serial 2 transmit |
//! | SOFTSERIAL2 RX | 5    | Soft serial 2 receive |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with two executors:
//!
//! - **Interrupt executor** (high priority): one capture task and one tick
//!   task per port, feeding [`SoftSerialRegistry::on_capture`] and
//!   [`SoftSerialRegistry::on_tick`]
//! - **Thread executor**: serial passthrough between the two ports and a
//!   periodic diagnostics line
//!
//! # Modules
//!
//! - [`channels`]: [`PicoCapture`] and [`PicoTick`] channel implementations
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub mod channels;

pub use channels::{run_capture, run_tick, CaptureState, PicoCapture, PicoTick, TickState};

// Re-export core types for convenience
pub use softserial_core::{
    PortConfig, PortStats, SerialPassthrough, SerialPort, SoftSerialHandle, SoftSerialPortIndex,
    SoftSerialRegistry,
};

/// Port table for this board.
pub type PicoPorts = SoftSerialRegistry<PicoCapture, PicoTick>;

/// Handle to an open port on this board.
pub type PicoSerial = SoftSerialHandle<'static, PicoCapture, PicoTick>;
