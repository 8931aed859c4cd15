//! Transport-agnostic serial port trait and error types.

use crate::timing::ConfigError;

/// Error type for serial port operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Transmit buffer full; the byte was dropped.
    BufferFull,
    /// A frame is in flight; retry once the port is idle.
    Busy,
    /// Port was closed underneath the handle.
    NotOpen,
    /// Direction not enabled by the port mode.
    Unsupported,
    /// Requested baud rate can't be realised.
    Config(ConfigError),
}

impl From<ConfigError> for SerialError {
    fn from(err: ConfigError) -> Self {
        SerialError::Config(err)
    }
}

/// Byte-level serial port.
///
/// This trait abstracts the transport so callers (GPS parsing, telemetry,
/// passthrough) work the same over a hardware UART or a software port.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible and must not block:
/// a full transmit buffer is reported, never waited on.
pub trait SerialPort {
    /// Queue a byte for transmission.
    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError>;

    /// Take the oldest received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Received bytes waiting to be read.
    fn bytes_waiting(&self) -> usize;

    /// Space left in the transmit buffer.
    fn tx_bytes_free(&self) -> usize;

    /// True once every queued byte has been handed to the transmitter.
    fn is_tx_buffer_empty(&self) -> bool;

    /// Change the line rate. Only allowed while the port is idle.
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), SerialError>;

    fn baud_rate(&self) -> u32;
}

/// Closed set of serial transports.
///
/// Lets a caller pick a software port as a fallback when no hardware UART is
/// free, without dynamic dispatch.
pub enum SerialBackend<H, S> {
    Hardware(H),
    Software(S),
}

impl<H, S> SerialBackend<H, S> {
    #[inline]
    #[must_use]
    pub fn is_software(&self) -> bool {
        matches!(self, SerialBackend::Software(_))
    }
}

impl<H: SerialPort, S: SerialPort> SerialPort for SerialBackend<H, S> {
    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        match self {
            SerialBackend::Hardware(port) => port.write_byte(byte),
            SerialBackend::Software(port) => port.write_byte(byte),
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        match self {
            SerialBackend::Hardware(port) => port.read_byte(),
            SerialBackend::Software(port) => port.read_byte(),
        }
    }

    fn bytes_waiting(&self) -> usize {
        match self {
            SerialBackend::Hardware(port) => port.bytes_waiting(),
            SerialBackend::Software(port) => port.bytes_waiting(),
        }
    }

    fn tx_bytes_free(&self) -> usize {
        match self {
            SerialBackend::Hardware(port) => port.tx_bytes_free(),
            SerialBackend::Software(port) => port.tx_bytes_free(),
        }
    }

    fn is_tx_buffer_empty(&self) -> bool {
        match self {
            SerialBackend::Hardware(port) => port.is_tx_buffer_empty(),
            SerialBackend::Software(port) => port.is_tx_buffer_empty(),
        }
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), SerialError> {
        match self {
            SerialBackend::Hardware(port) => port.set_baud_rate(baud),
            SerialBackend::Software(port) => port.set_baud_rate(baud),
        }
    }

    fn baud_rate(&self) -> u32 {
        match self {
            SerialBackend::Hardware(port) => port.baud_rate(),
            SerialBackend::Software(port) => port.baud_rate(),
        }
    }
}
