//! Resource tables for supported flight controller boards.
//!
//! Each target module exposes its full timer table and a [`BoardTable`]
//! naming which entries the soft serial ports use.
//!
//! # Targets
//!
//! - [`chebuzzf3`]: STM32F3 Discovery based CHEBUZZF3 ([`CHEBUZZF3`])
//! - [`pico`]: Raspberry Pi Pico, GPIO edges plus the system timer ([`PICO`])
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod chebuzzf3;
pub mod pico;

pub use chebuzzf3::CHEBUZZF3;
pub use pico::PICO;

use softserial_core::BoardTable;

/// Every known target.
pub static TARGETS: [&BoardTable; 2] = [&CHEBUZZF3, &PICO];

/// Look a target up by its name, ignoring ASCII case.
#[must_use]
pub fn find(name: &str) -> Option<&'static BoardTable> {
    TARGETS
        .iter()
        .copied()
        .find(|board| board.name.eq_ignore_ascii_case(name))
}
