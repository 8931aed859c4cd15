//! Fixed table of soft serial ports and the handles that use them.
//!
//! The registry lives in a `static` so timer interrupts can reach a port by
//! index. Each slot pairs the lock-free buffers and counters with the port's
//! state machines, which sit behind a critical-section mutex because the
//! capture interrupt, the tick interrupt and the writer all touch them.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use portable_atomic::Ordering;

use crate::hal::{CaptureChannel, TickChannel};
use crate::port::{
    OpenError, PortConfig, PortMode, PortShared, PortStats, SoftSerial, SoftSerialPortIndex,
    SOFTSERIAL_PORT_COUNT,
};
use crate::rx::RxEvent;
use crate::serial::{SerialError, SerialPort};

struct PortSlot<C, T> {
    shared: PortShared,
    state: Mutex<RefCell<Option<SoftSerial<C, T>>>>,
}

impl<C, T> PortSlot<C, T> {
    const fn new() -> Self {
        Self {
            shared: PortShared::new(),
            state: Mutex::new(RefCell::new(None)),
        }
    }
}

/// All soft serial ports of a board, generic over the board's timer
/// channel types.
pub struct SoftSerialRegistry<C, T> {
    slots: [PortSlot<C, T>; SOFTSERIAL_PORT_COUNT],
}

impl<C, T> SoftSerialRegistry<C, T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [PortSlot::new(), PortSlot::new()],
        }
    }

    fn slot(&self, index: SoftSerialPortIndex) -> &PortSlot<C, T> {
        &self.slots[index.index()]
    }

    #[must_use]
    pub fn is_open(&self, index: SoftSerialPortIndex) -> bool {
        critical_section::with(|cs| self.slot(index).state.borrow_ref(cs).is_some())
    }

    /// Ports currently open, lowest index first.
    #[must_use]
    pub fn open_ports(&self) -> heapless::Vec<SoftSerialPortIndex, SOFTSERIAL_PORT_COUNT> {
        let mut ports = heapless::Vec::new();
        for index in SoftSerialPortIndex::ALL {
            if self.is_open(index) {
                // Capacity equals the port count
                let _ = ports.push(index);
            }
        }
        ports
    }

    /// Snapshot of a port's counters. Counters are cleared when it closes.
    #[must_use]
    pub fn stats(&self, index: SoftSerialPortIndex) -> PortStats {
        self.slot(index).shared.stats()
    }
}

impl<C, T> Default for SoftSerialRegistry<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CaptureChannel, T: TickChannel> SoftSerialRegistry<C, T> {
    /// Open `index` on the given channels.
    ///
    /// Fails if the port is already open, if the two channels share a timer
    /// channel, or if either is already in use by the other port.
    pub fn open(
        &self,
        index: SoftSerialPortIndex,
        config: PortConfig,
        capture: C,
        tick: T,
    ) -> Result<SoftSerialHandle<'_, C, T>, OpenError> {
        if capture.resource().same_channel(tick.resource()) {
            return Err(OpenError::ResourceBusy);
        }

        critical_section::with(|cs| {
            for (i, slot) in self.slots.iter().enumerate() {
                let state = slot.state.borrow_ref(cs);
                let Some(port) = state.as_ref() else {
                    continue;
                };
                if i == index.index() {
                    return Err(OpenError::AlreadyOpen);
                }
                if port.uses(capture.resource()) || port.uses(tick.resource()) {
                    return Err(OpenError::ResourceBusy);
                }
            }

            let slot = self.slot(index);
            let port = SoftSerial::open(index, config, capture, tick)?;
            slot.shared.reset(cs);
            slot.shared.baud.store(config.baud, Ordering::Relaxed);
            *slot.state.borrow_ref_mut(cs) = Some(port);
            Ok(())
        })
        .inspect_err(|err| warn!("{:?}: open failed: {:?}", index, err))?;

        info!("{:?}: open at {} baud", index, config.baud);
        Ok(SoftSerialHandle {
            registry: self,
            index,
            mode: config.mode,
        })
    }

    /// Close the port behind `handle`, returning its channels stopped and
    /// with the TX pin idle. Anything still buffered is discarded.
    pub fn close(&self, handle: SoftSerialHandle<'_, C, T>) -> Option<(C, T)> {
        let slot = self.slot(handle.index);
        let channels = critical_section::with(|cs| {
            let port = slot.state.borrow_ref_mut(cs).take()?;
            slot.shared.reset(cs);
            Some(port.shutdown())
        });
        if channels.is_some() {
            info!("{:?}: closed", handle.index);
        }
        channels
    }

    /// Entry point for the RX capture/compare interrupt of `index`.
    pub fn on_capture(&self, index: SoftSerialPortIndex, event: RxEvent) {
        let slot = self.slot(index);
        critical_section::with(|cs| {
            if let Some(port) = slot.state.borrow_ref_mut(cs).as_mut() {
                port.on_rx_event(event, &slot.shared);
            }
        });
    }

    /// Entry point for the TX tick interrupt of `index`.
    pub fn on_tick(&self, index: SoftSerialPortIndex) {
        let slot = self.slot(index);
        critical_section::with(|cs| {
            if let Some(port) = slot.state.borrow_ref_mut(cs).as_mut() {
                port.on_tick(&slot.shared);
            }
        });
    }
}

/// Exclusive access to one open port.
///
/// Reads and buffer queries never lock. Writes lock briefly to start the
/// transmitter when it is idle.
pub struct SoftSerialHandle<'r, C, T> {
    registry: &'r SoftSerialRegistry<C, T>,
    index: SoftSerialPortIndex,
    mode: PortMode,
}

impl<C, T> SoftSerialHandle<'_, C, T> {
    #[inline]
    #[must_use]
    pub fn index(&self) -> SoftSerialPortIndex {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> PortMode {
        self.mode
    }

    #[must_use]
    pub fn stats(&self) -> PortStats {
        self.registry.stats(self.index)
    }

    fn shared(&self) -> &PortShared {
        &self.registry.slot(self.index).shared
    }
}

impl<C: CaptureChannel, T: TickChannel> SerialPort for SoftSerialHandle<'_, C, T> {
    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        if !self.mode.has_tx() {
            return Err(SerialError::Unsupported);
        }

        let slot = self.registry.slot(self.index);
        if !slot.shared.tx_buffer.push(byte) {
            return Err(SerialError::BufferFull);
        }

        critical_section::with(|cs| match slot.state.borrow_ref_mut(cs).as_mut() {
            Some(port) => {
                port.kick_transmitter(&slot.shared);
                Ok(())
            }
            None => Err(SerialError::NotOpen),
        })
    }

    fn read_byte(&mut self) -> Option<u8> {
        if !self.mode.has_rx() {
            return None;
        }
        self.shared().rx_buffer.pop()
    }

    fn bytes_waiting(&self) -> usize {
        self.shared().rx_buffer.bytes_waiting()
    }

    fn tx_bytes_free(&self) -> usize {
        if !self.mode.has_tx() {
            return 0;
        }
        self.shared().tx_buffer.bytes_free()
    }

    fn is_tx_buffer_empty(&self) -> bool {
        self.shared().tx_buffer.is_empty()
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), SerialError> {
        let slot = self.registry.slot(self.index);
        critical_section::with(|cs| {
            let mut state = slot.state.borrow_ref_mut(cs);
            let port = state.as_mut().ok_or(SerialError::NotOpen)?;
            port.set_baud_rate(baud)?;
            slot.shared.baud.store(baud, Ordering::Relaxed);
            Ok(())
        })
    }

    fn baud_rate(&self) -> u32 {
        self.shared().baud.load(Ordering::Relaxed)
    }
}

impl<C: CaptureChannel, T: TickChannel> fmt::Write for SoftSerialHandle<'_, C, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}
