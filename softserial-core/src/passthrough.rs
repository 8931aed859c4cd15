//! SerialPassthrough: shovels bytes between two serial ports.

use crate::serial::{SerialError, SerialPort};

/// Bidirectional byte pump between two ports, used to reach a peripheral
/// (GPS, ESC, receiver) through the flight controller.
///
/// # Flow Control
///
/// Bytes are only taken from a source while the destination has room, so a
/// slow side holds data in the fast side's RX buffer instead of dropping it.
pub struct SerialPassthrough<L, R> {
    left: L,
    right: R,
}

impl<L: SerialPort, R: SerialPort> SerialPassthrough<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }

    /// Move whatever fits in both directions.
    ///
    /// Returns the number of bytes moved. Call it from a loop or a periodic
    /// task.
    pub fn poll(&mut self) -> Result<usize, PassthroughError> {
        let to_right = pump(&mut self.left, &mut self.right).map_err(PassthroughError::ToRight)?;
        let to_left = pump(&mut self.right, &mut self.left).map_err(PassthroughError::ToLeft)?;
        Ok(to_right + to_left)
    }

    pub fn left(&self) -> &L {
        &self.left
    }

    pub fn left_mut(&mut self) -> &mut L {
        &mut self.left
    }

    pub fn right(&self) -> &R {
        &self.right
    }

    pub fn right_mut(&mut self) -> &mut R {
        &mut self.right
    }

    /// Decompose into the two ports.
    pub fn into_parts(self) -> (L, R) {
        (self.left, self.right)
    }
}

fn pump<S: SerialPort, D: SerialPort>(source: &mut S, dest: &mut D) -> Result<usize, SerialError> {
    let mut moved = 0;
    while dest.tx_bytes_free() > 0 {
        let Some(byte) = source.read_byte() else {
            break;
        };
        dest.write_byte(byte)?;
        moved += 1;
    }
    Ok(moved)
}

/// Error type for passthrough operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassthroughError {
    /// Writing to the left port failed.
    ToLeft(SerialError),
    /// Writing to the right port failed.
    ToRight(SerialError),
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::serial::mock::MockSerial;
    use std::vec::Vec;

    #[test]
    fn test_moves_both_directions() {
        let mut left = MockSerial::new(16);
        let mut right = MockSerial::new(16);
        left.incoming.extend(b"abc");
        right.incoming.extend(b"xy");

        let mut bridge = SerialPassthrough::new(left, right);
        assert_eq!(bridge.poll(), Ok(5));
        assert_eq!(bridge.poll(), Ok(0));

        let (left, right) = bridge.into_parts();
        assert_eq!(right.sent.iter().copied().collect::<Vec<u8>>(), b"abc");
        assert_eq!(left.sent.iter().copied().collect::<Vec<u8>>(), b"xy");
    }

    #[test]
    fn test_holds_bytes_when_destination_full() {
        let mut left = MockSerial::new(16);
        left.incoming.extend([1, 2, 3, 4, 5]);
        let right = MockSerial::new(2);

        let mut bridge = SerialPassthrough::new(left, right);
        assert_eq!(bridge.poll(), Ok(2));
        assert_eq!(bridge.left().bytes_waiting(), 3);

        // Destination drains, the rest follows
        bridge.right_mut().sent.clear();
        assert_eq!(bridge.poll(), Ok(2));
        bridge.right_mut().sent.clear();
        assert_eq!(bridge.poll(), Ok(1));
        assert_eq!(bridge.left().bytes_waiting(), 0);
    }

    struct Refusing;

    impl SerialPort for Refusing {
        fn write_byte(&mut self, _byte: u8) -> Result<(), SerialError> {
            Err(SerialError::Unsupported)
        }

        fn read_byte(&mut self) -> Option<u8> {
            None
        }

        fn bytes_waiting(&self) -> usize {
            0
        }

        fn tx_bytes_free(&self) -> usize {
            1
        }

        fn is_tx_buffer_empty(&self) -> bool {
            true
        }

        fn set_baud_rate(&mut self, _baud: u32) -> Result<(), SerialError> {
            Err(SerialError::Unsupported)
        }

        fn baud_rate(&self) -> u32 {
            0
        }
    }

    #[test]
    fn test_write_errors_name_the_direction() {
        let mut right = MockSerial::new(4);
        right.incoming.push_back(0x10);
        let mut bridge = SerialPassthrough::new(Refusing, right);

        assert_eq!(
            bridge.poll(),
            Err(PassthroughError::ToLeft(SerialError::Unsupported))
        );
        assert_eq!(bridge.right().bytes_waiting(), 0);
        assert_eq!(bridge.left_mut().baud_rate(), 0);
    }
}
