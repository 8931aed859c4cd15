//! Serial frame layout and line polarity.
//!
//! A frame is one start bit (space), eight data bits LSB first and one or two
//! stop bits (mark), held in a 16-bit register with the start bit at bit 0.
//! The register always stores logical levels; [`Inversion`] maps them to pin
//! levels at the edges of the driver.

use embedded_hal::digital::PinState;

/// Data bits per frame.
pub const DATA_BITS: u8 = 8;

/// Register bit holding the start bit.
pub const START_BIT_MASK: u16 = 1 << 0;

/// Number of stop bits closing a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    #[inline]
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// Mapping between logical mark/space and pin levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inversion {
    /// Idle high, start bit low.
    #[default]
    Normal,
    /// Idle low, start bit high.
    Inverted,
}

impl Inversion {
    /// Pin level of a logical bit.
    #[inline]
    #[must_use]
    pub const fn level(self, mark: bool) -> PinState {
        match (self, mark) {
            (Inversion::Normal, true) | (Inversion::Inverted, false) => PinState::High,
            _ => PinState::Low,
        }
    }

    /// Pin level of an idle line.
    #[inline]
    #[must_use]
    pub const fn idle_level(self) -> PinState {
        self.level(true)
    }

    /// Logical bit carried by a pin level.
    #[inline]
    #[must_use]
    pub const fn is_mark(self, level: PinState) -> bool {
        matches!(
            (self, level),
            (Inversion::Normal, PinState::High) | (Inversion::Inverted, PinState::Low)
        )
    }

    /// Edge leaving the idle level, i.e. the leading edge of a start bit.
    #[inline]
    #[must_use]
    pub const fn start_edge(self) -> EdgePolarity {
        match self {
            Inversion::Normal => EdgePolarity::Falling,
            Inversion::Inverted => EdgePolarity::Rising,
        }
    }
}

/// Direction of a captured transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolarity {
    Rising,
    Falling,
}

impl EdgePolarity {
    /// Pin level once the edge has happened.
    #[inline]
    #[must_use]
    pub const fn level_after(self) -> PinState {
        match self {
            EdgePolarity::Rising => PinState::High,
            EdgePolarity::Falling => PinState::Low,
        }
    }

    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            EdgePolarity::Rising => EdgePolarity::Falling,
            EdgePolarity::Falling => EdgePolarity::Rising,
        }
    }

    /// Edge that moves the line from `from` to the other level.
    #[inline]
    #[must_use]
    pub const fn leaving(from: PinState) -> Self {
        match from {
            PinState::High => EdgePolarity::Falling,
            PinState::Low => EdgePolarity::Rising,
        }
    }
}

/// Reason a received frame was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Start bit cell did not read as space.
    StartBit,
    /// A stop bit cell did not read as mark.
    StopBit,
    /// Two edges closer than half a bit cell.
    Glitch,
    /// Edge timing implies more cells than the frame has left.
    Overrun,
    /// Two edges of the same polarity in a row.
    MissedEdge,
}

/// Frame geometry for a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFormat {
    pub stop_bits: StopBits,
}

impl FrameFormat {
    #[must_use]
    pub const fn new(stop_bits: StopBits) -> Self {
        Self { stop_bits }
    }

    /// Total bit cells in a frame, start and stop bits included.
    #[inline]
    #[must_use]
    pub const fn frame_bits(&self) -> u8 {
        1 + DATA_BITS + self.stop_bits.count()
    }

    /// Register bits holding the stop bit(s).
    #[inline]
    #[must_use]
    pub const fn stop_mask(&self) -> u16 {
        let first = 1 + DATA_BITS;
        ((1u16 << self.stop_bits.count()) - 1) << first
    }

    /// Build the logical register for `byte`: start bit clear, stop bits set.
    #[inline]
    #[must_use]
    pub const fn encode(&self, byte: u8) -> u16 {
        self.stop_mask() | ((byte as u16) << 1)
    }

    /// Validate framing bits and extract the data byte.
    pub const fn decode(&self, register: u16) -> Result<u8, FrameError> {
        if register & START_BIT_MASK != 0 {
            return Err(FrameError::StartBit);
        }
        if register & self.stop_mask() != self.stop_mask() {
            return Err(FrameError::StopBit);
        }
        Ok((register >> 1) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_lengths() {
        assert_eq!(FrameFormat::new(StopBits::One).frame_bits(), 10);
        assert_eq!(FrameFormat::new(StopBits::Two).frame_bits(), 11);
        assert_eq!(FrameFormat::new(StopBits::One).stop_mask(), 0b10_0000_0000);
        assert_eq!(FrameFormat::new(StopBits::Two).stop_mask(), 0b110_0000_0000);
    }

    #[test]
    fn test_encode_layout() {
        let format = FrameFormat::default();
        // 0xA5 shifted past the start bit, stop bit at 9
        assert_eq!(format.encode(0xA5), 0b11_0100_1010);
        assert_eq!(format.encode(0x00) & START_BIT_MASK, 0);
    }

    #[test]
    fn test_decode_checks_framing_bits() {
        let format = FrameFormat::new(StopBits::Two);
        let register = format.encode(0x3C);
        assert_eq!(format.decode(register), Ok(0x3C));
        assert_eq!(format.decode(register | START_BIT_MASK), Err(FrameError::StartBit));
        assert_eq!(format.decode(register & !(1 << 10)), Err(FrameError::StopBit));
        assert_eq!(format.decode(register & !(1 << 9)), Err(FrameError::StopBit));
    }

    #[test]
    fn test_inversion_levels() {
        assert_eq!(Inversion::Normal.idle_level(), PinState::High);
        assert_eq!(Inversion::Inverted.idle_level(), PinState::Low);
        assert_eq!(Inversion::Normal.start_edge(), EdgePolarity::Falling);
        assert_eq!(Inversion::Inverted.start_edge(), EdgePolarity::Rising);

        for inversion in [Inversion::Normal, Inversion::Inverted] {
            for mark in [true, false] {
                assert_eq!(inversion.is_mark(inversion.level(mark)), mark);
            }
            assert_eq!(
                EdgePolarity::leaving(inversion.idle_level()),
                inversion.start_edge()
            );
        }
    }
}
