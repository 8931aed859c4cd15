//! Receive-side frame decoder.
//!
//! The RX pin is watched by an input-capture channel, so the decoder only
//! learns about transitions: a timestamp and the direction of each edge. Runs
//! of identical bits produce no edges, so on every edge the decoder converts
//! the time since the previous edge into a number of bit cells and fills all
//! of them with the level the line held before this edge.
//!
//! Trailing cells after the last edge of a frame (the stop bit, plus any data
//! bits equal to it) are completed by a deadline the capture channel fires in
//! the middle of the last stop bit. A start edge landing exactly where the
//! frame ends completes the frame as well, so back-to-back frames decode even
//! if the deadline is serviced late.

use crate::frame::{EdgePolarity, FrameError, FrameFormat, Inversion};
use crate::timing::BitTiming;

/// Transition captured on the RX pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    /// Timer counter at the edge, in prescaled ticks. Wraps freely.
    pub timestamp: u32,
    pub polarity: EdgePolarity,
}

/// Event delivered by a port's RX timer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// Input capture fired.
    Edge(EdgeEvent),
    /// Compare match for a deadline requested through
    /// [`CaptureChannel::schedule_deadline`](crate::CaptureChannel::schedule_deadline).
    /// Carries the timestamp the deadline was scheduled for.
    Deadline { timestamp: u32 },
}

/// Result of feeding one event to the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxOutcome {
    /// A frame finished, successfully or not.
    pub frame: Option<Result<u8, FrameError>>,
    /// A new frame started; the capture channel should fire a deadline here.
    pub deadline: Option<u32>,
}

impl RxOutcome {
    const fn error(error: FrameError) -> Self {
        Self {
            frame: Some(Err(error)),
            deadline: None,
        }
    }
}

/// Edge-timing frame decoder for one port.
#[derive(Debug, Clone)]
pub struct RxDecoder {
    format: FrameFormat,
    inversion: Inversion,
    timing: BitTiming,
    searching_for_start_bit: bool,
    /// Cells already shifted into the register.
    bit_index: u8,
    /// Cell at which the most recent edge landed.
    last_edge_bit_index: u8,
    last_edge_timestamp: u32,
    expected_edge_polarity: EdgePolarity,
    shift_register: u16,
    pending_deadline: Option<u32>,
}

impl RxDecoder {
    #[must_use]
    pub fn new(format: FrameFormat, inversion: Inversion, timing: BitTiming) -> Self {
        Self {
            format,
            inversion,
            timing,
            searching_for_start_bit: true,
            bit_index: 0,
            last_edge_bit_index: 0,
            last_edge_timestamp: 0,
            expected_edge_polarity: inversion.start_edge(),
            shift_register: 0,
            pending_deadline: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.searching_for_start_bit
    }

    /// Edge the decoder is waiting for next.
    #[inline]
    #[must_use]
    pub fn expected_polarity(&self) -> EdgePolarity {
        self.expected_edge_polarity
    }

    #[inline]
    #[must_use]
    pub fn bit_index(&self) -> u8 {
        self.bit_index
    }

    #[inline]
    #[must_use]
    pub fn last_edge_bit_index(&self) -> u8 {
        self.last_edge_bit_index
    }

    #[inline]
    #[must_use]
    pub fn timing(&self) -> &BitTiming {
        &self.timing
    }

    /// Switch to a new bit period. Only meaningful between frames.
    pub fn set_timing(&mut self, timing: BitTiming) {
        debug_assert!(self.searching_for_start_bit);
        self.timing = timing;
    }

    /// Drop any partial frame and wait for a start bit.
    pub fn reset(&mut self) {
        self.searching_for_start_bit = true;
        self.bit_index = 0;
        self.last_edge_bit_index = 0;
        self.expected_edge_polarity = self.inversion.start_edge();
        self.shift_register = 0;
        self.pending_deadline = None;
    }

    pub fn on_event(&mut self, event: RxEvent) -> RxOutcome {
        match event {
            RxEvent::Edge(edge) => self.on_edge(edge),
            RxEvent::Deadline { timestamp } => self.on_deadline(timestamp),
        }
    }

    pub fn on_edge(&mut self, edge: EdgeEvent) -> RxOutcome {
        if self.searching_for_start_bit {
            return self.try_start(edge);
        }

        if edge.polarity != self.expected_edge_polarity {
            // An edge went missing; the line may already be in a new frame.
            self.reset();
            let mut outcome = self.try_start(edge);
            outcome.frame = Some(Err(FrameError::MissedEdge));
            return outcome;
        }

        let delta = edge.timestamp.wrapping_sub(self.last_edge_timestamp);
        let cells = self.timing.cells_in(delta);
        if cells == 0 {
            self.reset();
            return RxOutcome::error(FrameError::Glitch);
        }

        let remaining = u32::from(self.format.frame_bits() - self.bit_index);
        let mark_before = self.level_before(edge.polarity);

        if cells < remaining {
            self.fill(cells as u8, mark_before);
            self.last_edge_bit_index = self.bit_index;
            self.last_edge_timestamp = edge.timestamp;
            self.expected_edge_polarity = edge.polarity.opposite();
            return RxOutcome::default();
        }

        if cells > remaining && !mark_before {
            // Space held past the end of the frame: break or noise.
            self.reset();
            return RxOutcome::error(FrameError::Overrun);
        }

        // The frame ends at (or, over an idle mark line, before) this edge.
        self.fill(remaining as u8, mark_before);
        let frame = self.complete();
        let mut outcome = self.try_start(edge);
        outcome.frame = Some(frame);
        outcome
    }

    pub fn on_deadline(&mut self, timestamp: u32) -> RxOutcome {
        if self.searching_for_start_bit || self.pending_deadline != Some(timestamp) {
            return RxOutcome::default();
        }

        let remaining = self.format.frame_bits() - self.bit_index;
        let mark = self.level_before(self.expected_edge_polarity);
        self.fill(remaining, mark);
        RxOutcome {
            frame: Some(self.complete()),
            deadline: None,
        }
    }

    fn try_start(&mut self, edge: EdgeEvent) -> RxOutcome {
        if edge.polarity != self.inversion.start_edge() {
            return RxOutcome::default();
        }

        self.searching_for_start_bit = false;
        self.bit_index = 0;
        self.last_edge_bit_index = 0;
        self.last_edge_timestamp = edge.timestamp;
        self.expected_edge_polarity = edge.polarity.opposite();
        self.shift_register = 0;

        let last_cell = u32::from(self.format.frame_bits() - 1);
        let deadline = self.timing.cell_center(edge.timestamp, last_cell);
        self.pending_deadline = Some(deadline);

        RxOutcome {
            frame: None,
            deadline: Some(deadline),
        }
    }

    /// Logical level held on the line before an edge of `polarity`.
    fn level_before(&self, polarity: EdgePolarity) -> bool {
        self.inversion.is_mark(polarity.opposite().level_after())
    }

    fn fill(&mut self, cells: u8, mark: bool) {
        debug_assert!(self.bit_index + cells <= self.format.frame_bits());
        if mark {
            let run = (1u16 << cells) - 1;
            self.shift_register |= run << self.bit_index;
        }
        self.bit_index += cells;
    }

    fn complete(&mut self) -> Result<u8, FrameError> {
        let result = self.format.decode(self.shift_register);
        self.reset();
        result
    }
}
