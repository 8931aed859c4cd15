//! Line simulation for host tests.
//!
//! `transmit` turns bytes into the edge stream a capture channel would see;
//! `receive` plays it into a decoder, firing the stop-bit deadline whenever
//! the line time passes it, the way a compare interrupt would.

extern crate std;

use crate::frame::{EdgePolarity, FrameError, FrameFormat, Inversion};
use crate::rx::{EdgeEvent, RxDecoder, RxEvent};
use embedded_hal::digital::PinState;
use std::vec::Vec;

/// True once the free-running counter at `now` has reached `at`.
pub(crate) fn reached(now: u32, at: u32) -> bool {
    (now.wrapping_sub(at) as i32) >= 0
}

/// Logical bits of `bytes` sent back to back.
pub(crate) fn frame_bits(bytes: &[u8], format: FrameFormat) -> Vec<bool> {
    let mut bits = Vec::new();
    for &byte in bytes {
        let register = format.encode(byte);
        bits.extend((0..format.frame_bits()).map(|i| register & (1 << i) != 0));
    }
    bits
}

/// Edges produced on an idle line by sending `bytes` back to back, the first
/// start bit at `start`.
pub(crate) fn transmit(
    bytes: &[u8],
    format: FrameFormat,
    inversion: Inversion,
    period: u32,
    start: u32,
) -> Vec<EdgeEvent> {
    let levels: Vec<PinState> = frame_bits(bytes, format)
        .into_iter()
        .map(|mark| inversion.level(mark))
        .collect();
    edges_from_levels(&levels, inversion.idle_level(), period, start)
}

/// Edges for a line held at `levels[k]` during cell `k`.
pub(crate) fn edges_from_levels(
    levels: &[PinState],
    idle: PinState,
    period: u32,
    start: u32,
) -> Vec<EdgeEvent> {
    let mut edges = Vec::new();
    let mut previous = idle;
    for (cell, &level) in levels.iter().enumerate() {
        if level != previous {
            edges.push(EdgeEvent {
                timestamp: start.wrapping_add(cell as u32 * period),
                polarity: EdgePolarity::leaving(previous),
            });
            previous = level;
        }
    }
    edges
}

/// Feed `edges` to `rx`, servicing deadlines in timestamp order and the last
/// one after the line goes quiet.
pub(crate) fn receive(rx: &mut RxDecoder, edges: &[EdgeEvent]) -> Vec<Result<u8, FrameError>> {
    let mut frames = Vec::new();
    let mut pending: Option<u32> = None;

    for &edge in edges {
        if let Some(at) = pending.filter(|&at| reached(edge.timestamp, at)) {
            pending = None;
            frames.extend(rx.on_event(RxEvent::Deadline { timestamp: at }).frame);
        }

        let outcome = rx.on_event(RxEvent::Edge(edge));
        frames.extend(outcome.frame);
        if outcome.deadline.is_some() {
            pending = outcome.deadline;
        } else if rx.is_searching() {
            pending = None;
        }
    }

    if let Some(at) = pending {
        frames.extend(rx.on_event(RxEvent::Deadline { timestamp: at }).frame);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::StopBits;
    use crate::timing::{BitTiming, SOFTSERIAL_BAUD_RATES};
    use crate::tx::{TickOutcome, TxScheduler};
    use std::collections::VecDeque;
    use std::vec;

    const CLOCK_HZ: u32 = 72_000_000;

    fn decoder(format: FrameFormat, inversion: Inversion, baud: u32) -> RxDecoder {
        RxDecoder::new(format, inversion, BitTiming::for_baud(CLOCK_HZ, baud).unwrap())
    }

    fn period(baud: u32) -> u32 {
        BitTiming::for_baud(CLOCK_HZ, baud).unwrap().bit_period()
    }

    #[test]
    fn test_every_byte_round_trips_at_every_rate() {
        let all: Vec<u8> = (0..=255).collect();
        for baud in SOFTSERIAL_BAUD_RATES {
            for inversion in [Inversion::Normal, Inversion::Inverted] {
                let format = FrameFormat::default();
                let mut rx = decoder(format, inversion, baud);
                // One byte per call so every frame starts from an idle line
                for &byte in &all {
                    let edges = transmit(&[byte], format, inversion, period(baud), 5_000);
                    assert_eq!(
                        receive(&mut rx, &edges),
                        vec![Ok(byte)],
                        "byte {} at {} baud",
                        byte,
                        baud
                    );
                }
            }
        }
    }

    #[test]
    fn test_back_to_back_stream() {
        let bytes: Vec<u8> = (0..=255).rev().collect();
        for stop_bits in [StopBits::One, StopBits::Two] {
            let format = FrameFormat::new(stop_bits);
            let mut rx = decoder(format, Inversion::Normal, 19_200);
            let edges = transmit(&bytes, format, Inversion::Normal, period(19_200), 0);
            let received: Vec<Result<u8, FrameError>> = receive(&mut rx, &edges);
            let expected: Vec<Result<u8, FrameError>> = bytes.iter().map(|&b| Ok(b)).collect();
            assert_eq!(received, expected);
        }
    }

    #[test]
    fn test_long_runs_produce_two_edges() {
        let format = FrameFormat::default();
        for byte in [0x00u8, 0xFF] {
            let edges = transmit(&[byte], format, Inversion::Normal, 100, 0);
            assert_eq!(edges.len(), 2);
            let mut rx = decoder(format, Inversion::Normal, 9_600);
            let edges = transmit(&[byte], format, Inversion::Normal, period(9_600), 0);
            assert_eq!(receive(&mut rx, &edges), vec![Ok(byte)]);
        }
    }

    #[test]
    fn test_inverted_line_mirrors_normal() {
        let format = FrameFormat::default();
        let normal = transmit(&[0x3A], format, Inversion::Normal, 100, 0);
        let inverted = transmit(&[0x3A], format, Inversion::Inverted, 100, 0);
        assert_eq!(normal.len(), inverted.len());
        for (n, i) in normal.iter().zip(&inverted) {
            assert_eq!(n.timestamp, i.timestamp);
            assert_eq!(n.polarity, i.polarity.opposite());
        }
    }

    #[test]
    fn test_inversion_mismatch_yields_no_byte() {
        let format = FrameFormat::default();
        for byte in [0x00u8, 0x55, 0x81, 0xFE] {
            let edges = transmit(&[byte], format, Inversion::Inverted, period(9_600), 0);
            let mut rx = decoder(format, Inversion::Normal, 9_600);
            let frames = receive(&mut rx, &edges);
            assert_eq!(frames.len(), 1, "byte {}", byte);
            assert!(frames[0].is_err(), "byte {}", byte);
        }
    }

    #[test]
    fn test_bad_stop_bit_rejected() {
        let format = FrameFormat::default();
        let p = period(9_600);
        // Start bit then space through the stop cell, released two cells late
        let mut levels = vec![PinState::Low; 12];
        levels.push(PinState::High);
        let edges = edges_from_levels(&levels, PinState::High, p, 0);
        let mut rx = decoder(format, Inversion::Normal, 9_600);
        let frames = receive(&mut rx, &edges);
        assert_eq!(frames, vec![Err(FrameError::StopBit)]);
        assert!(rx.is_searching());

        // The port keeps working afterwards
        let edges = transmit(&[0x42], format, Inversion::Normal, p, 20 * p);
        assert_eq!(receive(&mut rx, &edges), vec![Ok(0x42)]);
    }

    #[test]
    fn test_scheduler_output_decodes() {
        let format = FrameFormat::default();
        let bytes = [0x10u8, 0xEF, 0x00, 0x7E];
        let mut queue: VecDeque<u8> = bytes[1..].iter().copied().collect();
        let mut tx = TxScheduler::new(format);
        tx.begin(bytes[0]);

        // Level is driven for the cell following each tick
        let mut levels = Vec::new();
        while tx.is_transmitting() {
            match tx.on_tick(|| queue.pop_front()) {
                TickOutcome::Bit { mark, .. } => levels.push(Inversion::Normal.level(mark)),
                TickOutcome::Spurious => unreachable!(),
            }
        }
        assert_eq!(levels.len(), bytes.len() * 10);

        let p = period(4_800);
        let edges = edges_from_levels(&levels, PinState::High, p, p);
        let mut rx = decoder(format, Inversion::Normal, 4_800);
        let expected: Vec<Result<u8, FrameError>> = bytes.iter().map(|&b| Ok(b)).collect();
        assert_eq!(receive(&mut rx, &edges), expected);
    }

    #[test]
    fn test_first_tick_starts_frame_within_one_period() {
        let mut tx = TxScheduler::new(FrameFormat::default());
        tx.begin(0xFF);
        // Armed now, the first tick one period later drives the start bit
        assert_eq!(tx.on_tick(|| None), TickOutcome::Bit { mark: false, done: false });
    }

    #[test]
    fn test_reached_handles_wrap() {
        assert!(reached(10, 10));
        assert!(reached(11, 10));
        assert!(!reached(9, 10));
        assert!(reached(5, u32::MAX - 5));
        assert!(!reached(u32::MAX - 5, 5));
    }
}
