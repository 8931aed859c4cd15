//! Raspberry Pi Pico (RP2040).
//!
//! The RP2040 has no input-capture timers. RX pins use the bank 0 GPIO edge
//! interrupt and are timestamped from the 1 MHz system timer; TX pins are
//! plain SIO outputs paced by timer alarms. Channel numbers here only need
//! to be unique per pin.

use softserial_core::{
    BoardTable, GpioBank, IoConfig, IrqNumber, PinTag, SoftSerialResources, TimerChannel,
    TimerHardware, TimerId,
};

pub const TIMER_IRQ_0: IrqNumber = IrqNumber(0);
pub const IO_IRQ_BANK0: IrqNumber = IrqNumber(13);

/// System timer tick rate.
pub const TIMER_CLOCK_HZ: u32 = 1_000_000;

/// GPIO function select for software-controlled pins.
const FUNCSEL_SIO: u8 = 5;

const fn rx(pin: u8) -> TimerHardware {
    TimerHardware {
        timer: TimerId(0),
        pin: PinTag::new(GpioBank::Bank0, pin),
        channel: TimerChannel(pin),
        irq: IO_IRQ_BANK0,
        output_enable: false,
        io_config: IoConfig::InputPullUp,
        alternate_function: FUNCSEL_SIO,
        inverted: false,
    }
}

const fn tx(pin: u8) -> TimerHardware {
    TimerHardware {
        timer: TimerId(0),
        pin: PinTag::new(GpioBank::Bank0, pin),
        channel: TimerChannel(pin),
        irq: TIMER_IRQ_0,
        output_enable: false,
        io_config: IoConfig::OutputPushPull,
        alternate_function: FUNCSEL_SIO,
        inverted: false,
    }
}

pub static TIMER_HARDWARE: [TimerHardware; 4] = [tx(0), rx(1), tx(4), rx(5)];

pub static PICO: BoardTable = BoardTable {
    name: "PICO",
    timers: &TIMER_HARDWARE,
    softserial: [
        SoftSerialResources { rx: 1, tx: 0 },
        SoftSerialResources { rx: 3, tx: 2 },
    ],
};
