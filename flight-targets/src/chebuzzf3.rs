//! CHEBUZZF3: STM32F303 Discovery with the ChebuzzF3 shield.
//!
//! PWM1-8 are the receiver inputs, PWM9-18 the motor and servo outputs.
//! Soft serial takes over input pairs PWM5/6 and PWM7/8.

use softserial_core::{
    BoardTable, GpioBank, IoConfig, IrqNumber, PinTag, SoftSerialResources, TimerChannel,
    TimerHardware, TimerId,
};

/// STM32F30x interrupt vectors used by the table.
pub mod irq {
    use softserial_core::IrqNumber;

    pub const TIM1_BRK_TIM15: IrqNumber = IrqNumber(24);
    pub const TIM1_UP_TIM16: IrqNumber = IrqNumber(25);
    pub const TIM1_TRG_COM_TIM17: IrqNumber = IrqNumber(26);
    pub const TIM1_CC: IrqNumber = IrqNumber(27);
    pub const TIM2: IrqNumber = IrqNumber(28);
    pub const TIM3: IrqNumber = IrqNumber(29);
    pub const TIM4: IrqNumber = IrqNumber(30);
    pub const TIM8_CC: IrqNumber = IrqNumber(46);
}

/// Timer input clock on all used timers (APB at 72 MHz).
pub const TIMER_CLOCK_HZ: u32 = 72_000_000;

const fn input(timer: u8, bank: GpioBank, pin: u8, channel: u8, irq: IrqNumber, af: u8) -> TimerHardware {
    TimerHardware {
        timer: TimerId(timer),
        pin: PinTag::new(bank, pin),
        channel: TimerChannel(channel),
        irq,
        // TIM1 and TIM8 are advanced-control timers
        output_enable: timer == 1 || timer == 8,
        io_config: IoConfig::AfPushPullPullDown,
        alternate_function: af,
        inverted: false,
    }
}

const fn output(timer: u8, bank: GpioBank, pin: u8, channel: u8, irq: IrqNumber, af: u8) -> TimerHardware {
    TimerHardware {
        timer: TimerId(timer),
        pin: PinTag::new(bank, pin),
        channel: TimerChannel(channel),
        irq,
        output_enable: false,
        io_config: IoConfig::AfPushPull,
        alternate_function: af,
        inverted: false,
    }
}

pub const USABLE_TIMER_CHANNEL_COUNT: usize = 18;

pub static TIMER_HARDWARE: [TimerHardware; USABLE_TIMER_CHANNEL_COUNT] = [
    // Inputs PWM1-8
    input(1, GpioBank::A, 8, 1, irq::TIM1_CC, 6),
    input(16, GpioBank::B, 8, 1, irq::TIM1_UP_TIM16, 1),
    input(17, GpioBank::B, 9, 1, irq::TIM1_TRG_COM_TIM17, 1),
    input(8, GpioBank::C, 6, 1, irq::TIM8_CC, 4),
    input(8, GpioBank::C, 7, 2, irq::TIM8_CC, 4),
    input(8, GpioBank::C, 8, 3, irq::TIM8_CC, 4),
    input(15, GpioBank::F, 9, 1, irq::TIM1_BRK_TIM15, 3),
    input(15, GpioBank::F, 10, 2, irq::TIM1_BRK_TIM15, 3),
    // Outputs PWM9-18
    output(4, GpioBank::D, 12, 1, irq::TIM4, 2),
    output(4, GpioBank::D, 13, 2, irq::TIM4, 2),
    output(4, GpioBank::D, 14, 3, irq::TIM4, 2),
    output(4, GpioBank::D, 15, 4, irq::TIM4, 2),
    output(2, GpioBank::A, 1, 2, irq::TIM2, 1),
    output(2, GpioBank::A, 2, 3, irq::TIM2, 1),
    output(2, GpioBank::A, 3, 4, irq::TIM2, 1),
    output(3, GpioBank::B, 0, 3, irq::TIM3, 2),
    output(3, GpioBank::B, 1, 4, irq::TIM3, 2),
    output(3, GpioBank::A, 4, 2, irq::TIM3, 2),
];

/// Table index of connector pin `PWMn` (1-based).
#[must_use]
pub const fn pwm(n: usize) -> usize {
    n - 1
}

pub static CHEBUZZF3: BoardTable = BoardTable {
    name: "CHEBUZZF3",
    timers: &TIMER_HARDWARE,
    softserial: [
        SoftSerialResources { rx: pwm(5), tx: pwm(6) },
        SoftSerialResources { rx: pwm(7), tx: pwm(8) },
    ],
};
