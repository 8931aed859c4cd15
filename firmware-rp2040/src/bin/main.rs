#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_time::Timer;
use flight_targets::PICO;
use softserial_core::SerialPassthrough;
use softserial_rp2040::{
    run_capture, run_tick, CaptureState, PicoCapture, PicoPorts, PicoSerial, PicoTick, PortConfig,
    SoftSerialPortIndex, TickState,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

/// GPS side of the passthrough.
const SOFTSERIAL1_BAUD: u32 = 9_600;
/// Host side of the passthrough.
const SOFTSERIAL2_BAUD: u32 = 19_200;

/// Seconds between diagnostics lines.
const STATS_INTERVAL_SECS: u64 = 5;

/// Port table, reached from the capture and tick tasks.
static PORTS: PicoPorts = PicoPorts::new();

/// Shared channel state, one per port.
static CAPTURE_STATE: StaticCell<[CaptureState; 2]> = StaticCell::new();
static TICK_STATE: StaticCell<[TickState; 2]> = StaticCell::new();

/// Runs the edge and tick tasks above thread-mode priority.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Soft serial starting on {}...", PICO.name);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let capture_state: &'static [CaptureState; 2] =
        CAPTURE_STATE.init([CaptureState::new(), CaptureState::new()]);
    let tick_state: &'static [TickState; 2] = TICK_STATE.init([TickState::new(), TickState::new()]);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);

    // --- SOFTSERIAL1: GPIO 1 RX, GPIO 0 TX ---
    let port1 = SoftSerialPortIndex::SoftSerial1;
    let (rx_res, tx_res) = PICO.softserial_resources(port1).unwrap();
    let rx_pin = Input::new(p.PIN_1, Pull::Up);
    let tx_pin = Output::new(p.PIN_0, Level::High);
    high.spawn(capture_task(port1, rx_pin, &capture_state[0]).unwrap());
    high.spawn(tick_task(port1, &tick_state[0]).unwrap());
    let gps = PORTS
        .open(
            port1,
            PortConfig::new(SOFTSERIAL1_BAUD),
            PicoCapture::new(rx_res, &capture_state[0]),
            PicoTick::new(tx_res, tx_pin, &tick_state[0]),
        )
        .unwrap();

    // --- SOFTSERIAL2: GPIO 5 RX, GPIO 4 TX ---
    let port2 = SoftSerialPortIndex::SoftSerial2;
    let (rx_res, tx_res) = PICO.softserial_resources(port2).unwrap();
    let rx_pin = Input::new(p.PIN_5, Pull::Up);
    let tx_pin = Output::new(p.PIN_4, Level::High);
    high.spawn(capture_task(port2, rx_pin, &capture_state[1]).unwrap());
    high.spawn(tick_task(port2, &tick_state[1]).unwrap());
    let host = PORTS
        .open(
            port2,
            PortConfig::new(SOFTSERIAL2_BAUD),
            PicoCapture::new(rx_res, &capture_state[1]),
            PicoTick::new(tx_res, tx_pin, &tick_state[1]),
        )
        .unwrap();

    spawner.spawn(passthrough_task(SerialPassthrough::new(gps, host)).unwrap());
    spawner.spawn(stats_task().unwrap());

    info!("Soft serial initialized, passing bytes through...");
}

/// Capture task - timestamps RX edges and fires stop-bit deadlines.
#[embassy_executor::task(pool_size = 2)]
async fn capture_task(
    index: SoftSerialPortIndex,
    pin: Input<'static>,
    state: &'static CaptureState,
) {
    run_capture(&PORTS, index, pin, state).await
}

/// Tick task - shifts TX bits out at the port's bit rate.
#[embassy_executor::task(pool_size = 2)]
async fn tick_task(index: SoftSerialPortIndex, state: &'static TickState) {
    run_tick(&PORTS, index, state).await
}

/// Passthrough task - moves bytes between the two ports.
#[embassy_executor::task]
async fn passthrough_task(mut bridge: SerialPassthrough<PicoSerial, PicoSerial>) {
    loop {
        if let Err(e) = bridge.poll() {
            warn!("Passthrough error: {:?}", e);
        }
        // One byte at 19200 baud takes ~520 us
        Timer::after_millis(1).await;
    }
}

/// Stats task - logs per-port counters.
#[embassy_executor::task]
async fn stats_task() {
    loop {
        Timer::after_secs(STATS_INTERVAL_SECS).await;
        for index in PORTS.open_ports() {
            let stats = PORTS.stats(index);
            info!(
                "{}: rx_errors={} tx_errors={} rx_overflows={} tx_overflows={}",
                index, stats.rx_errors, stats.tx_errors, stats.rx_overflows, stats.tx_overflows
            );
        }
    }
}
