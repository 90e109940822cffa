//! Three channel PWM generator on the RP2040.
//!
//! | Channel | Slice | Pin    |
//! |---------|-------|--------|
//! | A       | PWM0  | GPIO0  |
//! | B       | PWM1  | GPIO2  |
//! | C       | PWM2  | GPIO4  |
//!
//! Commands are read from UART0 (TX on GPIO12, RX on GPIO13) at 115200 baud.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUart};
use pwmctl::mcu::{SliceTimer, TimerUnit};
use pwmctl::serial::SerialTransport;
use pwmctl::solver::SolverConfig;
use pwmctl::util::info;
use pwmctl::{Config, Controller};
use static_cell::StaticCell;
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_probe as _;

const BAUD_RATE: u32 = 115_200;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Starting PWM controller");

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = BAUD_RATE;
    static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
    static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_12,
        p.PIN_13,
        Irqs,
        TX_BUF.init([0; 256]),
        RX_BUF.init([0; 256]),
        uart_config,
    );
    let (tx, rx) = uart.split();

    let mut a = SliceTimer::new("PWM0", p.PWM_SLICE0, p.PIN_0);
    let mut b = SliceTimer::new("PWM1", p.PWM_SLICE1, p.PIN_2);
    let mut c = SliceTimer::new("PWM2", p.PWM_SLICE2, p.PIN_4);
    let timers: [&mut dyn TimerUnit; 3] = [&mut a, &mut b, &mut c];

    let config = Config {
        solver: SolverConfig::RP2040,
        ..Default::default()
    };
    Controller::new(config, timers, SerialTransport::new(rx, tx))
        .run()
        .await
}
