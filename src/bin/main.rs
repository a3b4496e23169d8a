#![no_std]
#![no_main]

use adapter_core::{AdapterProfile, AdapterState, ControlRelay, InReportPump, OutReportPump};
use defmt::info;
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartTx};
use embassy_rp::usb::Driver;
use embassy_rp::watchdog::Watchdog;
use embassy_usb::Builder;
use static_cell::StaticCell;
use uart_usb_adapter::reset::{self, WatchdogReset};
use uart_usb_adapter::serial::{self, SerialReceiver, TxQueue};
use uart_usb_adapter::usb::{
    configure_endpoints, device_config, RelayHandler, UsbDevice, UsbIn, UsbOut,
};
use uart_usb_adapter::Store;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Shared between the serial tasks, the control handler and the report pumps.
static STATE: StaticCell<AdapterState> = StaticCell::new();

/// Runs the serial tasks above thread mode, where the control handler may
/// be busy-waiting for a relayed answer.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static HANDLER: StaticCell<RelayHandler<Store>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(embassy_rp::config::Config::default());
    reset::install(Watchdog::new(p.WATCHDOG));

    #[cfg(not(feature = "adapter-ps4-and-ps3"))]
    let profile: &'static AdapterProfile = &uart_usb_adapter::PROFILE;
    #[cfg(feature = "adapter-ps4-and-ps3")]
    let profile: &'static AdapterProfile = {
        // Console strap, only sampled here.
        let strap = embassy_rp::gpio::Input::new(p.PIN_7, embassy_rp::gpio::Pull::Down);
        uart_usb_adapter::select_profile(strap.is_high())
    };
    info!("UART USB adapter ({=str}) starting...", profile.name);

    let state: &'static AdapterState = STATE.init(AdapterState::new(profile));

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = profile.initial_baudrate();

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(serial_tx_task(tx).unwrap());
    high_spawner.spawn(serial_rx_task(SerialReceiver::new(rx, state), state).unwrap());

    info!("waiting for START at {=u32} baud", profile.initial_baudrate());
    state.wait_started().await;

    // --- USB Setup ---
    #[cfg(feature = "adapter-ds4-pairing")]
    let store: Store = uart_usb_adapter::flash_store::FlashStore::new(p.FLASH);
    #[cfg(not(feature = "adapter-ds4-pairing"))]
    let store: Store = adapter_core::NoStore;

    let usb_driver = Driver::new(p.USB, Irqs);
    let usb_config = device_config(profile, state.ids());

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    let relay = ControlRelay::new(state, TxQueue, WatchdogReset, store);
    builder.handler(HANDLER.init(RelayHandler::new(relay)));

    let (ep_in, ep_out) = configure_endpoints(&mut builder, profile);
    let usb_device = builder.build();

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(in_report_task(ep_in, state).unwrap());
    if let Some(ep_out) = ep_out {
        spawner.spawn(out_report_task(ep_out, state).unwrap());
    }

    info!("adapter started, enumerating...");
}

/// Serial transmit task - writes queued frames to the UART.
#[embassy_executor::task]
async fn serial_tx_task(tx: UartTx<'static, Async>) -> ! {
    serial::run_tx(tx).await
}

/// Serial receive task - decodes and dispatches frames from the authority.
#[embassy_executor::task]
async fn serial_rx_task(mut receiver: SerialReceiver, state: &'static AdapterState) -> ! {
    receiver.run(state).await
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice) -> ! {
    device.run().await
}

#[embassy_executor::task]
async fn in_report_task(mut ep: UsbIn, state: &'static AdapterState) -> ! {
    InReportPump::new(state).run(&mut ep).await
}

#[embassy_executor::task]
async fn out_report_task(mut ep: UsbOut, state: &'static AdapterState) -> ! {
    OutReportPump::new(state, TxQueue).run(&mut ep).await
}
