//! embassy-usb glue: device configuration, the control request handler and
//! the interrupt endpoint wrappers used by the report pumps.

use adapter_core::{
    AdapterProfile, ControlRelay, EndpointError, InEndpoint, InReply, OutEndpoint, OutReply,
    PairingStore, UsbIdentity,
};
use adapter_proto::ControlRequest;
use defmt::{debug, info};
use embassy_rp::peripherals::USB;
use embassy_usb::control::{InResponse, OutResponse, Request};
use embassy_usb::driver::{
    Direction, Endpoint, EndpointAddress, EndpointError as UsbEndpointError, EndpointIn,
    EndpointOut,
};
use embassy_usb::{Builder, Config as UsbConfig, Handler};

use crate::reset::WatchdogReset;
use crate::serial::TxQueue;

pub type UsbDriver = embassy_rp::usb::Driver<'static, USB>;
pub type UsbDevice = embassy_usb::UsbDevice<'static, UsbDriver>;
pub type UsbIn = UsbInEndpoint<<UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn>;
pub type UsbOut = UsbOutEndpoint<<UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointOut>;

/// Device descriptor settings for `profile`.
///
/// `ids` comes from the IDS command and replaces the built-in vid/pid.
pub fn device_config(profile: &AdapterProfile, ids: Option<(u16, u16)>) -> UsbConfig<'static> {
    let identity = UsbIdentity::for_type(profile.adapter_type).with_ids(ids);
    info!(
        "enumerating as {=str} ({=u16:#06x}:{=u16:#06x})",
        profile.name, identity.vid, identity.pid
    );

    let mut config = UsbConfig::new(identity.vid, identity.pid);
    config.manufacturer = Some("UART USB Adapter");
    config.product = Some(profile.name);
    config.max_power = 500;
    config.max_packet_size_0 = 64;
    config.composite_with_iads = false;
    (config.device_class, config.device_sub_class, config.device_protocol) =
        identity.device_class;
    config
}

/// Add the adapter's single interface and its interrupt endpoints.
///
/// Endpoint numbers, sizes and intervals are the profile's; the host talks to
/// a fixed layout, so nothing is allocated dynamically.
pub fn configure_endpoints(
    builder: &mut Builder<'static, UsbDriver>,
    profile: &AdapterProfile,
) -> (UsbIn, Option<UsbOut>) {
    let (class, subclass, protocol) = UsbIdentity::for_type(profile.adapter_type).interface_class;
    let mut function = builder.function(class, subclass, protocol);
    let mut interface = function.interface();
    let mut alt = interface.alt_setting(class, subclass, protocol, None);

    let cfg = profile.in_endpoint;
    let ep_in = alt.endpoint_interrupt_in(
        Some(EndpointAddress::from_parts(usize::from(cfg.address), Direction::In)),
        cfg.max_packet_size,
        cfg.interval_ms,
    );
    let ep_out = profile.out_endpoint.map(|cfg| {
        alt.endpoint_interrupt_out(
            Some(EndpointAddress::from_parts(usize::from(cfg.address), Direction::Out)),
            cfg.max_packet_size,
            cfg.interval_ms,
        )
    });

    (UsbInEndpoint::new(ep_in), ep_out.map(UsbOutEndpoint::new))
}

/// Convert an embassy-usb setup packet back to its wire fields.
#[must_use]
pub fn to_control_request(req: &Request) -> ControlRequest {
    let direction = match req.direction {
        Direction::In => 0x80,
        Direction::Out => 0x00,
    };
    let request_type = direction | ((req.request_type as u8) << 5) | req.recipient as u8;
    ControlRequest::new(request_type, req.request, req.value, req.index, req.length)
}

/// Control request handler answering through the relay.
pub struct RelayHandler<S> {
    relay: ControlRelay<'static, TxQueue, WatchdogReset, S>,
}

impl<S: PairingStore> RelayHandler<S> {
    pub fn new(relay: ControlRelay<'static, TxQueue, WatchdogReset, S>) -> Self {
        Self { relay }
    }
}

impl<S: PairingStore> Handler for RelayHandler<S> {
    fn reset(&mut self) {
        debug!("USB bus reset");
    }

    fn configured(&mut self, configured: bool) {
        debug!("USB configured: {=bool}", configured);
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        let req = to_control_request(&req);
        match self.relay.control_in(&req, buf)? {
            InReply::Data(len) => Some(InResponse::Accepted(&buf[..len])),
            InReply::Rejected => Some(InResponse::Rejected),
        }
    }

    fn control_out(&mut self, req: Request, data: &[u8]) -> Option<OutResponse> {
        let req = to_control_request(&req);
        match self.relay.control_out(&req, data)? {
            OutReply::Accepted => Some(OutResponse::Accepted),
            OutReply::Rejected => Some(OutResponse::Rejected),
        }
    }
}

/// Map embassy-usb endpoint errors to [`EndpointError`].
fn endpoint_error(e: UsbEndpointError) -> EndpointError {
    match e {
        UsbEndpointError::BufferOverflow => EndpointError::BufferOverflow,
        UsbEndpointError::Disabled => EndpointError::Disabled,
    }
}

/// Interrupt IN endpoint driven by [`adapter_core::InReportPump`].
pub struct UsbInEndpoint<E> {
    ep: E,
}

impl<E: EndpointIn> UsbInEndpoint<E> {
    pub fn new(ep: E) -> Self {
        Self { ep }
    }
}

impl<E: EndpointIn> InEndpoint for UsbInEndpoint<E> {
    async fn write_report(&mut self, report: &[u8]) -> Result<(), EndpointError> {
        let max_packet_size = usize::from(self.ep.info().max_packet_size);
        if report.is_empty() {
            return self.ep.write(&[]).await.map_err(endpoint_error);
        }
        for packet in report.chunks(max_packet_size) {
            self.ep.write(packet).await.map_err(endpoint_error)?;
        }
        Ok(())
    }

    async fn wait_enabled(&mut self) {
        self.ep.wait_enabled().await;
    }
}

/// Interrupt OUT endpoint driven by [`adapter_core::OutReportPump`].
pub struct UsbOutEndpoint<E> {
    ep: E,
}

impl<E: EndpointOut> UsbOutEndpoint<E> {
    pub fn new(ep: E) -> Self {
        Self { ep }
    }
}

impl<E: EndpointOut> OutEndpoint for UsbOutEndpoint<E> {
    async fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, EndpointError> {
        self.ep.read(buf).await.map_err(endpoint_error)
    }

    async fn wait_enabled(&mut self) {
        self.ep.wait_enabled().await;
    }
}
