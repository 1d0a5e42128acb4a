mod common;

use bleprint::{
    Error, TscEncoder,
    session::{PrinterModel, SessionRegistry, Stage, DEFAULT_KEY},
    tsc::{BarcodeType, QrEcc, QrMode, Rotation}
};
use common::SimulatedPrinter;

const PRINTER: &str = "AA:BB:CC:DD:EE:02";

fn run(buffer: Vec<u8>) -> Result<Vec<u8>, Error> {
    let mut registry = SessionRegistry::new();
    registry.connect(DEFAULT_KEY, SimulatedPrinter::new(PRINTER, None), PrinterModel::SerialPort.profile(), PRINTER.into())?;
    let mut buffer = Some(buffer);
    loop {
        let event = match registry.get_mut(DEFAULT_KEY).and_then(|session| session.transport_mut().next_event()) {
            Some(event) => event,
            None => break
        };
        registry.dispatch(DEFAULT_KEY, event)?;
        if registry.get(DEFAULT_KEY).map(|session| session.stage()) == Some(Stage::Ready) {
            if let Some(buffer) = buffer.take() {
                registry.send(DEFAULT_KEY, buffer)?;
            }
        }
    }
    let received = registry.get(DEFAULT_KEY)
        .map(|session| session.transport().received().to_vec())
        .unwrap_or_default();
    registry.disconnect(DEFAULT_KEY)?;
    Ok(received)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut encoder = TscEncoder::new();
    encoder.add_size(40, 30);
    encoder.add_gap(2, 0);
    encoder.add_direction(0);
    encoder.add_cls();
    encoder.add_text(16, 16, "TSS24.BF2", Rotation::None, 1, 1, "Shelf A-12");
    encoder.add_barcode(16, 60, BarcodeType::Code128, 48, true, Rotation::None, 2, 4, "A12-0042");
    encoder.add_qr_code(220, 16, QrEcc::M, 4, QrMode::Auto, Rotation::None, "https://example.com/a12");
    encoder.add_box(8, 8, 312, 232, 2);
    encoder.add_print(1, 1);

    match run(encoder.into_bytes()) {
        Ok(received) => println!("{}", String::from_utf8_lossy(&received)),
        Err(e) => println!("Error: {}", e)
    }
}
