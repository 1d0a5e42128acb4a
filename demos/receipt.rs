mod common;

use bleprint::{
    EscEncoder, PrinterSession,
    command::{CutMode, FontSize, Justification},
    esc::ColumnOptions,
    session::PrinterModel
};
use common::SimulatedPrinter;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut encoder = EscEncoder::new();
    encoder.append_text("Coffee shop", Justification::Center, FontSize::MediumLarge, true);
    encoder.append_separator_line();
    encoder.append_columns("Item", "Qty", "Sum", ColumnOptions{is_title: true, ..ColumnOptions::default()});
    encoder.append_columns("Latte", "2", "9.00", ColumnOptions::default());
    encoder.append_columns("拿铁", "1", "4.50", ColumnOptions::default());
    encoder.append_dotted_line();
    encoder.append_key_value("Total", "13.50", FontSize::Small, true, true);
    encoder.append_solid_line_with_text("Thanks");
    encoder.new_line();
    if let Err(e) = encoder.append_qr_code("https://example.com/receipt/1", 7, Justification::Center) {
        println!("Error: {}", e);
    }
    if let Err(e) = encoder.append_barcode_image("RCPT-0001", Justification::Center, bleprint::esc::DEFAULT_BARCODE_IMAGE_WIDTH) {
        println!("Error: {}", e);
    }
    encoder.feed_lines(3);
    encoder.cut_paper(CutMode::Partial);
    let buffer = encoder.into_bytes();

    let transport = SimulatedPrinter::new("AA:BB:CC:DD:EE:01", Some(182));
    let (session, _observations) = PrinterSession::new(transport, PrinterModel::Generic18F0.profile(), "AA:BB:CC:DD:EE:01".into());
    match common::print(session, buffer) {
        Ok(received) => println!("The printer received {} bytes", received.len()),
        Err(e) => println!("Error: {}", e)
    }
}
