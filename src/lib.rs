//! Library for driving thermal receipt and label printers over Bluetooth LE
//!
//! Printing happens in two steps. First, a command buffer is built with one of the two encoders: [EscEncoder](crate::EscEncoder) for esc/pos receipt printers, [TscEncoder](crate::TscEncoder) for tsc label printers. Then, the finished buffer is handed to a [PrinterSession](crate::PrinterSession), which streams it to the printer's writable characteristic in frames the link can carry.
//!
//! ```rust
//! use bleprint::{EscEncoder, command::{FontSize, Justification, CutMode}};
//!
//! let mut encoder = EscEncoder::new();
//! encoder.append_text("Coffee shop", Justification::Center, FontSize::MediumLarge, true);
//! encoder.append_separator_line();
//! encoder.append_key_value("Latte", "4.50", FontSize::Small, false, false);
//! encoder.append_key_value("Total", "4.50", FontSize::Small, true, true);
//! encoder.feed_lines(3);
//! encoder.cut_paper(CutMode::Partial);
//! let buffer = encoder.into_bytes();
//! ```
//!
//! ## Sessions
//!
//! The platform Bluetooth stack stays outside of this library, behind the [Transport](crate::session::Transport) trait. The session issues requests through it, and the integration layer feeds the outcomes back with [handle](crate::PrinterSession::handle), one at a time. Once the session reached the [Ready](crate::session::Stage::Ready) stage, buffers can be sent.
//!
//! ```rust,no_run
//! use bleprint::{
//!     PrinterSession, TscEncoder,
//!     session::{PrinterModel, Observation, Transport, TransportEvent},
//!     tsc::Rotation
//! };
//!
//! fn print_label<T: Transport>(transport: T, events: impl Iterator<Item = TransportEvent>) {
//!     let (mut session, mut observations) = PrinterSession::new(transport, PrinterModel::Generic18F0.profile(), "AA:BB:CC:DD:EE:FF".into());
//!     session.connect().unwrap();
//!
//!     let mut encoder = TscEncoder::new();
//!     encoder.add_size(40, 30);
//!     encoder.add_cls();
//!     encoder.add_text(10, 10, "TSS24.BF2", Rotation::None, 1, 1, "Hello, world!");
//!     encoder.add_print(1, 1);
//!     let mut buffer = Some(encoder.into_bytes());
//!
//!     for event in events {
//!         for observation in session.handle(event) {
//!             if let Observation::TransferComplete(_) = observation {
//!                 return;
//!             }
//!         }
//!         if session.stage() == bleprint::session::Stage::Ready {
//!             if let Some(buffer) = buffer.take() {
//!                 session.send(buffer).unwrap();
//!             }
//!         }
//!     }
//!     // Observations are also published on a channel
//!     while let Ok(observation) = observations.try_recv() {
//!         println!("{:?}", observation);
//!     }
//! }
//! ```
//!
//! Several printers can be driven at once through a [SessionRegistry](crate::session::SessionRegistry), one session per key.
//!
//! ## Images
//!
//! Images are rasterized into the printer's native 24 dot bands by [RasterImage](crate::raster::RasterImage). It implements both Serialize and Deserialize from [serde](https://docs.rs/serde), the bit plane being encoded to base64 to stay utf-8 compatible.

pub use esc::EscEncoder;
pub use tsc::TscEncoder;
pub use session::PrinterSession;
pub use error::{Error};

/// Contains raw esc/pos commands
pub mod command;
/// Display width and column layout
pub mod formatter;
pub mod raster;
pub mod esc;
pub mod tsc;
/// Connection and transfer state machine
pub mod session;

mod error;
