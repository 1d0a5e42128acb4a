use crate::session::{Stage, TransportError};

/// Errors that this crate throws.
#[derive(Debug)]
pub enum Error {
    /// The peripheral could not be reached, or rejected the connection. Terminal for the session
    Connect(TransportError),
    /// Service, characteristic or descriptor enumeration failed at the given stage
    Discovery {
        stage: Stage,
        source: TransportError
    },
    /// A frame acknowledgement reported failure, the transfer was aborted
    Write(TransportError),
    /// Another buffer is still in flight on this session
    Busy,
    /// The session has not reached the `Ready` stage yet
    NotReady(Stage),
    /// The session is disconnected or failed, a new one must be created
    SessionClosed,
    /// No session is registered under the given key
    UnknownSession(String),
    /// Text that could not be represented in the target character set
    Encoding(String),
    /// The qr code could not be generated
    QrError(qrcode::types::QrError),
    /// The payload can not be drawn as a barcode
    BarcodeError(barcoders::error::Error),
    /// The image can not be rasterized (empty, or too narrow for a single band)
    InvalidImage(String),
    /// A length prefixed payload exceeds what the device protocol can describe
    PayloadTooLong {
        length: usize,
        max: usize
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let content = match self {
            Error::Connect(e) => format!("Could not connect to the printer: {}", e),
            Error::Discovery{stage, source} => format!("Discovery failed while {:?}: {}", stage, source),
            Error::Write(e) => format!("Write failed, transfer aborted: {}", e),
            Error::Busy => "A transfer is already in flight on this session".to_string(),
            Error::NotReady(stage) => format!("The session is not ready for writes (currently {:?})", stage),
            Error::SessionClosed => "The session is closed, connect again with a new session".to_string(),
            Error::UnknownSession(key) => format!("No session registered for key {{{}}}", key),
            Error::Encoding(detail) => format!("Encoding error: {}", detail),
            Error::QrError(e) => format!("QR code error: {}", e),
            Error::BarcodeError(e) => format!("Barcode error: {}", e),
            Error::InvalidImage(detail) => format!("Invalid image: {}", detail),
            Error::PayloadTooLong{length, max} => format!("Payload of {} bytes exceeds the protocol limit of {}", length, max)
        };
        write!(formatter, "{}", content)
    }
}

impl std::error::Error for Error{}
