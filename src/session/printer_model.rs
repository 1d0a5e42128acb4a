use super::{SessionProfile, uuid_from_u16};
use uuid::Uuid;

/// Printers known to this library
///
/// Probably needs updates. Most cheap thermal printers expose one of these two services.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrinterModel {
    /// Receipt and label printers exposing the `0x18F0` vendor service
    Generic18F0,
    /// Printers exposing the serial port profile over GATT (`0x1101`)
    SerialPort
}

impl PrinterModel {
    /// Services scanned for when looking for any known printer
    pub fn known_services() -> Vec<Uuid> {
        vec![uuid_from_u16(0x1101), uuid_from_u16(0x18f0)]
    }

    pub fn service(&self) -> Uuid {
        match self {
            PrinterModel::Generic18F0 => uuid_from_u16(0x18f0),
            PrinterModel::SerialPort => uuid_from_u16(0x1101)
        }
    }

    /// Obtain the full details of the printer, to make an easy print
    ///
    /// ```rust
    /// use bleprint::session::{PrinterModel, uuid_from_u16};
    ///
    /// let profile = PrinterModel::Generic18F0.profile();
    /// assert_eq!(Some(&[uuid_from_u16(0x18f0)][..]), profile.service_filter());
    /// ```
    pub fn profile(&self) -> SessionProfile {
        SessionProfile::builder()
            .with_service_filter(vec![self.service()])
            .build()
    }
}
