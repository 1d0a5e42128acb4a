extern crate uuid;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Base of every 16 bit Bluetooth SIG assigned number
const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Expands a 16 bit assigned number (`0x18F0`) into the full 128 bit uuid
///
/// ```rust
/// use bleprint::session::uuid_from_u16;
///
/// assert_eq!("000018f0-0000-1000-8000-00805f9b34fb", uuid_from_u16(0x18f0).to_string());
/// ```
pub const fn uuid_from_u16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Stable identifier the transport gives to a peripheral
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeripheralId(pub String);

impl std::fmt::Display for PeripheralId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for PeripheralId {
    fn from(id: &str) -> PeripheralId {
        PeripheralId(id.to_string())
    }
}

impl From<String> for PeripheralId {
    fn from(id: String) -> PeripheralId {
        PeripheralId(id)
    }
}

/// A peripheral seen while scanning
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiscoveredPeripheral {
    pub id: PeripheralId,
    /// Advertised local name, if any
    pub name: Option<String>,
    pub rssi: Option<i16>,
    /// Advertised service uuids
    pub services: Vec<Uuid>
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub uuid: Uuid
}

/// GATT characteristic properties relevant to printing
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacteristicProperties {
    pub read: bool,
    /// Write with response
    pub write: bool,
    pub write_without_response: bool,
    pub notify: bool
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Characteristic {
    /// Service the characteristic belongs to
    pub service: Uuid,
    pub uuid: Uuid,
    pub properties: CharacteristicProperties
}

impl Characteristic {
    /// Write mode this characteristic supports, preferring acknowledged writes
    pub fn write_mode(&self) -> Option<WriteMode> {
        if self.properties.write {
            Some(WriteMode::Acknowledged)
        } else if self.properties.write_without_response {
            Some(WriteMode::Unacknowledged)
        } else {
            None
        }
    }

    pub fn supports(&self, mode: WriteMode) -> bool {
        match mode {
            WriteMode::Acknowledged => self.properties.write,
            WriteMode::Unacknowledged => self.properties.write_without_response
        }
    }
}

/// How frames are written to the characteristic
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Write with response, every frame gets an acknowledgement
    Acknowledged,
    /// Write without response, nothing ever comes back
    Unacknowledged
}

/// A bounded slice of a command buffer, along with its position in the transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteFrame<'a> {
    pub sequence: usize,
    pub payload: &'a [u8]
}

/// Failure reported by the platform Bluetooth stack
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new<A: Into<String>>(message: A) -> TransportError {
        TransportError(message.into())
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "{}", self.0)
    }
}

impl std::error::Error for TransportError{}

/// Requests the session issues to the platform Bluetooth stack
///
/// Every request returns immediately. Asynchronous outcomes come back as [TransportEvent]s, which the integration layer feeds, one at a time and in order, to [PrinterSession::handle](crate::PrinterSession::handle).
pub trait Transport {
    fn start_scan(&mut self, services: Option<&[Uuid]>) -> Result<(), TransportError>;

    fn stop_scan(&mut self) -> Result<(), TransportError>;

    /// Outcome arrives as [Connected](TransportEvent::Connected) or [ConnectFailed](TransportEvent::ConnectFailed)
    fn connect(&mut self, peripheral: &PeripheralId) -> Result<(), TransportError>;

    fn cancel_connection(&mut self, peripheral: &PeripheralId) -> Result<(), TransportError>;

    fn discover_services(&mut self, peripheral: &PeripheralId, services: Option<&[Uuid]>) -> Result<(), TransportError>;

    fn discover_characteristics(&mut self, peripheral: &PeripheralId, service: &Service, characteristics: Option<&[Uuid]>) -> Result<(), TransportError>;

    fn discover_descriptors(&mut self, peripheral: &PeripheralId, characteristic: &Characteristic) -> Result<(), TransportError>;

    /// Acknowledged writes are answered by a [WriteAcknowledged](TransportEvent::WriteAcknowledged) event
    fn write_value(&mut self, peripheral: &PeripheralId, characteristic: &Characteristic, frame: &WriteFrame, mode: WriteMode) -> Result<(), TransportError>;

    /// Largest payload the link accepts for the given write mode, once negotiated
    fn negotiated_max_payload(&self, peripheral: &PeripheralId, mode: WriteMode) -> Option<usize>;
}

/// Outcomes reported by the platform Bluetooth stack
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Discovered(DiscoveredPeripheral),
    Connected(PeripheralId),
    ConnectFailed {
        peripheral: PeripheralId,
        error: TransportError
    },
    Disconnected {
        peripheral: PeripheralId,
        error: Option<TransportError>
    },
    ServicesDiscovered {
        peripheral: PeripheralId,
        result: Result<Vec<Service>, TransportError>
    },
    CharacteristicsDiscovered {
        peripheral: PeripheralId,
        service: Service,
        result: Result<Vec<Characteristic>, TransportError>
    },
    DescriptorsDiscovered {
        peripheral: PeripheralId,
        characteristic: Characteristic,
        result: Result<(), TransportError>
    },
    WriteAcknowledged {
        peripheral: PeripheralId,
        characteristic: Characteristic,
        result: Result<(), TransportError>
    }
}

impl TransportEvent {
    /// Peripheral the event refers to
    pub fn peripheral(&self) -> &PeripheralId {
        match self {
            TransportEvent::Discovered(discovered) => &discovered.id,
            TransportEvent::Connected(peripheral) => peripheral,
            TransportEvent::ConnectFailed{peripheral, ..} => peripheral,
            TransportEvent::Disconnected{peripheral, ..} => peripheral,
            TransportEvent::ServicesDiscovered{peripheral, ..} => peripheral,
            TransportEvent::CharacteristicsDiscovered{peripheral, ..} => peripheral,
            TransportEvent::DescriptorsDiscovered{peripheral, ..} => peripheral,
            TransportEvent::WriteAcknowledged{peripheral, ..} => peripheral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_uuids_expand_over_the_base() {
        assert_eq!("00001101-0000-1000-8000-00805f9b34fb", uuid_from_u16(0x1101).to_string());
        assert_eq!("0000ffff-0000-1000-8000-00805f9b34fb", uuid_from_u16(0xffff).to_string());
    }

    #[test]
    fn acknowledged_writes_win() {
        let mut characteristic = Characteristic {
            service: uuid_from_u16(0x18f0),
            uuid: uuid_from_u16(0x2af1),
            properties: CharacteristicProperties {
                write: true,
                write_without_response: true,
                ..CharacteristicProperties::default()
            }
        };
        assert_eq!(Some(WriteMode::Acknowledged), characteristic.write_mode());
        characteristic.properties.write = false;
        assert_eq!(Some(WriteMode::Unacknowledged), characteristic.write_mode());
        characteristic.properties.write_without_response = false;
        assert_eq!(None, characteristic.write_mode());
    }
}
