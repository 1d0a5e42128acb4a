#![allow(dead_code)]

use std::collections::VecDeque;
use bleprint::{
    PrinterSession,
    session::{
        Characteristic, CharacteristicProperties, DiscoveredPeripheral, Observation, PeripheralId, Service,
        Stage, Transport, TransportError, TransportEvent, WriteFrame, WriteMode, uuid_from_u16
    }
};
use log::info;
use uuid::Uuid;

/// Printer living in memory: answers every request on the next turn and logs the frames it receives
pub struct SimulatedPrinter {
    id: PeripheralId,
    events: VecDeque<TransportEvent>,
    received: Vec<u8>,
    negotiated: Option<usize>
}

impl SimulatedPrinter {
    pub fn new<A: Into<PeripheralId>>(id: A, negotiated: Option<usize>) -> SimulatedPrinter {
        SimulatedPrinter {
            id: id.into(),
            events: VecDeque::new(),
            received: Vec::new(),
            negotiated
        }
    }

    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Pending answer, in the order the requests were made
    pub fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.pop_front()
    }

    fn service() -> Service {
        Service {
            uuid: uuid_from_u16(0x18f0)
        }
    }

    fn characteristics() -> Vec<Characteristic> {
        let service = uuid_from_u16(0x18f0);
        vec![
            Characteristic {
                service,
                uuid: uuid_from_u16(0x2af0),
                properties: CharacteristicProperties {notify: true, ..CharacteristicProperties::default()}
            },
            Characteristic {
                service,
                uuid: uuid_from_u16(0x2af1),
                properties: CharacteristicProperties {write: true, write_without_response: true, ..CharacteristicProperties::default()}
            }
        ]
    }
}

impl Transport for SimulatedPrinter {
    fn start_scan(&mut self, _services: Option<&[Uuid]>) -> Result<(), TransportError> {
        self.events.push_back(TransportEvent::Discovered(DiscoveredPeripheral {
            id: self.id.clone(),
            name: Some("Simulated printer".to_string()),
            rssi: Some(-48),
            services: vec![uuid_from_u16(0x18f0)]
        }));
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn connect(&mut self, peripheral: &PeripheralId) -> Result<(), TransportError> {
        self.events.push_back(TransportEvent::Connected(peripheral.clone()));
        Ok(())
    }

    fn cancel_connection(&mut self, _peripheral: &PeripheralId) -> Result<(), TransportError> {
        Ok(())
    }

    fn discover_services(&mut self, peripheral: &PeripheralId, _services: Option<&[Uuid]>) -> Result<(), TransportError> {
        self.events.push_back(TransportEvent::ServicesDiscovered {
            peripheral: peripheral.clone(),
            result: Ok(vec![SimulatedPrinter::service()])
        });
        Ok(())
    }

    fn discover_characteristics(&mut self, peripheral: &PeripheralId, service: &Service, _characteristics: Option<&[Uuid]>) -> Result<(), TransportError> {
        self.events.push_back(TransportEvent::CharacteristicsDiscovered {
            peripheral: peripheral.clone(),
            service: service.clone(),
            result: Ok(SimulatedPrinter::characteristics())
        });
        Ok(())
    }

    fn discover_descriptors(&mut self, peripheral: &PeripheralId, characteristic: &Characteristic) -> Result<(), TransportError> {
        self.events.push_back(TransportEvent::DescriptorsDiscovered {
            peripheral: peripheral.clone(),
            characteristic: characteristic.clone(),
            result: Ok(())
        });
        Ok(())
    }

    fn write_value(&mut self, peripheral: &PeripheralId, characteristic: &Characteristic, frame: &WriteFrame, mode: WriteMode) -> Result<(), TransportError> {
        info!("Frame {}: {}", frame.sequence, hex::encode(frame.payload));
        self.received.extend_from_slice(frame.payload);
        if mode == WriteMode::Acknowledged {
            self.events.push_back(TransportEvent::WriteAcknowledged {
                peripheral: peripheral.clone(),
                characteristic: characteristic.clone(),
                result: Ok(())
            });
        }
        Ok(())
    }

    fn negotiated_max_payload(&self, _peripheral: &PeripheralId, _mode: WriteMode) -> Option<usize> {
        self.negotiated
    }
}

/// Runs the session from scanning until the buffer is printed, returning the bytes the printer got
pub fn print(mut session: PrinterSession<SimulatedPrinter>, buffer: Vec<u8>) -> Result<Vec<u8>, bleprint::Error> {
    session.start_scan()?;
    let mut buffer = Some(buffer);
    loop {
        let event = match session.transport_mut().next_event() {
            Some(event) => event,
            None => break
        };
        for observation in session.handle(event) {
            match observation {
                Observation::PeripheralDiscovered(peripheral) => {
                    info!("Found {:?}", peripheral.name);
                    session.connect()?;
                },
                Observation::TransferComplete(progress) => {
                    info!("Printed in {} frames", progress.total_frames);
                },
                _ => ()
            }
        }
        if session.stage() == Stage::Ready {
            if let Some(buffer) = buffer.take() {
                session.send(buffer)?;
            }
        }
    }
    session.disconnect();
    Ok(session.transport().received().to_vec())
}
