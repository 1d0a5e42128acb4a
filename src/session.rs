pub use self::transport::{
    Characteristic, CharacteristicProperties, DiscoveredPeripheral, PeripheralId, Service,
    Transport, TransportError, TransportEvent, WriteFrame, WriteMode, uuid_from_u16
};
pub use self::chunked_writer::{ChunkedWriter, TransferProgress, split_frames};
pub use self::session_profile::{SessionProfile, SessionProfileBuilder, DEFAULT_MAX_FRAME_LEN};
pub use self::printer_model::PrinterModel;
pub use self::registry::{SessionRegistry, DEFAULT_KEY};

mod transport;
mod chunked_writer;
mod session_profile;
mod printer_model;
mod registry;

extern crate log;
extern crate tokio;

use crate::Error;
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Connection stages of a [PrinterSession]
///
/// `Disconnected` and `Failed` are terminal, a new session must be created to try again.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Scanning,
    Connecting,
    DiscoveringServices,
    DiscoveringCharacteristics,
    DiscoveringDescriptors,
    /// A writable characteristic was found, buffers can be sent
    Ready,
    Disconnected,
    Failed
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        match self {
            Stage::Disconnected | Stage::Failed => true,
            _ => false
        }
    }

    fn is_discovering(&self) -> bool {
        match self {
            Stage::DiscoveringServices | Stage::DiscoveringCharacteristics | Stage::DiscoveringDescriptors => true,
            _ => false
        }
    }
}

/// Everything a session reports back to its owner
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    PeripheralDiscovered(DiscoveredPeripheral),
    ConnectStart(PeripheralId),
    ConnectSuccess(PeripheralId),
    ConnectFail(TransportError),
    SeekService(Result<Vec<Service>, TransportError>),
    /// Carries the writable characteristic selected so far, if any
    SeekCharacteristic {
        service: Service,
        result: Result<Option<Characteristic>, TransportError>
    },
    /// A successful lookup for the writable characteristic moves the session to `Ready`
    SeekDescriptors {
        characteristic: Characteristic,
        result: Result<(), TransportError>
    },
    Disconnected(Option<TransportError>),
    TransferComplete(TransferProgress),
    TransferFailed {
        progress: TransferProgress,
        error: TransportError
    }
}

/// One logical connection to a printer
///
/// The session never talks to the platform stack on its own initiative: requests go out through the [Transport], and their outcomes must be fed back through [handle](PrinterSession::handle), serially. Every observation is both returned to the caller and published on the channel created along with the session.
///
/// ```rust,no_run
/// use bleprint::{EscEncoder, PrinterSession, session::{PrinterModel, Transport, TransportEvent}};
///
/// fn print<T: Transport>(transport: T, events: Vec<TransportEvent>) {
///     let (mut session, _observations) = PrinterSession::new(transport, PrinterModel::Generic18F0.profile(), "AA:BB:CC:DD:EE:FF".into());
///     session.connect().unwrap();
///     for event in events {
///         session.handle(event);
///     }
///     let mut encoder = EscEncoder::new();
///     encoder.set_text("Hello, world!", None);
///     encoder.new_line();
///     session.send(encoder.into_bytes()).unwrap();
/// }
/// ```
pub struct PrinterSession<T: Transport> {
    transport: T,
    profile: SessionProfile,
    target: PeripheralId,
    stage: Stage,
    /// Characteristic lookups not answered yet
    pending_services: usize,
    writable: Option<Characteristic>,
    writer: Option<ChunkedWriter>,
    /// Last known accounting of the latest transfer
    last_transfer: Option<TransferProgress>,
    next_transfer: u64,
    observer: UnboundedSender<Observation>
}

impl<T: Transport> PrinterSession<T> {
    /// Creates an idle session, along with the receiving end of its observations
    pub fn new(transport: T, profile: SessionProfile, target: PeripheralId) -> (PrinterSession<T>, UnboundedReceiver<Observation>) {
        let (observer, observations) = mpsc::unbounded_channel();
        (PrinterSession {
            transport,
            profile,
            target,
            stage: Stage::Idle,
            pending_services: 0,
            writable: None,
            writer: None,
            last_transfer: None,
            next_transfer: 0,
            observer
        }, observations)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn target(&self) -> &PeripheralId {
        &self.target
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Characteristic the buffers are written to
    pub fn writable_characteristic(&self) -> Option<&Characteristic> {
        self.writable.as_ref()
    }

    /// A transfer is in flight
    pub fn is_busy(&self) -> bool {
        self.writer.is_some()
    }

    /// Accounting of the in flight transfer, or of the last one that ended
    pub fn transfer_progress(&self) -> Option<TransferProgress> {
        self.writer.as_ref().map(|writer| writer.progress()).or(self.last_transfer)
    }

    /// Starts looking for peripherals advertising the profile's services
    pub fn start_scan(&mut self) -> Result<(), Error> {
        match self.stage {
            Stage::Idle | Stage::Scanning => {
                self.transport.start_scan(self.profile.service_filter()).map_err(Error::Connect)?;
                self.stage = Stage::Scanning;
                debug!("Scanning for {}", self.target);
                Ok(())
            },
            stage if stage.is_terminal() => Err(Error::SessionClosed),
            stage => Err(Error::NotReady(stage))
        }
    }

    pub fn stop_scan(&mut self) -> Result<(), Error> {
        self.transport.stop_scan().map_err(Error::Connect)?;
        if self.stage == Stage::Scanning {
            self.stage = Stage::Idle;
        }
        Ok(())
    }

    /// Requests the connection to the target peripheral
    pub fn connect(&mut self) -> Result<(), Error> {
        match self.stage {
            Stage::Idle | Stage::Scanning => (),
            stage if stage.is_terminal() => return Err(Error::SessionClosed),
            _ => {
                warn!("Ignoring connect, {} is already connecting or connected", self.target);
                return Ok(());
            }
        }
        info!("Connecting to {}", self.target);
        self.stage = Stage::Connecting;
        let target = self.target.clone();
        self.publish(&mut Vec::new(), Observation::ConnectStart(target.clone()));
        if let Err(e) = self.transport.connect(&target) {
            self.stage = Stage::Failed;
            self.publish(&mut Vec::new(), Observation::ConnectFail(e.clone()));
            return Err(Error::Connect(e));
        }
        Ok(())
    }

    /// Starts the service lookup again, after a discovery error
    pub fn retry_discovery(&mut self) -> Result<(), Error> {
        match self.stage {
            stage if stage.is_discovering() => (),
            stage if stage.is_terminal() => return Err(Error::SessionClosed),
            stage => return Err(Error::NotReady(stage))
        }
        self.pending_services = 0;
        self.writable = None;
        self.stage = Stage::DiscoveringServices;
        self.transport.discover_services(&self.target, self.profile.service_filter())
            .map_err(|source| Error::Discovery{stage: Stage::DiscoveringServices, source})
    }

    /// Hands a finished command buffer to the session
    ///
    /// The call returns as soon as the frames that can be issued are; completion is reported through a [TransferComplete](Observation::TransferComplete) observation.
    pub fn send(&mut self, buffer: Vec<u8>) -> Result<TransferProgress, Error> {
        match self.stage {
            Stage::Ready => (),
            stage if stage.is_terminal() => return Err(Error::SessionClosed),
            stage => return Err(Error::NotReady(stage))
        }
        if self.writer.is_some() {
            return Err(Error::Busy);
        }
        let characteristic = match self.writable.as_ref() {
            Some(characteristic) => characteristic,
            None => return Err(Error::NotReady(self.stage))
        };
        // Forced modes the characteristic lacks fall back to its own
        let mode = match (self.profile.write_mode(), characteristic.write_mode()) {
            (Some(mode), _) if characteristic.supports(mode) => mode,
            (Some(mode), Some(own)) => {
                warn!("Characteristic {} does not support {:?} writes, using {:?}", characteristic.uuid, mode, own);
                own
            },
            (None, Some(own)) => own,
            (_, None) => return Err(Error::NotReady(self.stage))
        };
        let negotiated = self.transport.negotiated_max_payload(&self.target, mode);
        let max_frame_len = self.profile.effective_frame_len(negotiated);
        let id = self.next_transfer;
        self.next_transfer += 1;

        let writer = ChunkedWriter::new(id, buffer, max_frame_len, mode);
        info!("Transfer {}: {} frames of up to {} bytes to {}", id, writer.progress().total_frames, max_frame_len, self.target);
        self.writer = Some(writer);
        let mut observations = Vec::new();
        match self.pump(&mut observations) {
            Some(error) => Err(Error::Write(error)),
            None => self.transfer_progress().ok_or(Error::Busy)
        }
    }

    /// Tears the session down, aborting any transfer in flight
    ///
    /// Frames already handed to the transport can not be recalled; their acknowledgements are discarded.
    pub fn disconnect(&mut self) -> Vec<Observation> {
        let mut observations = Vec::new();
        match self.stage {
            Stage::Disconnected | Stage::Failed => return observations,
            Stage::Idle => (),
            Stage::Scanning => {
                if let Err(e) = self.transport.stop_scan() {
                    warn!("Could not stop scanning: {}", e);
                }
            },
            _ => {
                if let Err(e) = self.transport.cancel_connection(&self.target) {
                    warn!("Could not cancel the connection to {}: {}", self.target, e);
                }
            }
        }
        self.abort_transfer(&mut observations, TransportError::new("session torn down"));
        self.stage = Stage::Disconnected;
        info!("Disconnected from {}", self.target);
        self.publish(&mut observations, Observation::Disconnected(None));
        observations
    }

    /// Advances the state machine with an outcome reported by the transport
    pub fn handle(&mut self, event: TransportEvent) -> Vec<Observation> {
        let mut observations = Vec::new();
        if let TransportEvent::Discovered(discovered) = event {
            if self.stage == Stage::Scanning {
                self.publish(&mut observations, Observation::PeripheralDiscovered(discovered));
            }
            return observations;
        }
        if event.peripheral() != &self.target {
            warn!("Ignoring an event for {}, this session drives {}", event.peripheral(), self.target);
            return observations;
        }
        if self.stage.is_terminal() {
            if let TransportEvent::WriteAcknowledged{..} = event {
                warn!("Discarding a late acknowledgement from {}", self.target);
            } else {
                debug!("Ignoring {:?} on a closed session", event);
            }
            return observations;
        }

        match event {
            TransportEvent::Discovered(_) => (),
            TransportEvent::Connected(_) => self.on_connected(&mut observations),
            TransportEvent::ConnectFailed{error, ..} => {
                if self.stage == Stage::Connecting {
                    warn!("Connection to {} failed: {}", self.target, error);
                    self.stage = Stage::Failed;
                    self.publish(&mut observations, Observation::ConnectFail(error));
                }
            },
            TransportEvent::Disconnected{error, ..} => {
                let reason = error.clone().unwrap_or_else(|| TransportError::new("peripheral disconnected"));
                self.abort_transfer(&mut observations, reason);
                self.stage = Stage::Disconnected;
                info!("{} disconnected", self.target);
                self.publish(&mut observations, Observation::Disconnected(error));
            },
            TransportEvent::ServicesDiscovered{result, ..} => self.on_services(&mut observations, result),
            TransportEvent::CharacteristicsDiscovered{service, result, ..} => self.on_characteristics(&mut observations, service, result),
            TransportEvent::DescriptorsDiscovered{characteristic, result, ..} => self.on_descriptors(&mut observations, characteristic, result),
            TransportEvent::WriteAcknowledged{characteristic, result, ..} => self.on_acknowledged(&mut observations, characteristic, result)
        }
        observations
    }

    fn on_connected(&mut self, observations: &mut Vec<Observation>) {
        if self.stage != Stage::Connecting {
            debug!("Ignoring a connection report while {:?}", self.stage);
            return;
        }
        info!("Connected to {}", self.target);
        self.stage = Stage::DiscoveringServices;
        if self.profile.stop_scan_on_connect() {
            if let Err(e) = self.transport.stop_scan() {
                warn!("Could not stop scanning: {}", e);
            }
        }
        let target = self.target.clone();
        self.publish(observations, Observation::ConnectSuccess(target));
        if let Err(e) = self.transport.discover_services(&self.target, self.profile.service_filter()) {
            self.publish(observations, Observation::SeekService(Err(e)));
        }
    }

    fn on_services(&mut self, observations: &mut Vec<Observation>, result: Result<Vec<Service>, TransportError>) {
        if self.stage != Stage::DiscoveringServices {
            debug!("Ignoring a service list while {:?}", self.stage);
            return;
        }
        self.publish(observations, Observation::SeekService(result.clone()));
        let services = match result {
            Ok(services) => services,
            Err(e) => {
                warn!("Service discovery on {} failed: {}", self.target, e);
                return;
            }
        };
        if services.is_empty() {
            warn!("{} exposes none of the requested services", self.target);
            return;
        }
        self.stage = Stage::DiscoveringCharacteristics;
        self.pending_services = services.len();
        for service in services {
            if let Err(e) = self.transport.discover_characteristics(&self.target, &service, self.profile.characteristic_filter()) {
                self.pending_services -= 1;
                self.publish(observations, Observation::SeekCharacteristic{service, result: Err(e)});
            }
        }
    }

    fn on_characteristics(&mut self, observations: &mut Vec<Observation>, service: Service, result: Result<Vec<Characteristic>, TransportError>) {
        match self.stage {
            Stage::DiscoveringCharacteristics | Stage::DiscoveringDescriptors | Stage::Ready => (),
            stage => {
                debug!("Ignoring a characteristic list while {:?}", stage);
                return;
            }
        }
        self.pending_services = self.pending_services.saturating_sub(1);
        let characteristics = match result {
            Ok(characteristics) => characteristics,
            Err(e) => {
                warn!("Characteristic discovery on {} failed: {}", self.target, e);
                self.publish(observations, Observation::SeekCharacteristic{service, result: Err(e)});
                return;
            }
        };

        // The selection is frozen once writes may have started
        if self.stage != Stage::Ready {
            if let Some(candidate) = select_writable(&characteristics) {
                let replace = match &self.writable {
                    None => true,
                    Some(current) => current.write_mode() == Some(WriteMode::Unacknowledged) && candidate.write_mode() == Some(WriteMode::Acknowledged)
                };
                if replace {
                    debug!("Selected characteristic {} of service {}", candidate.uuid, candidate.service);
                    self.writable = Some(candidate.clone());
                    self.stage = Stage::DiscoveringDescriptors;
                }
            }
        }
        let selected = self.writable.clone();
        if selected.is_none() && self.pending_services == 0 {
            warn!("{} exposes no writable characteristic", self.target);
        }
        self.publish(observations, Observation::SeekCharacteristic{service, result: Ok(selected)});

        for characteristic in &characteristics {
            if let Err(e) = self.transport.discover_descriptors(&self.target, characteristic) {
                self.publish(observations, Observation::SeekDescriptors{characteristic: characteristic.clone(), result: Err(e)});
            }
        }
    }

    fn on_descriptors(&mut self, observations: &mut Vec<Observation>, characteristic: Characteristic, result: Result<(), TransportError>) {
        let selected = self.writable.as_ref() == Some(&characteristic);
        let success = result.is_ok();
        self.publish(observations, Observation::SeekDescriptors{characteristic, result});
        if selected && success && self.stage == Stage::DiscoveringDescriptors {
            info!("{} is ready", self.target);
            self.stage = Stage::Ready;
        }
    }

    fn on_acknowledged(&mut self, observations: &mut Vec<Observation>, characteristic: Characteristic, result: Result<(), TransportError>) {
        if self.writable.as_ref() != Some(&characteristic) {
            warn!("Ignoring an acknowledgement for characteristic {}", characteristic.uuid);
            return;
        }
        let acknowledged = match self.writer.as_mut() {
            Some(writer) => writer.acknowledge(result),
            None => {
                warn!("Discarding an acknowledgement with no transfer in flight");
                return;
            }
        };
        match acknowledged {
            Ok(()) => {
                self.pump(observations);
            },
            Err(error) => self.abort_transfer(observations, error)
        }
    }

    /// Issues whatever frames the writer allows and reports the transfer outcome
    fn pump(&mut self, observations: &mut Vec<Observation>) -> Option<TransportError> {
        let issued = match (self.writer.as_mut(), self.writable.as_ref()) {
            (Some(writer), Some(characteristic)) => writer.issue(&mut self.transport, &self.target, characteristic),
            _ => return None
        };
        if let Err(error) = issued {
            self.abort_transfer(observations, error.clone());
            return Some(error);
        }
        if self.writer.as_ref().map(|writer| writer.is_complete()).unwrap_or(false) {
            if let Some(writer) = self.writer.take() {
                let progress = writer.progress();
                info!("Transfer {} complete, {} frames", progress.id, progress.total_frames);
                self.last_transfer = Some(progress);
                self.publish(observations, Observation::TransferComplete(progress));
            }
        }
        None
    }

    fn abort_transfer(&mut self, observations: &mut Vec<Observation>, error: TransportError) {
        if let Some(writer) = self.writer.take() {
            let progress = writer.progress();
            warn!("Transfer {} failed after {} of {} frames: {}", progress.id, progress.frames_sent, progress.total_frames, error);
            self.last_transfer = Some(progress);
            self.publish(observations, Observation::TransferFailed{progress, error});
        }
    }

    fn publish(&self, observations: &mut Vec<Observation>, observation: Observation) {
        debug!("{}: {:?}", self.target, observation);
        // Nobody listening is fine
        let _ = self.observer.send(observation.clone());
        observations.push(observation);
    }
}

/// First characteristic accepting acknowledged writes, or else the first accepting unacknowledged ones
fn select_writable(characteristics: &[Characteristic]) -> Option<&Characteristic> {
    characteristics.iter().find(|c| c.properties.write)
        .or_else(|| characteristics.iter().find(|c| c.properties.write_without_response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn characteristic(short: u16, write: bool, write_without_response: bool) -> Characteristic {
        Characteristic {
            service: uuid_from_u16(0x18f0),
            uuid: uuid_from_u16(short),
            properties: CharacteristicProperties {
                write,
                write_without_response,
                ..CharacteristicProperties::default()
            }
        }
    }

    #[test]
    fn first_acknowledged_characteristic_is_selected() {
        let characteristics = vec![
            characteristic(0x2af0, false, false),
            characteristic(0x2af1, false, true),
            characteristic(0x2af2, true, false),
            characteristic(0x2af3, true, true)
        ];
        assert_eq!(uuid_from_u16(0x2af2), select_writable(&characteristics).unwrap().uuid);
    }

    #[test]
    fn unacknowledged_fallback_takes_the_first() {
        let characteristics = vec![
            characteristic(0x2af0, false, false),
            characteristic(0x2af1, false, true),
            characteristic(0x2af2, false, true)
        ];
        assert_eq!(uuid_from_u16(0x2af1), select_writable(&characteristics).unwrap().uuid);
        assert!(select_writable(&characteristics[..1]).is_none());
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Disconnected.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Ready.is_terminal());
    }
}
