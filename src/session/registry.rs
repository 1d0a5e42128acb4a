use std::collections::HashMap;
use crate::Error;
use super::{Observation, PeripheralId, PrinterSession, SessionProfile, TransferProgress, Transport, TransportEvent};
use log::info;
use tokio::sync::mpsc::UnboundedReceiver;

/// Key used when only one printer is driven
pub const DEFAULT_KEY: &str = "default";

/// Caller owned map of independent sessions, one per logical printer key
///
/// Each session is single flight on its own, several keys allow several printers at once.
///
/// ```rust,no_run
/// use bleprint::session::{SessionRegistry, Transport, PrinterModel, DEFAULT_KEY};
///
/// fn reconnect<T: Transport>(registry: &mut SessionRegistry<T>, transport: T) {
///     // Any session already under the key is torn down first
///     let _observations = registry.connect(DEFAULT_KEY, transport, PrinterModel::SerialPort.profile(), "AA:BB:CC:DD:EE:FF".into()).unwrap();
/// }
/// ```
pub struct SessionRegistry<T: Transport> {
    sessions: HashMap<String, PrinterSession<T>>
}

impl<T: Transport> SessionRegistry<T> {
    pub fn new() -> SessionRegistry<T> {
        SessionRegistry {
            sessions: HashMap::new()
        }
    }

    /// Creates a session under `key` and starts connecting it
    ///
    /// A session previously registered under the same key is disconnected before the new one starts connecting, aborting its transfer if any.
    pub fn connect<A: Into<String>>(&mut self, key: A, transport: T, profile: SessionProfile, target: PeripheralId) -> Result<UnboundedReceiver<Observation>, Error> {
        let key = key.into();
        if let Some(mut prior) = self.sessions.remove(&key) {
            info!("Replacing the session under {{{}}}", key);
            prior.disconnect();
        }
        let (mut session, observations) = PrinterSession::new(transport, profile, target);
        let connected = session.connect();
        self.sessions.insert(key, session);
        connected.map(|_| observations)
    }

    /// Routes a transport event to the session under `key`
    pub fn dispatch(&mut self, key: &str, event: TransportEvent) -> Result<Vec<Observation>, Error> {
        self.get_mut(key)
            .map(|session| session.handle(event))
            .ok_or_else(|| Error::UnknownSession(key.to_string()))
    }

    pub fn send(&mut self, key: &str, buffer: Vec<u8>) -> Result<TransferProgress, Error> {
        match self.get_mut(key) {
            Some(session) => session.send(buffer),
            None => Err(Error::UnknownSession(key.to_string()))
        }
    }

    /// Tears down and forgets the session under `key`
    pub fn disconnect(&mut self, key: &str) -> Result<Vec<Observation>, Error> {
        match self.sessions.remove(key) {
            Some(mut session) => Ok(session.disconnect()),
            None => Err(Error::UnknownSession(key.to_string()))
        }
    }

    pub fn get(&self, key: &str) -> Option<&PrinterSession<T>> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PrinterSession<T>> {
        self.sessions.get_mut(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(|key| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<T: Transport> Default for SessionRegistry<T> {
    fn default() -> SessionRegistry<T> {
        SessionRegistry::new()
    }
}
