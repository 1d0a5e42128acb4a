use super::transport::WriteMode;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Frame size used until the link reports a larger one
pub const DEFAULT_MAX_FRAME_LEN: usize = 90;

/// Details required to connect and stream to a printer
///
/// Most printers work with the defaults: 90 byte frames, every service and characteristic considered, scanning stopped once connected. Use the builder to change any of them.
///
/// ```rust
/// use bleprint::session::SessionProfile;
///
/// let profile = SessionProfile::default();
/// assert_eq!(90, profile.max_frame_len());
/// assert!(profile.stop_scan_on_connect());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionProfile {
    /// Upper bound for a frame, `0` sends whole buffers in one write
    pub (crate) max_frame_len: usize,
    /// Services to look up, `None` discovers all of them
    pub (crate) service_filter: Option<Vec<Uuid>>,
    /// Characteristics to look up in every service, `None` discovers all of them
    pub (crate) characteristic_filter: Option<Vec<Uuid>>,
    pub (crate) stop_scan_on_connect: bool,
    /// Overrides the write mode picked from the characteristic properties
    pub (crate) write_mode: Option<WriteMode>
}

impl SessionProfile {
    /// Creates a [SessionProfileBuilder](crate::session::SessionProfileBuilder) with the default values
    pub fn builder() -> SessionProfileBuilder {
        SessionProfileBuilder::new()
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn service_filter(&self) -> Option<&[Uuid]> {
        self.service_filter.as_deref()
    }

    pub fn characteristic_filter(&self) -> Option<&[Uuid]> {
        self.characteristic_filter.as_deref()
    }

    pub fn stop_scan_on_connect(&self) -> bool {
        self.stop_scan_on_connect
    }

    pub fn write_mode(&self) -> Option<WriteMode> {
        self.write_mode
    }

    /// Frame size for the next transfer, given what the link negotiated
    ///
    /// The larger of both values wins, unless fragmentation is disabled.
    pub fn effective_frame_len(&self, negotiated: Option<usize>) -> usize {
        if self.max_frame_len == 0 {
            0
        } else {
            self.max_frame_len.max(negotiated.unwrap_or(0))
        }
    }
}

impl Default for SessionProfile {
    fn default() -> SessionProfile {
        SessionProfileBuilder::new().build()
    }
}

/// Helper structure to create a [SessionProfile](crate::session::SessionProfile)
pub struct SessionProfileBuilder {
    max_frame_len: usize,
    service_filter: Option<Vec<Uuid>>,
    characteristic_filter: Option<Vec<Uuid>>,
    stop_scan_on_connect: bool,
    write_mode: Option<WriteMode>
}

impl SessionProfileBuilder {
    pub fn new() -> SessionProfileBuilder {
        SessionProfileBuilder {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            service_filter: None,
            characteristic_filter: None,
            stop_scan_on_connect: true,
            write_mode: None
        }
    }

    /// Sets the frame size used until the link negotiates a larger one
    ///
    /// A value of zero disables fragmentation altogether.
    /// ```rust
    /// use bleprint::session::SessionProfile;
    /// let profile = SessionProfile::builder()
    ///     .with_max_frame_len(20)
    ///     .build();
    /// assert_eq!(20, profile.max_frame_len());
    /// ```
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> SessionProfileBuilder {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Restricts service discovery to the given uuids
    ///
    /// ```rust
    /// use bleprint::session::{SessionProfile, uuid_from_u16};
    /// let profile = SessionProfile::builder()
    ///     .with_service_filter(vec![uuid_from_u16(0x18f0)])
    ///     .build();
    /// assert_eq!(1, profile.service_filter().unwrap().len());
    /// ```
    pub fn with_service_filter(mut self, services: Vec<Uuid>) -> SessionProfileBuilder {
        self.service_filter = Some(services);
        self
    }

    pub fn with_characteristic_filter(mut self, characteristics: Vec<Uuid>) -> SessionProfileBuilder {
        self.characteristic_filter = Some(characteristics);
        self
    }

    /// Keeps scanning after the connection is established
    pub fn with_stop_scan_on_connect(mut self, stop_scan_on_connect: bool) -> SessionProfileBuilder {
        self.stop_scan_on_connect = stop_scan_on_connect;
        self
    }

    /// Forces a write mode, regardless of what the characteristic advertises
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> SessionProfileBuilder {
        self.write_mode = Some(write_mode);
        self
    }

    /// Build the `SessionProfile` that lies beneath the builder
    pub fn build(self) -> SessionProfile {
        SessionProfile {
            max_frame_len: self.max_frame_len,
            service_filter: self.service_filter,
            characteristic_filter: self.characteristic_filter,
            stop_scan_on_connect: self.stop_scan_on_connect,
            write_mode: self.write_mode
        }
    }
}

impl Default for SessionProfileBuilder {
    fn default() -> SessionProfileBuilder {
        SessionProfileBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::uuid_from_u16;

    #[test]
    fn larger_negotiated_payload_wins() {
        let profile = SessionProfile::default();
        assert_eq!(90, profile.effective_frame_len(None));
        assert_eq!(90, profile.effective_frame_len(Some(20)));
        assert_eq!(182, profile.effective_frame_len(Some(182)));
    }

    #[test]
    fn zero_disables_fragmentation_even_when_negotiated() {
        let profile = SessionProfile::builder().with_max_frame_len(0).build();
        assert_eq!(0, profile.effective_frame_len(Some(512)));
    }

    #[test]
    fn profile_survives_serialization() {
        let profile = SessionProfile::builder()
            .with_service_filter(vec![uuid_from_u16(0x18f0)])
            .with_characteristic_filter(vec![uuid_from_u16(0x2af1)])
            .with_write_mode(WriteMode::Unacknowledged)
            .with_stop_scan_on_connect(false)
            .build();
        let json = serde_json::to_string(&profile).unwrap();
        let restored: SessionProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, restored);
    }
}
