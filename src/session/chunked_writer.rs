use super::transport::{Characteristic, PeripheralId, Transport, TransportError, WriteFrame, WriteMode};
use log::{debug, warn};
use serde::{Serialize, Deserialize};

/// Snapshot of a transfer's accounting
///
/// Never updated in place: every issued frame and every acknowledgement produces a new snapshot that replaces the previous one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    /// Per session transfer number
    pub id: u64,
    pub total_frames: usize,
    pub frames_sent: usize,
    pub frames_acknowledged: usize,
    pub mode: WriteMode
}

impl TransferProgress {
    fn sent(self) -> TransferProgress {
        TransferProgress {
            frames_sent: self.frames_sent + 1,
            ..self
        }
    }

    fn acknowledged(self) -> TransferProgress {
        TransferProgress {
            frames_acknowledged: self.frames_acknowledged + 1,
            ..self
        }
    }

    /// Every frame was issued and, for acknowledged writes, confirmed
    pub fn is_complete(&self) -> bool {
        match self.mode {
            WriteMode::Acknowledged => self.frames_sent == self.total_frames && self.frames_acknowledged == self.total_frames,
            WriteMode::Unacknowledged => self.frames_sent == self.total_frames
        }
    }
}

/// Splits a buffer into frames of at most `max_frame_len` bytes
///
/// A limit of zero disables fragmentation. Only the last frame may be shorter than the limit, and an empty buffer yields no frame at all.
///
/// ```rust
/// use bleprint::session::split_frames;
///
/// let buffer = vec![0u8; 300];
/// let lengths: Vec<usize> = split_frames(&buffer, 90).map(|frame| frame.payload.len()).collect();
/// assert_eq!(vec![90, 90, 90, 30], lengths);
/// ```
pub fn split_frames(buffer: &[u8], max_frame_len: usize) -> impl Iterator<Item = WriteFrame<'_>> {
    let frame_len = if max_frame_len == 0 { buffer.len().max(1) } else { max_frame_len };
    buffer.chunks(frame_len).enumerate().map(|(sequence, payload)| WriteFrame { sequence, payload })
}

/// Streams one command buffer to a characteristic
///
/// In acknowledged mode the writer is stop-and-wait: a frame is only issued once the previous one has been acknowledged, so a failed acknowledgement leaves the rest of the buffer unsent. In unacknowledged mode every frame is issued at once.
#[derive(Debug)]
pub struct ChunkedWriter {
    buffer: Vec<u8>,
    max_frame_len: usize,
    progress: TransferProgress
}

impl ChunkedWriter {
    pub fn new(id: u64, buffer: Vec<u8>, max_frame_len: usize, mode: WriteMode) -> ChunkedWriter {
        let total_frames = split_frames(&buffer, max_frame_len).count();
        ChunkedWriter {
            buffer,
            max_frame_len,
            progress: TransferProgress {
                id,
                total_frames,
                frames_sent: 0,
                frames_acknowledged: 0,
                mode
            }
        }
    }

    pub fn progress(&self) -> TransferProgress {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }

    /// Frames the buffer splits into
    pub fn frames(&self) -> impl Iterator<Item = WriteFrame<'_>> {
        split_frames(&self.buffer, self.max_frame_len)
    }

    /// Issues every frame that can be issued right now
    pub fn issue<T: Transport + ?Sized>(&mut self, transport: &mut T, peripheral: &PeripheralId, characteristic: &Characteristic) -> Result<(), TransportError> {
        loop {
            let progress = self.progress;
            if progress.frames_sent == progress.total_frames {
                return Ok(());
            }
            if progress.mode == WriteMode::Acknowledged && progress.frames_acknowledged < progress.frames_sent {
                // Waiting for the acknowledgement of the last frame
                return Ok(());
            }
            let frame = match self.frames().nth(progress.frames_sent) {
                Some(frame) => frame,
                None => return Ok(())
            };
            debug!("Transfer {}: frame {}/{} ({} bytes)", progress.id, frame.sequence + 1, progress.total_frames, frame.payload.len());
            transport.write_value(peripheral, characteristic, &frame, progress.mode)?;
            self.progress = progress.sent();
        }
    }

    /// Accounts an acknowledgement from the transport
    ///
    /// A failure acknowledgement is handed back to the caller, which must abandon the transfer.
    pub fn acknowledge(&mut self, result: Result<(), TransportError>) -> Result<(), TransportError> {
        let progress = self.progress;
        if progress.mode == WriteMode::Unacknowledged || progress.frames_acknowledged >= progress.frames_sent {
            warn!("Transfer {}: ignoring an acknowledgement for a frame that was never issued", progress.id);
            return Ok(());
        }
        result?;
        self.progress = progress.acknowledged();
        Ok(())
    }
}
