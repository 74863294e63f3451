//! Decoded frames and the latest-frame slot
//!
//! A session keeps exactly one frame: the most recent one its capture thread
//! decoded. The slot is a `tokio::sync::watch` channel holding an immutable
//! [`Feed`] value. The capture thread swaps in a new value per frame; readers
//! clone the current value under the channel's lock, so a reader sees either
//! the previous frame or the next one, never a mix.
//!
//! `bytes::Bytes` is reference counted, so cloning a [`Frame`] out of the slot
//! does not copy pixel data.

use std::time::Instant;

use bytes::Bytes;
use tokio::sync::watch;

use super::source::CaptureError;

/// A decoded RGB8 video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Packed RGB8 pixels, `width * height * 3` bytes
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    /// Decode counter for the session, starting at 0
    ///
    /// Keeps counting across profile switches, so it is not reset when a
    /// new capture starts.
    pub sequence: u64,
    /// When the frame was published
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap decoded pixels, checking them against the stream's dimensions
    ///
    /// Returns `None` for empty frames or when the buffer length does not
    /// match `width * height * 3`.
    pub fn rgb(data: Bytes, width: u32, height: u32, sequence: u64) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;

        if expected == 0 || data.len() != expected {
            return None;
        }

        Some(Self {
            data,
            width,
            height,
            sequence,
            captured_at: Instant::now(),
        })
    }

    /// Frame size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed frame
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Contents of the latest-frame slot
#[derive(Debug, Clone)]
pub enum Feed {
    /// No frame decoded since the capture (re)started
    Pending,
    /// Most recent frame
    Live(Frame),
    /// The capture failed; no further frames will arrive
    Ended(CaptureError),
}

impl Feed {
    /// Whether the producing stream has failed
    pub fn is_ended(&self) -> bool {
        matches!(self, Feed::Ended(_))
    }
}

/// Single-writer, many-reader holder of a session's latest frame
#[derive(Debug)]
pub struct FrameSlot {
    tx: watch::Sender<Feed>,
}

impl FrameSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Feed::Pending);
        Self { tx }
    }

    /// Replace the current frame
    pub fn publish(&self, frame: Frame) {
        self.tx.send_replace(Feed::Live(frame));
    }

    /// Record a terminal capture failure
    pub fn end(&self, error: CaptureError) {
        self.tx.send_replace(Feed::Ended(error));
    }

    /// Forget the current frame before a new capture starts
    pub fn reset(&self) {
        self.tx.send_replace(Feed::Pending);
    }

    /// Clone the current contents
    pub fn current(&self) -> Feed {
        self.tx.borrow().clone()
    }

    /// The latest frame, if one is available
    pub fn latest(&self) -> Option<Frame> {
        match &*self.tx.borrow() {
            Feed::Live(frame) => Some(frame.clone()),
            _ => None,
        }
    }

    /// The terminal capture error, if the stream has failed
    pub fn failure(&self) -> Option<CaptureError> {
        match &*self.tx.borrow() {
            Feed::Ended(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Watch the slot for changes
    pub fn subscribe(&self) -> watch::Receiver<Feed> {
        self.tx.subscribe()
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels(width: u32, height: u32) -> Bytes {
        Bytes::from(vec![0x80; (width * height * 3) as usize])
    }

    #[test]
    fn test_frame_rgb_accepts_matching_size() {
        let frame = Frame::rgb(pixels(4, 2), 4, 2, 0).unwrap();
        assert_eq!(frame.len(), 24);
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 2);
    }

    #[test]
    fn test_frame_rgb_rejects_mismatch() {
        assert!(Frame::rgb(pixels(4, 2), 4, 3, 0).is_none());
        assert!(Frame::rgb(Bytes::new(), 0, 0, 0).is_none());
        assert!(Frame::rgb(Bytes::new(), 4, 2, 0).is_none());
    }

    #[test]
    fn test_slot_starts_pending() {
        let slot = FrameSlot::new();
        assert!(matches!(slot.current(), Feed::Pending));
        assert!(slot.latest().is_none());
    }

    #[test]
    fn test_slot_publish_replaces_frame() {
        let slot = FrameSlot::new();
        slot.publish(Frame::rgb(pixels(4, 2), 4, 2, 0).unwrap());
        slot.publish(Frame::rgb(pixels(8, 4), 8, 4, 1).unwrap());

        let latest = slot.latest().unwrap();
        assert_eq!(latest.sequence, 1);
        assert_eq!((latest.width, latest.height), (8, 4));
    }

    #[test]
    fn test_slot_reset_and_end() {
        let slot = FrameSlot::new();
        slot.publish(Frame::rgb(pixels(4, 2), 4, 2, 0).unwrap());
        slot.reset();
        assert!(slot.latest().is_none());

        slot.end(CaptureError::EndOfStream);
        assert!(slot.current().is_ended());
        assert_eq!(slot.failure(), Some(CaptureError::EndOfStream));
    }

    #[tokio::test]
    async fn test_subscriber_sees_new_frame() {
        let slot = FrameSlot::new();
        let mut rx = slot.subscribe();

        slot.publish(Frame::rgb(pixels(2, 2), 2, 2, 7).unwrap());

        rx.changed().await.unwrap();
        assert!(matches!(&*rx.borrow(), Feed::Live(f) if f.sequence == 7));
    }
}
