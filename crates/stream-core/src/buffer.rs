//! PCM accumulation and packet queueing

use bytes::Bytes;
use std::collections::VecDeque;

/// Accumulates interleaved PCM until whole codec frames are available
///
/// Holds at most `max_frames` frames; on overflow whole frames are dropped
/// from the front so frame boundaries stay aligned with the input stream.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    samples: VecDeque<i16>,
    frame_len: usize,
    max_frames: usize,
}

impl FrameBuffer {
    /// Create a buffer for frames of `frame_len` interleaved samples
    pub fn new(frame_len: usize, max_frames: usize) -> Self {
        let frame_len = frame_len.max(1);
        let max_frames = max_frames.max(1);
        Self {
            samples: VecDeque::with_capacity(frame_len * max_frames.min(8)),
            frame_len,
            max_frames,
        }
    }

    /// Append samples, returning how many old samples were dropped
    pub fn push(&mut self, pcm: &[i16]) -> usize {
        self.samples.extend(pcm.iter().copied());

        let capacity = self.frame_len * self.max_frames;
        if self.samples.len() <= capacity {
            return 0;
        }

        let excess = self.samples.len() - capacity;
        let dropped = excess.div_ceil(self.frame_len) * self.frame_len;
        self.samples.drain(..dropped.min(self.samples.len()));
        dropped
    }

    /// Move one frame from the front into `frame`
    ///
    /// Returns `false`, leaving `frame` untouched, if less than a frame is
    /// buffered.
    pub fn carve_into(&mut self, frame: &mut Vec<i16>) -> bool {
        if self.samples.len() < self.frame_len {
            return false;
        }
        frame.clear();
        frame.extend(self.samples.drain(..self.frame_len));
        true
    }

    /// Whole frames currently buffered
    pub fn frames_available(&self) -> usize {
        self.samples.len() / self.frame_len
    }

    /// Interleaved samples per frame
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// FIFO of compressed packets, one entry per codec frame
#[derive(Debug, Clone, Default)]
pub struct PacketQueue {
    packets: VecDeque<Bytes>,
    limit: Option<usize>,
}

impl PacketQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue holding at most `limit` packets
    pub fn bounded(limit: usize) -> Self {
        Self {
            packets: VecDeque::new(),
            limit: Some(limit.max(1)),
        }
    }

    /// Append a packet, returning the oldest packet if it had to be dropped
    pub fn push(&mut self, packet: Bytes) -> Option<Bytes> {
        let dropped = match self.limit {
            Some(limit) if self.packets.len() >= limit => self.packets.pop_front(),
            _ => None,
        };
        self.packets.push_back(packet);
        dropped
    }

    /// Take the oldest packet
    pub fn pop(&mut self) -> Option<Bytes> {
        self.packets.pop_front()
    }

    /// Drop the oldest packet, returning whether there was one
    pub fn discard_oldest(&mut self) -> bool {
        self.packets.pop_front().is_some()
    }

    /// Queued packets
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Drop all queued packets
    pub fn clear(&mut self) {
        self.packets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carve_waits_for_full_frame() {
        let mut buf = FrameBuffer::new(4, 10);
        let mut frame = vec![99];
        buf.push(&[1, 2, 3]);
        assert!(!buf.carve_into(&mut frame));
        assert_eq!(frame, vec![99]);

        buf.push(&[4, 5]);
        assert_eq!(buf.frames_available(), 1);
        assert!(buf.carve_into(&mut frame));
        assert_eq!(frame, vec![1, 2, 3, 4]);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_overflow_drops_whole_frames() {
        let mut buf = FrameBuffer::new(2, 2);
        assert_eq!(buf.push(&[1, 2, 3, 4]), 0);
        assert_eq!(buf.push(&[5]), 2);
        assert_eq!(buf.len(), 3);

        let mut frame = Vec::new();
        assert!(buf.carve_into(&mut frame));
        assert_eq!(frame, vec![3, 4]);
    }

    #[test]
    fn test_oversized_push_keeps_newest() {
        let mut buf = FrameBuffer::new(2, 2);
        let dropped = buf.push(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(dropped, 4);
        assert_eq!(buf.len(), 3);
        let mut frame = Vec::new();
        assert!(buf.carve_into(&mut frame));
        assert_eq!(frame, vec![5, 6]);
    }

    #[test]
    fn test_packet_queue_fifo() {
        let mut queue = PacketQueue::new();
        queue.push(Bytes::from_static(b"a"));
        queue.push(Bytes::from_static(b"bc"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap(), Bytes::from_static(b"a"));
        assert_eq!(queue.pop().unwrap(), Bytes::from_static(b"bc"));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_bounded_queue_drops_oldest() {
        let mut queue = PacketQueue::bounded(2);
        assert!(queue.push(Bytes::from_static(b"1")).is_none());
        assert!(queue.push(Bytes::from_static(b"2")).is_none());
        assert_eq!(queue.push(Bytes::from_static(b"3")), Some(Bytes::from_static(b"1")));
        assert_eq!(queue.len(), 2);
        assert!(queue.discard_oldest());
        assert_eq!(queue.pop().unwrap(), Bytes::from_static(b"3"));
        assert!(!queue.discard_oldest());
    }
}
