use std::collections::VecDeque;

/// Fixed-capacity byte FIFO; pushes that do not fit are refused whole.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: VecDeque<u8>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        RingBuffer {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes that can still be pushed
    pub fn available(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Appends one byte, returning false (and dropping it) when full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.available() == 0 {
            return false;
        }
        self.data.push_back(byte);
        true
    }

    /// Appends all of `bytes`, or nothing if they do not fit
    pub fn push_slice(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.available() {
            return false;
        }
        self.data.extend(bytes);
        true
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.data.pop_front()
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.front().copied()
    }

    /// Oldest contiguous run of buffered bytes
    pub fn front_slice(&self) -> &[u8] {
        self.data.as_slices().0
    }

    /// Drops up to `count` of the oldest bytes
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.data.len());
        self.data.drain(..count);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_refuses_overflow() {
        let mut ring = RingBuffer::new(4);
        assert!(ring.push_slice(&[1, 2, 3]));
        assert!(!ring.push_slice(&[4, 5]));
        assert_eq!(ring.len(), 3);
        assert!(ring.push(4));
        assert!(!ring.push(5));
        assert_eq!(ring.available(), 0);
    }

    #[test]
    fn test_fifo_order_across_wrap() {
        let mut ring = RingBuffer::new(4);
        ring.push_slice(&[1, 2, 3]);
        assert_eq!(ring.pop(), Some(1));
        ring.consume(1);
        ring.push_slice(&[4, 5, 6]);
        assert_eq!(ring.peek(), Some(3));

        let mut out = Vec::new();
        while !ring.is_empty() {
            let front = ring.front_slice().to_vec();
            out.extend_from_slice(&front);
            ring.consume(front.len());
        }
        assert_eq!(out, vec![3, 4, 5, 6]);
        assert_eq!(ring.pop(), None);
    }
}
