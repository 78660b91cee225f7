//! Channel handles for the `Chan` value category
//!
//! A [`Channel`] wraps any receiver implementing [`Probe`] behind a shared
//! lock so it can travel inside a [`Value`](crate::Value) and still be
//! inspected by the test that created it. Probing never blocks.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Outcome of a single non-blocking receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryNext {
    /// A buffered element was received (and consumed)
    Value,
    /// The channel is open but nothing is buffered
    Empty,
    /// All senders are gone and the buffer is drained
    Closed,
}

/// Non-blocking view of a channel receiver
pub trait Probe: Send {
    /// Number of buffered elements
    fn len(&self) -> usize;

    /// Attempt one receive without waiting
    fn try_next(&mut self) -> TryNext;

    /// Check if every sender has been dropped
    fn is_closed(&self) -> bool;

    /// Element type name, used in messages
    fn elem_type(&self) -> &'static str;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + 'static> Probe for mpsc::Receiver<T> {
    fn len(&self) -> usize {
        mpsc::Receiver::len(self)
    }

    fn try_next(&mut self) -> TryNext {
        match self.try_recv() {
            Ok(_) => TryNext::Value,
            Err(mpsc::error::TryRecvError::Empty) => TryNext::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => TryNext::Closed,
        }
    }

    fn is_closed(&self) -> bool {
        mpsc::Receiver::is_closed(self)
    }

    fn elem_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: Send + 'static> Probe for mpsc::UnboundedReceiver<T> {
    fn len(&self) -> usize {
        mpsc::UnboundedReceiver::len(self)
    }

    fn try_next(&mut self) -> TryNext {
        match self.try_recv() {
            Ok(_) => TryNext::Value,
            Err(mpsc::error::TryRecvError::Empty) => TryNext::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => TryNext::Closed,
        }
    }

    fn is_closed(&self) -> bool {
        mpsc::UnboundedReceiver::is_closed(self)
    }

    fn elem_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Cloneable, shareable channel handle
///
/// Clones refer to the same receiver; deep equality on channels is identity.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Mutex<dyn Probe>>,
}

impl Channel {
    /// Wrap a receiver
    pub fn new<P: Probe + 'static>(probe: P) -> Self {
        Self {
            inner: Arc::new(Mutex::new(probe)),
        }
    }

    /// Number of buffered elements
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive one element without blocking, discarding it
    pub fn try_next(&self) -> TryNext {
        self.inner.lock().try_next()
    }

    /// Check if every sender has been dropped
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    /// Element type name
    pub fn elem_type(&self) -> &'static str {
        self.inner.lock().elem_type()
    }

    /// Check if both handles refer to the same receiver
    pub fn same_channel(&self, other: &Channel) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("elem", &self.elem_type())
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Send + 'static> From<mpsc::Receiver<T>> for Channel {
    fn from(rx: mpsc::Receiver<T>) -> Self {
        Channel::new(rx)
    }
}

impl<T: Send + 'static> From<mpsc::UnboundedReceiver<T>> for Channel {
    fn from(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Channel::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_probe() {
        let (tx, rx) = mpsc::channel::<u32>(4);
        let ch = Channel::new(rx);
        assert!(ch.is_empty());
        assert_eq!(ch.try_next(), TryNext::Empty);

        tx.try_send(1).unwrap();
        tx.try_send(2).unwrap();
        assert_eq!(ch.len(), 2);
        assert_eq!(ch.try_next(), TryNext::Value);
        assert_eq!(ch.len(), 1);

        drop(tx);
        assert!(ch.is_closed());
        assert_eq!(ch.try_next(), TryNext::Value);
        assert_eq!(ch.try_next(), TryNext::Closed);
    }

    #[test]
    fn test_unbounded_probe() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let ch = Channel::from(rx);
        tx.send("x".to_string()).unwrap();
        assert_eq!(ch.len(), 1);
        assert_eq!(ch.elem_type(), "alloc::string::String");
        drop(tx);
        assert_eq!(ch.try_next(), TryNext::Value);
        assert_eq!(ch.try_next(), TryNext::Closed);
    }

    #[test]
    fn test_clones_share_receiver() {
        let (_tx, rx) = mpsc::channel::<u8>(1);
        let a = Channel::new(rx);
        let b = a.clone();
        assert!(a.same_channel(&b));

        let (_tx2, rx2) = mpsc::channel::<u8>(1);
        let c = Channel::new(rx2);
        assert!(!a.same_channel(&c));
    }
}
