//! Typed messages with reference-counted, arena-backed payloads.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::domain::{AgentId, FrequencyId, MAX_PAYLOAD};
use crate::error::RuntimeError;
use crate::runtime::arena::Arena;

/// Rounds `n` up to the next multiple of 8, the alignment
/// `payload_capacity` reports for a given payload size.
fn round8(n: usize) -> usize {
    (n + 7) & !7
}

/// Mutable bookkeeping bits carried alongside a signal. `owns_payload` is
/// fixed at creation; `broadcast` and `processed` are set once by the
/// routing table and scheduler respectively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalFlags {
    /// Whether this signal's payload was allocated (and must be freed)
    /// by this signal, as opposed to referencing memory it doesn't own.
    pub owns_payload: bool,
    /// Set when the routing table delivers this signal to more than one
    /// destination.
    pub broadcast: bool,
    /// Set once a dispatch table has run a handler for this signal.
    pub processed: bool,
}

struct SignalInner {
    frequency_id: FrequencyId,
    source_agent_id: AgentId,
    flags: Cell<SignalFlags>,
    payload: RefCell<Option<Box<[u8]>>>,
    payload_size: usize,
    payload_capacity: usize,
    timestamp: u64,
    arena: Rc<RefCell<Arena>>,
}

impl Drop for SignalInner {
    fn drop(&mut self) {
        if let Some(bytes) = self.payload.borrow_mut().take() {
            self.arena.borrow_mut().free(bytes);
        }
    }
}

/// A reference-counted handle to a signal header plus its optional
/// payload.
///
/// `Signal` is a thin `Rc` wrapper: cloning it hands out another
/// reference, and letting the last clone drop releases the payload.
/// Rust's own `Rc` strong count stands in for a manual reference count,
/// so there is nothing to keep in sync by hand. [`Signal::release`]
/// exists only to give that drop a name callers can read at the call
/// site; it does nothing beyond an ordinary drop.
#[derive(Clone)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("frequency_id", &self.inner.frequency_id)
            .field("source_agent_id", &self.inner.source_agent_id)
            .field("payload_size", &self.inner.payload_size)
            .field("ref_count", &self.ref_count())
            .finish_non_exhaustive()
    }
}

impl Signal {
    /// Allocates a header and, if `payload` is non-empty, copies it into
    /// a fresh `round8(payload.len())`-byte arena block.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::PayloadTooLarge`] if `payload.len()`
    /// exceeds [`MAX_PAYLOAD`], or [`RuntimeError::OutOfMemory`] if the
    /// arena cannot satisfy the allocation.
    pub fn create(
        frequency_id: FrequencyId,
        source_agent_id: AgentId,
        payload: &[u8],
        timestamp: u64,
        arena: &Rc<RefCell<Arena>>,
    ) -> Result<Self, RuntimeError> {
        if payload.len() > MAX_PAYLOAD as usize {
            return Err(RuntimeError::PayloadTooLarge {
                size: payload.len(),
            });
        }

        let (stored, capacity, owns_payload) = if payload.is_empty() {
            (None, 0, false)
        } else {
            let capacity = round8(payload.len());
            let mut block = arena.borrow_mut().allocate(capacity)?;
            block[..payload.len()].copy_from_slice(payload);
            (Some(block), capacity, true)
        };

        Ok(Self {
            inner: Rc::new(SignalInner {
                frequency_id,
                source_agent_id,
                flags: Cell::new(SignalFlags {
                    owns_payload,
                    ..SignalFlags::default()
                }),
                payload: RefCell::new(stored),
                payload_size: payload.len(),
                payload_capacity: capacity,
                timestamp,
                arena: Rc::clone(arena),
            }),
        })
    }

    /// The declared message type.
    #[must_use]
    pub fn frequency_id(&self) -> FrequencyId {
        self.inner.frequency_id
    }

    /// The agent that emitted this signal.
    #[must_use]
    pub fn source_agent_id(&self) -> AgentId {
        self.inner.source_agent_id
    }

    /// Current bookkeeping flags.
    #[must_use]
    pub fn flags(&self) -> SignalFlags {
        self.inner.flags.get()
    }

    /// Marks this signal as delivered to more than one destination.
    pub fn mark_broadcast(&self) {
        let mut flags = self.inner.flags.get();
        flags.broadcast = true;
        self.inner.flags.set(flags);
    }

    /// Marks this signal as having been handed to a dispatch table.
    pub fn mark_processed(&self) {
        let mut flags = self.inner.flags.get();
        flags.processed = true;
        self.inner.flags.set(flags);
    }

    /// Payload length in bytes. `0` if this signal carries no payload.
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.inner.payload_size
    }

    /// Allocated payload capacity, rounded up to 8 bytes. `0` if this
    /// signal carries no payload.
    #[must_use]
    pub fn payload_capacity(&self) -> usize {
        self.inner.payload_capacity
    }

    /// The logical tick this signal was created on. Never wall-clock
    /// time: cycle output must not depend on when it happened to run.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.inner.timestamp
    }

    /// Borrows the payload bytes, if any. Returns `None` for a
    /// zero-length payload.
    #[must_use]
    pub fn payload(&self) -> Option<Ref<'_, [u8]>> {
        Ref::filter_map(self.inner.payload.borrow(), |opt| {
            opt.as_ref().map(std::convert::AsRef::as_ref)
        })
        .ok()
    }

    /// The number of live handles to this signal, read directly off
    /// `Rc`'s strong count rather than tracked separately.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Releases this handle. The payload and header are freed exactly
    /// when the last handle is dropped, which may be now or may be
    /// later if other clones (other queues that received a broadcast)
    /// are still alive.
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::Signal;
    use crate::domain::{AgentId, FrequencyId};
    use crate::runtime::arena::Arena;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn arena() -> Rc<RefCell<Arena>> {
        Rc::new(RefCell::new(Arena::new(1 << 16)))
    }

    #[test]
    fn zero_size_payload_is_null() {
        let arena = arena();
        let sig = Signal::create(
            FrequencyId::try_new(1).unwrap(),
            AgentId::try_new(1).unwrap(),
            &[],
            0,
            &arena,
        )
        .unwrap();
        assert_eq!(sig.payload_size(), 0);
        assert_eq!(sig.payload_capacity(), 0);
        assert!(sig.payload().is_none());
        assert!(!sig.flags().owns_payload);
    }

    #[test]
    fn payload_too_large_is_rejected() {
        let arena = arena();
        let oversized = vec![0u8; crate::domain::MAX_PAYLOAD as usize + 1];
        let err = Signal::create(
            FrequencyId::try_new(1).unwrap(),
            AgentId::try_new(1).unwrap(),
            &oversized,
            0,
            &arena,
        )
        .unwrap_err();
        assert_eq!(
            err,
            crate::error::RuntimeError::PayloadTooLarge {
                size: oversized.len()
            }
        );
    }

    #[test]
    fn payload_exactly_at_max_succeeds() {
        let arena = arena();
        let exact = vec![7u8; crate::domain::MAX_PAYLOAD as usize];
        let sig = Signal::create(
            FrequencyId::try_new(1).unwrap(),
            AgentId::try_new(1).unwrap(),
            &exact,
            0,
            &arena,
        )
        .unwrap();
        assert_eq!(sig.payload_size(), exact.len());
    }

    #[test]
    fn ref_count_tracks_clones() {
        let arena = arena();
        let sig = Signal::create(
            FrequencyId::try_new(1).unwrap(),
            AgentId::try_new(1).unwrap(),
            b"hi",
            0,
            &arena,
        )
        .unwrap();
        assert_eq!(sig.ref_count(), 1);
        let clone = sig.clone();
        assert_eq!(sig.ref_count(), 2);
        clone.release();
        assert_eq!(sig.ref_count(), 1);
    }

    #[test]
    fn dropping_last_handle_frees_payload_back_to_arena() {
        let arena = arena();
        let used_before = arena.borrow().stats().used;
        let sig = Signal::create(
            FrequencyId::try_new(1).unwrap(),
            AgentId::try_new(1).unwrap(),
            b"hello world",
            0,
            &arena,
        )
        .unwrap();
        assert!(arena.borrow().stats().used > used_before);
        sig.release();
        assert_eq!(arena.borrow().stats().used, used_before);
    }

    #[test]
    fn payload_round_trips_bytes() {
        let arena = arena();
        let sig = Signal::create(
            FrequencyId::try_new(1).unwrap(),
            AgentId::try_new(1).unwrap(),
            b"mycelium",
            0,
            &arena,
        )
        .unwrap();
        assert_eq!(&sig.payload().unwrap()[..8], b"mycelium");
    }
}
