//! Transfer buffer ownership
//!
//! Two fixed buffers alternate carrying pixel bursts to the panel, so the
//! next chunk can be filled while the previous one is still on the wire.
//! Each buffer carries a tag with three states and three legal edges:
//!
//! ```text
//!          acquire              mark_in_flight
//!   Free ----------> Filling ----------------> InFlight
//!    ^                                             |
//!    +---------------------------------------------+
//!                 release (completion irq)
//! ```
//!
//! Tag updates are read-modify-writes shared with the transfer-complete
//! interrupt, so every one of them runs inside a critical section. The
//! sections are a handful of loads and stores; spin waits re-enter the
//! section once per poll.

use core::cell::Cell;

use critical_section::Mutex;

use crate::color::BYTES_PER_PIXEL;

/// Size of each transfer buffer in bytes
pub const BUFFER_LEN: usize = 10 * 1024;

/// Pixels per transfer buffer at two bytes each
pub const BUFFER_PIXELS: u32 = (BUFFER_LEN / BYTES_PER_PIXEL) as u32;

/// Poll iterations a bounded wait performs before declaring the bus stuck
///
/// Sized to outlast a full-buffer burst at the slowest practical bus clock.
pub const SPIN_LIMIT: u32 = 4_000_000;

/// The two transfer buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    pub const fn index(self) -> usize {
        match self {
            BufferId::A => 0,
            BufferId::B => 1,
        }
    }

    pub const fn other(self) -> BufferId {
        match self {
            BufferId::A => BufferId::B,
            BufferId::B => BufferId::A,
        }
    }
}

/// Ownership tag of one transfer buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ownership {
    /// Nobody holds the buffer
    Free,
    /// The producer is packing pixels into it
    Filling,
    /// An asynchronous burst is reading from it
    InFlight,
}

/// A bounded wait on buffer state expired
///
/// Means the completion interrupt never arrived; the stuck buffer has been
/// force-released by the time the caller sees this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpinTimeout;

enum Claim {
    Granted(BufferId),
    NoneFree,
    FillActive,
}

/// Tag tracker for the two transfer buffers
///
/// Shared between the producer and the transfer-complete interrupt; all
/// methods take `&self` and are safe to call from either context.
pub struct BufferArbiter {
    tags: Mutex<Cell<[Ownership; 2]>>,
    /// A timeout force-freed the in-flight buffer; excuses the one late
    /// completion that may still arrive for it
    forced: Mutex<Cell<bool>>,
}

impl BufferArbiter {
    pub const fn new() -> Self {
        Self {
            tags: Mutex::new(Cell::new([Ownership::Free; 2])),
            forced: Mutex::new(Cell::new(false)),
        }
    }

    /// Claim a free buffer for filling
    ///
    /// Prefers A when both are free, otherwise takes the one that is not in
    /// flight. If neither is free the call polls, bounded by [`SPIN_LIMIT`],
    /// until the completion interrupt releases one.
    ///
    /// # Panics
    ///
    /// If a fill is already active. There is one producer and it packs one
    /// buffer at a time; a second concurrent fill is a bug in the caller.
    pub fn acquire(&self) -> Result<BufferId, SpinTimeout> {
        let mut spins: u32 = 0;
        loop {
            let claim = critical_section::with(|cs| {
                let tags = self.tags.borrow(cs);
                let mut t = tags.get();
                if t[0] == Ownership::Filling || t[1] == Ownership::Filling {
                    return Claim::FillActive;
                }
                let id = if t[0] == Ownership::Free {
                    BufferId::A
                } else if t[1] == Ownership::Free {
                    BufferId::B
                } else {
                    return Claim::NoneFree;
                };
                t[id.index()] = Ownership::Filling;
                tags.set(t);
                Claim::Granted(id)
            });
            match claim {
                Claim::Granted(id) => return Ok(id),
                Claim::FillActive => panic!("buffer acquired while another fill is active"),
                Claim::NoneFree => {
                    spins += 1;
                    if spins > SPIN_LIMIT {
                        self.force_release();
                        return Err(SpinTimeout);
                    }
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Move a filled buffer onto the wire
    ///
    /// # Panics
    ///
    /// If the buffer is not currently being filled, or if the other buffer
    /// is still in flight. The channel carries one burst at a time; callers
    /// wait for [`Self::wait_channel_clear`] before starting the next one.
    pub fn mark_in_flight(&self, id: BufferId) {
        let (was_filling, channel_clear) = critical_section::with(|cs| {
            let tags = self.tags.borrow(cs);
            let mut t = tags.get();
            let was_filling = t[id.index()] == Ownership::Filling;
            let channel_clear = t[id.other().index()] != Ownership::InFlight;
            if was_filling && channel_clear {
                t[id.index()] = Ownership::InFlight;
                tags.set(t);
            }
            (was_filling, channel_clear)
        });
        assert!(was_filling, "buffer sent without being filled first");
        assert!(channel_clear, "burst started while another is in flight");
    }

    /// Return the in-flight buffer to the free pool
    ///
    /// Called from the transfer-complete interrupt. Returns which buffer
    /// was released, or `None` for the one late completion a timeout
    /// force-release already freed the buffer for.
    ///
    /// # Panics
    ///
    /// If nothing is in flight and no force-release is pending. Releasing
    /// a buffer that is already free is a bug in the interrupt wiring.
    pub fn release(&self) -> Option<BufferId> {
        let (released, legal) = critical_section::with(|cs| {
            let tags = self.tags.borrow(cs);
            let mut t = tags.get();
            let id = if t[0] == Ownership::InFlight {
                BufferId::A
            } else if t[1] == Ownership::InFlight {
                BufferId::B
            } else {
                // legal only as the late completion a force-release excused
                return (None, self.forced.borrow(cs).replace(false));
            };
            t[id.index()] = Ownership::Free;
            tags.set(t);
            (Some(id), true)
        });
        assert!(legal, "release without an in-flight buffer");
        released
    }

    /// Free the stuck in-flight buffer after a timeout
    ///
    /// The completion interrupt for it may still arrive; the latch excuses
    /// exactly that one late [`Self::release`].
    fn force_release(&self) {
        critical_section::with(|cs| {
            let tags = self.tags.borrow(cs);
            let mut t = tags.get();
            let idx = if t[0] == Ownership::InFlight {
                0
            } else if t[1] == Ownership::InFlight {
                1
            } else {
                // the interrupt won the race after all
                return;
            };
            t[idx] = Ownership::Free;
            tags.set(t);
            self.forced.borrow(cs).set(true);
        });
    }

    /// Drop a claim without sending, for error recovery
    pub fn abandon(&self, id: BufferId) {
        critical_section::with(|cs| {
            let tags = self.tags.borrow(cs);
            let mut t = tags.get();
            t[id.index()] = Ownership::Free;
            tags.set(t);
        });
    }

    /// Poll, bounded, until no buffer is in flight
    ///
    /// On timeout the stuck buffer is force-released before the error
    /// returns, so the engine can keep operating.
    pub fn wait_channel_clear(&self) -> Result<(), SpinTimeout> {
        let mut spins: u32 = 0;
        while self.in_flight().is_some() {
            spins += 1;
            if spins > SPIN_LIMIT {
                self.force_release();
                return Err(SpinTimeout);
            }
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Which buffer is currently on the wire, if any
    pub fn in_flight(&self) -> Option<BufferId> {
        critical_section::with(|cs| {
            let t = self.tags.borrow(cs).get();
            if t[0] == Ownership::InFlight {
                Some(BufferId::A)
            } else if t[1] == Ownership::InFlight {
                Some(BufferId::B)
            } else {
                None
            }
        })
    }

    /// Current tag of one buffer
    pub fn tag(&self, id: BufferId) -> Ownership {
        critical_section::with(|cs| self.tags.borrow(cs).get()[id.index()])
    }
}

impl Default for BufferArbiter {
    fn default() -> Self {
        Self::new()
    }
}
