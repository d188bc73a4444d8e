// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::inner_slot::InnerSlot;
use std::collections::VecDeque;
use std::sync::Arc;

/// Result of one round-robin poll.
pub(super) struct Polled<T> {
    /// The next item and the slot it came from.
    pub(super) next: Option<(Arc<InnerSlot<T>>, T)>,
    /// Number of finished slots removed while polling.
    pub(super) freed: usize,
}

/// Active inner slots in rotation order.
///
/// `ahead` holds the slots still to be visited in the current turn and `served` the ones
/// already visited, both in admission order. A new slot joins the end of `ahead`, right
/// after the most recently admitted one. When `ahead` runs dry the two queues swap.
///
/// Once closed the ring rejects new slots; this keeps late admissions from slipping in
/// after the operator terminated or was cancelled.
pub(super) struct SlotRing<T> {
    ahead: VecDeque<Arc<InnerSlot<T>>>,
    served: VecDeque<Arc<InnerSlot<T>>>,
    closed: bool,
}

impl<T: Send + 'static> SlotRing<T> {
    pub(super) fn new() -> Self {
        Self {
            ahead: VecDeque::new(),
            served: VecDeque::new(),
            closed: false,
        }
    }

    /// Appends `slot` after the most recently admitted one. Returns `false` when closed.
    pub(super) fn push(&mut self, slot: Arc<InnerSlot<T>>) -> bool {
        if self.closed {
            return false;
        }
        self.ahead.push_back(slot);
        true
    }

    pub(super) fn is_empty(&self) -> bool {
        self.ahead.is_empty() && self.served.is_empty()
    }

    pub(super) fn len(&self) -> usize {
        self.ahead.len() + self.served.len()
    }

    /// Items currently buffered across all slots.
    #[cfg(test)]
    pub(super) fn buffered(&self) -> usize {
        self.slots().map(|slot| slot.buffered()).sum()
    }

    /// Removes finished slots with empty buffers and returns how many were removed.
    pub(super) fn prune(&mut self) -> usize {
        let before = self.len();
        self.ahead.retain(|slot| !is_spent(slot));
        self.served.retain(|slot| !is_spent(slot));
        before - self.len()
    }

    /// Takes one item from the next slot in rotation that has one.
    ///
    /// Each slot is visited at most once. Finished, empty slots met on the way are
    /// dropped, and so is a finished slot whose last item was just taken. The slot that
    /// yielded moves behind the others, so the following poll starts at its successor.
    pub(super) fn poll_next(&mut self) -> Polled<T> {
        let mut freed = 0;
        let mut remaining = self.len();
        while remaining > 0 {
            remaining -= 1;
            if self.ahead.is_empty() {
                std::mem::swap(&mut self.ahead, &mut self.served);
            }
            let Some(slot) = self.ahead.pop_front() else {
                break;
            };
            // A finished source delivers nothing more, so its buffer only shrinks.
            let done = slot.is_done();
            match slot.pop() {
                Some(item) => {
                    if done && slot.buffered() == 0 {
                        freed += 1;
                    } else {
                        self.served.push_back(Arc::clone(&slot));
                    }
                    return Polled {
                        next: Some((slot, item)),
                        freed,
                    };
                }
                None if done => freed += 1,
                None => self.served.push_back(slot),
            }
        }
        Polled { next: None, freed }
    }

    /// Keeps only the slot with `ordinal` and returns the others.
    pub(super) fn retain_only(&mut self, ordinal: u64) -> Vec<Arc<InnerSlot<T>>> {
        let slots: Vec<_> = self.ahead.drain(..).chain(self.served.drain(..)).collect();
        let (kept, removed): (Vec<_>, Vec<_>) = slots
            .into_iter()
            .partition(|slot| slot.ordinal() == ordinal);
        self.ahead = VecDeque::from(kept);
        removed
    }

    /// Takes the next buffered item of the slot with `ordinal`.
    pub(super) fn pop_from(&self, ordinal: u64) -> Option<T> {
        self.slots()
            .find(|slot| slot.ordinal() == ordinal)
            .and_then(|slot| slot.pop())
    }

    /// Closes the ring and hands back every slot still in it.
    pub(super) fn close(&mut self) -> Vec<Arc<InnerSlot<T>>> {
        self.closed = true;
        self.ahead.drain(..).chain(self.served.drain(..)).collect()
    }

    fn slots(&self) -> impl Iterator<Item = &Arc<InnerSlot<T>>> {
        self.ahead.iter().chain(self.served.iter())
    }
}

fn is_spent<T: Send + 'static>(slot: &InnerSlot<T>) -> bool {
    slot.is_done() && slot.buffered() == 0
}
