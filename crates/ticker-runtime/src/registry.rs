#![forbid(unsafe_code)]

//! Token allocation and callback storage shared by the schedulers.
//!
//! The registry is the single point where "is this registration still
//! alive?" is decided. Schedulers only decide *when* a token is due; they
//! always go through [`CallbackRegistry::fire`], which re-checks liveness
//! immediately before invoking the callback.
//!
//! # Invariants
//!
//! 1. Tokens are allocated from a monotonic counter and never reused.
//! 2. `fire(t)` invokes the callback only if `t` is registered.
//! 3. A callback may cancel its own token; it is dropped after it returns and
//!    never invoked again.
//! 4. Re-entrant firing of a token whose callback is running is refused.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use ticker_core::{TickCallback, TimerToken};
use tracing::trace;

enum Slot {
    Idle(TickCallback),
    /// Callback moved out while it runs.
    Running,
}

/// Live periodic registrations keyed by token.
pub struct CallbackRegistry {
    next_id: Cell<u64>,
    slots: RefCell<HashMap<TimerToken, Slot>>,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Store `callback` under a fresh token.
    pub fn insert(&self, callback: TickCallback) -> TimerToken {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let token = TimerToken::from_raw(id);
        self.slots.borrow_mut().insert(token, Slot::Idle(callback));
        token
    }

    /// Remove a registration. Returns `false` if it was not registered.
    pub fn remove(&self, token: TimerToken) -> bool {
        // Drop the callback outside the borrow.
        let removed = self.slots.borrow_mut().remove(&token);
        removed.is_some()
    }

    /// Whether `token` is currently registered.
    #[must_use]
    pub fn contains(&self, token: TimerToken) -> bool {
        self.slots.borrow().contains_key(&token)
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke the callback for `token` if it is still registered.
    ///
    /// Returns `true` if a callback ran.
    pub fn fire(&self, token: TimerToken) -> bool {
        let mut callback = {
            let mut slots = self.slots.borrow_mut();
            let Some(slot) = slots.get_mut(&token) else {
                trace!(%token, "dropping stray firing for cancelled timer");
                return false;
            };
            match std::mem::replace(slot, Slot::Running) {
                Slot::Idle(cb) => cb,
                Slot::Running => {
                    trace!(%token, "refusing re-entrant firing");
                    return false;
                }
            }
        };

        callback();

        let mut slots = self.slots.borrow_mut();
        if let Some(slot) = slots.get_mut(&token) {
            *slot = Slot::Idle(callback);
        } else {
            drop(slots);
            trace!(%token, "timer cancelled by its own callback");
        }
        true
    }

    /// Remove every registration.
    pub fn clear(&self) {
        let drained: Vec<_> = self.slots.borrow_mut().drain().collect();
        drop(drained);
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("next_id", &self.next_id.get())
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, TickCallback) {
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let cb: TickCallback = Box::new(move || hits_clone.set(hits_clone.get() + 1));
        (hits, cb)
    }

    #[test]
    fn tokens_are_monotonic() {
        let reg = CallbackRegistry::new();
        let a = reg.insert(Box::new(|| {}));
        let b = reg.insert(Box::new(|| {}));
        assert!(a < b);
        reg.remove(a);
        let c = reg.insert(Box::new(|| {}));
        assert!(b < c);
    }

    #[test]
    fn fire_invokes_live_callback() {
        let reg = CallbackRegistry::new();
        let (hits, cb) = counter();
        let token = reg.insert(cb);

        assert!(reg.fire(token));
        assert!(reg.fire(token));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn fire_after_remove_is_dropped() {
        let reg = CallbackRegistry::new();
        let (hits, cb) = counter();
        let token = reg.insert(cb);

        assert!(reg.remove(token));
        assert!(!reg.fire(token));
        assert_eq!(hits.get(), 0);
        assert!(!reg.remove(token));
    }

    #[test]
    fn callback_can_cancel_itself() {
        let reg = Rc::new(CallbackRegistry::new());
        let hits = Rc::new(Cell::new(0u32));
        let own_token = Rc::new(Cell::new(None::<TimerToken>));

        let reg_clone = Rc::clone(&reg);
        let hits_clone = Rc::clone(&hits);
        let own_clone = Rc::clone(&own_token);
        let token = reg.insert(Box::new(move || {
            hits_clone.set(hits_clone.get() + 1);
            if let Some(t) = own_clone.get() {
                reg_clone.remove(t);
            }
        }));
        own_token.set(Some(token));

        assert!(reg.fire(token));
        assert!(!reg.contains(token));
        assert!(!reg.fire(token));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn reentrant_fire_is_refused() {
        let reg = Rc::new(CallbackRegistry::new());
        let inner_result = Rc::new(Cell::new(None::<bool>));
        let own_token = Rc::new(Cell::new(None::<TimerToken>));

        let reg_clone = Rc::clone(&reg);
        let result_clone = Rc::clone(&inner_result);
        let own_clone = Rc::clone(&own_token);
        let token = reg.insert(Box::new(move || {
            if let Some(t) = own_clone.get() {
                result_clone.set(Some(reg_clone.fire(t)));
            }
        }));
        own_token.set(Some(token));

        assert!(reg.fire(token));
        assert_eq!(inner_result.get(), Some(false));
        assert!(reg.contains(token));
    }

    #[test]
    fn clear_removes_everything() {
        let reg = CallbackRegistry::new();
        let (hits, cb) = counter();
        let token = reg.insert(cb);
        reg.insert(Box::new(|| {}));
        assert_eq!(reg.len(), 2);

        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.fire(token));
        assert_eq!(hits.get(), 0);
    }
}
