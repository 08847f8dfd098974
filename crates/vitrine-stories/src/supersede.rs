//! Supersession of in-flight loads.
//!
//! Every load (a navigation, a catalog rebuild) takes a [`Ticket`] before it
//! starts. When it finishes, its result may only be published if no newer
//! ticket has been issued in the meantime. The check must happen under the
//! same lock (or on the same task) that guards the published value.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one load started through a [`Supersede`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Issues tickets and answers whether a ticket is still the latest.
#[derive(Debug, Default)]
pub struct Supersede {
    latest: AtomicU64,
}

impl Supersede {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the most recently issued one.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Run `publish` only if `ticket` is current. Returns whether it ran.
    pub fn publish_if_current<F: FnOnce()>(&self, ticket: Ticket, publish: F) -> bool {
        if self.is_current(ticket) {
            publish();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn newer_ticket_supersedes_older() {
        let guard = Supersede::new();

        let first = guard.begin();
        assert!(guard.is_current(first));

        let second = guard.begin();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn stale_result_is_discarded() {
        let guard = Supersede::new();
        let mut shown: Option<&str> = None;

        let slow = guard.begin();
        let fast = guard.begin();

        assert!(guard.publish_if_current(fast, || shown = Some("fast")));
        assert!(!guard.publish_if_current(slow, || shown = Some("slow")));

        assert_eq!(shown, Some("fast"));
    }

    #[test]
    fn concurrent_loads_publish_only_the_latest() {
        let guard = Arc::new(Supersede::new());
        let shown = Arc::new(Mutex::new(None));

        let tickets: Vec<Ticket> = (0..8).map(|_| guard.begin()).collect();
        let last = *tickets.last().unwrap();

        let handles: Vec<_> = tickets
            .into_iter()
            .map(|ticket| {
                let guard = Arc::clone(&guard);
                let shown = Arc::clone(&shown);
                thread::spawn(move || {
                    let mut slot = shown.lock().unwrap();
                    guard.publish_if_current(ticket, || *slot = Some(ticket));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*shown.lock().unwrap(), Some(last));
    }
}
