//! Ordered listener registries.
//!
//! A [`ListenerList`] holds the observers for one event category. Listeners
//! are notified in the order they were added, and the list never keeps a
//! listener alive on its own.
//!
//! # Broadcast semantics
//!
//! Every broadcast works on a snapshot taken when the broadcast starts. A
//! listener may add or remove listeners (itself included) while it is being
//! notified; the change takes effect for the next broadcast, and the pass in
//! progress still reaches everybody that was registered when it began.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use trellis_core::ListenerList;
//!
//! trait CounterListener {
//!     fn counted(&self, value: u32);
//! }
//!
//! struct Total(Cell<u32>);
//!
//! impl CounterListener for Total {
//!     fn counted(&self, value: u32) {
//!         self.0.set(self.0.get() + value);
//!     }
//! }
//!
//! let listeners: ListenerList<dyn CounterListener> = ListenerList::new();
//! let total = Rc::new(Total(Cell::new(0)));
//! let handle: Rc<dyn CounterListener> = total.clone();
//! listeners.add(&handle);
//!
//! listeners.for_each(|listener| listener.counted(3));
//! assert_eq!(total.0.get(), 3);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::logging::targets;

/// An ordered, non-owning collection of listeners for one event category.
///
/// Listeners are stored as [`Weak`] references. A listener that has been
/// dropped by its owner simply stops receiving notifications and is pruned on
/// the next mutation of the list.
pub struct ListenerList<L: ?Sized> {
    entries: RefCell<Vec<Weak<L>>>,
}

impl<L: ?Sized> Default for ListenerList<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> ListenerList<L> {
    /// Create an empty listener list.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register a listener.
    ///
    /// Adding a listener that is already registered is a no-op, so a listener
    /// is never notified twice for the same broadcast.
    pub fn add(&self, listener: &Rc<L>) {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|entry| entry.strong_count() > 0);

        if entries.iter().any(|entry| same_listener(entry, listener)) {
            tracing::trace!(target: targets::LISTENER, "listener already registered");
            return;
        }

        entries.push(Rc::downgrade(listener));
        tracing::trace!(target: targets::LISTENER, count = entries.len(), "listener added");
    }

    /// Unregister a listener.
    ///
    /// Returns `true` if the listener was registered.
    pub fn remove(&self, listener: &Rc<L>) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.strong_count() > 0 && !same_listener(entry, listener));
        let removed = before != entries.len();
        tracing::trace!(target: targets::LISTENER, removed, count = entries.len(), "listener removed");
        removed
    }

    /// Check whether a listener is currently registered.
    pub fn contains(&self, listener: &Rc<L>) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.strong_count() > 0 && same_listener(entry, listener))
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Whether no live listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Strong references to the live listeners, in registration order.
    pub fn snapshot(&self) -> Vec<Rc<L>> {
        self.entries.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    /// Notify every registered listener.
    ///
    /// Used for pure broadcast categories: nobody can stop delivery.
    pub fn for_each<F>(&self, mut notify: F)
    where
        F: FnMut(&L),
    {
        for listener in self.snapshot() {
            notify(&listener);
        }
    }

    /// Notify every registered listener of a consumable event.
    ///
    /// All listeners are notified; the return value is the logical OR of
    /// their results.
    pub fn any_consumed<F>(&self, mut notify: F) -> bool
    where
        F: FnMut(&L) -> bool,
    {
        let mut consumed = false;
        for listener in self.snapshot() {
            consumed |= notify(&listener);
        }
        consumed
    }
}

impl<L: ?Sized> fmt::Debug for ListenerList<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

fn same_listener<L: ?Sized>(entry: &Weak<L>, listener: &Rc<L>) -> bool {
    // Compare data addresses only; vtable pointers for the same object may differ.
    std::ptr::addr_eq(entry.as_ptr(), Rc::as_ptr(listener))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    trait Recorder {
        fn record(&self, value: i32);
    }

    struct Log {
        name: &'static str,
        log: Rc<RefCell<Vec<(&'static str, i32)>>>,
    }

    impl Recorder for Log {
        fn record(&self, value: i32) {
            self.log.borrow_mut().push((self.name, value));
        }
    }

    fn log_listener(
        name: &'static str,
        log: &Rc<RefCell<Vec<(&'static str, i32)>>>,
    ) -> Rc<dyn Recorder> {
        Rc::new(Log {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn test_broadcast_in_insertion_order() {
        let list: ListenerList<dyn Recorder> = ListenerList::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = log_listener("a", &log);
        let b = log_listener("b", &log);
        let c = log_listener("c", &log);

        list.add(&b);
        list.add(&a);
        list.add(&c);
        list.for_each(|l| l.record(1));

        assert_eq!(*log.borrow(), vec![("b", 1), ("a", 1), ("c", 1)]);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let list: ListenerList<dyn Recorder> = ListenerList::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = log_listener("a", &log);

        list.add(&a);
        list.add(&a);
        assert_eq!(list.len(), 1);

        list.for_each(|l| l.record(7));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_remove() {
        let list: ListenerList<dyn Recorder> = ListenerList::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = log_listener("a", &log);
        let b = log_listener("b", &log);

        list.add(&a);
        list.add(&b);
        assert!(list.remove(&a));
        assert!(!list.remove(&a));
        assert!(!list.contains(&a));
        assert!(list.contains(&b));

        list.for_each(|l| l.record(2));
        assert_eq!(*log.borrow(), vec![("b", 2)]);
    }

    #[test]
    fn test_dropped_listener_is_skipped() {
        let list: ListenerList<dyn Recorder> = ListenerList::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = log_listener("a", &log);
        {
            let b = log_listener("b", &log);
            list.add(&a);
            list.add(&b);
            assert_eq!(list.len(), 2);
        }

        assert_eq!(list.len(), 1);
        list.for_each(|l| l.record(3));
        assert_eq!(*log.borrow(), vec![("a", 3)]);
    }

    struct SelfRemover {
        list: Rc<ListenerList<dyn Recorder>>,
        me: RefCell<Option<Rc<dyn Recorder>>>,
        calls: Cell<u32>,
    }

    impl Recorder for SelfRemover {
        fn record(&self, _value: i32) {
            self.calls.set(self.calls.get() + 1);
            if let Some(me) = self.me.borrow_mut().take() {
                self.list.remove(&me);
            }
        }
    }

    #[test]
    fn test_remove_during_broadcast() {
        let list: Rc<ListenerList<dyn Recorder>> = Rc::new(ListenerList::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let remover = Rc::new(SelfRemover {
            list: list.clone(),
            me: RefCell::new(None),
            calls: Cell::new(0),
        });
        let remover_dyn: Rc<dyn Recorder> = remover.clone();
        *remover.me.borrow_mut() = Some(remover_dyn.clone());

        let tail = log_listener("tail", &log);
        list.add(&remover_dyn);
        list.add(&tail);

        // The pass in progress still reaches every listener registered at its start.
        list.for_each(|l| l.record(1));
        assert_eq!(remover.calls.get(), 1);
        assert_eq!(*log.borrow(), vec![("tail", 1)]);

        list.for_each(|l| l.record(2));
        assert_eq!(remover.calls.get(), 1);
        assert_eq!(*log.borrow(), vec![("tail", 1), ("tail", 2)]);
    }

    trait Consumer {
        fn handle(&self) -> bool;
    }

    struct Fixed {
        result: bool,
        calls: Cell<u32>,
    }

    impl Consumer for Fixed {
        fn handle(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.result
        }
    }

    #[test]
    fn test_any_consumed_notifies_everyone() {
        let list: ListenerList<dyn Consumer> = ListenerList::new();
        let first = Rc::new(Fixed {
            result: true,
            calls: Cell::new(0),
        });
        let second = Rc::new(Fixed {
            result: false,
            calls: Cell::new(0),
        });
        let first_dyn: Rc<dyn Consumer> = first.clone();
        let second_dyn: Rc<dyn Consumer> = second.clone();
        list.add(&first_dyn);
        list.add(&second_dyn);

        assert!(list.any_consumed(|l| l.handle()));
        assert_eq!(first.calls.get(), 1);
        assert_eq!(second.calls.get(), 1);

        list.remove(&first_dyn);
        assert!(!list.any_consumed(|l| l.handle()));
    }

    #[test]
    fn test_empty_list() {
        let list: ListenerList<dyn Consumer> = ListenerList::default();
        assert!(list.is_empty());
        assert!(!list.any_consumed(|l| l.handle()));
        list.clear();
        assert_eq!(list.snapshot().len(), 0);
    }
}
