//! Event plumbing: synchronous subjects, explicit subscriptions, disposal
//!
//! Delivery is immediate and happens on the caller's stack, in subscription
//! order. Nothing is buffered. A subscription is only released by an explicit
//! `dispose()`; dropping the handle keeps the callback registered.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Something that holds resources which must be released explicitly.
///
/// `dispose` must be idempotent.
pub trait Disposable {
    fn dispose(&self);
}

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

/// Read-only view of a value that may be absent and announces every change
pub trait Observable<T>: Send + Sync {
    /// Current value, or `None` when absent
    fn get(&self) -> Option<T>;

    /// Register a callback receiving every new value (including `None`)
    fn subscribe(&self, callback: Box<dyn Fn(&Option<T>) + Send + Sync>) -> Subscription;
}

// =============================================================================
// SUBJECT
// =============================================================================

struct SubjectInner<T> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
}

/// Multicast notifier. Cloning yields another handle to the same subscriber list.
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Deliver `value` to every subscriber registered when the call starts.
    ///
    /// The subscriber list is not locked while callbacks run, so callbacks may
    /// subscribe, unsubscribe or notify re-entrantly. A subscriber disposed by an
    /// earlier callback of the same round is skipped.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self.inner.subscribers.lock().clone();
        for (id, callback) in snapshot {
            let alive = self
                .inner
                .subscribers
                .lock()
                .iter()
                .any(|(live, _)| *live == id);
            if alive {
                callback(value);
            }
        }
    }
}

impl<T: 'static> Subject<T> {
    /// Register `callback`; keep the returned handle to release it later
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));

        let weak: Weak<SubjectInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.lock().retain(|(live, _)| *live != id);
            }
        })
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle to a registered callback
pub struct Subscription {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    fn new<F: FnOnce() + Send + 'static>(release: F) -> Self {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Has this subscription been released?
    pub fn is_disposed(&self) -> bool {
        self.release.lock().is_none()
    }
}

impl Disposable for Subscription {
    fn dispose(&self) {
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// DISPOSE HANDLER
// =============================================================================

/// Collects owned resources and releases all of them exactly once
#[derive(Default)]
pub struct DisposeHandler {
    items: Mutex<Vec<Box<dyn Disposable + Send + Sync>>>,
}

impl DisposeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `item` until `dispose()`
    pub fn add<D: Disposable + Send + Sync + 'static>(&self, item: D) {
        self.items.lock().push(Box::new(item));
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Disposable for DisposeHandler {
    fn dispose(&self) {
        let items = std::mem::take(&mut *self.items.lock());
        for item in items {
            item.dispose();
        }
    }
}

impl fmt::Debug for DisposeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeHandler")
            .field("items", &self.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_delivery_is_immediate_and_ordered() {
        let subject = Subject::<i32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        let _a = subject.subscribe(move |v| first.lock().push(("a", *v)));
        let second = Arc::clone(&seen);
        let _b = subject.subscribe(move |v| second.lock().push(("b", *v)));

        subject.notify(&7);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_dispose_stops_delivery() {
        let subject = Subject::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let subscription = subject.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subject.notify(&());
        subscription.dispose();
        subject.notify(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let subject = Subject::<()>::new();
        let subscription = subject.subscribe(|_| {});
        subscription.dispose();
        subscription.dispose();
        assert!(subscription.is_disposed());
    }

    #[test]
    fn test_drop_does_not_unsubscribe() {
        let subject = Subject::<()>::new();
        drop(subject.subscribe(|_| {}));
        assert_eq!(subject.subscriber_count(), 1);
    }

    #[test]
    fn test_callback_may_unsubscribe_a_later_subscriber() {
        let subject = Subject::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let later: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&later);
        let _first = subject.subscribe(move |_| {
            if let Some(s) = slot.lock().as_ref() {
                s.dispose();
            }
        });
        let counter = Arc::clone(&count);
        *later.lock() = Some(subject.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        subject.notify(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispose_handler_releases_everything_once() {
        let subject = Subject::<()>::new();
        let handler = DisposeHandler::new();
        handler.add(subject.subscribe(|_| {}));
        handler.add(subject.subscribe(|_| {}));
        assert_eq!(subject.subscriber_count(), 2);

        handler.dispose();
        handler.dispose();
        assert_eq!(subject.subscriber_count(), 0);
        assert!(handler.is_empty());
    }

    #[test]
    fn test_subscription_outliving_subject() {
        let subject = Subject::<()>::new();
        let subscription = subject.subscribe(|_| {});
        drop(subject);
        subscription.dispose();
        assert!(subscription.is_disposed());
    }
}
