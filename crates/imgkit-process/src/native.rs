use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::NativeEvent;

/// Handle returned by [`NativeProcess::add_observer`].
pub type ObserverTag = u64;

type Observer = Arc<dyn Fn(&NativeProcess, NativeEvent) + Send + Sync>;

struct ObserverEntry {
    tag: ObserverTag,
    event: NativeEvent,
    callback: Observer,
}

/// A long-running native operation that reports progress through observers.
///
/// Observers are invoked on a snapshot of the observer list, outside of any
/// internal lock, so an observer may add or remove observers or query the
/// operation it is called for. Dropping the operation fires
/// [`NativeEvent::Delete`].
pub struct NativeProcess {
    name: String,
    observers: Mutex<Vec<ObserverEntry>>,
    next_tag: AtomicU64,
    progress: AtomicU32,
    abort_generate_data: AtomicBool,
    number_of_threads: AtomicUsize,
}

impl NativeProcess {
    /// Create an idle operation with zero progress and a single thread.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observers: Mutex::new(Vec::new()),
            next_tag: AtomicU64::new(0),
            progress: AtomicU32::new(0f32.to_bits()),
            abort_generate_data: AtomicBool::new(false),
            number_of_threads: AtomicUsize::new(1),
        }
    }

    /// Name of the operation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `callback` for `event` and return its tag.
    ///
    /// Registering for [`NativeEvent::Any`] receives every fired event.
    pub fn add_observer<F>(&self, event: NativeEvent, callback: F) -> ObserverTag
    where
        F: Fn(&NativeProcess, NativeEvent) + Send + Sync + 'static,
    {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().push(ObserverEntry {
            tag,
            event,
            callback: Arc::new(callback),
        });
        tag
    }

    /// Remove the observer with `tag`. Returns false if it was not registered.
    pub fn remove_observer(&self, tag: ObserverTag) -> bool {
        let mut observers = self.observers.lock();
        let len = observers.len();
        observers.retain(|o| o.tag != tag);
        observers.len() != len
    }

    /// Whether an observer would receive `event`.
    pub fn has_observer(&self, event: NativeEvent) -> bool {
        self.observers.lock().iter().any(|o| o.event.matches(event))
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Call every observer registered for `event`.
    pub fn invoke_event(&self, event: NativeEvent) {
        let snapshot: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .filter(|o| o.event.matches(event))
            .map(|o| Arc::clone(&o.callback))
            .collect();
        for callback in snapshot {
            callback(self, event);
        }
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }

    /// Store the progress without notifying observers.
    pub fn set_progress(&self, progress: f32) {
        self.progress
            .store(progress.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    /// Store the progress and fire [`NativeEvent::Progress`].
    pub fn update_progress(&self, progress: f32) {
        self.set_progress(progress);
        self.invoke_event(NativeEvent::Progress);
    }

    /// Whether an abort was requested.
    pub fn abort_generate_data(&self) -> bool {
        self.abort_generate_data.load(Ordering::Acquire)
    }

    /// Request or clear an abort. The operation checks the flag between blocks.
    pub fn set_abort_generate_data(&self, abort: bool) {
        self.abort_generate_data.store(abort, Ordering::Release);
    }

    /// Threads the operation may use.
    pub fn number_of_threads(&self) -> usize {
        self.number_of_threads.load(Ordering::Relaxed)
    }

    /// Set the thread count, at least one.
    pub fn set_number_of_threads(&self, num_threads: usize) {
        self.number_of_threads
            .store(num_threads.max(1), Ordering::Relaxed);
    }
}

impl Drop for NativeProcess {
    fn drop(&mut self) {
        log::trace!("deleting native operation {}", self.name);
        self.invoke_event(NativeEvent::Delete);
    }
}

impl fmt::Debug for NativeProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeProcess")
            .field("name", &self.name)
            .field("progress", &self.progress())
            .field("abort_generate_data", &self.abort_generate_data())
            .field("number_of_threads", &self.number_of_threads())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn observers_receive_matching_events() {
        let process = NativeProcess::new("native");
        let starts = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&starts);
        let start_tag = process.add_observer(NativeEvent::Start, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&all);
        process.add_observer(NativeEvent::Any, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        process.invoke_event(NativeEvent::Start);
        process.invoke_event(NativeEvent::End);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 2);

        assert!(process.remove_observer(start_tag));
        assert!(!process.remove_observer(start_tag));
        assert_eq!(process.observer_count(), 1);
    }

    #[test]
    fn observer_may_reenter() {
        let process = NativeProcess::new("native");
        process.add_observer(NativeEvent::User, |caller, _| {
            caller.add_observer(NativeEvent::End, |_, _| {});
            caller.set_abort_generate_data(true);
        });
        process.invoke_event(NativeEvent::User);
        assert!(process.has_observer(NativeEvent::End));
        assert!(process.abort_generate_data());
    }

    #[test]
    fn progress_is_clamped() {
        let process = NativeProcess::new("native");
        process.set_progress(1.5);
        assert_relative_eq!(process.progress(), 1.0);
        process.update_progress(0.25);
        assert_relative_eq!(process.progress(), 0.25);
    }

    #[test]
    fn drop_fires_delete() {
        let deleted = Arc::new(AtomicU32::new(0));
        let process = NativeProcess::new("native");
        process.set_progress(0.75);
        let last = Arc::clone(&deleted);
        process.add_observer(NativeEvent::Delete, move |caller, _| {
            last.store(caller.progress().to_bits(), Ordering::SeqCst);
        });
        drop(process);
        assert_relative_eq!(f32::from_bits(deleted.load(Ordering::SeqCst)), 0.75);
    }
}
