use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::process_object::ProcessShared;

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) type CommandId = u64;

type Callback = Box<dyn Fn() + Send + Sync>;

pub(crate) struct CommandInner {
    id: CommandId,
    name: Mutex<String>,
    callback: Callback,
    process_objects: Mutex<Vec<(u64, Weak<ProcessShared>)>>,
}

impl CommandInner {
    pub(crate) fn id(&self) -> CommandId {
        self.id
    }

    pub(crate) fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub(crate) fn execute(&self) {
        (self.callback)()
    }

    /// Record a process object. Returns false if it was already recorded.
    pub(crate) fn add_process_object(&self, id: u64, process_object: Weak<ProcessShared>) -> bool {
        let mut process_objects = self.process_objects.lock();
        if process_objects.iter().any(|(other, _)| *other == id) {
            return false;
        }
        process_objects.push((id, process_object));
        true
    }

    pub(crate) fn remove_process_object(&self, id: u64) -> bool {
        let mut process_objects = self.process_objects.lock();
        let len = process_objects.len();
        process_objects.retain(|(other, _)| *other != id);
        process_objects.len() != len
    }
}

/// A user callback that process objects run when an event fires.
///
/// A command may be attached to many process objects and events. It keeps
/// weak links to the process objects it is attached to; dropping the command
/// detaches it from all of them, and dropping a process object detaches it
/// from the command. Neither side owns the other.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use imgkit_process::{Command, EventKind, ProcessObject};
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// let command = Command::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// let process_object = ProcessObject::new("Filter");
/// process_object.add_command(EventKind::Progress, &command).unwrap();
/// assert_eq!(command.process_object_count(), 1);
///
/// drop(command);
/// assert!(!process_object.has_command(EventKind::Progress));
/// ```
pub struct Command {
    inner: Arc<CommandInner>,
}

impl Command {
    /// Create a command named "Command".
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::named("Command", callback)
    }

    /// Create a named command.
    pub fn named<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(CommandInner {
                id: NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed),
                name: Mutex::new(name.into()),
                callback: Box::new(callback),
                process_objects: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Name of the command.
    pub fn name(&self) -> String {
        self.inner.name()
    }

    /// Rename the command.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.inner.name.lock() = name.into();
    }

    /// Run the callback.
    pub fn execute(&self) {
        self.inner.execute()
    }

    /// Number of process objects the command is attached to.
    pub fn process_object_count(&self) -> usize {
        self.inner.process_objects.lock().len()
    }

    pub(crate) fn inner(&self) -> &Arc<CommandInner> {
        &self.inner
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        let process_objects = std::mem::take(&mut *self.inner.process_objects.lock());
        for (_, process_object) in process_objects {
            if let Some(shared) = process_object.upgrade() {
                shared.on_command_delete(self.inner.id);
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name())
            .field("process_objects", &self.process_object_count())
            .finish()
    }
}
