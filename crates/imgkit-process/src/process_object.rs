use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::command::{Command, CommandId, CommandInner};
use crate::config;
use crate::error::ProcessError;
use crate::event::{to_native_event, EventKind, NativeEvent};
use crate::native::{NativeProcess, ObserverTag};

static NEXT_PROCESS_OBJECT_ID: AtomicU64 = AtomicU64::new(0);

/// One (event, command) association. `native_tag` is `None` while the
/// association is not subscribed to a native operation.
struct EventCommand {
    event: EventKind,
    command: Weak<CommandInner>,
    command_id: CommandId,
    native_tag: Option<ObserverTag>,
}

struct ProcessState {
    name: String,
    // `None` follows the global default at the time it is read.
    debug: Option<bool>,
    number_of_threads: Option<usize>,
    commands: Vec<EventCommand>,
    active: Option<Weak<NativeProcess>>,
    progress_at_delete: f32,
}

/// State shared with the observers and commands that point back to a
/// [`ProcessObject`].
///
/// An `Arc<NativeProcess>` upgraded from `active` must never be dropped while
/// `state` is locked: the last drop fires the delete hook, which locks `state`.
pub(crate) struct ProcessShared {
    id: u64,
    state: Mutex<ProcessState>,
}

impl ProcessShared {
    fn active(&self) -> Option<Weak<NativeProcess>> {
        self.state.lock().active.clone()
    }

    fn on_process_delete(&self, caller: &NativeProcess) {
        let mut state = self.state.lock();
        let tracked = state
            .active
            .as_ref()
            .is_some_and(|active| std::ptr::eq(active.as_ptr(), caller));
        if !tracked {
            return;
        }
        state.progress_at_delete = caller.progress();
        for ec in state.commands.iter_mut() {
            ec.native_tag = None;
        }
        state.active = None;
        log::debug!(
            "{}: native operation {} deleted at progress {}",
            state.name,
            caller.name(),
            state.progress_at_delete
        );
    }

    pub(crate) fn on_command_delete(&self, command_id: CommandId) {
        let (tags, active) = {
            let mut state = self.state.lock();
            let mut tags = Vec::new();
            state.commands.retain(|ec| {
                if ec.command_id != command_id {
                    return true;
                }
                tags.extend(ec.native_tag);
                false
            });
            log::trace!("{}: command {} deleted", state.name, command_id);
            (tags, state.active.clone())
        };
        if let Some(process) = active.and_then(|a| a.upgrade()) {
            for tag in tags {
                process.remove_observer(tag);
            }
        }
    }
}

fn command_adaptor(
    command: Weak<CommandInner>,
) -> impl Fn(&NativeProcess, NativeEvent) + Send + Sync {
    move |_: &NativeProcess, _: NativeEvent| {
        if let Some(command) = command.upgrade() {
            command.execute();
        }
    }
}

fn delete_hook(
    shared: Weak<ProcessShared>,
) -> impl Fn(&NativeProcess, NativeEvent) + Send + Sync {
    move |caller: &NativeProcess, _: NativeEvent| {
        if let Some(shared) = shared.upgrade() {
            shared.on_process_delete(caller);
        }
    }
}

/// Wrapper that configures native operations and bridges their events to
/// [`Command`]s.
///
/// A process object is idle until [`ProcessObject::pre_update`] makes a
/// native operation active. While active, every attached command is
/// subscribed to the operation's events. The object becomes idle again when
/// the operation is dropped, wherever that happens; the last progress value
/// stays queryable afterwards.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use imgkit_process::{Command, EventKind, NativeProcess, ProcessError, ProcessObject};
///
/// let process_object = ProcessObject::new("Filter");
/// let command = Command::new(|| {});
/// assert_eq!(process_object.add_command(EventKind::Start, &command), Ok(None));
///
/// let native = Arc::new(NativeProcess::new("native"));
/// process_object.pre_update(&native).unwrap();
/// assert!(process_object.active_process().is_ok());
///
/// native.set_progress(0.5);
/// drop(native);
/// assert_eq!(process_object.progress(), 0.5);
/// assert!(matches!(
///     process_object.active_process(),
///     Err(ProcessError::NoActiveOperation(_))
/// ));
/// ```
pub struct ProcessObject {
    shared: Arc<ProcessShared>,
}

impl ProcessObject {
    /// Create an idle process object.
    ///
    /// Its debug flag and thread count follow the global defaults until set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(ProcessShared {
                id: NEXT_PROCESS_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
                state: Mutex::new(ProcessState {
                    name: name.into(),
                    debug: None,
                    number_of_threads: None,
                    commands: Vec::new(),
                    active: None,
                    progress_at_delete: 0.0,
                }),
            }),
        }
    }

    /// Name of the process object.
    pub fn name(&self) -> String {
        self.shared.state.lock().name.clone()
    }

    /// Whether native operations are logged on activation.
    pub fn debug(&self) -> bool {
        let debug = self.shared.state.lock().debug;
        debug.unwrap_or_else(config::global_default_debug)
    }

    /// Enable or disable debug logging.
    pub fn set_debug(&self, debug: bool) {
        self.shared.state.lock().debug = Some(debug);
    }

    /// Threads handed to the next native operation.
    pub fn number_of_threads(&self) -> usize {
        let num_threads = self.shared.state.lock().number_of_threads;
        num_threads.unwrap_or_else(config::global_default_number_of_threads)
    }

    /// Set the thread count handed to native operations, at least one.
    pub fn set_number_of_threads(&self, num_threads: usize) {
        self.shared.state.lock().number_of_threads = Some(num_threads.max(1));
    }

    /// Attach `command` to `event`.
    ///
    /// If an operation is active the command is subscribed right away and
    /// the returned tag identifies that subscription. Otherwise the
    /// association waits for the next activation and `None` is returned.
    ///
    /// # Errors
    ///
    /// [`ProcessError::LogicError`] if `event` has no native counterpart.
    pub fn add_command(
        &self,
        event: EventKind,
        command: &Command,
    ) -> Result<Option<ObserverTag>, ProcessError> {
        let native_event = to_native_event(event)?;
        let inner = command.inner();
        inner.add_process_object(self.shared.id, Arc::downgrade(&self.shared));

        let active = {
            let mut state = self.shared.state.lock();
            state.commands.push(EventCommand {
                event,
                command: Arc::downgrade(inner),
                command_id: inner.id(),
                native_tag: None,
            });
            log::trace!("{}: attached command to {}", state.name, event);
            state.active.clone()
        };

        let Some(process) = active.and_then(|a| a.upgrade()) else {
            return Ok(None);
        };
        let tag = process.add_observer(native_event, command_adaptor(Arc::downgrade(inner)));
        let stored = {
            let mut state = self.shared.state.lock();
            let still_active = state
                .active
                .as_ref()
                .is_some_and(|a| std::ptr::eq(a.as_ptr(), Arc::as_ptr(&process)));
            match state.commands.iter_mut().rev().find(|ec| {
                ec.command_id == inner.id() && ec.event == event && ec.native_tag.is_none()
            }) {
                Some(ec) if still_active => {
                    ec.native_tag = Some(tag);
                    true
                }
                _ => false,
            }
        };
        if !stored {
            process.remove_observer(tag);
            return Ok(None);
        }
        Ok(Some(tag))
    }

    /// Detach every command, from this object and from the active operation.
    ///
    /// A command attached to several events is detached once.
    pub fn remove_all_commands(&self) {
        let (commands, active) = {
            let mut state = self.shared.state.lock();
            (std::mem::take(&mut state.commands), state.active.clone())
        };
        let process = active.and_then(|a| a.upgrade());

        let mut detached: Vec<CommandId> = Vec::new();
        for ec in &commands {
            if let (Some(process), Some(tag)) = (&process, ec.native_tag) {
                process.remove_observer(tag);
            }
            if detached.contains(&ec.command_id) {
                continue;
            }
            detached.push(ec.command_id);
            if let Some(command) = ec.command.upgrade() {
                command.remove_process_object(self.shared.id);
            }
        }
    }

    /// Whether a command is attached to `event`.
    pub fn has_command(&self, event: EventKind) -> bool {
        self.shared
            .state
            .lock()
            .commands
            .iter()
            .any(|ec| ec.event == event)
    }

    /// Progress of the active operation, or the last progress seen when idle.
    pub fn progress(&self) -> f32 {
        let (active, last) = {
            let state = self.shared.state.lock();
            (state.active.clone(), state.progress_at_delete)
        };
        match active.and_then(|a| a.upgrade()) {
            Some(process) => process.progress(),
            None => last,
        }
    }

    /// Ask the active operation to stop. Does nothing when idle.
    pub fn abort(&self) {
        if let Some(process) = self.shared.active().and_then(|a| a.upgrade()) {
            log::debug!("{}: abort requested", process.name());
            process.set_abort_generate_data(true);
        }
    }

    /// Whether a native operation is active.
    pub fn is_active(&self) -> bool {
        self.shared
            .active()
            .is_some_and(|a| a.strong_count() > 0)
    }

    /// The active native operation.
    ///
    /// # Errors
    ///
    /// [`ProcessError::NoActiveOperation`] when idle.
    pub fn active_process(&self) -> Result<Arc<NativeProcess>, ProcessError> {
        self.shared
            .active()
            .and_then(|a| a.upgrade())
            .ok_or_else(|| ProcessError::NoActiveOperation(self.name()))
    }

    /// Make `process` the active operation.
    ///
    /// Propagates the thread count, subscribes every attached command and a
    /// hook that returns this object to idle when `process` is dropped.
    ///
    /// # Errors
    ///
    /// * [`ProcessError::AlreadyActive`] if another operation is still active.
    /// * [`ProcessError::LogicError`] if an event cannot be translated.
    ///
    /// On error nothing stays subscribed and the object is idle.
    pub fn pre_update(&self, process: &Arc<NativeProcess>) -> Result<(), ProcessError> {
        self.pre_update_with(process, to_native_event)
    }

    fn pre_update_with(
        &self,
        process: &Arc<NativeProcess>,
        translate: fn(EventKind) -> Result<NativeEvent, ProcessError>,
    ) -> Result<(), ProcessError> {
        if let Some(current) = self.shared.active().and_then(|a| a.upgrade()) {
            if !Arc::ptr_eq(&current, process) {
                return Err(ProcessError::AlreadyActive(self.name()));
            }
            // already subscribed
            return Ok(());
        }

        let (name, debug, num_threads, associations) = {
            let state = self.shared.state.lock();
            let associations: Vec<(CommandId, EventKind, Weak<CommandInner>)> = state
                .commands
                .iter()
                .map(|ec| (ec.command_id, ec.event, ec.command.clone()))
                .collect();
            (state.name.clone(), state.debug, state.number_of_threads, associations)
        };
        let debug = debug.unwrap_or_else(config::global_default_debug);
        let num_threads = num_threads.unwrap_or_else(config::global_default_number_of_threads);

        process.set_number_of_threads(num_threads);
        if debug {
            log::info!("{name}: executing {process:?}");
        }

        // The hook goes first so progress is frozen before Delete commands run.
        let hook = process.add_observer(
            NativeEvent::Delete,
            delete_hook(Arc::downgrade(&self.shared)),
        );
        let mut subscribed: Vec<(CommandId, EventKind, ObserverTag)> = Vec::new();
        for (command_id, event, command) in associations {
            match translate(event) {
                Ok(native_event) => {
                    let tag = process.add_observer(native_event, command_adaptor(command));
                    subscribed.push((command_id, event, tag));
                }
                Err(e) => {
                    for (_, _, tag) in subscribed {
                        process.remove_observer(tag);
                    }
                    process.remove_observer(hook);
                    log::debug!("{name}: activation rolled back: {e}");
                    return Err(e);
                }
            }
        }

        let mut state = self.shared.state.lock();
        state.active = Some(Arc::downgrade(process));
        let mut orphaned = Vec::new();
        for (command_id, event, tag) in subscribed {
            match state.commands.iter_mut().find(|ec| {
                ec.command_id == command_id && ec.event == event && ec.native_tag.is_none()
            }) {
                Some(ec) => ec.native_tag = Some(tag),
                None => orphaned.push(tag),
            }
        }
        log::debug!("{}: activated {}", state.name, process.name());
        drop(state);

        for tag in orphaned {
            process.remove_observer(tag);
        }
        Ok(())
    }

    #[cfg(test)]
    fn native_tags(&self) -> Vec<Option<ObserverTag>> {
        self.shared
            .state
            .lock()
            .commands
            .iter()
            .map(|ec| ec.native_tag)
            .collect()
    }
}

impl Drop for ProcessObject {
    fn drop(&mut self) {
        self.remove_all_commands();
    }
}

impl fmt::Display for ProcessObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let debug = self.debug();
        let num_threads = self.number_of_threads();
        let state = self.shared.state.lock();
        writeln!(f, "{}", state.name)?;
        writeln!(f, "  Debug: {}", debug)?;
        writeln!(f, "  NumberOfThreads: {}", num_threads)?;
        writeln!(f, "  Active: {}", state.active.is_some())?;
        write!(f, "  Commands:")?;
        if state.commands.is_empty() {
            write!(f, " (none)")?;
        }
        for ec in &state.commands {
            let name = ec
                .command
                .upgrade()
                .map_or_else(|| "<deleted>".to_string(), |c| c.name());
            write!(f, "\n    Event: {} Command: {}", ec.event, name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ProcessObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let debug = self.debug();
        let num_threads = self.number_of_threads();
        let state = self.shared.state.lock();
        f.debug_struct("ProcessObject")
            .field("name", &state.name)
            .field("debug", &debug)
            .field("number_of_threads", &num_threads)
            .field("commands", &state.commands.len())
            .field("active", &state.active.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_command(count: &Arc<AtomicUsize>) -> Command {
        let count = Arc::clone(count);
        Command::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn commands_subscribe_on_activation() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        let calls = Arc::new(AtomicUsize::new(0));
        let command = counting_command(&calls);
        assert_eq!(po.add_command(EventKind::Start, &command)?, None);
        assert_eq!(po.native_tags(), vec![None]);

        let native = Arc::new(NativeProcess::new("native"));
        po.pre_update(&native)?;
        assert!(po.native_tags()[0].is_some());
        native.invoke_event(NativeEvent::Start);
        native.invoke_event(NativeEvent::End);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn add_command_while_active() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        let native = Arc::new(NativeProcess::new("native"));
        po.pre_update(&native)?;

        let calls = Arc::new(AtomicUsize::new(0));
        let command = counting_command(&calls);
        let tag = po.add_command(EventKind::Any, &command)?;
        assert!(tag.is_some());
        assert_eq!(po.native_tags(), vec![tag]);

        native.invoke_event(NativeEvent::User);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn failed_activation_rolls_back() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        let command = Command::new(|| {});
        po.add_command(EventKind::Start, &command)?;
        po.add_command(EventKind::User, &command)?;

        fn no_user_event(kind: EventKind) -> Result<NativeEvent, ProcessError> {
            match kind {
                EventKind::User => Err(ProcessError::LogicError("unmapped".into())),
                other => to_native_event(other),
            }
        }

        let native = Arc::new(NativeProcess::new("native"));
        let res = po.pre_update_with(&native, no_user_event);
        assert_eq!(res, Err(ProcessError::LogicError("unmapped".into())));
        assert_eq!(native.observer_count(), 0);
        assert!(!po.is_active());
        assert_eq!(po.native_tags(), vec![None, None]);
        Ok(())
    }

    #[test]
    fn second_operation_is_rejected() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        let first = Arc::new(NativeProcess::new("first"));
        let second = Arc::new(NativeProcess::new("second"));
        po.pre_update(&first)?;
        assert!(matches!(
            po.pre_update(&second),
            Err(ProcessError::AlreadyActive(_))
        ));
        drop(first);
        po.pre_update(&second)?;
        assert_eq!(po.active_process()?.name(), "second");
        Ok(())
    }

    #[test]
    fn abort_is_noop_when_idle() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        po.abort();
        assert_eq!(po.progress(), 0.0);

        let native = Arc::new(NativeProcess::new("native"));
        po.pre_update(&native)?;
        po.abort();
        assert!(native.abort_generate_data());
        Ok(())
    }

    #[test]
    fn thread_count_is_propagated() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        po.set_number_of_threads(3);
        let native = Arc::new(NativeProcess::new("native"));
        po.pre_update(&native)?;
        assert_eq!(native.number_of_threads(), 3);
        Ok(())
    }

    #[test]
    fn drop_detaches_commands() -> Result<(), ProcessError> {
        let command = Command::new(|| {});
        let native = Arc::new(NativeProcess::new("native"));
        {
            let po = ProcessObject::new("po");
            po.add_command(EventKind::Progress, &command)?;
            po.pre_update(&native)?;
            assert_eq!(command.process_object_count(), 1);
            assert!(native.has_observer(NativeEvent::Progress));
        }
        assert_eq!(command.process_object_count(), 0);
        assert!(!native.has_observer(NativeEvent::Progress));
        Ok(())
    }

    #[test]
    fn display_lists_commands() -> Result<(), ProcessError> {
        let po = ProcessObject::new("ShiftScale");
        let command = Command::named("Reporter", || {});
        po.add_command(EventKind::End, &command)?;
        let text = po.to_string();
        assert!(text.starts_with("ShiftScale"));
        assert!(text.contains("Event: EndEvent Command: Reporter"));
        Ok(())
    }

    #[test]
    fn delete_resets_every_subscription() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        let first = Command::new(|| {});
        let second = Command::new(|| {});
        po.add_command(EventKind::Start, &first)?;
        po.add_command(EventKind::Progress, &second)?;

        let native = Arc::new(NativeProcess::new("native"));
        po.pre_update(&native)?;
        assert!(po.native_tags().iter().all(Option::is_some));

        drop(native);
        assert_eq!(po.native_tags(), vec![None, None]);

        let late = Command::new(|| {});
        assert_eq!(po.add_command(EventKind::End, &late)?, None);
        assert_eq!(po.native_tags(), vec![None, None, None]);
        Ok(())
    }

    #[test]
    fn repeated_activation_subscribes_once() -> Result<(), ProcessError> {
        let po = ProcessObject::new("po");
        let native = Arc::new(NativeProcess::new("native"));
        for _ in 0..3 {
            po.pre_update(&native)?;
        }
        assert_eq!(native.observer_count(), 1);

        let command = Command::new(|| {});
        po.add_command(EventKind::Iteration, &command)?;
        po.pre_update(&native)?;
        assert_eq!(native.observer_count(), 2);
        Ok(())
    }

    #[test]
    fn delete_commands_see_final_progress() -> Result<(), ProcessError> {
        use std::sync::atomic::AtomicU32;

        let po = Arc::new(ProcessObject::new("po"));
        let seen = Arc::new(AtomicU32::new(0));
        let weak = Arc::downgrade(&po);
        let record = Arc::clone(&seen);
        let command = Command::new(move || {
            if let Some(po) = weak.upgrade() {
                record.store(po.progress().to_bits(), Ordering::SeqCst);
            }
        });
        po.add_command(EventKind::Delete, &command)?;

        let native = Arc::new(NativeProcess::new("native"));
        po.pre_update(&native)?;
        native.set_progress(0.625);
        drop(native);

        assert_eq!(f32::from_bits(seen.load(Ordering::SeqCst)), 0.625);
        Ok(())
    }
}
