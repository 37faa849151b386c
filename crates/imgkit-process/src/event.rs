use std::fmt;

use crate::error::ProcessError;

/// Events a [`crate::Command`] can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Matches every event.
    Any,
    /// The operation stopped early after an abort request.
    Abort,
    /// The native operation is being destroyed.
    Delete,
    /// The operation finished.
    End,
    /// One iteration of an iterative operation finished.
    Iteration,
    /// The progress value changed.
    Progress,
    /// The operation started.
    Start,
    /// Event fired by user code.
    User,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [EventKind; 8] = [
        EventKind::Any,
        EventKind::Abort,
        EventKind::Delete,
        EventKind::End,
        EventKind::Iteration,
        EventKind::Progress,
        EventKind::Start,
        EventKind::User,
    ];

    /// Name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Any => "AnyEvent",
            EventKind::Abort => "AbortEvent",
            EventKind::Delete => "DeleteEvent",
            EventKind::End => "EndEvent",
            EventKind::Iteration => "IterationEvent",
            EventKind::Progress => "ProgressEvent",
            EventKind::Start => "StartEvent",
            EventKind::User => "UserEvent",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events fired by a [`crate::NativeProcess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEvent {
    /// Wildcard used by observers; never fired.
    Any,
    /// Abort.
    Abort,
    /// Delete.
    Delete,
    /// End.
    End,
    /// Iteration.
    Iteration,
    /// Progress.
    Progress,
    /// Start.
    Start,
    /// User.
    User,
}

impl NativeEvent {
    /// Whether an observer registered for `self` receives `fired`.
    pub fn matches(self, fired: NativeEvent) -> bool {
        self == NativeEvent::Any || self == fired
    }
}

type EventTable = [(EventKind, NativeEvent)];

static EVENT_TABLE: &EventTable = &[
    (EventKind::Any, NativeEvent::Any),
    (EventKind::Abort, NativeEvent::Abort),
    (EventKind::Delete, NativeEvent::Delete),
    (EventKind::End, NativeEvent::End),
    (EventKind::Iteration, NativeEvent::Iteration),
    (EventKind::Progress, NativeEvent::Progress),
    (EventKind::Start, NativeEvent::Start),
    (EventKind::User, NativeEvent::User),
];

fn lookup(table: &EventTable, kind: EventKind) -> Result<NativeEvent, ProcessError> {
    table
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, e)| *e)
        .ok_or_else(|| ProcessError::LogicError(format!("no native event registered for {kind}")))
}

/// Translate an event kind to the native event it subscribes to.
///
/// # Errors
///
/// [`ProcessError::LogicError`] if the kind has no entry in the table, which
/// only happens when the table and [`EventKind`] drift apart.
pub fn to_native_event(kind: EventKind) -> Result<NativeEvent, ProcessError> {
    lookup(EVENT_TABLE, kind)
}
