#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! A [`ProcessObject`] configures a [`NativeProcess`] before it runs and
//! forwards the events it fires to user [`Command`]s. Commands and process
//! objects only hold weak links to each other, and the native operation may
//! be dropped by whoever owns it: the process object notices through the
//! operation's delete event and goes back to idle.
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use imgkit_image::{Image, PixelId};
//! use imgkit_process::{Command, EventKind, ShiftScaleFilter};
//!
//! let image = Image::new(&[32, 32], PixelId::Float32).unwrap();
//! let filter = ShiftScaleFilter::new().with_shift(1.0);
//!
//! let events = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&events);
//! let command = Command::new(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! filter.add_command(EventKind::End, &command).unwrap();
//!
//! filter.execute(&image).unwrap();
//! assert_eq!(events.load(Ordering::SeqCst), 1);
//! ```

/// User callbacks attached to process objects.
pub mod command;

pub mod config;

/// Error types for the process module.
pub mod error;

/// Event kinds and their native counterparts.
pub mod event;

pub mod filters;

/// Native operations with observers.
pub mod native;

/// Parallel execution helpers.
pub mod parallel;

/// The process wrapper.
pub mod process_object;

pub use crate::command::Command;
pub use crate::config::ProcessConfig;
pub use crate::error::ProcessError;
pub use crate::event::{EventKind, NativeEvent};
pub use crate::filters::{BinaryThresholdFilter, ShiftScaleFilter};
pub use crate::native::{NativeProcess, ObserverTag};
pub use crate::process_object::ProcessObject;
