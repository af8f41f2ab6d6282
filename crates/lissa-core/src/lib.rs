//! Core engine for the Lissa curve workbench.
//!
//! This crate provides:
//! - The shared parameter store and its context object
//! - The line protocol codec spoken by plugin children
//! - The interpreter-agnostic command bridge and the stock interpreter
//! - The child process supervisor for slider-panel plugins
//! - A single-threaded poll reactor that multiplexes everything
//!
//! Everything runs on one thread. Only [`Reactor::poll_once`] blocks; every
//! other operation is synchronous and bounded, which is what makes the
//! lock-free shared state sound.

pub mod bridge;
pub mod error;
pub mod interp;
pub mod params;
pub mod plugin;
pub mod protocol;
pub mod reactor;

pub use bridge::{CommandSession, Interpreter, PushOutcome, Submission};
pub use error::{Error, Result};
pub use interp::{GraphInterpreter, HostHooks};
pub use params::{CurveParams, GraphState, PARAM_NAMES, PRESET_NAMES};
pub use plugin::{PluginKind, PluginProcess, PluginSet};
pub use protocol::{ControlMessage, LineAssembler};
pub use reactor::{EventSource, Reactor};
