//! Interpreter-agnostic command bridge.
//!
//! Every console in the workbench talks to its interpreter through the same
//! shape: submit one line, get back captured output, captured error text,
//! and a flag saying whether the interpreter wants more input to finish a
//! multi-line construct. The interpreter itself is opaque — the bridge never
//! looks inside its state and never waits on anything.
//!
//! Evaluation is trusted to be synchronous and bounded; a hung interpreter
//! stalls the whole reactor thread. That trade-off is accepted here, unlike
//! child I/O which is engineered non-blocking in [`crate::plugin`].

/// Raw result of pushing one line into an interpreter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushOutcome {
    /// Everything the evaluated code printed during this push. The
    /// interpreter must drain its capture buffer each call, so output is
    /// never duplicated across pushes.
    pub output: String,
    /// Captured evaluation failure, if any. A non-empty error must leave the
    /// interpreter usable for the next push.
    pub error: String,
    /// True when the line opened (or continued) an unfinished construct and
    /// the next push belongs to the same logical statement.
    pub more: bool,
}

/// A synchronous line interpreter.
///
/// Implementations accumulate partial constructs internally; `push` with
/// `more = true` means "keep feeding me". Submitting an empty line is the
/// conventional way to force an open construct to resolve.
pub trait Interpreter {
    /// Greeting text shown when the console opens.
    fn banner(&self) -> String;

    /// Evaluate one submitted line.
    fn push(&mut self, line: &str) -> PushOutcome;

    /// Release interpreter resources. Called exactly once by the session,
    /// and before any shared interpreter runtime is torn down.
    fn shutdown(&mut self) {}
}

/// Result of [`CommandSession::submit`], as consumed by a console front end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub output: String,
    pub error: String,
    /// The caller must switch to a continuation prompt and treat the next
    /// submit as appended to the same statement.
    pub more: bool,
}

/// Continuation state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Ready,
    Continuation,
}

type InterpreterFactory = Box<dyn FnOnce() -> Box<dyn Interpreter>>;

/// One console's session: lazily built interpreter plus continuation state.
///
/// The interpreter is constructed on first use and released by `close()`,
/// which is idempotent. The host's shutdown sequence must close every
/// session before tearing down any runtime the interpreters share.
pub struct CommandSession {
    factory: Option<InterpreterFactory>,
    interp: Option<Box<dyn Interpreter>>,
    state: SessionState,
}

impl CommandSession {
    /// Create a session that will build its interpreter on first use.
    pub fn new(factory: impl FnOnce() -> Box<dyn Interpreter> + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            interp: None,
            state: SessionState::Ready,
        }
    }

    fn ensure_interp(&mut self) -> Option<&mut Box<dyn Interpreter>> {
        if self.interp.is_none() {
            if let Some(factory) = self.factory.take() {
                self.interp = Some(factory());
            }
        }
        self.interp.as_mut()
    }

    /// Greeting text, constructing the interpreter if this is first use.
    /// Empty after `close()`.
    pub fn banner(&mut self) -> String {
        self.ensure_interp()
            .map(|i| i.banner())
            .unwrap_or_default()
    }

    /// True while a multi-line construct awaits further input.
    pub fn in_continuation(&self) -> bool {
        self.state == SessionState::Continuation
    }

    /// Submit one line for synchronous evaluation.
    ///
    /// Never fails outward: interpreter faults come back in
    /// `Submission::error` and the session remains usable. Submitting to a
    /// closed session yields an error submission.
    pub fn submit(&mut self, line: &str) -> Submission {
        let Some(interp) = self.ensure_interp() else {
            return Submission {
                error: "session is closed".to_string(),
                ..Submission::default()
            };
        };
        let outcome = interp.push(line);
        self.state = if outcome.more {
            SessionState::Continuation
        } else {
            SessionState::Ready
        };
        Submission {
            output: outcome.output,
            error: outcome.error,
            more: outcome.more,
        }
    }

    /// Release the interpreter. Safe to call repeatedly; after the first
    /// call the session stays closed (it will not rebuild the interpreter).
    pub fn close(&mut self) {
        self.factory = None;
        if let Some(mut interp) = self.interp.take() {
            tracing::debug!("closing command session");
            interp.shutdown();
        }
        self.state = SessionState::Ready;
    }
}

impl Drop for CommandSession {
    fn drop(&mut self) {
        self.close();
    }
}
