//! Child process supervision for slider-panel plugins.
//!
//! A plugin is an external interpreter (Tcl/Tk or Python/Tkinter) running a
//! script we materialize to a temp file at launch. The child's stdout and
//! stderr are merged into one pipe; the read end is non-blocking and
//! registered with the [`Reactor`], so the child can emit `SET`/`PRESET`
//! lines at any time without the supervising thread ever waiting on it.
//!
//! Lifecycle is launch/stop with one teardown path: `stop` is idempotent and
//! is also invoked automatically when the pipe reports end-of-stream or a
//! hard read error.

pub mod scripts;

use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Write as _};
use std::os::unix::io::{FromRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::rc::{Rc, Weak};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::params::GraphState;
use crate::protocol::{LineAssembler, decode_chunk};
use crate::reactor::{EventSource, Reactor};

/// Which plugin family a supervisor runs. The kind fixes the script body,
/// the temp-file extension, and the executable probe list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// Tcl/Tk slider panel, run by `tclsh`.
    Tk,
    /// Python/Tkinter slider panel, run by `python3`.
    Tkinter,
}

impl PluginKind {
    pub fn label(self) -> &'static str {
        match self {
            PluginKind::Tk => "tk",
            PluginKind::Tkinter => "tkinter",
        }
    }

    /// Temp script file extension for this executable family.
    pub fn script_extension(self) -> &'static str {
        match self {
            PluginKind::Tk => ".tcl",
            PluginKind::Tkinter => ".py",
        }
    }

    /// The embedded panel script for this kind.
    pub fn script_body(self) -> &'static str {
        match self {
            PluginKind::Tk => scripts::TK_SLIDER_PANEL,
            PluginKind::Tkinter => scripts::TKINTER_SLIDER_PANEL,
        }
    }

    /// Environment variable overriding executable discovery.
    pub fn env_override(self) -> &'static str {
        match self {
            PluginKind::Tk => "LISSA_TCLSH",
            PluginKind::Tkinter => "LISSA_PYTHON3",
        }
    }

    /// Default executable search list: ordered absolute locations, then the
    /// bare command name (resolved via `PATH`).
    pub fn executable_candidates(self) -> &'static [&'static str] {
        match self {
            PluginKind::Tk => &[
                "/usr/local/bin/tclsh",
                "/usr/bin/tclsh",
                "/opt/homebrew/bin/tclsh",
                "tclsh",
            ],
            PluginKind::Tkinter => &[
                "/usr/local/bin/python3",
                "/usr/bin/python3",
                "/opt/homebrew/bin/python3",
                "python3",
            ],
        }
    }
}

/// Live half of a supervisor: only present between launch and stop.
struct Running {
    child: Child,
    /// Non-blocking read end of the merged stdout+stderr pipe.
    stream: File,
    fd: RawFd,
    assembler: LineAssembler,
    /// Deleted on drop, i.e. on `stop` however the child exited.
    script: NamedTempFile,
}

/// Supervises one plugin child process.
///
/// Held as `Rc<PluginProcess>` because launch registers the supervisor with
/// the reactor as an [`EventSource`]. At most one child per supervisor; the
/// type does not stop callers from creating several supervisors of the same
/// kind.
pub struct PluginProcess {
    kind: PluginKind,
    state: Weak<GraphState>,
    reactor: Weak<Reactor>,
    running: RefCell<Option<Running>>,
}

impl PluginProcess {
    pub fn new(kind: PluginKind, state: Weak<GraphState>, reactor: Weak<Reactor>) -> Rc<Self> {
        Rc::new(Self {
            kind,
            state,
            reactor,
            running: RefCell::new(None),
        })
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// True iff a live child handle exists.
    pub fn running(&self) -> bool {
        self.running.borrow().is_some()
    }

    /// Path of the materialized script file while running.
    pub fn script_path(&self) -> Option<PathBuf> {
        self.running
            .borrow()
            .as_ref()
            .map(|r| r.script.path().to_path_buf())
    }

    /// Ensure a child is running with the kind's embedded script, the
    /// default executable search list, and the current parameter values as
    /// startup arguments. Returns true if running (already or newly).
    pub fn launch_default(self: &Rc<Self>) -> bool {
        let mut search: Vec<String> = Vec::new();
        if let Ok(path) = std::env::var(self.kind.env_override()) {
            search.push(path);
        }
        search.extend(self.kind.executable_candidates().iter().map(|s| s.to_string()));
        let search: Vec<&str> = search.iter().map(String::as_str).collect();

        let args = match self.state.upgrade() {
            Some(state) => state.spawn_args(),
            None => Vec::new(),
        };
        self.launch(&search, self.kind.script_body(), &args)
    }

    /// Launch a child: materialize `script_body` to a temp file, spawn the
    /// first usable executable from `search`, merge its stderr into the
    /// stdout pipe, and register the non-blocking read end with the reactor.
    ///
    /// Returns false on temp-file or spawn failure (partial state cleaned
    /// up); true if the child is running, including the already-running
    /// no-op case.
    pub fn launch(self: &Rc<Self>, search: &[&str], script_body: &str, args: &[String]) -> bool {
        if self.running() {
            return true;
        }
        match self.try_launch(search, script_body, args) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(kind = self.kind.label(), %err, "plugin launch failed");
                false
            }
        }
    }

    fn try_launch(self: &Rc<Self>, search: &[&str], script_body: &str, args: &[String]) -> Result<()> {
        let exe = resolve_executable(search).ok_or_else(|| Error::ExecutableNotFound {
            kind: self.kind.label().to_string(),
            tried: search.join(", "),
        })?;

        let mut script = tempfile::Builder::new()
            .prefix("lissa_plugin_")
            .suffix(self.kind.script_extension())
            .tempfile()
            .map_err(Error::ScriptWrite)?;
        script
            .write_all(script_body.as_bytes())
            .and_then(|()| script.flush())
            .map_err(Error::ScriptWrite)?;

        let (read_fd, stdout, stderr) = merged_output_pipe()?;

        let spawned = Command::new(&exe)
            .arg(script.path())
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                unsafe { libc::close(read_fd) };
                return Err(Error::Spawn {
                    command: exe.display().to_string(),
                    source,
                });
            }
        };

        if let Err(err) = set_nonblocking(read_fd) {
            let _ = child.kill();
            let _ = child.wait();
            unsafe { libc::close(read_fd) };
            return Err(err);
        }
        let stream = unsafe { File::from_raw_fd(read_fd) };

        *self.running.borrow_mut() = Some(Running {
            child,
            stream,
            fd: read_fd,
            assembler: LineAssembler::new(),
            script,
        });
        if let Some(reactor) = self.reactor.upgrade() {
            reactor.register(read_fd, Rc::clone(self) as Rc<dyn EventSource>);
        }
        tracing::debug!(kind = self.kind.label(), exe = %exe.display(), "plugin launched");
        Ok(())
    }

    /// The single teardown path: deregister, kill and reap the child, close
    /// the pipe, drop the reassembly buffer, delete the temp script. Safe to
    /// call when not running, and safe to call repeatedly.
    pub fn stop(&self) {
        let Some(mut running) = self.running.borrow_mut().take() else {
            return;
        };
        if let Some(reactor) = self.reactor.upgrade() {
            reactor.deregister(running.fd);
        }
        let _ = running.child.kill();
        let _ = running.child.wait();
        running.assembler.clear();
        tracing::debug!(kind = self.kind.label(), "plugin stopped");
        // dropping `running` closes the stream and removes the script file
    }
}

impl EventSource for PluginProcess {
    fn on_readable(&self, _reactor: &Reactor) {
        let mut buf = [0u8; 1024];
        let messages = {
            let mut slot = self.running.borrow_mut();
            let Some(running) = slot.as_mut() else {
                return;
            };
            match running.stream.read(&mut buf) {
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return,
                Ok(0) => None,
                Err(_) => None,
                Ok(n) => Some(decode_chunk(&mut running.assembler, &buf[..n])),
            }
        };
        match messages {
            // end-of-stream or hard error: the child is gone
            None => self.stop(),
            Some(messages) => {
                if let Some(state) = self.state.upgrade() {
                    for msg in &messages {
                        state.apply(msg);
                    }
                }
            }
        }
    }
}

impl Drop for PluginProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Both plugin supervisors, one per kind.
pub struct PluginSet {
    tk: Rc<PluginProcess>,
    tkinter: Rc<PluginProcess>,
}

impl PluginSet {
    pub fn new(state: &Rc<GraphState>, reactor: &Rc<Reactor>) -> Self {
        Self {
            tk: PluginProcess::new(PluginKind::Tk, Rc::downgrade(state), Rc::downgrade(reactor)),
            tkinter: PluginProcess::new(
                PluginKind::Tkinter,
                Rc::downgrade(state),
                Rc::downgrade(reactor),
            ),
        }
    }

    pub fn get(&self, kind: PluginKind) -> &Rc<PluginProcess> {
        match kind {
            PluginKind::Tk => &self.tk,
            PluginKind::Tkinter => &self.tkinter,
        }
    }

    /// Ensure the plugin of `kind` is running.
    pub fn launch(&self, kind: PluginKind) -> bool {
        self.get(kind).launch_default()
    }

    pub fn any_running(&self) -> bool {
        self.tk.running() || self.tkinter.running()
    }

    pub fn stop_all(&self) {
        self.tk.stop();
        self.tkinter.stop();
    }
}

/// Probe an ordered search list. Entries with a path separator must exist on
/// disk; bare names resolve through `PATH`.
fn resolve_executable(search: &[&str]) -> Option<PathBuf> {
    for entry in search {
        let candidate = Path::new(entry);
        if entry.contains('/') {
            if candidate.is_file() {
                return Some(candidate.to_path_buf());
            }
        } else if let Ok(found) = which::which(entry) {
            return Some(found);
        }
    }
    None
}

/// Build the pipe the child writes into: returns the parent's read fd plus
/// two `Stdio` handles (stdout, stderr) that both point at the write end.
fn merged_output_pipe() -> Result<(RawFd, Stdio, Stdio)> {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    let (read_fd, write_fd) = (fds[0], fds[1]);

    // the child must not inherit our read end, or end-of-stream never fires
    unsafe {
        libc::fcntl(read_fd, libc::F_SETFD, libc::FD_CLOEXEC);
    }

    let stdout_fd = unsafe { libc::dup(write_fd) };
    if stdout_fd < 0 {
        let err = std::io::Error::last_os_error();
        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
        return Err(err.into());
    }

    // Command closes both write-end fds in the parent after spawning
    let stdout = unsafe { Stdio::from_raw_fd(stdout_fd) };
    let stderr = unsafe { Stdio::from_raw_fd(write_fd) };
    Ok((read_fd, stdout, stderr))
}

fn set_nonblocking(fd: RawFd) -> Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}
