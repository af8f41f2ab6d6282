//! Interactive console over stdin, hosted on the reactor.
//!
//! stdin is just another event source: it is switched to non-blocking mode
//! and registered with the same `poll` loop that watches plugin pipes, so
//! typing and plugin traffic interleave on one thread without either
//! starving the other.
//!
//! Lines starting with `%` are host commands (session switching, plotting,
//! quitting); everything else goes to the active [`CommandSession`].

use std::cell::{Cell, RefCell};
use std::io::Write as _;
use std::rc::Weak;

use lissa_core::{CommandSession, GraphState, LineAssembler, Reactor};
use lissa_core::reactor::EventSource;

use crate::render;

const MAX_SESSIONS: usize = 8;

/// Factory building a fresh session (used by `%switch` for new consoles).
pub type SessionFactory = Box<dyn Fn() -> CommandSession>;

struct Inner {
    sessions: Vec<CommandSession>,
    active: usize,
    assembler: LineAssembler,
    make_session: SessionFactory,
}

/// The console front end: owns the sessions and consumes stdin lines.
pub struct ConsoleHost {
    inner: RefCell<Inner>,
    state: Weak<GraphState>,
    done: Cell<bool>,
    /// Original stdin flags, restored on drop.
    saved_flags: libc::c_int,
}

impl ConsoleHost {
    pub fn new(state: Weak<GraphState>, make_session: SessionFactory) -> anyhow::Result<Self> {
        let saved_flags = unsafe { libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL) };
        if saved_flags < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let rc = unsafe {
            libc::fcntl(
                libc::STDIN_FILENO,
                libc::F_SETFL,
                saved_flags | libc::O_NONBLOCK,
            )
        };
        if rc < 0 {
            return Err(std::io::Error::last_os_error().into());
        }

        let first = make_session();
        Ok(Self {
            inner: RefCell::new(Inner {
                sessions: vec![first],
                active: 0,
                assembler: LineAssembler::new(),
                make_session,
            }),
            state,
            done: Cell::new(false),
            saved_flags,
        })
    }

    /// True after EOF or `%quit`.
    pub fn done(&self) -> bool {
        self.done.get()
    }

    /// Print the banner of the active session plus the first prompt.
    pub fn greet(&self) {
        let mut inner = self.inner.borrow_mut();
        let active = inner.active;
        let banner = inner.sessions[active].banner();
        print!("{banner}");
        drop(inner);
        self.prompt();
    }

    fn prompt(&self) {
        let inner = self.inner.borrow();
        let cont = inner.sessions[inner.active].in_continuation();
        if cont {
            print!("... ");
        } else {
            print!("lissa:{}> ", inner.active + 1);
        }
        let _ = std::io::stdout().flush();
    }

    /// Close every session. Must run before any shared interpreter runtime
    /// is torn down; idempotent like the sessions themselves.
    pub fn close(&self) {
        for session in self.inner.borrow_mut().sessions.iter_mut() {
            session.close();
        }
    }

    fn handle_line(&self, line: &str) {
        let trimmed = line.trim_end();
        if let Some(cmd) = trimmed.strip_prefix('%') {
            self.host_command(cmd.trim());
        } else {
            let submission = {
                let mut inner = self.inner.borrow_mut();
                let active = inner.active;
                inner.sessions[active].submit(trimmed)
            };
            if !submission.output.is_empty() {
                print!("{}", submission.output);
                if !submission.output.ends_with('\n') {
                    println!();
                }
            }
            if !submission.error.is_empty() {
                eprintln!("{}", submission.error);
            }
        }
        self.prompt();
    }

    fn host_command(&self, cmd: &str) {
        let mut tokens = cmd.split_whitespace();
        match tokens.next() {
            Some("quit") | Some("exit") => self.done.set(true),
            Some("plot") => {
                if let Some(state) = self.state.upgrade() {
                    let snapshot = state.snapshot();
                    print!("{}", render::plot(&snapshot, 72, 28));
                    println!("{}", render::status_line(&snapshot));
                }
            }
            Some("switch") => {
                let n: Option<usize> = tokens.next().and_then(|t| t.parse().ok());
                match n {
                    Some(n) if (1..=MAX_SESSIONS).contains(&n) => {
                        let mut inner = self.inner.borrow_mut();
                        while inner.sessions.len() < n {
                            let fresh = (inner.make_session)();
                            inner.sessions.push(fresh);
                        }
                        inner.active = n - 1;
                        println!("switched to session {n}");
                    }
                    _ => eprintln!("usage: %switch <1..{MAX_SESSIONS}>"),
                }
            }
            Some("help") => {
                println!("%switch <n>  select (or create) console session n");
                println!("%plot        draw the current curve");
                println!("%quit        leave the console");
            }
            _ => eprintln!("unknown host command: %{cmd} (try %help)"),
        }
    }
}

impl EventSource for ConsoleHost {
    fn on_readable(&self, reactor: &Reactor) {
        let mut buf = [0u8; 1024];
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                return;
            }
            tracing::debug!(%err, "stdin read failed");
        }
        if n <= 0 {
            // EOF (or hard error): the console is finished
            self.done.set(true);
            reactor.deregister(libc::STDIN_FILENO);
            println!();
            return;
        }

        let lines = self
            .inner
            .borrow_mut()
            .assembler
            .feed(&buf[..n as usize]);
        for line in lines {
            if self.done.get() {
                break;
            }
            self.handle_line(&line);
        }
    }
}

impl Drop for ConsoleHost {
    fn drop(&mut self) {
        self.close();
        unsafe {
            libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, self.saved_flags);
        }
    }
}
