//! Single-threaded readiness reactor.
//!
//! One `poll(2)` wait multiplexes every registered descriptor: plugin
//! output pipes, the host's stdin, anything else the embedding loop adds.
//! Nothing but the wait itself blocks; callbacks run to completion one at a
//! time on the same thread, which is what lets the rest of the crate go
//! lock-free.
//!
//! There is deliberately no "run forever" entry point. The host calls
//! [`Reactor::poll_once`] from its own loop, so the reactor embeds in any
//! outer event loop.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::time::Duration;

use crate::error::Result;

/// A registered input source. `on_readable` performs one bounded,
/// non-blocking read; it must never wait.
pub trait EventSource {
    fn on_readable(&self, reactor: &Reactor);
}

/// Descriptor-readiness multiplexer.
///
/// Registration and deregistration are safe from inside a dispatched
/// callback: the source table is only borrowed for lookups, never across a
/// dispatch, and `poll_once` re-checks membership before each dispatch so a
/// source removed mid-batch is skipped.
#[derive(Default)]
pub struct Reactor {
    sources: RefCell<HashMap<RawFd, Rc<dyn EventSource>>>,
}

impl Reactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` for readability of `fd`, replacing any previous
    /// registration of the same descriptor.
    pub fn register(&self, fd: RawFd, source: Rc<dyn EventSource>) {
        tracing::debug!(fd, "reactor register");
        self.sources.borrow_mut().insert(fd, source);
    }

    /// Remove a registration. No-op for unknown descriptors.
    pub fn deregister(&self, fd: RawFd) {
        if self.sources.borrow_mut().remove(&fd).is_some() {
            tracing::debug!(fd, "reactor deregister");
        }
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.borrow().is_empty()
    }

    /// Wait up to `timeout` (forever if `None`) for readiness, then dispatch
    /// one batch of callbacks. Returns the number of sources dispatched;
    /// zero means the wait timed out or nothing is registered.
    pub fn poll_once(&self, timeout: Option<Duration>) -> Result<usize> {
        let fds: Vec<RawFd> = self.sources.borrow().keys().copied().collect();
        if fds.is_empty() {
            return Ok(0);
        }

        let mut pollfds: Vec<libc::pollfd> = fds
            .iter()
            .map(|&fd| libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        let timeout_ms: libc::c_int = match timeout {
            Some(t) => t.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        };

        let ready = loop {
            let rc = unsafe {
                libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, timeout_ms)
            };
            if rc >= 0 {
                break rc;
            }
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err.into());
        };
        if ready == 0 {
            return Ok(0);
        }

        let mut dispatched = 0;
        for pfd in &pollfds {
            // POLLHUP/POLLERR also surface as a readable event: the read
            // will return 0 or fail and the source tears itself down.
            if pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) == 0 {
                continue;
            }
            // the source may have been deregistered by an earlier callback
            let source = self.sources.borrow().get(&pfd.fd).cloned();
            if let Some(source) = source {
                source.on_readable(self);
                dispatched += 1;
            }
        }
        Ok(dispatched)
    }
}
