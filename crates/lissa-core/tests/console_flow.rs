//! Integration tests for the command bridge driving the stock interpreter.
//!
//! Exercises the same path a console front end uses: a `CommandSession`
//! lazily building a `GraphInterpreter` over shared state.

use std::cell::RefCell;
use std::rc::Rc;

use lissa_core::interp::HostHooks;
use lissa_core::{CommandSession, GraphInterpreter, GraphState, PluginKind};

fn session_over(state: &Rc<GraphState>) -> CommandSession {
    let weak = Rc::downgrade(state);
    CommandSession::new(move || Box::new(GraphInterpreter::new(weak, HostHooks::default())))
}

#[test]
fn console_commands_drive_the_shared_store() {
    let state = Rc::new(GraphState::new());
    let mut session = session_over(&state);

    assert!(session.banner().contains("lissa"));

    let r = session.submit("set a 6");
    assert!(r.error.is_empty());
    assert!(!r.more);
    assert_eq!(state.get("a"), 6.0);

    let r = session.submit("get a");
    assert_eq!(r.output.trim(), "6");
}

#[test]
fn two_sessions_share_one_store() {
    let state = Rc::new(GraphState::new());
    let mut first = session_over(&state);
    let mut second = session_over(&state);

    first.submit("set delta 0.25");
    let r = second.submit("get delta");
    assert_eq!(r.output.trim(), "0.25");
}

#[test]
fn multi_line_construct_produces_output_exactly_once() {
    let state = Rc::new(GraphState::new());
    let mut session = session_over(&state);

    assert!(session.submit("repeat 2 {").more);
    assert!(session.in_continuation());
    assert!(session.submit("echo beat").more);
    let done = session.submit("}");
    assert!(!done.more);
    assert!(!session.in_continuation());
    assert_eq!(done.output, "beat\nbeat\n");

    let next = session.submit("echo after");
    assert_eq!(next.output, "after\n");
}

#[test]
fn failed_statement_leaves_the_session_usable() {
    let state = Rc::new(GraphState::new());
    let mut session = session_over(&state);

    let failed = session.submit("set nothing 1");
    assert!(failed.error.contains("unknown parameter"));

    let ok = session.submit("preset lissajous");
    assert!(ok.error.is_empty());
    assert_eq!(state.get("a"), 3.0);
}

#[test]
fn unknown_names_become_messages_not_store_mutations() {
    let state = Rc::new(GraphState::new());
    let before = state.all();
    let mut session = session_over(&state);

    assert!(!session.submit("set qqq 9").error.is_empty());
    assert!(!session.submit("preset qqq").error.is_empty());
    assert_eq!(state.all(), before);
}

#[test]
fn plugin_launch_requests_route_through_the_hook() {
    let state = Rc::new(GraphState::new());
    let requested: Rc<RefCell<Vec<PluginKind>>> = Rc::new(RefCell::new(Vec::new()));

    let weak = Rc::downgrade(&state);
    let sink = Rc::clone(&requested);
    let mut session = CommandSession::new(move || {
        let hooks = HostHooks {
            launch_plugin: Some(Box::new(move |kind| sink.borrow_mut().push(kind))),
        };
        Box::new(GraphInterpreter::new(weak, hooks))
    });

    assert!(session.submit("plugin tk").error.is_empty());
    assert!(session.submit("plugin tkinter").error.is_empty());
    assert_eq!(
        *requested.borrow(),
        vec![PluginKind::Tk, PluginKind::Tkinter]
    );
}

#[test]
fn session_outliving_the_state_degrades_gracefully() {
    let state = Rc::new(GraphState::new());
    let mut session = session_over(&state);
    session.submit("set a 2");
    drop(state);

    let r = session.submit("get a");
    assert!(r.error.contains("graph state not available"));
}
