//! Built-in graph command language.
//!
//! `GraphInterpreter` is the interpreter that backs the stock console
//! sessions: a small line-oriented command set over the shared parameter
//! store, with brace-delimited blocks as its one multi-line construct
//! (`repeat 3 { ... }`). A line with unbalanced `{` leaves the interpreter
//! asking for more input; a blank line force-resolves the open construct.
//!
//! Any other interpreter can back a console instead — the bridge only sees
//! [`Interpreter`].

use std::rc::Weak;

use crate::bridge::{Interpreter, PushOutcome};
use crate::params::{GraphState, PARAM_NAMES, PRESET_NAMES};
use crate::plugin::PluginKind;

/// Host-side actions a console command may trigger beyond the store itself.
#[derive(Default)]
pub struct HostHooks {
    /// Invoked by the `plugin` command. Absent in headless/test setups.
    pub launch_plugin: Option<Box<dyn Fn(PluginKind)>>,
}

/// The stock console interpreter.
pub struct GraphInterpreter {
    state: Weak<GraphState>,
    hooks: HostHooks,
    /// Lines of an unfinished brace construct.
    pending: Vec<String>,
    /// Net open-brace depth across `pending`.
    depth: usize,
    /// Output captured during evaluation, drained on every push.
    out: String,
}

struct EvalError(String);

type EvalResult = Result<(), EvalError>;

impl GraphInterpreter {
    pub fn new(state: Weak<GraphState>, hooks: HostHooks) -> Self {
        Self {
            state,
            hooks,
            pending: Vec::new(),
            depth: 0,
            out: String::new(),
        }
    }

    fn print(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn state(&self) -> Result<std::rc::Rc<GraphState>, EvalError> {
        self.state
            .upgrade()
            .ok_or_else(|| EvalError("graph state not available".to_string()))
    }

    fn brace_delta(line: &str) -> (usize, usize) {
        let opens = line.matches('{').count();
        let closes = line.matches('}').count();
        (opens, closes)
    }

    /// Execute a run of statement lines, honoring nested `repeat` blocks.
    fn exec_lines(&mut self, lines: &[String]) -> EvalResult {
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].trim();
            i += 1;
            if line.is_empty() || line == "}" {
                continue;
            }
            if let Some(head) = line.strip_suffix('{') {
                let body_start = i;
                let mut depth = 1usize;
                while i < lines.len() && depth > 0 {
                    let (opens, closes) = Self::brace_delta(&lines[i]);
                    depth = (depth + opens).saturating_sub(closes);
                    i += 1;
                }
                if depth > 0 {
                    return Err(EvalError("unterminated block".to_string()));
                }
                // the closing line is `}` (possibly with trailing content we
                // do not support); exclude it from the body
                let body = &lines[body_start..i - 1];
                self.exec_block_header(head.trim(), body)?;
            } else {
                self.exec_command(line)?;
            }
        }
        Ok(())
    }

    fn exec_block_header(&mut self, header: &str, body: &[String]) -> EvalResult {
        let mut tokens = header.split_whitespace();
        match tokens.next() {
            Some("repeat") => {
                let count: u32 = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| EvalError("usage: repeat <count> { ... }".to_string()))?;
                if tokens.next().is_some() {
                    return Err(EvalError("usage: repeat <count> { ... }".to_string()));
                }
                for _ in 0..count {
                    self.exec_lines(body)?;
                }
                Ok(())
            }
            Some(other) => Err(EvalError(format!("unknown block command: {other}"))),
            None => {
                // bare `{ ... }` group
                self.exec_lines(body)
            }
        }
    }

    fn exec_command(&mut self, line: &str) -> EvalResult {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Ok(());
        };
        let args: Vec<&str> = tokens.collect();

        match verb {
            "set" => {
                let &[name, value] = args.as_slice() else {
                    return Err(EvalError("usage: set <param> <value>".to_string()));
                };
                let value: f64 = value
                    .parse()
                    .map_err(|_| EvalError(format!("not a number: {value}")))?;
                let state = self.state()?;
                if !state.set(name, value) {
                    return Err(unknown_param(name));
                }
                state.request_redraw();
                Ok(())
            }
            "get" => {
                let &[name] = args.as_slice() else {
                    return Err(EvalError("usage: get <param>".to_string()));
                };
                let v = self.state()?.get(name);
                if v.is_nan() {
                    return Err(unknown_param(name));
                }
                self.print(&format!("{v}"));
                Ok(())
            }
            "params" => {
                if !args.is_empty() {
                    return Err(EvalError("usage: params".to_string()));
                }
                let all = self.state()?.all();
                for (name, value) in all {
                    self.print(&format!("{name} = {value}"));
                }
                Ok(())
            }
            "preset" => {
                let &[name] = args.as_slice() else {
                    return Err(EvalError("usage: preset <name>".to_string()));
                };
                let state = self.state()?;
                if !state.load_preset(name) {
                    return Err(EvalError(format!(
                        "unknown preset '{name}' ({})",
                        PRESET_NAMES.join(", ")
                    )));
                }
                state.request_redraw();
                Ok(())
            }
            "eval" => {
                let &[t] = args.as_slice() else {
                    return Err(EvalError("usage: eval <t>".to_string()));
                };
                let t: f64 = t
                    .parse()
                    .map_err(|_| EvalError(format!("not a number: {t}")))?;
                let (x, y) = self.state()?.eval(t);
                self.print(&format!("{x:.6} {y:.6}"));
                Ok(())
            }
            "echo" => {
                let text = args.join(" ");
                self.print(&text);
                Ok(())
            }
            "plugin" => {
                let kind = match args.as_slice() {
                    ["tk"] => PluginKind::Tk,
                    ["tkinter"] => PluginKind::Tkinter,
                    _ => return Err(EvalError("usage: plugin tk|tkinter".to_string())),
                };
                match &self.hooks.launch_plugin {
                    Some(launch) => {
                        launch(kind);
                        Ok(())
                    }
                    None => Err(EvalError("plugins not available in this session".to_string())),
                }
            }
            "info" => {
                self.print("lissa: curve workbench with console and plugin input sources");
                Ok(())
            }
            "help" => {
                self.print("commands:");
                self.print("  set <param> <value>      assign a parameter");
                self.print("  get <param>              read a parameter");
                self.print("  params                   list all parameters");
                self.print(&format!("  preset <name>            {}", PRESET_NAMES.join(", ")));
                self.print("  eval <t>                 curve point at t");
                self.print("  echo <text>              print text");
                self.print("  plugin tk|tkinter        launch a slider panel");
                self.print("  repeat <n> { ... }       run a block n times");
                self.print(&format!("parameters: {}", PARAM_NAMES.join(", ")));
                Ok(())
            }
            other => Err(EvalError(format!("unknown command: {other}"))),
        }
    }
}

fn unknown_param(name: &str) -> EvalError {
    EvalError(format!("unknown parameter '{name}' ({})", PARAM_NAMES.join(", ")))
}

impl Interpreter for GraphInterpreter {
    fn banner(&self) -> String {
        "lissa graph console — 'help' lists commands\n".to_string()
    }

    fn push(&mut self, line: &str) -> PushOutcome {
        let force_resolve = self.depth > 0 && line.trim().is_empty();
        if !force_resolve {
            let (opens, closes) = Self::brace_delta(line);
            self.depth = (self.depth + opens).saturating_sub(closes);
            self.pending.push(line.to_string());
            if self.depth > 0 {
                return PushOutcome {
                    more: true,
                    ..PushOutcome::default()
                };
            }
        }

        self.depth = 0;
        let lines = std::mem::take(&mut self.pending);
        let result = self.exec_lines(&lines);
        PushOutcome {
            output: std::mem::take(&mut self.out),
            error: match result {
                Ok(()) => String::new(),
                Err(EvalError(msg)) => format!("ERROR: {msg}"),
            },
            more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn interp(state: &Rc<GraphState>) -> GraphInterpreter {
        GraphInterpreter::new(Rc::downgrade(state), HostHooks::default())
    }

    #[test]
    fn set_and_get_go_through_the_store() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);

        let r = i.push("set a 7");
        assert!(r.error.is_empty(), "{}", r.error);
        assert_eq!(state.get("a"), 7.0);

        let r = i.push("get a");
        assert_eq!(r.output.trim(), "7");
    }

    #[test]
    fn unknown_parameter_is_a_per_call_error() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);

        let r = i.push("set wobble 1");
        assert!(r.error.contains("unknown parameter"));
        // session-level recoverability: the next statement works
        assert!(i.push("set b 4").error.is_empty());
        assert_eq!(state.get("b"), 4.0);
    }

    #[test]
    fn params_lists_all_six() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);
        let r = i.push("params");
        assert_eq!(r.output.lines().count(), 6);
        assert!(r.output.contains("delta"));
    }

    #[test]
    fn preset_applies_and_unknown_preset_reports() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);
        assert!(i.push("preset circle").error.is_empty());
        assert_eq!(state.get("a"), 1.0);
        assert!(i.push("preset spiral").error.contains("unknown preset"));
    }

    #[test]
    fn eval_prints_a_curve_point() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);
        i.push("preset circle");
        let r = i.push("eval 0");
        assert_eq!(r.output.trim(), "1.000000 0.000000");
    }

    #[test]
    fn repeat_block_uses_continuation() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);

        assert!(i.push("repeat 3 {").more);
        assert!(i.push("echo tick").more);
        let done = i.push("}");
        assert!(!done.more);
        assert!(done.error.is_empty(), "{}", done.error);
        assert_eq!(done.output, "tick\ntick\ntick\n");

        // capture is drained: the next push starts clean
        assert_eq!(i.push("echo once").output, "once\n");
    }

    #[test]
    fn nested_blocks_multiply() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);
        i.push("repeat 2 {");
        i.push("repeat 2 {");
        i.push("echo x");
        i.push("}");
        let done = i.push("}");
        assert_eq!(done.output.lines().count(), 4);
    }

    #[test]
    fn blank_line_resolves_with_an_error_for_unterminated_block() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);
        assert!(i.push("repeat 2 {").more);
        let done = i.push("");
        assert!(!done.more);
        assert!(done.error.contains("unterminated block"));
        // and the session is back to normal
        assert!(i.push("echo ok").error.is_empty());
    }

    #[test]
    fn plugin_command_without_hooks_reports() {
        let state = Rc::new(GraphState::new());
        let mut i = interp(&state);
        assert!(i.push("plugin tk").error.contains("not available"));
    }

    #[test]
    fn plugin_command_invokes_the_hook() {
        use std::cell::RefCell;

        let state = Rc::new(GraphState::new());
        let launched = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&launched);
        let hooks = HostHooks {
            launch_plugin: Some(Box::new(move |kind| sink.borrow_mut().push(kind))),
        };
        let mut i = GraphInterpreter::new(Rc::downgrade(&state), hooks);
        assert!(i.push("plugin tkinter").error.is_empty());
        assert_eq!(*launched.borrow(), vec![PluginKind::Tkinter]);
    }
}
