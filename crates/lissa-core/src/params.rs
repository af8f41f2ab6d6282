//! Shared curve parameters and the context object that carries them.
//!
//! `CurveParams` is the one record every input source reads and writes: the
//! interactive console sessions, the plugin subprocesses, and the host UI.
//! All mutation goes through `set`/`load_preset` keyed by the stable wire
//! names (`a`, `b`, `delta`, `A`, `B`, `points`); nothing reaches into the
//! fields from outside this module.
//!
//! There is no global instance. The host creates one [`GraphState`] and hands
//! a `Weak` reference to every component at construction time. Access is
//! single-threaded by construction (see [`crate::reactor`]), so the interior
//! `RefCell` never sees contended borrows.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::protocol::ControlMessage;

/// Wire names of the closed parameter set, in snapshot/argument order.
pub const PARAM_NAMES: [&str; 6] = ["a", "b", "delta", "A", "B", "points"];

/// Lissajous parametric curve parameters.
///
/// `x(t) = A * sin(a*t + delta)`, `y(t) = B * sin(b*t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveParams {
    /// x frequency (`a`).
    pub freq_x: f64,
    /// y frequency (`b`).
    pub freq_y: f64,
    /// Phase shift (`delta`).
    pub phase: f64,
    /// x amplitude (`A`).
    pub amp_x: f64,
    /// y amplitude (`B`).
    pub amp_y: f64,
    /// Number of sample points (`points`).
    pub points: u32,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            freq_x: 3.0,
            freq_y: 2.0,
            phase: PI / 2.0,
            amp_x: 1.0,
            amp_y: 1.0,
            points: 1000,
        }
    }
}

/// The preset catalog. Closed set, matching the plugin panels.
pub const PRESET_NAMES: [&str; 5] = ["circle", "figure8", "lissajous", "star", "bowtie"];

impl CurveParams {
    /// Evaluate the curve at parameter `t`, returning `(x, y)`.
    pub fn eval(&self, t: f64) -> (f64, f64) {
        (
            self.amp_x * (self.freq_x * t + self.phase).sin(),
            self.amp_y * (self.freq_y * t).sin(),
        )
    }

    /// Set a parameter by wire name. Returns false if the name is unknown.
    ///
    /// `points` truncates the incoming value; negative values clamp to zero.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match name {
            "a" => self.freq_x = value,
            "b" => self.freq_y = value,
            "delta" => self.phase = value,
            "A" => self.amp_x = value,
            "B" => self.amp_y = value,
            "points" => self.points = value.max(0.0) as u32,
            _ => {
                tracing::debug!(name, "unknown parameter ignored");
                return false;
            }
        }
        true
    }

    /// Get a parameter by wire name. Returns NaN if the name is unknown;
    /// callers must treat NaN as "unknown parameter", never as data.
    pub fn get(&self, name: &str) -> f64 {
        match name {
            "a" => self.freq_x,
            "b" => self.freq_y,
            "delta" => self.phase,
            "A" => self.amp_x,
            "B" => self.amp_y,
            "points" => f64::from(self.points),
            _ => f64::NAN,
        }
    }

    /// Snapshot of every parameter as a name→value map. Always 6 entries.
    pub fn all(&self) -> BTreeMap<&'static str, f64> {
        PARAM_NAMES.iter().map(|&n| (n, self.get(n))).collect()
    }

    /// Load a named preset, overwriting every field. Returns false (and
    /// leaves all fields untouched) if the name is unknown.
    pub fn load_preset(&mut self, name: &str) -> bool {
        let (a, b, delta) = match name {
            "circle" => (1.0, 1.0, PI / 2.0),
            "figure8" => (1.0, 2.0, 0.0),
            "lissajous" => (3.0, 2.0, PI / 2.0),
            "star" => (5.0, 6.0, PI / 2.0),
            "bowtie" => (2.0, 3.0, PI / 4.0),
            _ => {
                tracing::debug!(name, "unknown preset ignored");
                return false;
            }
        };
        *self = Self {
            freq_x: a,
            freq_y: b,
            phase: delta,
            amp_x: 1.0,
            amp_y: 1.0,
            points: 1000,
        };
        true
    }

    /// Current values formatted as spawn arguments for a plugin child, in
    /// the fixed order `a b delta A B`.
    pub fn spawn_args(&self) -> Vec<String> {
        [self.freq_x, self.freq_y, self.phase, self.amp_x, self.amp_y]
            .iter()
            .map(|v| format!("{v:.6}"))
            .collect()
    }
}

/// Redraw hook invoked after any mutation coming from an input source.
pub type RedrawHook = Box<dyn Fn(&CurveParams)>;

/// Shared context: the single parameter record plus the host's redraw hook.
///
/// Owned by the host (`Rc<GraphState>`); every component holds a `Weak` and
/// upgrades on use, so a component outliving the host degrades to no-ops
/// instead of dangling.
pub struct GraphState {
    params: RefCell<CurveParams>,
    redraw: RefCell<Option<RedrawHook>>,
}

impl GraphState {
    pub fn new() -> Self {
        Self {
            params: RefCell::new(CurveParams::default()),
            redraw: RefCell::new(None),
        }
    }

    /// Install the host's redraw hook, replacing any previous one.
    pub fn set_redraw_hook(&self, hook: RedrawHook) {
        *self.redraw.borrow_mut() = Some(hook);
    }

    /// Invoke the redraw hook with a snapshot of the current parameters.
    pub fn request_redraw(&self) {
        let snapshot = self.params.borrow().clone();
        if let Some(hook) = self.redraw.borrow().as_ref() {
            hook(&snapshot);
        }
    }

    pub fn set(&self, name: &str, value: f64) -> bool {
        self.params.borrow_mut().set(name, value)
    }

    pub fn get(&self, name: &str) -> f64 {
        self.params.borrow().get(name)
    }

    pub fn all(&self) -> BTreeMap<&'static str, f64> {
        self.params.borrow().all()
    }

    pub fn load_preset(&self, name: &str) -> bool {
        self.params.borrow_mut().load_preset(name)
    }

    pub fn eval(&self, t: f64) -> (f64, f64) {
        self.params.borrow().eval(t)
    }

    /// Snapshot of the full record.
    pub fn snapshot(&self) -> CurveParams {
        self.params.borrow().clone()
    }

    /// Spawn arguments for a plugin child (see [`CurveParams::spawn_args`]).
    pub fn spawn_args(&self) -> Vec<String> {
        self.params.borrow().spawn_args()
    }

    /// Apply a decoded control message from a plugin child. Unknown names
    /// are ignored (the message is dropped); known ones trigger a redraw.
    pub fn apply(&self, msg: &ControlMessage) {
        let changed = match msg {
            ControlMessage::Set { name, value } => self.set(name, *value),
            ControlMessage::Preset { name } => self.load_preset(name),
        };
        if changed {
            self.request_redraw();
        }
    }
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips_every_known_name() {
        let mut p = CurveParams::default();
        for (i, name) in PARAM_NAMES.iter().enumerate() {
            let v = 2.0 + i as f64;
            assert!(p.set(name, v), "set({name}) should succeed");
            assert!((p.get(name) - v).abs() < 1e-9, "get({name})");
        }
    }

    #[test]
    fn unknown_name_is_rejected_with_sentinel() {
        let mut p = CurveParams::default();
        let before = p.all();
        assert!(!p.set("frequency", 1.0));
        assert!(p.get("frequency").is_nan());
        assert_eq!(p.all(), before);
    }

    #[test]
    fn points_truncates_and_clamps() {
        let mut p = CurveParams::default();
        assert!(p.set("points", 250.9));
        assert_eq!(p.points, 250);
        assert!(p.set("points", -3.0));
        assert_eq!(p.points, 0);
    }

    #[test]
    fn snapshot_always_has_the_fixed_field_count() {
        let p = CurveParams::default();
        assert_eq!(p.all().len(), PARAM_NAMES.len());
    }

    #[test]
    fn presets_apply_atomically() {
        let mut p = CurveParams::default();
        assert!(p.load_preset("bowtie"));
        assert_eq!(p.freq_x, 2.0);
        assert_eq!(p.freq_y, 3.0);
        assert!((p.phase - PI / 4.0).abs() < 1e-9);

        let before = p.all();
        assert!(!p.load_preset("spiral"));
        assert_eq!(p.all(), before, "failed preset must not mutate anything");
    }

    #[test]
    fn every_catalog_preset_loads() {
        let mut p = CurveParams::default();
        for name in PRESET_NAMES {
            assert!(p.load_preset(name), "preset {name}");
        }
    }

    #[test]
    fn eval_matches_the_parametric_form() {
        let p = CurveParams {
            freq_x: 1.0,
            freq_y: 1.0,
            phase: PI / 2.0,
            amp_x: 1.0,
            amp_y: 1.0,
            points: 100,
        };
        // circle preset: at t=0 the point is (1, 0)
        let (x, y) = p.eval(0.0);
        assert!((x - 1.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn spawn_args_are_fixed_order_six_decimals() {
        let p = CurveParams::default();
        let args = p.spawn_args();
        assert_eq!(args.len(), 5);
        assert_eq!(args[0], "3.000000");
        assert_eq!(args[2], format!("{:.6}", PI / 2.0));
    }

    #[test]
    fn state_applies_messages_and_redraws() {
        use std::cell::Cell;
        use std::rc::Rc;

        let state = Rc::new(GraphState::new());
        let draws = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&draws);
        state.set_redraw_hook(Box::new(move |_| counter.set(counter.get() + 1)));

        state.apply(&ControlMessage::Set {
            name: "a".into(),
            value: 5.0,
        });
        assert_eq!(state.get("a"), 5.0);
        assert_eq!(draws.get(), 1);

        // unknown name: dropped, no redraw
        state.apply(&ControlMessage::Set {
            name: "zzz".into(),
            value: 1.0,
        });
        assert_eq!(draws.get(), 1);

        state.apply(&ControlMessage::Preset {
            name: "circle".into(),
        });
        assert_eq!(state.get("a"), 1.0);
        assert_eq!(draws.get(), 2);
    }
}
