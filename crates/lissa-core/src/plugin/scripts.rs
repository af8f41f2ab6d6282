//! Embedded slider-panel scripts.
//!
//! Both panels honor the control protocol contract: one `SET`/`PRESET`
//! message per line on stdout, flushed immediately after each write. They
//! receive the current parameter values as `argv` (order: a b delta A B) so
//! their sliders start in sync with the shared state.

/// Tcl/Tk panel, run by `tclsh`.
pub const TK_SLIDER_PANEL: &str = r#"
package require Tk

lassign $argv init_a init_b init_delta init_A init_B

wm title . "Lissa Tk Panel"

proc emit_set {name value} {
    puts "SET $name $value"
    flush stdout
}

foreach {name label from to res init} [list \
    a      "Freq a"  1.0  10.0   1.0   $init_a \
    b      "Freq b"  1.0  10.0   1.0   $init_b \
    delta  "Phase"   0.0  6.2832 0.01  $init_delta \
    A      "Amp A"   0.1  2.0    0.05  $init_A \
    B      "Amp B"   0.1  2.0    0.05  $init_B \
] {
    set f [ttk::frame .f_$name]
    ttk::label $f.l -text $label -width 8
    scale $f.s -from $from -to $to -resolution $res \
        -orient horizontal -length 280 \
        -command [list emit_set $name]
    $f.s set $init
    pack $f.l $f.s -side left -padx 5
    pack $f -fill x -padx 10 -pady 3
}

array set preset_values {
    circle    {a 1 b 1 delta 1.5708 A 1 B 1}
    figure8   {a 1 b 2 delta 0      A 1 B 1}
    lissajous {a 3 b 2 delta 1.5708 A 1 B 1}
    star      {a 5 b 6 delta 1.5708 A 1 B 1}
    bowtie    {a 2 b 3 delta 0.7854 A 1 B 1}
}

proc emit_preset {name} {
    global preset_values
    puts "PRESET $name"
    flush stdout
    foreach {param val} $preset_values($name) {
        .f_$param.s set $val
    }
}

set bf [ttk::frame .presets]
foreach preset {circle figure8 lissajous star bowtie} {
    ttk::button $bf.$preset -text $preset \
        -command [list emit_preset $preset]
    pack $bf.$preset -side left -padx 3
}
pack $bf -pady 10
"#;

/// Python/Tkinter panel, run by `python3`.
pub const TKINTER_SLIDER_PANEL: &str = r#"
import sys, tkinter as tk
from tkinter import ttk

init_a, init_b, init_delta, init_A, init_B = (float(x) for x in sys.argv[1:6])

root = tk.Tk()
root.title("Lissa Tkinter Panel")

def emit_set(name, value):
    print(f"SET {name} {value}", flush=True)

sliders = {}
for name, label, lo, hi, res, init in [
    ('a',     'Freq a', 1,   10,   1,    init_a),
    ('b',     'Freq b', 1,   10,   1,    init_b),
    ('delta', 'Phase',  0.0, 6.28, 0.01, init_delta),
    ('A',     'Amp A',  0.1, 2.0,  0.05, init_A),
    ('B',     'Amp B',  0.1, 2.0,  0.05, init_B),
]:
    f = ttk.Frame(root)
    ttk.Label(f, text=label, width=8).pack(side='left', padx=5)
    s = tk.Scale(f, from_=lo, to=hi, resolution=res,
                 orient='horizontal', length=280,
                 command=lambda v, n=name: emit_set(n, v))
    s.set(init)
    s.pack(side='left', padx=5)
    f.pack(fill='x', padx=10, pady=3)
    sliders[name] = s

preset_values = {
    'circle':    {'a': 1, 'b': 1, 'delta': 1.5708, 'A': 1, 'B': 1},
    'figure8':   {'a': 1, 'b': 2, 'delta': 0,      'A': 1, 'B': 1},
    'lissajous': {'a': 3, 'b': 2, 'delta': 1.5708, 'A': 1, 'B': 1},
    'star':      {'a': 5, 'b': 6, 'delta': 1.5708, 'A': 1, 'B': 1},
    'bowtie':    {'a': 2, 'b': 3, 'delta': 0.7854, 'A': 1, 'B': 1},
}

def emit_preset(name):
    print(f"PRESET {name}", flush=True)
    for param, val in preset_values[name].items():
        sliders[param].set(val)

bf = ttk.Frame(root)
for p in ['circle', 'figure8', 'lissajous', 'star', 'bowtie']:
    ttk.Button(bf, text=p, command=lambda x=p: emit_preset(x)).pack(side='left', padx=3)
bf.pack(pady=10)

root.mainloop()
"#;
