//! ASCII rendering of the curve.
//!
//! The core treats rendering as an external collaborator; this is the CLI's
//! stand-in for the original canvas: a character grid plot plus the equation
//! overlay lines.

use lissa_core::CurveParams;

/// One-line summary printed on every redraw request.
pub fn status_line(p: &CurveParams) -> String {
    format!(
        "x(t) = {:.2} sin({:.2} t + {:.2})   y(t) = {:.2} sin({:.2} t)   [{} points]",
        p.amp_x, p.freq_x, p.phase, p.amp_y, p.freq_y, p.points
    )
}

/// Render the curve into a `width` x `height` character grid.
pub fn plot(p: &CurveParams, width: usize, height: usize) -> String {
    let mut grid = vec![vec![' '; width]; height];

    // axes
    let cx = width / 2;
    let cy = height / 2;
    for row in grid.iter_mut() {
        row[cx] = '|';
    }
    for cell in grid[cy].iter_mut() {
        *cell = '-';
    }
    grid[cy][cx] = '+';

    let scale = p.amp_x.max(p.amp_y).max(0.01) * 1.15;
    let samples = p.points.max(2);
    for i in 0..=samples {
        let t = 2.0 * std::f64::consts::PI * f64::from(i) / f64::from(samples);
        let (x, y) = p.eval(t);
        let col = ((x / scale) * (width as f64 - 1.0) / 2.0 + cx as f64).round();
        let row = ((-y / scale) * (height as f64 - 1.0) / 2.0 + cy as f64).round();
        if col >= 0.0 && row >= 0.0 {
            let (col, row) = (col as usize, row as usize);
            if col < width && row < height {
                grid[row][col] = '*';
            }
        }
    }

    let mut out = String::with_capacity((width + 1) * height);
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_shows_both_equations() {
        let line = status_line(&CurveParams::default());
        assert!(line.contains("x(t)"));
        assert!(line.contains("y(t)"));
        assert!(line.contains("1000 points"));
    }

    #[test]
    fn plot_has_the_requested_shape() {
        let out = plot(&CurveParams::default(), 40, 16);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 16);
        assert!(lines.iter().all(|l| l.chars().count() == 40));
        assert!(out.contains('*'), "curve samples must land on the grid");
    }

    #[test]
    fn degenerate_amplitudes_do_not_panic() {
        let mut p = CurveParams::default();
        p.amp_x = 0.0;
        p.amp_y = 0.0;
        let _ = plot(&p, 20, 10);
    }
}
