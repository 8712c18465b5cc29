//! Adaptive flattening of Bézier curves and elliptical arcs.
//!
//! Curves are subdivided with an explicit, fixed-size stack instead of
//! recursion, so memory use per call is bounded no matter how badly
//! behaved the input is.

use log::{trace, warn};

use crate::error::Error;
use crate::flattener::Liner;

/// Maximum number of curve segments held on the subdivision stack.
pub const CURVE_RECURSION_LIMIT: usize = 32;

/// Start point, two control points and end point: `x0, y0, ..., x3, y3`.
pub type CubicCurve = [f64; 8];

/// Start point, control point and end point: `x0, y0, x1, y1, x2, y2`.
pub type QuadCurve = [f64; 6];

/// Copy the first `N` values of `values` into an array.
fn curve_from_slice<const N: usize>(values: &[f64]) -> Result<[f64; N], Error> {
    if values.len() < N {
        return Err(Error::CurveArity {
            expected: N,
            actual: values.len(),
        });
    }
    let mut curve = [0.0; N];
    curve.copy_from_slice(&values[..N]);
    Ok(curve)
}

/// Flatness test.
///
/// `deviation` is the summed cross product of the control points against
/// the chord, so `deviation²` compares to `flatness * chord²`. A NaN
/// deviation counts as flat.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn is_flat(deviation: f64, chord_sq: f64, flatness: f64) -> bool {
    !(deviation * deviation > flatness * chord_sq)
}

/// Split a cubic curve in two halves at `t = 0.5` (de Casteljau).
pub fn subdivide_cubic(c: &CubicCurve) -> (CubicCurve, CubicCurve) {
    let mut c1 = [0.0; 8];
    let mut c2 = [0.0; 8];

    c1[0] = c[0];
    c1[1] = c[1];
    c2[6] = c[6];
    c2[7] = c[7];

    c1[2] = (c[0] + c[2]) / 2.0;
    c1[3] = (c[1] + c[3]) / 2.0;
    let mid_x = (c[2] + c[4]) / 2.0;
    let mid_y = (c[3] + c[5]) / 2.0;
    c2[4] = (c[4] + c[6]) / 2.0;
    c2[5] = (c[5] + c[7]) / 2.0;

    c1[4] = (c1[2] + mid_x) / 2.0;
    c1[5] = (c1[3] + mid_y) / 2.0;
    c2[2] = (mid_x + c2[4]) / 2.0;
    c2[3] = (mid_y + c2[5]) / 2.0;

    c1[6] = (c1[4] + c2[2]) / 2.0;
    c1[7] = (c1[5] + c2[3]) / 2.0;
    c2[0] = c1[6];
    c2[1] = c1[7];

    (c1, c2)
}

/// Split a quadratic curve in two halves at `t = 0.5`.
pub fn subdivide_quad(c: &QuadCurve) -> (QuadCurve, QuadCurve) {
    let mut c1 = [0.0; 6];
    let mut c2 = [0.0; 6];

    c1[0] = c[0];
    c1[1] = c[1];
    c2[4] = c[4];
    c2[5] = c[5];

    c1[2] = (c[0] + c[2]) / 2.0;
    c1[3] = (c[1] + c[3]) / 2.0;
    c2[2] = (c[2] + c[4]) / 2.0;
    c2[3] = (c[3] + c[5]) / 2.0;

    c1[4] = (c1[2] + c2[2]) / 2.0;
    c1[5] = (c1[3] + c2[3]) / 2.0;
    c2[0] = c1[4];
    c2[1] = c1[5];

    (c1, c2)
}

/// Flatten a cubic curve into `line_to` calls on `liner`.
///
/// The start point is not emitted. `curve` must hold at least 8 values;
/// extra values are ignored. `flatness` is a squared distance in the
/// curve's coordinate space.
pub fn trace_cubic<L: Liner + ?Sized>(
    liner: &mut L,
    curve: &[f64],
    flatness: f64,
) -> Result<(), Error> {
    trace_cubic_bounded::<L, CURVE_RECURSION_LIMIT>(liner, curve, flatness)
}

/// [`trace_cubic`] with room for `DEPTH` pending segments.
fn trace_cubic_bounded<L: Liner + ?Sized, const DEPTH: usize>(
    liner: &mut L,
    curve: &[f64],
    flatness: f64,
) -> Result<(), Error> {
    let first: CubicCurve = curve_from_slice(curve)?;

    let mut stack = [[0.0; 8]; DEPTH];
    stack[0] = first;
    let mut top = 0;
    loop {
        let c = stack[top];
        let dx = c[6] - c[0];
        let dy = c[7] - c[1];
        let chord_sq = dx * dx + dy * dy;
        let (deviation, chord_sq) = if chord_sq == 0.0 {
            // Closed loop: measure the control points from the end point.
            // These are plain distances, so `flatness` is compared as if
            // the chord had unit length.
            let d2 = (c[2] - c[6]).hypot(c[3] - c[7]);
            let d3 = (c[4] - c[6]).hypot(c[5] - c[7]);
            (d2 + d3, 1.0)
        } else {
            let d2 = ((c[2] - c[6]) * dy - (c[3] - c[7]) * dx).abs();
            let d3 = ((c[4] - c[6]) * dy - (c[5] - c[7]) * dx).abs();
            (d2 + d3, chord_sq)
        };

        let full = top == DEPTH - 1;
        if full || is_flat(deviation, chord_sq, flatness) {
            if full {
                trace!("trace_cubic: subdivision stack full, forcing a line");
            }
            liner.line_to(c[6], c[7]);
            if top == 0 {
                break;
            }
            top -= 1;
        } else {
            // The second half goes lower onto the stack
            let (c1, c2) = subdivide_cubic(&c);
            stack[top] = c2;
            stack[top + 1] = c1;
            top += 1;
        }
    }
    Ok(())
}

/// Flatten a quadratic curve into `line_to` calls on `liner`.
///
/// Same contract as [`trace_cubic`], with 6 values.
pub fn trace_quad<L: Liner + ?Sized>(
    liner: &mut L,
    curve: &[f64],
    flatness: f64,
) -> Result<(), Error> {
    trace_quad_bounded::<L, CURVE_RECURSION_LIMIT>(liner, curve, flatness)
}

fn trace_quad_bounded<L: Liner + ?Sized, const DEPTH: usize>(
    liner: &mut L,
    curve: &[f64],
    flatness: f64,
) -> Result<(), Error> {
    let first: QuadCurve = curve_from_slice(curve)?;

    let mut stack = [[0.0; 6]; DEPTH];
    stack[0] = first;
    let mut top = 0;
    loop {
        let c = stack[top];
        let dx = c[4] - c[0];
        let dy = c[5] - c[1];
        let chord_sq = dx * dx + dy * dy;
        let (deviation, chord_sq) = if chord_sq == 0.0 {
            // Distance against a unit chord, as in trace_cubic_bounded
            ((c[2] - c[4]).hypot(c[3] - c[5]), 1.0)
        } else {
            (((c[2] - c[4]) * dy - (c[3] - c[5]) * dx).abs(), chord_sq)
        };

        let full = top == DEPTH - 1;
        if full || is_flat(deviation, chord_sq, flatness) {
            if full {
                trace!("trace_quad: subdivision stack full, forcing a line");
            }
            liner.line_to(c[4], c[5]);
            if top == 0 {
                break;
            }
            top -= 1;
        } else {
            let (c1, c2) = subdivide_quad(&c);
            stack[top] = c2;
            stack[top + 1] = c1;
            top += 1;
        }
    }
    Ok(())
}

/// Step along an elliptical arc, emitting a `line_to` for every step.
///
/// The arc is centered on `(x, y)` with radii `rx`, `ry`, starts at
/// `start` and sweeps `angle` radians. `scale` is the device scale, the
/// step size keeps the chord error around an eighth of a device pixel.
///
/// The final point is not emitted; it is returned instead so that the
/// caller can draw to the exact end of the arc.
#[allow(clippy::too_many_arguments)]
pub fn trace_arc<L: Liner + ?Sized>(
    liner: &mut L,
    x: f64,
    y: f64,
    rx: f64,
    ry: f64,
    start: f64,
    angle: f64,
    scale: f64,
) -> (f64, f64) {
    let end = start + angle;
    let end_point = (x + end.cos() * rx, y + end.sin() * ry);

    let clockwise = angle >= 0.0;
    let radius = (rx.abs() + ry.abs()) / 2.0;
    let mut da = (radius / (radius + 0.125 / scale)).acos() * 2.0;
    if !da.is_finite() || !end.is_finite() || start + da == start {
        warn!("trace_arc: cannot step arc (step {}, end {}), drawing to its end", da, end);
        return end_point;
    }
    if !clockwise {
        da = -da;
    }
    trace!("trace_arc: angle {} in steps of {}", angle, da);

    let mut a = start + da;
    while (a < end - da / 4.0) == clockwise {
        liner.line_to(x + a.cos() * rx, y + a.sin() * ry);
        let next = a + da;
        if next == a {
            warn!("trace_arc: step {} vanishes at angle {}, drawing to its end", da, a);
            break;
        }
        a = next;
    }
    end_point
}
