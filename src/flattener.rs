//! Flattening pipeline.
//!
//! [`flatten`] walks a [`Path`] and pushes straight-line events through a
//! chain of [`Flattener`]s, for example
//! `Transformer -> DashVertexConverter -> SegmentedPath`.

use std::mem;

use log::{debug, trace};

use crate::curve::{trace_arc, trace_cubic, trace_quad};
use crate::error::Error;
use crate::matrix::Matrix;
use crate::path::{Path, PathCmp};
use crate::{CoordinatePair, Polyline};

/// Squared-distance tolerance used to flatten curves at a scale of 1.
pub const FLATTENING_TOLERANCE: f64 = 0.5;

/// Receives the line segments produced by the curve tracers.
pub trait Liner {
    fn line_to(&mut self, x: f64, y: f64);
}

/// A node of the flattening chain.
pub trait Flattener: Liner {
    fn move_to(&mut self, x: f64, y: f64);

    /// Called after every straight path segment. No effect is required.
    fn line_join(&mut self);

    fn close(&mut self);

    /// The current sub-path is complete.
    fn end(&mut self);
}

impl<L: Liner + ?Sized> Liner for &mut L {
    fn line_to(&mut self, x: f64, y: f64) {
        (**self).line_to(x, y);
    }
}

impl<F: Flattener + ?Sized> Flattener for &mut F {
    fn move_to(&mut self, x: f64, y: f64) {
        (**self).move_to(x, y);
    }

    fn line_join(&mut self) {
        (**self).line_join();
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn end(&mut self) {
        (**self).end();
    }
}

impl<L: Liner + ?Sized> Liner for Box<L> {
    fn line_to(&mut self, x: f64, y: f64) {
        (**self).line_to(x, y);
    }
}

impl<F: Flattener + ?Sized> Flattener for Box<F> {
    fn move_to(&mut self, x: f64, y: f64) {
        (**self).move_to(x, y);
    }

    fn line_join(&mut self) {
        (**self).line_join();
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn end(&mut self) {
        (**self).end();
    }
}

/// Walk `path` and send its flattened form to `flattener`.
///
/// `scale` is the scale of the transform that will be applied to the
/// emitted points, it controls how finely curves and arcs are split.
pub fn flatten<F: Flattener + ?Sized>(
    path: &Path,
    flattener: &mut F,
    scale: f64,
) -> Result<(), Error> {
    trace!("flatten");
    let scale = if scale > 0.0 && scale.is_finite() {
        scale
    } else {
        trace!("flatten: unusable scale {}, using 1", scale);
        1.0
    };
    let flatness = FLATTENING_TOLERANCE / (scale * scale);

    let points = path.points();
    // Start of the current sub-path
    let (mut start_x, mut start_y) = (0.0, 0.0);
    // Current point
    let (mut x, mut y) = (0.0, 0.0);
    let mut i = 0;
    for (idx, cmp) in path.components().iter().enumerate() {
        let p = &points[i..i + cmp.arity()];
        match cmp {
            PathCmp::MoveTo => {
                trace!("flatten: MoveTo");
                x = p[0];
                y = p[1];
                start_x = x;
                start_y = y;
                if idx != 0 {
                    flattener.end();
                }
                flattener.move_to(x, y);
            }
            PathCmp::LineTo => {
                trace!("flatten: LineTo");
                x = p[0];
                y = p[1];
                flattener.line_to(x, y);
                flattener.line_join();
            }
            PathCmp::QuadCurveTo => {
                trace!("flatten: QuadCurveTo");
                let quad = [x, y, p[0], p[1], p[2], p[3]];
                trace_quad(flattener, &quad, flatness)?;
                x = p[2];
                y = p[3];
                flattener.line_to(x, y);
            }
            PathCmp::CubicCurveTo => {
                trace!("flatten: CubicCurveTo");
                let cubic = [x, y, p[0], p[1], p[2], p[3], p[4], p[5]];
                trace_cubic(flattener, &cubic, flatness)?;
                x = p[4];
                y = p[5];
                flattener.line_to(x, y);
            }
            PathCmp::ArcTo => {
                trace!("flatten: ArcTo");
                let (end_x, end_y) = trace_arc(flattener, p[0], p[1], p[2], p[3], p[4], p[5], scale);
                x = end_x;
                y = end_y;
                flattener.line_to(x, y);
            }
            PathCmp::Close => {
                trace!("flatten: Close");
                x = start_x;
                y = start_y;
                flattener.line_to(x, y);
                flattener.close();
            }
        }
        i += cmp.arity();
    }
    flattener.end();
    Ok(())
}

/// Applies a [`Matrix`] to every point before passing it on.
#[derive(Debug, Clone)]
pub struct Transformer<F> {
    tr: Matrix,
    next: F,
}

impl<F: Flattener> Transformer<F> {
    pub fn new(tr: Matrix, next: F) -> Self {
        Self { tr, next }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.tr
    }

    /// Return the next node of the chain.
    pub fn into_inner(self) -> F {
        self.next
    }
}

impl<F: Flattener> Liner for Transformer<F> {
    fn line_to(&mut self, x: f64, y: f64) {
        let (u, v) = self.tr.transform_point(x, y);
        self.next.line_to(u, v);
    }
}

impl<F: Flattener> Flattener for Transformer<F> {
    fn move_to(&mut self, x: f64, y: f64) {
        let (u, v) = self.tr.transform_point(x, y);
        self.next.move_to(u, v);
    }

    fn line_join(&mut self) {
        self.next.line_join();
    }

    fn close(&mut self) {
        self.next.close();
    }

    fn end(&mut self) {
        self.next.end();
    }
}

/// End of a flattening chain that collects polylines.
///
/// Every `move_to` starts a new polyline. Polylines with fewer than two
/// points are dropped.
#[derive(Debug, Default, PartialEq)]
pub struct SegmentedPath {
    /// Finished polylines.
    lines: Vec<Polyline>,

    /// The polyline currently being recorded.
    line: Polyline,
}

impl SegmentedPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// A polyline is only valid if it has more than 1 `CoordinatePair`.
    fn is_valid(&self) -> bool {
        self.line.len() > 1
    }

    /// Move the current polyline to the finished list, if it is valid.
    fn finish(&mut self) {
        if self.is_valid() {
            self.lines.push(mem::take(&mut self.line));
        } else {
            self.line.clear();
        }
    }

    /// The polylines finished so far.
    pub fn polylines(&self) -> &[Polyline] {
        &self.lines
    }

    /// Finish the current polyline and return all of them.
    pub fn into_polylines(mut self) -> Vec<Polyline> {
        self.finish();
        debug!("SegmentedPath: {} polylines", self.lines.len());
        self.lines
    }
}

impl Liner for SegmentedPath {
    fn line_to(&mut self, x: f64, y: f64) {
        self.line.push(CoordinatePair::new(x, y));
    }
}

impl Flattener for SegmentedPath {
    fn move_to(&mut self, x: f64, y: f64) {
        self.finish();
        self.line.push(CoordinatePair::new(x, y));
    }

    fn line_join(&mut self) {}

    fn close(&mut self) {}

    fn end(&mut self) {
        self.finish();
    }
}
