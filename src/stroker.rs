//! Conversion of flattened center lines into outline polygons.

use log::trace;

use crate::flattener::{Flattener, Liner};

/// Turns every sub-path into the outline of a stroke of constant width.
///
/// Each segment is offset by `half_width` on both sides. The left side is
/// emitted forward and the right side backwards, so the next node receives
/// one closed polygon per sub-path. Caps are butt caps, joins are not
/// filled in.
#[derive(Debug, Clone)]
pub struct LineStroker<F> {
    next: F,
    half_width: f64,

    /// Left side offsets, interleaved `x, y`.
    vertices: Vec<f64>,
    /// Right side offsets, emitted in reverse.
    rewind: Vec<f64>,

    /// Previous point.
    x: f64,
    y: f64,
}

impl<F: Flattener> LineStroker<F> {
    pub fn new(half_width: f64, next: F) -> Self {
        Self {
            next,
            half_width,
            vertices: Vec::new(),
            rewind: Vec::new(),
            x: 0.0,
            y: 0.0,
        }
    }

    /// Return the next node of the chain.
    pub fn into_inner(self) -> F {
        self.next
    }

    fn segment(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let d = dx.hypot(dy);
        if d != 0.0 {
            let nx = dy * self.half_width / d;
            let ny = -(dx * self.half_width / d);
            self.vertices
                .extend_from_slice(&[x1 + nx, y1 + ny, x2 + nx, y2 + ny]);
            self.rewind
                .extend_from_slice(&[x1 - nx, y1 - ny, x2 - nx, y2 - ny]);
            self.x = x2;
            self.y = y2;
        }
    }
}

impl<F: Flattener> Liner for LineStroker<F> {
    fn line_to(&mut self, x: f64, y: f64) {
        self.segment(self.x, self.y, x, y);
    }
}

impl<F: Flattener> Flattener for LineStroker<F> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn line_join(&mut self) {}

    fn close(&mut self) {
        if self.vertices.len() > 1 {
            let (lx, ly) = (self.vertices[0], self.vertices[1]);
            let (rx, ry) = (self.rewind[0], self.rewind[1]);
            self.vertices.extend_from_slice(&[lx, ly]);
            self.rewind.extend_from_slice(&[rx, ry]);
        }
    }

    fn end(&mut self) {
        if self.vertices.len() > 1 {
            trace!(
                "stroke: outline with {} vertices",
                (self.vertices.len() + self.rewind.len()) / 2
            );
            self.next.move_to(self.vertices[0], self.vertices[1]);
            for pair in self.vertices.chunks_exact(2).skip(1) {
                self.next.line_to(pair[0], pair[1]);
            }
            for pair in self.rewind.chunks_exact(2).rev() {
                self.next.line_to(pair[0], pair[1]);
            }
            self.next.line_to(self.vertices[0], self.vertices[1]);
            self.next.close();
        }
        self.next.end();

        self.vertices.clear();
        self.rewind.clear();
        self.x = 0.0;
        self.y = 0.0;
    }
}
