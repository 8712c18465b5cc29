//! Dashing of flattened paths.

use log::trace;

use crate::error::Error;
use crate::flattener::{Flattener, Liner};

/// Splits the polylines it receives into dashes.
///
/// Even entries of the pattern are drawn, odd entries are gaps. Every gap
/// ends the current sub-path on the next node and starts a new one where
/// the following dash begins.
#[derive(Debug, Clone)]
pub struct DashVertexConverter<F> {
    next: F,

    /// Previous point.
    x: f64,
    y: f64,

    /// Length already covered in the active dash entry.
    distance: f64,

    dash: Vec<f64>,
    current_dash: usize,
    dash_offset: f64,
}

impl<F: Flattener> DashVertexConverter<F> {
    /// Create a dash converter in front of `next`.
    ///
    /// The pattern must be non-empty, its entries finite and non-negative
    /// with a positive sum. Callers that want "no dashing" for an empty
    /// pattern should skip this node.
    pub fn new(dash: Vec<f64>, dash_offset: f64, next: F) -> Result<Self, Error> {
        if dash.is_empty() {
            return Err(Error::InvalidDash("empty pattern".into()));
        }
        if let Some(len) = dash.iter().find(|len| !len.is_finite() || **len < 0.0) {
            return Err(Error::InvalidDash(format!("invalid length {}", len)));
        }
        if dash.iter().sum::<f64>() <= 0.0 {
            return Err(Error::InvalidDash("pattern has zero length".into()));
        }
        if !dash_offset.is_finite() {
            return Err(Error::InvalidDash(format!("invalid offset {}", dash_offset)));
        }
        Ok(Self {
            next,
            x: 0.0,
            y: 0.0,
            distance: 0.0,
            dash,
            current_dash: 0,
            dash_offset,
        })
    }

    /// Return the next node of the chain.
    pub fn into_inner(self) -> F {
        self.next
    }

    fn advance(&mut self) {
        self.current_dash = (self.current_dash + 1) % self.dash.len();
    }

    /// Skip the entries already covered by `distance`.
    fn skip_covered(&mut self) {
        while self.distance >= self.dash[self.current_dash] {
            self.distance -= self.dash[self.current_dash];
            self.advance();
        }
    }

    /// Emit the point `(x, y)` at the end of a piece of the active entry.
    fn emit(&mut self, x: f64, y: f64) {
        if self.current_dash % 2 == 0 {
            self.next.line_to(x, y);
        } else {
            self.next.end();
            self.next.move_to(x, y);
        }
    }
}

impl<F: Flattener> Liner for DashVertexConverter<F> {
    fn line_to(&mut self, x: f64, y: f64) {
        let mut d = (x - self.x).hypot(y - self.y);
        if !d.is_finite() {
            // No dash boundary can be placed on this segment
            trace!("dash: segment of length {}, passing it through", d);
            self.emit(x, y);
            self.x = x;
            self.y = y;
            return;
        }
        loop {
            let rest = self.dash[self.current_dash] - self.distance;
            if d <= rest {
                break;
            }
            // The active entry ends inside this segment
            let k = rest / d;
            let lx = self.x + k * (x - self.x);
            let ly = self.y + k * (y - self.y);
            trace!("dash: entry {} ends at {}, {}", self.current_dash, lx, ly);
            self.emit(lx, ly);
            d -= rest;
            self.x = lx;
            self.y = ly;
            self.distance = 0.0;
            self.advance();
        }
        self.distance += d;
        self.emit(x, y);
        self.skip_covered();
        self.x = x;
        self.y = y;
    }
}

impl<F: Flattener> Flattener for DashVertexConverter<F> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.next.move_to(x, y);
        self.x = x;
        self.y = y;
        let total: f64 = self.dash.iter().sum();
        self.distance = self.dash_offset.rem_euclid(total);
        self.current_dash = 0;
        self.skip_covered();
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
