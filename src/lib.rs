//! Flatten vector paths into polylines.
//!
//! A [`Path`] records move, line, quadratic and cubic Bézier, arc and close
//! commands. [`flatten`] turns it into straight line events that travel
//! through a chain of [`Flattener`]s: a [`Transformer`] applying a
//! [`Matrix`], a [`DashVertexConverter`] splitting lines into dashes, a
//! [`LineStroker`] building stroke outlines, and finally a
//! [`SegmentedPath`] collecting the resulting polylines.
//!
//! Curves are flattened by adaptive subdivision on a fixed-size stack, so
//! degenerate or malformed curves can neither recurse without bounds nor
//! loop forever.
//!
//! ```
//! use pathliner::{flatten_to_polylines, FlattenOptions, Matrix, Path, PathBuilder};
//!
//! let mut path = Path::new();
//! path.move_to(0.0, 0.0);
//! path.cubic_curve_to(0.0, 10.0, 10.0, 10.0, 10.0, 0.0);
//!
//! let options = FlattenOptions::default().with_transform(Matrix::from_scale(2.0, 2.0));
//! let polylines = flatten_to_polylines(&path, &options).unwrap();
//! assert_eq!(polylines.len(), 1);
//! ```
//!
//! SVG documents can be read with [`parse`].
//!
//! You can optionally get serde 1 support by enabling the `serde` feature.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]

use std::convert;

use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod curve;
pub mod dash;
mod error;
pub mod flattener;
pub mod matrix;
pub mod path;
pub mod stroker;
pub mod svg;

pub use crate::curve::{
    subdivide_cubic, subdivide_quad, trace_arc, trace_cubic, trace_quad, CURVE_RECURSION_LIMIT,
};
pub use crate::dash::DashVertexConverter;
pub use crate::error::Error;
pub use crate::flattener::{
    flatten, Flattener, Liner, SegmentedPath, Transformer, FLATTENING_TOLERANCE,
};
pub use crate::matrix::Matrix;
pub use crate::path::{Path, PathBuilder, PathCmp};
pub use crate::stroker::LineStroker;

/// A `CoordinatePair` consists of an x and y coordinate.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct CoordinatePair {
    pub x: f64,
    pub y: f64,
}

impl CoordinatePair {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl convert::From<(f64, f64)> for CoordinatePair {
    fn from(val: (f64, f64)) -> Self {
        Self { x: val.0, y: val.1 }
    }
}

/// A polyline is a vector of `CoordinatePair` instances.
pub type Polyline = Vec<CoordinatePair>;

/// A dash pattern and its phase offset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dash {
    /// Alternating dash and gap lengths.
    pub pattern: Vec<f64>,
    pub offset: f64,
}

/// How [`flatten_to_polylines`] processes a path.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlattenOptions {
    /// Applied to the path before dashing and stroking.
    pub transform: Matrix,
    pub dash: Option<Dash>,
    /// Width of the stroke outline, in transformed units. Without it the
    /// center lines are returned.
    pub stroke_width: Option<f64>,
}

impl FlattenOptions {
    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.transform = transform;
        self
    }

    /// Dash the path. An empty pattern disables dashing.
    pub fn with_dashes(mut self, offset: f64, pattern: Vec<f64>) -> Self {
        self.dash = if pattern.is_empty() {
            None
        } else {
            Some(Dash { pattern, offset })
        };
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }
}

/// Flatten a single path into polylines.
pub fn flatten_to_polylines(path: &Path, options: &FlattenOptions) -> Result<Vec<Polyline>, Error> {
    trace!("flatten_to_polylines");
    let mut segmented = SegmentedPath::new();
    {
        let mut chain: Box<dyn Flattener + '_> = Box::new(&mut segmented);
        if let Some(width) = options.stroke_width {
            chain = Box::new(LineStroker::new(width / 2.0, chain));
        }
        if let Some(dash) = &options.dash {
            chain = Box::new(DashVertexConverter::new(
                dash.pattern.clone(),
                dash.offset,
                chain,
            )?);
        }
        if !options.transform.is_identity() {
            chain = Box::new(Transformer::new(options.transform, chain));
        }
        flatten(path, &mut chain, options.transform.scale_factor())?;
    }
    Ok(segmented.into_polylines())
}

/// Parse an SVG string into a vector of polylines.
pub fn parse(svg: &str, options: &FlattenOptions) -> Result<Vec<Polyline>, Error> {
    trace!("parse");

    // Parse the XML string into a list of path expressions
    let path_exprs = svg::parse_xml(svg)?;
    trace!("parse: Found {} path expressions", path_exprs.len());

    // Vector that will hold resulting polylines
    let mut polylines: Vec<Polyline> = Vec::new();

    // Process path expressions
    for expr in path_exprs {
        let path = svg::parse_path(&expr)?;
        polylines.extend(flatten_to_polylines(&path, options)?);
    }

    debug!("parse: This results in {} polylines", polylines.len());
    Ok(polylines)
}
