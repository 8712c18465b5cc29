//! Path recording.
//!
//! A [`Path`] stores a list of [`PathCmp`] components next to a flat buffer
//! of `f64` values. Each component consumes a fixed number of values from
//! that buffer (see [`PathCmp::arity`]).

use std::convert::TryFrom;
use std::f64::consts::PI;
use std::fmt;

use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A drawing command stored in a [`Path`].
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathCmp {
    /// `x, y`
    MoveTo,
    /// `x, y`
    LineTo,
    /// `cx, cy, x, y`
    QuadCurveTo,
    /// `cx1, cy1, cx2, cy2, x, y`
    CubicCurveTo,
    /// `cx, cy, rx, ry, start_angle, angle`
    ArcTo,
    Close,
}

impl PathCmp {
    /// Number of values this component reads from the point buffer.
    pub fn arity(self) -> usize {
        match self {
            PathCmp::MoveTo | PathCmp::LineTo => 2,
            PathCmp::QuadCurveTo => 4,
            PathCmp::CubicCurveTo | PathCmp::ArcTo => 6,
            PathCmp::Close => 0,
        }
    }
}

impl TryFrom<u8> for PathCmp {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(PathCmp::MoveTo),
            1 => Ok(PathCmp::LineTo),
            2 => Ok(PathCmp::QuadCurveTo),
            3 => Ok(PathCmp::CubicCurveTo),
            4 => Ok(PathCmp::ArcTo),
            5 => Ok(PathCmp::Close),
            other => Err(Error::UnknownComponent(other)),
        }
    }
}

/// Something that records drawing commands.
pub trait PathBuilder {
    /// The current point, i.e. where the next segment starts.
    fn last_point(&self) -> (f64, f64);

    /// Start a new sub-path at `(x, y)`.
    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    /// Quadratic Bézier curve with control point `(cx, cy)` ending at `(x, y)`.
    fn quad_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);

    /// Cubic Bézier curve with control points `(cx1, cy1)` and `(cx2, cy2)`
    /// ending at `(x, y)`.
    fn cubic_curve_to(&mut self, cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64);

    /// Elliptical arc centered on `(cx, cy)`, starting at `start_angle` and
    /// sweeping `angle` radians. A positive `angle` is clockwise in a y-down
    /// coordinate system.
    fn arc_to(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, angle: f64);

    /// Close the current sub-path.
    fn close(&mut self);
}

/// A recorded sequence of drawing commands.
///
/// Deserialized paths go through [`Path::from_raw`], so malformed buffers
/// are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPath"))]
pub struct Path {
    components: Vec<PathCmp>,
    points: Vec<f64>,

    /// Current point.
    x: f64,
    y: f64,

    /// Start of the current sub-path, the current point after `close`.
    start_x: f64,
    start_y: f64,
}

/// Serialized form of a [`Path`]; the current point is derived from it.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawPath {
    components: Vec<PathCmp>,
    points: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPath> for Path {
    type Error = Error;

    fn try_from(raw: RawPath) -> Result<Self, Self::Error> {
        Path::from_raw(raw.components, raw.points)
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from raw component and point buffers.
    ///
    /// Fails if the number of values does not match the components.
    pub fn from_raw(components: Vec<PathCmp>, points: Vec<f64>) -> Result<Self, Error> {
        let expected: usize = components.iter().map(|cmp| cmp.arity()).sum();
        if expected != points.len() {
            return Err(Error::MalformedPath(format!(
                "{} components need {} values, got {}",
                components.len(),
                expected,
                points.len()
            )));
        }
        let mut path = Self {
            components,
            points,
            ..Self::default()
        };
        path.restore_current_point();
        Ok(path)
    }

    /// Recompute the current point and sub-path start from the buffers.
    fn restore_current_point(&mut self) {
        let mut i = 0;
        for cmp in &self.components {
            let p = &self.points[i..i + cmp.arity()];
            match cmp {
                PathCmp::MoveTo => {
                    self.x = p[0];
                    self.y = p[1];
                    self.start_x = p[0];
                    self.start_y = p[1];
                }
                PathCmp::LineTo => {
                    self.x = p[0];
                    self.y = p[1];
                }
                PathCmp::QuadCurveTo => {
                    self.x = p[2];
                    self.y = p[3];
                }
                PathCmp::CubicCurveTo => {
                    self.x = p[4];
                    self.y = p[5];
                }
                PathCmp::ArcTo => {
                    let end = p[4] + p[5];
                    self.x = p[0] + end.cos() * p[2];
                    self.y = p[1] + end.sin() * p[3];
                }
                PathCmp::Close => {
                    self.x = self.start_x;
                    self.y = self.start_y;
                }
            }
            i += cmp.arity();
        }
    }

    pub fn components(&self) -> &[PathCmp] {
        &self.components
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.points.clear();
        self.x = 0.0;
        self.y = 0.0;
        self.start_x = 0.0;
        self.start_y = 0.0;
    }

    /// Return an independent copy of the path.
    pub fn dup(&self) -> Path {
        self.clone()
    }

    fn append(&mut self, cmp: PathCmp, values: &[f64]) {
        debug_assert_eq!(cmp.arity(), values.len());
        self.components.push(cmp);
        self.points.extend_from_slice(values);
    }

    /// Return a copy of the path mirrored on the x axis.
    ///
    /// Arcs keep their radii: the center is mirrored and both the start
    /// angle and the sweep are negated, which mirrors every point of the
    /// ellipse while preserving the parametrisation.
    pub fn vertical_flip(&self) -> Path {
        let mut p = self.dup();
        let mut j = 0;
        for cmp in &p.components {
            let values = &mut p.points[j..j + cmp.arity()];
            let offsets: &[usize] = match cmp {
                PathCmp::MoveTo | PathCmp::LineTo => &[1],
                PathCmp::QuadCurveTo => &[1, 3],
                PathCmp::CubicCurveTo => &[1, 3, 5],
                PathCmp::ArcTo => &[1, 4, 5],
                PathCmp::Close => &[],
            };
            for &offset in offsets {
                values[offset] = -values[offset];
            }
            j += cmp.arity();
        }
        p.y = -p.y;
        p.start_y = -p.start_y;
        p
    }
}

impl PathBuilder for Path {
    fn last_point(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.append(PathCmp::MoveTo, &[x, y]);
        self.x = x;
        self.y = y;
        self.start_x = x;
        self.start_y = y;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if self.is_empty() {
            trace!("line_to: empty path, recording a move instead");
            self.move_to(x, y);
            return;
        }
        self.append(PathCmp::LineTo, &[x, y]);
        self.x = x;
        self.y = y;
    }

    fn quad_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        if self.is_empty() {
            trace!("quad_curve_to: empty path, recording a move instead");
            self.move_to(x, y);
            return;
        }
        self.append(PathCmp::QuadCurveTo, &[cx, cy, x, y]);
        self.x = x;
        self.y = y;
    }

    fn cubic_curve_to(&mut self, cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64) {
        if self.is_empty() {
            trace!("cubic_curve_to: empty path, recording a move instead");
            self.move_to(x, y);
            return;
        }
        self.append(PathCmp::CubicCurveTo, &[cx1, cy1, cx2, cy2, x, y]);
        self.x = x;
        self.y = y;
    }

    fn arc_to(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, angle: f64) {
        let mut start_angle = start_angle;
        let mut end_angle = start_angle + angle;
        if angle >= 0.0 {
            while end_angle < start_angle {
                end_angle += 2.0 * PI;
            }
        } else {
            while start_angle < end_angle {
                start_angle += 2.0 * PI;
            }
        }

        let start_x = cx + start_angle.cos() * rx;
        let start_y = cy + start_angle.sin() * ry;
        if self.is_empty() {
            self.move_to(start_x, start_y);
        } else {
            self.line_to(start_x, start_y);
        }
        self.append(PathCmp::ArcTo, &[cx, cy, rx, ry, start_angle, angle]);
        self.x = cx + end_angle.cos() * rx;
        self.y = cy + end_angle.sin() * ry;
    }

    fn close(&mut self) {
        self.append(PathCmp::Close, &[]);
        self.x = self.start_x;
        self.y = self.start_y;
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut j = 0;
        for cmp in &self.components {
            let values = &self.points[j..j + cmp.arity()];
            write!(f, "{:?}", cmp)?;
            for (idx, value) in values.iter().enumerate() {
                let sep = if idx == 0 { ": " } else { ", " };
                write!(f, "{}{:.6}", sep, value)?;
            }
            writeln!(f)?;
            j += cmp.arity();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_move() {
        let mut path = Path::new();
        path.line_to(1.0, 2.0);
        assert_eq!(path.components(), &[PathCmp::MoveTo]);
        assert_eq!(path.points(), &[1.0, 2.0]);

        let mut path = Path::new();
        path.quad_curve_to(5.0, 5.0, 3.0, 4.0);
        assert_eq!(path.components(), &[PathCmp::MoveTo]);
        assert_eq!(path.points(), &[3.0, 4.0]);

        let mut path = Path::new();
        path.cubic_curve_to(5.0, 5.0, 6.0, 6.0, 7.0, 8.0);
        assert_eq!(path.components(), &[PathCmp::MoveTo]);
        assert_eq!(path.last_point(), (7.0, 8.0));
    }

    #[test]
    fn test_point_buffer_matches_components() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.quad_curve_to(15.0, 5.0, 10.0, 10.0);
        path.cubic_curve_to(8.0, 12.0, 2.0, 12.0, 0.0, 10.0);
        path.close();
        let expected: usize = path.components().iter().map(|c| c.arity()).sum();
        assert_eq!(path.points().len(), expected);
        assert_eq!(path.last_point(), (0.0, 0.0));
    }

    #[test]
    fn test_arc_to() {
        let mut path = Path::new();
        path.arc_to(10.0, 10.0, 5.0, 5.0, 0.0, PI / 2.0);
        assert_eq!(
            path.components(),
            &[PathCmp::MoveTo, PathCmp::ArcTo]
        );
        assert_eq!(&path.points()[..2], &[15.0, 10.0]);
        let (x, y) = path.last_point();
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 15.0).abs() < 1e-9);

        // A second arc is connected with a line
        path.arc_to(0.0, 0.0, 1.0, 1.0, PI, -PI);
        assert_eq!(
            path.components(),
            &[PathCmp::MoveTo, PathCmp::ArcTo, PathCmp::LineTo, PathCmp::ArcTo]
        );
        let (x, y) = path.last_point();
        assert!((x - 1.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_vertical_flip_twice() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.line_to(3.0, -4.0);
        path.quad_curve_to(5.0, 6.0, 7.0, 8.0);
        path.cubic_curve_to(1.0, 1.5, 2.0, 2.5, 3.0, 3.5);
        path.arc_to(0.0, 5.0, 2.0, 3.0, 0.5, 1.0);
        path.close();
        let flipped = path.vertical_flip();
        assert_ne!(flipped, path);
        assert_eq!(flipped.vertical_flip(), path);
    }

    #[test]
    fn test_vertical_flip_arc_mirrors_points() {
        let mut path = Path::new();
        path.arc_to(3.0, 4.0, 2.0, 1.0, 0.3, 1.2);
        let flipped = path.vertical_flip();
        let (x, y) = path.last_point();
        let (fx, fy) = flipped.last_point();
        assert_eq!((x, -y), (fx, fy));

        // The radii are not touched
        assert_eq!(flipped.points()[2 + 2], 2.0);
        assert_eq!(flipped.points()[2 + 3], 1.0);

        // Recomputing the end point from the flipped values matches
        let rebuilt = Path::from_raw(
            flipped.components().to_vec(),
            flipped.points().to_vec(),
        )
        .unwrap();
        let (rx, ry) = rebuilt.last_point();
        assert!((rx - fx).abs() < 1e-9);
        assert!((ry - fy).abs() < 1e-9);
    }

    #[test]
    fn test_dup_is_independent() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(1.0, 1.0);
        let mut copy = path.dup();
        copy.line_to(2.0, 2.0);
        copy.close();
        assert_eq!(path.components(), &[PathCmp::MoveTo, PathCmp::LineTo]);
        assert_eq!(path.points(), &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(path.last_point(), (1.0, 1.0));
    }

    #[test]
    fn test_clear() {
        let mut path = Path::new();
        path.move_to(4.0, 4.0);
        path.clear();
        assert!(path.is_empty());
        assert!(path.points().is_empty());
        assert_eq!(path, Path::new());
    }

    #[test]
    fn test_from_raw() {
        let path = Path::from_raw(
            vec![PathCmp::MoveTo, PathCmp::LineTo, PathCmp::Close],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        assert_eq!(path.last_point(), (1.0, 2.0));

        let err = Path::from_raw(vec![PathCmp::CubicCurveTo], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedPath("1 components need 6 values, got 2".into())
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_checks_buffers() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.line_to(3.0, 4.0);
        path.close();
        let json = serde_json::to_string(&path).unwrap();
        let path2: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(path, path2);

        let malformed = r#"{"components":["CubicCurveTo"],"points":[1.0],"x":0.0,"y":0.0,"start_x":0.0,"start_y":0.0}"#;
        let err = serde_json::from_str::<Path>(malformed).unwrap_err();
        assert!(err.to_string().contains("1 components need 6 values, got 1"));
    }

    #[test]
    fn test_component_tags() {
        assert_eq!(PathCmp::try_from(3), Ok(PathCmp::CubicCurveTo));
        assert_eq!(PathCmp::try_from(9), Err(Error::UnknownComponent(9)));
    }

    #[test]
    fn test_display() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.line_to(3.0, 4.0);
        path.close();
        assert_eq!(
            path.to_string(),
            "MoveTo: 1.000000, 2.000000\nLineTo: 3.000000, 4.000000\nClose\n"
        );
    }
}
