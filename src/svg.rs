//! Reading paths from SVG documents.
//!
//! Only the `d` attribute of `<path>` elements is used; styles and
//! transforms in the document are ignored.

use std::str;

use log::trace;
use lyon_geom::euclid::{Angle, Point2D, Vector2D};
use lyon_geom::{ArcFlags, CubicBezierSegment, SvgArc};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::Event;
use svgtypes::{PathParser, PathSegment};

use crate::error::Error;
use crate::path::{Path, PathBuilder};

/// Parse an SVG string, return vector of path expressions.
pub fn parse_xml(svg: &str) -> Result<Vec<String>, Error> {
    trace!("parse_xml");

    let mut reader = quick_xml::Reader::from_str(svg);
    reader.trim_text(true);

    let mut paths = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                trace!("parse_xml: Matched start of {:?}", e.name());
                if e.name() == b"path" {
                    trace!("parse_xml: Found path attribute");
                    let path_expr: Option<String> = e
                        .attributes()
                        .filter_map(Result::ok)
                        .find_map(|attr: Attribute| {
                            if attr.key == b"d" {
                                attr.unescaped_value()
                                    .ok()
                                    .and_then(|v| str::from_utf8(&v).map(str::to_string).ok())
                            } else {
                                None
                            }
                        });
                    if let Some(expr) = path_expr {
                        paths.push(expr);
                    }
                }
            }
            Ok(Event::Eof) => {
                trace!("parse_xml: EOF");
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(Error::SvgParse(format!("Error when parsing XML: {}", e))),
        }

        // If we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
        buf.clear();
    }
    trace!("parse_xml: Return {} paths", paths.len());
    Ok(paths)
}

/// Control point of the previous segment, used by the smooth curve commands.
#[derive(Debug, PartialEq, Copy, Clone)]
enum Reflection {
    None,
    Cubic(f64, f64),
    Quad(f64, f64),
}

/// Turn SVG path data into calls on `builder`.
pub fn build_path<B: PathBuilder>(expr: &str, builder: &mut B) -> Result<(), Error> {
    trace!("build_path");
    let mut reflection = Reflection::None;
    for segment in PathParser::from(expr) {
        let segment =
            segment.map_err(|e| Error::PathParse(format!("Could not parse path segment: {}", e)))?;
        reflection = build_segment(&segment, reflection, builder);
    }
    Ok(())
}

/// Parse SVG path data into a new [`Path`].
pub fn parse_path(expr: &str) -> Result<Path, Error> {
    let mut path = Path::new();
    build_path(expr, &mut path)?;
    Ok(path)
}

/// Add one segment to `builder` and return the control point the next
/// smooth curve may mirror.
#[allow(clippy::similar_names)]
#[allow(clippy::too_many_lines)]
fn build_segment<B: PathBuilder>(
    segment: &PathSegment,
    reflection: Reflection,
    builder: &mut B,
) -> Reflection {
    let (cur_x, cur_y) = builder.last_point();
    // Resolve relative coordinates against the current point
    let abs_point = |abs: bool, x: f64, y: f64| {
        if abs {
            (x, y)
        } else {
            (cur_x + x, cur_y + y)
        }
    };

    match *segment {
        PathSegment::MoveTo { abs, x, y } => {
            trace!("build_segment: MoveTo");
            let (x, y) = abs_point(abs, x, y);
            builder.move_to(x, y);
            Reflection::None
        }
        PathSegment::LineTo { abs, x, y } => {
            trace!("build_segment: LineTo");
            let (x, y) = abs_point(abs, x, y);
            builder.line_to(x, y);
            Reflection::None
        }
        PathSegment::HorizontalLineTo { abs, x } => {
            trace!("build_segment: HorizontalLineTo");
            let x = if abs { x } else { cur_x + x };
            builder.line_to(x, cur_y);
            Reflection::None
        }
        PathSegment::VerticalLineTo { abs, y } => {
            trace!("build_segment: VerticalLineTo");
            let y = if abs { y } else { cur_y + y };
            builder.line_to(cur_x, y);
            Reflection::None
        }
        PathSegment::CurveTo {
            abs,
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => {
            trace!("build_segment: CurveTo");
            let (x1, y1) = abs_point(abs, x1, y1);
            let (x2, y2) = abs_point(abs, x2, y2);
            let (x, y) = abs_point(abs, x, y);
            builder.cubic_curve_to(x1, y1, x2, y2, x, y);
            Reflection::Cubic(x2, y2)
        }
        PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
            trace!("build_segment: SmoothCurveTo");
            // Mirror the previous second control point along the current
            // point, or use the current point if there is no previous curve.
            let (x1, y1) = match reflection {
                Reflection::Cubic(px, py) => (2.0 * cur_x - px, 2.0 * cur_y - py),
                _ => (cur_x, cur_y),
            };
            let (x2, y2) = abs_point(abs, x2, y2);
            let (x, y) = abs_point(abs, x, y);
            builder.cubic_curve_to(x1, y1, x2, y2, x, y);
            Reflection::Cubic(x2, y2)
        }
        PathSegment::Quadratic { abs, x1, y1, x, y } => {
            trace!("build_segment: Quadratic");
            let (x1, y1) = abs_point(abs, x1, y1);
            let (x, y) = abs_point(abs, x, y);
            builder.quad_curve_to(x1, y1, x, y);
            Reflection::Quad(x1, y1)
        }
        PathSegment::SmoothQuadratic { abs, x, y } => {
            trace!("build_segment: SmoothQuadratic");
            let (x1, y1) = match reflection {
                Reflection::Quad(px, py) => (2.0 * cur_x - px, 2.0 * cur_y - py),
                _ => (cur_x, cur_y),
            };
            let (x, y) = abs_point(abs, x, y);
            builder.quad_curve_to(x1, y1, x, y);
            Reflection::Quad(x1, y1)
        }
        PathSegment::EllipticalArc {
            abs,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        } => {
            trace!("build_segment: EllipticalArc");
            let (x, y) = abs_point(abs, x, y);
            build_arc(builder, (cur_x, cur_y), rx, ry, x_axis_rotation, large_arc, sweep, (x, y));
            Reflection::None
        }
        PathSegment::ClosePath { .. } => {
            trace!("build_segment: ClosePath");
            builder.close();
            Reflection::None
        }
    }
}

/// Add an SVG (endpoint parameterized) arc to `builder`.
///
/// Axis-aligned arcs become a single `arc_to`; rotated ellipses are
/// approximated with cubic curves.
#[allow(clippy::too_many_arguments)]
fn build_arc<B: PathBuilder>(
    builder: &mut B,
    from: (f64, f64),
    rx: f64,
    ry: f64,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
    to: (f64, f64),
) {
    if from == to {
        return;
    }
    let svg_arc = SvgArc {
        from: Point2D::new(from.0, from.1),
        to: Point2D::new(to.0, to.1),
        radii: Vector2D::new(rx.abs(), ry.abs()),
        x_rotation: Angle::degrees(x_axis_rotation),
        flags: ArcFlags { large_arc, sweep },
    };
    if rx == 0.0 || ry == 0.0 || svg_arc.is_straight_line() {
        builder.line_to(to.0, to.1);
        return;
    }

    let arc = svg_arc.to_arc();
    if arc.x_rotation.radians.abs() < 1e-12 {
        builder.arc_to(
            arc.center.x,
            arc.center.y,
            arc.radii.x,
            arc.radii.y,
            arc.start_angle.radians,
            arc.sweep_angle.radians,
        );
    } else {
        svg_arc.for_each_cubic_bezier(&mut |seg: &CubicBezierSegment<f64>| {
            builder.cubic_curve_to(seg.ctrl1.x, seg.ctrl1.y, seg.ctrl2.x, seg.ctrl2.y, seg.to.x, seg.to.y);
        });
    }
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;
    use crate::path::PathCmp;

    #[test]
    fn test_parse_xml_single() {
        let _ = env_logger::try_init();
        let input = r#"
            <?xml version="1.0" encoding="UTF-8" standalone="no"?>
            <svg xmlns="http://www.w3.org/2000/svg" version="1.1">
                <path d="M 10,100 40,70 h 10 m -20,40 10,-20" />
            </svg>
        "#;
        let result = parse_xml(&input).unwrap();
        assert_eq!(
            result,
            vec!["M 10,100 40,70 h 10 m -20,40 10,-20".to_string()]
        );
    }

    /// If multiple "d" attributes are found, simply use the first one.
    #[test]
    fn test_parse_xml_duplicate_attr() {
        let _ = env_logger::try_init();
        let input = r#"
            <svg xmlns="http://www.w3.org/2000/svg" version="1.1">
                <path d="M 20,30" d="M 10,100 40,70 h 10 m -20,40 10,-20"/>
                <rect width="10" height="10"/>
            </svg>
        "#;
        let result = parse_xml(&input).unwrap();
        assert_eq!(result, vec!["M 20,30".to_string()]);
    }

    #[test]
    fn test_parse_xml_malformed() {
        let _ = env_logger::try_init();
        let input = r#"
            <svg xmlns="http://www.w3.org/2000/svg" version="1.1">
                <path d="M 20,30"/>
            </baa>
        "#;
        match parse_xml(&input) {
            Err(Error::SvgParse(msg)) => assert!(msg.starts_with("Error when parsing XML")),
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_relative_and_shorthand_lines() {
        let path = parse_path("M 10,100 40,70 h 10 m -20,40 10,-20 v 5 Z").unwrap();
        assert_eq!(
            path.components(),
            &[
                PathCmp::MoveTo,
                PathCmp::LineTo,
                PathCmp::LineTo,
                PathCmp::MoveTo,
                PathCmp::LineTo,
                PathCmp::LineTo,
                PathCmp::Close,
            ]
        );
        assert_eq!(
            path.points(),
            &[10., 100., 40., 70., 50., 70., 30., 110., 40., 90., 40., 95.]
        );
        assert_eq!(path.last_point(), (30., 110.));
    }

    #[test]
    fn test_smooth_curves() {
        let absolute = parse_path("M 10 20 C 10 20 11 17 12 15 S 2 7 10 20 z").unwrap();
        let relative = parse_path("M 10 20 c 0 0 1 -3 2 -5 s -10 -8 -2 5 z").unwrap();
        assert_eq!(absolute, relative);
        // Mirrored control point of the `S` segment
        assert_eq!(&absolute.points()[8..10], &[13., 13.]);
    }

    #[test]
    fn test_smooth_quadratic() {
        let path = parse_path("M 0 0 Q 5 10 10 0 T 20 0").unwrap();
        assert_eq!(
            path.components(),
            &[PathCmp::MoveTo, PathCmp::QuadCurveTo, PathCmp::QuadCurveTo]
        );
        assert_eq!(&path.points()[6..], &[15., -10., 20., 0.]);
    }

    #[test]
    fn test_arc() {
        let path = parse_path("M 0 0 A 10 10 0 0 1 20 0").unwrap();
        assert_eq!(
            path.components(),
            &[PathCmp::MoveTo, PathCmp::LineTo, PathCmp::ArcTo]
        );
        let (x, y) = path.last_point();
        assert!((x - 20.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
        let arc = &path.points()[4..];
        assert!((arc[0] - 10.0).abs() < 1e-6);
        assert!(arc[1].abs() < 1e-6);
        assert!((arc[5].abs() - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_rotated_arc_uses_cubics() {
        let path = parse_path("M 0 0 A 10 5 30 0 1 20 0").unwrap();
        assert!(path.components()[1..]
            .iter()
            .all(|cmp| *cmp == PathCmp::CubicCurveTo));
        let (x, y) = path.last_point();
        assert!((x - 20.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_arc_is_a_line() {
        let path = parse_path("M 0 0 A 0 10 0 0 1 20 0").unwrap();
        assert_eq!(path.components(), &[PathCmp::MoveTo, PathCmp::LineTo]);
    }

    #[test]
    fn test_invalid_path_data() {
        match parse_path("M 10 10 L 20") {
            Err(Error::PathParse(_)) => {}
            other => panic!("Unexpected result {:?}", other),
        }
    }
}
