//! `Segment` is the sum of all curve variants
use crate::{
    Arc, BBox, Context2d, Cubic, Curve, EllipArc, Line, PI, PiecewiseLinearOptions, Point, Quad,
    Ray, RayHit, Scalar, Transform,
};
use std::fmt;

/// `Segment` is an enum of either `Line`, `Quad`, `Cubic`, `Arc` or `EllipArc`
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Segment {
    Line(Line),
    Quad(Quad),
    Cubic(Cubic),
    Arc(Arc),
    EllipArc(EllipArc),
}

/// Dispatch method call to the variant of the segment
macro_rules! dispatch {
    ($segment:expr, $curve:ident => $body:expr) => {
        match $segment {
            Segment::Line($curve) => $body,
            Segment::Quad($curve) => $body,
            Segment::Cubic($curve) => $body,
            Segment::Arc($curve) => $body,
            Segment::EllipArc($curve) => $body,
        }
    };
}

/// Same as `dispatch` but wraps curve valued result back into the segment
macro_rules! dispatch_wrap {
    ($segment:expr, $curve:ident => $body:expr) => {
        match $segment {
            Segment::Line($curve) => Segment::Line($body),
            Segment::Quad($curve) => Segment::Quad($body),
            Segment::Cubic($curve) => Segment::Cubic($body),
            Segment::Arc($curve) => Segment::Arc($body),
            Segment::EllipArc($curve) => Segment::EllipArc($body),
        }
    };
}

impl Segment {
    /// Convert to line if it is a line variant of the segment
    pub fn to_line(&self) -> Option<Line> {
        match self {
            Segment::Line(line) => Some(*line),
            _ => None,
        }
    }

    /// Convert to quad if it is a quad variant of the segment
    pub fn to_quad(&self) -> Option<Quad> {
        match self {
            Segment::Quad(quad) => Some(*quad),
            _ => None,
        }
    }

    /// Convert to cubic if it is a cubic variant of the segment
    pub fn to_cubic(&self) -> Option<Cubic> {
        match self {
            Segment::Cubic(cubic) => Some(*cubic),
            _ => None,
        }
    }

    /// Convert to arc if it is an arc variant of the segment
    pub fn to_arc(&self) -> Option<Arc> {
        match self {
            Segment::Arc(arc) => Some(*arc),
            _ => None,
        }
    }

    /// Convert to elliptical arc if it is an elliptical arc variant of the segment
    pub fn to_elliptical_arc(&self) -> Option<EllipArc> {
        match self {
            Segment::EllipArc(arc) => Some(*arc),
            _ => None,
        }
    }

    /// Map segment from polar coordinates (`x` is a radius and `y` is an angle)
    /// to the cartesian ones.
    ///
    /// Lines of constant radius become arcs, lines of constant angle stay lines,
    /// everything else is approximated with lines.
    pub fn polar_to_cartesian(&self, options: PiecewiseLinearOptions) -> Vec<Segment> {
        let polar = |point: Point| Point::from_polar(point.x(), point.y());
        if let Segment::Line(Line([start, end])) = *self {
            if start.x() == end.x() && (end.y() - start.y()).abs() < 2.0 * PI {
                let arc = Arc::new(Point::ZERO, start.x(), start.y(), end.y(), start.y() > end.y());
                return arc.nondegenerate_segments();
            }
            if start.y() == end.y() {
                return Line([polar(start), polar(end)]).nondegenerate_segments();
            }
        }
        dispatch!(self, curve => curve.to_piecewise_linear(&polar, options))
            .into_iter()
            .map(Segment::from)
            .collect()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, curve => curve.fmt(f))
    }
}

impl Curve for Segment {
    fn start(&self) -> Point {
        dispatch!(self, curve => curve.start())
    }

    fn end(&self) -> Point {
        dispatch!(self, curve => curve.end())
    }

    fn at(&self, t: Scalar) -> Point {
        dispatch!(self, curve => curve.at(t))
    }

    fn tangent_at(&self, t: Scalar) -> Point {
        dispatch!(self, curve => curve.tangent_at(t))
    }

    fn start_tangent(&self) -> Point {
        dispatch!(self, curve => curve.start_tangent())
    }

    fn end_tangent(&self) -> Point {
        dispatch!(self, curve => curve.end_tangent())
    }

    fn curvature_at(&self, t: Scalar) -> Scalar {
        dispatch!(self, curve => curve.curvature_at(t))
    }

    fn bbox(&self) -> BBox {
        dispatch!(self, curve => curve.bbox())
    }

    fn interior_extrema(&self) -> Vec<Scalar> {
        dispatch!(self, curve => curve.interior_extrema())
    }

    fn split(&self) -> (Self, Self) {
        dispatch!(self, curve => {
            let (c0, c1) = curve.split();
            (c0.into(), c1.into())
        })
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        dispatch!(self, curve => {
            let (c0, c1) = curve.split_at(t);
            (c0.into(), c1.into())
        })
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        dispatch_wrap!(self, curve => curve.cut(a, b))
    }

    fn reparameterized(&self, a: Scalar, b: Scalar) -> Self {
        dispatch_wrap!(self, curve => curve.reparameterized(a, b))
    }

    fn reverse(&self) -> Self {
        dispatch_wrap!(self, curve => curve.reverse())
    }

    fn transformed(&self, tr: Transform) -> Segment {
        dispatch!(self, curve => curve.transformed(tr))
    }

    fn nondegenerate_segments(&self) -> Vec<Segment> {
        dispatch!(self, curve => curve.nondegenerate_segments())
    }

    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment> {
        dispatch!(self, curve => curve.stroke_left(line_width))
    }

    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment> {
        dispatch!(self, curve => curve.stroke_right(line_width))
    }

    fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        dispatch!(self, curve => curve.intersection(ray))
    }

    fn winding_intersection(&self, ray: &Ray) -> i32 {
        dispatch!(self, curve => curve.winding_intersection(ray))
    }

    fn signed_area_fragment(&self) -> Scalar {
        dispatch!(self, curve => curve.signed_area_fragment())
    }

    fn arc_length(&self) -> Scalar {
        dispatch!(self, curve => curve.arc_length())
    }

    fn arc_length_between(&self, t0: Scalar, t1: Scalar) -> Scalar {
        dispatch!(self, curve => curve.arc_length_between(t0, t1))
    }

    fn t_at_length(&self, length: Scalar) -> Scalar {
        dispatch!(self, curve => curve.t_at_length(length))
    }

    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result {
        dispatch!(self, curve => curve.write_svg_fragment(out))
    }

    fn write_to_context(&self, ctx: &mut impl Context2d) {
        dispatch!(self, curve => curve.write_to_context(ctx))
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Quad> for Segment {
    fn from(quad: Quad) -> Self {
        Self::Quad(quad)
    }
}

impl From<Cubic> for Segment {
    fn from(cubic: Cubic) -> Self {
        Self::Cubic(cubic)
    }
}

impl From<Arc> for Segment {
    fn from(arc: Arc) -> Self {
        Self::Arc(arc)
    }
}

impl From<EllipArc> for Segment {
    fn from(arc: EllipArc) -> Self {
        Self::EllipArc(arc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EPSILON, assert_approx_eq};

    fn segments() -> Vec<Segment> {
        vec![
            Line::new((1.0, 2.0), (7.0, -3.0)).into(),
            Quad::new((0.0, 0.0), (8.0, 5.0), (4.0, 0.0)).into(),
            Cubic::new((3.0, 7.0), (2.0, 8.0), (0.0, 3.0), (6.0, 5.0)).into(),
            Arc::new((1.0, 1.0), 3.0, 0.5, 2.5, false).into(),
            Arc::new((1.0, 1.0), 3.0, 0.5, -2.5, true).into(),
            EllipArc::new((2.0, -1.0), 4.0, 2.0, 0.3, -1.0, 2.0, false).into(),
        ]
    }

    #[test]
    fn test_endpoints() {
        for segment in segments() {
            assert!(segment.at(0.0).is_close_to_eps(segment.start(), 1e-9));
            assert!(segment.at(1.0).is_close_to_eps(segment.end(), 1e-9));
            assert_approx_eq!(segment.start_tangent().length(), 1.0, 1e-9);
            assert_approx_eq!(segment.end_tangent().length(), 1.0, 1e-9);
        }
    }

    #[test]
    fn test_split_exactness() {
        for segment in segments() {
            for t in [0.25, 0.5, 0.8] {
                let (left, right) = segment.split_at(t);
                assert!(left.end().is_close_to_eps(right.start(), 1e-9));
                for index in 0..=8 {
                    let u = index as Scalar / 8.0;
                    let expected = segment.at(u * t);
                    assert!(
                        left.at(u).is_close_to_eps(expected, 1e-9),
                        "{:?} {:?} != {:?}",
                        segment,
                        left.at(u),
                        expected
                    );
                    let expected = segment.at(t + u * (1.0 - t));
                    assert!(right.at(u).is_close_to_eps(expected, 1e-9));
                }
            }
        }
    }

    #[test]
    fn test_bbox_contains_curve() {
        for segment in segments() {
            let bbox = segment.bbox().dilate(1e-9);
            for index in 0..=64 {
                assert!(bbox.contains(segment.at(index as Scalar / 64.0)));
            }
            for t in segment.interior_extrema() {
                assert!(t > 0.0 && t < 1.0);
            }
        }
    }

    #[test]
    fn test_reverse() {
        for segment in segments() {
            let reversed = segment.reverse();
            assert!(reversed.start().is_close_to_eps(segment.end(), 1e-9));
            assert!(reversed.end().is_close_to_eps(segment.start(), 1e-9));
            assert!(reversed.at(0.3).is_close_to_eps(segment.at(0.7), 1e-9));
        }
    }

    #[test]
    fn test_transformed() {
        let tr = Transform::identity()
            .translate(3.0, -2.0)
            .rotate(0.7)
            .scale(2.0, 0.5);
        for segment in segments() {
            let result = segment.transformed(tr);
            for index in 0..=8 {
                let t = index as Scalar / 8.0;
                assert!(
                    result.at(t).is_close_to_eps(tr.apply(segment.at(t)), 1e-9),
                    "{:?} -> {:?}",
                    segment,
                    result
                );
            }
        }
    }

    #[test]
    fn test_reparameterized() {
        for segment in segments() {
            let part = segment.reparameterized(0.5, 0.25);
            assert!(part.start().is_close_to_eps(segment.at(0.25), 1e-9));
            assert!(part.end().is_close_to_eps(segment.at(0.75), 1e-9));
        }
    }

    #[test]
    fn test_polar_to_cartesian() {
        let options = PiecewiseLinearOptions::default();

        // constant radius becomes an arc
        let line = Segment::from(Line::new((2.0, 0.0), (2.0, PI / 2.0)));
        let result = line.polar_to_cartesian(options);
        assert_eq!(result.len(), 1);
        let arc = result[0].to_arc().unwrap();
        assert!(arc.start().is_close_to_eps(Point::new(2.0, 0.0), 1e-9));
        assert!(arc.end().is_close_to_eps(Point::new(0.0, 2.0), 1e-9));

        // constant angle stays a line
        let line = Segment::from(Line::new((1.0, PI / 2.0), (3.0, PI / 2.0)));
        let result = line.polar_to_cartesian(options);
        assert_eq!(result.len(), 1);
        let line = result[0].to_line().unwrap();
        assert!(line.end().is_close_to_eps(Point::new(0.0, 3.0), 1e-9));

        // spiral is approximated with lines on the spiral
        let line = Segment::from(Line::new((1.0, 0.0), (2.0, PI)));
        let result = line.polar_to_cartesian(options);
        assert!(result.len() > 4);
        for segment in result.iter() {
            let point = segment.end();
            let radius = point.length();
            assert!(segment.to_line().is_some());
            assert!((1.0 - EPSILON..=2.0 + 1e-9).contains(&radius));
        }
    }

    #[test]
    fn test_accessors() {
        let segment = Segment::from(Quad::new((0.0, 0.0), (1.0, 1.0), (2.0, 0.0)));
        assert!(segment.to_quad().is_some());
        assert!(segment.to_line().is_none());
        assert!(segment.to_cubic().is_none());
        assert!(segment.to_arc().is_none());
        assert!(segment.to_elliptical_arc().is_none());
    }
}
