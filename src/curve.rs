//! All the things you need to handle bezier curves

use crate::{
    ArrayIter, BBox, Context2d, EPSILON, Point, Ray, Scalar, Segment, Transform,
    UNIT_ROOT_EPSILON, cubic_solve, points_collinear, quadratic_solve, svg_scalar_fmt, unit_roots,
};
use std::fmt;

pub type CurveRoots = ArrayIter<Scalar, 3>;
pub type CurveExtremities = ArrayIter<Scalar, 6>;

/// flatness of 0.05px gives good accuracy tradeoff
pub const DEFAULT_FLATNESS: Scalar = 0.05;

/// Number of samples used to approximate offset of cubic curves and elliptical arcs
pub const OFFSET_SAMPLES: usize = 32;

/// Depth of the subdivision used to approximate offset of quadratic curves
pub const QUAD_OFFSET_DEPTH: usize = 5;

/// Intersection of a ray with a curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the origin of the ray to the intersection point
    pub distance: Scalar,
    /// Intersection point
    pub point: Point,
    /// Unit normal of the curve at the intersection, facing the origin of the ray
    pub normal: Point,
    /// Winding contribution of the crossing `+1` or `-1`
    pub wind: i32,
    /// Curve parameter at the intersection point
    pub t: Scalar,
}

impl RayHit {
    /// Construct hit given curve `tangent` at the intersection `point`
    ///
    /// Returns `None` if tangent vanishes at the intersection.
    pub(crate) fn new(ray: &Ray, point: Point, tangent: Point, t: Scalar) -> Option<Self> {
        let tangent = tangent.normalize()?;
        let perp = tangent.normal();
        let normal = if perp.dot(ray.direction) > 0.0 {
            -perp
        } else {
            perp
        };
        let wind = if ray.direction.normal().dot(tangent) < 0.0 {
            1
        } else {
            -1
        };
        Some(Self {
            distance: (point - ray.position).length(),
            point,
            normal,
            wind,
            t,
        })
    }
}

/// Options of the adaptive subdivision used by `Curve::to_piecewise_linear`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiecewiseLinearOptions {
    /// Curve is always subdivided at least this number of times
    pub min_levels: usize,
    /// Curve is never subdivided more than this number of times
    pub max_levels: usize,
    /// Maximum allowed distance between mapped midpoint and the midpoint of the mapped chord
    pub distance_epsilon: Scalar,
}

impl Default for PiecewiseLinearOptions {
    fn default() -> Self {
        Self {
            min_levels: 0,
            max_levels: 10,
            distance_epsilon: 1e-4,
        }
    }
}

/// Set of operations common to all segments
pub trait Curve: Sized + Copy + Into<Segment> {
    /// Point at which curve starts
    fn start(&self) -> Point;

    /// Point at which curve ends
    fn end(&self) -> Point;

    /// Evaluate curve at parameter value `t` in (0.0..=1.0)
    fn at(&self, t: Scalar) -> Point;

    /// Derivative with respect to `t`, it is not normalized
    fn tangent_at(&self, t: Scalar) -> Point;

    /// Unit tangent at the start of the curve, in the direction of travel
    fn start_tangent(&self) -> Point;

    /// Unit tangent at the end of the curve, in the direction of travel
    fn end_tangent(&self) -> Point;

    /// Signed curvature, positive for curves turning towards the positive angle direction
    fn curvature_at(&self, t: Scalar) -> Scalar;

    /// Bounding box of the curve
    fn bbox(&self) -> BBox;

    /// Sorted values of parameter in `(0, 1)` at which x or y derivative is zero
    fn interior_extrema(&self) -> Vec<Scalar>;

    /// Optimized version of `Curve::split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        self.split_at(0.5)
    }

    /// Split the curve at prameter value `t`
    fn split_at(&self, t: Scalar) -> (Self, Self);

    /// Create subcurve specified starting at parameter value `a` and ending at value `b`
    fn cut(&self, a: Scalar, b: Scalar) -> Self;

    /// Same curve with parameter remapped as `t -> a * t + b`
    fn reparameterized(&self, a: Scalar, b: Scalar) -> Self {
        self.cut(b, a + b)
    }

    /// Identical curve but directed from end to start, instead of start to end.
    fn reverse(&self) -> Self;

    /// Apply affine transformation to the curve
    fn transformed(&self, tr: Transform) -> Segment;

    /// Decompose curve into the list of simpler non-degenerate segments
    fn nondegenerate_segments(&self) -> Vec<Segment>;

    /// Offset of the curve by `line_width / 2` to the left of the direction of travel
    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment>;

    /// Offset of the curve by `line_width / 2` to the right of the direction of travel,
    /// directed from the end to the start.
    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment>;

    /// All intersections of the ray with the curve
    fn intersection(&self, ray: &Ray) -> Vec<RayHit>;

    /// Sum of the winding contributions of all intersections with the ray
    fn winding_intersection(&self, ray: &Ray) -> i32 {
        self.intersection(ray).iter().map(|hit| hit.wind).sum()
    }

    /// Contribution of the curve to the signed area of a closed path it belongs to
    fn signed_area_fragment(&self) -> Scalar;

    /// Length of the curve
    fn arc_length(&self) -> Scalar {
        self.arc_length_between(0.0, 1.0)
    }

    /// Length of the curve between parameter values `t0` and `t1`
    fn arc_length_between(&self, t0: Scalar, t1: Scalar) -> Scalar {
        let (t0, t1) = if t0 > t1 { (t1, t0) } else { (t0, t1) };
        arc_length_rec(self, t0, t1, self.at(t0), self.at(t1), 0)
    }

    /// Parameter value at which length of the curve from the start reaches `length`
    fn t_at_length(&self, length: Scalar) -> Scalar {
        if length <= 0.0 {
            return 0.0;
        }
        if length >= self.arc_length() {
            return 1.0;
        }
        let (mut low, mut high) = (0.0, 1.0);
        for _ in 0..48 {
            let mid = (low + high) / 2.0;
            if self.arc_length_between(0.0, mid) < length {
                low = mid;
            } else {
                high = mid;
            }
        }
        (low + high) / 2.0
    }

    /// Convert curve to an iterator over line segments with desired flatness
    fn flatten(&self, tr: Transform, flatness: Scalar) -> CurveFlattenIter {
        CurveFlattenIter::new(self.transformed(tr), flatness)
    }

    /// Approximate the curve mapped with an arbitrary function by a list of lines
    fn to_piecewise_linear(
        &self,
        map: &impl Fn(Point) -> Point,
        options: PiecewiseLinearOptions,
    ) -> Vec<Line> {
        let mut lines = Vec::new();
        piecewise_linear_rec(
            *self,
            map,
            options,
            map(self.start()),
            map(self.end()),
            0,
            &mut lines,
        );
        lines
    }

    /// Write SVG path fragment (without initial move command)
    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result;

    /// SVG path fragment of the curve (without initial move command)
    fn svg_path_fragment(&self) -> String {
        let mut output = String::new();
        self.write_svg_fragment(&mut output)
            .expect("failed in memory write");
        output
    }

    /// Issue drawing commands corresponding to this curve, assumes current point is `start`
    fn write_to_context(&self, ctx: &mut impl Context2d);
}

fn arc_length_rec(
    curve: &impl Curve,
    t0: Scalar,
    t1: Scalar,
    p0: Point,
    p1: Point,
    depth: usize,
) -> Scalar {
    let t_mid = (t0 + t1) / 2.0;
    let p_mid = curve.at(t_mid);
    let chord = p0.dist(p1);
    let poly = p0.dist(p_mid) + p_mid.dist(p1);
    let error = poly - chord;
    if (depth >= 3 && error <= 1e-6 * poly.max(EPSILON)) || depth >= 16 {
        poly + error / 3.0
    } else {
        arc_length_rec(curve, t0, t_mid, p0, p_mid, depth + 1)
            + arc_length_rec(curve, t_mid, t1, p_mid, p1, depth + 1)
    }
}

fn piecewise_linear_rec<C: Curve>(
    curve: C,
    map: &impl Fn(Point) -> Point,
    options: PiecewiseLinearOptions,
    p0: Point,
    p1: Point,
    level: usize,
    out: &mut Vec<Line>,
) {
    let p_mid = map(curve.at(0.5));
    let split = level < options.min_levels
        || (level < options.max_levels
            && (p_mid - 0.5 * (p0 + p1)).length() > options.distance_epsilon);
    if split {
        let left = curve.reparameterized(0.5, 0.0);
        let right = curve.reparameterized(0.5, 0.5);
        piecewise_linear_rec(left, map, options, p0, p_mid, level + 1, out);
        piecewise_linear_rec(right, map, options, p_mid, p1, level + 1, out);
    } else {
        out.push(Line([p0, p1]));
    }
}

/// Iterator over line segments approximating a curve
pub struct CurveFlattenIter {
    flatness: Scalar,
    stack: Vec<Segment>,
}

impl CurveFlattenIter {
    pub fn new(segment: impl Into<Segment>, flatness: Scalar) -> Self {
        Self {
            flatness: 16.0 * flatness * flatness,
            stack: vec![segment.into()],
        }
    }
}

impl Iterator for CurveFlattenIter {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let segment = self.stack.pop()?;
            let flatness = match segment {
                Segment::Line(line) => return Some(line),
                Segment::Quad(quad) => quad.flatness(),
                Segment::Cubic(cubic) => cubic.flatness(),
                Segment::Arc(arc) => {
                    let cubics: Vec<_> = arc.to_cubics().collect();
                    self.stack.extend(cubics.into_iter().rev().map(Segment::from));
                    continue;
                }
                Segment::EllipArc(arc) => {
                    let cubics: Vec<_> = arc.to_cubics().collect();
                    self.stack.extend(cubics.into_iter().rev().map(Segment::from));
                    continue;
                }
            };
            if flatness < self.flatness {
                return Some(Line([segment.start(), segment.end()]));
            }
            let (s0, s1) = segment.split();
            self.stack.push(s1);
            self.stack.push(s0);
        }
    }
}

/// Sort and deduplicate parameter values, keeping only ones inside `(0, 1)`
pub(crate) fn interior_sorted(ts: impl IntoIterator<Item = Scalar>) -> Vec<Scalar> {
    let mut result: Vec<Scalar> = ts.into_iter().filter(|t| *t > 0.0 && *t < 1.0).collect();
    result.sort_by(|a, b| a.total_cmp(b));
    result.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    result
}

/// Curvature at the first control point of a bezier curve of provided `degree`
fn bezier_start_curvature(p0: Point, p1: Point, p2: Point, degree: Scalar) -> Scalar {
    let d10 = p1 - p0;
    let a = d10.length();
    if a < EPSILON {
        return 0.0;
    }
    let h = d10.cross(p2 - p1) / a;
    h * (degree - 1.0) / (degree * a * a)
}

/// Offset approximated with lines connecting offset samples of the curve
pub(crate) fn sampled_offset(curve: &impl Curve, distance: Scalar) -> Vec<Segment> {
    let last = (OFFSET_SAMPLES - 1) as Scalar;
    let points: Vec<Point> = (0..OFFSET_SAMPLES)
        .map(|index| {
            let t = index as Scalar / last;
            let tangent = match curve.tangent_at(t).normalize() {
                Some(tangent) => tangent,
                None if t < 0.5 => curve.start_tangent(),
                None => curve.end_tangent(),
            };
            curve.at(t) + distance * tangent.normal()
        })
        .collect();
    points
        .windows(2)
        .map(|pair| Line([pair[0], pair[1]]).into())
        .collect()
}

/// Right offset is a reversed left offset at the negated distance
pub(crate) fn reversed_offset(segments: Vec<Segment>) -> Vec<Segment> {
    segments.iter().rev().map(|segment| segment.reverse()).collect()
}

/// Distance from the line through the ray, relative to the distance from its origin,
/// below which a point counts as lying on the line
const RAY_LINE_EPSILON: Scalar = 1e-9;

/// Parameter step used to find out on which side a curve goes when its tangent is parallel to the ray
const RAY_SIDE_STEP: Scalar = 1e-3;

/// Whether the point lies strictly on the positive side of the line through the ray,
/// that is `direction.cross(point - position) > 0`
///
/// Points on the line belong to the negative side, hence a path passing through a vertex
/// on the ray crosses it only if the neighbouring segments lie on different sides.
fn ray_side(ray: &Ray, point: Point) -> bool {
    let offset = point - ray.position;
    ray.direction.cross(offset) > RAY_LINE_EPSILON * (1.0 + offset.length())
}

fn ray_on_line(ray: &Ray, point: Point) -> bool {
    let offset = point - ray.position;
    ray.direction.cross(offset).abs() <= RAY_LINE_EPSILON * (1.0 + offset.length())
}

fn ray_in_front(ray: &Ray, point: Point) -> bool {
    (point - ray.position).dot(ray.direction) >= 0.0
}

/// Side of the ray the curve moves to when leaving parameter `t` with the `step` sign
fn ray_side_towards(curve: &impl Curve, ray: &Ray, t: Scalar, step: Scalar) -> bool {
    let tangent = step.signum() * curve.tangent_at(t);
    match tangent.normalize() {
        Some(tangent) if ray.direction.cross(tangent).abs() > RAY_LINE_EPSILON => {
            ray.direction.cross(tangent) > 0.0
        }
        _ => ray_side(ray, curve.at((t + step).clamp(0.0, 1.0))),
    }
}

fn curve_ray_hit(curve: &impl Curve, ray: &Ray, t: Scalar, positive: bool) -> Option<RayHit> {
    let tangent = match curve.tangent_at(t).normalize() {
        Some(tangent) => tangent,
        None => curve.at((t + RAY_SIDE_STEP).min(1.0)) - curve.at((t - RAY_SIDE_STEP).max(0.0)),
    };
    let mut hit = RayHit::new(ray, curve.at(t), tangent, t)?;
    hit.wind = if positive { 1 } else { -1 };
    Some(hit)
}

/// Crossings of the ray by a curve, given parameters at which the curve meets the line
/// through the ray
///
/// Only parameters where the curve moves from one side of the ray to the other are
/// reported, touching points are skipped. End points follow the same rule as the vertices
/// of polylines (see [ray_side]), so crossings through the joints of adjacent segments are
/// counted exactly once.
pub(crate) fn curve_ray_hits(
    curve: &impl Curve,
    ray: &Ray,
    ts: impl IntoIterator<Item = Scalar>,
) -> Vec<RayHit> {
    let mut hits = Vec::new();
    let (mut near_start, mut near_end) = (false, false);
    for t in ts {
        if t < UNIT_ROOT_EPSILON {
            near_start = true;
        } else if t > 1.0 - UNIT_ROOT_EPSILON {
            near_end = true;
        } else if ray_in_front(ray, curve.at(t)) {
            let before = ray_side_towards(curve, ray, t, -RAY_SIDE_STEP);
            let after = ray_side_towards(curve, ray, t, RAY_SIDE_STEP);
            if before != after {
                hits.extend(curve_ray_hit(curve, ray, t, after));
            }
        }
    }

    let start = curve.start();
    if (near_start || ray_on_line(ray, start)) && ray_in_front(ray, start) {
        let after = ray_side_towards(curve, ray, 0.0, RAY_SIDE_STEP);
        if ray_side(ray, start) != after {
            hits.extend(curve_ray_hit(curve, ray, 0.0, after));
        }
    }
    let end = curve.end();
    if (near_end || ray_on_line(ray, end)) && ray_in_front(ray, end) {
        let before = ray_side_towards(curve, ray, 1.0, -RAY_SIDE_STEP);
        let after = ray_side(ray, end);
        if before != after {
            hits.extend(curve_ray_hit(curve, ray, 1.0, after));
        }
    }
    hits
}

/// Transformation which moves ray to the positive x-axis
fn ray_horizontal(ray: &Ray) -> Transform {
    Transform::make_horizontal(Line([ray.position, ray.position + ray.direction]))
}

pub(crate) fn write_points(out: &mut impl fmt::Write, cmd: &str, points: &[Point]) -> fmt::Result {
    out.write_str(cmd)?;
    for point in points {
        out.write_char(' ')?;
        svg_scalar_fmt(out, point.x())?;
        out.write_char(' ')?;
        svg_scalar_fmt(out, point.y())?;
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Line
// -----------------------------------------------------------------------------

/// Line segment curve
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line(pub [Point; 2]);

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Line([p0, p1]) = self;
        write!(f, "Line {:?} {:?}", p0, p1)
    }
}

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    /// Length of the line
    pub fn length(&self) -> Scalar {
        let Self([p0, p1]) = self;
        p0.dist(*p1)
    }

    /// Start and end points of the line
    pub fn points(&self) -> [Point; 2] {
        self.0
    }

    /// Direction vector associated with the line segment
    pub fn direction(&self) -> Point {
        self.end() - self.start()
    }

    /// Apply affine transformation to the line
    pub fn transform(&self, tr: Transform) -> Self {
        let Line([p0, p1]) = self;
        Self([tr.apply(*p0), tr.apply(*p1)])
    }

    /// Find roots of the equation `curve(t)_y = 0`
    pub fn roots(&self) -> CurveRoots {
        let mut result = CurveRoots::new();
        let Self([Point([_, y0]), Point([_, y1])]) = self;
        if (y0 - y1).abs() > EPSILON {
            let t = y0 / (y0 - y1);
            if (0.0..=1.0).contains(&t) {
                result.push(t);
            }
        }
        result
    }
}

impl Curve for Line {
    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[1]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = self;
        (1.0 - t) * p0 + t * p1
    }

    fn tangent_at(&self, _t: Scalar) -> Point {
        self.direction()
    }

    fn start_tangent(&self) -> Point {
        self.direction().normalize().unwrap_or(Point::ZERO)
    }

    fn end_tangent(&self) -> Point {
        self.start_tangent()
    }

    fn curvature_at(&self, _t: Scalar) -> Scalar {
        0.0
    }

    fn bbox(&self) -> BBox {
        let Self([p0, p1]) = *self;
        BBox::new(p0, p1)
    }

    fn interior_extrema(&self) -> Vec<Scalar> {
        Vec::new()
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        let Self([p0, p1]) = self;
        let mid = self.at(t);
        (Self([*p0, mid]), Self([mid, *p1]))
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        Self([self.at(a), self.at(b)])
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1]) = *self;
        Self([p1, p0])
    }

    fn transformed(&self, tr: Transform) -> Segment {
        self.transform(tr).into()
    }

    fn nondegenerate_segments(&self) -> Vec<Segment> {
        let Self([p0, p1]) = *self;
        if p0 == p1 {
            Vec::new()
        } else {
            vec![(*self).into()]
        }
    }

    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment> {
        let Self([p0, p1]) = *self;
        match self.direction().normalize() {
            None => Vec::new(),
            Some(tangent) => {
                let offset = -line_width / 2.0 * tangent.normal();
                vec![Line([p0 + offset, p1 + offset]).into()]
            }
        }
    }

    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment> {
        let Self([p0, p1]) = *self;
        match self.direction().normalize() {
            None => Vec::new(),
            Some(tangent) => {
                let offset = line_width / 2.0 * tangent.normal();
                vec![Line([p1 + offset, p0 + offset]).into()]
            }
        }
    }

    fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        let Self([start, end]) = *self;
        if ray_side(ray, start) == ray_side(ray, end) {
            return Vec::new();
        }
        let s0 = ray.direction.cross(start - ray.position);
        let s1 = ray.direction.cross(end - ray.position);
        let t = (s0 / (s0 - s1)).clamp(0.0, 1.0);
        let point = self.at(t);
        if !ray_in_front(ray, point) {
            return Vec::new();
        }
        RayHit::new(ray, point, end - start, t).into_iter().collect()
    }

    fn signed_area_fragment(&self) -> Scalar {
        let Self([p0, p1]) = *self;
        p0.cross(p1) / 2.0
    }

    fn arc_length(&self) -> Scalar {
        self.length()
    }

    fn arc_length_between(&self, t0: Scalar, t1: Scalar) -> Scalar {
        (t1 - t0).abs() * self.length()
    }

    fn t_at_length(&self, length: Scalar) -> Scalar {
        let total = self.length();
        if total < EPSILON {
            0.0
        } else {
            (length / total).clamp(0.0, 1.0)
        }
    }

    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result {
        write_points(out, "L", &[self.end()])
    }

    fn write_to_context(&self, ctx: &mut impl Context2d) {
        ctx.line_to(self.end());
    }
}

// -----------------------------------------------------------------------------
// Quadratic bezier curve
// -----------------------------------------------------------------------------

/// Quadratic bezier curve
///
/// Polynomial form:
/// `(1 - t) ^ 2 * p0 + 2 * (1 - t) * t * p1 + t ^ 2 * p2`
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quad(pub [Point; 3]);

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Quad([p0, p1, p2]) = self;
        write!(f, "Quad {:?} {:?} {:?}", p0, p1, p2)
    }
}

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }

    pub fn points(&self) -> [Point; 3] {
        self.0
    }

    /// Polar form of the curve, symmetric in its arguments and `blossom(t, t) == at(t)`
    pub fn blossom(&self, u: Scalar, v: Scalar) -> Point {
        let Self([p0, p1, p2]) = *self;
        p0.lerp(p1, u).lerp(p1.lerp(p2, u), v)
    }

    /// Control point of the curve
    pub fn control(&self) -> Point {
        self.0[1]
    }

    /// Lines tangent to the start and the end of the curve, skipping repeated points
    pub fn ends(&self) -> (Line, Line) {
        let Self([p0, p1, p2]) = *self;
        let start = Line::new(p0, p1);
        let end = Line::new(p1, p2);
        if p0.is_close_to(p1) {
            (end, end)
        } else if p1.is_close_to(p2) {
            (start, start)
        } else {
            (start, end)
        }
    }

    /// Find smooth point used by SVG parser
    pub fn smooth(&self) -> Point {
        let Quad([_p0, p1, p2]) = self;
        2.0 * p2 - *p1
    }

    /// Apply affine transformation to the curve
    pub fn transform(&self, tr: Transform) -> Self {
        let Quad([p0, p1, p2]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2)])
    }

    /// Flattness criteria for the quad curve
    ///
    /// It is equal to `f = max d(t) where d(t) = |q(t) - l(t)|, l(t) = (1 - t) * p0 + t * p2`
    /// for q(t) bezier2 curve with p{0..2} control points, in other words maximum distance
    /// from parametric line to bezier2 curve for the same parameter t.
    ///
    /// Line can be represented as bezier2 curve, if `p1 = (p0 + p2) / 2.0`.
    /// Grouping polynomial coofficients:
    ///     q(t) = t^2 p2 + 2 (1 - t) t p1 + (1 - t)^2 p0
    ///     l(t) = t^2 p2 + (1 - t) t (p0 + p2) + (1 - t)^2 p0
    ///     d(t) = |q(t) - l(t)| = (1 - t) t |2 * p1 - p0 - p2|
    ///     f    = 1 / 4 * | 2 p1 - p0 - p2 |
    ///     f^2  = 1/16 |2 * p1 - p0 - p2|^2
    ///
    /// This function actually returns `16 * f^2`
    pub fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        let Point([x, y]) = 2.0 * p1 - p0 - p2;
        x * x + y * y
    }

    /// Find roots of the equation `curve(t)_y = 0`
    pub fn roots(&self) -> CurveRoots {
        let Self([Point([_, y0]), Point([_, y1]), Point([_, y2])]) = *self;
        let a = y0 - 2.0 * y1 + y2;
        let b = -2.0 * y0 + 2.0 * y1;
        let c = y0;
        unit_roots(quadratic_solve(a, b, c))
    }

    /// Find all extermities of the curve `curve'(t)_x = 0 || curve'(t)_y = 0`
    pub fn extremities(&self) -> CurveExtremities {
        let mut result = CurveExtremities::new();
        let Self([p0, p1, p2]) = self;
        let Point([a0, a1]) = *p2 - 2.0 * p1 + *p0;
        let Point([b0, b1]) = *p1 - *p0;
        if a0.abs() > EPSILON {
            let t0 = -b0 / a0;
            if (0.0..=1.0).contains(&t0) {
                result.push(t0)
            }
        }
        if a1.abs() > EPSILON {
            let t1 = -b1 / a1;
            if (0.0..=1.0).contains(&t1) {
                result.push(t1)
            }
        }
        result
    }

    /// Quad with every control point moved by `distance` along the normal of its chord
    fn approximate_offset(&self, distance: Scalar) -> Self {
        let Self([p0, p1, p2]) = *self;
        let offset =
            |vector: Point| distance * vector.normal().normalize().unwrap_or(Point::ZERO);
        let start = if p0 == p1 { p2 - p0 } else { p1 - p0 };
        let end = if p2 == p1 { p2 - p0 } else { p2 - p1 };
        Self([p0 + offset(start), p1 + offset(p2 - p0), p2 + offset(end)])
    }
}

/// Offset quad by splitting it into `2 ^ depth` pieces, each offset separately
fn quad_offset_rec(quad: Quad, distance: Scalar, depth: usize, out: &mut Vec<Segment>) {
    if depth == 0 {
        out.push(quad.approximate_offset(distance).into());
    } else {
        let (q0, q1) = quad.split();
        quad_offset_rec(q0, distance, depth - 1, out);
        quad_offset_rec(q1, distance, depth - 1, out);
    }
}

impl Curve for Quad {
    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[2]
    }

    fn at(&self, t: Scalar) -> Point {
        // at(t) =
        //   (1 - t) ^ 2 * p0 +
        //   2 * (1 - t) * t * p1 +
        //   t ^ 2 * p2
        let Self([p0, p1, p2]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        t_2 * p0 + 2.0 * t1 * t_1 * p1 + t2 * p2
    }

    fn tangent_at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2]) = *self;
        2.0 * (1.0 - t) * (p1 - p0) + 2.0 * t * (p2 - p1)
    }

    fn start_tangent(&self) -> Point {
        let (start, _) = self.ends();
        start.start_tangent()
    }

    fn end_tangent(&self) -> Point {
        let (_, end) = self.ends();
        end.end_tangent()
    }

    fn curvature_at(&self, t: Scalar) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        if t <= 0.0 {
            bezier_start_curvature(p0, p1, p2, 2.0)
        } else if t >= 1.0 {
            -bezier_start_curvature(p2, p1, p0, 2.0)
        } else {
            self.split_at(t).0.curvature_at(1.0)
        }
    }

    fn bbox(&self) -> BBox {
        let Self([p0, p1, p2]) = self;
        let bbox = BBox::new(*p0, *p2);
        if bbox.contains(*p1) {
            return bbox;
        }
        self.extremities()
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }

    fn interior_extrema(&self) -> Vec<Scalar> {
        interior_sorted(self.extremities())
    }

    /// Optimized version of `split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2]) = *self;
        let mid = 0.25 * (p0 + 2.0 * p1 + p2);
        (
            Self([p0, 0.5 * (p0 + p1), mid]),
            Self([mid, 0.5 * (p1 + p2), p2]),
        )
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        // https://pomax.github.io/bezierinfo/#matrixsplit
        let Self([p0, p1, p2]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let mid = t_2 * p0 + 2.0 * t1 * t_1 * p1 + t2 * p2;
        (
            Self([p0, t_1 * p0 + t * p1, mid]),
            Self([mid, t_1 * p1 + t * p2, p2]),
        )
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        Self([self.blossom(a, a), self.blossom(a, b), self.blossom(b, b)])
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1, p2]) = *self;
        Self([p2, p1, p0])
    }

    fn transformed(&self, tr: Transform) -> Segment {
        self.transform(tr).into()
    }

    fn nondegenerate_segments(&self) -> Vec<Segment> {
        let Self([start, control, end]) = *self;
        let start_is_control = start == control;
        let end_is_control = end == control;
        if start == end && start_is_control {
            Vec::new()
        } else if start == end {
            let mid = self.at(0.5);
            vec![Line([start, mid]).into(), Line([mid, end]).into()]
        } else if points_collinear(start, control, end, EPSILON) {
            if start_is_control || end_is_control {
                return vec![Line([start, end]).into()];
            }
            // extremum of the projection onto the chord, normalized to `[0, 1]`
            let delta = end - start;
            let projection = (control - start).dot(delta) / delta.length_squared();
            let t = -projection / (1.0 - 2.0 * projection);
            if t.is_finite() && t > 0.0 && t < 1.0 {
                let point = self.at(t);
                let mut segments = Line([start, point]).nondegenerate_segments();
                segments.extend(Line([point, end]).nondegenerate_segments());
                segments
            } else {
                vec![Line([start, end]).into()]
            }
        } else {
            vec![(*self).into()]
        }
    }

    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(1 << QUAD_OFFSET_DEPTH);
        quad_offset_rec(*self, -line_width / 2.0, QUAD_OFFSET_DEPTH, &mut segments);
        segments
    }

    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(1 << QUAD_OFFSET_DEPTH);
        quad_offset_rec(*self, line_width / 2.0, QUAD_OFFSET_DEPTH, &mut segments);
        reversed_offset(segments)
    }

    fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        curve_ray_hits(self, ray, self.transform(ray_horizontal(ray)).roots())
    }

    fn signed_area_fragment(&self) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        (2.0 * p0.cross(p1) + 2.0 * p1.cross(p2) + p0.cross(p2)) / 6.0
    }

    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let Self([_, p1, p2]) = *self;
        write_points(out, "Q", &[p1, p2])
    }

    fn write_to_context(&self, ctx: &mut impl Context2d) {
        let Self([_, p1, p2]) = *self;
        ctx.quadratic_curve_to(p1, p2);
    }
}

// -----------------------------------------------------------------------------
// Cubic bezier curve
// -----------------------------------------------------------------------------

/// Cubic bezier curve
///
/// Polynomial form:
/// `(1 - t) ^ 3 * p0 + 3 * (1 - t) ^ 2 * t * p1 + 3 * (1 - t) * t ^ 2 * p2 + t ^ 3 * p3`
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cubic(pub [Point; 4]);

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cubic([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {:?} {:?} {:?} {:?}", p0, p1, p2, p3)
    }
}

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    /// Polar form of the curve, symmetric in its arguments and `blossom(t, t, t) == at(t)`
    pub fn blossom(&self, u: Scalar, v: Scalar, w: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = *self;
        let (q0, q1, q2) = (p0.lerp(p1, u), p1.lerp(p2, u), p2.lerp(p3, u));
        let (r0, r1) = (q0.lerp(q1, v), q1.lerp(q2, v));
        r0.lerp(r1, w)
    }

    /// Lines tangent to the start and the end of the curve, skipping repeated points
    pub fn ends(&self) -> (Line, Line) {
        let ps = self.points();
        let mut start = 0;
        for i in 0..3 {
            if !ps[i].is_close_to(ps[i + 1]) {
                start = i;
                break;
            }
        }
        let mut end = 0;
        for i in (1..4).rev() {
            if !ps[i].is_close_to(ps[i - 1]) {
                end = i;
                break;
            }
        }
        if end == 0 {
            end = 1;
        }
        (
            Line::new(ps[start], ps[start + 1]),
            Line::new(ps[end - 1], ps[end]),
        )
    }

    /// Find smooth point used by SVG parser
    pub fn smooth(&self) -> Point {
        let Cubic([_p0, _p1, p2, p3]) = self;
        2.0 * p3 - *p2
    }

    /// Apply affine transformation to the curve
    pub fn transform(&self, tr: Transform) -> Self {
        let Cubic([p0, p1, p2, p3]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2), tr.apply(*p3)])
    }

    /// Flattness criteria for the cubic curve
    /// This function actually returns `16 * flatness^2`
    ///
    /// It is equal to `f = max d(t) where d(t) = |c(t) - l(t)|, l(t) = (1 - t) * c0 + t * c3`
    /// for c(t) bezier3 curve with c{0..3} control points, in other words maximum distance
    /// from parametric line to bezier3 curve for the same parameter t. It is shown in the article
    /// that:
    ///     f^2 <= 1/16 (max{u_x^2, v_x^2} + max{u_y^2, v_y^2})
    /// where:
    ///     u = 3 * b1 - 2 * b0 - b3
    ///     v = 3 * b2 - b0 - 2 * b3
    /// `f == 0` means completely flat so estimating upper bound is sufficient as spliting more
    /// than needed is not a problem for rendering.
    ///
    /// [Linear Approximation of Bezier Curve](https://hcklbrrfnn.files.wordpress.com/2012/08/bez.pdf)
    pub fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        let u = 3.0 * p1 - 2.0 * p0 - p3;
        let v = 3.0 * p2 - p0 - 2.0 * p3;
        (u.x() * u.x()).max(v.x() * v.x()) + (u.y() * u.y()).max(v.y() * v.y())
    }

    /// Find roots of the equation `curve(t)_y = 0`
    pub fn roots(&self) -> CurveRoots {
        let Self([Point([_, y0]), Point([_, y1]), Point([_, y2]), Point([_, y3])]) = *self;
        let a = -y0 + 3.0 * y1 - 3.0 * y2 + y3;
        let b = 3.0 * y0 - 6.0 * y1 + 3.0 * y2;
        let c = -3.0 * y0 + 3.0 * y1;
        let d = y0;
        unit_roots(cubic_solve(a, b, c, d))
    }

    /// Find all extermities of the curve `curve'(t)_x = 0 || curve'(t)_y = 0`
    pub fn extremities(&self) -> CurveExtremities {
        let Self([p0, p1, p2, p3]) = *self;
        let Point([a0, a1]) = -1.0 * p0 + 3.0 * p1 - 3.0 * p2 + 1.0 * p3;
        let Point([b0, b1]) = 2.0 * p0 - 4.0 * p1 + 2.0 * p2;
        let Point([c0, c1]) = -1.0 * p0 + p1;

        // Solve for `curve'(t)_x = 0 || curve'(t)_y = 0`
        unit_roots(quadratic_solve(a0, b0, c0).chain(quadratic_solve(a1, b1, c1)))
    }

    /// Parameter value of the cusp, a point where the tangent vanishes
    ///
    /// With polynomial form `a t^3 + b t^2 + c t + d` the tangent `3 a t^2 + 2 b t + c`
    /// can only vanish where its component along `a.normal()` vanishes, that is at
    /// `t = -(a⊥·c) / (2 a⊥·b)`.
    pub fn cusp(&self) -> Option<Scalar> {
        let Self([p0, p1, p2, p3]) = *self;
        let a = -1.0 * p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let b = 3.0 * p0 - 6.0 * p1 + 3.0 * p2;
        let c = -3.0 * p0 + 3.0 * p1;
        let a_perp = a.normal();
        let denom = a_perp.dot(b);
        if denom.abs() < EPSILON {
            return None;
        }
        let t = -0.5 * a_perp.dot(c) / denom;
        if (0.0..=1.0).contains(&t) && self.tangent_at(t).length() < 1e-7 {
            Some(t)
        } else {
            None
        }
    }

    /// Quadratic curve equal to this one, if the degree can be reduced within `eps`
    pub fn degree_reduced(&self, eps: Scalar) -> Option<Quad> {
        let Self([p0, p1, p2, p3]) = *self;
        let control_a = (3.0 * p1 - p0) * 0.5;
        let control_b = (3.0 * p2 - p3) * 0.5;
        if (control_a - control_b).length_squared() <= eps {
            Some(Quad([p0, 0.5 * (control_a + control_b), p3]))
        } else {
            None
        }
    }

    /// Quad sharing end points, with the control point averaged from both ends
    fn averaged_quad(&self) -> Quad {
        let Self([p0, p1, p2, p3]) = *self;
        let control_a = (3.0 * p1 - p0) * 0.5;
        let control_b = (3.0 * p2 - p3) * 0.5;
        Quad([p0, 0.5 * (control_a + control_b), p3])
    }
}

impl Curve for Cubic {
    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[3]
    }

    fn at(&self, t: Scalar) -> Point {
        // at(t) =
        //   (1 - t) ^ 3 * p0 +
        //   3 * (1 - t) ^ 2 * t * p1 +
        //   3 * (1 - t) * t ^ 2 * p2 +
        //   t ^ 3 * p3
        let Self([p0, p1, p2, p3]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3
    }

    fn tangent_at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = *self;
        let t_1 = 1.0 - t;
        3.0 * (t_1 * t_1 * (p1 - p0) + 2.0 * t * t_1 * (p2 - p1) + t * t * (p3 - p2))
    }

    fn start_tangent(&self) -> Point {
        let (start, _) = self.ends();
        start.start_tangent()
    }

    fn end_tangent(&self) -> Point {
        let (_, end) = self.ends();
        end.end_tangent()
    }

    fn curvature_at(&self, t: Scalar) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        if t <= 0.0 {
            bezier_start_curvature(p0, p1, p2, 3.0)
        } else if t >= 1.0 {
            -bezier_start_curvature(p3, p2, p1, 3.0)
        } else {
            self.split_at(t).0.curvature_at(1.0)
        }
    }

    fn bbox(&self) -> BBox {
        let Self([p0, p1, p2, p3]) = self;
        let bbox = BBox::new(*p0, *p3);
        if bbox.contains(*p1) && bbox.contains(*p2) {
            return bbox;
        }
        self.extremities()
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }

    fn interior_extrema(&self) -> Vec<Scalar> {
        interior_sorted(self.extremities())
    }

    /// Optimized version of `split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let mid = 0.125 * p0 + 0.375 * p1 + 0.375 * p2 + 0.125 * p3;
        let c0 = Self([
            p0,
            0.5 * p0 + 0.5 * p1,
            0.25 * p0 + 0.5 * p1 + 0.25 * p2,
            mid,
        ]);
        let c1 = Self([
            mid,
            0.25 * p1 + 0.5 * p2 + 0.25 * p3,
            0.5 * p2 + 0.5 * p3,
            p3,
        ]);
        (c0, c1)
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        // https://pomax.github.io/bezierinfo/#matrixsplit
        let Self([p0, p1, p2, p3]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        let mid = t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3;
        let c0 = Self([
            *p0,
            t_1 * p0 + t * p1,
            t_2 * p0 + 2.0 * t * t_1 * p1 + t2 * p2,
            mid,
        ]);
        let c1 = Self([
            mid,
            t_2 * p1 + 2.0 * t * t_1 * p2 + t2 * p3,
            t_1 * p2 + t * p3,
            *p3,
        ]);
        (c0, c1)
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        Self([
            self.blossom(a, a, a),
            self.blossom(a, a, b),
            self.blossom(a, b, b),
            self.blossom(b, b, b),
        ])
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1, p2, p3]) = *self;
        Self([p3, p2, p1, p0])
    }

    fn transformed(&self, tr: Transform) -> Segment {
        self.transform(tr).into()
    }

    fn nondegenerate_segments(&self) -> Vec<Segment> {
        let Self([start, control1, control2, end]) = *self;
        if start == end && start == control1 && start == control2 {
            return Vec::new();
        }
        if let Some(t) = self.cusp() {
            let (c0, c1) = self.split_at(t);
            return vec![c0.averaged_quad().into(), c1.averaged_quad().into()];
        }
        if let Some(quad) = self.degree_reduced(1e-9) {
            return quad.nondegenerate_segments();
        }
        if points_collinear(start, control1, end, EPSILON)
            && points_collinear(start, control2, end, EPSILON)
        {
            // monotone pieces between the points where the curve turns back
            let mut segments = Vec::new();
            let mut last = start;
            for t in self.interior_extrema() {
                let point = self.at(t);
                segments.extend(Line([last, point]).nondegenerate_segments());
                last = point;
            }
            segments.extend(Line([last, end]).nondegenerate_segments());
            return segments;
        }
        vec![(*self).into()]
    }

    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment> {
        sampled_offset(self, -line_width / 2.0)
    }

    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment> {
        reversed_offset(sampled_offset(self, line_width / 2.0))
    }

    fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        curve_ray_hits(self, ray, self.transform(ray_horizontal(ray)).roots())
    }

    fn signed_area_fragment(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        (6.0 * p0.cross(p1)
            + 3.0 * p0.cross(p2)
            + p0.cross(p3)
            + 3.0 * p1.cross(p2)
            + 3.0 * p1.cross(p3)
            + 6.0 * p2.cross(p3))
            / 20.0
    }

    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let Self([_, p1, p2, p3]) = *self;
        write_points(out, "C", &[p1, p2, p3])
    }

    fn write_to_context(&self, ctx: &mut impl Context2d) {
        let Self([_, p1, p2, p3]) = *self;
        ctx.bezier_curve_to(p1, p2, p3);
    }
}

impl From<Quad> for Cubic {
    fn from(quad: Quad) -> Self {
        let Quad([p0, p1, p2]) = quad;
        Self([
            p0,
            (1.0 / 3.0) * p0 + (2.0 / 3.0) * p1,
            (2.0 / 3.0) * p1 + (1.0 / 3.0) * p2,
            p2,
        ])
    }
}
