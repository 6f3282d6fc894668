use crate::{
    ArrayIter, BBox, Context2d, Cubic, Curve, EPSILON, PI, Point, Ray, RayHit, Scalar, Segment,
    Transform, curve::curve_ray_hits, curve::interior_sorted, curve::reversed_offset,
    curve::sampled_offset, curve::write_points, modulo_between_down, modulo_between_up,
    svg_scalar_fmt,
};
use std::fmt;

/// Arcs sweeping at least `2 * PI - SVG_FULL_CIRCLE_EPSILON` are written to SVG as two arc commands
pub const SVG_FULL_CIRCLE_EPSILON: Scalar = 0.01;

const TAU: Scalar = 2.0 * PI;

/// Panic if the arc sweeps more than a full turn against its direction
fn assert_sweep(start_angle: Scalar, end_angle: Scalar, anticlockwise: bool) {
    assert!(
        !((!anticlockwise && end_angle - start_angle <= -TAU)
            || (anticlockwise && start_angle - end_angle <= -TAU)),
        "arcs sweeping more than a full turn are not supported: start={} end={} anticlockwise={}",
        start_angle,
        end_angle,
        anticlockwise,
    );
}

/// End angle such that `t` in `[0, 1]` moves monotonically from the start angle to it
fn actual_end_angle(start_angle: Scalar, end_angle: Scalar, anticlockwise: bool) -> Scalar {
    if start_angle == end_angle {
        start_angle
    } else if !anticlockwise && end_angle - start_angle >= TAU {
        start_angle + TAU
    } else if anticlockwise && start_angle - end_angle >= TAU {
        start_angle - TAU
    } else if !anticlockwise && end_angle > start_angle {
        end_angle
    } else if anticlockwise && end_angle < start_angle {
        end_angle
    } else if !anticlockwise {
        modulo_between_up(end_angle, start_angle, start_angle + TAU)
    } else {
        modulo_between_down(end_angle, start_angle - TAU, start_angle)
    }
}

/// Angular parametrization shared by circular and elliptical arcs
#[derive(Debug, Clone, Copy)]
struct Sweep {
    start: Scalar,
    end: Scalar,
    anticlockwise: bool,
}

impl Sweep {
    fn new(start: Scalar, end: Scalar, anticlockwise: bool) -> Self {
        Self {
            start,
            end: actual_end_angle(start, end, anticlockwise),
            anticlockwise,
        }
    }

    /// Non negative angle covered by the arc
    fn difference(&self) -> Scalar {
        (self.end - self.start).abs()
    }

    fn angle_at(&self, t: Scalar) -> Scalar {
        self.start + t * (self.end - self.start)
    }

    /// Parameter value of the angle, only meaningful if the angle is contained
    fn t_at_angle(&self, angle: Scalar) -> Scalar {
        let difference = self.difference();
        if difference == 0.0 {
            return 0.0;
        }
        let offset = if self.anticlockwise {
            self.start - angle
        } else {
            angle - self.start
        };
        modulo_between_down(offset, 0.0, TAU) / difference
    }

    fn contains_angle(&self, angle: Scalar) -> bool {
        let offset = if self.anticlockwise {
            angle - self.end
        } else {
            angle - self.start
        };
        modulo_between_down(offset, 0.0, TAU) <= self.difference()
    }

    /// Unit tangent of the unit circle at the angle, in the direction of travel
    fn unit_tangent(&self, angle: Scalar) -> Point {
        let unit = Point::from_polar(1.0, angle);
        if self.anticlockwise {
            unit.normal()
        } else {
            -unit.normal()
        }
    }

    /// Derivative of the unit circle point with respect to `t`
    fn unit_derivative(&self, t: Scalar) -> Point {
        let (sin, cos) = self.angle_at(t).sin_cos();
        (self.end - self.start) * Point::new(-sin, cos)
    }

    /// Parameter values of contained angles, sorted and restricted to `(0, 1)`
    fn interior_ts(&self, angles: impl IntoIterator<Item = Scalar>) -> Vec<Scalar> {
        interior_sorted(
            angles
                .into_iter()
                .filter(|angle| self.contains_angle(*angle))
                .map(|angle| self.t_at_angle(angle)),
        )
    }
}

/// Write single SVG arc command
fn write_arc_command(
    out: &mut impl fmt::Write,
    radii: [Scalar; 2],
    rotation: Scalar,
    large: bool,
    sweep: bool,
    point: Point,
) -> fmt::Result {
    out.write_str("A")?;
    for value in [radii[0], radii[1], rotation.to_degrees()] {
        out.write_char(' ')?;
        svg_scalar_fmt(out, value)?;
    }
    write!(out, " {} {}", large as u8, sweep as u8)?;
    write_points(out, "", &[point])
}

/// Write SVG arc command(s), arcs close to the full circle are split in two
#[allow(clippy::too_many_arguments)]
fn write_arc_fragment(
    out: &mut impl fmt::Write,
    radius_x: Scalar,
    radius_y: Scalar,
    rotation: Scalar,
    difference: Scalar,
    anticlockwise: bool,
    middle: Point,
    end: Point,
) -> fmt::Result {
    let radii = [radius_x, radius_y];
    let sweep = !anticlockwise;
    if difference >= TAU - SVG_FULL_CIRCLE_EPSILON {
        write_arc_command(out, radii, rotation, false, sweep, middle)?;
        out.write_char(' ')?;
        write_arc_command(out, radii, rotation, false, sweep, end)
    } else {
        write_arc_command(out, radii, rotation, difference >= PI, sweep, end)
    }
}

/// Apply affine transformation to the (possibly elliptical) arc
///
/// Linear part of the transformation combined with the arc's own rotation and scale
/// `N = R(phi) * diag(sx, sy) * R(theta)` is decomposed with closed form 2x2 SVD,
/// angles of the resulting arc are shifted by `theta`, and mirrored if `sy < 0`.
#[allow(clippy::too_many_arguments)]
fn transformed_arc(
    tr: Transform,
    center: Point,
    radius_x: Scalar,
    radius_y: Scalar,
    rotation: Scalar,
    start_angle: Scalar,
    end_angle: Scalar,
    anticlockwise: bool,
) -> Segment {
    let unit = Transform::identity()
        .rotate(rotation)
        .scale(radius_x, radius_y);
    let [a, b, _, c, d, _] = Transform::new(
        tr.coefficients()[0],
        tr.coefficients()[1],
        0.0,
        tr.coefficients()[3],
        tr.coefficients()[4],
        0.0,
    )
    .matmul(unit)
    .coefficients();

    let e = (a + d) / 2.0;
    let f = (a - d) / 2.0;
    let g = (c + b) / 2.0;
    let h = (c - b) / 2.0;
    let q = e.hypot(h);
    let r = f.hypot(g);
    let sx = q + r;
    let sy = q - r;
    let a1 = g.atan2(f);
    let a2 = h.atan2(e);
    let theta = (a2 - a1) / 2.0;
    let phi = (a2 + a1) / 2.0;

    let (start_angle, end_angle, anticlockwise) = if sy < 0.0 {
        (-(start_angle + theta), -(end_angle + theta), !anticlockwise)
    } else {
        (start_angle + theta, end_angle + theta, anticlockwise)
    };
    let center = tr.apply(center);
    let sy = sy.abs();
    if (sx - sy).abs() <= 1e-12 * sx.max(1.0) {
        Arc::new(center, sx, start_angle + phi, end_angle + phi, anticlockwise).into()
    } else {
        EllipArc::new(
            center,
            sx,
            sy,
            phi,
            start_angle,
            end_angle,
            anticlockwise,
        )
        .into()
    }
}

// -----------------------------------------------------------------------------
// Circular arc
// -----------------------------------------------------------------------------

/// Circular arc
///
/// Parametrized by angle, `t = 0` corresponds to the start angle and `t = 1` to the
/// end angle. Arc goes in the direction of increasing angle unless it is `anticlockwise`.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arc {
    center: Point,
    radius: Scalar,
    start_angle: Scalar,
    end_angle: Scalar,
    anticlockwise: bool,
}

impl fmt::Debug for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arc center:{:?} radius:{:.3?} start:{:.3?} end:{:.3?} anticlockwise:{}",
            self.center, self.radius, self.start_angle, self.end_angle, self.anticlockwise,
        )
    }
}

impl Arc {
    /// Create circular arc
    ///
    /// Negative radius is flipped and both angles are rotated by `PI`.
    /// Panics if the arc sweeps more than a full turn against its direction.
    pub fn new(
        center: impl Into<Point>,
        radius: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) -> Self {
        let (radius, start_angle, end_angle) = if radius < 0.0 {
            (-radius, start_angle + PI, end_angle + PI)
        } else {
            (radius, start_angle, end_angle)
        };
        assert_sweep(start_angle, end_angle, anticlockwise);
        Self {
            center: center.into(),
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> Scalar {
        self.radius
    }

    pub fn start_angle(&self) -> Scalar {
        self.start_angle
    }

    pub fn end_angle(&self) -> Scalar {
        self.end_angle
    }

    pub fn anticlockwise(&self) -> bool {
        self.anticlockwise
    }

    fn sweep(&self) -> Sweep {
        Sweep::new(self.start_angle, self.end_angle, self.anticlockwise)
    }

    /// End angle resolved so that the arc sweeps monotonically from the start angle
    pub fn actual_end_angle(&self) -> Scalar {
        self.sweep().end
    }

    /// Non negative angle covered by the arc
    pub fn angle_difference(&self) -> Scalar {
        self.sweep().difference()
    }

    /// Angle corresponding to the parameter value `t`
    pub fn angle_at(&self, t: Scalar) -> Scalar {
        self.sweep().angle_at(t)
    }

    /// Parameter value of the angle, only meaningful if the angle is contained in the arc
    pub fn t_at_angle(&self, angle: Scalar) -> Scalar {
        self.sweep().t_at_angle(angle)
    }

    /// Whether the angle is covered by the arc
    pub fn contains_angle(&self, angle: Scalar) -> bool {
        self.sweep().contains_angle(angle)
    }

    /// Point on the circle at the angle
    pub fn point_at_angle(&self, angle: Scalar) -> Point {
        self.center + Point::from_polar(self.radius, angle)
    }

    /// Unit tangent at the angle, in the direction of travel
    pub fn tangent_at_angle(&self, angle: Scalar) -> Point {
        self.sweep().unit_tangent(angle)
    }

    /// Parameters at which the arc meets the line through the ray, behind the origin included
    pub(crate) fn line_params(&self, ray: &Ray) -> ArrayIter<Scalar, 2> {
        let sweep = self.sweep();
        let center_to_ray = ray.position - self.center;
        let base = -ray.direction.dot(center_to_ray);
        let disc = base * base - (center_to_ray.length_squared() - self.radius * self.radius);
        if disc < 0.0 {
            return ArrayIter::new();
        }
        let sq = disc.sqrt();
        [base - sq, base + sq]
            .into_iter()
            .filter_map(|distance| {
                let angle = (ray.point_at_distance(distance) - self.center).angle();
                sweep.contains_angle(angle).then(|| sweep.t_at_angle(angle))
            })
            .collect()
    }

    /// Same arc represented as an elliptical arc
    pub fn to_elliptical_arc(&self) -> EllipArc {
        EllipArc::new(
            self.center,
            self.radius,
            self.radius,
            0.0,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        )
    }

    /// Convert arc to an iterator over cubic bezier curves
    pub fn to_cubics(&self) -> EllipArcCubicIter {
        self.to_elliptical_arc().to_cubics()
    }
}

impl Curve for Arc {
    fn start(&self) -> Point {
        self.point_at_angle(self.start_angle)
    }

    fn end(&self) -> Point {
        self.point_at_angle(self.actual_end_angle())
    }

    fn at(&self, t: Scalar) -> Point {
        self.point_at_angle(self.angle_at(t))
    }

    fn tangent_at(&self, t: Scalar) -> Point {
        self.radius * self.sweep().unit_derivative(t)
    }

    fn start_tangent(&self) -> Point {
        self.tangent_at_angle(self.start_angle)
    }

    fn end_tangent(&self) -> Point {
        self.tangent_at_angle(self.actual_end_angle())
    }

    fn curvature_at(&self, _t: Scalar) -> Scalar {
        let sign = if self.anticlockwise { -1.0 } else { 1.0 };
        sign / self.radius
    }

    fn bbox(&self) -> BBox {
        let sweep = self.sweep();
        [0.0, PI / 2.0, PI, 3.0 * PI / 2.0]
            .into_iter()
            .filter(|angle| sweep.contains_angle(*angle))
            .fold(BBox::new(self.start(), self.end()), |bbox, angle| {
                bbox.extend(self.point_at_angle(angle))
            })
    }

    fn interior_extrema(&self) -> Vec<Scalar> {
        self.sweep()
            .interior_ts([0.0, PI / 2.0, PI, 3.0 * PI / 2.0])
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        (self.cut(0.0, t), self.cut(t, 1.0))
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        let sweep = self.sweep();
        Arc::new(
            self.center,
            self.radius,
            sweep.angle_at(a),
            sweep.angle_at(b),
            self.anticlockwise,
        )
    }

    fn reverse(&self) -> Self {
        Arc::new(
            self.center,
            self.radius,
            self.actual_end_angle(),
            self.start_angle,
            !self.anticlockwise,
        )
    }

    fn transformed(&self, tr: Transform) -> Segment {
        transformed_arc(
            tr,
            self.center,
            self.radius,
            self.radius,
            0.0,
            self.start_angle,
            self.actual_end_angle(),
            self.anticlockwise,
        )
    }

    fn nondegenerate_segments(&self) -> Vec<Segment> {
        if self.radius <= 0.0 || self.start_angle == self.end_angle {
            Vec::new()
        } else {
            vec![(*self).into()]
        }
    }

    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment> {
        let offset = if self.anticlockwise { 1.0 } else { -1.0 } * line_width / 2.0;
        Arc::new(
            self.center,
            self.radius + offset,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        )
        .nondegenerate_segments()
    }

    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment> {
        let offset = if self.anticlockwise { -1.0 } else { 1.0 } * line_width / 2.0;
        Arc::new(
            self.center,
            self.radius + offset,
            self.actual_end_angle(),
            self.start_angle,
            !self.anticlockwise,
        )
        .nondegenerate_segments()
    }

    fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        curve_ray_hits(self, ray, self.line_params(ray))
    }

    fn signed_area_fragment(&self) -> Scalar {
        let Point([cx, cy]) = self.center;
        let r = self.radius;
        let start = self.start_angle;
        let end = self.actual_end_angle();
        0.5 * (r * r * (end - start) + cx * r * (end.sin() - start.sin())
            - cy * r * (end.cos() - start.cos()))
    }

    fn arc_length(&self) -> Scalar {
        self.radius * self.angle_difference()
    }

    fn arc_length_between(&self, t0: Scalar, t1: Scalar) -> Scalar {
        (t1 - t0).abs() * self.arc_length()
    }

    fn t_at_length(&self, length: Scalar) -> Scalar {
        let total = self.arc_length();
        if total < EPSILON {
            0.0
        } else {
            (length / total).clamp(0.0, 1.0)
        }
    }

    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result {
        write_arc_fragment(
            out,
            self.radius,
            self.radius,
            0.0,
            self.angle_difference(),
            self.anticlockwise,
            self.at(0.5),
            self.end(),
        )
    }

    fn write_to_context(&self, ctx: &mut impl Context2d) {
        ctx.arc(
            self.center,
            self.radius,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        );
    }
}

// -----------------------------------------------------------------------------
// Elliptical arc
// -----------------------------------------------------------------------------

/// Elliptical Arc
///
/// Point at angle `a` is `center + R(rotation) * (radius_x * cos(a), radius_y * sin(a))`,
/// radii are kept canonical `radius_x >= radius_y >= 0`.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EllipArc {
    center: Point,
    radius_x: Scalar,
    radius_y: Scalar,
    rotation: Scalar,
    start_angle: Scalar,
    end_angle: Scalar,
    anticlockwise: bool,
}

impl fmt::Debug for EllipArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EllipArc center:{:?} radius:{:?} rotation:{:.3?} start:{:.3?} end:{:.3?} anticlockwise:{}",
            self.center,
            Point([self.radius_x, self.radius_y]),
            self.rotation,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        )
    }
}

impl EllipArc {
    /// Create elliptical arc
    ///
    /// Negative radii are flipped along with the angles and the direction, if
    /// `radius_x < radius_y` radii are swapped and the frame is rotated by `PI / 2`.
    /// Panics if the arc sweeps more than a full turn against its direction.
    pub fn new(
        center: impl Into<Point>,
        radius_x: Scalar,
        radius_y: Scalar,
        rotation: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) -> Self {
        let (mut radius_x, mut radius_y, mut rotation) = (radius_x, radius_y, rotation);
        let (mut start_angle, mut end_angle, mut anticlockwise) =
            (start_angle, end_angle, anticlockwise);
        if radius_x < 0.0 {
            radius_x = -radius_x;
            start_angle = PI - start_angle;
            end_angle = PI - end_angle;
            anticlockwise = !anticlockwise;
        }
        if radius_y < 0.0 {
            radius_y = -radius_y;
            start_angle = -start_angle;
            end_angle = -end_angle;
            anticlockwise = !anticlockwise;
        }
        if radius_x < radius_y {
            std::mem::swap(&mut radius_x, &mut radius_y);
            rotation += PI / 2.0;
            start_angle -= PI / 2.0;
            end_angle -= PI / 2.0;
        }
        assert_sweep(start_angle, end_angle, anticlockwise);
        Self {
            center: center.into(),
            radius_x,
            radius_y,
            rotation,
            start_angle,
            end_angle,
            anticlockwise,
        }
    }

    /// Convert arc from SVG arguments to parametric curve
    ///
    /// This code mostly comes from arc implementation notes from svg sepc
    /// (Arc to Parametric)[https://www.w3.org/TR/SVG/implnote.html#ArcImplementationNotes]
    /// Returns `None` if arc degenerates to a line or to a point.
    pub fn from_svg(
        src: Point,
        dst: Point,
        radius_x: Scalar,
        radius_y: Scalar,
        x_axis_rot: Scalar,
        large_flag: bool,
        sweep_flag: bool,
    ) -> Option<Self> {
        let rx = radius_x.abs();
        let ry = radius_y.abs();
        if rx < EPSILON || ry < EPSILON || src.is_close_to(dst) {
            return None;
        }
        let phi = x_axis_rot * PI / 180.0;

        // Eq 5.1
        let Point([x1, y1]) = Transform::identity().rotate(-phi).apply(0.5 * (src - dst));
        // scale/normalize radii
        let s = (x1 / rx).powi(2) + (y1 / ry).powi(2);
        let (rx, ry) = if s > 1.0 {
            let s = s.sqrt();
            (rx * s, ry * s)
        } else {
            (rx, ry)
        };
        // Eq 5.2
        let sq = ((rx * ry).powi(2) / ((rx * y1).powi(2) + (ry * x1).powi(2)) - 1.0)
            .max(0.0)
            .sqrt();
        let sq = if large_flag == sweep_flag { -sq } else { sq };
        let center = sq * Point([rx * y1 / ry, -ry * x1 / rx]);
        let Point([cx, cy]) = center;
        // Eq 5.3 convert center to initail coordinates
        let center = Transform::identity().rotate(phi).apply(center) + 0.5 * (dst + src);
        // Eq 5.5-6
        let v0 = Point([1.0, 0.0]);
        let v1 = Point([(x1 - cx) / rx, (y1 - cy) / ry]);
        let v2 = Point([(-x1 - cx) / rx, (-y1 - cy) / ry]);
        // initial angle
        let eta = v0.angle_between(v1)?;
        // delta angle to be covered when t changes from 0..1
        let eta_delta = v1.angle_between(v2)?.rem_euclid(TAU);
        let eta_delta = if !sweep_flag && eta_delta > 0.0 {
            eta_delta - TAU
        } else if sweep_flag && eta_delta < 0.0 {
            eta_delta + TAU
        } else {
            eta_delta
        };

        Some(Self::new(
            center,
            rx,
            ry,
            phi,
            eta,
            eta + eta_delta,
            eta_delta < 0.0,
        ))
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius_x(&self) -> Scalar {
        self.radius_x
    }

    pub fn radius_y(&self) -> Scalar {
        self.radius_y
    }

    /// Rotation of the x-axis of the ellipse in radians
    pub fn rotation(&self) -> Scalar {
        self.rotation
    }

    pub fn start_angle(&self) -> Scalar {
        self.start_angle
    }

    pub fn end_angle(&self) -> Scalar {
        self.end_angle
    }

    pub fn anticlockwise(&self) -> bool {
        self.anticlockwise
    }

    fn sweep(&self) -> Sweep {
        Sweep::new(self.start_angle, self.end_angle, self.anticlockwise)
    }

    /// End angle resolved so that the arc sweeps monotonically from the start angle
    pub fn actual_end_angle(&self) -> Scalar {
        self.sweep().end
    }

    /// Non negative angle covered by the arc
    pub fn angle_difference(&self) -> Scalar {
        self.sweep().difference()
    }

    /// Angle corresponding to the parameter value `t`
    pub fn angle_at(&self, t: Scalar) -> Scalar {
        self.sweep().angle_at(t)
    }

    /// Transformation mapping the unit circle onto the ellipse
    pub fn unit_transform(&self) -> Transform {
        Transform::identity()
            .translate(self.center.x(), self.center.y())
            .rotate(self.rotation)
            .scale(self.radius_x, self.radius_y)
    }

    /// Point on the ellipse at the parametric angle
    pub fn point_at_angle(&self, angle: Scalar) -> Point {
        self.unit_transform().apply(Point::from_polar(1.0, angle))
    }

    /// Unit tangent at the parametric angle, in the direction of travel
    pub fn tangent_at_angle(&self, angle: Scalar) -> Point {
        self.unit_transform()
            .apply_vector(self.sweep().unit_tangent(angle))
            .normalize()
            .unwrap_or(Point::ZERO)
    }

    /// Convert elliptic arc to an iterator over cubic bezier curves
    pub fn to_cubics(&self) -> EllipArcCubicIter {
        let sweep = self.sweep();
        EllipArcCubicIter::new(self.unit_transform(), sweep.start, sweep.end - sweep.start)
    }
}

impl Curve for EllipArc {
    fn start(&self) -> Point {
        self.point_at_angle(self.start_angle)
    }

    fn end(&self) -> Point {
        self.point_at_angle(self.actual_end_angle())
    }

    fn at(&self, t: Scalar) -> Point {
        self.point_at_angle(self.angle_at(t))
    }

    fn tangent_at(&self, t: Scalar) -> Point {
        self.unit_transform()
            .apply_vector(self.sweep().unit_derivative(t))
    }

    fn start_tangent(&self) -> Point {
        self.tangent_at_angle(self.start_angle)
    }

    fn end_tangent(&self) -> Point {
        self.tangent_at_angle(self.actual_end_angle())
    }

    fn curvature_at(&self, t: Scalar) -> Scalar {
        let (sin, cos) = self.angle_at(t).sin_cos();
        let (rx, ry) = (self.radius_x, self.radius_y);
        let sign = if self.anticlockwise { -1.0 } else { 1.0 };
        sign * rx * ry / (rx * rx * sin * sin + ry * ry * cos * cos).powf(1.5)
    }

    fn bbox(&self) -> BBox {
        let sweep = self.sweep();
        extrema_angles(self)
            .into_iter()
            .filter(|angle| sweep.contains_angle(*angle))
            .fold(BBox::new(self.start(), self.end()), |bbox, angle| {
                bbox.extend(self.point_at_angle(angle))
            })
    }

    fn interior_extrema(&self) -> Vec<Scalar> {
        self.sweep().interior_ts(extrema_angles(self))
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        (self.cut(0.0, t), self.cut(t, 1.0))
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        let sweep = self.sweep();
        EllipArc::new(
            self.center,
            self.radius_x,
            self.radius_y,
            self.rotation,
            sweep.angle_at(a),
            sweep.angle_at(b),
            self.anticlockwise,
        )
    }

    fn reverse(&self) -> Self {
        EllipArc::new(
            self.center,
            self.radius_x,
            self.radius_y,
            self.rotation,
            self.actual_end_angle(),
            self.start_angle,
            !self.anticlockwise,
        )
    }

    fn transformed(&self, tr: Transform) -> Segment {
        transformed_arc(
            tr,
            self.center,
            self.radius_x,
            self.radius_y,
            self.rotation,
            self.start_angle,
            self.actual_end_angle(),
            self.anticlockwise,
        )
    }

    fn nondegenerate_segments(&self) -> Vec<Segment> {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 || self.start_angle == self.end_angle {
            Vec::new()
        } else if self.radius_x == self.radius_y {
            Arc::new(
                self.center,
                self.radius_x,
                self.start_angle + self.rotation,
                self.end_angle + self.rotation,
                self.anticlockwise,
            )
            .nondegenerate_segments()
        } else {
            vec![(*self).into()]
        }
    }

    fn stroke_left(&self, line_width: Scalar) -> Vec<Segment> {
        sampled_offset(self, -line_width / 2.0)
    }

    fn stroke_right(&self, line_width: Scalar) -> Vec<Segment> {
        reversed_offset(sampled_offset(self, line_width / 2.0))
    }

    fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        let Some(inv) = self.unit_transform().invert() else {
            return Vec::new();
        };
        // parameters are shared with the unit circle arc
        let unit_ray = Ray::new(inv.apply(ray.position), inv.apply_vector(ray.direction));
        let unit_arc = Arc::new(
            Point::ZERO,
            1.0,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        );
        curve_ray_hits(self, ray, unit_arc.line_params(&unit_ray))
    }

    fn signed_area_fragment(&self) -> Scalar {
        // linear part of the unit transform
        let [m00, m01, _, m10, m11, _] = self.unit_transform().coefficients();
        let start = self.start_angle;
        let end = self.actual_end_angle();
        let du = Point::from_polar(1.0, end) - Point::from_polar(1.0, start);
        let mdu = Point::new(m00 * du.x() + m01 * du.y(), m10 * du.x() + m11 * du.y());
        let det = m00 * m11 - m01 * m10;
        0.5 * (self.center.cross(mdu) + det * (end - start))
    }

    fn write_svg_fragment(&self, out: &mut impl fmt::Write) -> fmt::Result {
        write_arc_fragment(
            out,
            self.radius_x,
            self.radius_y,
            self.rotation,
            self.angle_difference(),
            self.anticlockwise,
            self.at(0.5),
            self.end(),
        )
    }

    fn write_to_context(&self, ctx: &mut impl Context2d) {
        ctx.ellipse(
            self.center,
            self.radius_x,
            self.radius_y,
            self.rotation,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        );
    }
}

/// Parametric angles at which x or y derivative of the ellipse vanishes
fn extrema_angles(arc: &EllipArc) -> [Scalar; 4] {
    let (sin, cos) = arc.rotation.sin_cos();
    let (rx, ry) = (arc.radius_x, arc.radius_y);
    let x_angle = (-ry * sin).atan2(rx * cos);
    let y_angle = (ry * cos).atan2(rx * sin);
    [x_angle, x_angle + PI, y_angle, y_angle + PI]
}

/// Approximate arc with a sequnce of cubic bezier curves
///
/// [Drawing an elliptical arc using polylines, quadratic or cubic Bezier curves]
/// (http://www.spaceroots.org/documents/ellipse/elliptical-arc.pdf)
/// [Approximating Arcs Using Cubic Bézier Curves]
/// (https://www.joecridge.me/content/pdf/bezier-arcs.pdf)
///
/// We are using following formula to split arc segment from `eta_1` to `eta_2`
/// to achieve good approximation arc is split in segments smaller then `pi / 2`.
///     P0 = A(eta_1)
///     P1 = P0 + alpha * A'(eta_1)
///     P2 = P3 - alpha * A'(eta_2)
///     P3 = A(eta_2)
/// where
///     A - arc parametrized by angle
///     A' - derivative of arc parametrized by angle
///     eta_1 = eta
///     eta_2 = eta + eta_delta
///     alpha = sin(eta_2 - eta_1) * (sqrt(4 + 3 * tan((eta_2 - eta_1) / 2) ** 2) - 1) / 3
pub struct EllipArcCubicIter {
    unit_tr: Transform,
    eta: Scalar,
    segment_delta: Scalar,
    segment_index: Scalar,
    segment_count: Scalar,
}

impl EllipArcCubicIter {
    fn new(unit_tr: Transform, eta: Scalar, eta_delta: Scalar) -> Self {
        let segment_max_angle = PI / 2.0; // maximum `eta_delta` of a segment
        let segment_count = (eta_delta.abs() / segment_max_angle).ceil();
        let segment_delta = if segment_count > 0.0 {
            eta_delta / segment_count
        } else {
            0.0
        };
        Self {
            unit_tr,
            eta,
            segment_delta,
            segment_index: 0.0,
            segment_count: segment_count - 1.0,
        }
    }

    fn at(&self, alpha: Scalar) -> (Point, Point) {
        let (sin, cos) = alpha.sin_cos();
        let at = self.unit_tr.apply(Point([cos, sin]));
        let at_deriv = self.unit_tr.apply_vector(Point([-sin, cos]));
        (at, at_deriv)
    }
}

impl Iterator for EllipArcCubicIter {
    type Item = Cubic;

    fn next(&mut self) -> Option<Self::Item> {
        if self.segment_index > self.segment_count {
            return None;
        }
        let eta_1 = self.eta + self.segment_delta * self.segment_index;
        let eta_2 = eta_1 + self.segment_delta;
        self.segment_index += 1.0;

        let sq = (4.0 + 3.0 * ((eta_2 - eta_1) / 2.0).tan().powi(2)).sqrt();
        let alpha = (eta_2 - eta_1).sin() * (sq - 1.0) / 3.0;
        let (p0, d0) = self.at(eta_1);
        let (p3, d3) = self.at(eta_2);
        let p1 = p0 + alpha * d0;
        let p2 = p3 - alpha * d3;
        Some(Cubic([p0, p1, p2, p3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_FLATNESS, assert_approx_eq};

    fn assert_point_eq(p0: Point, p1: Point, eps: Scalar) {
        assert!(p0.is_close_to_eps(p1, eps), "{:?} != {:?}", p0, p1);
    }

    #[test]
    fn test_quarter_circle() {
        let arc = Arc::new((0.0, 0.0), 5.0, 0.0, PI / 2.0, false);
        assert_point_eq(arc.start(), Point::new(5.0, 0.0), 1e-12);
        assert_point_eq(arc.end(), Point::new(0.0, 5.0), 1e-12);
        let bbox = arc.bbox();
        assert_approx_eq!(bbox.x(), 0.0, 1e-12);
        assert_approx_eq!(bbox.y(), 0.0, 1e-12);
        assert_approx_eq!(bbox.max().x(), 5.0, 1e-12);
        assert_approx_eq!(bbox.max().y(), 5.0, 1e-12);
        assert_point_eq(arc.start_tangent(), Point::new(0.0, 1.0), 1e-12);
        assert_point_eq(arc.end_tangent(), Point::new(-1.0, 0.0), 1e-12);
        assert_approx_eq!(arc.curvature_at(0.5), 0.2);
        assert_approx_eq!(arc.arc_length(), 2.5 * PI, 1e-12);
        assert_eq!(arc.svg_path_fragment(), format!("A 5 5 0 0 1 {} 5", arc.end().x()));
    }

    #[test]
    fn test_actual_end_angle() {
        assert_approx_eq!(actual_end_angle(0.0, 1.0, false), 1.0);
        assert_approx_eq!(actual_end_angle(1.0, 0.0, true), 0.0);
        assert_approx_eq!(actual_end_angle(0.0, 3.0 * TAU, false), TAU);
        assert_approx_eq!(actual_end_angle(0.0, -3.0 * TAU, true), -TAU);
        assert_approx_eq!(actual_end_angle(1.0, 0.0, false), TAU, 1e-12);
        assert_approx_eq!(actual_end_angle(0.0, 1.0, true), 1.0 - TAU, 1e-12);
        assert_approx_eq!(actual_end_angle(2.0, 2.0, true), 2.0);

        let arc = Arc::new((0.0, 0.0), 1.0, 0.0, -PI / 2.0, false);
        assert_approx_eq!(arc.angle_difference(), 3.0 * PI / 2.0, 1e-12);
        assert!(arc.contains_angle(PI));
        assert!(!arc.contains_angle(-PI / 4.0));
        assert_approx_eq!(arc.t_at_angle(PI / 2.0), 1.0 / 3.0, 1e-12);
    }

    #[test]
    fn test_negative_radius() {
        let arc = Arc::new((1.0, 1.0), -2.0, 0.0, PI / 2.0, false);
        assert_eq!(arc.radius(), 2.0);
        assert_approx_eq!(arc.start_angle(), PI);
        assert_point_eq(arc.start(), Point::new(-1.0, 1.0), 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_multi_turn_clockwise() {
        Arc::new((0.0, 0.0), 1.0, 0.0, -TAU, false);
    }

    #[test]
    #[should_panic]
    fn test_multi_turn_anticlockwise() {
        EllipArc::new((0.0, 0.0), 2.0, 1.0, 0.0, 0.0, TAU, true);
    }

    #[test]
    fn test_full_circle() {
        let arc = Arc::new((0.0, 0.0), 2.0, 0.0, TAU, false);
        assert_point_eq(arc.start(), arc.end(), 1e-12);
        assert_approx_eq!(arc.angle_difference(), TAU);
        assert_approx_eq!(arc.signed_area_fragment(), 4.0 * PI, 1e-12);
        let fragment = arc.svg_path_fragment();
        assert_eq!(fragment.matches('A').count(), 2);
        assert!(fragment.starts_with("A 2 2 0 0 1 -2 "));
        let bbox = arc.bbox();
        assert_approx_eq!(bbox.width(), 4.0, 1e-12);
        assert_approx_eq!(bbox.height(), 4.0, 1e-12);
    }

    #[test]
    fn test_arc_intersection() {
        let arc = Arc::new((0.0, 0.0), 1.0, 0.0, TAU, false);
        // ray crossing the whole circle
        let ray = Ray::new((-5.0, 0.0), (1.0, 0.0));
        let hits = arc.intersection(&ray);
        assert_eq!(hits.len(), 2);
        assert_approx_eq!(hits[0].distance, 4.0, 1e-12);
        assert_approx_eq!(hits[1].distance, 6.0, 1e-12);
        assert_point_eq(hits[0].normal, Point::new(-1.0, 0.0), 1e-12);
        assert_point_eq(hits[1].normal, Point::new(-1.0, 0.0), 1e-12);
        assert_eq!(arc.winding_intersection(&ray), 0);

        // ray starting inside
        let ray = Ray::new((0.0, 0.0), (1.0, 0.0));
        let hits = arc.intersection(&ray);
        assert_eq!(hits.len(), 1);
        assert_approx_eq!(hits[0].distance, 1.0, 1e-12);
        assert_eq!(hits[0].wind.abs(), 1);

        // ray missing the circle or pointing away from it
        assert!(arc.intersection(&Ray::new((-5.0, 2.0), (1.0, 0.0))).is_empty());
        assert!(arc.intersection(&Ray::new((5.0, 0.0), (1.0, 0.0))).is_empty());

        // half circle only covers positive y
        let arc = Arc::new((0.0, 0.0), 1.0, 0.0, PI, false);
        let hits = arc.intersection(&Ray::new((0.0, -5.0), (0.0, 1.0)));
        assert_eq!(hits.len(), 1);
        assert_point_eq(hits[0].point, Point::new(0.0, 1.0), 1e-12);
        assert_approx_eq!(hits[0].t, 0.5, 1e-12);
    }

    #[test]
    fn test_arc_offsets() {
        let arc = Arc::new((0.0, 0.0), 5.0, 0.0, PI / 2.0, false);
        let left = arc.stroke_left(2.0);
        assert_eq!(left.len(), 1);
        assert_point_eq(left[0].start(), Point::new(4.0, 0.0), 1e-12);
        assert_point_eq(left[0].end(), Point::new(0.0, 4.0), 1e-12);
        let right = arc.stroke_right(2.0);
        assert_eq!(right.len(), 1);
        assert_point_eq(right[0].start(), Point::new(0.0, 6.0), 1e-12);
        assert_point_eq(right[0].end(), Point::new(6.0, 0.0), 1e-12);

        // offset collapsing into the center
        let arc = Arc::new((0.0, 0.0), 1.0, 0.0, PI / 2.0, false);
        assert!(arc.stroke_left(2.0).is_empty());
    }

    #[test]
    fn test_ellip_arc_canonical() {
        let arc = EllipArc::new((0.0, 0.0), 1.0, 2.0, 0.0, 0.0, PI / 2.0, false);
        assert_eq!(arc.radius_x(), 2.0);
        assert_eq!(arc.radius_y(), 1.0);
        assert_point_eq(arc.start(), Point::new(1.0, 0.0), 1e-12);
        assert_point_eq(arc.end(), Point::new(0.0, 2.0), 1e-12);
        assert_point_eq(
            arc.at(0.5),
            Point::new((PI / 4.0).cos(), 2.0 * (PI / 4.0).sin()),
            1e-12,
        );

        let arc = EllipArc::new((0.0, 0.0), -3.0, 1.0, 0.0, 0.0, PI / 2.0, false);
        assert_point_eq(arc.start(), Point::new(-3.0, 0.0), 1e-12);
        assert_point_eq(arc.end(), Point::new(0.0, 1.0), 1e-12);
        assert_point_eq(arc.at(0.5), Point::new(-3.0 * 0.5f64.sqrt(), 0.5f64.sqrt()), 1e-12);
    }

    #[test]
    fn test_ellip_arc_geometry() {
        let arc = EllipArc::new((1.0, 2.0), 4.0, 2.0, 0.0, -PI / 2.0, PI / 2.0, false);
        assert_approx_eq!(arc.curvature_at(0.5), 1.0, 1e-12);
        let bbox = arc.bbox();
        assert_approx_eq!(bbox.max().x(), 5.0, 1e-12);
        assert_approx_eq!(bbox.x(), 1.0, 1e-12);
        assert!(
            arc.interior_extrema()
                .iter()
                .any(|t| (t - 0.5).abs() < 1e-12)
        );

        let full = EllipArc::new((1.0, 2.0), 4.0, 2.0, 0.3, 0.0, TAU, false);
        assert_approx_eq!(full.signed_area_fragment(), 8.0 * PI, 1e-9);
        assert_approx_eq!(full.bbox().center().x(), 1.0, 1e-9);
        assert_approx_eq!(full.bbox().center().y(), 2.0, 1e-9);

        let circle = EllipArc::new((0.0, 0.0), 3.0, 3.0, 0.0, 0.0, PI, false);
        assert_approx_eq!(circle.arc_length(), 3.0 * PI, 1e-6);
        assert_approx_eq!(circle.t_at_length(1.5 * PI), 0.5, 1e-6);
        match circle.nondegenerate_segments().as_slice() {
            [Segment::Arc(arc)] => assert_approx_eq!(arc.radius(), 3.0),
            segments => panic!("expected circular arc: {:?}", segments),
        }
    }

    #[test]
    fn test_ellip_arc_intersection() {
        let arc = EllipArc::new((0.0, 0.0), 4.0, 2.0, 0.0, 0.0, TAU, false);
        let ray = Ray::new((-10.0, 0.0), (1.0, 0.0));
        let hits = arc.intersection(&ray);
        assert_eq!(hits.len(), 2);
        assert_approx_eq!(hits[0].distance, 6.0, 1e-9);
        assert_approx_eq!(hits[1].distance, 14.0, 1e-9);
        assert_point_eq(hits[0].normal, Point::new(-1.0, 0.0), 1e-9);
        assert_eq!(arc.winding_intersection(&ray), 0);

        let ray = Ray::new((0.0, 0.0), (0.0, 1.0));
        let hits = arc.intersection(&ray);
        assert_eq!(hits.len(), 1);
        assert_point_eq(hits[0].point, Point::new(0.0, 2.0), 1e-9);
        assert_point_eq(hits[0].normal, Point::new(0.0, -1.0), 1e-9);
    }

    #[test]
    fn test_from_svg() {
        let arc = EllipArc::from_svg(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            5.0,
            5.0,
            0.0,
            false,
            true,
        )
        .unwrap();
        assert_point_eq(arc.start(), Point::new(0.0, 0.0), 1e-9);
        assert_point_eq(arc.end(), Point::new(10.0, 0.0), 1e-9);
        assert_point_eq(arc.at(0.5), Point::new(5.0, -5.0), 1e-9);
        assert!(!arc.anticlockwise());

        // radii too small are scaled up
        let arc = EllipArc::from_svg(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            1.0,
            1.0,
            0.0,
            false,
            false,
        )
        .unwrap();
        assert_approx_eq!(arc.radius_x(), 5.0, 1e-9);
        assert_point_eq(arc.at(0.5), Point::new(5.0, 5.0), 1e-9);

        // degenerate cases
        assert!(EllipArc::from_svg(Point::ZERO, Point::new(1.0, 0.0), 0.0, 1.0, 0.0, false, false).is_none());
        assert!(EllipArc::from_svg(Point::ZERO, Point::ZERO, 1.0, 1.0, 0.0, false, false).is_none());
    }

    #[test]
    fn test_transformed_arc() {
        let arc = Arc::new((1.0, 1.0), 2.0, 0.3, 2.0, false);

        // uniform scale keeps circular arc
        let tr = Transform::identity().rotate(0.7).scale(3.0, 3.0);
        match arc.transformed(tr) {
            Segment::Arc(result) => {
                assert_approx_eq!(result.radius(), 6.0, 1e-9);
                assert_point_eq(result.at(0.4), tr.apply(arc.at(0.4)), 1e-9);
            }
            segment => panic!("expected circular arc: {:?}", segment),
        }

        // mirror flips direction
        let tr = Transform::identity().scale(-1.0, 1.0);
        match arc.transformed(tr) {
            Segment::Arc(result) => {
                assert!(result.anticlockwise());
                assert_point_eq(result.at(0.4), tr.apply(arc.at(0.4)), 1e-9);
            }
            segment => panic!("expected circular arc: {:?}", segment),
        }

        // non-uniform scale produces elliptical arc
        let tr = Transform::new(1.0, 0.6, 0.0, 0.0, 2.0, 0.0);
        match arc.transformed(tr) {
            Segment::EllipArc(result) => {
                for index in 0..=8 {
                    let t = index as Scalar / 8.0;
                    assert_point_eq(result.at(t), tr.apply(arc.at(t)), 1e-9);
                }
            }
            segment => panic!("expected elliptical arc: {:?}", segment),
        }
    }

    #[test]
    fn test_to_cubics() {
        let arc = EllipArc::new((1.0, 2.0), 4.0, 2.0, 0.3, 0.5, 4.0, false);
        let cubics: Vec<_> = arc.to_cubics().collect();
        assert_eq!(cubics.len(), 3);
        assert_point_eq(cubics[0].start(), arc.start(), 1e-9);
        assert_point_eq(cubics[2].end(), arc.end(), 1e-9);
        for cubic in cubics.iter() {
            let mid = cubic.at(0.5);
            // point on the ellipse in its local frame satisfies (x/rx)^2 + (y/ry)^2 = 1
            let local = arc.unit_transform().inverted().apply(mid);
            assert_approx_eq!(local.length(), 1.0, 1e-3);
        }

        let arc = Arc::new((0.0, 0.0), 1.0, 0.0, PI, true);
        let lines: Vec<_> = arc.flatten(Transform::identity(), DEFAULT_FLATNESS).collect();
        assert!(lines.len() > 2);
        assert_point_eq(lines[0].start(), arc.start(), 1e-9);
        assert_point_eq(lines[lines.len() - 1].end(), arc.end(), 1e-9);
        assert!(lines.iter().all(|line| line.end().y() <= 1e-9));
    }
}
