//! `Shape` is a collection of sub-paths with Canvas like construction interface
use crate::{
    Arc, BBox, Context2d, Cubic, Curve, EllipArc, Line, LineStyles, PI, PiecewiseLinearOptions,
    Point, Quad, Ray, RayHit, Scalar, Segment, SubPath, SvgParserError, SvgPathParser, Transform,
};
use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

/// Rule used to decide whether a point is inside of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FillRule {
    /// Point is inside if winding number is not zero
    #[default]
    NonZero,
    /// Point is inside if winding number is odd
    EvenOdd,
}

/// Collection of sub-paths treated as a single unit
#[derive(Clone, Default)]
pub struct Shape {
    subpaths: Vec<SubPath>,
    bbox: BBox,
    /// Control point of the last quadratic curve, used by smooth quadratic commands
    last_quad_control: Option<Point>,
    /// Second control point of the last cubic curve, used by smooth cubic commands
    last_cubic_control: Option<Point>,
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpaths.is_empty() {
            write!(f, "Empty")?;
        } else {
            for subpath in self.subpaths.iter() {
                subpath.fmt(f)?
            }
        }
        Ok(())
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.subpaths == other.subpaths
    }
}

impl Shape {
    /// Create empty shape
    pub fn new() -> Self {
        Self {
            subpaths: Vec::new(),
            bbox: BBox::NOTHING,
            last_quad_control: None,
            last_cubic_control: None,
        }
    }

    /// Create shape from the list of sub-paths
    pub fn from_subpaths(subpaths: Vec<SubPath>) -> Self {
        let bbox = subpaths
            .iter()
            .fold(BBox::NOTHING, |bbox, subpath| bbox.union(subpath.bbox()));
        Self {
            subpaths,
            bbox,
            last_quad_control: None,
            last_cubic_control: None,
        }
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    /// Shape does not contain any drawable sub-path
    pub fn is_empty(&self) -> bool {
        !self.subpaths.iter().any(SubPath::is_drawable)
    }

    /// Current point of the shape
    pub fn last_point(&self) -> Option<Point> {
        self.subpaths.last().and_then(SubPath::last_point)
    }

    /// Point offset from the current point, origin is used if there is no current point
    fn relative(&self, offset: impl Into<Point>) -> Point {
        self.last_point().unwrap_or(Point::ZERO) + offset.into()
    }

    /// Start sub-path at `point` if there is no current point
    fn ensure(&mut self, point: Point) {
        if self.last_point().is_none() {
            self.move_to(point);
        }
    }

    fn reset_controls(&mut self) {
        self.last_quad_control = None;
        self.last_cubic_control = None;
    }

    /// Add segment to the current sub-path and extend bounding box
    fn push_segment(&mut self, segment: impl Into<Segment>) {
        let segment = segment.into();
        if self.subpaths.is_empty() {
            self.subpaths.push(SubPath::default());
        }
        let Some(subpath) = self.subpaths.last_mut() else {
            return;
        };
        for part in segment.nondegenerate_segments() {
            self.bbox = self.bbox.union(part.bbox());
            subpath.add_segment(part);
        }
    }

    /// Line to `start` if current point differs from it, otherwise start a new sub-path
    fn connect_to(&mut self, start: Point) {
        match self.last_point() {
            Some(last) if last.is_close_to(start) => {}
            Some(_) => {
                self.line_to(start);
            }
            None => {
                self.move_to(start);
            }
        }
    }

    /// Start new sub-path at `point`
    pub fn move_to(&mut self, point: impl Into<Point>) -> &mut Self {
        let point = point.into();
        // sub-path without segments is replaced instead of being left empty
        let reuse = self
            .subpaths
            .last()
            .is_some_and(|subpath| !subpath.is_drawable() && !subpath.closed());
        if reuse {
            self.subpaths.pop();
        }
        let mut subpath = SubPath::default();
        subpath.add_point(point);
        self.subpaths.push(subpath);
        self.reset_controls();
        self
    }

    pub fn move_to_relative(&mut self, offset: impl Into<Point>) -> &mut Self {
        let point = self.relative(offset);
        self.move_to(point)
    }

    /// Line from the current point
    pub fn line_to(&mut self, point: impl Into<Point>) -> &mut Self {
        let point = point.into();
        self.ensure(point);
        let start = self.relative(Point::ZERO);
        self.push_segment(Line::new(start, point));
        self.reset_controls();
        self
    }

    pub fn line_to_relative(&mut self, offset: impl Into<Point>) -> &mut Self {
        let point = self.relative(offset);
        self.line_to(point)
    }

    /// Horizontal line to provided `x` coordinate
    pub fn horizontal_line_to(&mut self, x: Scalar) -> &mut Self {
        let y = self.last_point().map_or(0.0, Point::y);
        self.line_to((x, y))
    }

    pub fn horizontal_line_to_relative(&mut self, dx: Scalar) -> &mut Self {
        let point = self.relative((dx, 0.0));
        self.line_to(point)
    }

    /// Vertical line to provided `y` coordinate
    pub fn vertical_line_to(&mut self, y: Scalar) -> &mut Self {
        let x = self.last_point().map_or(0.0, Point::x);
        self.line_to((x, y))
    }

    pub fn vertical_line_to_relative(&mut self, dy: Scalar) -> &mut Self {
        let point = self.relative((0.0, dy));
        self.line_to(point)
    }

    /// Quadratic bezier curve from the current point
    pub fn quadratic_curve_to(
        &mut self,
        control: impl Into<Point>,
        point: impl Into<Point>,
    ) -> &mut Self {
        let control = control.into();
        self.ensure(control);
        let start = self.relative(Point::ZERO);
        self.push_segment(Quad::new(start, control, point));
        self.last_quad_control = Some(control);
        self.last_cubic_control = None;
        self
    }

    pub fn quadratic_curve_to_relative(
        &mut self,
        control: impl Into<Point>,
        point: impl Into<Point>,
    ) -> &mut Self {
        let control = self.relative(control);
        let point = self.relative(point);
        self.quadratic_curve_to(control, point)
    }

    /// Quadratic curve with the control point reflected from the previous quadratic curve
    pub fn smooth_quadratic_curve_to(&mut self, point: impl Into<Point>) -> &mut Self {
        let point = point.into();
        let control = self.smooth_control(self.last_quad_control, point);
        self.quadratic_curve_to(control, point)
    }

    pub fn smooth_quadratic_curve_to_relative(&mut self, offset: impl Into<Point>) -> &mut Self {
        let point = self.relative(offset);
        self.smooth_quadratic_curve_to(point)
    }

    /// Cubic bezier curve from the current point
    pub fn cubic_curve_to(
        &mut self,
        control1: impl Into<Point>,
        control2: impl Into<Point>,
        point: impl Into<Point>,
    ) -> &mut Self {
        let control1 = control1.into();
        let control2 = control2.into();
        self.ensure(control1);
        let start = self.relative(Point::ZERO);
        self.push_segment(Cubic::new(start, control1, control2, point));
        self.last_quad_control = None;
        self.last_cubic_control = Some(control2);
        self
    }

    pub fn cubic_curve_to_relative(
        &mut self,
        control1: impl Into<Point>,
        control2: impl Into<Point>,
        point: impl Into<Point>,
    ) -> &mut Self {
        let control1 = self.relative(control1);
        let control2 = self.relative(control2);
        let point = self.relative(point);
        self.cubic_curve_to(control1, control2, point)
    }

    /// Cubic curve with the first control point reflected from the previous cubic curve
    pub fn smooth_cubic_curve_to(
        &mut self,
        control2: impl Into<Point>,
        point: impl Into<Point>,
    ) -> &mut Self {
        let control2 = control2.into();
        let control1 = self.smooth_control(self.last_cubic_control, control2);
        self.cubic_curve_to(control1, control2, point)
    }

    pub fn smooth_cubic_curve_to_relative(
        &mut self,
        control2: impl Into<Point>,
        point: impl Into<Point>,
    ) -> &mut Self {
        let control2 = self.relative(control2);
        let point = self.relative(point);
        self.smooth_cubic_curve_to(control2, point)
    }

    /// Reflection of the previous control point across the current point
    fn smooth_control(&self, control: Option<Point>, fallback: Point) -> Point {
        match (self.last_point(), control) {
            (Some(last), Some(control)) => 2.0 * last - control,
            (Some(last), None) => last,
            (None, _) => fallback,
        }
    }

    /// Circular arc, connected with a line to the current point
    pub fn arc(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) -> &mut Self {
        let arc = Arc::new(center, radius, start_angle, end_angle, anticlockwise);
        self.connect_to(arc.start());
        self.push_segment(arc);
        self.reset_controls();
        self
    }

    pub fn arc_relative(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) -> &mut Self {
        let center = self.relative(center);
        self.arc(center, radius, start_angle, end_angle, anticlockwise)
    }

    /// Elliptical arc, connected with a line to the current point
    #[allow(clippy::too_many_arguments)]
    pub fn elliptical_arc(
        &mut self,
        center: impl Into<Point>,
        radius_x: Scalar,
        radius_y: Scalar,
        rotation: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) -> &mut Self {
        let arc = EllipArc::new(
            center,
            radius_x,
            radius_y,
            rotation,
            start_angle,
            end_angle,
            anticlockwise,
        );
        self.connect_to(arc.start());
        self.push_segment(arc);
        self.reset_controls();
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn elliptical_arc_relative(
        &mut self,
        center: impl Into<Point>,
        radius_x: Scalar,
        radius_y: Scalar,
        rotation: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) -> &mut Self {
        let center = self.relative(center);
        self.elliptical_arc(
            center,
            radius_x,
            radius_y,
            rotation,
            start_angle,
            end_angle,
            anticlockwise,
        )
    }

    /// SVG style elliptical arc from the current point to `point`
    ///
    /// `rotation` is in degrees, arc degrades to a line if radii are zero.
    pub fn elliptical_arc_to(
        &mut self,
        radii: impl Into<Point>,
        rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        point: impl Into<Point>,
    ) -> &mut Self {
        let Point([radius_x, radius_y]) = radii.into();
        let point = point.into();
        self.ensure(point);
        let start = self.relative(Point::ZERO);
        match EllipArc::from_svg(start, point, radius_x, radius_y, rotation, large_arc, sweep) {
            None => self.line_to(point),
            Some(arc) => {
                self.push_segment(arc);
                self.reset_controls();
                self
            }
        }
    }

    pub fn elliptical_arc_to_relative(
        &mut self,
        radii: impl Into<Point>,
        rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        offset: impl Into<Point>,
    ) -> &mut Self {
        let point = self.relative(offset);
        self.elliptical_arc_to(radii, rotation, large_arc, sweep, point)
    }

    /// Close current sub-path, new sub-path starts at its first point
    pub fn close(&mut self) -> &mut Self {
        if let Some(subpath) = self.subpaths.last_mut().filter(|s| s.is_drawable()) {
            subpath.close();
            if let Some(first) = subpath.first_point() {
                let mut next = SubPath::default();
                next.add_point(first);
                self.subpaths.push(next);
            }
        }
        self.reset_controls();
        self
    }

    /// Add closed rectangle, new sub-path starts at its top-left corner
    pub fn rect(&mut self, x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> &mut Self {
        self.move_to((x, y))
            .line_to((x + width, y))
            .line_to((x + width, y + height))
            .line_to((x, y + height))
            .close()
    }

    /// Add closed rectangle with rounded corners
    ///
    /// Corners are circular arcs when `arc_width == arc_height`, elliptical otherwise.
    pub fn round_rect(
        &mut self,
        x: Scalar,
        y: Scalar,
        width: Scalar,
        height: Scalar,
        arc_width: Scalar,
        arc_height: Scalar,
    ) -> &mut Self {
        let low_x = x + arc_width;
        let high_x = x + width - arc_width;
        let low_y = y + arc_height;
        let high_y = y + height - arc_height;
        self.move_to((high_x, y));
        if arc_width == arc_height {
            self.arc((high_x, low_y), arc_width, -PI / 2.0, 0.0, false)
                .arc((high_x, high_y), arc_width, 0.0, PI / 2.0, false)
                .arc((low_x, high_y), arc_width, PI / 2.0, PI, false)
                .arc((low_x, low_y), arc_width, PI, 3.0 * PI / 2.0, false)
        } else {
            let (rx, ry) = (arc_width, arc_height);
            self.elliptical_arc((high_x, low_y), rx, ry, 0.0, -PI / 2.0, 0.0, false)
                .elliptical_arc((high_x, high_y), rx, ry, 0.0, 0.0, PI / 2.0, false)
                .elliptical_arc((low_x, high_y), rx, ry, 0.0, PI / 2.0, PI, false)
                .elliptical_arc((low_x, low_y), rx, ry, 0.0, PI, 3.0 * PI / 2.0, false)
        }
        .close()
    }

    /// Add closed circle
    pub fn add_circle(&mut self, center: impl Into<Point>, radius: Scalar) -> &mut Self {
        let center = center.into();
        self.move_to(center + Point::new(radius, 0.0))
            .arc(center, radius, 0.0, 2.0 * PI, false)
            .close()
    }

    /// Add closed ellipse, `rotation` is the angle of the x-axis of the ellipse
    pub fn add_ellipse(
        &mut self,
        center: impl Into<Point>,
        radius_x: Scalar,
        radius_y: Scalar,
        rotation: Scalar,
    ) -> &mut Self {
        let arc = EllipArc::new(center, radius_x, radius_y, rotation, 0.0, 2.0 * PI, false);
        self.move_to(arc.start());
        self.push_segment(arc);
        self.close()
    }

    /// Add closed polygon
    pub fn add_polygon(&mut self, points: impl IntoIterator<Item = impl Into<Point>>) -> &mut Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return self;
        };
        self.move_to(first);
        for point in points {
            self.line_to(point);
        }
        self.close()
    }

    pub fn rectangle(x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> Self {
        let mut shape = Self::new();
        shape.rect(x, y, width, height);
        shape
    }

    pub fn round_rectangle(
        x: Scalar,
        y: Scalar,
        width: Scalar,
        height: Scalar,
        arc_width: Scalar,
        arc_height: Scalar,
    ) -> Self {
        let mut shape = Self::new();
        shape.round_rect(x, y, width, height, arc_width, arc_height);
        shape
    }

    pub fn circle(center: impl Into<Point>, radius: Scalar) -> Self {
        let mut shape = Self::new();
        shape.add_circle(center, radius);
        shape
    }

    pub fn ellipse(
        center: impl Into<Point>,
        radius_x: Scalar,
        radius_y: Scalar,
        rotation: Scalar,
    ) -> Self {
        let mut shape = Self::new();
        shape.add_ellipse(center, radius_x, radius_y, rotation);
        shape
    }

    pub fn polygon(points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        let mut shape = Self::new();
        shape.add_polygon(points);
        shape
    }

    /// Regular polygon centered at the origin with the first vertex on the positive x-axis
    pub fn regular_polygon(sides: usize, radius: Scalar) -> Self {
        Self::polygon(
            (0..sides).map(|index| {
                Point::from_polar(radius, 2.0 * PI * index as Scalar / sides as Scalar)
            }),
        )
    }

    /// Open shape consisting of a single line
    pub fn line_segment(start: impl Into<Point>, end: impl Into<Point>) -> Self {
        let mut shape = Self::new();
        shape.move_to(start).line_to(end);
        shape
    }

    /// Rectangle covering provided bounding box
    pub fn bounds_rect(bbox: BBox) -> Self {
        Self::rectangle(bbox.x(), bbox.y(), bbox.width(), bbox.height())
    }

    /// Bounding box of all segments
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Check if the point is inside the shape, using non-zero fill rule
    pub fn contains_point(&self, point: impl Into<Point>) -> bool {
        self.contains_point_with(point, FillRule::NonZero)
    }

    /// Check if the point is inside the shape, using provided fill rule
    pub fn contains_point_with(&self, point: impl Into<Point>, fill_rule: FillRule) -> bool {
        let point = point.into();
        if !self.bbox.contains(point) {
            return false;
        }
        let wind = self.winding_intersection(&Ray::new(point, (1.0, 0.0)));
        match fill_rule {
            FillRule::NonZero => wind != 0,
            FillRule::EvenOdd => wind % 2 != 0,
        }
    }

    /// All intersections with the ray, sorted by distance
    pub fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .subpaths
            .iter()
            .flat_map(|subpath| subpath.intersection(ray))
            .collect();
        hits.sort_by(|h0, h1| h0.distance.total_cmp(&h1.distance));
        hits
    }

    /// Winding number of the ray origin with respect to the shape
    pub fn winding_intersection(&self, ray: &Ray) -> i32 {
        self.subpaths
            .iter()
            .map(|subpath| subpath.winding_intersection(ray))
            .sum()
    }

    /// New shape with transformation applied, bounding box is recomputed
    pub fn transformed(&self, tr: Transform) -> Self {
        Self::from_subpaths(
            self.subpaths
                .iter()
                .map(|subpath| subpath.transformed(tr))
                .collect(),
        )
    }

    /// Shape filled by the stroke of this shape
    pub fn stroked_shape(&self, styles: &LineStyles) -> Shape {
        tracing::debug_span!("[stroke]", line_width = styles.line_width).in_scope(|| {
            let subpaths: Vec<SubPath> = self
                .subpaths
                .iter()
                .flat_map(|subpath| subpath.stroked(styles).to_vec())
                .collect();
            tracing::debug!(
                input = self.subpaths.len(),
                output = subpaths.len(),
                "stroked subpaths"
            );
            Shape::from_subpaths(subpaths)
        })
    }

    /// Bounding box of the stroke
    pub fn stroked_bounds(&self, styles: &LineStyles) -> BBox {
        self.subpaths
            .iter()
            .flat_map(|subpath| subpath.stroked(styles).to_vec())
            .fold(BBox::NOTHING, |bbox, outline| bbox.union(outline.bbox()))
    }

    /// Check if the point is covered by the stroke of this shape
    pub fn stroke_contains_point(&self, point: impl Into<Point>, styles: &LineStyles) -> bool {
        self.stroked_shape(styles).contains_point(point)
    }

    /// Same shape with every sub-path traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        Self::from_subpaths(self.subpaths.iter().map(SubPath::reversed).collect())
    }

    /// Convert shape to an iterator over line segments
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> impl Iterator<Item = Line> + '_ {
        self.subpaths
            .iter()
            .flat_map(move |subpath| subpath.flatten(tr, flatness))
    }

    /// Signed area of the shape, every sub-path is implicitly closed
    pub fn signed_area(&self) -> Scalar {
        self.subpaths.iter().map(SubPath::signed_area).sum()
    }

    /// Split shape into open dashes
    pub fn dashed(&self, line_dash: &[Scalar], line_dash_offset: Scalar) -> Self {
        Self::from_subpaths(
            self.subpaths
                .iter()
                .flat_map(|subpath| subpath.dashed(line_dash, line_dash_offset))
                .collect(),
        )
    }

    /// Shape mapped with an arbitrary function, curves are approximated with lines
    pub fn nonlinear_transformed(
        &self,
        map: impl Fn(Point) -> Point,
        options: PiecewiseLinearOptions,
    ) -> Self {
        self.map_segments(|segment| {
            segment
                .to_piecewise_linear(&map, options)
                .into_iter()
                .map(Segment::from)
                .collect()
        })
    }

    /// Shape mapped from polar coordinates, `x` is a radius and `y` is an angle
    pub fn polar_to_cartesian(&self, options: PiecewiseLinearOptions) -> Self {
        self.map_segments(|segment| segment.polar_to_cartesian(options))
    }

    fn map_segments(&self, map: impl Fn(&Segment) -> Vec<Segment>) -> Self {
        let subpaths = self
            .subpaths
            .iter()
            .filter(|subpath| subpath.is_drawable())
            .map(|subpath| {
                let closing = subpath
                    .closing_segment()
                    .filter(|_| subpath.closed())
                    .map(Segment::from);
                let mut result = SubPath::default();
                for segment in subpath.segments().iter().chain(closing.as_ref()) {
                    for part in map(segment) {
                        result.add_segment(part);
                    }
                }
                if subpath.closed() {
                    result.close();
                }
                result
            })
            .collect();
        Self::from_subpaths(subpaths)
    }

    /// Issue drawing commands for all sub-paths
    pub fn write_to_context(&self, ctx: &mut impl Context2d) {
        for subpath in self.subpaths.iter() {
            subpath.write_to_context(ctx);
        }
    }

    /// SVG path representation of the shape
    pub fn to_svg_path(&self) -> String {
        self.to_string()
    }

    /// Parse shape from SVG path data
    pub fn from_svg_path(text: &str) -> Result<Self, SvgParserError> {
        Self::read_svg_path(text.as_bytes())
    }

    /// Read SVG path data
    pub fn read_svg_path(input: impl Read) -> Result<Self, SvgParserError> {
        tracing::debug_span!("[parse]").in_scope(|| {
            let mut shape = Shape::new();
            for cmd in SvgPathParser::new(input) {
                cmd?.apply(&mut shape);
            }
            Ok(shape)
        })
    }

    /// Write SVG path data
    pub fn write_svg_path(&self, mut out: impl Write) -> std::io::Result<()> {
        write!(&mut out, "{}", self)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subpaths = self.subpaths.iter().filter(|subpath| subpath.is_drawable());
        if let Some(subpath) = subpaths.next() {
            subpath.write_svg_path(f)?;
        }
        for subpath in subpaths {
            f.write_str(" ")?;
            subpath.write_svg_path(f)?;
        }
        Ok(())
    }
}

impl FromStr for Shape {
    type Err = SvgParserError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_svg_path(text)
    }
}

impl IntoIterator for Shape {
    type Item = SubPath;
    type IntoIter = <Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.into_iter()
    }
}

impl<'a> IntoIterator for &'a Shape {
    type Item = &'a SubPath;
    type IntoIter = <&'a Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.iter()
    }
}

impl Extend<SubPath> for Shape {
    fn extend<T: IntoIterator<Item = SubPath>>(&mut self, iter: T) {
        for subpath in iter {
            self.bbox = self.bbox.union(subpath.bbox());
            self.subpaths.push(subpath);
        }
        self.reset_controls();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextCmd, ContextRecorder, DEFAULT_FLATNESS, LineJoin, assert_approx_eq};

    const SQUIRREL: &str = r#"
    M12 1C9.79 1 8 2.31 8 3.92c0 1.94.5 3.03 0 6.08 0-4.5-2.77-6.34-4-6.34.05-.5-.48
    -.66-.48-.66s-.22.11-.3.34c-.27-.31-.56-.27-.56-.27l-.13.58S.7 4.29 .68 6.87c.2.33
    1.53.6 2.47.43.89.05.67.79.47.99C2.78 9.13 2 8 1 8S0 9 1 9s1 1 3 1c-3.09 1.2 0 4 0 4
    H3c-1 0-1 1-1 1h6c3 0 5-1 5-3.47 0-.85-.43-1.79 -1-2.53-1.11-1.46.23-2.68 1-2
    .77.68 3 1 3-2 0-2.21-1.79-4-4-4zM2.5 6 c-.28 0-.5-.22-.5-.5s.22-.5.5-.5.5.22.5.5
    -.22.5-.5.5z
    "#;

    fn assert_bbox_eq(bbox: BBox, min: impl Into<Point>, max: impl Into<Point>) {
        let (min, max) = (min.into(), max.into());
        assert!(bbox.min().is_close_to_eps(min, 1e-9), "{:?} != {:?}", bbox.min(), min);
        assert!(bbox.max().is_close_to_eps(max, 1e-9), "{:?} != {:?}", bbox.max(), max);
    }

    #[test]
    fn test_bbox() -> Result<(), SvgParserError> {
        let shape: Shape = SQUIRREL.parse()?;
        let bbox = shape.bbox();
        assert_approx_eq!(bbox.x(), 0.25, 1e-3);
        assert_approx_eq!(bbox.y(), 1.0, 1e-3);
        assert_approx_eq!(bbox.width(), 15.75, 1e-3);
        assert_approx_eq!(bbox.height(), 14.0, 1e-3);
        Ok(())
    }

    #[test]
    fn test_parse() -> Result<(), SvgParserError> {
        let shape: Shape = SQUIRREL.parse()?;
        let mut reference = Shape::new();
        reference
            .move_to((12.0, 1.0))
            .cubic_curve_to((9.79, 1.0), (8.0, 2.31), (8.0, 3.92))
            .cubic_curve_to((8.0, 5.86), (8.5, 6.95), (8.0, 10.0))
            .cubic_curve_to((8.0, 5.5), (5.23, 3.66), (4.0, 3.66))
            .cubic_curve_to((4.05, 3.16), (3.52, 3.0), (3.52, 3.0))
            .cubic_curve_to((3.52, 3.0), (3.3, 3.11), (3.22, 3.34))
            .cubic_curve_to((2.95, 3.03), (2.66, 3.07), (2.66, 3.07))
            .line_to((2.53, 3.65))
            .cubic_curve_to((2.53, 3.65), (0.7, 4.29), (0.68, 6.87))
            .cubic_curve_to((0.88, 7.2), (2.21, 7.47), (3.15, 7.3))
            .cubic_curve_to((4.04, 7.35), (3.82, 8.09), (3.62, 8.29))
            .cubic_curve_to((2.78, 9.13), (2.0, 8.0), (1.0, 8.0))
            .cubic_curve_to((0.0, 8.0), (0.0, 9.0), (1.0, 9.0))
            .cubic_curve_to((2.0, 9.0), (2.0, 10.0), (4.0, 10.0))
            .cubic_curve_to((0.91, 11.2), (4.0, 14.0), (4.0, 14.0))
            .line_to((3.0, 14.0))
            .cubic_curve_to((2.0, 14.0), (2.0, 15.0), (2.0, 15.0))
            .line_to((8.0, 15.0))
            .cubic_curve_to((11.0, 15.0), (13.0, 14.0), (13.0, 11.53))
            .cubic_curve_to((13.0, 10.68), (12.57, 9.74), (12.0, 9.0))
            .cubic_curve_to((10.89, 7.54), (12.23, 6.32), (13.0, 7.0))
            .cubic_curve_to((13.77, 7.68), (16.0, 8.0), (16.0, 5.0))
            .cubic_curve_to((16.0, 2.79), (14.21, 1.0), (12.0, 1.0))
            .close()
            .move_to((2.5, 6.0))
            .cubic_curve_to((2.22, 6.0), (2.0, 5.78), (2.0, 5.5))
            .cubic_curve_to((2.0, 5.22), (2.22, 5.0), (2.5, 5.0))
            .cubic_curve_to((2.78, 5.0), (3.0, 5.22), (3.0, 5.5))
            .cubic_curve_to((3.0, 5.78), (2.78, 6.0), (2.5, 6.0))
            .close();
        assert_eq!(shape.subpaths().len(), 3);
        for (subpath, reference) in shape.subpaths().iter().zip(reference.subpaths()) {
            assert_eq!(subpath.closed(), reference.closed());
            assert_eq!(subpath.segments().len(), reference.segments().len());
            for (p0, p1) in subpath.points().iter().zip(reference.points()) {
                assert!(p0.is_close_to_eps(*p1, 1e-9), "{:?} != {:?}", p0, p1);
            }
        }
        Ok(())
    }

    #[test]
    fn test_svg_round_trip() -> Result<(), SvgParserError> {
        let shape = Shape::from_svg_path("M0 0 L10 0 L10 10 Z")?;
        assert_eq!(shape.to_svg_path(), "M 0 0 L 10 0 L 10 10 Z");
        let drawable: Vec<_> = shape.subpaths().iter().filter(|s| s.is_drawable()).collect();
        assert_eq!(drawable.len(), 1);
        assert_eq!(drawable[0].segments().len(), 2);
        assert!(drawable[0].closed());
        assert!(drawable[0].has_closing_segment());

        let reparsed: Shape = shape.to_svg_path().parse()?;
        assert_eq!(reparsed.to_svg_path(), shape.to_svg_path());

        let mut output = Vec::new();
        shape.write_svg_path(&mut output)?;
        let loaded = Shape::read_svg_path(std::io::Cursor::new(output))?;
        assert_eq!(loaded.to_string(), shape.to_string());
        Ok(())
    }

    #[test]
    fn test_relative_commands() -> Result<(), SvgParserError> {
        let shape: Shape = "m 1 1 l 2 0 h 3 v 4 H 1 z l 0 -1".parse()?;
        assert_eq!(
            shape.to_svg_path(),
            "M 1 1 L 3 1 L 6 1 L 6 5 L 1 5 Z M 1 1 L 1 0"
        );
        assert_bbox_eq(shape.bbox(), (1.0, 0.0), (6.0, 5.0));
        Ok(())
    }

    #[test]
    fn test_builder_state() {
        // line without a move starts a sub-path at its end
        let mut shape = Shape::new();
        shape.line_to((1.0, 1.0)).line_to((2.0, 1.0));
        assert_eq!(shape.subpaths().len(), 1);
        assert_eq!(shape.subpaths()[0].segments().len(), 1);
        assert_eq!(shape.last_point(), Some(Point::new(2.0, 1.0)));

        // close continues from the first point of the closed sub-path
        shape.close().line_to((1.0, 5.0));
        assert_eq!(shape.subpaths().len(), 2);
        assert_eq!(shape.subpaths()[1].first_point(), Some(Point::new(1.0, 1.0)));

        // repeated moves do not produce empty sub-paths
        let mut shape = Shape::new();
        shape.move_to((0.0, 0.0)).move_to((1.0, 1.0)).move_to((2.0, 2.0));
        assert_eq!(shape.subpaths().len(), 1);
        assert!(shape.is_empty());
        assert!(shape.bbox().is_empty());
    }

    #[test]
    fn test_smooth_curves() {
        let mut shape = Shape::new();
        shape
            .move_to((0.0, 0.0))
            .quadratic_curve_to((1.0, 1.0), (2.0, 0.0))
            .smooth_quadratic_curve_to((4.0, 0.0));
        let segments = shape.subpaths()[0].segments();
        let quad = segments[1].to_quad().unwrap();
        assert_eq!(quad.control(), Point::new(3.0, -1.0));

        // previous segment is not a quadratic curve
        let mut shape = Shape::new();
        shape
            .move_to((0.0, 0.0))
            .line_to((2.0, 0.0))
            .smooth_quadratic_curve_to((4.0, 2.0));
        let segments = shape.subpaths()[0].segments();
        assert_eq!(segments.len(), 2);
        assert!(matches!(segments[1], Segment::Line(_)));

        let mut shape = Shape::new();
        shape
            .move_to((0.0, 0.0))
            .cubic_curve_to((0.0, 1.0), (1.0, 2.0), (2.0, 2.0))
            .smooth_cubic_curve_to_relative((2.0, 0.0), (2.0, -2.0));
        let cubic = shape.subpaths()[0].segments()[1].to_cubic().unwrap();
        assert_eq!(
            cubic.points(),
            [
                Point::new(2.0, 2.0),
                Point::new(3.0, 2.0),
                Point::new(4.0, 2.0),
                Point::new(4.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_arc_connects() {
        let mut shape = Shape::new();
        shape
            .move_to((0.0, 0.0))
            .arc((10.0, 0.0), 5.0, PI, 2.0 * PI, false);
        let segments = shape.subpaths()[0].segments();
        assert_eq!(segments.len(), 2);
        assert!(matches!(segments[0], Segment::Line(_)));
        assert!(matches!(segments[1], Segment::Arc(_)));
        assert_bbox_eq(shape.bbox(), (0.0, -5.0), (15.0, 0.0));
    }

    #[test]
    fn test_elliptical_arc_to() -> Result<(), SvgParserError> {
        let shape: Shape = "M 0 0 A 5 5 0 0 1 10 0".parse()?;
        let segments = shape.subpaths()[0].segments();
        assert_eq!(segments.len(), 1);
        assert!(matches!(segments[0], Segment::Arc(_)));
        assert_bbox_eq(shape.bbox(), (0.0, -5.0), (10.0, 0.0));

        let shape: Shape = "M 0 0 a 10 5 0 1 0 20 0".parse()?;
        let segments = shape.subpaths()[0].segments();
        assert!(matches!(segments[0], Segment::EllipArc(_)));
        assert_bbox_eq(shape.bbox(), (0.0, 0.0), (20.0, 5.0));

        // zero radius degrades to a line
        let shape: Shape = "M 0 0 A 0 5 0 0 1 10 0".parse()?;
        assert!(matches!(shape.subpaths()[0].segments()[0], Segment::Line(_)));
        Ok(())
    }

    #[test]
    fn test_rect_and_round_rect() {
        let shape = Shape::rectangle(1.0, 2.0, 3.0, 4.0);
        assert_bbox_eq(shape.bbox(), (1.0, 2.0), (4.0, 6.0));
        assert_eq!(shape.to_svg_path(), "M 1 2 L 4 2 L 4 6 L 1 6 Z");
        assert_eq!(shape.last_point(), Some(Point::new(1.0, 2.0)));

        let shape = Shape::round_rectangle(0.0, 0.0, 10.0, 8.0, 2.0, 2.0);
        let segments = shape.subpaths()[0].segments();
        assert_eq!(
            segments
                .iter()
                .filter(|segment| matches!(segment, Segment::Arc(_)))
                .count(),
            4
        );
        assert_bbox_eq(shape.bbox(), (0.0, 0.0), (10.0, 8.0));
        assert_approx_eq!(shape.signed_area().abs(), 80.0 - (4.0 - PI) * 4.0, 1e-9);

        let shape = Shape::round_rectangle(0.0, 0.0, 10.0, 8.0, 3.0, 2.0);
        let segments = shape.subpaths()[0].segments();
        assert_eq!(
            segments
                .iter()
                .filter(|segment| matches!(segment, Segment::EllipArc(_)))
                .count(),
            4
        );
        assert_bbox_eq(shape.bbox(), (0.0, 0.0), (10.0, 8.0));
    }

    #[test]
    fn test_contains_vertex_on_ray() {
        let mut shape = Shape::polygon([(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)]);
        // bounding box has to cover points to the left of the diamond
        shape.rect(-3.0, 3.0, 0.01, 0.01);
        for fill_rule in [FillRule::NonZero, FillRule::EvenOdd] {
            // ray grazes the top and the bottom vertices
            assert!(!shape.contains_point_with((-2.0, 1.0), fill_rule));
            assert!(!shape.contains_point_with((-2.0, -1.0), fill_rule));
            // ray passes through the left and the right vertices
            assert!(!shape.contains_point_with((-2.0, 0.0), fill_rule));
            assert!(shape.contains_point_with((-0.5, 0.0), fill_rule));
            assert!(shape.contains_point_with((0.0, 0.0), fill_rule));
        }
    }

    #[test]
    fn test_circle_contains() {
        let shape = Shape::circle((0.0, 0.0), 5.0);
        assert!(shape.contains_point((0.0, 0.0)));
        assert!(!shape.contains_point((10.0, 0.0)));
        assert!(shape.contains_point((4.999, 0.0)));
        assert!(!shape.contains_point((3.6, 3.6)));
        assert_bbox_eq(shape.bbox(), (-5.0, -5.0), (5.0, 5.0));
        assert_approx_eq!(shape.signed_area().abs(), 25.0 * PI, 1e-9);
        let subpath = &shape.subpaths()[0];
        assert!(!subpath.has_closing_segment());
    }

    #[test]
    fn test_polygon_winding() {
        let shape = Shape::regular_polygon(6, 10.0);
        assert_eq!(shape.subpaths()[0].segments().len(), 5);
        let inside = Ray::new((1.0, 2.0), (0.3, 1.0));
        let outside = Ray::new((20.0, 1.0), (-1.0, 0.0));
        let wind = shape.winding_intersection(&inside);
        assert_eq!(wind.abs(), 1);
        assert_eq!(shape.winding_intersection(&outside), 0);
        assert_eq!(shape.reversed().winding_intersection(&inside), -wind);

        let hits = shape.intersection(&outside);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance < hits[1].distance);
        let shift = 1.0 / 3.0f64.sqrt();
        assert_approx_eq!(hits[0].distance, 10.0 + shift, 1e-9);
        assert_approx_eq!(hits[1].distance, 30.0 - shift, 1e-9);
        assert_eq!(hits[0].wind + hits[1].wind, 0);
    }

    #[test]
    fn test_fill_rule() -> Result<(), SvgParserError> {
        let shape: Shape = r#"
            M50,0 21,90 98,35 2,35 79,90z
            M110,0 h90 v90 h-90z
            M130,20 h50 v50 h-50 z
            M210,0  h90 v90 h-90 z
            M230,20 v50 h50 v-50 z
        "#
        .parse()?;
        let y = 50.0;
        let star = (50.0, y);
        let box0 = (150.0, y);
        let box1 = (250.0, y);

        assert!(!shape.contains_point_with(star, FillRule::EvenOdd));
        assert!(!shape.contains_point_with(box0, FillRule::EvenOdd));
        assert!(!shape.contains_point_with(box1, FillRule::EvenOdd));
        assert!(shape.contains_point_with((115.0, y), FillRule::EvenOdd));

        assert!(shape.contains_point_with(star, FillRule::NonZero));
        assert!(shape.contains_point_with(box0, FillRule::NonZero));
        assert!(!shape.contains_point_with(box1, FillRule::NonZero));
        Ok(())
    }

    #[test]
    fn test_transformed() {
        let shape = Shape::rectangle(0.0, 0.0, 10.0, 10.0);
        let rotated = shape.transformed(Transform::identity().rotate(PI / 4.0));
        let diag = 10.0 * 2.0f64.sqrt();
        assert_bbox_eq(rotated.bbox(), (-diag / 2.0, 0.0), (diag / 2.0, diag));

        let circle = Shape::circle((0.0, 0.0), 1.0).transformed(Transform::identity().scale(2.0, 1.0));
        assert!(matches!(
            circle.subpaths()[0].segments()[0],
            Segment::EllipArc(_)
        ));
        assert_bbox_eq(circle.bbox(), (-2.0, -1.0), (2.0, 1.0));
        assert!(circle.contains_point((1.9, 0.0)));
        assert!(!circle.contains_point((1.9, 0.9)));
    }

    #[test]
    fn test_stroked_rect() {
        let styles = LineStyles::new(2.0).with_join(LineJoin::Miter);
        let shape = Shape::rectangle(0.0, 0.0, 10.0, 10.0);
        let stroked = shape.stroked_shape(&styles);
        assert_eq!(stroked.subpaths().len(), 2);
        for subpath in stroked.subpaths() {
            assert!(subpath.closed());
            assert!(
                subpath
                    .segments()
                    .iter()
                    .all(|segment| matches!(segment, Segment::Line(_)))
            );
        }
        assert_bbox_eq(stroked.bbox(), (-1.0, -1.0), (11.0, 11.0));
        assert_bbox_eq(shape.stroked_bounds(&styles), (-1.0, -1.0), (11.0, 11.0));

        assert!(shape.stroke_contains_point((10.0, 5.0), &styles));
        assert!(shape.stroke_contains_point((0.0, 5.0), &styles));
        assert!(shape.stroke_contains_point((10.5, -0.5), &styles));
        assert!(!shape.stroke_contains_point((5.0, 5.0), &styles));
        assert!(!shape.stroke_contains_point((12.0, 5.0), &styles));
    }

    #[test]
    fn test_stroked_open_path() -> Result<(), SvgParserError> {
        let shape: Shape = "M 0 0 L 10 0 L 10 10".parse()?;
        let styles = LineStyles::new(2.0);
        let stroked = shape.stroked_shape(&styles);
        assert_eq!(stroked.subpaths().len(), 1);
        assert_bbox_eq(stroked.bbox(), (0.0, -1.0), (11.0, 10.0));
        assert!(stroked.contains_point((5.0, 0.5)));
        assert!(!stroked.contains_point((5.0, 5.0)));

        let bevel = shape.stroked_shape(&styles.clone().with_join(LineJoin::Bevel));
        assert!(!bevel.contains_point((10.9, -0.9)));
        assert!(stroked.contains_point((10.9, -0.9)));
        Ok(())
    }

    #[test]
    fn test_flatten() -> Result<(), SvgParserError> {
        let shape: Shape = SQUIRREL.parse()?;
        let tr = Transform::identity().rotate(PI / 3.0).translate(-10.0, -20.0);
        let lines: Vec<_> = shape.flatten(tr, DEFAULT_FLATNESS).collect();
        for subpath in shape.subpaths().iter().filter(|s| s.is_drawable()) {
            let lines: Vec<_> = subpath.flatten(tr, DEFAULT_FLATNESS).collect();
            for pair in lines.windows(2) {
                assert!(pair[0].end().is_close_to_eps(pair[1].start(), 1e-9));
            }
            // closed sub-paths end where they start
            let first = lines.first().unwrap().start();
            let last = lines.last().unwrap().end();
            assert!(first.is_close_to_eps(last, 1e-9));
        }
        assert!(!lines.is_empty());
        let area: Scalar = shape
            .flatten(tr, 1e-3)
            .map(|line| line.signed_area_fragment())
            .sum();
        assert_approx_eq!(area, shape.signed_area(), 0.1);
        Ok(())
    }

    #[test]
    fn test_dashed() {
        let shape = Shape::line_segment((0.0, 0.0), (10.0, 0.0));
        let dashed = shape.dashed(&[2.0, 3.0], 0.0);
        assert_eq!(dashed.subpaths().len(), 2);
        assert_bbox_eq(dashed.bbox(), (0.0, 0.0), (7.0, 0.0));
        let ends: Vec<_> = dashed
            .subpaths()
            .iter()
            .flat_map(|subpath| subpath.first_point().into_iter().chain(subpath.last_point()))
            .collect();
        let expected = [(0.0, 0.0), (2.0, 0.0), (5.0, 0.0), (7.0, 0.0)];
        for (point, expected) in ends.iter().zip(expected) {
            assert!(point.is_close_to_eps(expected.into(), 1e-9));
        }
        assert!(dashed.subpaths().iter().all(|subpath| !subpath.closed()));
    }

    #[test]
    fn test_polar_to_cartesian() {
        let mut shape = Shape::new();
        shape
            .move_to((0.0, 0.0))
            .line_to((2.0, 0.0))
            .line_to((2.0, PI / 2.0))
            .line_to((1.0, PI / 2.0 + 0.5));
        let mapped = shape.polar_to_cartesian(PiecewiseLinearOptions::default());
        let segments = mapped.subpaths()[0].segments();
        assert!(matches!(segments[0], Segment::Line(_)));
        assert!(matches!(segments[1], Segment::Arc(_)));
        assert!(segments[1].end().is_close_to_eps(Point::new(0.0, 2.0), 1e-9));
        assert!(segments[2..].iter().all(|s| matches!(s, Segment::Line(_))));
        let last = mapped.last_point().unwrap();
        assert!(last.is_close_to_eps(Point::from_polar(1.0, PI / 2.0 + 0.5), 1e-9));

        let moved = shape.nonlinear_transformed(
            |point| point + Point::new(1.0, 0.0),
            PiecewiseLinearOptions::default(),
        );
        assert_eq!(moved.subpaths()[0].segments().len(), 3);
        assert_bbox_eq(moved.bbox(), (1.0, 0.0), (3.0, PI / 2.0 + 0.5));
    }

    #[test]
    fn test_write_to_context() {
        let mut shape = Shape::rectangle(0.0, 0.0, 1.0, 1.0);
        shape.add_ellipse((5.0, 5.0), 2.0, 1.0, 0.0);
        let mut recorder = ContextRecorder::new();
        shape.write_to_context(&mut recorder);
        let cmds = recorder.commands();
        assert_eq!(cmds[0], ContextCmd::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(cmds[4], ContextCmd::ClosePath);
        assert_eq!(cmds[5], ContextCmd::MoveTo(Point::new(7.0, 5.0)));
        assert!(cmds.contains(&ContextCmd::Save));
        assert!(cmds.contains(&ContextCmd::Restore));
        assert_eq!(cmds.last(), Some(&ContextCmd::ClosePath));
    }
}
