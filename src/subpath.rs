//! Connected chain of segments with its stroked outline
use crate::{
    BBox, Context2d, Curve, Line, LineStyles, Point, Ray, RayHit, Scalar, Segment, Transform,
    curve::write_points,
};
use std::{cell::RefCell, fmt, rc::Rc};

/// First and last points closer than this distance do not need closing segment
pub const CLOSE_EPSILON: Scalar = 1e-9;

/// Dash pattern entries shorter than this are treated as exhausted
const DASH_EPSILON: Scalar = 1e-12;

/// Connected sequence of segments where end of each segment coincides with the start of the next one.
///
/// Besides segments sub-path keeps polyline `points` (start of the first segment followed by the end
/// of every segment) and a cache of the last stroked outline.
#[derive(Clone, Default)]
pub struct SubPath {
    segments: Vec<Segment>,
    points: Vec<Point>,
    closed: bool,
    stroke_cache: RefCell<Option<(LineStyles, Rc<[SubPath]>)>>,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments.iter() {
            writeln!(f, "{:?}", segment)?;
        }
        if self.closed {
            writeln!(f, "Close")?;
        } else {
            writeln!(f, "End")?
        }
        Ok(())
    }
}

impl PartialEq for SubPath {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed
            && self.segments == other.segments
            && self.points == other.points
    }
}

impl SubPath {
    /// Create sub-path from the list of connected segments
    pub fn new(segments: Vec<Segment>, closed: bool) -> Self {
        let points = match segments.first() {
            None => Vec::new(),
            Some(first) => std::iter::once(first.start())
                .chain(segments.iter().map(|segment| segment.end()))
                .collect(),
        };
        Self {
            segments,
            points,
            closed,
            stroke_cache: RefCell::default(),
        }
    }

    /// Add vertex without a segment, used to record starting point of the sub-path
    pub fn add_point(&mut self, point: impl Into<Point>) -> &mut Self {
        self.points.push(point.into());
        self.invalidate();
        self
    }

    /// Append non-degenerate parts of the segment
    pub fn add_segment(&mut self, segment: impl Into<Segment>) -> &mut Self {
        let segment = segment.into();
        let parts = segment.nondegenerate_segments();
        if parts.is_empty() {
            tracing::trace!(?segment, "dropped degenerate segment");
            return self;
        }
        if self.points.is_empty() {
            self.points.push(segment.start());
        }
        for part in parts {
            self.points.push(part.end());
            self.segments.push(part);
        }
        self.invalidate();
        self
    }

    /// Mark sub-path as closed, closing line is implicit
    pub fn close(&mut self) -> &mut Self {
        self.closed = true;
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        *self.stroke_cache.get_mut() = None;
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Points as a flat slice of `[x0, y0, x1, y1, ...]`
    pub fn points_flat(&self) -> &[Scalar] {
        bytemuck::cast_slice(&self.points)
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Sub-path has at least one segment
    pub fn is_drawable(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Whether first and last points are apart, closed flag is not taken into account
    pub fn has_closing_segment(&self) -> bool {
        match (self.first_point(), self.last_point()) {
            (Some(first), Some(last)) => !first.is_close_to_eps(last, CLOSE_EPSILON),
            _ => false,
        }
    }

    /// Implicit line from the last point back to the first one
    pub fn closing_segment(&self) -> Option<Line> {
        if !self.has_closing_segment() {
            return None;
        }
        Some(Line::new(self.last_point()?, self.first_point()?))
    }

    /// Bounding box of all segments
    pub fn bbox(&self) -> BBox {
        self.segments
            .iter()
            .fold(BBox::NOTHING, |bbox, segment| bbox.union(segment.bbox()))
    }

    /// New sub-path with transformation applied to all segments
    pub fn transformed(&self, tr: Transform) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|segment| segment.transformed(tr))
                .collect(),
            points: self.points.iter().map(|point| tr.apply(*point)).collect(),
            closed: self.closed,
            stroke_cache: RefCell::default(),
        }
    }

    /// Same sub-path traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .rev()
                .map(|segment| segment.reverse())
                .collect(),
            points: self.points.iter().rev().copied().collect(),
            closed: self.closed,
            stroke_cache: RefCell::default(),
        }
    }

    /// Approximate sub-path with lines, closed sub-path includes closing line
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> impl Iterator<Item = Line> + '_ {
        let close = self
            .closing_segment()
            .filter(|_| self.closed)
            .map(|line| line.transform(tr));
        self.segments
            .iter()
            .flat_map(move |segment| segment.flatten(tr, flatness))
            .chain(close)
    }

    /// Signed area of the region bounded by the sub-path and its closing line
    pub fn signed_area(&self) -> Scalar {
        let area: Scalar = self
            .segments
            .iter()
            .map(|segment| segment.signed_area_fragment())
            .sum();
        area + self
            .closing_segment()
            .map_or(0.0, |line| line.signed_area_fragment())
    }

    /// Intersections with the ray, including implicit closing segment
    pub fn intersection(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .segments
            .iter()
            .flat_map(|segment| segment.intersection(ray))
            .collect();
        if let Some(line) = self.closing_segment() {
            hits.extend(line.intersection(ray));
        }
        hits
    }

    /// Winding number contribution, including implicit closing segment
    pub fn winding_intersection(&self, ray: &Ray) -> i32 {
        let wind: i32 = self
            .segments
            .iter()
            .map(|segment| segment.winding_intersection(ray))
            .sum();
        wind + self
            .closing_segment()
            .map_or(0, |line| line.winding_intersection(ray))
    }

    /// Issue drawing commands for this sub-path
    pub fn write_to_context(&self, ctx: &mut impl Context2d) {
        let Some(start) = self.first_point().filter(|_| self.is_drawable()) else {
            return;
        };
        ctx.move_to(start);
        for segment in self.segments.iter() {
            segment.write_to_context(ctx);
        }
        if self.closed {
            ctx.close_path();
        }
    }

    /// Write `M x y <fragments> [Z]` clause, nothing is written for a non-drawable sub-path
    pub fn write_svg_path(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let Some(start) = self.first_point().filter(|_| self.is_drawable()) else {
            return Ok(());
        };
        write_points(out, "M", &[start])?;
        for segment in self.segments.iter() {
            out.write_char(' ')?;
            segment.write_svg_fragment(out)?;
        }
        if self.closed {
            out.write_str(" Z")?;
        }
        Ok(())
    }

    /// Stroke outline of the sub-path
    ///
    /// Open sub-path produces one closed outline, closed sub-path produces two
    /// (left and right rings). Result is cached until the sub-path is modified or
    /// different styles are requested.
    pub fn stroked(&self, styles: &LineStyles) -> Rc<[SubPath]> {
        let cached = self
            .stroke_cache
            .borrow()
            .as_ref()
            .and_then(|(cached_styles, outline)| {
                (cached_styles == styles).then(|| outline.clone())
            });
        if let Some(outline) = cached {
            tracing::trace!(line_width = styles.line_width, "stroke cache hit");
            return outline;
        }
        tracing::trace!(line_width = styles.line_width, "stroke cache miss");
        let outline: Rc<[SubPath]> = self.stroke_outline(styles).into();
        *self.stroke_cache.borrow_mut() = Some((styles.clone(), outline.clone()));
        outline
    }

    fn stroke_outline(&self, styles: &LineStyles) -> Vec<SubPath> {
        let mut segments = self.segments.clone();
        if self.closed {
            segments.extend(self.closing_segment().map(Segment::from));
        }
        let (Some(first), Some(last)) = (segments.first().copied(), segments.last().copied())
        else {
            return Vec::new();
        };
        let width = styles.line_width;

        // left side, from start to end
        let mut left = Vec::new();
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                let prev = segments[index - 1];
                left.extend(styles.left_join(
                    segment.start(),
                    prev.end_tangent(),
                    segment.start_tangent(),
                ));
            }
            left.extend(segment.stroke_left(width));
        }

        // right side, from end to start
        let mut right = Vec::new();
        for (index, segment) in segments.iter().enumerate().rev() {
            if let Some(next) = segments.get(index + 1) {
                right.extend(styles.right_join(
                    segment.end(),
                    segment.end_tangent(),
                    next.start_tangent(),
                ));
            }
            right.extend(segment.stroke_right(width));
        }

        if self.closed {
            left.extend(styles.left_join(
                first.start(),
                last.end_tangent(),
                first.start_tangent(),
            ));
            // both rings start next to the start of the first segment
            let mut right_ring: Vec<Segment> = styles
                .right_join(first.start(), last.end_tangent(), first.start_tangent())
                .collect();
            right_ring.extend(right);
            vec![SubPath::new(left, true), SubPath::new(right_ring, true)]
        } else {
            let mut outline = left;
            outline.extend(styles.cap(last.end(), last.end_tangent()));
            outline.extend(right);
            outline.extend(styles.cap(first.start(), -first.start_tangent()));
            vec![SubPath::new(outline, true)]
        }
    }

    /// Split sub-path into open dashes
    ///
    /// Follows Canvas semantic: odd length pattern is repeated twice, offset shifts the start
    /// of the pattern, empty or all zero pattern leaves sub-path unchanged.
    pub fn dashed(&self, line_dash: &[Scalar], line_dash_offset: Scalar) -> Vec<SubPath> {
        let mut pattern = line_dash.to_vec();
        if pattern.len() % 2 == 1 {
            pattern.extend_from_slice(line_dash);
        }
        let total: Scalar = pattern.iter().sum();
        let valid = pattern.iter().all(|dash| dash.is_finite() && *dash >= 0.0);
        if !valid || !total.is_finite() || total <= 0.0 {
            return vec![self.clone()];
        }

        // position within the pattern
        let mut index = 0;
        let mut offset = line_dash_offset.rem_euclid(total);
        while offset >= pattern[index] {
            offset -= pattern[index];
            index = (index + 1) % pattern.len();
        }
        let mut remaining = pattern[index] - offset;
        let starts_on = index % 2 == 0;

        let mut segments = self.segments.clone();
        if self.closed {
            segments.extend(self.closing_segment().map(Segment::from));
        }

        let mut dashes = Vec::new();
        let mut current: Vec<Segment> = Vec::new();
        for segment in segments {
            let length = segment.arc_length();
            let mut position = 0.0;
            let mut t0 = 0.0;
            while length - position > DASH_EPSILON {
                let step = remaining.min(length - position);
                position += step;
                remaining -= step;
                let t1 = if length - position > DASH_EPSILON {
                    segment.t_at_length(position)
                } else {
                    1.0
                };
                if index % 2 == 0 && t1 > t0 {
                    current.push(segment.cut(t0, t1));
                }
                t0 = t1;
                if remaining <= DASH_EPSILON {
                    if !current.is_empty() {
                        dashes.push(SubPath::new(std::mem::take(&mut current), false));
                    }
                    index = (index + 1) % pattern.len();
                    remaining = pattern[index];
                }
            }
        }
        let ends_on = !current.is_empty();
        if ends_on {
            dashes.push(SubPath::new(current, false));
        }

        // closed sub-path: last dash continues into the first one
        if self.closed && starts_on && ends_on && dashes.len() > 1 {
            if let Some(last) = dashes.pop() {
                let mut merged = last.segments;
                merged.extend(dashes[0].segments.iter().copied());
                dashes[0] = SubPath::new(merged, false);
            }
        }
        dashes
    }
}
