//! Stroke styles, line joins and line caps
use crate::{
    Arc, ArrayIter, Line, PI, Point, Scalar, Segment, SvgParserError, line_line_intersection,
};
use std::{fmt, str::FromStr};

/// Segments produced by a single join or cap
pub type StrokeIter = ArrayIter<Segment, 3>;

/// Miter joins sharper than this are replaced with a bevel
const MITER_MAX_ANGLE: Scalar = PI - 1e-5;

/// Shape at the free ends of an open stroked sub-path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl FromStr for LineCap {
    type Err = SvgParserError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            _ => Err(SvgParserError::InvalidKeyword(text.to_owned())),
        }
    }
}

impl fmt::Display for LineCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineCap::Butt => f.write_str("butt"),
            LineCap::Round => f.write_str("round"),
            LineCap::Square => f.write_str("square"),
        }
    }
}

/// Shape at the corners between two consecutive stroked segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl FromStr for LineJoin {
    type Err = SvgParserError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "miter" => Ok(LineJoin::Miter),
            "round" => Ok(LineJoin::Round),
            "bevel" => Ok(LineJoin::Bevel),
            _ => Err(SvgParserError::InvalidKeyword(text.to_owned())),
        }
    }
}

impl fmt::Display for LineJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineJoin::Miter => f.write_str("miter"),
            LineJoin::Round => f.write_str("round"),
            LineJoin::Bevel => f.write_str("bevel"),
        }
    }
}

/// Stroke configuration, mirrors Canvas 2D line styles
///
/// Dash pattern is stored but stroking itself produces a continuous outline,
/// use [`Shape::dashed`](crate::Shape::dashed) to split a shape into dashes first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LineStyles {
    pub line_width: Scalar,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: Scalar,
    pub line_dash: Vec<Scalar>,
    pub line_dash_offset: Scalar,
}

impl Default for LineStyles {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.0,
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
        }
    }
}

impl LineStyles {
    /// Default styles with provided line width
    pub fn new(line_width: Scalar) -> Self {
        Self {
            line_width,
            ..Default::default()
        }
    }

    pub fn with_cap(self, line_cap: LineCap) -> Self {
        Self { line_cap, ..self }
    }

    pub fn with_join(self, line_join: LineJoin) -> Self {
        Self { line_join, ..self }
    }

    pub fn with_miter_limit(self, miter_limit: Scalar) -> Self {
        Self {
            miter_limit,
            ..self
        }
    }

    pub fn with_dash(self, line_dash: Vec<Scalar>, line_dash_offset: Scalar) -> Self {
        Self {
            line_dash,
            line_dash_offset,
            ..self
        }
    }

    /// Load line styles from JSON, missing fields take their default values
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, SvgParserError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize line styles as JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, SvgParserError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Join on the logical left side of the stroke at `center`
    ///
    /// Tangents are the end tangent of the incoming segment and the start tangent
    /// of the outgoing one. Join geometry is only produced on the outer side of the
    /// turn, the inner side gets a plain connecting line.
    pub fn left_join(&self, center: Point, from_tangent: Point, to_tangent: Point) -> StrokeIter {
        let mut result = StrokeIter::new();
        let (Some(from_tangent), Some(to_tangent)) =
            (from_tangent.normalize(), to_tangent.normalize())
        else {
            return result;
        };
        let half_width = self.line_width / 2.0;
        let from_point = center - half_width * from_tangent.normal();
        let to_point = center - half_width * to_tangent.normal();
        let bevel: Option<Segment> = (from_point != to_point).then(|| Line::new(from_point, to_point).into());

        // TODO: prevent self-intersection of the outline on the inner side of the turn
        if from_tangent.normal().dot(to_tangent) <= 0.0 {
            result.extend(bevel);
            return result;
        }
        match self.line_join {
            LineJoin::Bevel => result.extend(bevel),
            LineJoin::Round => {
                let arc = Arc::new(
                    center,
                    half_width,
                    from_tangent.angle() + PI / 2.0,
                    to_tangent.angle() + PI / 2.0,
                    true,
                );
                result.push(arc.into());
            }
            LineJoin::Miter => {
                let theta = from_tangent
                    .angle_between(-to_tangent)
                    .map_or(0.0, Scalar::abs);
                let miter = if 1.0 / (theta / 2.0).sin() <= self.miter_limit
                    && theta < MITER_MAX_ANGLE
                {
                    line_line_intersection(
                        from_point,
                        from_point + from_tangent,
                        to_point,
                        to_point + to_tangent,
                    )
                } else {
                    None
                };
                match miter {
                    Some(miter) => {
                        result.push(Line::new(from_point, miter).into());
                        result.push(Line::new(miter, to_point).into());
                    }
                    None => result.extend(bevel),
                }
            }
        }
        result
    }

    /// Join on the logical right side of the stroke, which is traversed backwards
    pub fn right_join(&self, center: Point, from_tangent: Point, to_tangent: Point) -> StrokeIter {
        self.left_join(center, -to_tangent, -from_tangent)
    }

    /// Cap at the free end `center` of a stroke going in the `tangent` direction
    ///
    /// Cap goes from the left side of the stroke to its right side.
    pub fn cap(&self, center: Point, tangent: Point) -> StrokeIter {
        let mut result = StrokeIter::new();
        let Some(tangent) = tangent.normalize() else {
            return result;
        };
        let half_width = self.line_width / 2.0;
        let to_right = half_width * tangent.normal();
        let from_point = center - to_right;
        let to_point = center + to_right;
        match self.line_cap {
            LineCap::Butt => result.push(Line::new(from_point, to_point).into()),
            LineCap::Round => {
                let angle = tangent.angle();
                let arc = Arc::new(center, half_width, angle + PI / 2.0, angle - PI / 2.0, true);
                result.push(arc.into());
            }
            LineCap::Square => {
                let to_front = half_width * tangent;
                let left = from_point + to_front;
                let right = to_point + to_front;
                result.push(Line::new(from_point, left).into());
                result.push(Line::new(left, right).into());
                result.push(Line::new(right, to_point).into());
            }
        }
        result
    }
}
