//! 2D vector path library: curve segments, sub-paths and shapes with SVG path
//! parsing/generation, stroking, dashing and geometric queries.
//!
//! Main features:
//!  - Line, quadratic/cubic bezier, circular and elliptical arc segments
//!  - SVG path parsing and generation
//!  - Path offsetting (stroking) with joins and caps
//!  - Bounding boxes, ray intersections, point containment
//!  - Canvas like drawing sink

mod context;
mod curve;
mod ellipse;
mod geometry;
mod segment;
mod shape;
mod stroke;
mod subpath;
mod svg;
mod utils;

pub use context::{Context2d, ContextCmd, ContextRecorder};
pub use curve::{
    Cubic, Curve, CurveExtremities, CurveFlattenIter, CurveRoots, DEFAULT_FLATNESS, Line,
    OFFSET_SAMPLES, PiecewiseLinearOptions, QUAD_OFFSET_DEPTH, Quad, RayHit,
};
pub use ellipse::{Arc, EllipArc, EllipArcCubicIter, SVG_FULL_CIRCLE_EPSILON};
pub use geometry::{
    BBox, EPSILON, EPSILON_SQRT, PI, Point, Ray, Scalar, Transform, scalar_fmt, svg_scalar_fmt,
};
pub use segment::Segment;
pub use shape::{FillRule, Shape};
pub use stroke::{LineCap, LineJoin, LineStyles, StrokeIter};
pub use subpath::{CLOSE_EPSILON, SubPath};
pub use svg::{Position, SvgParserError, SvgPathCmd, SvgPathParser};
pub use utils::{
    ArrayIter, line_line_intersection, modulo_between_down, modulo_between_up, points_collinear,
};
use utils::{UNIT_ROOT_EPSILON, cubic_solve, quadratic_solve, unit_roots};
