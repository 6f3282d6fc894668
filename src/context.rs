//! Canvas like drawing sink that curves and shapes can be written into
use crate::{Point, Scalar, Transform};

/// Immediate mode 2D drawing context
///
/// Angles are in radians, `anticlockwise` arcs go in the direction of decreasing angle.
pub trait Context2d {
    fn move_to(&mut self, point: Point);

    fn line_to(&mut self, point: Point);

    fn quadratic_curve_to(&mut self, control: Point, point: Point);

    fn bezier_curve_to(&mut self, control0: Point, control1: Point, point: Point);

    fn arc(
        &mut self,
        center: Point,
        radius: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    );

    fn close_path(&mut self);

    /// Push current transformation
    fn save(&mut self);

    /// Pop transformation pushed by `save`
    fn restore(&mut self);

    /// Multiply current transformation by `tr`
    fn transform(&mut self, tr: Transform);

    /// Elliptical arc, contexts without native ellipses draw unit circle arc
    /// under the transformation mapping it onto the ellipse.
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        center: Point,
        radius_x: Scalar,
        radius_y: Scalar,
        rotation: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) {
        self.save();
        self.transform(
            Transform::identity()
                .translate(center.x(), center.y())
                .rotate(rotation)
                .scale(radius_x, radius_y),
        );
        self.arc(Point::ZERO, 1.0, start_angle, end_angle, anticlockwise);
        self.restore();
    }
}

/// Single command issued to the [Context2d]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadraticCurveTo(Point, Point),
    BezierCurveTo(Point, Point, Point),
    Arc {
        center: Point,
        radius: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    },
    ClosePath,
    Save,
    Restore,
    Transform(Transform),
}

/// Context that records all issued commands
#[derive(Debug, Clone, Default)]
pub struct ContextRecorder {
    commands: Vec<ContextCmd>,
}

impl ContextRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands
    pub fn commands(&self) -> &[ContextCmd] {
        &self.commands
    }

    /// Take recorded commands leaving recorder empty
    pub fn take(&mut self) -> Vec<ContextCmd> {
        std::mem::take(&mut self.commands)
    }

    /// Issue recorded commands to another context
    pub fn replay(&self, ctx: &mut impl Context2d) {
        for cmd in self.commands.iter() {
            match *cmd {
                ContextCmd::MoveTo(p) => ctx.move_to(p),
                ContextCmd::LineTo(p) => ctx.line_to(p),
                ContextCmd::QuadraticCurveTo(p1, p2) => ctx.quadratic_curve_to(p1, p2),
                ContextCmd::BezierCurveTo(p1, p2, p3) => ctx.bezier_curve_to(p1, p2, p3),
                ContextCmd::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    anticlockwise,
                } => ctx.arc(center, radius, start_angle, end_angle, anticlockwise),
                ContextCmd::ClosePath => ctx.close_path(),
                ContextCmd::Save => ctx.save(),
                ContextCmd::Restore => ctx.restore(),
                ContextCmd::Transform(tr) => ctx.transform(tr),
            }
        }
    }
}

impl Context2d for ContextRecorder {
    fn move_to(&mut self, point: Point) {
        self.commands.push(ContextCmd::MoveTo(point));
    }

    fn line_to(&mut self, point: Point) {
        self.commands.push(ContextCmd::LineTo(point));
    }

    fn quadratic_curve_to(&mut self, control: Point, point: Point) {
        self.commands
            .push(ContextCmd::QuadraticCurveTo(control, point));
    }

    fn bezier_curve_to(&mut self, control0: Point, control1: Point, point: Point) {
        self.commands
            .push(ContextCmd::BezierCurveTo(control0, control1, point));
    }

    fn arc(
        &mut self,
        center: Point,
        radius: Scalar,
        start_angle: Scalar,
        end_angle: Scalar,
        anticlockwise: bool,
    ) {
        self.commands.push(ContextCmd::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    fn close_path(&mut self) {
        self.commands.push(ContextCmd::ClosePath);
    }

    fn save(&mut self) {
        self.commands.push(ContextCmd::Save);
    }

    fn restore(&mut self) {
        self.commands.push(ContextCmd::Restore);
    }

    fn transform(&mut self, tr: Transform) {
        self.commands.push(ContextCmd::Transform(tr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arc, Curve, EllipArc, Line, PI, Quad};

    #[test]
    fn test_recorder() {
        let mut recorder = ContextRecorder::new();
        recorder.move_to(Point::new(1.0, 1.0));
        Line::new((1.0, 1.0), (2.0, 1.0)).write_to_context(&mut recorder);
        Quad::new((2.0, 1.0), (3.0, 2.0), (4.0, 1.0)).write_to_context(&mut recorder);
        Arc::new((4.0, 0.0), 1.0, PI / 2.0, 0.0, true).write_to_context(&mut recorder);
        recorder.close_path();
        assert_eq!(
            recorder.commands(),
            &[
                ContextCmd::MoveTo(Point::new(1.0, 1.0)),
                ContextCmd::LineTo(Point::new(2.0, 1.0)),
                ContextCmd::QuadraticCurveTo(Point::new(3.0, 2.0), Point::new(4.0, 1.0)),
                ContextCmd::Arc {
                    center: Point::new(4.0, 0.0),
                    radius: 1.0,
                    start_angle: PI / 2.0,
                    end_angle: 0.0,
                    anticlockwise: true,
                },
                ContextCmd::ClosePath,
            ]
        );

        let mut copy = ContextRecorder::new();
        recorder.replay(&mut copy);
        assert_eq!(copy.commands(), recorder.commands());
        assert_eq!(recorder.take().len(), 5);
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn test_ellipse_fallback() {
        let arc = EllipArc::new((1.0, 2.0), 3.0, 1.0, PI / 4.0, 0.0, PI, false);
        let mut recorder = ContextRecorder::new();
        arc.write_to_context(&mut recorder);
        let cmds = recorder.commands();
        assert_eq!(cmds.len(), 4);
        assert_eq!(cmds[0], ContextCmd::Save);
        assert_eq!(cmds[1], ContextCmd::Transform(arc.unit_transform()));
        assert_eq!(
            cmds[2],
            ContextCmd::Arc {
                center: Point::ZERO,
                radius: 1.0,
                start_angle: 0.0,
                end_angle: PI,
                anticlockwise: false,
            }
        );
        assert_eq!(cmds[3], ContextCmd::Restore);
    }
}
