//! SVG path parser
//!
//! See [SVG Path Specification](https://www.w3.org/TR/SVG11/paths.html#PathData)
use crate::{Point, Scalar, Shape};
use std::{fmt, io::Read};

/// Possible SVG path commands, relative commands keep their arguments as offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvgPathCmd {
    MoveTo(Point),
    MoveToRelative(Point),
    LineTo(Point),
    LineToRelative(Point),
    HorizontalLineTo(Scalar),
    HorizontalLineToRelative(Scalar),
    VerticalLineTo(Scalar),
    VerticalLineToRelative(Scalar),
    CubicCurveTo(Point, Point, Point),
    CubicCurveToRelative(Point, Point, Point),
    SmoothCubicCurveTo(Point, Point),
    SmoothCubicCurveToRelative(Point, Point),
    QuadraticCurveTo(Point, Point),
    QuadraticCurveToRelative(Point, Point),
    SmoothQuadraticCurveTo(Point),
    SmoothQuadraticCurveToRelative(Point),
    EllipticalArcTo {
        radii: Point,
        rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        point: Point,
    },
    EllipticalArcToRelative {
        radii: Point,
        rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        point: Point,
    },
    Close,
}

impl SvgPathCmd {
    /// Name of the shape method this command is replayed with
    pub fn name(&self) -> &'static str {
        use SvgPathCmd::*;
        match self {
            MoveTo(..) => "moveTo",
            MoveToRelative(..) => "moveToRelative",
            LineTo(..) => "lineTo",
            LineToRelative(..) => "lineToRelative",
            HorizontalLineTo(..) => "horizontalLineTo",
            HorizontalLineToRelative(..) => "horizontalLineToRelative",
            VerticalLineTo(..) => "verticalLineTo",
            VerticalLineToRelative(..) => "verticalLineToRelative",
            CubicCurveTo(..) => "cubicCurveTo",
            CubicCurveToRelative(..) => "cubicCurveToRelative",
            SmoothCubicCurveTo(..) => "smoothCubicCurveTo",
            SmoothCubicCurveToRelative(..) => "smoothCubicCurveToRelative",
            QuadraticCurveTo(..) => "quadraticCurveTo",
            QuadraticCurveToRelative(..) => "quadraticCurveToRelative",
            SmoothQuadraticCurveTo(..) => "smoothQuadraticCurveTo",
            SmoothQuadraticCurveToRelative(..) => "smoothQuadraticCurveToRelative",
            EllipticalArcTo { .. } => "ellipticalArcTo",
            EllipticalArcToRelative { .. } => "ellipticalArcToRelative",
            Close => "close",
        }
    }

    /// Apply SVG command to the shape
    pub fn apply(&self, shape: &mut Shape) {
        use SvgPathCmd::*;
        match *self {
            MoveTo(p) => shape.move_to(p),
            MoveToRelative(p) => shape.move_to_relative(p),
            LineTo(p) => shape.line_to(p),
            LineToRelative(p) => shape.line_to_relative(p),
            HorizontalLineTo(x) => shape.horizontal_line_to(x),
            HorizontalLineToRelative(x) => shape.horizontal_line_to_relative(x),
            VerticalLineTo(y) => shape.vertical_line_to(y),
            VerticalLineToRelative(y) => shape.vertical_line_to_relative(y),
            CubicCurveTo(p1, p2, p3) => shape.cubic_curve_to(p1, p2, p3),
            CubicCurveToRelative(p1, p2, p3) => shape.cubic_curve_to_relative(p1, p2, p3),
            SmoothCubicCurveTo(p2, p3) => shape.smooth_cubic_curve_to(p2, p3),
            SmoothCubicCurveToRelative(p2, p3) => shape.smooth_cubic_curve_to_relative(p2, p3),
            QuadraticCurveTo(p1, p2) => shape.quadratic_curve_to(p1, p2),
            QuadraticCurveToRelative(p1, p2) => shape.quadratic_curve_to_relative(p1, p2),
            SmoothQuadraticCurveTo(p) => shape.smooth_quadratic_curve_to(p),
            SmoothQuadraticCurveToRelative(p) => shape.smooth_quadratic_curve_to_relative(p),
            EllipticalArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                point,
            } => shape.elliptical_arc_to(radii, rotation, large_arc, sweep, point),
            EllipticalArcToRelative {
                radii,
                rotation,
                large_arc,
                sweep,
                point,
            } => shape.elliptical_arc_to_relative(radii, rotation, large_arc, sweep, point),
            Close => shape.close(),
        };
    }
}

/// Location in the parsed text, both line and column start from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

struct Parser<I> {
    input: I,
    input_buffer: Option<u8>,
    // position of the next byte
    position: Position,
    // position before the last consumed byte
    last_position: Position,
    // bytes of the scalar being parsed
    scalar: Vec<u8>,
}

impl<I: Read> Parser<I> {
    fn new(input: I) -> Self {
        Self {
            input,
            input_buffer: None,
            position: Position::default(),
            last_position: Position::default(),
            scalar: Vec::new(),
        }
    }

    fn position(&self) -> Position {
        self.position
    }

    // consume single byte from the input
    fn parse_byte(&mut self) -> Result<Option<u8>, SvgParserError> {
        let byte = match self.input_buffer.take() {
            None => {
                let mut byte = [0; 1];
                if self.input.read(&mut byte)? != 0 {
                    Some(byte[0])
                } else {
                    None
                }
            }
            byte => byte,
        };
        if let Some(byte) = byte {
            self.last_position = self.position;
            if byte == b'\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
        Ok(byte)
    }

    // put byte into input buffer, at most one byte is cached
    fn unparse_byte(&mut self, byte: u8) {
        debug_assert!(self.input_buffer.is_none());
        self.input_buffer = Some(byte);
        self.position = self.last_position;
    }

    // look at the next byte without consuming it
    fn peek_byte(&mut self) -> Result<Option<u8>, SvgParserError> {
        let byte = self.parse_byte()?;
        if let Some(byte) = byte {
            self.unparse_byte(byte);
        }
        Ok(byte)
    }

    // consume input while `pred` predicate is true
    fn parse_while(
        &mut self,
        mut pred: impl FnMut(u8) -> bool,
        mut proc: impl FnMut(u8),
    ) -> Result<usize, SvgParserError> {
        let mut count = 0;
        loop {
            let byte = match self.parse_byte()? {
                None => break,
                Some(byte) => byte,
            };
            if !pred(byte) {
                self.unparse_byte(byte);
                break;
            }
            count += 1;
            proc(byte);
        }
        Ok(count)
    }

    // consume at most one byte from the input, if predicate returns true
    fn parse_once(
        &mut self,
        pred: impl FnOnce(u8) -> bool,
        proc: impl FnOnce(u8),
    ) -> Result<bool, SvgParserError> {
        let byte = match self.parse_byte()? {
            None => return Ok(false),
            Some(byte) => byte,
        };
        if pred(byte) {
            proc(byte);
            Ok(true)
        } else {
            self.unparse_byte(byte);
            Ok(false)
        }
    }

    // consume separators from the input
    fn parse_separators(&mut self) -> Result<(), SvgParserError> {
        self.parse_while(
            |byte| matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b','),
            |_| {},
        )?;
        Ok(())
    }

    fn invalid_scalar(&mut self) -> Result<SvgParserError, SvgParserError> {
        let position = self.position();
        let found = self.peek_byte()?.map(char::from);
        Ok(SvgParserError::InvalidScalar { found, position })
    }

    // parse single scalar value from the input
    fn parse_scalar(&mut self) -> Result<Scalar, SvgParserError> {
        self.parse_separators()?;
        let start = self.position();
        let mut scalar = std::mem::take(&mut self.scalar);
        scalar.clear();

        self.parse_once(
            |byte| matches!(byte, b'-' | b'+'),
            |byte| {
                if byte == b'-' {
                    scalar.push(byte)
                }
            },
        )?;
        let whole = self.parse_while(|byte| byte.is_ascii_digit(), |byte| scalar.push(byte))?;
        let matches_dot = self.parse_once(|byte| byte == b'.', |_| {})?;
        let frac = if matches_dot {
            if whole == 0 {
                scalar.push(b'0');
            }
            scalar.push(b'.');
            let frac = self.parse_while(|byte| byte.is_ascii_digit(), |byte| scalar.push(byte))?;
            if frac == 0 {
                scalar.push(b'0');
            }
            frac
        } else {
            0
        };
        if whole + frac == 0 {
            self.scalar = scalar;
            let found = self.peek_byte()?.map(char::from);
            return Err(SvgParserError::InvalidScalar {
                found,
                position: start,
            });
        }

        let matches_exp = self.parse_once(|byte| matches!(byte, b'e' | b'E'), |_| {})?;
        if matches_exp {
            scalar.push(b'e');
            self.parse_once(
                |byte| matches!(byte, b'-' | b'+'),
                |byte| {
                    if byte == b'-' {
                        scalar.push(byte)
                    }
                },
            )?;
            let digits = self.parse_while(|byte| byte.is_ascii_digit(), |byte| scalar.push(byte))?;
            if digits == 0 {
                self.scalar = scalar;
                return Err(self.invalid_scalar()?);
            }
        }

        let value = lexical_core::parse::<Scalar>(&scalar);
        self.scalar = scalar;
        value.map_err(|_| SvgParserError::InvalidScalar {
            found: None,
            position: start,
        })
    }
}

/// Path parser for SVG encoded path
///
/// See [SVG Path Specification](https://www.w3.org/TR/SVG11/paths.html#PathData)
pub struct SvgPathParser<I> {
    parser: Parser<I>,
    // previous operation, repeated when arguments follow without a command
    prev_op: Option<u8>,
}

impl<I: Read> SvgPathParser<I> {
    pub fn new(input: I) -> Self {
        Self {
            parser: Parser::new(input),
            prev_op: None,
        }
    }

    // parse pair of scalars and convert it to a point
    fn parse_point(&mut self) -> Result<Point, SvgParserError> {
        let x = self.parser.parse_scalar()?;
        let y = self.parser.parse_scalar()?;
        Ok(Point::new(x, y))
    }

    // parse flag `0|1` used by elliptic arc command
    fn parse_flag(&mut self) -> Result<bool, SvgParserError> {
        self.parser.parse_separators()?;
        let position = self.parser.position();
        match self.parser.parse_byte()? {
            Some(b'0') => Ok(false),
            Some(b'1') => Ok(true),
            byte => {
                if let Some(byte) = byte {
                    self.parser.unparse_byte(byte);
                }
                Err(SvgParserError::InvalidFlag {
                    found: byte.map(char::from),
                    position,
                })
            }
        }
    }

    // parse svg command, none indicates end of input
    fn parse_op(&mut self) -> Result<Option<u8>, SvgParserError> {
        let position = self.parser.position();
        let op = match self.parser.parse_byte()? {
            None => return Ok(None),
            Some(op) => op,
        };
        match op {
            b'M' | b'm' | b'L' | b'l' | b'V' | b'v' | b'H' | b'h' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'A' | b'a' | b'Z' | b'z' => {
                self.prev_op = match op {
                    b'm' => Some(b'l'),
                    b'M' => Some(b'L'),
                    b'Z' | b'z' => None,
                    _ => Some(op),
                };
                Ok(Some(op))
            }
            byte => {
                self.parser.unparse_byte(byte);
                let is_scalar = byte.is_ascii_digit() || matches!(byte, b'.' | b'-' | b'+');
                match self.prev_op {
                    Some(op) if is_scalar => Ok(Some(op)),
                    _ => Err(SvgParserError::InvalidCmd {
                        found: Some(char::from(byte)),
                        position,
                    }),
                }
            }
        }
    }

    /// Parse single SVG path command from the input
    pub fn parse_cmd(&mut self) -> Result<Option<SvgPathCmd>, SvgParserError> {
        self.parser.parse_separators()?;
        let op = match self.parse_op()? {
            None => return Ok(None),
            Some(op) => op,
        };
        let cmd = match op {
            b'M' => SvgPathCmd::MoveTo(self.parse_point()?),
            b'm' => SvgPathCmd::MoveToRelative(self.parse_point()?),
            b'L' => SvgPathCmd::LineTo(self.parse_point()?),
            b'l' => SvgPathCmd::LineToRelative(self.parse_point()?),
            b'H' => SvgPathCmd::HorizontalLineTo(self.parser.parse_scalar()?),
            b'h' => SvgPathCmd::HorizontalLineToRelative(self.parser.parse_scalar()?),
            b'V' => SvgPathCmd::VerticalLineTo(self.parser.parse_scalar()?),
            b'v' => SvgPathCmd::VerticalLineToRelative(self.parser.parse_scalar()?),
            b'C' => SvgPathCmd::CubicCurveTo(
                self.parse_point()?,
                self.parse_point()?,
                self.parse_point()?,
            ),
            b'c' => SvgPathCmd::CubicCurveToRelative(
                self.parse_point()?,
                self.parse_point()?,
                self.parse_point()?,
            ),
            b'S' => SvgPathCmd::SmoothCubicCurveTo(self.parse_point()?, self.parse_point()?),
            b's' => {
                SvgPathCmd::SmoothCubicCurveToRelative(self.parse_point()?, self.parse_point()?)
            }
            b'Q' => SvgPathCmd::QuadraticCurveTo(self.parse_point()?, self.parse_point()?),
            b'q' => SvgPathCmd::QuadraticCurveToRelative(self.parse_point()?, self.parse_point()?),
            b'T' => SvgPathCmd::SmoothQuadraticCurveTo(self.parse_point()?),
            b't' => SvgPathCmd::SmoothQuadraticCurveToRelative(self.parse_point()?),
            b'A' | b'a' => {
                let radius_x = self.parser.parse_scalar()?;
                let radius_y = self.parser.parse_scalar()?;
                let rotation = self.parser.parse_scalar()?;
                let large_arc = self.parse_flag()?;
                let sweep = self.parse_flag()?;
                let point = self.parse_point()?;
                let radii = Point::new(radius_x, radius_y);
                if op == b'A' {
                    SvgPathCmd::EllipticalArcTo {
                        radii,
                        rotation,
                        large_arc,
                        sweep,
                        point,
                    }
                } else {
                    SvgPathCmd::EllipticalArcToRelative {
                        radii,
                        rotation,
                        large_arc,
                        sweep,
                        point,
                    }
                }
            }
            _ => SvgPathCmd::Close,
        };
        Ok(Some(cmd))
    }
}

impl<I: Read> Iterator for SvgPathParser<I> {
    type Item = Result<SvgPathCmd, SvgParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parse_cmd().transpose()
    }
}

/// Error while parsing path in the SVG format or loading line styles
#[derive(Debug)]
pub enum SvgParserError {
    /// Failed to parse SVG command
    InvalidCmd {
        found: Option<char>,
        position: Position,
    },
    /// Failed to parse scalar value
    InvalidScalar {
        found: Option<char>,
        position: Position,
    },
    /// Failed to parse flag value
    InvalidFlag {
        found: Option<char>,
        position: Position,
    },
    /// Unknown keyword (line cap, line join)
    InvalidKeyword(String),
    /// JSON error
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
    /// IO error propagated while reading input stream
    IoError(std::io::Error),
}

fn fmt_found(f: &mut fmt::Formatter<'_>, found: &Option<char>) -> fmt::Result {
    match found {
        Some(found) => write!(f, "{:?}", found),
        None => write!(f, "end of input"),
    }
}

impl fmt::Display for SvgParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SvgParserError::*;
        match self {
            InvalidCmd { found, position } => {
                write!(f, "invalid command ")?;
                fmt_found(f, found)?;
                write!(f, " at {}", position)
            }
            InvalidScalar { found, position } => {
                write!(f, "invalid number ")?;
                fmt_found(f, found)?;
                write!(f, " at {}", position)
            }
            InvalidFlag { found, position } => {
                write!(f, "invalid flag ")?;
                fmt_found(f, found)?;
                write!(f, " at {}", position)
            }
            InvalidKeyword(keyword) => write!(f, "invalid keyword {:?}", keyword),
            #[cfg(feature = "serde")]
            Json(error) => write!(f, "json error: {}", error),
            IoError(error) => write!(f, "io error: {}", error),
        }
    }
}

impl From<std::io::Error> for SvgParserError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for SvgParserError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<SvgParserError> for std::io::Error {
    fn from(error: SvgParserError) -> Self {
        match error {
            SvgParserError::IoError(error) => error,
            _ => Self::new(std::io::ErrorKind::InvalidData, error),
        }
    }
}

impl std::error::Error for SvgParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "serde")]
            SvgParserError::Json(error) => Some(error),
            SvgParserError::IoError(error) => Some(error),
            _ => None,
        }
    }
}
