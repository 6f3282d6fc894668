//! Utility functions and types used accross the library
use crate::{EPSILON, EPSILON_SQRT, PI, Point, Scalar};
use std::{fmt, iter::FromIterator};

/// Wrap `value` into `[lower, upper)` range by adding or subtracting multiples of its length
pub fn modulo_between_down(value: Scalar, lower: Scalar, upper: Scalar) -> Scalar {
    lower + (value - lower).rem_euclid(upper - lower)
}

/// Wrap `value` into `(lower, upper]` range by adding or subtracting multiples of its length
pub fn modulo_between_up(value: Scalar, lower: Scalar, upper: Scalar) -> Scalar {
    upper - (upper - value).rem_euclid(upper - lower)
}

/// Intersection point of two infinite lines, passing through `p0, p1` and `p2, p3`
///
/// Returns `None` if lines are parallel.
pub fn line_line_intersection(p0: Point, p1: Point, p2: Point, p3: Point) -> Option<Point> {
    let Point([x1, y1]) = p0;
    let Point([x2, y2]) = p1;
    let Point([x3, y3]) = p2;
    let Point([x4, y4]) = p3;
    let x12 = x1 - x2;
    let x34 = x3 - x4;
    let y12 = y1 - y2;
    let y34 = y3 - y4;
    let denom = x12 * y34 - y12 * x34;
    if denom.abs() < 1e-10 {
        return None;
    }
    let a = x1 * y2 - y1 * x2;
    let b = x3 * y4 - y3 * x4;
    Some(Point::new(
        (a * x34 - x12 * b) / denom,
        (a * y34 - y12 * b) / denom,
    ))
}

/// Whether three points lie on the same line, `eps` bounds area of the triangle they form
pub fn points_collinear(p0: Point, p1: Point, p2: Point, eps: Scalar) -> bool {
    ((p1 - p0).cross(p2 - p0) / 2.0).abs() <= eps
}

/// Roots closer than this to the `[0, 1]` interval are snapped onto it
pub(crate) const UNIT_ROOT_EPSILON: Scalar = 1e-9;

/// Fixed capacity iterator
///
/// Stores up to `N` items inline, pushing past the capacity panics.
#[derive(Clone, Copy)]
pub struct ArrayIter<T, const N: usize> {
    start: usize,
    end: usize,
    items: [Option<T>; N],
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for ArrayIter<T, N> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_list()
            .entries(self.items[self.start..self.end].iter().flatten())
            .finish()
    }
}

impl<T, const N: usize> Default for ArrayIter<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> ArrayIter<T, N> {
    pub fn new() -> Self {
        Self {
            start: 0,
            end: 0,
            items: [const { None }; N],
        }
    }

    /// Push new element to the end of the iterator
    pub fn push(&mut self, item: T) {
        assert!(self.end < N, "ArrayIter capacity {} exceeded", N);
        self.items[self.end] = Some(item);
        self.end += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of unconsumed elements
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl<T, const N: usize> Extend<T> for ArrayIter<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T, const N: usize> FromIterator<T> for ArrayIter<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut result = Self::new();
        result.extend(iter);
        result
    }
}

impl<T, const N: usize> Iterator for ArrayIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start < self.end {
            let item = self.items[self.start].take();
            self.start += 1;
            item
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<T, const N: usize> DoubleEndedIterator for ArrayIter<T, N> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.start < self.end {
            self.end -= 1;
            self.items[self.end].take()
        } else {
            None
        }
    }
}

impl<T, const N: usize> ExactSizeIterator for ArrayIter<T, N> {}

/// Keep only roots that are curve parameters, that is lie inside `[0, 1]`
///
/// Roots within [UNIT_ROOT_EPSILON] outside of the interval are clamped onto
/// its ends, so that curves passing exactly through their end points are not missed.
pub(crate) fn unit_roots<const N: usize>(
    roots: impl IntoIterator<Item = Scalar>,
) -> ArrayIter<Scalar, N> {
    roots
        .into_iter()
        .filter(|t| (-UNIT_ROOT_EPSILON..=1.0 + UNIT_ROOT_EPSILON).contains(t))
        .map(|t| t.clamp(0.0, 1.0))
        .collect()
}

/// Solve quadratic equation `a * t ^ 2 + b * t + c = 0` for `t`
///
/// Leading coefficient is treated as zero when it is negligible relative to the
/// others, which is what happens with curves whose control points are (almost) aligned.
pub(crate) fn quadratic_solve(a: Scalar, b: Scalar, c: Scalar) -> ArrayIter<Scalar, 2> {
    let mut result = ArrayIter::new();
    if a.abs() <= EPSILON * b.abs().max(c.abs()) {
        // linear, `b == 0` either has no roots or every `t` is a root
        if b.abs() > EPSILON * c.abs() {
            result.push(-c / b);
        }
        return result;
    }
    let disc = b * b - 4.0 * a * c;
    if disc.abs() <= EPSILON * (b * b).max((4.0 * a * c).abs()) {
        result.push(-b / (2.0 * a));
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        // avoid cancellation: https://people.csail.mit.edu/bkph/articles/Quadratics.pdf
        if b >= 0.0 {
            let mul = -b - sq;
            result.push(mul / (2.0 * a));
            result.push(2.0 * c / mul);
        } else {
            let mul = -b + sq;
            result.push(2.0 * c / mul);
            result.push(mul / (2.0 * a));
        }
    }
    result
}

/// Solve cubic equation `a * t ^ 3 + b * t ^ 2 + c * t + d = 0` for `t`
///
/// Trigonometric method is used when there are three real roots, Cardano's
/// formula otherwise.
#[allow(clippy::many_single_char_names)]
pub(crate) fn cubic_solve(a: Scalar, b: Scalar, c: Scalar, d: Scalar) -> ArrayIter<Scalar, 3> {
    let mut result = ArrayIter::new();
    let scale = b.abs().max(c.abs()).max(d.abs());
    if a.abs() <= EPSILON_SQRT * scale {
        result.extend(quadratic_solve(b, c, d));
        return result;
    }
    if d.abs() <= EPSILON * a.abs().max(scale) {
        result.push(0.0);
        result.extend(quadratic_solve(a, b, c));
        return result;
    }

    fn cbrt(value: Scalar) -> Scalar {
        if value < 0.0 {
            -(-value).powf(1.0 / 3.0)
        } else {
            value.powf(1.0 / 3.0)
        }
    }

    // monic `t ^ 3 + a * t ^ 2 + b * t + c = 0`
    let (a, b, c) = (b / a, c / a, d / a);

    // depressed `t ^ 3 + p * t + q = 0`
    let p = (3.0 * b - a * a) / 3.0;
    let q = ((2.0 * a * a - 9.0 * b) * a + 27.0 * c) / 27.0;
    let p3 = p / 3.0;
    let q2 = q / 2.0;
    let disc = q2 * q2 + p3 * p3 * p3;

    if disc.abs() < EPSILON {
        // double root
        let u1 = if q2 < 0.0 { cbrt(-q2) } else { -cbrt(q2) };
        result.push(2.0 * u1 - a / 3.0);
        result.push(-u1 - a / 3.0);
    } else if disc > 0.0 {
        let sd = disc.sqrt();
        result.push(cbrt(sd - q2) - cbrt(sd + q2) - a / 3.0);
    } else {
        let r = (-p3 * p3 * p3).sqrt();
        let phi = (-q / (2.0 * r)).clamp(-1.0, 1.0).acos();
        let c = 2.0 * cbrt(r);
        let a3 = a / 3.0;
        result.push(c * (phi / 3.0).cos() - a3);
        result.push(c * ((phi + 2.0 * PI) / 3.0).cos() - a3);
        result.push(c * ((phi + 4.0 * PI) / 3.0).cos() - a3);
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[macro_export]
    macro_rules! assert_approx_eq {
        ( $v0:expr, $v1: expr ) => {{
            assert!(($v0 - $v1).abs() < $crate::EPSILON, "{} != {}", $v0, $v1);
        }};
        ( $v0:expr, $v1: expr, $e: expr ) => {{
            assert!(($v0 - $v1).abs() < $e, "{} != {}", $v0, $v1);
        }};
    }

    fn check_roots(roots: impl Iterator<Item = Scalar>, expected: &[Scalar]) {
        let roots: Vec<_> = roots.collect();
        assert_eq!(roots.len(), expected.len(), "{:?} != {:?}", roots, expected);
        for (root, root_ref) in roots.iter().zip(expected) {
            assert_approx_eq!(root, root_ref, 1e-5);
        }
    }

    #[test]
    fn test_solve() {
        // three, two and one real roots
        check_roots(cubic_solve(1.0, -6.0, 11.0, -6.0), &[3.0, 1.0, 2.0]);
        check_roots(cubic_solve(1.0, 0.0, -12.0, 16.0), &[-4.0, 2.0]);
        check_roots(cubic_solve(23.0, 17.0, -11.0, 13.0), &[-1.38148]);

        // constant term vanishes
        check_roots(cubic_solve(1.0, -3.0, 2.0, 0.0), &[0.0, 1.0, 2.0]);

        // cubic bezier with evenly spaced control points is the line `y = 2t - 1`
        let (y0, y1, y2, y3) = (-1.0, -1.0 / 3.0, 1.0 / 3.0, 1.0);
        let a = -y0 + 3.0 * y1 - 3.0 * y2 + y3;
        let b = 3.0 * y0 - 6.0 * y1 + 3.0 * y2;
        let c = -3.0 * y0 + 3.0 * y1;
        check_roots(cubic_solve(a, b, c, y0), &[0.5]);

        // tiny relative leading coefficients fall through to lower degree
        check_roots(cubic_solve(1e-12, 1.0, -5.0, 6.0), &[2.0, 3.0]);
        check_roots(quadratic_solve(1e-20, 4.0, -2.0), &[0.5]);

        // quadratic
        check_roots(quadratic_solve(1.0, -5.0, 6.0), &[2.0, 3.0]);
        check_roots(quadratic_solve(1.0, -6.0, 9.0), &[3.0]);
        check_roots(quadratic_solve(1.0, 3.0, 5.0), &[]);

        // scaled down quadratic still has a double root
        check_roots(quadratic_solve(1e-9, -6e-9, 9e-9), &[3.0]);

        // linear and degenerate
        check_roots(cubic_solve(0.0, 0.0, 5.0, 10.0), &[-2.0]);
        check_roots(quadratic_solve(0.0, 0.0, 1.0), &[]);
        check_roots(quadratic_solve(0.0, 0.0, 0.0), &[]);
    }

    #[test]
    fn test_unit_roots() {
        let roots: ArrayIter<Scalar, 3> = unit_roots([-1e-15, 0.5, 1.0 + 1e-12]);
        check_roots(roots, &[0.0, 0.5, 1.0]);
        let roots: ArrayIter<Scalar, 3> = unit_roots([-0.1, 1.1, 0.25]);
        check_roots(roots, &[0.25]);
    }

    #[test]
    fn test_modulo_between() {
        assert_approx_eq!(modulo_between_down(-0.5, 0.0, 2.0), 1.5);
        assert_approx_eq!(modulo_between_down(2.0, 0.0, 2.0), 0.0);
        assert_approx_eq!(modulo_between_down(0.0, 0.0, 2.0), 0.0);
        assert_approx_eq!(modulo_between_up(0.0, 0.0, 2.0), 2.0);
        assert_approx_eq!(modulo_between_up(5.0, 0.0, 2.0), 1.0);
        assert_approx_eq!(modulo_between_down(7.0 * PI, 0.0, 2.0 * PI), PI, 1e-12);
    }

    #[test]
    fn test_line_line_intersection() {
        let p = line_line_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        )
        .unwrap();
        assert!(p.is_close_to_eps(Point::new(1.0, 1.0), 1e-12));
        let parallel = line_line_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        );
        assert!(parallel.is_none());
    }

    #[test]
    fn test_points_collinear() {
        let p0 = Point::new(0.0, 0.0);
        assert!(points_collinear(p0, Point::new(5.0, 0.0), Point::new(10.0, 0.0), EPSILON));
        assert!(points_collinear(p0, Point::new(-3.0, -3.0), Point::new(1.0, 1.0), EPSILON));
        assert!(!points_collinear(p0, Point::new(5.0, 1.0), Point::new(10.0, 0.0), EPSILON));
    }

    #[test]
    fn test_array_iter() {
        let mut iter: ArrayIter<u32, 5> = (0..5).collect();
        assert_eq!(format!("{:?}", iter), "[0, 1, 2, 3, 4]");
        assert_eq!(iter.len(), 5);
        assert!(!iter.is_empty());
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next_back(), Some(2));
        assert_eq!(iter.len(), 0);
        assert!(iter.is_empty());
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    #[should_panic]
    fn test_array_iter_overflow() {
        let _: ArrayIter<u32, 2> = (0..3).collect();
    }
}
