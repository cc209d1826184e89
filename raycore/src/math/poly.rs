//! Closed-form real root finding for polynomials up to degree four.
//!
//! Coefficients are given lowest degree first: `c[0] + c[1] x + c[2] x^2 + ...`.
//! Roots are returned unsorted.

use std::f64::consts::PI;

const ZERO: f64 = 1e-9;

/// Tolerance relative to the magnitude of the terms being compared.
const RELATIVE: f64 = 1e-12;

fn is_zero(v: f64) -> bool {
    v.abs() < ZERO
}

/// Whether `lead` is negligible next to the coefficient below it.
fn is_degenerate(lead: f64, next: f64) -> bool {
    lead == 0. || lead.abs() <= RELATIVE * next.abs()
}

/// Real roots of `c[2] x^2 + c[1] x + c[0]`.
pub fn solve_quadratic(c: [f64; 3]) -> Vec<f64> {
    if is_degenerate(c[2], c[1]) {
        if c[1] == 0. {
            return vec![];
        }
        return vec![-c[0] / c[1]];
    }

    // normal form x^2 + 2p x + q
    let p = c[1] / (2. * c[2]);
    let q = c[0] / c[2];
    let d = p * p - q;

    if d.abs() <= RELATIVE * (p * p).max(q.abs()) {
        vec![-p]
    } else if d < 0. {
        vec![]
    } else {
        let sqrt_d = d.sqrt();
        vec![sqrt_d - p, -sqrt_d - p]
    }
}

/// Real roots of `c[3] x^3 + c[2] x^2 + c[1] x + c[0]`.
pub fn solve_cubic(c: [f64; 4]) -> Vec<f64> {
    if is_degenerate(c[3], c[2]) {
        return solve_quadratic([c[0], c[1], c[2]]);
    }

    // normal form x^3 + A x^2 + B x + C
    let a = c[2] / c[3];
    let b = c[1] / c[3];
    let cc = c[0] / c[3];

    // substitute x = y - A/3 to eliminate the quadric term: y^3 + 3p y + 2q = 0
    let sq_a = a * a;
    let p = (-sq_a / 3. + b) / 3.;
    let q = (2. / 27. * a * sq_a - a * b / 3. + cc) / 2.;

    let cb_p = p * p * p;
    let d = q * q + cb_p;

    let mut roots = if is_zero(d) {
        if is_zero(q) {
            vec![0.]
        } else {
            let u = (-q).cbrt();
            vec![2. * u, -u]
        }
    } else if d < 0. {
        // casus irreducibilis: three real roots
        let phi = (-q / (-cb_p).sqrt()).clamp(-1., 1.).acos() / 3.;
        let t = 2. * (-p).sqrt();
        vec![
            t * phi.cos(),
            -t * (phi + PI / 3.).cos(),
            -t * (phi - PI / 3.).cos(),
        ]
    } else {
        let sqrt_d = d.sqrt();
        let u = (sqrt_d - q).cbrt();
        let v = -(sqrt_d + q).cbrt();
        vec![u + v]
    };

    let sub = a / 3.;
    for r in roots.iter_mut() {
        *r -= sub;
    }
    roots
}

/// Real roots of `c[4] x^4 + c[3] x^3 + c[2] x^2 + c[1] x + c[0]`, each refined
/// with a couple of Newton steps against the original polynomial.
pub fn solve_quartic(c: [f64; 5]) -> Vec<f64> {
    if is_degenerate(c[4], c[3]) {
        return solve_cubic([c[0], c[1], c[2], c[3]]);
    }

    // normal form x^4 + A x^3 + B x^2 + C x + D
    let a = c[3] / c[4];
    let b = c[2] / c[4];
    let cc = c[1] / c[4];
    let d = c[0] / c[4];

    // substitute x = y - A/4 to eliminate the cubic term: y^4 + p y^2 + q y + r = 0
    let sq_a = a * a;
    let p = -3. / 8. * sq_a + b;
    let q = sq_a * a / 8. - a * b / 2. + cc;
    let r = -3. / 256. * sq_a * sq_a + sq_a * b / 16. - a * cc / 4. + d;

    let mut roots = if is_zero(r) {
        // no absolute term: y (y^3 + p y + q) = 0
        let mut roots = solve_cubic([q, p, 0., 1.]);
        roots.push(0.);
        roots
    } else {
        // one real root of the resolvent cubic
        let z = match solve_cubic([r * p / 2. - q * q / 8., -r, -p / 2., 1.]).first() {
            Some(&z) => z,
            None => return vec![],
        };

        // build two quadratic equations from it
        let mut u = z * z - r;
        let mut v = 2. * z - p;

        if is_zero(u) {
            u = 0.;
        } else if u > 0. {
            u = u.sqrt();
        } else {
            return vec![];
        }

        if is_zero(v) {
            v = 0.;
        } else if v > 0. {
            v = v.sqrt();
        } else {
            return vec![];
        }

        let mut roots = solve_quadratic([z - u, if q < 0. { -v } else { v }, 1.]);
        roots.extend(solve_quadratic([z + u, if q < 0. { v } else { -v }, 1.]));
        roots
    };

    let sub = a / 4.;
    for root in roots.iter_mut() {
        *root = polish(&c, *root - sub);
    }
    roots
}

fn polish(c: &[f64; 5], mut x: f64) -> f64 {
    for _ in 0..2 {
        let f = (((c[4] * x + c[3]) * x + c[2]) * x + c[1]) * x + c[0];
        let df = ((4. * c[4] * x + 3. * c[3]) * x + 2. * c[2]) * x + c[1];
        if df.abs() < ZERO {
            break;
        }
        x -= f / df;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<f64>) -> Vec<f64> {
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    fn assert_roots(found: Vec<f64>, expected: &[f64]) {
        let found = sorted(found);
        assert_eq!(found.len(), expected.len(), "roots: {:?}", found);
        for (f, e) in found.iter().zip(expected) {
            assert!((f - e).abs() < 1e-6, "found {} expected {}", f, e);
        }
    }

    #[test]
    fn quadratic_two_roots() {
        // (x - 1)(x - 3)
        assert_roots(solve_quadratic([3., -4., 1.]), &[1., 3.]);
    }

    #[test]
    fn quadratic_no_roots() {
        assert!(solve_quadratic([1., 0., 1.]).is_empty());
    }

    #[test]
    fn quadratic_tiny_leading_coefficient() {
        // 1e-10 (x - 1)(x - 2)
        assert_roots(solve_quadratic([2e-10, -3e-10, 1e-10]), &[1., 2.]);
    }

    #[test]
    fn quadratic_close_roots() {
        // (x - 1)(x - 1.00001)
        assert_roots(solve_quadratic([1.00001, -2.00001, 1.]), &[1., 1.00001]);
    }

    #[test]
    fn linear_and_constant() {
        assert_roots(solve_quadratic([-2., 4., 0.]), &[0.5]);
        assert!(solve_quadratic([-1., 0., 0.]).is_empty());
    }

    #[test]
    fn cubic_three_roots() {
        // (x + 1)(x - 2)(x - 4) = x^3 - 5x^2 + 2x + 8
        assert_roots(solve_cubic([8., 2., -5., 1.]), &[-1., 2., 4.]);
    }

    #[test]
    fn cubic_one_root() {
        // (x - 1)(x^2 + 1) = x^3 - x^2 + x - 1
        assert_roots(solve_cubic([-1., 1., -1., 1.]), &[1.]);
    }

    #[test]
    fn quartic_four_roots() {
        // (x - 1)(x - 2)(x - 3)(x - 4) = x^4 - 10x^3 + 35x^2 - 50x + 24
        assert_roots(solve_quartic([24., -50., 35., -10., 1.]), &[1., 2., 3., 4.]);
    }

    #[test]
    fn quartic_two_roots() {
        // (x^2 - 4)(x^2 + 1) = x^4 - 3x^2 - 4
        assert_roots(solve_quartic([-4., 0., -3., 0., 1.]), &[-2., 2.]);
    }

    #[test]
    fn quartic_no_roots() {
        // (x^2 + 1)^2
        assert!(solve_quartic([1., 0., 2., 0., 1.]).is_empty());
    }
}
