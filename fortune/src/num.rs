//! Tolerant floating-point comparisons.
//!
//! The sweep works in plain `f64`s, so almost every decision that compares two
//! computed coordinates goes through one of these helpers instead of `==` or `<`.

/// The default comparison tolerance.
pub const EPSILON: f64 = 1e-9;

/// Are `a` and `b` within `eps` of one another?
#[inline]
pub fn eq_eps(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

/// Is `a` smaller than `b` by more than `eps`?
#[inline]
pub fn lt_eps(a: f64, b: f64, eps: f64) -> bool {
    b - a > eps
}

/// Is `a` larger than `b` by more than `eps`?
#[inline]
pub fn gt_eps(a: f64, b: f64, eps: f64) -> bool {
    a - b > eps
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    // Kind of like Arbitrary, but it only returns coordinates that keep the
    // geometry well away from overflow.
    pub fn reasonable() -> BoxedStrategy<f64> {
        (-1e3..1e3).boxed()
    }

    #[test]
    fn within_tolerance() {
        assert!(eq_eps(1.0, 1.0 + 1e-10, EPSILON));
        assert!(!eq_eps(1.0, 1.0 + 1e-8, EPSILON));

        assert!(lt_eps(1.0, 1.0 + 1e-8, EPSILON));
        assert!(!lt_eps(1.0, 1.0 + 1e-10, EPSILON));
        assert!(!lt_eps(1.0, 1.0, EPSILON));

        assert!(gt_eps(1.0 + 1e-8, 1.0, EPSILON));
        assert!(!gt_eps(1.0 + 1e-10, 1.0, EPSILON));
    }

    proptest! {
        #[test]
        fn trichotomy(a in reasonable(), b in reasonable()) {
            let outcomes = [eq_eps(a, b, EPSILON), lt_eps(a, b, EPSILON), gt_eps(a, b, EPSILON)];
            // Exactly one holds unless the difference sits right on the tolerance.
            if ((a - b).abs() - EPSILON).abs() > 1e-12 {
                prop_assert_eq!(outcomes.iter().filter(|o| **o).count(), 1);
            }
        }
    }
}
