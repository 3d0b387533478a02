//! Phase unwrapping and anchored finite differences.
//!
//! The difference operators keep one anchor value per lane so that the
//! matching integration is an exact inverse:
//!
//! | stencil  | interior                  | anchors                          |
//! |----------|---------------------------|----------------------------------|
//! | forward  | `p[i+1] - p[i]`           | last entry holds `p[N-1]`        |
//! | backward | `p[i] - p[i-1]`           | first entry holds `p[0]`         |
//! | central  | `(p[i+1] - p[i-1]) / 2`   | `p[0]` first, `p[N-1] - p[N-2]` last |
//!
//! All functions work in place on every 1-D lane along the given axis.

use std::f64::consts::{PI, TAU};

use ndarray::{ArrayD, ArrayViewMut1, Axis};

use crate::operations::types::IfMethod;

/// Removes `2π` discontinuities along `axis`, in place.
///
/// Follows the usual rule: a jump larger than `π` between neighbours is
/// treated as a wrap and corrected by the nearest multiple of `2π`.
pub fn unwrap(x: &mut ArrayD<f64>, axis: Axis) {
    for lane in x.lanes_mut(axis) {
        unwrap_lane(lane);
    }
}

/// Replaces every lane along `axis` by its anchored finite difference.
pub fn differentiate(x: &mut ArrayD<f64>, axis: Axis, method: IfMethod) {
    for lane in x.lanes_mut(axis) {
        difference_lane(lane, method);
    }
}

/// Exact inverse of [`differentiate`].
pub fn integrate(x: &mut ArrayD<f64>, axis: Axis, method: IfMethod) {
    for lane in x.lanes_mut(axis) {
        integrate_lane(lane, method);
    }
}

fn unwrap_lane(mut lane: ArrayViewMut1<'_, f64>) {
    let n = lane.len();
    if n < 2 {
        return;
    }
    let mut correction = 0.0;
    let mut prev = lane[0];
    for i in 1..n {
        let raw = lane[i];
        let dd = raw - prev;
        let mut dd_mod = (dd + PI).rem_euclid(TAU) - PI;
        if dd_mod == -PI && dd > 0.0 {
            dd_mod = PI;
        }
        if dd.abs() >= PI {
            correction += dd_mod - dd;
        }
        prev = raw;
        lane[i] = raw + correction;
    }
}

fn difference_lane(mut lane: ArrayViewMut1<'_, f64>, method: IfMethod) {
    let n = lane.len();
    if n < 2 {
        return;
    }
    let p = lane.to_owned();
    match method {
        IfMethod::Forward => {
            for i in 0..n - 1 {
                lane[i] = p[i + 1] - p[i];
            }
        }
        IfMethod::Backward => {
            for i in 1..n {
                lane[i] = p[i] - p[i - 1];
            }
        }
        IfMethod::Central => {
            for i in 1..n - 1 {
                lane[i] = 0.5 * (p[i + 1] - p[i - 1]);
            }
            lane[n - 1] = p[n - 1] - p[n - 2];
        }
    }
}

fn integrate_lane(mut lane: ArrayViewMut1<'_, f64>, method: IfMethod) {
    let n = lane.len();
    if n < 2 {
        return;
    }
    match method {
        IfMethod::Forward => {
            for i in (0..n - 1).rev() {
                lane[i] = lane[i + 1] - lane[i];
            }
        }
        IfMethod::Backward => {
            for i in 1..n {
                lane[i] += lane[i - 1];
            }
        }
        IfMethod::Central => {
            let d = lane.to_owned();
            // even indices hang off the leading anchor
            let mut i = 2;
            while i < n {
                lane[i] = lane[i - 2] + 2.0 * d[i - 1];
                i += 2;
            }
            // odd indices hang off the trailing step
            let last = n - 1;
            let mut odd = if last % 2 == 1 {
                lane[last] = lane[last - 1] + d[last];
                last
            } else {
                lane[last - 1] = lane[last] - d[last];
                last - 1
            };
            while odd >= 3 {
                lane[odd - 2] = lane[odd] - 2.0 * d[odd - 1];
                odd -= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    fn wrap(x: f64) -> f64 {
        (x + PI).rem_euclid(TAU) - PI
    }

    #[test]
    fn test_unwrap_recovers_linear_ramp() {
        let truth = Array1::from_iter((0..40).map(|i| 0.7 * i as f64)).into_dyn();
        let mut wrapped = truth.mapv(wrap);
        unwrap(&mut wrapped, Axis(0));
        for (a, b) in wrapped.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} != {b}");
        }
    }

    #[test]
    fn test_unwrap_along_inner_axis_only() {
        let truth = Array2::from_shape_fn((3, 16), |(r, c)| (r as f64 + 1.0) * 0.9 * c as f64);
        let mut wrapped = truth.mapv(wrap).into_dyn();
        unwrap(&mut wrapped, Axis(1));
        for (a, b) in wrapped.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} != {b}");
        }
    }

    #[test]
    fn test_differences_match_stencils() {
        let p = array![0.0, 1.0, 3.0, 6.0, 10.0].into_dyn();

        let mut forward = p.clone();
        differentiate(&mut forward, Axis(0), IfMethod::Forward);
        assert_eq!(forward, array![1.0, 2.0, 3.0, 4.0, 10.0].into_dyn());

        let mut backward = p.clone();
        differentiate(&mut backward, Axis(0), IfMethod::Backward);
        assert_eq!(backward, array![0.0, 1.0, 2.0, 3.0, 4.0].into_dyn());

        let mut central = p.clone();
        differentiate(&mut central, Axis(0), IfMethod::Central);
        assert_eq!(central, array![0.0, 1.5, 2.5, 3.5, 4.0].into_dyn());
    }

    #[test]
    fn test_integration_inverts_every_stencil() {
        for n in 1..9 {
            let p = Array2::from_shape_fn((n, 3), |(i, j)| ((i * 7 + j * 3) as f64).sin() * 4.0)
                .into_dyn();
            for method in IfMethod::ALL {
                let mut d = p.clone();
                differentiate(&mut d, Axis(0), method);
                integrate(&mut d, Axis(0), method);
                for (a, b) in d.iter().zip(p.iter()) {
                    assert!((a - b).abs() < 1e-9, "{a} != {b}");
                }
            }
        }
    }
}
