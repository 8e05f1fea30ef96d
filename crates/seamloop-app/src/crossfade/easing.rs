/// Cubic smoothstep, `p²(3 − 2p)`. Input is clamped to [0, 1].
pub fn smoothstep(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    p * p * (3.0 - 2.0 * p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        assert!((smoothstep(0.0) - 0.0).abs() < 1e-12);
        assert!((smoothstep(1.0) - 1.0).abs() < 1e-12);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn clamps_out_of_range() {
        assert!((smoothstep(-3.0) - 0.0).abs() < 1e-12);
        assert!((smoothstep(7.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn eases_in_and_out() {
        // Slower than linear near the ends, faster in the middle.
        assert!(smoothstep(0.1) < 0.1);
        assert!(smoothstep(0.9) > 0.9);
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = smoothstep(f64::from(i) / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }
}
