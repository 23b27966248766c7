//! Pure calculation functions for derivative dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// A single derivative size to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeSize {
    pub width: u32,
    pub height: u32,
}

/// Calculate which widths to generate for an image and their heights.
///
/// Requested widths larger than the natural width are dropped, never clamped,
/// so nothing is upscaled. The result is ascending and free of duplicates,
/// and empty when every requested width exceeds the natural width.
///
/// # Arguments
/// * `natural` - Source image dimensions (width, height)
/// * `widths` - Requested target widths
pub fn calculate_derivative_sizes(natural: (u32, u32), widths: &[u32]) -> Vec<DerivativeSize> {
    let (nat_w, _) = natural;

    let mut kept: Vec<u32> = widths
        .iter()
        .copied()
        .filter(|&w| w > 0 && w <= nat_w)
        .collect();
    kept.sort_unstable();
    kept.dedup();

    kept.into_iter()
        .map(|width| DerivativeSize {
            width,
            height: scaled_height(natural, width),
        })
        .collect()
}

/// Height for `width` preserving the aspect ratio of `natural`. Never zero.
pub fn scaled_height(natural: (u32, u32), width: u32) -> u32 {
    let (nat_w, nat_h) = natural;
    if nat_w == 0 {
        return nat_h.max(1);
    }
    let h = (nat_h as f64 * width as f64 / nat_w as f64).round() as u32;
    h.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widths(sizes: &[DerivativeSize]) -> Vec<u32> {
        sizes.iter().map(|s| s.width).collect()
    }

    #[test]
    fn keeps_all_widths_below_natural() {
        let sizes = calculate_derivative_sizes((2000, 1500), &[716, 800, 1600]);
        assert_eq!(widths(&sizes), vec![716, 800, 1600]);
    }

    #[test]
    fn drops_widths_above_natural() {
        let sizes = calculate_derivative_sizes((750, 500), &[716, 800, 1600]);
        assert_eq!(widths(&sizes), vec![716]);
    }

    #[test]
    fn width_equal_to_natural_is_kept() {
        let sizes = calculate_derivative_sizes((800, 600), &[716, 800, 1600]);
        assert_eq!(widths(&sizes), vec![716, 800]);
    }

    #[test]
    fn heights_preserve_aspect_ratio() {
        let sizes = calculate_derivative_sizes((2000, 1500), &[800]);
        assert_eq!(sizes[0], DerivativeSize { width: 800, height: 600 });
    }

    #[test]
    fn heights_round_to_nearest() {
        // 333 * 716 / 2000 = 119.214 → 119
        let sizes = calculate_derivative_sizes((2000, 333), &[716]);
        assert_eq!(sizes[0].height, 119);
    }

    #[test]
    fn empty_when_all_exceed() {
        let sizes = calculate_derivative_sizes((500, 400), &[716, 800, 1600]);
        assert!(sizes.is_empty());
    }

    #[test]
    fn output_is_sorted_and_unique() {
        let sizes = calculate_derivative_sizes((3000, 2000), &[1600, 716, 800, 716]);
        assert_eq!(widths(&sizes), vec![716, 800, 1600]);
    }

    #[test]
    fn zero_width_requests_are_ignored() {
        let sizes = calculate_derivative_sizes((1000, 1000), &[0, 500]);
        assert_eq!(widths(&sizes), vec![500]);
    }

    #[test]
    fn never_exceeds_natural_width() {
        for natural in [1, 99, 716, 717, 799, 1599, 4000] {
            let sizes = calculate_derivative_sizes((natural, 100), &[716, 800, 1600]);
            assert!(sizes.iter().all(|s| s.width <= natural), "natural {natural}");
        }
    }

    #[test]
    fn tiny_heights_never_reach_zero() {
        assert_eq!(scaled_height((4000, 1), 10), 1);
    }
}
