//! Automatic tick placement

use crate::types::fmt_num;

use super::Scale;

/// Target number of intervals for the linear locator
const TARGET_TICKS: f64 = 6.0;

/// Nice-number tick positions covering `[lo, hi]`.
///
/// Linear axes step by 1, 2, 2.5 or 5 times a power of ten; log axes put a
/// tick on every decade.
pub fn auto_ticks(lo: f64, hi: f64, scale: Scale) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || hi < lo {
        return Vec::new();
    }
    match scale {
        Scale::Linear => linear_ticks(lo, hi),
        Scale::Log => log_ticks(lo, hi),
    }
}

fn linear_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let span = hi - lo;
    if span <= 0.0 {
        return vec![lo];
    }
    let step = nice_step(span / TARGET_TICKS);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last)
        .map(|i| {
            let v = i as f64 * step;
            // Snap float noise like 0.30000000000000004
            (v / step).round() * step
        })
        .map(|v| if v.abs() < step * 1e-9 { 0.0 } else { v })
        .collect()
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10_f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn log_ticks(lo: f64, hi: f64) -> Vec<f64> {
    if hi <= 0.0 {
        return Vec::new();
    }
    let lo = if lo > 0.0 { lo } else { hi / 1000.0 };
    let first = (lo.log10() - 1e-9).ceil() as i32;
    let last = (hi.log10() + 1e-9).floor() as i32;
    if first > last {
        return vec![10_f64.powi(last)];
    }
    (first..=last).map(|e| 10_f64.powi(e)).collect()
}

/// Default label for a tick at `value`
pub fn tick_label(value: f64, scale: Scale) -> String {
    match scale {
        Scale::Log if value > 0.0 => {
            let exp = value.log10();
            if (exp - exp.round()).abs() < 1e-9 {
                format!("10^{}", exp.round() as i64)
            } else {
                fmt_num(value)
            }
        }
        _ => fmt_num(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ticks_use_nice_steps() {
        assert_eq!(auto_ticks(0.0, 10.0, Scale::Linear), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(auto_ticks(-1.0, 1.0, Scale::Linear), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn log_ticks_land_on_decades() {
        assert_eq!(auto_ticks(1.0, 1000.0, Scale::Log), vec![1.0, 10.0, 100.0, 1000.0]);
        assert_eq!(tick_label(100.0, Scale::Log), "10^2");
    }

    #[test]
    fn degenerate_ranges() {
        assert_eq!(auto_ticks(3.0, 3.0, Scale::Linear), vec![3.0]);
        assert!(auto_ticks(f64::NAN, 1.0, Scale::Linear).is_empty());
    }
}
