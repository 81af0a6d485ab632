// Trend and regression primitives shared by the analyzer and the leak detector.
// Pure functions, no state.

use crate::models::Trend;

/// Least-squares fit of y = slope * x + intercept.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in [0, 1]. 0 when the fit is degenerate.
    pub r_squared: f64,
}

/// Classify the relative change from `old_value` to `new_value`.
///
/// A change of at least `threshold_ratio` (e.g. 0.05 = 5%) in either direction
/// is up/down, anything smaller is stable. Growth from zero counts as up.
pub fn delta_trend(old_value: f64, new_value: f64, threshold_ratio: f64) -> Trend {
    if old_value <= 0.0 {
        return if new_value > 0.0 {
            Trend::Up
        } else {
            Trend::Stable
        };
    }
    let change = (new_value - old_value) / old_value;
    if change >= threshold_ratio {
        Trend::Up
    } else if change <= -threshold_ratio {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Ordinary least squares over `(x, y)` points.
/// Fewer than two points, or no spread in x, yields the zero regression.
pub fn linear_regression(points: &[(f64, f64)]) -> Regression {
    let n = points.len();
    if n < 2 {
        return Regression::default();
    }
    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return Regression::default();
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 {
        0.0
    } else {
        ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0)
    };
    Regression {
        slope,
        intercept,
        r_squared,
    }
}

/// Index the series as sample number -> value.
pub fn indexed_points(series: &[f64]) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

/// Growth in units per second for a series sampled every `interval_ms`.
pub fn growth_rate_per_second(series: &[f64], interval_ms: u64) -> f64 {
    if interval_ms == 0 {
        return 0.0;
    }
    let reg = linear_regression(&indexed_points(series));
    reg.slope * 1000.0 / interval_ms as f64
}

/// Report up/down only when the slope clears `min_slope` and the fit clears
/// `r_squared_floor`; otherwise stable, even for a non-zero slope.
pub fn classify_regression(reg: &Regression, min_slope: f64, r_squared_floor: f64) -> Trend {
    if reg.slope.abs() < min_slope || reg.r_squared < r_squared_floor {
        return Trend::Stable;
    }
    if reg.slope > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

pub fn classify_series(series: &[f64], min_slope: f64, r_squared_floor: f64) -> Trend {
    classify_regression(
        &linear_regression(&indexed_points(series)),
        min_slope,
        r_squared_floor,
    )
}

pub fn is_monotonic_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] >= w[0])
}

/// Fraction of steps that strictly increase; 0 for fewer than two values.
pub fn growth_consistency(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let rising = values.windows(2).filter(|w| w[1] > w[0]).count();
    rising as f64 / (values.len() - 1) as f64
}
