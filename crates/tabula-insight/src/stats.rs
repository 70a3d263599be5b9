//! Numeric helpers used across insight generation.
//!
//! Everything here is pure and deterministic. The p-value helpers use
//! large-sample approximations (erf series for the normal CDF,
//! Wilson-Hilferty for chi-square) so no statistics crate is needed.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Adjusted Fisher-Pearson skewness coefficient. Zero for fewer than three
/// values or a degenerate spread.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let m = mean(values);
    let s = std_dev(values);
    if s == 0.0 {
        return 0.0;
    }
    let nf = n as f64;
    let sum_cubes: f64 = values.iter().map(|v| ((v - m) / s).powi(3)).sum();
    (nf / ((nf - 1.0) * (nf - 2.0))) * sum_cubes
}

/// Pearson correlation of two equal-length series. `None` when either side
/// is degenerate or there are fewer than two pairs.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Human label for a correlation magnitude.
pub fn interpret_correlation(r: f64) -> &'static str {
    let abs = r.abs();
    if abs >= 0.7 {
        "strong"
    } else if abs >= 0.5 {
        "moderate"
    } else if abs >= 0.3 {
        "weak"
    } else {
        "negligible"
    }
}

/// Least-squares slope of `values` over their index order.
pub fn trend_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let mx = mean(&xs);
    let my = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(values.iter()) {
        num += (x - mx) * (y - my);
        den += (x - mx).powi(2);
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Error function via the Abramowitz-Stegun 7.1.26 polynomial approximation.
/// Absolute error below 1.5e-7, plenty for reporting p-values.
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Upper-tail p-value for a chi-square statistic via the Wilson-Hilferty
/// cube-root normal approximation.
pub fn chi_square_p(statistic: f64, df: usize) -> f64 {
    if df == 0 || statistic <= 0.0 {
        return 1.0;
    }
    let k = df as f64;
    let z = ((statistic / k).cbrt() - (1.0 - 2.0 / (9.0 * k))) / (2.0 / (9.0 * k)).sqrt();
    (1.0 - normal_cdf(z)).clamp(0.0, 1.0)
}

/// Two-sided p-value for a t statistic, normal approximation.
pub fn t_test_p(statistic: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(statistic.abs()))).clamp(0.0, 1.0)
}
