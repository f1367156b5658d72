//! Return statistics — pure functions over close and return series.
//!
//! Every function is series in, scalar (or matrix) out, with no dependency
//! on the data layer. Annualization assumes 252 trading days.

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator). Zero below 2 observations.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Annualized volatility: sample stddev of daily returns × √252.
pub fn annualized_volatility(daily_returns: &[f64]) -> f64 {
    std_dev(daily_returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Pearson correlation of two equal-length series.
///
/// Returns 0.0 when either series is degenerate (constant or shorter than
/// 2 observations), matching the stddev convention above.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() < 2 {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-15 {
        return 0.0;
    }
    cov / denom
}

/// Square Pearson correlation matrix over a fixed ticker order.
///
/// Symmetric with unit diagonal by construction: only the upper triangle
/// is computed and then mirrored, and the diagonal is set to exactly 1.0.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Compute the matrix from one return series per ticker.
    ///
    /// All series must share the same index (same length, same dates);
    /// the close panel guarantees this for its return series.
    pub fn from_returns(tickers: &[String], returns: &[Vec<f64>]) -> Self {
        debug_assert_eq!(tickers.len(), returns.len());
        let n = tickers.len();
        let mut values = vec![vec![0.0; n]; n];

        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let c = pearson(&returns[i], &returns[j]);
                values[i][j] = c;
                values[j][i] = c;
            }
        }

        Self {
            tickers: tickers.to_vec(),
            values,
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// One row of correlations, in ticker order.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i]
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
