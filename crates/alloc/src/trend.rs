//! Quarter-over-quarter trend lines per market.
//!
//! Least-squares fit of quarterly profit and cost-per-unit against the quarter
//! number. Markets with steady growth or steady cost reduction are ranked by
//! `|slope| * r²`.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::config::TrendConfig;
use crate::model::{MarketCode, MarketTotals, Quarter};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketTrend {
    pub market: MarketCode,
    pub quarters: usize,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub avg_cost_per_unit: f64,
    pub profit: LinearFit,
    pub cost_per_unit: LinearFit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendReport {
    pub markets: Vec<MarketTrend>,
    /// Rising profit with r² at or above the threshold.
    pub profit_growers: Vec<MarketCode>,
    /// Falling cost-per-unit with r² at or above the threshold.
    pub cost_reducers: Vec<MarketCode>,
}

/// Ordinary least squares over `(x, y)` points. Zero-variance series fit with r² = 0.
pub fn linear_fit(points: &[(f64, f64)]) -> LinearFit {
    let n = points.len() as f64;
    if points.len() < 2 {
        return LinearFit { slope: 0.0, r2: 0.0 };
    }
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return LinearFit { slope: 0.0, r2: 0.0 };
    }
    let slope = sxy / sxx;
    let r2 = if syy == 0.0 { 0.0 } else { (sxy * sxy) / (sxx * syy) };
    LinearFit { slope, r2 }
}

fn to_f64(d: rust_decimal::Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Compute trend lines from per-(market, quarter) totals.
pub fn compute_trends(
    quarters: &BTreeMap<(MarketCode, Quarter), MarketTotals>,
    config: &TrendConfig,
) -> TrendReport {
    let mut per_market: BTreeMap<MarketCode, Vec<(u8, &MarketTotals)>> = BTreeMap::new();
    for ((market, quarter), totals) in quarters {
        if let Some(q) = quarter.number() {
            per_market.entry(*market).or_default().push((q, totals));
        }
    }

    let mut markets = Vec::new();
    for (market, rows) in per_market {
        if rows.len() < config.min_quarters {
            continue;
        }
        let profit_points: Vec<(f64, f64)> = rows
            .iter()
            .map(|(q, t)| (f64::from(*q), to_f64(t.profit())))
            .collect();
        let cpu_points: Vec<(f64, f64)> = rows
            .iter()
            .map(|(q, t)| (f64::from(*q), to_f64(t.cost_per_unit())))
            .collect();

        markets.push(MarketTrend {
            market,
            quarters: rows.len(),
            total_revenue: rows.iter().map(|(_, t)| to_f64(t.revenue)).sum(),
            total_profit: profit_points.iter().map(|p| p.1).sum(),
            avg_cost_per_unit: cpu_points.iter().map(|p| p.1).sum::<f64>() / rows.len() as f64,
            profit: linear_fit(&profit_points),
            cost_per_unit: linear_fit(&cpu_points),
        });
    }

    let rank = |score: &dyn Fn(&MarketTrend) -> Option<f64>| -> Vec<MarketCode> {
        let mut scored: Vec<(f64, MarketCode)> =
            markets.iter().filter_map(|t| score(t).map(|s| (s, t.market))).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored.into_iter().take(config.top).map(|(_, m)| m).collect()
    };

    let profit_growers = rank(&|t: &MarketTrend| {
        (t.profit.slope > 0.0 && t.profit.r2 >= config.min_r2).then(|| t.profit.slope * t.profit.r2)
    });
    let cost_reducers = rank(&|t: &MarketTrend| {
        (t.cost_per_unit.slope < 0.0 && t.cost_per_unit.r2 >= config.min_r2)
            .then(|| t.cost_per_unit.slope.abs() * t.cost_per_unit.r2)
    });

    TrendReport {
        markets,
        profit_growers,
        cost_reducers,
    }
}
