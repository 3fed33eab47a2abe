use std::collections::BTreeMap;

use crate::model::{LogicalShipment, MarketCode, MarketReport, MarketTotals, Quarter, QuarterTotals};

/// Fold shipments into per-market totals. Every shipment lands in exactly one market.
pub fn aggregate_markets(shipments: &[LogicalShipment]) -> BTreeMap<MarketCode, MarketTotals> {
    let mut totals: BTreeMap<MarketCode, MarketTotals> = BTreeMap::new();
    for s in shipments {
        totals
            .entry(s.market)
            .or_insert_with(|| MarketTotals::new(s.market))
            .add(s);
    }
    totals
}

/// Fold shipments into per-(market, quarter) totals. Undated shipments go to `Quarter::Unknown`.
pub fn aggregate_quarters(shipments: &[LogicalShipment]) -> BTreeMap<(MarketCode, Quarter), MarketTotals> {
    let mut totals: BTreeMap<(MarketCode, Quarter), MarketTotals> = BTreeMap::new();
    for s in shipments {
        totals
            .entry((s.market, s.quarter))
            .or_insert_with(|| MarketTotals::new(s.market))
            .add(s);
    }
    totals
}

/// Merge partial totals from another shard.
pub fn merge_totals<K: Ord>(into: &mut BTreeMap<K, MarketTotals>, from: BTreeMap<K, MarketTotals>) {
    for (key, partial) in from {
        match into.get_mut(&key) {
            Some(existing) => existing.merge(&partial),
            None => {
                into.insert(key, partial);
            }
        }
    }
}

/// Market reports ordered by revenue descending, ties by market code.
pub fn market_reports(totals: &BTreeMap<MarketCode, MarketTotals>) -> Vec<MarketReport> {
    let mut reports: Vec<MarketReport> = totals.values().map(MarketReport::from).collect();
    reports.sort_by(|a, b| {
        b.totals
            .revenue
            .cmp(&a.totals.revenue)
            .then_with(|| a.totals.market.cmp(&b.totals.market))
    });
    reports
}

/// Quarterly rows ordered by market, then quarter.
pub fn quarter_rows(totals: &BTreeMap<(MarketCode, Quarter), MarketTotals>) -> Vec<QuarterTotals> {
    totals
        .iter()
        .map(|((_, quarter), t)| QuarterTotals {
            quarter: *quarter,
            totals: t.clone(),
            profit: t.profit(),
            cost_per_unit: t.cost_per_unit().round_dp(4),
        })
        .collect()
}
