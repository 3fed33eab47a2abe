use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{Category, LogicalShipment, MarketCode, MarketTotals, RunSummary, Warning};

/// Leg and group counts gathered while grouping. Summed across shards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub input_legs: usize,
    pub ltl_legs: usize,
    pub ftl_legs: usize,
    pub other_legs: usize,
    pub ltl_main_discarded: usize,
    pub ftl_orders_discarded: usize,
    pub multi_market_orders: usize,
}

impl RunCounts {
    pub fn merge(&mut self, other: &RunCounts) {
        self.input_legs += other.input_legs;
        self.ltl_legs += other.ltl_legs;
        self.ftl_legs += other.ftl_legs;
        self.other_legs += other.other_legs;
        self.ltl_main_discarded += other.ltl_main_discarded;
        self.ftl_orders_discarded += other.ftl_orders_discarded;
        self.multi_market_orders += other.multi_market_orders;
    }
}

/// Compute summary statistics from allocated shipments and market totals.
pub fn compute_summary(
    counts: &RunCounts,
    shipments: &[LogicalShipment],
    markets: &BTreeMap<MarketCode, MarketTotals>,
    warnings: &[Warning],
) -> RunSummary {
    let mut warning_counts: BTreeMap<String, usize> = BTreeMap::new();
    for w in warnings {
        *warning_counts.entry(w.kind.to_string()).or_insert(0) += 1;
    }

    let mut ltl_shipments = 0;
    let mut ftl_shipments = 0;
    for s in shipments {
        match s.category {
            Category::Ltl => ltl_shipments += 1,
            Category::Ftl => ftl_shipments += 1,
            Category::Other => {}
        }
    }

    RunSummary {
        input_legs: counts.input_legs,
        ltl_legs: counts.ltl_legs,
        ftl_legs: counts.ftl_legs,
        other_legs: counts.other_legs,
        ltl_main_discarded: counts.ltl_main_discarded,
        ftl_orders_discarded: counts.ftl_orders_discarded,
        ltl_shipments,
        ftl_shipments,
        multi_market_orders: counts.multi_market_orders,
        markets: markets.len(),
        revenue: markets.values().map(|t| t.revenue).sum::<Decimal>(),
        cost: markets.values().map(|t| t.cost).sum::<Decimal>(),
        units: markets.values().map(|t| t.units).sum(),
        warning_counts,
    }
}
