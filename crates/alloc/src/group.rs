//! Partition classified legs into logical shipment groups.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::facility::ClassifiedLeg;
use crate::model::{Category, Direction, MarketCode};

/// One LTL main leg that touches a crossdock, with every LTL leg of its order.
#[derive(Debug, Clone)]
pub struct LtlGroup<'a> {
    pub main: ClassifiedLeg<'a>,
    pub market: MarketCode,
    pub legset: Vec<ClassifiedLeg<'a>>,
}

/// One FTL order with at least one market-touching main leg.
#[derive(Debug, Clone)]
pub struct FtlGroup<'a> {
    pub order_id: &'a str,
    pub legs: Vec<ClassifiedLeg<'a>>,
    /// Distinct markets touched by main legs with a direction.
    pub markets: BTreeSet<MarketCode>,
}

impl FtlGroup<'_> {
    pub fn is_multi_market(&self) -> bool {
        self.markets.len() > 1
    }
}

#[derive(Debug, Default)]
pub struct Grouping<'a> {
    pub ltl: Vec<LtlGroup<'a>>,
    pub ftl: Vec<FtlGroup<'a>>,
    pub ltl_main_discarded: usize,
    pub ftl_orders_discarded: usize,
}

/// Legs of one category keyed by order, in input order within each order.
fn by_order<'a>(
    legs: &[ClassifiedLeg<'a>],
    category: Category,
) -> BTreeMap<&'a str, Vec<ClassifiedLeg<'a>>> {
    let mut orders: BTreeMap<&'a str, Vec<ClassifiedLeg<'a>>> = BTreeMap::new();
    for leg in legs.iter().filter(|l| l.leg.category == category) {
        orders.entry(leg.leg.order_id.as_str()).or_default().push(*leg);
    }
    orders
}

/// Build LTL and FTL groups. `Other` legs are ignored.
pub fn group_legs<'a>(legs: &[ClassifiedLeg<'a>]) -> Grouping<'a> {
    let mut grouping = Grouping::default();

    for (order_id, order_legs) in by_order(legs, Category::Ltl) {
        for main in order_legs.iter().filter(|l| l.leg.is_main_leg) {
            let Some(market) = main.market() else {
                debug!(leg_id = %main.leg.leg_id, order_id, "LTL main leg touches no crossdock, discarded");
                grouping.ltl_main_discarded += 1;
                continue;
            };
            grouping.ltl.push(LtlGroup {
                main: *main,
                market,
                legset: order_legs.clone(),
            });
        }
    }

    for (order_id, order_legs) in by_order(legs, Category::Ftl) {
        let markets: BTreeSet<MarketCode> = order_legs
            .iter()
            .filter(|l| l.leg.is_main_leg && l.direction() != Direction::Neither)
            .filter_map(|l| l.market())
            .collect();

        if markets.is_empty() {
            debug!(order_id, legs = order_legs.len(), "FTL order touches no crossdock market, discarded");
            grouping.ftl_orders_discarded += 1;
            continue;
        }

        grouping.ftl.push(FtlGroup {
            order_id,
            legs: order_legs,
            markets,
        });
    }

    grouping
}
