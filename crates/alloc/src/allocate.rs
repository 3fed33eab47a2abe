//! Revenue, cost and unit reconciliation per logical shipment.
//!
//! LTL rows record revenue either on the main leg or spread over the other
//! legs of the order, never both in valid input. FTL orders sum every leg,
//! except when the order touches several markets and is split by main leg.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::AllocError;
use crate::facility::ClassifiedLeg;
use crate::group::{FtlGroup, LtlGroup};
use crate::model::{
    Category, LogicalShipment, MarketCode, Quarter, UnattributedSplit, Warning, WarningKind,
};

/// Result of allocating one FTL order.
#[derive(Debug)]
pub struct FtlAllocation {
    pub shipments: Vec<LogicalShipment>,
    pub unattributed: Option<UnattributedSplit>,
}

fn warning(shipment_id: &str, order_id: &str, kind: WarningKind, message: String) -> Warning {
    Warning {
        shipment_id: Some(shipment_id.to_string()),
        order_id: Some(order_id.to_string()),
        kind,
        message,
    }
}

fn negative_value_warnings(shipment_id: &str, order_id: &str, legs: &[ClassifiedLeg<'_>]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for l in legs {
        let leg = l.leg;
        let mut fields = Vec::new();
        if leg.revenue < Decimal::ZERO {
            fields.push(format!("revenue {}", leg.revenue));
        }
        if leg.cost < Decimal::ZERO {
            fields.push(format!("cost {}", leg.cost));
        }
        if leg.units < 0 {
            fields.push(format!("units {}", leg.units));
        }
        if !fields.is_empty() {
            warnings.push(warning(
                shipment_id,
                order_id,
                WarningKind::NegativeValue,
                format!("leg '{}' has negative {}", leg.leg_id, fields.join(", ")),
            ));
        }
    }
    warnings
}

fn leg_ids(legs: &[ClassifiedLeg<'_>]) -> BTreeSet<String> {
    legs.iter().map(|l| l.leg.leg_id.clone()).collect()
}

/// Earliest pick window among the given legs, as a reporting quarter.
fn earliest_quarter<'s, 'a: 's>(legs: impl Iterator<Item = &'s ClassifiedLeg<'a>>) -> Quarter {
    Quarter::from_pick_window(legs.filter_map(|l| l.leg.pick_window).min())
}

// ---------------------------------------------------------------------------
// LTL
// ---------------------------------------------------------------------------

/// Allocate one LTL shipment seeded by its main leg.
pub fn allocate_ltl(group: &LtlGroup<'_>) -> LogicalShipment {
    let main = group.main.leg;
    let id = main.leg_id.as_str();
    let order_id = main.order_id.as_str();

    // Other legs of the order, excluding internal crossdock transfers.
    let fallback: Vec<&ClassifiedLeg<'_>> = group
        .legset
        .iter()
        .filter(|l| !std::ptr::eq(l.leg, main) && !l.is_crossdock_to_crossdock())
        .collect();

    let mut warnings = negative_value_warnings(id, order_id, &group.legset);

    let fallback_revenue: Decimal = fallback.iter().map(|l| l.leg.revenue).sum();
    let revenue = if main.revenue > Decimal::ZERO {
        if !fallback_revenue.is_zero() {
            warnings.push(warning(
                id,
                order_id,
                WarningKind::RevenuePatternConflict,
                format!(
                    "main leg revenue {} and other-leg revenue {} are both recorded; main leg used",
                    main.revenue, fallback_revenue
                ),
            ));
        }
        main.revenue
    } else {
        if fallback_revenue.is_zero() {
            warnings.push(warning(
                id,
                order_id,
                WarningKind::ZeroRevenue,
                "main leg and other legs carry no revenue".to_string(),
            ));
        }
        fallback_revenue
    };

    let cost: Decimal = group.legset.iter().map(|l| l.leg.cost).sum();

    let units = if main.units > 0 {
        main.units
    } else {
        let fallback_units: i64 = fallback
            .iter()
            .filter(|l| l.leg.revenue > Decimal::ZERO)
            .map(|l| l.leg.units)
            .sum();
        if fallback_units == 0 {
            warnings.push(warning(
                id,
                order_id,
                WarningKind::ZeroUnits,
                "main leg has no units and no revenue-bearing leg supplies any".to_string(),
            ));
        }
        fallback_units
    };

    debug!(shipment_id = id, market = %group.market, %revenue, %cost, units, "LTL shipment allocated");

    LogicalShipment {
        id: id.to_string(),
        category: Category::Ltl,
        order_id: order_id.to_string(),
        leg_ids: leg_ids(&group.legset),
        market: group.market,
        quarter: Quarter::from_pick_window(main.pick_window),
        revenue,
        cost,
        units,
        split: false,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// FTL
// ---------------------------------------------------------------------------

/// Allocate one FTL order, splitting it per market when it touches several.
pub fn allocate_ftl(group: &FtlGroup<'_>) -> Result<FtlAllocation, AllocError> {
    let Some(&first_market) = group.markets.iter().next() else {
        return Err(AllocError::GrouperInvariant {
            order_id: group.order_id.to_string(),
        });
    };

    if !group.is_multi_market() {
        return Ok(FtlAllocation {
            shipments: vec![allocate_ftl_single(group, first_market)],
            unattributed: None,
        });
    }

    allocate_ftl_split(group)
}

fn allocate_ftl_single(group: &FtlGroup<'_>, market: MarketCode) -> LogicalShipment {
    let order_id = group.order_id;
    let mut warnings = negative_value_warnings(order_id, order_id, &group.legs);

    let revenue: Decimal = group.legs.iter().map(|l| l.leg.revenue).sum();
    let cost: Decimal = group.legs.iter().map(|l| l.leg.cost).sum();
    // Handling-fee rows repeat the main legs' unit counts.
    let units: i64 = group
        .legs
        .iter()
        .filter(|l| l.leg.is_main_leg)
        .map(|l| l.leg.units)
        .sum();

    if units == 0 {
        warnings.push(warning(
            order_id,
            order_id,
            WarningKind::ZeroUnits,
            "no main leg of the order carries units".to_string(),
        ));
    }

    let quarter = earliest_quarter(
        group
            .legs
            .iter()
            .filter(|l| l.leg.is_main_leg && l.market() == Some(market)),
    );

    debug!(shipment_id = order_id, %market, %revenue, %cost, units, "FTL shipment allocated");

    LogicalShipment {
        id: order_id.to_string(),
        category: Category::Ftl,
        order_id: order_id.to_string(),
        leg_ids: leg_ids(&group.legs),
        market,
        quarter,
        revenue,
        cost,
        units,
        split: false,
        warnings,
    }
}

fn allocate_ftl_split(group: &FtlGroup<'_>) -> Result<FtlAllocation, AllocError> {
    let order_id = group.order_id;
    let mut shipments = Vec::with_capacity(group.markets.len());

    for &market in &group.markets {
        let legs: Vec<ClassifiedLeg<'_>> = group
            .legs
            .iter()
            .filter(|l| l.leg.is_main_leg && l.market() == Some(market))
            .copied()
            .collect();
        if legs.is_empty() {
            return Err(AllocError::GrouperInvariant {
                order_id: order_id.to_string(),
            });
        }

        let id = format!("{order_id}@{market}");
        let mut warnings = negative_value_warnings(&id, order_id, &legs);
        let revenue: Decimal = legs.iter().map(|l| l.leg.revenue).sum();
        let cost: Decimal = legs.iter().map(|l| l.leg.cost).sum();
        let units: i64 = legs.iter().map(|l| l.leg.units).sum();
        if units == 0 {
            warnings.push(warning(
                &id,
                order_id,
                WarningKind::ZeroUnits,
                format!("no main leg in {market} carries units"),
            ));
        }

        debug!(shipment_id = %id, %market, %revenue, %cost, units, "FTL split shipment allocated");

        shipments.push(LogicalShipment {
            id,
            category: Category::Ftl,
            order_id: order_id.to_string(),
            leg_ids: leg_ids(&legs),
            market,
            quarter: earliest_quarter(legs.iter()),
            revenue,
            cost,
            units,
            split: true,
            warnings,
        });
    }

    // Non-main legs and main legs with no market stay with the order.
    let excluded: Vec<ClassifiedLeg<'_>> = group
        .legs
        .iter()
        .filter(|l| !l.leg.is_main_leg || l.market().is_none())
        .copied()
        .collect();

    if excluded.is_empty() {
        return Ok(FtlAllocation {
            shipments,
            unattributed: None,
        });
    }

    let unattributed = UnattributedSplit {
        order_id: order_id.to_string(),
        markets: group.markets.iter().copied().collect(),
        leg_ids: leg_ids(&excluded),
        revenue: excluded.iter().map(|l| l.leg.revenue).sum(),
        cost: excluded.iter().map(|l| l.leg.cost).sum(),
        units: excluded.iter().map(|l| l.leg.units).sum(),
    };

    if let Some(first) = shipments.first_mut() {
        let mut extra = negative_value_warnings(&first.id, order_id, &excluded);
        extra.push(warning(
            &first.id,
            order_id,
            WarningKind::UnattributedSplitAmount,
            format!(
                "{} leg(s) excluded from the per-market split: revenue {}, cost {}, units {}",
                unattributed.leg_ids.len(),
                unattributed.revenue,
                unattributed.cost,
                unattributed.units
            ),
        ));
        first.warnings.extend(extra);
    }

    Ok(FtlAllocation {
        shipments,
        unattributed: Some(unattributed),
    })
}
