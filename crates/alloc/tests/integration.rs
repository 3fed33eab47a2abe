use std::path::PathBuf;

use lanebook_alloc::config::AllocConfig;
use lanebook_alloc::engine::{run, run_sharded};
use lanebook_alloc::load::load_csv_legs;
use lanebook_alloc::model::{AllocResult, Category, Quarter, WarningKind};
use lanebook_alloc::AllocError;
use rust_decimal_macros::dec;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config() -> AllocConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("board.alloc.toml")).unwrap();
    AllocConfig::from_toml(&toml).unwrap()
}

fn load_legs(config: &AllocConfig) -> Vec<lanebook_alloc::LegRecord> {
    let input = config.input.as_deref().unwrap();
    let csv_path = fixtures_dir().join(input);
    let csv_data = std::fs::read_to_string(&csv_path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", csv_path.display()));
    load_csv_legs(&csv_data, &config.columns, &config.filter).unwrap()
}

fn load_and_run() -> AllocResult {
    let config = load_config();
    let legs = load_legs(&config);
    run(&config, &legs).unwrap()
}

// -------------------------------------------------------------------------
// Summary
// -------------------------------------------------------------------------

#[test]
fn board_fixture_summary() {
    let result = load_and_run();
    let s = &result.summary;

    // Cancelled and 2024 rows are dropped by the loader.
    assert_eq!(s.input_legs, 21);
    assert_eq!(s.ltl_legs, 10);
    assert_eq!(s.ftl_legs, 10);
    assert_eq!(s.other_legs, 1);
    assert_eq!(s.ltl_shipments, 3);
    assert_eq!(s.ftl_shipments, 6);
    assert_eq!(s.ltl_main_discarded, 2);
    assert_eq!(s.ftl_orders_discarded, 1);
    assert_eq!(s.multi_market_orders, 2);
    assert_eq!(s.markets, 5);
    assert_eq!(s.revenue, dec!(10825.01));
    assert_eq!(s.cost, dec!(8512.51));
    assert_eq!(s.units, 64);
    assert_eq!(result.meta.config_name, "Board meeting 2025");
}

#[test]
fn board_fixture_market_totals() {
    let result = load_and_run();

    let order: Vec<&str> = result.markets.iter().map(|r| r.totals.market.as_str()).collect();
    assert_eq!(order, vec!["DFW", "IAH", "SAT", "LAX", "EWR"]);

    let dfw = result.market("DFW").unwrap();
    assert_eq!(dfw.shipment_count, 3);
    assert_eq!(dfw.revenue, dec!(4982.63));
    assert_eq!(dfw.cost, dec!(4013.86));
    assert_eq!(dfw.units, 31);

    let lax = result.market("LAX").unwrap();
    assert_eq!(lax.shipment_count, 2);
    assert_eq!(lax.revenue, dec!(550.00));
    assert_eq!(lax.cost, dec!(195.50));
    assert_eq!(lax.units, 8);

    let ewr = result.market("EWR").unwrap();
    assert_eq!(ewr.revenue, dec!(125.00));
    assert_eq!(ewr.cost, dec!(97.00));
    assert_eq!(ewr.units, 7);

    let lax_report = result.markets.iter().find(|r| r.totals.market.as_str() == "LAX").unwrap();
    assert_eq!(lax_report.profit, dec!(354.50));
    assert_eq!(lax_report.cost_per_unit, dec!(24.4375));
}

// -------------------------------------------------------------------------
// Allocation rules
// -------------------------------------------------------------------------

#[test]
fn ltl_fallback_excludes_crossdock_transfers() {
    let result = load_and_run();
    let s = result.shipments.iter().find(|s| s.id == "W110").unwrap();
    assert_eq!(s.category, Category::Ltl);
    assert_eq!(s.market.as_str(), "EWR");
    // W113 (crossdock to crossdock) carries 999 revenue and 99 units; neither counts.
    assert_eq!(s.revenue, dec!(125.00));
    assert_eq!(s.units, 7);
    // Cost is additive over every leg of the order.
    assert_eq!(s.cost, dec!(97.00));
    assert_eq!(s.quarter, Quarter::Q2);
    assert!(s.warnings.is_empty());
}

#[test]
fn ltl_pattern_conflict_is_flagged() {
    let result = load_and_run();
    let s = result.shipments.iter().find(|s| s.id == "W120").unwrap();
    assert_eq!(s.revenue, dec!(300.00));
    assert_eq!(s.warnings.len(), 1);
    assert_eq!(s.warnings[0].kind, WarningKind::RevenuePatternConflict);
}

#[test]
fn ftl_multi_market_split() {
    let result = load_and_run();
    let parts: Vec<_> = result.shipments.iter().filter(|s| s.order_id == "FTL-1").collect();
    assert_eq!(parts.len(), 3);
    assert!(parts.iter().all(|s| s.split));

    let ids: Vec<&str> = parts.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["FTL-1@DFW", "FTL-1@IAH", "FTL-1@SAT"]);

    assert_eq!(parts[0].revenue, dec!(2032.63));
    assert_eq!(parts[0].cost, dec!(1693.86));
    assert_eq!(parts[0].units, 6);
    assert_eq!(parts[1].revenue, dec!(2821.15));
    assert_eq!(parts[1].cost, dec!(2350.96));
    assert_eq!(parts[1].units, 8);
    assert_eq!(parts[2].revenue, dec!(1146.23));
    assert_eq!(parts[2].cost, dec!(955.19));
    assert_eq!(parts[2].units, 3);

    let revenue: rust_decimal::Decimal = parts.iter().map(|s| s.revenue).sum();
    let cost: rust_decimal::Decimal = parts.iter().map(|s| s.cost).sum();
    let units: i64 = parts.iter().map(|s| s.units).sum();
    assert_eq!(revenue, dec!(6000.01));
    assert_eq!(cost, dec!(5000.01));
    assert_eq!(units, 17);
}

#[test]
fn ftl_single_market_counts_main_leg_units_only() {
    let result = load_and_run();
    let s = result.shipments.iter().find(|s| s.id == "FTL-2").unwrap();
    assert!(!s.split);
    assert_eq!(s.revenue, dec!(1950.00));
    assert_eq!(s.cost, dec!(1620.00));
    assert_eq!(s.units, 20);
}

#[test]
fn ftl_split_documents_unattributed_cost() {
    let result = load_and_run();
    assert_eq!(result.unattributed.len(), 1);
    let u = &result.unattributed[0];
    assert_eq!(u.order_id, "FTL-4");
    assert_eq!(u.cost, dec!(85.00));
    assert_eq!(u.markets.iter().map(|m| m.as_str()).collect::<Vec<_>>(), vec!["DFW", "IAH"]);

    let split_cost: rust_decimal::Decimal = result
        .shipments
        .iter()
        .filter(|s| s.order_id == "FTL-4")
        .map(|s| s.cost)
        .sum();
    assert_eq!(split_cost + u.cost, dec!(1685.00));

    let w = result
        .warnings
        .iter()
        .find(|w| w.kind == WarningKind::UnattributedSplitAmount)
        .unwrap();
    assert_eq!(w.shipment_id.as_deref(), Some("FTL-4@DFW"));
}

#[test]
fn casing_near_miss_is_reported() {
    let result = load_and_run();
    let casing: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::LocationCasing)
        .collect();
    assert_eq!(casing.len(), 1);
    assert!(casing[0].message.contains("wtch-sea-3"));
    assert_eq!(result.summary.warning_counts["location_casing"], 1);
    assert_eq!(result.warnings.len(), 3);
}

// -------------------------------------------------------------------------
// Quarters + trends
// -------------------------------------------------------------------------

#[test]
fn quarterly_breakdown_partitions_shipments() {
    let result = load_and_run();
    let count: usize = result.quarters.iter().map(|q| q.totals.shipment_count).sum();
    assert_eq!(count, result.shipments.len());

    let dfw: Vec<Quarter> = result
        .quarters
        .iter()
        .filter(|q| q.totals.market.as_str() == "DFW")
        .map(|q| q.quarter)
        .collect();
    assert_eq!(dfw, vec![Quarter::Q1, Quarter::Q2, Quarter::Q3]);
}

#[test]
fn trends_require_min_quarters() {
    let result = load_and_run();
    let markets: Vec<&str> = result.trends.markets.iter().map(|t| t.market.as_str()).collect();
    assert_eq!(markets, vec!["DFW"]);
    assert_eq!(result.trends.markets[0].quarters, 3);
    assert!(result.trends.profit_growers.is_empty());
}

// -------------------------------------------------------------------------
// Determinism
// -------------------------------------------------------------------------

#[test]
fn idempotent_and_shard_independent() {
    let config = load_config();
    let legs = load_legs(&config);
    let first = run(&config, &legs).unwrap();
    let second = run(&config, &legs).unwrap();
    assert_eq!(first, second);

    let sharded = run_sharded(&config, &legs, 3).unwrap();
    assert_eq!(sharded.markets, first.markets);
    assert_eq!(sharded.quarters, first.quarters);
    assert_eq!(sharded.shipments, first.shipments);
    assert_eq!(sharded.warnings, first.warnings);
    assert_eq!(sharded.unattributed, first.unattributed);
}

#[test]
fn json_output_uses_string_decimals() {
    let result = load_and_run();
    let json = serde_json::to_value(&result).unwrap();
    let dfw = &json["markets"][0];
    assert_eq!(dfw["market"], "DFW");
    assert_eq!(dfw["revenue"], "4982.63");
    assert_eq!(dfw["shipment_count"], 3);
}

#[test]
fn validation_rejects_duplicate_legs() {
    let config = load_config();
    let mut legs = load_legs(&config);
    legs.push(legs[3].clone());
    let err = run(&config, &legs).unwrap_err();
    assert!(matches!(err, AllocError::DuplicateLeg(_)));
}
