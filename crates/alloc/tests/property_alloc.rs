// Property-based tests for the allocation pipeline.
// CI: 128 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use rust_decimal::Decimal;

use lanebook_alloc::config::AllocConfig;
use lanebook_alloc::engine::{run, run_sharded};
use lanebook_alloc::model::{Category, LegRecord};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Crossdocks in a handful of markets, plus external sites.
fn arb_location() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => prop::sample::select(vec!["LAX", "EWR", "DFW", "IAH"])
            .prop_flat_map(|m| (Just(m), 1u32..4))
            .prop_map(|(m, n)| format!("WTCH-{m}-{n}")),
        3 => prop::sample::select(vec!["Plant A", "Store B", "Hub C", "DC D"]).prop_map(String::from),
    ]
}

/// Money in cents, mostly positive, sometimes zero.
fn arb_money() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        1 => Just(Decimal::ZERO),
        4 => (1i64..500_000).prop_map(|c| Decimal::new(c, 2)),
    ]
}

fn arb_leg_fields() -> impl Strategy<Value = (usize, bool, Decimal, Decimal, i64, String, String, Category)> {
    (
        0usize..8,
        any::<bool>(),
        arb_money(),
        arb_money(),
        0i64..20,
        arb_location(),
        arb_location(),
        prop::sample::select(vec![Category::Ltl, Category::Ftl, Category::Other]),
    )
}

fn arb_legs() -> impl Strategy<Value = Vec<LegRecord>> {
    prop::collection::vec(arb_leg_fields(), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (order, main, revenue, cost, units, pick, drop, category))| LegRecord {
                leg_id: format!("W{i}"),
                order_id: format!("O{order}"),
                is_main_leg: main,
                revenue,
                cost,
                units,
                pick_location: pick,
                drop_location: drop,
                category,
                pick_window: None,
            })
            .collect()
    })
}

fn is_crossdock(location: &str) -> bool {
    location.starts_with("WTCH-")
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    /// Market totals are a lossless partition of the shipments.
    #[test]
    fn market_totals_partition_shipments(legs in arb_legs()) {
        let result = run(&AllocConfig::default(), &legs).unwrap();

        let shipment_revenue: Decimal = result.shipments.iter().map(|s| s.revenue).sum();
        let market_revenue: Decimal = result.markets.iter().map(|m| m.totals.revenue).sum();
        prop_assert_eq!(shipment_revenue, market_revenue);

        let shipment_cost: Decimal = result.shipments.iter().map(|s| s.cost).sum();
        let market_cost: Decimal = result.markets.iter().map(|m| m.totals.cost).sum();
        prop_assert_eq!(shipment_cost, market_cost);

        let count: usize = result.markets.iter().map(|m| m.totals.shipment_count).sum();
        prop_assert_eq!(count, result.shipments.len());

        let quarter_count: usize = result.quarters.iter().map(|q| q.totals.shipment_count).sum();
        prop_assert_eq!(quarter_count, result.shipments.len());
    }

    /// Running twice gives identical totals and warnings.
    #[test]
    fn idempotent(legs in arb_legs()) {
        let config = AllocConfig::default();
        let a = run(&config, &legs).unwrap();
        let b = run(&config, &legs).unwrap();
        prop_assert_eq!(&a.markets, &b.markets);
        prop_assert_eq!(&a.warnings, &b.warnings);
    }

    /// Sharding by order never changes the answer.
    #[test]
    fn sharded_equals_serial(legs in arb_legs(), shards in 2usize..6) {
        let config = AllocConfig::default();
        let serial = run(&config, &legs).unwrap();
        let sharded = run_sharded(&config, &legs, shards).unwrap();
        prop_assert_eq!(&sharded.markets, &serial.markets);
        prop_assert_eq!(&sharded.shipments, &serial.shipments);
        prop_assert_eq!(&sharded.warnings, &serial.warnings);
        prop_assert_eq!(&sharded.unattributed, &serial.unattributed);
    }

    /// LTL revenue follows the main leg when it is positive, else the
    /// non-transfer legs; crossdock-to-crossdock legs never contribute.
    #[test]
    fn ltl_revenue_rule(legs in arb_legs()) {
        let result = run(&AllocConfig::default(), &legs).unwrap();
        for s in result.shipments.iter().filter(|s| s.category == Category::Ltl) {
            let main = legs.iter().find(|l| l.leg_id == s.id).unwrap();
            let fallback: Vec<&LegRecord> = legs
                .iter()
                .filter(|l| {
                    l.category == Category::Ltl
                        && l.order_id == main.order_id
                        && l.leg_id != main.leg_id
                        && !(is_crossdock(&l.pick_location) && is_crossdock(&l.drop_location))
                })
                .collect();

            if main.revenue > Decimal::ZERO {
                prop_assert_eq!(s.revenue, main.revenue);
            } else {
                let expected: Decimal = fallback.iter().map(|l| l.revenue).sum();
                prop_assert_eq!(s.revenue, expected);
            }

            if main.units <= 0 {
                let expected: i64 = fallback
                    .iter()
                    .filter(|l| l.revenue > Decimal::ZERO)
                    .map(|l| l.units)
                    .sum();
                prop_assert_eq!(s.units, expected);
            }
        }
    }

    /// Single-market FTL cost is the sum over every leg of the order.
    #[test]
    fn ftl_single_market_cost(legs in arb_legs()) {
        let result = run(&AllocConfig::default(), &legs).unwrap();
        for s in result.shipments.iter().filter(|s| s.category == Category::Ftl && !s.split) {
            let expected: Decimal = legs
                .iter()
                .filter(|l| l.category == Category::Ftl && l.order_id == s.order_id)
                .map(|l| l.cost)
                .sum();
            prop_assert_eq!(s.cost, expected);
        }
    }
}
