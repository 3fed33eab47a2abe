use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use tracing::{debug, info, warn};

use crate::aggregate::{aggregate_markets, aggregate_quarters, market_reports, merge_totals, quarter_rows};
use crate::allocate::{allocate_ftl, allocate_ltl};
use crate::config::AllocConfig;
use crate::error::AllocError;
use crate::evidence::{compute_summary, RunCounts};
use crate::facility::{ClassifiedLeg, FacilityParser};
use crate::group::group_legs;
use crate::model::{
    AllocMeta, AllocResult, Category, LegRecord, LogicalShipment, MarketCode, MarketTotals, Quarter,
    UnattributedSplit, Warning, WarningKind,
};
use crate::trend::compute_trends;
use crate::validate::validate_legs;

/// Output of one partition of the leg set. Every field folds associatively.
#[derive(Debug, Default)]
struct Partial {
    counts: RunCounts,
    shipments: Vec<LogicalShipment>,
    unattributed: Vec<UnattributedSplit>,
    near_misses: BTreeSet<String>,
    markets: BTreeMap<MarketCode, MarketTotals>,
    quarters: BTreeMap<(MarketCode, Quarter), MarketTotals>,
}

impl Partial {
    fn merge(&mut self, other: Partial) {
        self.counts.merge(&other.counts);
        self.shipments.extend(other.shipments);
        self.unattributed.extend(other.unattributed);
        self.near_misses.extend(other.near_misses);
        merge_totals(&mut self.markets, other.markets);
        merge_totals(&mut self.quarters, other.quarters);
    }
}

/// Run the allocation pipeline over the whole leg set on the calling thread.
pub fn run(config: &AllocConfig, legs: &[LegRecord]) -> Result<AllocResult, AllocError> {
    run_sharded(config, legs, 1)
}

/// Run the pipeline with legs partitioned by order across `shards` threads.
/// Orders never span shards, so the result equals [`run`]'s.
pub fn run_sharded(
    config: &AllocConfig,
    legs: &[LegRecord],
    shards: usize,
) -> Result<AllocResult, AllocError> {
    config.validate()?;
    validate_legs(legs, &config.validation)?;

    let shards = shards.max(1);
    let parser = config.facility_parser();

    let partial = if shards == 1 {
        let all: Vec<&LegRecord> = legs.iter().collect();
        allocate_partition(&parser, &all)?
    } else {
        let buckets = shard_by_order(legs, shards);
        let parser = &parser;
        let partials = std::thread::scope(|scope| {
            let handles: Vec<_> = buckets
                .iter()
                .map(|bucket| scope.spawn(move || allocate_partition(parser, bucket)))
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(i, h)| h.join().map_err(|_| AllocError::WorkerPanicked(i))?)
                .collect::<Result<Vec<_>, AllocError>>()
        })?;
        partials.into_iter().fold(Partial::default(), |mut acc, p| {
            acc.merge(p);
            acc
        })
    };

    Ok(finish(config, shards, partial))
}

fn shard_by_order(legs: &[LegRecord], shards: usize) -> Vec<Vec<&LegRecord>> {
    let mut buckets: Vec<Vec<&LegRecord>> = vec![Vec::new(); shards];
    for leg in legs {
        let mut hasher = DefaultHasher::new();
        leg.order_id.hash(&mut hasher);
        let slot = (hasher.finish() % shards as u64) as usize;
        buckets[slot].push(leg);
    }
    buckets
}

/// Classify, group and allocate one partition. Partitions must not split an order.
fn allocate_partition(parser: &FacilityParser, legs: &[&LegRecord]) -> Result<Partial, AllocError> {
    let mut partial = Partial::default();

    let mut classified = Vec::with_capacity(legs.len());
    for &leg in legs {
        match leg.category {
            Category::Ltl => partial.counts.ltl_legs += 1,
            Category::Ftl => partial.counts.ftl_legs += 1,
            Category::Other => partial.counts.other_legs += 1,
        }
        for location in [&leg.pick_location, &leg.drop_location] {
            if parser.is_near_miss(location) {
                partial.near_misses.insert(location.clone());
            }
        }
        classified.push(ClassifiedLeg::new(parser, leg));
    }
    partial.counts.input_legs = legs.len();

    let grouping = group_legs(&classified);
    partial.counts.ltl_main_discarded = grouping.ltl_main_discarded;
    partial.counts.ftl_orders_discarded = grouping.ftl_orders_discarded;

    for group in &grouping.ltl {
        partial.shipments.push(allocate_ltl(group));
    }
    for group in &grouping.ftl {
        if group.is_multi_market() {
            partial.counts.multi_market_orders += 1;
        }
        let allocation = allocate_ftl(group)?;
        partial.shipments.extend(allocation.shipments);
        partial.unattributed.extend(allocation.unattributed);
    }

    partial.markets = aggregate_markets(&partial.shipments);
    partial.quarters = aggregate_quarters(&partial.shipments);

    debug!(
        legs = legs.len(),
        shipments = partial.shipments.len(),
        markets = partial.markets.len(),
        "partition allocated"
    );
    Ok(partial)
}

fn finish(config: &AllocConfig, shards: usize, mut partial: Partial) -> AllocResult {
    partial.shipments.sort_by(|a, b| {
        (a.category, &a.id, &a.order_id).cmp(&(b.category, &b.id, &b.order_id))
    });
    partial.unattributed.sort_by(|a, b| a.order_id.cmp(&b.order_id));

    let mut warnings: Vec<Warning> = partial
        .shipments
        .iter()
        .flat_map(|s| s.warnings.iter().cloned())
        .collect();
    warnings.extend(partial.near_misses.iter().map(|location| Warning {
        shipment_id: None,
        order_id: None,
        kind: WarningKind::LocationCasing,
        message: format!(
            "location '{location}' matches a {}-MARKET-N crossdock pattern only after case/whitespace normalization; treated as external",
            config.crossdock.prefixes.join("|")
        ),
    }));

    let summary = compute_summary(&partial.counts, &partial.shipments, &partial.markets, &warnings);
    let trends = compute_trends(&partial.quarters, &config.trends);

    info!(
        shipments = partial.shipments.len(),
        markets = summary.markets,
        revenue = %summary.revenue,
        cost = %summary.cost,
        units = summary.units,
        "allocation complete"
    );
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "reconciliation warnings collected");
    }

    AllocResult {
        meta: AllocMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            shards,
        },
        summary,
        markets: market_reports(&partial.markets),
        quarters: quarter_rows(&partial.quarters),
        shipments: partial.shipments,
        warnings,
        unattributed: partial.unattributed,
        trends,
    }
}
