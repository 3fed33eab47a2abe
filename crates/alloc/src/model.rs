use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::trend::TrendReport;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Shipment category. `Other` is carried through ingestion but never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ltl,
    Ftl,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ltl => write!(f, "ltl"),
            Self::Ftl => write!(f, "ftl"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One raw ledger row: a single movement from a pick location to a drop location.
#[derive(Debug, Clone, PartialEq)]
pub struct LegRecord {
    pub leg_id: String,
    pub order_id: String,
    pub is_main_leg: bool,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub units: i64,
    pub pick_location: String,
    pub drop_location: String,
    pub category: Category,
    pub pick_window: Option<NaiveDateTime>,
}

// ---------------------------------------------------------------------------
// Facilities
// ---------------------------------------------------------------------------

/// Three-letter market code (`LAX`, `EWR`, ...). Always uppercase ASCII.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarketCode([u8; 3]);

impl MarketCode {
    /// Accepts exactly three uppercase ASCII letters.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes: [u8; 3] = s.as_bytes().try_into().ok()?;
        if bytes.iter().all(u8::is_ascii_uppercase) {
            Some(Self(bytes))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        // Constructed only from ASCII uppercase bytes.
        std::str::from_utf8(&self.0).unwrap_or("")
    }
}

impl fmt::Display for MarketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for MarketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarketCode({})", self.as_str())
    }
}

impl Serialize for MarketCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A crossdock facility parsed from `PREFIX-{MARKET}-{sequence}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MarketFacility {
    pub market: MarketCode,
    pub sequence: u32,
}

/// A location after strict parsing. Anything that is not a crossdock is external.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Crossdock(MarketFacility),
    External,
}

impl Facility {
    pub fn is_crossdock(&self) -> bool {
        matches!(self, Self::Crossdock(_))
    }

    pub fn market(&self) -> Option<MarketCode> {
        match self {
            Self::Crossdock(f) => Some(f.market),
            Self::External => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
    Neither,
}

// ---------------------------------------------------------------------------
// Quarters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Quarter {
    pub fn from_pick_window(window: Option<NaiveDateTime>) -> Self {
        match window.map(|w| w.month()) {
            Some(1..=3) => Self::Q1,
            Some(4..=6) => Self::Q2,
            Some(7..=9) => Self::Q3,
            Some(10..=12) => Self::Q4,
            _ => Self::Unknown,
        }
    }

    /// 1-based quarter number, `None` for `Unknown`.
    pub fn number(&self) -> Option<u8> {
        match self {
            Self::Q1 => Some(1),
            Self::Q2 => Some(2),
            Self::Q3 => Some(3),
            Self::Q4 => Some(4),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Q1 => write!(f, "Q1"),
            Self::Q2 => write!(f, "Q2"),
            Self::Q3 => write!(f, "Q3"),
            Self::Q4 => write!(f, "Q4"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Negative revenue, cost or units on a contributing leg.
    NegativeValue,
    /// LTL main leg revenue and the non-crossdock fallback sum are both non-zero.
    RevenuePatternConflict,
    /// LTL main leg revenue is zero and so is the fallback sum.
    ZeroRevenue,
    /// Unit count is zero after the fallback rule.
    ZeroUnits,
    /// Multi-market FTL split left legs outside every per-market shipment.
    UnattributedSplitAmount,
    /// Location only matches the crossdock pattern after case/whitespace normalization.
    LocationCasing,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeValue => write!(f, "negative_value"),
            Self::RevenuePatternConflict => write!(f, "revenue_pattern_conflict"),
            Self::ZeroRevenue => write!(f, "zero_revenue"),
            Self::ZeroUnits => write!(f, "zero_units"),
            Self::UnattributedSplitAmount => write!(f, "unattributed_split_amount"),
            Self::LocationCasing => write!(f, "location_casing"),
        }
    }
}

/// A non-fatal reconciliation finding. Never alters computed numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub kind: WarningKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Logical shipments
// ---------------------------------------------------------------------------

/// The unit of financial reporting: one LTL main leg, one FTL order, or one
/// market's share of a multi-market FTL order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalShipment {
    pub id: String,
    pub category: Category,
    pub order_id: String,
    pub leg_ids: BTreeSet<String>,
    pub market: MarketCode,
    pub quarter: Quarter,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub units: i64,
    /// True when this shipment is one market's share of a multi-market order.
    pub split: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Legs of a multi-market FTL order that no per-market shipment absorbed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnattributedSplit {
    pub order_id: String,
    pub markets: Vec<MarketCode>,
    pub leg_ids: BTreeSet<String>,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub units: i64,
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Running per-market sums. Folding is associative and commutative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketTotals {
    pub market: MarketCode,
    pub shipment_count: usize,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub units: i64,
}

impl MarketTotals {
    pub fn new(market: MarketCode) -> Self {
        Self {
            market,
            shipment_count: 0,
            revenue: Decimal::ZERO,
            cost: Decimal::ZERO,
            units: 0,
        }
    }

    pub fn add(&mut self, shipment: &LogicalShipment) {
        self.shipment_count += 1;
        self.revenue += shipment.revenue;
        self.cost += shipment.cost;
        self.units += shipment.units;
    }

    pub fn merge(&mut self, other: &MarketTotals) {
        self.shipment_count += other.shipment_count;
        self.revenue += other.revenue;
        self.cost += other.cost;
        self.units += other.units;
    }

    pub fn profit(&self) -> Decimal {
        self.revenue - self.cost
    }

    /// Cost per unit, zero when no units were shipped.
    pub fn cost_per_unit(&self) -> Decimal {
        if self.units == 0 {
            Decimal::ZERO
        } else {
            self.cost / Decimal::from(self.units)
        }
    }

    /// Profit as a percentage of revenue, zero when revenue is not positive.
    pub fn margin_pct(&self) -> Decimal {
        if self.revenue > Decimal::ZERO {
            self.profit() / self.revenue * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }
}

/// Market totals plus the derived board-report ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketReport {
    #[serde(flatten)]
    pub totals: MarketTotals,
    pub profit: Decimal,
    pub cost_per_unit: Decimal,
    pub margin_pct: Decimal,
}

impl From<&MarketTotals> for MarketReport {
    fn from(totals: &MarketTotals) -> Self {
        Self {
            totals: totals.clone(),
            profit: totals.profit(),
            cost_per_unit: totals.cost_per_unit().round_dp(4),
            margin_pct: totals.margin_pct().round_dp(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterTotals {
    pub quarter: Quarter,
    #[serde(flatten)]
    pub totals: MarketTotals,
    pub profit: Decimal,
    pub cost_per_unit: Decimal,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub input_legs: usize,
    pub ltl_legs: usize,
    pub ftl_legs: usize,
    pub other_legs: usize,
    pub ltl_main_discarded: usize,
    pub ftl_orders_discarded: usize,
    pub ltl_shipments: usize,
    pub ftl_shipments: usize,
    pub multi_market_orders: usize,
    pub markets: usize,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub units: i64,
    pub warning_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocMeta {
    pub config_name: String,
    pub engine_version: String,
    pub shards: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocResult {
    pub meta: AllocMeta,
    pub summary: RunSummary,
    /// Ordered by revenue descending, ties by market code.
    pub markets: Vec<MarketReport>,
    pub quarters: Vec<QuarterTotals>,
    pub shipments: Vec<LogicalShipment>,
    pub warnings: Vec<Warning>,
    pub unattributed: Vec<UnattributedSplit>,
    pub trends: TrendReport,
}

impl AllocResult {
    /// Totals for one market, if any shipment landed there.
    pub fn market(&self, code: &str) -> Option<&MarketTotals> {
        self.markets
            .iter()
            .map(|r| &r.totals)
            .find(|t| t.market.as_str() == code)
    }
}
