//! Crossdock facility parsing and leg direction.
//!
//! Locations are parsed once per leg into a [`Facility`]; every later stage
//! works on the tagged value instead of re-matching the free-text name.

use crate::model::{Direction, Facility, LegRecord, MarketCode, MarketFacility};

/// Crossdock name families recognized out of the box (`WTCH-LAX-9`, `ACCL-EWR-2`).
pub const DEFAULT_PREFIXES: &[&str] = &["WTCH", "ACCL"];

/// Strict `PREFIX-{MARKET}-{sequence}` parser over one or more prefixes.
/// Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct FacilityParser {
    prefixes: Vec<String>,
    folded_prefixes: Vec<String>,
}

impl Default for FacilityParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIXES.iter().copied())
    }
}

impl FacilityParser {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        let folded_prefixes = prefixes.iter().map(|p| p.to_ascii_uppercase()).collect();
        Self { prefixes, folded_prefixes }
    }

    /// Parse a location into its crossdock market and sequence, if it is one.
    pub fn classify(&self, location: &str) -> Option<MarketFacility> {
        self.prefixes
            .iter()
            .find_map(|prefix| parse_crossdock(prefix, location))
    }

    pub fn parse(&self, location: &str) -> Facility {
        match self.classify(location) {
            Some(f) => Facility::Crossdock(f),
            None => Facility::External,
        }
    }

    /// True when the location is not a crossdock under the strict rule but
    /// would be one after trimming and uppercasing. Reported, never accepted.
    pub fn is_near_miss(&self, location: &str) -> bool {
        if self.classify(location).is_some() {
            return false;
        }
        let folded = location.trim().to_ascii_uppercase();
        self.folded_prefixes
            .iter()
            .any(|prefix| parse_crossdock(prefix, &folded).is_some())
    }
}

fn parse_crossdock(prefix: &str, location: &str) -> Option<MarketFacility> {
    let rest = location.strip_prefix(prefix)?.strip_prefix('-')?;
    let (market, sequence) = rest.split_once('-')?;
    let market = MarketCode::parse(market)?;
    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sequence = sequence.parse().ok()?;
    Some(MarketFacility { market, sequence })
}

/// Direction of a leg relative to crossdocks.
pub fn direction(pick: &Facility, drop: &Facility) -> Direction {
    match (pick, drop) {
        (Facility::Crossdock(_), Facility::External) => Direction::Outbound,
        (Facility::External, Facility::Crossdock(_)) => Direction::Inbound,
        _ => Direction::Neither,
    }
}

/// A leg with both endpoints parsed.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedLeg<'a> {
    pub leg: &'a LegRecord,
    pub pick: Facility,
    pub drop: Facility,
}

impl<'a> ClassifiedLeg<'a> {
    pub fn new(parser: &FacilityParser, leg: &'a LegRecord) -> Self {
        Self {
            leg,
            pick: parser.parse(&leg.pick_location),
            drop: parser.parse(&leg.drop_location),
        }
    }

    pub fn direction(&self) -> Direction {
        direction(&self.pick, &self.drop)
    }

    /// Market of the crossdock endpoint, `None` when direction is `Neither`.
    pub fn market(&self) -> Option<MarketCode> {
        match self.direction() {
            Direction::Outbound => self.pick.market(),
            Direction::Inbound => self.drop.market(),
            Direction::Neither => None,
        }
    }

    /// Internal transfer between two crossdocks (any markets).
    pub fn is_crossdock_to_crossdock(&self) -> bool {
        self.pick.is_crossdock() && self.drop.is_crossdock()
    }
}
