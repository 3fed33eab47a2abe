//! Ledger CSV → typed leg records.
//!
//! This is the loading collaborator: it converts textual rows into
//! [`LegRecord`]s and applies the status/year filter. The engine itself
//! never filters.

use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{ColumnMapping, LoadFilter};
use crate::error::AllocError;
use crate::model::{Category, LegRecord};

/// Textual pick window format used by the ledger export.
pub const PICK_WINDOW_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

pub fn parse_category(value: &str) -> Category {
    match value.trim() {
        "Less Than Truckload" => Category::Ltl,
        "Full Truckload" => Category::Ftl,
        _ => Category::Other,
    }
}

fn parse_main_leg(value: &str) -> Option<bool> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if v.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

fn parse_money(value: &str) -> Option<Decimal> {
    let v = value.trim();
    if v.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(v).ok()
}

/// Integer units; exports sometimes write `4.0`.
fn parse_units(value: &str) -> Option<i64> {
    let v = value.trim();
    if v.is_empty() {
        return Some(0);
    }
    if let Ok(n) = v.parse::<i64>() {
        return Some(n);
    }
    let d = Decimal::from_str(v).ok()?;
    if d.fract().is_zero() {
        d.trunc().to_i64()
    } else {
        None
    }
}

fn parse_pick_window(value: &str) -> Option<Option<NaiveDateTime>> {
    let v = value.trim();
    if v.is_empty() {
        return Some(None);
    }
    NaiveDateTime::parse_from_str(v, PICK_WINDOW_FORMAT).ok().map(Some)
}

/// Parse ledger CSV text into leg records, skipping rows the filter rejects.
pub fn load_csv_legs(
    csv_data: &str,
    columns: &ColumnMapping,
    filter: &LoadFilter,
) -> Result<Vec<LegRecord>, AllocError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AllocError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, AllocError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AllocError::MissingColumn { column: name.into() })
    };

    let leg_id_idx = idx(&columns.leg_id)?;
    let order_id_idx = idx(&columns.order_id)?;
    let main_idx = idx(&columns.main_leg)?;
    let revenue_idx = idx(&columns.revenue)?;
    let cost_idx = idx(&columns.cost)?;
    let units_idx = idx(&columns.units)?;
    let pick_idx = idx(&columns.pick_location)?;
    let drop_idx = idx(&columns.drop_location)?;
    let category_idx = idx(&columns.category)?;
    let pick_window_idx = idx(&columns.pick_window)?;

    let status_filter = filter.status.as_deref().filter(|s| !s.is_empty());
    let status_idx = match status_filter {
        Some(_) => Some(idx(&columns.status)?),
        None => None,
    };

    let mut legs = Vec::new();
    let mut skipped = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AllocError::Io(e.to_string()))?;
        // Header is line 1.
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        if let (Some(wanted), Some(si)) = (status_filter, status_idx) {
            if field(si).trim() != wanted {
                skipped += 1;
                continue;
            }
        }

        let leg_id = field(leg_id_idx).trim().to_string();
        let parse_err = |name: &'static str, value: &str| AllocError::FieldParse {
            row,
            leg_id: leg_id.clone(),
            field: name,
            value: value.to_string(),
        };

        let raw_window = field(pick_window_idx);
        let pick_window =
            parse_pick_window(raw_window).ok_or_else(|| parse_err("pick window", raw_window))?;

        if let Some(year) = filter.year {
            if pick_window.map(|w| w.year()) != Some(year) {
                skipped += 1;
                continue;
            }
        }

        let raw_main = field(main_idx);
        let is_main_leg = parse_main_leg(raw_main).ok_or_else(|| parse_err("main leg flag", raw_main))?;
        let raw_revenue = field(revenue_idx);
        let revenue = parse_money(raw_revenue).ok_or_else(|| parse_err("revenue", raw_revenue))?;
        let raw_cost = field(cost_idx);
        let cost = parse_money(raw_cost).ok_or_else(|| parse_err("cost", raw_cost))?;
        let raw_units = field(units_idx);
        let units = parse_units(raw_units).ok_or_else(|| parse_err("units", raw_units))?;

        legs.push(LegRecord {
            order_id: field(order_id_idx).trim().to_string(),
            is_main_leg,
            revenue,
            cost,
            units,
            pick_location: field(pick_idx).to_string(),
            drop_location: field(drop_idx).to_string(),
            category: parse_category(field(category_idx)),
            pick_window,
            leg_id,
        });
    }

    debug!(loaded = legs.len(), skipped, "ledger CSV parsed");
    Ok(legs)
}
