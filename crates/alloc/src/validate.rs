use std::collections::HashSet;

use crate::config::ValidationConfig;
use crate::error::AllocError;
use crate::model::LegRecord;

/// Check leg records before a run. A no-op unless validation is enabled.
pub fn validate_legs(legs: &[LegRecord], config: &ValidationConfig) -> Result<(), AllocError> {
    if !config.enabled {
        return Ok(());
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(legs.len());
    for leg in legs {
        if leg.leg_id.trim().is_empty() {
            return Err(AllocError::MissingField {
                leg_id: leg.leg_id.clone(),
                field: "leg_id",
            });
        }
        if leg.order_id.trim().is_empty() {
            return Err(AllocError::MissingField {
                leg_id: leg.leg_id.clone(),
                field: "order_id",
            });
        }
        if config.require_locations {
            if leg.pick_location.trim().is_empty() {
                return Err(AllocError::MissingField {
                    leg_id: leg.leg_id.clone(),
                    field: "pick_location",
                });
            }
            if leg.drop_location.trim().is_empty() {
                return Err(AllocError::MissingField {
                    leg_id: leg.leg_id.clone(),
                    field: "drop_location",
                });
            }
        }
        if !seen.insert(leg.leg_id.as_str()) {
            return Err(AllocError::DuplicateLeg(leg.leg_id.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use rust_decimal::Decimal;

    fn leg(id: &str, order: &str, pick: &str) -> LegRecord {
        LegRecord {
            leg_id: id.into(),
            order_id: order.into(),
            is_main_leg: true,
            revenue: Decimal::ZERO,
            cost: Decimal::ZERO,
            units: 0,
            pick_location: pick.into(),
            drop_location: "Consignee".into(),
            category: Category::Ltl,
            pick_window: None,
        }
    }

    fn enabled(require_locations: bool) -> ValidationConfig {
        ValidationConfig {
            enabled: true,
            require_locations,
        }
    }

    #[test]
    fn disabled_trusts_input() {
        let legs = vec![leg("", "", ""), leg("", "", "")];
        assert!(validate_legs(&legs, &ValidationConfig::default()).is_ok());
    }

    #[test]
    fn rejects_missing_ids() {
        let err = validate_legs(&[leg("W1", " ", "A")], &enabled(false)).unwrap_err();
        assert!(matches!(err, AllocError::MissingField { field: "order_id", .. }));
    }

    #[test]
    fn rejects_duplicate_leg() {
        let legs = vec![leg("W1", "O1", "A"), leg("W1", "O2", "A")];
        let err = validate_legs(&legs, &enabled(false)).unwrap_err();
        assert_eq!(err.to_string(), "duplicate leg id 'W1'");
        assert!(err.is_validation());
    }

    #[test]
    fn empty_location_only_fatal_when_required() {
        let legs = vec![leg("W1", "O1", "")];
        assert!(validate_legs(&legs, &enabled(false)).is_ok());
        let err = validate_legs(&legs, &enabled(true)).unwrap_err();
        assert!(matches!(err, AllocError::MissingField { field: "pick_location", .. }));
    }
}
