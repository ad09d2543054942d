use crate::pricing::domain::{EligibilityCriteria, Vehicle};

/// How precisely a program targets a vehicle. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    Brand,
    Model,
    Trim,
}

/// One precedence level of the match rule list.
pub(crate) struct MatchRule {
    pub(crate) specificity: Specificity,
    applies: fn(&EligibilityCriteria) -> bool,
}

/// Evaluated top to bottom; the first rule a program declares decides its rank.
pub(crate) const MATCH_RULES: [MatchRule; 3] = [
    MatchRule {
        specificity: Specificity::Trim,
        applies: declares_trim,
    },
    MatchRule {
        specificity: Specificity::Model,
        applies: declares_model,
    },
    MatchRule {
        specificity: Specificity::Brand,
        applies: always,
    },
];

fn declares_trim(criteria: &EligibilityCriteria) -> bool {
    criteria.trim.is_some()
}

fn declares_model(criteria: &EligibilityCriteria) -> bool {
    criteria.model.is_some()
}

fn always(_: &EligibilityCriteria) -> bool {
    true
}

/// Rank of the patterns a program declares, if every declared pattern hits.
pub(crate) fn pattern_specificity(
    criteria: &EligibilityCriteria,
    vehicle: &Vehicle,
) -> Option<Specificity> {
    if !criteria.brand.trim().eq_ignore_ascii_case(vehicle.brand.trim()) {
        return None;
    }
    if let Some(model) = &criteria.model {
        if !model.matches(&vehicle.model) {
            return None;
        }
    }
    if let Some(trim) = &criteria.trim {
        match vehicle.trim.as_deref() {
            Some(vehicle_trim) if trim.matches(vehicle_trim) => {}
            _ => return None,
        }
    }

    MATCH_RULES
        .iter()
        .find(|rule| (rule.applies)(criteria))
        .map(|rule| rule.specificity)
}
