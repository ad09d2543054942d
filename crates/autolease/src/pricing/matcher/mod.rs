mod rules;

pub use rules::Specificity;

use chrono::NaiveDate;

use super::domain::{ProgramCriteria, Vehicle};
use rules::pattern_specificity;

/// Outcome of checking one program against a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchVerdict {
    pub specificity: Specificity,
}

/// Check every filter for one program; `None` means ineligible.
pub fn evaluate_program<P: ProgramCriteria>(
    program: &P,
    vehicle: &Vehicle,
    credit_score: u16,
    today: NaiveDate,
) -> Option<MatchVerdict> {
    let criteria = program.criteria();
    if !criteria.covers_year(vehicle.year)
        || !criteria.is_active_on(today)
        || credit_score < criteria.min_credit_score
        || !criteria.covers_state(vehicle.state.as_deref())
    {
        return None;
    }

    pattern_specificity(criteria, vehicle).map(|specificity| MatchVerdict { specificity })
}

/// Pick the best active program for a vehicle and credit score.
///
/// Most specific pattern wins (trim, then model, then brand only). Remaining
/// ties go to the most recently created program, then to the lowest id so the
/// result never depends on input order.
pub fn match_program<'a, P: ProgramCriteria>(
    vehicle: &Vehicle,
    credit_score: u16,
    programs: &'a [P],
    today: NaiveDate,
) -> Option<&'a P> {
    let matched = programs
        .iter()
        .filter_map(|program| {
            evaluate_program(program, vehicle, credit_score, today)
                .map(|verdict| (verdict.specificity, program))
        })
        .max_by(|(left_rank, left), (right_rank, right)| {
            left_rank
                .cmp(right_rank)
                .then_with(|| left.criteria().created_at.cmp(&right.criteria().created_at))
                .then_with(|| right.program_id().cmp(left.program_id()))
        })
        .map(|(_, program)| program);

    match matched {
        Some(program) => tracing::debug!(
            program_id = program.program_id(),
            brand = %vehicle.brand,
            model = %vehicle.model,
            "matched pricing program"
        ),
        None => tracing::debug!(
            brand = %vehicle.brand,
            model = %vehicle.model,
            credit_score,
            "no pricing program matched"
        ),
    }

    matched
}
