//! Billing engine: cost from elapsed parking duration.
//!
//! Pure and deterministic given its inputs; the only rule is a minimum
//! one-hour charge and two-decimal rounding on the final amount.

use chrono::{DateTime, Utc};

/// Round to two decimal places (currency-agnostic).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the billed cost of a completed session.
///
/// `billable_hours = max(elapsed, 1.0)`: a one-second stay is still
/// charged a full hour.
pub fn compute_cost(start: DateTime<Utc>, end: DateTime<Utc>, hourly_rate: f64) -> f64 {
    let elapsed_hours = (end - start).num_seconds() as f64 / 3600.0;
    let billable_hours = elapsed_hours.max(1.0);
    round2(billable_hours * hourly_rate)
}

/// Detailed cost breakdown for a completed session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct CostBreakdown {
    /// Actual parked duration in hours (2 decimals)
    pub actual_duration_hours: f64,
    /// Duration billed, at least 1.0
    pub billable_hours: f64,
    /// Rate snapshotted at reservation time
    pub hourly_rate: f64,
    /// `billable_hours * hourly_rate`, rounded
    pub base_cost: f64,
    /// Final billed amount
    pub total_cost: f64,
    /// True when the stay was shorter than one hour
    pub minimum_charge_applied: bool,
    /// Human-readable summary line
    pub breakdown_text: String,
}

impl CostBreakdown {
    /// Breakdown for a session with known start and end times.
    pub fn for_session(start: DateTime<Utc>, end: DateTime<Utc>, hourly_rate: f64) -> Self {
        let hours = (end - start).num_seconds() as f64 / 3600.0;
        let billable_hours = hours.max(1.0);
        let total = round2(billable_hours * hourly_rate);

        Self {
            actual_duration_hours: round2(hours),
            billable_hours: round2(billable_hours),
            hourly_rate,
            base_cost: total,
            total_cost: total,
            minimum_charge_applied: hours < 1.0,
            breakdown_text: format!(
                "{:.2} hours x {}/hour = {}",
                billable_hours, hourly_rate, total
            ),
        }
    }

    /// Placeholder breakdown for a session that has not completed yet.
    pub fn incomplete(hourly_rate: f64) -> Self {
        Self {
            actual_duration_hours: 0.0,
            billable_hours: 0.0,
            hourly_rate,
            base_cost: 0.0,
            total_cost: 0.0,
            minimum_charge_applied: false,
            breakdown_text: "Parking session not completed".to_string(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn ninety_minutes_bills_one_and_a_half_hours() {
        let cost = compute_cost(t0(), t0() + Duration::minutes(90), 50.0);
        assert_eq!(cost, 75.0);
    }

    #[test]
    fn forty_minutes_bills_minimum_one_hour() {
        let cost = compute_cost(t0(), t0() + Duration::minutes(40), 50.0);
        assert_eq!(cost, 50.0);
    }

    #[test]
    fn one_second_stay_still_charged_full_hour() {
        let cost = compute_cost(t0(), t0() + Duration::seconds(1), 30.0);
        assert_eq!(cost, 30.0);
    }

    #[test]
    fn fractional_rate_rounds_to_two_decimals() {
        // 1.5h * 33.33 = 49.995 -> 50.0
        let cost = compute_cost(t0(), t0() + Duration::minutes(90), 33.33);
        assert_eq!(cost, 50.0);
    }

    #[test]
    fn breakdown_flags_minimum_charge() {
        let b = CostBreakdown::for_session(t0(), t0() + Duration::minutes(40), 50.0);
        assert!(b.minimum_charge_applied);
        assert_eq!(b.billable_hours, 1.0);
        assert_eq!(b.actual_duration_hours, 0.67);
        assert_eq!(b.total_cost, 50.0);
    }

    #[test]
    fn breakdown_over_an_hour_uses_actual_duration() {
        let b = CostBreakdown::for_session(t0(), t0() + Duration::minutes(90), 50.0);
        assert!(!b.minimum_charge_applied);
        assert_eq!(b.billable_hours, 1.5);
        assert_eq!(b.total_cost, 75.0);
        assert!(b.breakdown_text.contains("1.50 hours"));
    }

    #[test]
    fn incomplete_breakdown_is_zeroed() {
        let b = CostBreakdown::incomplete(25.0);
        assert_eq!(b.total_cost, 0.0);
        assert_eq!(b.hourly_rate, 25.0);
        assert!(!b.minimum_charge_applied);
    }

    #[test]
    fn cost_matches_breakdown_total() {
        for minutes in [1, 30, 59, 60, 61, 120, 500] {
            let end = t0() + Duration::minutes(minutes);
            let b = CostBreakdown::for_session(t0(), end, 42.5);
            assert_eq!(compute_cost(t0(), end, 42.5), b.total_cost);
        }
    }
}
