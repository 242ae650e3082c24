//! Coarse heuristics over resolved record sets.
//!
//! These are deliberately crude, stable hints — density buckets, a
//! half-window trend split, a straight-line commute estimate — not
//! statistics. Thresholds are fixed so the same neighborhood keeps the
//! same label from one request to the next.

use chrono::{DateTime, Duration, Utc};
use hoodscope_source_models::CrimeEvent;

/// Events per km² below which the rate reads `"lower"`.
const RATE_LOWER_MAX: f64 = 2.0;

/// Events per km² below which the rate reads `"moderate"`.
const RATE_MODERATE_MAX: f64 = 5.0;

/// Absolute count margin required before the trend leaves `"stable"`.
const TREND_MARGIN: usize = 2;

/// Assumed mixed-mode travel speed for the commute estimate, km/h.
const COMMUTE_SPEED_KMH: f64 = 20.0;

/// Floor on the commute estimate, minutes. No trip is instant.
const COMMUTE_MIN_MINUTES: i64 = 8;

/// Nearest-stop distance considered "near", km.
const TRANSIT_NEAR_KM: f64 = 0.5;

/// Nearest-stop distance considered "moderate", km.
const TRANSIT_MODERATE_KM: f64 = 1.2;

/// Buckets an event count by density over the searched disc.
#[must_use]
pub fn rate_hint(event_count: usize, radius_km: f64) -> &'static str {
    let area_km2 = std::f64::consts::PI * radius_km * radius_km;
    if event_count == 0 || area_km2 <= 0.0 {
        return "unknown";
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = event_count as f64 / area_km2;
    if rate < RATE_LOWER_MAX {
        "lower"
    } else if rate < RATE_MODERATE_MAX {
        "moderate"
    } else {
        "higher"
    }
}

/// Compares event counts in the early and late halves of the look-back
/// window. Moves off `"stable"` only when the halves differ by more
/// than a fixed margin, so a single extra report does not flip the
/// label.
#[must_use]
pub fn trend_hint(events: &[CrimeEvent], cutoff: DateTime<Utc>, window_days: i64) -> &'static str {
    if events.is_empty() {
        return "unknown";
    }

    let midpoint = cutoff + Duration::seconds(window_days * 86_400 / 2);
    let early = events.iter().filter(|e| e.occurred_at < midpoint).count();
    let late = events.len() - early;

    if late > early + TREND_MARGIN {
        "upward"
    } else if early > late + TREND_MARGIN {
        "downward"
    } else {
        "stable"
    }
}

/// Crude door-to-door estimate from straight-line distance at a fixed
/// mixed-mode speed, floored at a minimum trip time.
#[must_use]
pub fn commute_minutes(distance_km: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let est = (distance_km / COMMUTE_SPEED_KMH * 60.0) as i64;
    est.max(COMMUTE_MIN_MINUTES)
}

/// Buckets the distance to the nearest transit stop.
#[must_use]
pub fn transit_hint(nearest_km: Option<f64>) -> &'static str {
    match nearest_km {
        None => "no transit stop data",
        Some(d) if d < TRANSIT_NEAR_KM => "near transit stop (<500m)",
        Some(d) if d < TRANSIT_MODERATE_KM => "moderate transit access (~1km)",
        Some(_) => "far from transit stop (>1km)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(occurred_at: DateTime<Utc>) -> CrimeEvent {
        CrimeEvent {
            event_type: "Assault".to_string(),
            occurred_at,
            lat: 43.6532,
            lon: -79.3832,
        }
    }

    #[test]
    fn rate_buckets_follow_density() {
        // r = 1 km, area ~3.14 km².
        assert_eq!(rate_hint(3, 1.0), "lower"); // ~0.95 / km²
        assert_eq!(rate_hint(10, 1.0), "moderate"); // ~3.2 / km²
        assert_eq!(rate_hint(40, 1.0), "higher"); // ~12.7 / km²
        assert_eq!(rate_hint(0, 1.0), "unknown");
    }

    #[test]
    fn wider_radius_lowers_the_rate() {
        assert_eq!(rate_hint(40, 1.0), "higher");
        assert_eq!(rate_hint(40, 5.0), "lower");
    }

    #[test]
    fn trend_upward_when_late_half_dominates() {
        let now = Utc::now();
        let cutoff = now - Duration::days(30);
        let mut events: Vec<CrimeEvent> = (0..9).map(|_| event_at(now - Duration::days(3))).collect();
        events.push(event_at(now - Duration::days(25)));
        assert_eq!(trend_hint(&events, cutoff, 30), "upward");
    }

    #[test]
    fn trend_stable_within_margin() {
        let now = Utc::now();
        let cutoff = now - Duration::days(30);
        // 4 early, 5 late: inside the ±2 margin.
        let mut events: Vec<CrimeEvent> = (0..4).map(|_| event_at(now - Duration::days(25))).collect();
        events.extend((0..5).map(|_| event_at(now - Duration::days(3))));
        assert_eq!(trend_hint(&events, cutoff, 30), "stable");
    }

    #[test]
    fn trend_downward_when_early_half_dominates() {
        let now = Utc::now();
        let cutoff = now - Duration::days(30);
        let mut events: Vec<CrimeEvent> = (0..8).map(|_| event_at(now - Duration::days(25))).collect();
        events.push(event_at(now - Duration::days(2)));
        assert_eq!(trend_hint(&events, cutoff, 30), "downward");
    }

    #[test]
    fn trend_unknown_without_events() {
        assert_eq!(trend_hint(&[], Utc::now() - Duration::days(30), 30), "unknown");
    }

    #[test]
    fn commute_floors_short_trips() {
        assert_eq!(commute_minutes(0.1), 8);
        assert_eq!(commute_minutes(2.0), 8); // 6 min raw, floored
        assert_eq!(commute_minutes(10.0), 30);
    }

    #[test]
    fn transit_buckets() {
        assert_eq!(transit_hint(Some(0.2)), "near transit stop (<500m)");
        assert_eq!(transit_hint(Some(0.8)), "moderate transit access (~1km)");
        assert_eq!(transit_hint(Some(3.0)), "far from transit stop (>1km)");
        assert_eq!(transit_hint(None), "no transit stop data");
    }
}
