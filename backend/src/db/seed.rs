//! Synthetic access traffic for development databases.
//!
//! Generates a week of events ending at a given instant: heavy traffic during
//! business hours, moderate traffic in the extended day and a trickle at
//! night, with weekends at 30 % volume. Output is deterministic for a given
//! `now` and seed.

use chrono::{DateTime, Datelike, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{AccessResult, AccessType, AreaId, DeviceId, NewAccessEvent, UserId};

pub const DEMO_SEED: u64 = 0x5EED_ACCE55;
pub const DEMO_DAYS: i64 = 7;

const DEMO_USERS: i64 = 10;
const DEMO_AREAS: i64 = 5;
const DEMO_DEVICES: i64 = 5;

/// Events for the [`DEMO_DAYS`] days ending at `now`, oldest first.
///
/// Nothing is generated after `now`, so the whole set falls inside a default
/// heatmap window.
pub fn demo_access_events(now: DateTime<Utc>, seed: u64) -> Vec<NewAccessEvent> {
    let mut rng = StdRng::seed_from_u64(seed);
    let midnight = now
        .duration_trunc(Duration::days(1))
        .unwrap_or(now);
    let mut events = Vec::new();

    for day in (0..DEMO_DAYS).rev() {
        let date = midnight - Duration::days(day);
        let weekend = matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun);

        for hour in 0..24 {
            let mut accesses: u32 = match hour {
                8..=18 => rng.gen_range(10..40),
                6..=22 => rng.gen_range(5..20),
                _ => rng.gen_range(0..5),
            };
            if weekend {
                accesses = (accesses as f64 * 0.3).floor() as u32;
            }

            let hour_start = date + Duration::hours(hour);
            for _ in 0..accesses {
                let timestamp = hour_start + Duration::seconds(rng.gen_range(0..3600));
                let access_type = if rng.gen_bool(0.1) {
                    AccessType::Exit
                } else {
                    AccessType::Entry
                };
                let result = if rng.gen_bool(0.05) {
                    AccessResult::Denied
                } else {
                    AccessResult::Success
                };
                let event = NewAccessEvent {
                    user_id: Some(UserId(rng.gen_range(1..=DEMO_USERS))),
                    area_id: Some(AreaId(rng.gen_range(1..=DEMO_AREAS))),
                    device_id: Some(DeviceId(rng.gen_range(1..=DEMO_DEVICES))),
                    access_type,
                    result,
                    timestamp,
                };
                if event.timestamp <= now {
                    events.push(event);
                }
            }
        }
    }

    events.sort_by_key(|e| e.timestamp);
    events
}
