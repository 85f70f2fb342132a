//! Business logic that sits on top of the repository layer.
//!
//! - [`heatmap`]: hour × weekday access aggregation
//! - [`audit`]: bitácora recording with duplicate suppression
//! - [`clock`]: injectable time source

pub mod audit;
pub mod clock;
pub mod heatmap;


pub use audit::{AuditDedupCache, AuditOutcome, AuditRecorder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use heatmap::{
    aggregate_heatmap, get_heatmap_data, parse_window_days, HeatmapAggregation, OutOfRangePolicy,
    RawHourlyCount, TimeSlot, Weekday, TIME_SLOTS,
};
