// Core algorithm exports
pub mod age;
pub mod filters;
pub mod gpa;
pub mod matcher;
pub mod progress;

pub use age::calculate_age;
pub use gpa::{cgpa, round2, sgpa, GpaSummary, GradingScale};
pub use matcher::{evaluate, evaluate_at, rank_eligible, rank_eligible_at, RankedListing};
pub use progress::{missing_fields, next_best_action, profile_completion};
