//! Scholar Match - eligibility matching and opportunity service for students
//!
//! Matches student profiles against the eligibility criteria of scholarships
//! and serves listings, notifications, dashboard stats and a GPA calculator
//! over HTTP.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{evaluate, evaluate_at, rank_eligible, RankedListing};
pub use error::ApiError;
pub use models::{Criteria, Listing, ListingKind, MatchResult, Profile};
