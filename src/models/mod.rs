// Model exports
pub mod domain;
pub mod lenient;
pub mod notifications;
pub mod patch;
pub mod requests;
pub mod responses;

pub use domain::{Criteria, GpaCalculation, Listing, ListingKind, MatchResult, Notification, Profile, User};
pub use notifications::NotificationType;
pub use patch::{PatchError, PatchValue, ProfilePatch};
pub use requests::{
    ComputeGpaRequest, CourseEntry, GoogleLoginRequest, ListingDraft, LoginRequest, MarkReadRequest,
    MatchRequest, NewCalculation, RegisterRequest, SaveCalculationRequest, SemesterEntry,
};
pub use responses::{
    DashboardCounts, DashboardStats, ErrorResponse, GoogleLoginResponse, GpaComputeResponse, HealthResponse,
    MatchEntry, MatchResponse, NextBestAction, Recommendation, TokenResponse,
};
