// Service exports
pub mod cache;
pub mod catalog;
pub mod extractor;
pub mod identity;
pub mod mailer;
pub mod postgres;
pub mod reminders;
pub mod tokens;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use catalog::ListingCatalog;
pub use extractor::{ExtractError, ExtractedProcess, ProcessExtractor, ProcessStep};
pub use identity::{FederatedIdentity, IdentityError, IdentityVerifier};
pub use mailer::{Delivery, MailError, Mailer};
pub use postgres::{CountedTable, PostgresClient, PostgresError, ReminderCandidate};
pub use reminders::ReminderWorker;
pub use tokens::{Claims, TokenError, TokenService};
