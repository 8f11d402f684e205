use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    GpaCalculation, Listing, ListingDraft, ListingKind, NewCalculation, Notification, PatchValue, Profile,
    ProfilePatch, User,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Profile row as stored; `dob` is a DATE column
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: i64,
    full_name: Option<String>,
    course: Option<String>,
    dob: Option<NaiveDate>,
    year_of_study: Option<i32>,
    income: Option<f64>,
    caste: Option<String>,
    disability: Option<bool>,
    disability_details: Option<String>,
    tenth_marks: Option<f64>,
    tenth_percentage: Option<f64>,
    twelfth_marks: Option<f64>,
    twelfth_percentage: Option<f64>,
    last_semester_marks: Option<f64>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: Some(row.user_id),
            full_name: row.full_name,
            course: row.course,
            date_of_birth: row.dob.map(|d| d.format("%Y-%m-%d").to_string()),
            year_of_study: row.year_of_study.map(i64::from),
            income: row.income,
            caste: row.caste,
            disability: row.disability,
            disability_details: row.disability_details,
            tenth_marks: row.tenth_marks,
            tenth_percentage: row.tenth_percentage,
            twelfth_marks: row.twelfth_marks,
            twelfth_percentage: row.twelfth_percentage,
            last_semester_marks: row.last_semester_marks,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

/// A user holding an `eligible` notification for a scholarship that closes soon
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderCandidate {
    pub user_id: i64,
    pub scholarship_id: i64,
    pub title: String,
    pub deadline: NaiveDate,
}

/// Tables that are only counted, capped at 100 rows
#[derive(Debug, Clone, Copy)]
pub enum CountedTable {
    Internships,
    Courses,
}

impl CountedTable {
    fn name(&self) -> &'static str {
        match self {
            CountedTable::Internships => "internships",
            CountedTable::Courses => "courses",
        }
    }
}

/// Select list that folds kind-specific columns into [`Listing`]'s fields
fn listing_columns(kind: ListingKind) -> String {
    format!(
        "id, title, {} AS sponsor, description, {} AS reward, {} AS due_date, \
         application_url, process_steps, criteria, tags, created_at, updated_at",
        kind.sponsor_column(),
        kind.reward_column(),
        kind.due_date_column()
    )
}

fn push_patch_value(builder: &mut QueryBuilder<'_, Postgres>, value: &PatchValue) {
    match value {
        PatchValue::Text(v) => builder.push_bind(v.clone()),
        PatchValue::Integer(v) => builder.push_bind(*v),
        PatchValue::Float(v) => builder.push_bind(*v),
        PatchValue::Bool(v) => builder.push_bind(*v),
        PatchValue::Date(v) => builder.push_bind(*v),
    };
}

/// PostgreSQL client for accounts, profiles, listings and notifications
///
/// Every statement is parameterized; the only interpolated identifiers are
/// table and column names taken from [`ListingKind`] and the profile column
/// table.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Build a client whose pool only connects on first use
    ///
    /// No migrations are run.
    pub fn connect_lazy(database_url: &str, acquire_timeout: Duration) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    // --- users ---

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, PostgresError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, auth_provider, google_id FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Create an email/password account
    pub async fn create_password_user(&self, email: &str, password_hash: &str) -> Result<i64, PostgresError> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, auth_provider) VALUES ($1, $2, 'email') RETURNING id",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.get("id")),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(PostgresError::Conflict("Email already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create an account for a federated identity, with a profile when a name is known
    pub async fn create_google_user(
        &self,
        email: &str,
        google_id: &str,
        full_name: Option<&str>,
    ) -> Result<i64, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO users (email, auth_provider, google_id) VALUES ($1, 'google', $2) RETURNING id",
        )
        .bind(email)
        .bind(google_id)
        .fetch_one(&mut *tx)
        .await?;
        let user_id: i64 = row.get("id");

        if let Some(name) = full_name {
            sqlx::query(
                "INSERT INTO profiles (user_id, full_name) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
            )
            .bind(user_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!("Created Google account {}", user_id);

        Ok(user_id)
    }

    /// Attach a federated identity to an existing password account
    pub async fn link_google_account(&self, user_id: i64, google_id: &str) -> Result<(), PostgresError> {
        sqlx::query("UPDATE users SET google_id = $1, auth_provider = 'google' WHERE id = $2")
            .bind(google_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Linked Google identity to user {}", user_id);
        Ok(())
    }

    pub async fn email_for_user(&self, user_id: i64) -> Result<Option<String>, PostgresError> {
        let row = sqlx::query("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("email")))
    }

    // --- profiles ---

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<Profile>, PostgresError> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Profile::from))
    }

    /// Make sure a profile row exists without touching its contents
    pub async fn ensure_profile(&self, user_id: i64) -> Result<(), PostgresError> {
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert or update only the columns present in the patch
    pub async fn upsert_profile(&self, user_id: i64, patch: &ProfilePatch) -> Result<(), PostgresError> {
        if patch.is_empty() {
            return self.ensure_profile(user_id).await;
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("INSERT INTO profiles (user_id");
        for column in patch.columns() {
            builder.push(", ").push(column);
        }

        builder.push(") VALUES (");
        builder.push_bind(user_id);
        for (_, value) in &patch.fields {
            builder.push(", ");
            push_patch_value(&mut builder, value);
        }

        builder.push(") ON CONFLICT (user_id) DO UPDATE SET ");
        for column in patch.columns() {
            builder.push(format!("{column} = EXCLUDED.{column}, "));
        }
        builder.push("updated_at = NOW()");

        builder.build().execute(&self.pool).await?;

        tracing::debug!("Updated {} profile columns for user {}", patch.fields.len(), user_id);
        Ok(())
    }

    /// Remove the account and everything it owns in one transaction
    pub async fn delete_account(&self, user_id: i64) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;

        for statement in [
            "DELETE FROM notifications WHERE user_id = $1",
            "DELETE FROM gpa_calculations WHERE user_id = $1",
            "DELETE FROM profiles WHERE user_id = $1",
            "DELETE FROM users WHERE id = $1",
        ] {
            sqlx::query(statement).bind(user_id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::info!("Deleted account {}", user_id);

        Ok(())
    }

    // --- listings ---

    pub async fn list_listings(&self, kind: ListingKind) -> Result<Vec<Listing>, PostgresError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id ASC",
            listing_columns(kind),
            kind.table()
        );

        let listings = sqlx::query_as::<_, Listing>(&sql).fetch_all(&self.pool).await?;
        tracing::debug!("Loaded {} {}", listings.len(), kind.table());

        Ok(listings)
    }

    pub async fn get_listing(&self, kind: ListingKind, id: i64) -> Result<Option<Listing>, PostgresError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", listing_columns(kind), kind.table());

        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    pub async fn create_listing(&self, kind: ListingKind, draft: &ListingDraft) -> Result<Listing, PostgresError> {
        let sql = format!(
            "INSERT INTO {} (title, {}, description, {}, {}, application_url, process_steps, criteria, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            kind.table(),
            kind.sponsor_column(),
            kind.reward_column(),
            kind.due_date_column(),
            listing_columns(kind)
        );

        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(&draft.title)
            .bind(&draft.sponsor)
            .bind(&draft.description)
            .bind(&draft.reward)
            .bind(draft.due_date)
            .bind(&draft.application_url)
            .bind(&draft.process_steps)
            .bind(&draft.criteria)
            .bind(&draft.tags)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created {} {}", kind.singular(), listing.id);
        Ok(listing)
    }

    /// Replace every editable field of a listing
    pub async fn update_listing(
        &self,
        kind: ListingKind,
        id: i64,
        draft: &ListingDraft,
    ) -> Result<Option<Listing>, PostgresError> {
        let sql = format!(
            "UPDATE {} SET title = $1, {} = $2, description = $3, {} = $4, {} = $5, application_url = $6, \
             process_steps = $7, criteria = $8, tags = $9, updated_at = NOW() WHERE id = $10 RETURNING {}",
            kind.table(),
            kind.sponsor_column(),
            kind.reward_column(),
            kind.due_date_column(),
            listing_columns(kind)
        );

        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(&draft.title)
            .bind(&draft.sponsor)
            .bind(&draft.description)
            .bind(&draft.reward)
            .bind(draft.due_date)
            .bind(&draft.application_url)
            .bind(&draft.process_steps)
            .bind(&draft.criteria)
            .bind(&draft.tags)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    pub async fn delete_listing(&self, kind: ListingKind, id: i64) -> Result<bool, PostgresError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Store extracted application steps on a scholarship
    pub async fn set_process_steps(&self, scholarship_id: i64, steps: &Value) -> Result<bool, PostgresError> {
        let result = sqlx::query("UPDATE scholarships SET process_steps = $1, updated_at = NOW() WHERE id = $2")
            .bind(steps)
            .bind(scholarship_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Row count of a table, capped at 100
    pub async fn count_capped(&self, table: CountedTable) -> Result<i64, PostgresError> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM (SELECT 1 FROM {} LIMIT 100) AS capped",
            table.name()
        );
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;

        Ok(row.get("count"))
    }

    // --- notifications ---

    pub async fn list_notifications(&self, user_id: i64) -> Result<Vec<Notification>, PostgresError> {
        let query = r#"
            SELECT n.id, n.user_id, n.scholarship_id, n.type AS kind, n.payload, n.read, n.created_at,
                   s.title AS scholarship_title
            FROM notifications n
            LEFT JOIN scholarships s ON s.id = n.scholarship_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
        "#;

        let notifications = sqlx::query_as::<_, Notification>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, PostgresError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM notifications WHERE user_id = $1 AND read = false")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }

    /// Mark one of the user's notifications read; other users' rows are untouched
    pub async fn mark_notification_read(&self, user_id: i64, id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query("UPDATE notifications SET read = true WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, PostgresError> {
        let result = sqlx::query("UPDATE notifications SET read = true WHERE user_id = $1 AND read = false")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_notification(&self, user_id: i64, id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the user already has any notification about a scholarship
    pub async fn has_notification(&self, user_id: i64, scholarship_id: i64) -> Result<bool, PostgresError> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM notifications WHERE user_id = $1 AND scholarship_id = $2) AS found",
        )
        .bind(user_id)
        .bind(scholarship_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("found"))
    }

    pub async fn create_notification(
        &self,
        user_id: i64,
        kind: &str,
        payload: &Value,
        scholarship_id: Option<i64>,
    ) -> Result<i64, PostgresError> {
        let row = sqlx::query(
            "INSERT INTO notifications (user_id, type, payload, scholarship_id, read, created_at) \
             VALUES ($1, $2, $3, $4, false, NOW()) RETURNING id",
        )
        .bind(user_id)
        .bind(kind)
        .bind(payload)
        .bind(scholarship_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn count_notifications_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64, PostgresError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM notifications WHERE user_id = $1 AND created_at >= $2")
            .bind(user_id)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }

    /// Eligible users of scholarships closing within `[from, until]` with no reminder yet
    pub async fn reminder_candidates(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ReminderCandidate>, PostgresError> {
        let query = r#"
            SELECT DISTINCT n.user_id, s.id AS scholarship_id, s.title, s.deadline
            FROM notifications n
            JOIN scholarships s ON s.id = n.scholarship_id
            WHERE n.type = 'eligible'
              AND s.deadline BETWEEN $1 AND $2
              AND NOT EXISTS (
                  SELECT 1 FROM notifications r
                  WHERE r.user_id = n.user_id
                    AND r.scholarship_id = s.id
                    AND r.type = 'deadline_reminder'
              )
        "#;

        let candidates = sqlx::query_as::<_, ReminderCandidate>(query)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(candidates)
    }

    // --- GPA calculations ---

    pub async fn list_calculations(&self, user_id: i64) -> Result<Vec<GpaCalculation>, PostgresError> {
        let calculations = sqlx::query_as::<_, GpaCalculation>(
            "SELECT * FROM gpa_calculations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(calculations)
    }

    pub async fn latest_calculation(&self, user_id: i64) -> Result<Option<GpaCalculation>, PostgresError> {
        let calculation = sqlx::query_as::<_, GpaCalculation>(
            "SELECT * FROM gpa_calculations WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(calculation)
    }

    pub async fn insert_calculation(
        &self,
        user_id: i64,
        new: &NewCalculation,
    ) -> Result<GpaCalculation, PostgresError> {
        let query = r#"
            INSERT INTO gpa_calculations
                (user_id, calculation_type, semester_name, grading_scale, courses,
                 total_credits, total_grade_points, gpa, previous_cgpa, previous_credits)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
        "#;

        let calculation = sqlx::query_as::<_, GpaCalculation>(query)
            .bind(user_id)
            .bind(&new.calculation_type)
            .bind(&new.semester_name)
            .bind(&new.grading_scale)
            .bind(&new.courses)
            .bind(new.total_credits)
            .bind(new.total_grade_points)
            .bind(new.gpa)
            .bind(new.previous_cgpa)
            .bind(new.previous_credits)
            .fetch_one(&self.pool)
            .await?;

        Ok(calculation)
    }

    /// Owner of a saved calculation, `None` when it does not exist
    pub async fn calculation_owner(&self, id: i64) -> Result<Option<i64>, PostgresError> {
        let row = sqlx::query("SELECT user_id FROM gpa_calculations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("user_id")))
    }

    pub async fn delete_calculation(&self, id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM gpa_calculations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_columns_alias_kind_fields() {
        let columns = listing_columns(ListingKind::Competition);
        assert!(columns.contains("organizer AS sponsor"));
        assert!(columns.contains("prize_money AS reward"));
        assert!(columns.contains("event_date AS due_date"));
    }

    #[test]
    fn test_profile_row_formats_dob() {
        let row = ProfileRow {
            user_id: 4,
            full_name: None,
            course: Some("B.Com".to_string()),
            dob: NaiveDate::from_ymd_opt(2003, 7, 9),
            year_of_study: Some(2),
            income: None,
            caste: None,
            disability: Some(false),
            disability_details: None,
            tenth_marks: None,
            tenth_percentage: None,
            twelfth_marks: None,
            twelfth_percentage: None,
            last_semester_marks: Some(7.5),
            address_line1: None,
            address_line2: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
        };

        let profile = Profile::from(row);
        assert_eq!(profile.user_id, Some(4));
        assert_eq!(profile.date_of_birth.as_deref(), Some("2003-07-09"));
        assert_eq!(profile.year_of_study, Some(2));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_health_check() {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/scholar_match".to_string());
        let client = PostgresClient::from_settings(&url, Some(2), Some(1), Some(5), None)
            .await
            .expect("Failed to connect");
        assert!(client.health_check().await.unwrap());
    }
}
