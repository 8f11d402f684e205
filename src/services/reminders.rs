use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::models::notifications::{deadline_reminder_payload, NotificationType};
use crate::services::postgres::{PostgresClient, PostgresError, ReminderCandidate};

/// Periodically reminds eligible students of approaching scholarship deadlines
///
/// A student gets at most one reminder per scholarship, once the deadline is
/// between 1 and `window_days` days away.
pub struct ReminderWorker {
    postgres: Arc<PostgresClient>,
    interval: Duration,
    window_days: i64,
}

/// Days until the deadline, as shown in the reminder text
pub fn days_left(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (deadline - today).num_days()
}

impl ReminderWorker {
    pub fn new(postgres: Arc<PostgresClient>, interval: Duration, window_days: i64) -> Self {
        Self {
            postgres,
            interval,
            window_days,
        }
    }

    /// One scan; returns the number of reminders written
    pub async fn run_once(&self, today: NaiveDate) -> Result<usize, PostgresError> {
        let from = today + ChronoDuration::days(1);
        let until = today + ChronoDuration::days(self.window_days);
        let candidates = self.postgres.reminder_candidates(from, until).await?;

        let mut sent = 0;
        for ReminderCandidate {
            user_id,
            scholarship_id,
            title,
            deadline,
        } in candidates
        {
            let payload = deadline_reminder_payload(scholarship_id, &title, deadline, days_left(deadline, today));

            match self
                .postgres
                .create_notification(
                    user_id,
                    NotificationType::DeadlineReminder.as_str(),
                    &payload,
                    Some(scholarship_id),
                )
                .await
            {
                Ok(_) => sent += 1,
                Err(e) => tracing::warn!(
                    "Failed to write deadline reminder for user {} / scholarship {}: {}",
                    user_id,
                    scholarship_id,
                    e
                ),
            }
        }

        Ok(sent)
    }

    /// Run forever on the configured interval
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            // interval() panics on a zero period
            let mut ticker = tokio::time::interval(self.interval.max(Duration::from_secs(1)));
            tracing::info!(
                "Deadline reminders every {}s for deadlines within {} days",
                self.interval.as_secs(),
                self.window_days
            );

            loop {
                ticker.tick().await;
                match self.run_once(Utc::now().date_naive()).await {
                    Ok(0) => tracing::debug!("No deadline reminders due"),
                    Ok(n) => tracing::info!("Sent {} deadline reminders", n),
                    Err(e) => tracing::error!("Deadline reminder scan failed: {}", e),
                }
            }
        })
    }
}
