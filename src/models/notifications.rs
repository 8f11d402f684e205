use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Notification categories written by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Eligible,
    DeadlineReminder,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Eligible => "eligible",
            NotificationType::DeadlineReminder => "deadline_reminder",
        }
    }
}

/// Payload for a "you are now eligible" notification
pub fn eligible_payload(title: &str) -> Value {
    json!({ "title": title })
}

/// Payload for an approaching-deadline reminder
pub fn deadline_reminder_payload(
    scholarship_id: i64,
    title: &str,
    deadline: NaiveDate,
    days_left: i64,
) -> Value {
    let unit = if days_left > 1 { "days" } else { "day" };
    json!({
        "title": "Scholarship Deadline Approaching",
        "message": format!("The \"{}\" scholarship deadline is in {} {}!", title, days_left, unit),
        "deadline": deadline,
        "daysLeft": days_left,
        "actionUrl": format!("/scholarships/{}", scholarship_id),
    })
}
