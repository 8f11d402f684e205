use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::MailSettings;
use crate::models::Listing;

/// Errors that can occur when sending mail
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Message build error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// What happened to an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No SMTP credentials are configured
    Skipped,
}

/// Subject and plain-text body of an eligibility alert
pub fn eligibility_message(listing: &Listing) -> (String, String) {
    let subject = format!("You may be eligible: {}", listing.title);
    let body = format!(
        "We found a scholarship that matches your profile: {}\n\nApply here: {}\n\nProvider: {}\n\nDescription: {}",
        listing.title,
        listing.application_url.as_deref().unwrap_or("-"),
        listing.sponsor.as_deref().unwrap_or("-"),
        listing.description.as_deref().unwrap_or("-"),
    );
    (subject, body)
}

struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// SMTP mailer; without credentials every send is logged and skipped
pub struct Mailer {
    sender: Option<SmtpSender>,
}

impl Mailer {
    pub fn from_settings(settings: &MailSettings) -> Result<Self, MailError> {
        let username = settings.username.as_deref().filter(|u| !u.is_empty());
        let password = settings.password.as_deref().filter(|p| !p.is_empty());

        let (Some(username), Some(password)) = (username, password) else {
            tracing::warn!("Mailer not configured; eligibility emails are disabled");
            return Ok(Self::disabled());
        };

        let from: Mailbox = settings.from.as_deref().unwrap_or(username).parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        tracing::info!("Mailer configured for {}", settings.smtp_host);

        Ok(Self {
            sender: Some(SmtpSender { transport, from }),
        })
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Tell a student about a scholarship they now qualify for
    pub async fn send_eligibility(&self, to: &str, listing: &Listing) -> Result<Delivery, MailError> {
        let Some(sender) = &self.sender else {
            tracing::warn!("Mailer not configured; skipping email to {}", to);
            return Ok(Delivery::Skipped);
        };

        let (subject, body) = eligibility_message(listing);
        let message = Message::builder()
            .from(sender.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .body(body)?;

        sender.transport.send(message).await?;
        tracing::debug!("Sent eligibility email for listing {} to {}", listing.id, to);

        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing() -> Listing {
        Listing {
            id: 9,
            title: "Women in STEM".to_string(),
            sponsor: Some("Tech Trust".to_string()),
            description: None,
            reward: None,
            due_date: None,
            application_url: Some("https://example.org/apply".to_string()),
            process_steps: None,
            criteria: None,
            tags: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_eligibility_message() {
        let (subject, body) = eligibility_message(&listing());
        assert_eq!(subject, "You may be eligible: Women in STEM");
        assert!(body.contains("Apply here: https://example.org/apply"));
        assert!(body.contains("Provider: Tech Trust"));
        assert!(body.ends_with("Description: -"));
    }

    #[test]
    fn test_missing_credentials_disable_mailer() {
        let settings = MailSettings {
            smtp_host: "smtp.example.org".to_string(),
            username: Some("alerts@example.org".to_string()),
            password: None,
            from: None,
        };
        assert!(!Mailer::from_settings(&settings).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_mailer_skips() {
        let mailer = Mailer::disabled();
        let delivery = mailer.send_eligibility("student@example.org", &listing()).await.unwrap();
        assert_eq!(delivery, Delivery::Skipped);
    }
}
