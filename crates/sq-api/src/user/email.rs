use lettre::{
    Message, SmtpTransport, Transport, message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use super::token::invitation_url;
use crate::error::ApiError;

/// Outgoing mail over SMTP.
///
/// Sending is blocking; call [`EmailService::send_invitation_email`] from
/// `spawn_blocking`.
#[derive(Clone)]
pub struct EmailService {
    smtp_host: String,
    smtp_username: String,
    smtp_password: String,
    from: Mailbox,
    frontend_url: String,
}

impl EmailService {
    pub fn new(
        smtp_host: &str,
        smtp_username: &str,
        smtp_password: &str,
        from_email: &str,
        from_name: &str,
        frontend_url: &str,
    ) -> Result<Self, ApiError> {
        let from: Mailbox = format!("{from_name} <{from_email}>")
            .parse()
            .map_err(|e| ApiError::Email(format!("Invalid from email: {e}")))?;

        Ok(Self {
            smtp_host: smtp_host.to_string(),
            smtp_username: smtp_username.to_string(),
            smtp_password: smtp_password.to_string(),
            from,
            frontend_url: frontend_url.to_string(),
        })
    }

    fn create_transport(&self) -> Result<SmtpTransport, ApiError> {
        let credentials = Credentials::new(self.smtp_username.clone(), self.smtp_password.clone());

        let transport = SmtpTransport::relay(&self.smtp_host)
            .map_err(|e| ApiError::Email(format!("Failed to create SMTP transport: {e}")))?
            .credentials(credentials)
            .build();

        Ok(transport)
    }

    fn invitation_message(
        &self,
        to_email: &str,
        display_name: &str,
        inviter_name: &str,
        token: &str,
        expiry_hours: i64,
    ) -> Result<Message, ApiError> {
        let accept_url = invitation_url(&self.frontend_url, token);

        let body = format!(
            "Hi {display_name},\n\n{inviter_name} invited you to StoryQuest.\n\nChoose your password and activate your account here:\n{accept_url}\n\nThis link will expire in {expiry_hours} hours.\n\nIf you were not expecting this invitation, you can ignore this email."
        );

        Message::builder()
            .from(self.from.clone())
            .to(to_email
                .parse()
                .map_err(|e| ApiError::Validation(format!("Invalid recipient email: {e}")))?)
            .subject("You're invited to StoryQuest")
            .body(body)
            .map_err(|e| ApiError::Email(format!("Failed to build email: {e}")))
    }

    pub fn send_invitation_email(
        &self,
        to_email: &str,
        display_name: &str,
        inviter_name: &str,
        token: &str,
        expiry_hours: i64,
    ) -> Result<(), ApiError> {
        let email =
            self.invitation_message(to_email, display_name, inviter_name, token, expiry_hours)?;

        self.create_transport()?
            .send(&email)
            .map_err(|e| ApiError::Email(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService::new(
            "smtp.example.com",
            "mailer",
            "secret",
            "noreply@storyquest.app",
            "StoryQuest",
            "https://storyquest.app",
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_sender() {
        let result = EmailService::new(
            "smtp.example.com",
            "mailer",
            "secret",
            "not an address",
            "StoryQuest",
            "https://storyquest.app",
        );
        assert!(matches!(result, Err(ApiError::Email(_))));
    }

    #[test]
    fn test_invitation_message_contains_link() {
        let message = service()
            .invitation_message("new@example.com", "Sam", "Ms. Rivera", "tok123", 72)
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: new@example.com"));
        assert!(raw.contains("https://storyquest.app/accept-invitation?token=tok123"));
        assert!(raw.contains("72 hours"));
    }

    #[test]
    fn test_invitation_message_rejects_bad_recipient() {
        let result = service().invitation_message("nope", "Sam", "Admin", "tok", 72);
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
