//! Verification email delivery.
//!
//! Sends verification links over SMTP when configured. Without SMTP the
//! link is written to the log so a local operator can follow it.

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;

/// SMTP settings, read from the `smtp` block of the server config file.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_pass: Option<String>,
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "GymWay".to_string()
}

/// Errors that can occur when sending email.
#[derive(Debug)]
pub enum EmailError {
    /// Error building the email message.
    MessageError(String),
    /// Error sending the email.
    TransportError(String),
}

impl std::fmt::Display for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailError::MessageError(e) => write!(f, "Failed to build email: {}", e),
            EmailError::TransportError(e) => write!(f, "Failed to send email: {}", e),
        }
    }
}

impl std::error::Error for EmailError {}

fn verification_body(name: Option<&str>, link: &str) -> String {
    let greeting = match name {
        Some(n) if !n.is_empty() => format!("Hi {},", n),
        _ => "Hi,".to_string(),
    };

    format!(
        r#"{greeting}

Welcome to GymWay. Confirm your email address by opening this link:

{link}

This link expires in 24 hours.

If you didn't create an account, you can ignore this email.

- GymWay"#
    )
}

/// SMTP email sender.
#[derive(Clone)]
pub struct EmailSender {
    config: EmailConfig,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub async fn send_verification_link(
        &self,
        to: &str,
        name: Option<&str>,
        link: &str,
    ) -> Result<(), EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::MessageError(format!("{}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| EmailError::MessageError(format!("{}", e)))?)
            .subject("Verify your GymWay account")
            .header(ContentType::TEXT_PLAIN)
            .body(verification_body(name, link))
            .map_err(|e| EmailError::MessageError(e.to_string()))?;

        let transport = self.build_transport()?;

        transport
            .send(email)
            .await
            .map_err(|e| EmailError::TransportError(e.to_string()))?;

        Ok(())
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let mut builder = if self.config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::TransportError(e.to_string()))?
                .port(465)
        } else {
            // STARTTLS on 587, or plain for a local test relay
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| EmailError::TransportError(e.to_string()))?
                .port(self.config.smtp_port)
        };

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(builder.build())
    }
}

impl std::fmt::Debug for EmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSender")
            .field("smtp_host", &self.config.smtp_host)
            .field("smtp_port", &self.config.smtp_port)
            .field("from_email", &self.config.from_email)
            .finish()
    }
}

/// Delivers verification links by email or, without SMTP, to the log.
#[derive(Debug, Clone)]
pub enum Mailer {
    Smtp(EmailSender),
    Log,
}

impl Mailer {
    pub fn from_config(config: Option<EmailConfig>) -> Self {
        match config {
            Some(config) => Mailer::Smtp(EmailSender::new(config)),
            None => Mailer::Log,
        }
    }

    pub async fn send_verification(
        &self,
        to: &str,
        name: Option<&str>,
        link: &str,
    ) -> Result<(), EmailError> {
        match self {
            Mailer::Smtp(sender) => sender.send_verification_link(to, name, link).await,
            Mailer::Log => {
                tracing::info!("SMTP not configured. Verification link for {}: {}", to, link);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_yaml() {
        let yaml = "smtp_host: smtp.example.com\nfrom_email: noreply@example.com\n";
        let config: EmailConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.from_name, "GymWay");
        assert!(config.smtp_user.is_none());
    }

    #[test]
    fn test_mailer_from_config() {
        assert!(matches!(Mailer::from_config(None), Mailer::Log));

        let config = EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_user: None,
            smtp_pass: None,
            from_email: "noreply@example.com".to_string(),
            from_name: "GymWay".to_string(),
        };
        assert!(matches!(Mailer::from_config(Some(config)), Mailer::Smtp(_)));
    }

    #[test]
    fn test_verification_body() {
        let body = verification_body(Some("Alex"), "http://localhost/auth/verify?token=abc");
        assert!(body.starts_with("Hi Alex,"));
        assert!(body.contains("token=abc"));
        assert!(body.contains("24 hours"));

        assert!(verification_body(None, "x").starts_with("Hi,"));
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        Mailer::Log
            .send_verification("a@b.com", None, "http://localhost/verify")
            .await
            .unwrap();
    }

    #[test]
    fn test_email_error_display() {
        let err = EmailError::MessageError("invalid address".to_string());
        assert!(err.to_string().contains("invalid address"));

        let err = EmailError::TransportError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
