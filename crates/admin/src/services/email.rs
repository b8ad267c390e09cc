//! Email service for sign-in, sign-up confirmation and password reset links.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the magic link email.
#[derive(Template)]
#[template(path = "email/magic_link.html")]
struct MagicLinkEmailHtml<'a> {
    link: &'a str,
    minutes: i64,
}

/// Plain text template for the magic link email.
#[derive(Template)]
#[template(path = "email/magic_link.txt")]
struct MagicLinkEmailText<'a> {
    link: &'a str,
    minutes: i64,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    link: &'a str,
    minutes: i64,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    link: &'a str,
    minutes: i64,
}

/// HTML template for the sign-up confirmation email.
#[derive(Template)]
#[template(path = "email/sign_up.html")]
struct SignUpEmailHtml<'a> {
    link: &'a str,
    minutes: i64,
}

/// Plain text template for the sign-up confirmation email.
#[derive(Template)]
#[template(path = "email/sign_up.txt")]
struct SignUpEmailText<'a> {
    link: &'a str,
    minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a one-time sign-in link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_magic_link(
        &self,
        to: &str,
        link: &str,
        minutes: i64,
    ) -> Result<(), EmailError> {
        let html = MagicLinkEmailHtml { link, minutes }.render()?;
        let text = MagicLinkEmailText { link, minutes }.render()?;

        self.send_multipart_email(to, "Your Appy Link admin sign-in link", &text, &html)
            .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        link: &str,
        minutes: i64,
    ) -> Result<(), EmailError> {
        let html = PasswordResetEmailHtml { link, minutes }.render()?;
        let text = PasswordResetEmailText { link, minutes }.render()?;

        self.send_multipart_email(to, "Reset your Appy Link admin password", &text, &html)
            .await
    }

    /// Send the link that confirms a password sign-up.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_sign_up_confirmation(
        &self,
        to: &str,
        link: &str,
        minutes: i64,
    ) -> Result<(), EmailError> {
        let html = SignUpEmailHtml { link, minutes }.render()?;
        let text = SignUpEmailText { link, minutes }.render()?;

        self.send_multipart_email(to, "Confirm your Appy Link admin account", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_link_templates_include_link_and_expiry() {
        let link = "https://admin.appylink.co.uk/auth/magic/abc123";
        let text = MagicLinkEmailText { link, minutes: 15 }.render().unwrap();
        assert!(text.contains(link));
        assert!(text.contains("15 minutes"));

        let html = MagicLinkEmailHtml { link, minutes: 15 }.render().unwrap();
        assert!(html.contains(&format!("href=\"{link}\"")));
    }

    #[test]
    fn test_reset_template_mentions_expiry() {
        let text = PasswordResetEmailText {
            link: "https://admin.appylink.co.uk/auth/reset/xyz",
            minutes: 60,
        }
        .render()
        .unwrap();
        assert!(text.contains("60 minutes"));
    }

    #[test]
    fn test_sign_up_templates_include_link() {
        let link = "https://admin.appylink.co.uk/auth/signup/tok";
        let text = SignUpEmailText { link, minutes: 60 }.render().unwrap();
        assert!(text.contains(link));
        assert!(text.contains("60 minutes"));

        let html = SignUpEmailHtml { link, minutes: 60 }.render().unwrap();
        assert!(html.contains(&format!("href=\"{link}\"")));
    }
}
