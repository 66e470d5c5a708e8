// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound mail for verification and password-reset codes.
//!
//! SMTP via lettre when a host is configured; otherwise a no-op mode that
//! logs and reports success, so local development never needs a mail
//! server. Sends are retried a few times before the caller sees a
//! delivery failure (registration rolls the account back on that).

use std::sync::Arc;
use std::time::Duration;

use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::Config;
use crate::error::AppError;

const SEND_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Async email transport wrapper (SMTP or no-op).
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    otp_ttl_minutes: i64,
}

impl EmailService {
    /// Build the email service from configuration.
    ///
    /// With no SMTP host the service operates in no-op mode.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let from = config.smtp_from.parse::<Mailbox>().map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Invalid SMTP_FROM address: {}", e))
        })?;

        let transport = match &config.smtp_host {
            None => None,
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| {
                        AppError::Internal(anyhow::anyhow!(
                            "Failed to configure SMTP transport: {}",
                            e
                        ))
                    })?
                    .port(config.smtp_port);

                if !config.smtp_username.is_empty() {
                    builder = builder.credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ));
                }

                Some(Arc::new(builder.build()))
            }
        };

        Ok(Self {
            transport,
            from,
            otp_ttl_minutes: config.otp_ttl_minutes,
        })
    }

    /// Whether a real SMTP transport is configured.
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the registration verification code.
    pub async fn send_otp_email(
        &self,
        recipient: &str,
        username: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let subject = "Verify your Kinderwacht account";
        let body = format!(
            "Hi {},\n\nYour verification code is: {}\n\nIt expires in {} minutes. \
             If you did not create a Kinderwacht account, you can ignore this email.",
            username, code, self.otp_ttl_minutes
        );
        self.send_with_retry(recipient, subject, &body).await
    }

    /// Send the password-reset code.
    pub async fn send_reset_email(
        &self,
        recipient: &str,
        username: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let subject = "Kinderwacht password reset";
        let body = format!(
            "Hi {},\n\nYour password reset code is: {}\n\nIt expires in {} minutes. \
             If you did not request a reset, please ignore this email or contact support.",
            username, code, self.otp_ttl_minutes
        );
        self.send_with_retry(recipient, subject, &body).await
    }

    /// Attempt delivery up to [`SEND_ATTEMPTS`] times with a pause between
    /// attempts. Only the final failure surfaces to the caller.
    async fn send_with_retry(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        let Some(transport) = &self.transport else {
            tracing::info!(subject, recipient, "Email no-op mode; skipping actual send");
            return Ok(());
        };

        let to = recipient.parse::<Mailbox>().map_err(|e| {
            AppError::BadRequest(format!("Invalid recipient email address: {}", e))
        })?;

        let mut last_error = String::new();
        for attempt in 1..=SEND_ATTEMPTS {
            let email = Message::builder()
                .from(self.from.clone())
                .to(to.clone())
                .subject(subject)
                .header(header::ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to build email message: {}", e))
                })?;

            match transport.send(email).await {
                Ok(_) => {
                    tracing::info!(subject, attempt, "Email sent");
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(subject, attempt, error = %last_error, "Email send failed");
                    if attempt < SEND_ATTEMPTS {
                        tokio::time::sleep(RETRY_PAUSE).await;
                    }
                }
            }
        }

        Err(AppError::Delivery(last_error))
    }
}
