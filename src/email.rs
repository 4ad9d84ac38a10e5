use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::EmailCfg;

/// Outbound SMTP mailer. Only constructed when credentials are configured;
/// callers treat its absence as "sending disabled".
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_cfg(cfg: &EmailCfg) -> anyhow::Result<Option<Self>> {
        let (Some(user), Some(password)) = (cfg.user.as_ref(), cfg.password.as_ref()) else {
            info!("SMTP credentials not set, outbound email disabled");
            return Ok(None);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("building SMTP transport")?
            .port(cfg.port)
            .credentials(Credentials::new(user.clone(), password.clone()))
            .build();
        let from = cfg
            .from
            .as_deref()
            .unwrap_or(user)
            .parse::<Mailbox>()
            .context("parsing sender address")?;

        Ok(Some(Self { transport, from }))
    }

    /// Fire an HTML email, reporting (never propagating) failure.
    pub async fn send(&self, to: &str, subject: &str, html: String) -> bool {
        let message = to
            .parse::<Mailbox>()
            .map_err(anyhow::Error::from)
            .and_then(|to| {
                Message::builder()
                    .from(self.from.clone())
                    .to(to)
                    .subject(subject)
                    .header(ContentType::TEXT_HTML)
                    .body(html)
                    .map_err(anyhow::Error::from)
            });

        let message = match message {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "could not build outbound email");
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "email send failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailer_is_disabled_without_credentials() {
        let cfg = EmailCfg::default();
        assert!(Mailer::from_cfg(&cfg).unwrap().is_none());
    }

    #[tokio::test]
    async fn mailer_builds_with_credentials() {
        let cfg = EmailCfg {
            user: Some("mailer@example.com".to_string()),
            password: Some("app-password".to_string()),
            ..EmailCfg::default()
        };
        assert!(Mailer::from_cfg(&cfg).unwrap().is_some());
    }
}
