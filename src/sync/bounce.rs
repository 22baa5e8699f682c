use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SendmailTransport, SmtpTransport, Transport};

use crate::config::{SmtpConfig, TracksConfig};
use crate::core::email::InboundEmail;
use crate::error::BounceError;

/// Reports an email that could not be turned into an action.
#[allow(async_fn_in_trait)]
pub trait Bouncer {
    /// Log the failure and, if the target has a bounce address, send the
    /// original email back there along with the reason.
    async fn notify(&self, target: &TracksConfig, email: &InboundEmail, error: &str);
}

/// Subject and body of a bounce message.
pub fn compose_bounce(email: &InboundEmail, error: &str) -> (String, String) {
    let mut body = String::from("Could not process incoming action.\n\n");
    if !error.is_empty() {
        body.push_str(error);
        body.push_str("\n\n");
    }
    body.push_str(&format!("Subject: {}\n\n", email.subject));
    body.push_str(&email.body);

    (format!("Could not process {}", email.subject), body)
}

fn log_bounce(error: &str) {
    if error.is_empty() {
        log::error!("Bouncing unspecified error.");
    } else {
        log::error!("Bouncing {}", error);
    }
}

/// Sends bounces by mail, through an SMTP relay or the local `sendmail`.
#[derive(Debug, Clone, Default)]
pub struct MailBouncer {
    smtp: Option<SmtpConfig>,
}

impl MailBouncer {
    pub fn new(smtp: Option<SmtpConfig>) -> Self {
        Self { smtp }
    }

    fn build_message(address: &str, subject: &str, body: String) -> Result<Message, BounceError> {
        let mailbox: Mailbox = address.parse().map_err(|e| BounceError::Address {
            address: address.to_string(),
            reason: format!("{}", e),
        })?;

        Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(subject)
            .body(body)
            .map_err(|e| BounceError::Build(e.to_string()))
    }

    async fn send(&self, message: Message) -> Result<(), BounceError> {
        let smtp = self.smtp.clone();
        tokio::task::spawn_blocking(move || match smtp {
            Some(smtp) => {
                let transport = SmtpTransport::relay(&smtp.host)
                    .map_err(|e| BounceError::Send(format!("SMTP relay error: {}", e)))?
                    .port(smtp.port)
                    .credentials(Credentials::new(smtp.username, smtp.password))
                    .build();
                transport
                    .send(&message)
                    .map(|_| ())
                    .map_err(|e| BounceError::Send(format!("SMTP send failed: {}", e)))
            }
            None => SendmailTransport::new()
                .send(&message)
                .map(|_| ())
                .map_err(|e| BounceError::Send(format!("sendmail failed: {}", e))),
        })
        .await
        .map_err(|e| BounceError::Send(format!("Bounce task panicked: {}", e)))?
    }
}

impl Bouncer for MailBouncer {
    async fn notify(&self, target: &TracksConfig, email: &InboundEmail, error: &str) {
        if let Some(address) = target.bounce.as_deref() {
            let (subject, body) = compose_bounce(email, error);
            let sent = match Self::build_message(address, &subject, body) {
                Ok(message) => self.send(message).await,
                Err(e) => Err(e),
            };
            match sent {
                Ok(()) => log::info!("Bounced to {}", address),
                Err(e) => log::error!("{}", e),
            }
        }

        log_bounce(error);
    }
}
