pub mod bounce;
pub mod client;
pub mod keyring;
pub mod resolve;

use crate::config::{AppConfig, TracksConfig};
use crate::core::action::Action;
use crate::core::email::{InboundEmail, header_matches};
use crate::core::escape::xml_escape;
use crate::error::SyncError;
use bounce::Bouncer;
use client::{RemoteClient, TracksClient};
use resolve::{ResourceKind, resolve};

/// Collection path for creating todos.
pub const TODOS_PATH: &str = "todos.xml";

/// What happened to one email for one Tracks target.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The email is not addressed to this target (or the sender is not allowed).
    Skipped,
    /// A todo was created with this id.
    Created(u64),
    /// Processing failed and the bounce channel was notified.
    Bounced(SyncError),
}

impl SyncOutcome {
    pub fn created_id(&self) -> Option<u64> {
        match self {
            Self::Created(id) => Some(*id),
            _ => None,
        }
    }
}

/// Whether an email's headers select this target.
pub fn accepts(target: &TracksConfig, email: &InboundEmail) -> bool {
    if !header_matches(&email.to, &target.emails) {
        return false;
    }
    if let Some(froms) = &target.froms {
        if !header_matches(&email.from, froms) {
            log::warn!("No match on From header.\n{}", email.from);
            return false;
        }
    }
    true
}

/// XML body of a todo creation request.
pub fn todo_payload(action: &Action, context_id: u64, project_id: Option<u64>) -> String {
    let mut xml = format!(
        "<todo><description>{}</description><context_id>{}</context_id>",
        xml_escape(&action.description),
        context_id
    );
    if let Some(project_id) = project_id {
        xml.push_str(&format!("<project_id>{}</project_id>", project_id));
    }
    if let Some(note) = &action.note {
        xml.push_str(&format!("<notes>{}</notes>", xml_escape(note)));
    }
    xml.push_str("</todo>");
    xml
}

/// Resolve context and project, then create the todo. Returns its id.
async fn push_action<C: RemoteClient>(
    target: &TracksConfig,
    client: &C,
    action: &Action,
) -> Result<u64, SyncError> {
    if let Some(e) = &action.error {
        return Err(e.clone().into());
    }

    let context_id = resolve(
        client,
        ResourceKind::Context,
        action.context_name(),
        action.context.create,
        Some(target.default_context),
        target.strict,
    )
    .await?
    .unwrap_or(target.default_context);

    let project_id = resolve(
        client,
        ResourceKind::Project,
        action.project_name(),
        action.project.create,
        None,
        target.strict,
    )
    .await?;

    let payload = todo_payload(action, context_id, project_id);
    Ok(client.post(TODOS_PATH, &payload).await?)
}

async fn bounce<B: Bouncer>(
    target: &TracksConfig,
    bouncer: &B,
    email: &InboundEmail,
    error: SyncError,
) -> SyncOutcome {
    bouncer.notify(target, email, &error.to_string()).await;
    SyncOutcome::Bounced(error)
}

/// Push one parsed email to one Tracks target.
///
/// Requests are issued strictly in order: context lookup (and creation),
/// project lookup (and creation), then the todo itself. Any failure is
/// bounced and stops the remaining steps for this target.
pub async fn synchronize<C: RemoteClient, B: Bouncer>(
    target: &TracksConfig,
    client: &C,
    bouncer: &B,
    email: &InboundEmail,
    action: &Action,
) -> SyncOutcome {
    if !accepts(target, email) {
        return SyncOutcome::Skipped;
    }
    match push_action(target, client, action).await {
        Ok(id) => {
            log::info!("Written new todo {} to {}", id, target.base_url);
            SyncOutcome::Created(id)
        }
        Err(e) => bounce(target, bouncer, email, e).await,
    }
}

/// Opens a client for one target.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Client: RemoteClient;

    async fn connect(&self, target: &TracksConfig) -> Result<Self::Client, SyncError>;
}

/// Connects over HTTP with the password from the config or the keyring.
pub struct KeyringConnector;

impl Connector for KeyringConnector {
    type Client = TracksClient;

    async fn connect(&self, target: &TracksConfig) -> Result<TracksClient, SyncError> {
        let password = keyring::target_password(target)
            .await
            .map_err(|reason| SyncError::Credentials {
                base_url: target.base_url.clone(),
                reason,
            })?;
        Ok(TracksClient::for_target(target, &password)?)
    }
}

/// Process an email against every configured target, one after another.
///
/// An invalid action is bounced before any connection is opened. A failure
/// against one target never stops the others.
pub async fn process_email<K: Connector, B: Bouncer>(
    config: &AppConfig,
    email: &InboundEmail,
    connector: &K,
    bouncer: &B,
) -> Vec<SyncOutcome> {
    log::info!("Processing subject: {}", email.subject);
    let action = Action::from_email(email);

    let mut outcomes = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        if !accepts(target, email) {
            log::debug!("Skipping {}", target.base_url);
            outcomes.push(SyncOutcome::Skipped);
            continue;
        }

        if let Some(e) = &action.error {
            outcomes.push(bounce(target, bouncer, email, e.clone().into()).await);
            continue;
        }

        let client = match connector.connect(target).await {
            Ok(client) => client,
            Err(e) => {
                outcomes.push(bounce(target, bouncer, email, e).await);
                continue;
            }
        };

        outcomes.push(synchronize(target, &client, bouncer, email, &action).await);
    }
    outcomes
}
