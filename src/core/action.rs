use super::body::extract_note;
use super::email::InboundEmail;
use super::subject::{ResourceRequest, parse_subject};
use crate::error::ParseError;

/// A Tracks action parsed from one email.
///
/// When the subject cannot be parsed the action is invalid and carries the
/// error that will be bounced back; its description is then empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Action {
    pub description: String,
    /// Markup-ready note: escaped lines joined with `<br/>\n`.
    pub note: Option<String>,
    pub context: ResourceRequest,
    pub project: ResourceRequest,
    pub error: Option<ParseError>,
}

impl Action {
    pub fn parse(subject: &str, body: &str) -> Self {
        let note = extract_note(body);
        match parse_subject(subject) {
            Ok(parsed) => Self {
                description: parsed.description,
                note,
                context: parsed.context,
                project: parsed.project,
                error: None,
            },
            Err(e) => Self {
                note,
                error: Some(e),
                ..Self::default()
            },
        }
    }

    pub fn from_email(email: &InboundEmail) -> Self {
        Self::parse(&email.subject, &email.body)
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn context_name(&self) -> Option<&str> {
        self.context.name.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.name.as_deref()
    }
}
