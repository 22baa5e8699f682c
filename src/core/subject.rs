use crate::error::ParseError;

/// Which buffer subject characters are currently being appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Description,
    Context,
    Project,
}

/// A context or project named on the subject line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceRequest {
    /// The requested name, `None` when only a bare `!` (or nothing) was given.
    pub name: Option<String>,
    /// Set by a leading `!`: create the resource remotely if it is missing.
    pub create: bool,
}

impl ResourceRequest {
    fn from_buffer(buffer: &str) -> Self {
        let trimmed = buffer.trim();
        let (create, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        Self {
            name: (!rest.is_empty()).then(|| rest.to_string()),
            create,
        }
    }
}

/// The three parts of an action subject line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubject {
    pub description: String,
    pub context: ResourceRequest,
    pub project: ResourceRequest,
}

/// Split a subject into description, `@ context` and `> project`.
///
/// A backslash makes the next character literal; a trailing lone backslash
/// is dropped. Each of `@` and `>` may introduce at most one non-empty name.
pub fn parse_subject(subject: &str) -> Result<ParsedSubject, ParseError> {
    let mut description = String::new();
    let mut context = String::new();
    let mut project = String::new();
    let mut state = ReadState::Description;

    let mut chars = subject.chars();
    while let Some(ch) = chars.next() {
        let literal = if ch == '\\' {
            match chars.next() {
                Some(next) => next,
                None => break,
            }
        } else {
            match ch {
                '@' => {
                    if !context.is_empty() {
                        return Err(ParseError::DuplicateContext);
                    }
                    state = ReadState::Context;
                    continue;
                }
                '>' => {
                    if !project.is_empty() {
                        return Err(ParseError::DuplicateProject);
                    }
                    state = ReadState::Project;
                    continue;
                }
                other => other,
            }
        };

        match state {
            ReadState::Description => description.push(literal),
            ReadState::Context => context.push(literal),
            ReadState::Project => project.push(literal),
        }
    }

    let description = description.trim();
    if description.is_empty() {
        return Err(ParseError::NoDescription);
    }

    Ok(ParsedSubject {
        description: description.to_string(),
        context: ResourceRequest::from_buffer(&context),
        project: ResourceRequest::from_buffer(&project),
    })
}
