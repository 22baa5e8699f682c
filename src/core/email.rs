use mail_parser::MessageParser;

/// The fields of an inbound email that drive action creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEmail {
    pub subject: String,
    /// Plain-text body, newline delimited.
    pub body: String,
    /// Raw `To` header value.
    pub to: String,
    /// Raw `From` header value.
    pub from: String,
}

impl InboundEmail {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        to: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            to: to.into(),
            from: from.into(),
        }
    }

    /// Parse a full RFC 5322 message, as delivered by a mail pipe.
    ///
    /// Only the first plain-text part is kept; HTML parts and attachments
    /// are ignored.
    pub fn from_raw(raw: &[u8]) -> Option<Self> {
        let parsed = MessageParser::default().parse(raw)?;

        let subject = parsed.subject().unwrap_or_default().to_string();
        let body = parsed
            .body_text(0)
            .map(|text| text.into_owned())
            .unwrap_or_default();
        let to = parsed.header_raw("To").unwrap_or_default().trim().to_string();
        let from = parsed
            .header_raw("From")
            .unwrap_or_default()
            .trim()
            .to_string();

        Some(Self {
            subject,
            body,
            to,
            from,
        })
    }
}

/// Case-insensitive substring match of any pattern against a header value.
///
/// This is deliberately not an address parse: `tracks@example.com` also
/// matches a header containing `mytracks@example.com`.
pub fn header_matches(header: &str, patterns: &[String]) -> bool {
    let header = header.to_lowercase();
    patterns
        .iter()
        .any(|pattern| header.contains(&pattern.to_lowercase()))
}
