use serde::Serialize;

/// Coarse outcome of a controller reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Controller accepted the command and is ready for the next.
    Free,
    /// Controller rejected the command.
    Error,
    /// Anything else; the raw text is kept.
    Other,
}

/// A single reply from the command channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: ResponseStatus,
    /// Reply text with whitespace and terminators stripped.
    pub text: String,
    /// Text after the first `|`, if any (e.g. the `0` in `FREE|0`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Response {
    /// Classify a reply.
    ///
    /// The controller has been seen to send both `FREE#` and `#FREE`, so
    /// terminators are stripped from either end.
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim().trim_matches('#').trim();
        let (head, detail) = match text.split_once('|') {
            Some((head, rest)) => (head.trim(), Some(rest.trim().to_string())),
            None => (text, None),
        };

        let status = if head.eq_ignore_ascii_case("FREE") {
            ResponseStatus::Free
        } else if head.eq_ignore_ascii_case("ERROR") {
            ResponseStatus::Error
        } else {
            ResponseStatus::Other
        };

        Self {
            status,
            text: text.to_string(),
            detail,
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == ResponseStatus::Free
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}
