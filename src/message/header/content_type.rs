use std::fmt::{self, Display};

/// `Content-Type` of the body
///
/// Defined in [RFC2045](https://tools.ietf.org/html/rfc2045#section-5). Only
/// single part UTF-8 text bodies are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `text/plain; charset=UTF-8`
    TextPlain,
    /// `text/html; charset=UTF-8`
    TextHtml,
}

impl ContentType {
    /// The header field name
    pub const NAME: &'static str = "Content-Type";

    /// Picks the HTML or the plain text type
    pub fn for_body(is_html: bool) -> Self {
        if is_html {
            ContentType::TextHtml
        } else {
            ContentType::TextPlain
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::TextPlain => "text/plain; charset=UTF-8",
            ContentType::TextHtml => "text/html; charset=UTF-8",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
