//! Headers of the dispatched messages
// https://tools.ietf.org/html/rfc5322#section-2.2

use std::fmt::{self, Display};

mod content_type;

pub use self::content_type::ContentType;

/// An ordered list of header fields
///
/// Fields are written in insertion order. Values are written verbatim: no
/// folding and no encoded words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(&'static str, String)>,
}

impl Headers {
    #[inline]
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            headers: Vec::with_capacity(capacity),
        }
    }

    /// Gets the value of the first field called `name`, ignoring case
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name_, _value)| name.eq_ignore_ascii_case(name_))
            .map(|(_name, value)| value.as_str())
    }

    /// Sets a field, replacing the value in place if the field is already
    /// present
    pub fn set_raw(&mut self, name: &'static str, value: String) {
        match self
            .headers
            .iter_mut()
            .find(|(name_, _value)| name.eq_ignore_ascii_case(name_))
        {
            Some((_, current_value)) => *current_value = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Fields in output order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            f.write_str(name)?;
            f.write_str(": ")?;
            f.write_str(value)?;
            f.write_str("\r\n")?;
        }

        Ok(())
    }
}
