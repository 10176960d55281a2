//! [`Transcript`]: the four-way result of one prompt/listen round.

use std::fmt;

/// Outcome of speaking a prompt and capturing one utterance.
///
/// The three sentinels are retry signals for the session; they are never
/// written into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognised text.
    Text(String),
    /// Speech was captured but could not be understood.
    Unknown,
    /// The recognition backend failed.
    Error,
    /// No speech started within the listen window.
    Timeout,
}

impl Transcript {
    /// The recognised text, or `None` for a sentinel or blank text.
    ///
    /// ```
    /// use truck_inspect::speech::Transcript;
    ///
    /// assert_eq!(Transcript::Text("SN1".into()).usable_text(), Some("SN1"));
    /// assert_eq!(Transcript::Text("  ".into()).usable_text(), None);
    /// assert_eq!(Transcript::Timeout.usable_text(), None);
    /// ```
    pub fn usable_text(&self) -> Option<&str> {
        match self {
            Transcript::Text(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Transcript::Text(_))
    }

    /// Short label for logs and events.  Blank text reports as `Unknown`.
    pub fn label(&self) -> &'static str {
        match self {
            Transcript::Text(text) if text.trim().is_empty() => "Unknown",
            Transcript::Text(_) => "Text",
            Transcript::Unknown => "Unknown",
            Transcript::Error => "Error",
            Transcript::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transcript::Text(text) => f.write_str(text),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_word_unknown_is_not_a_sentinel() {
        let t = Transcript::Text("Unknown".into());
        assert!(!t.is_sentinel());
        assert_eq!(t.usable_text(), Some("Unknown"));
    }

    #[test]
    fn sentinels_have_no_text() {
        for t in [Transcript::Unknown, Transcript::Error, Transcript::Timeout] {
            assert!(t.is_sentinel());
            assert!(t.usable_text().is_none());
        }
    }

    #[test]
    fn blank_text_labels_as_unknown() {
        assert_eq!(Transcript::Text("\t".into()).label(), "Unknown");
    }

    #[test]
    fn display_shows_text_or_label() {
        assert_eq!(Transcript::Text("Volvo".into()).to_string(), "Volvo");
        assert_eq!(Transcript::Timeout.to_string(), "Timeout");
    }
}
