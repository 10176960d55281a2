//! Session state machine and progress events.

/// States of one inspection session.
///
/// ```text
/// Idle ──begin──▶ Collecting { question_index: 0 }
///                   │  answer accepted → question_index += 1
///                   │  last answer of a section → section attached
///                   └─ all questions answered ──▶ Complete
/// ```
///
/// Exhausted retries or an abort leave the session in `Collecting` with the
/// cursor and any half-answered section intact.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,

    Collecting {
        /// Position in the flattened question sequence.
        question_index: usize,
        /// Answers of the section currently being asked; attached to the
        /// record only once the whole section is answered.
        pending_section: Vec<(String, String)>,
    },

    /// Every question answered; the record is final.
    Complete,
}

impl SessionState {
    pub fn is_collecting(&self) -> bool {
        matches!(self, SessionState::Collecting { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SessionState::Complete)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Collecting { .. } => "Collecting",
            SessionState::Complete => "Complete",
        }
    }
}

/// Progress notifications for the invoking shell.  Observational only.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        inspection_id: String,
    },
    Listening {
        field: String,
        prompt: String,
        attempt: u32,
    },
    Heard {
        field: String,
        text: String,
    },
    Retrying {
        field: String,
        attempt: u32,
        reason: &'static str,
    },
    SectionComplete {
        section: String,
    },
    Complete,
}
