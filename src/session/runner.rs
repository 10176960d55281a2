//! [`InspectionSession`]: drives a [`QuestionSchedule`] through a
//! [`PromptListener`] and accumulates an [`InspectionRecord`].
//!
//! # Question loop
//!
//! ```text
//! for each step (flat questions, then section questions):
//!   loop:
//!     abort requested?            → Err(Aborted)
//!     prompt_and_listen(prompt)
//!       Text(non-blank)           → write answer, next step
//!       Unknown | Error | Timeout → attempts == max? Err(RetriesExhausted)
//!                                   else say(apology), ask again
//! ```
//!
//! A section's answers are held in the state until its last question is
//! answered, then attached to the record in one piece.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use thiserror::Error;

use crate::config::SessionConfig;
use crate::inspection::{FieldPath, InspectionRecord, QuestionSchedule, ScheduleError, Step};
use crate::speech::PromptListener;

use super::state::{SessionEvent, SessionState};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Reasons a session stops before it is complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,

    #[error("session already started (state: {0})")]
    AlreadyStarted(&'static str),

    #[error("invalid question schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("no usable answer for {field:?} after {attempts} attempts")]
    RetriesExhausted { field: String, attempts: u32 },

    #[error("collection aborted while asking for {field:?}")]
    Aborted { field: String },
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How often a question is re-asked and what is said in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    /// `{field}` is replaced by the lower-cased field name.
    pub apology: String,
}

impl RetryPolicy {
    /// Retry until an answer arrives or the session is aborted.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            max_attempts: (config.max_attempts > 0).then_some(config.max_attempts),
            apology: config.apology.clone(),
        }
    }

    /// ```
    /// use truck_inspect::session::RetryPolicy;
    ///
    /// assert_eq!(
    ///     RetryPolicy::default().apology_for("Truck Model"),
    ///     "Sorry, I couldn't get you. Can you please repeat the truck model?"
    /// );
    /// ```
    pub fn apology_for(&self, field: &str) -> String {
        self.apology.replace("{field}", &field.to_lowercase())
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

// ---------------------------------------------------------------------------
// AbortHandle
// ---------------------------------------------------------------------------

/// Cloneable operator-abort signal, checked before every attempt.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous abort so the session can be resumed.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Two-stage interrupt handling.
///
/// The first interrupt from `interrupted` sets `abort`; the second returns
/// `true` so the caller can exit while a blocking read is still pending.
/// Returns `false` if the signal source fails.
pub async fn watch_interrupts<F, Fut>(abort: &AbortHandle, mut interrupted: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = interrupted().await {
        log::error!("session: cannot listen for interrupts: {e}");
        return false;
    }
    log::warn!("Interrupt received; stopping after the current answer (Ctrl-C again to quit now)");
    abort.abort();

    match interrupted().await {
        Ok(()) => true,
        Err(e) => {
            log::error!("session: cannot listen for interrupts: {e}");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// InspectionSession
// ---------------------------------------------------------------------------

/// One inspection session, owned by the calling layer.
#[derive(Debug, Default)]
pub struct InspectionSession {
    state: SessionState,
    record: Option<InspectionRecord>,
    events: Option<mpsc::Sender<SessionEvent>>,
}

impl InspectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The record so far (partial while collecting).
    pub fn record(&self) -> Option<&InspectionRecord> {
        self.record.as_ref()
    }

    /// `Idle → Collecting`: fix the identifier and timestamp before any
    /// question is asked.
    pub fn begin(
        &mut self,
        inspection_id: impl Into<String>,
        inspected_at: impl Into<String>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted(self.state.label()));
        }
        let record = InspectionRecord::new(inspection_id, inspected_at);
        log::debug!("session: Idle → Collecting (id {})", record.inspection_id());
        self.emit(SessionEvent::Started {
            inspection_id: record.inspection_id().to_string(),
        });
        self.record = Some(record);
        self.state = SessionState::Collecting {
            question_index: 0,
            pending_section: Vec::new(),
        };
        Ok(())
    }

    /// Ask every remaining question until the session is complete.
    ///
    /// Resumes from the current position when called again after an error.
    /// Calling it on a complete session returns the final record.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotStarted`] before [`begin`](Self::begin),
    /// [`SessionError::Schedule`] for an invalid schedule,
    /// [`SessionError::RetriesExhausted`] / [`SessionError::Aborted`] when a
    /// question gets no usable answer.
    pub fn run<P>(
        &mut self,
        schedule: &QuestionSchedule,
        prompter: &mut P,
        policy: &RetryPolicy,
        abort: &AbortHandle,
    ) -> Result<&InspectionRecord, SessionError>
    where
        P: PromptListener + ?Sized,
    {
        schedule.validate()?;

        loop {
            let index = match &self.state {
                SessionState::Idle => return Err(SessionError::NotStarted),
                SessionState::Complete => break,
                SessionState::Collecting { question_index, .. } => *question_index,
            };

            match schedule.step(index) {
                Some(step) => {
                    let answer = self.ask(&step, prompter, policy, abort)?;
                    self.accept(&step, answer);
                }
                None => {
                    log::debug!("session: Collecting → Complete");
                    self.state = SessionState::Complete;
                    self.emit(SessionEvent::Complete);
                }
            }
        }

        self.record.as_ref().ok_or(SessionError::NotStarted)
    }

    /// The final record; `None` unless the session is complete.
    pub fn into_record(self) -> Option<InspectionRecord> {
        match self.state {
            SessionState::Complete => self.record,
            _ => None,
        }
    }

    fn ask<P>(
        &self,
        step: &Step<'_>,
        prompter: &mut P,
        policy: &RetryPolicy,
        abort: &AbortHandle,
    ) -> Result<String, SessionError>
    where
        P: PromptListener + ?Sized,
    {
        let field = step.path.to_string();
        let mut attempts = 0u32;

        loop {
            if abort.is_aborted() {
                log::warn!("session: aborted at {field:?}");
                return Err(SessionError::Aborted { field });
            }

            attempts += 1;
            self.emit(SessionEvent::Listening {
                field: field.clone(),
                prompt: step.prompt.to_string(),
                attempt: attempts,
            });

            let transcript = prompter.prompt_and_listen(step.prompt);
            if let Some(text) = transcript.usable_text() {
                log::debug!("session: {field:?} = {text:?}");
                self.emit(SessionEvent::Heard {
                    field: field.clone(),
                    text: text.to_string(),
                });
                return Ok(text.to_string());
            }

            let reason = transcript.label();
            log::warn!("session: no answer for {field:?} ({reason}, attempt {attempts})");
            if policy.exhausted(attempts) {
                return Err(SessionError::RetriesExhausted { field, attempts });
            }
            self.emit(SessionEvent::Retrying {
                field: field.clone(),
                attempt: attempts,
                reason,
            });
            prompter.say(&policy.apology_for(step.path.field()));
        }
    }

    fn accept(&mut self, step: &Step<'_>, answer: String) {
        let SessionState::Collecting {
            question_index,
            pending_section,
        } = &mut self.state
        else {
            return;
        };
        let Some(record) = self.record.as_mut() else {
            return;
        };

        *question_index += 1;
        match step.path {
            FieldPath::Top(field) => record.set_text(field, answer),
            FieldPath::Nested { section, field } => {
                pending_section.push((field.to_string(), answer));
                if step.closes_section {
                    record.set_section(section, std::mem::take(pending_section));
                    log::debug!("session: section {section:?} complete");
                    if let Some(tx) = &self.events {
                        let _ = tx.send(SessionEvent::SectionComplete {
                            section: section.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            // The observer may have gone away; progress is best-effort.
            let _ = tx.send(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::{Question, Section, INSPECTED_AT, INSPECTION_ID};
    use crate::speech::{ScriptedPrompter, Transcript};

    const AT: &str = "2024-01-01 10:00:00";

    fn truck_answers() -> Vec<&'static str> {
        vec![
            "SN1", "Volvo FH", "Dana", "E-42", "Depot 3", "32psi", "33psi", "Good",
        ]
    }

    fn started() -> InspectionSession {
        let mut session = InspectionSession::new();
        session.begin("1", AT).unwrap();
        session
    }

    fn text(s: &str) -> Transcript {
        Transcript::Text(s.into())
    }

    #[test]
    fn run_before_begin_is_an_error() {
        let mut session = InspectionSession::new();
        let mut p = ScriptedPrompter::answering(truck_answers());
        let err = session
            .run(
                &QuestionSchedule::truck_inspection(),
                &mut p,
                &RetryPolicy::default(),
                &AbortHandle::new(),
            )
            .unwrap_err();
        assert_eq!(err, SessionError::NotStarted);
        assert!(p.prompts.is_empty());
    }

    #[test]
    fn begin_twice_is_an_error() {
        let mut session = started();
        assert_eq!(
            session.begin("2", AT),
            Err(SessionError::AlreadyStarted("Collecting"))
        );
        assert_eq!(session.record().unwrap().inspection_id(), "1");
    }

    #[test]
    fn happy_path_fills_every_field_in_schedule_order() {
        let schedule = QuestionSchedule::truck_inspection();
        let mut session = started();
        let mut p = ScriptedPrompter::answering(truck_answers());

        let record = session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap()
            .clone();

        assert_eq!(
            record.keys(),
            vec![
                INSPECTION_ID,
                INSPECTED_AT,
                "Truck Serial Number",
                "Truck Model",
                "Inspector Name",
                "Inspection Employee ID",
                "Location of Inspection",
                "Tires",
            ]
        );
        assert_eq!(record.text("Inspection Employee ID"), Some("E-42"));
        let tires = record.section("Tires").unwrap();
        assert_eq!(
            tires.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec![
                "Tire Pressure for Left Front",
                "Tire Pressure for Right Front",
                "Tire Condition for Left Front",
            ]
        );
        assert_eq!(tires[2].1, "Good");
        assert!(session.state().is_complete());
        assert!(p.spoken.is_empty());
    }

    #[test]
    fn prompts_are_asked_in_schedule_order() {
        let schedule = QuestionSchedule::truck_inspection();
        let mut session = started();
        let mut p = ScriptedPrompter::answering(truck_answers());
        session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();

        let expected: Vec<&str> = schedule.steps().map(|s| s.prompt).collect();
        assert_eq!(p.prompts, expected);
    }

    #[test]
    fn sentinels_are_retried_and_final_answer_wins() {
        let schedule = QuestionSchedule {
            flat: vec![Question::new("Truck Model", "Please provide the Truck Model.")],
            sections: vec![],
        };
        let mut session = started();
        let mut p = ScriptedPrompter::new([
            Transcript::Unknown,
            Transcript::Error,
            Transcript::Timeout,
            text("   "),
            text("Scania R450"),
        ]);

        let record = session
            .run(&schedule, &mut p, &RetryPolicy::unbounded(), &AbortHandle::new())
            .unwrap();

        assert_eq!(record.text("Truck Model"), Some("Scania R450"));
        assert_eq!(p.prompts.len(), 5);
        assert_eq!(p.spoken.len(), 4);
        assert_eq!(
            p.spoken[0],
            "Sorry, I couldn't get you. Can you please repeat the truck model?"
        );
    }

    #[test]
    fn spoken_word_unknown_is_stored_as_text() {
        let schedule = QuestionSchedule {
            flat: vec![Question::new("Inspector Name", "Please provide your name.")],
            sections: vec![],
        };
        let mut session = started();
        let mut p = ScriptedPrompter::new([text("Unknown")]);
        let record = session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();
        assert_eq!(record.text("Inspector Name"), Some("Unknown"));
    }

    #[test]
    fn apology_uses_sub_field_name_inside_sections() {
        let schedule = QuestionSchedule {
            flat: vec![],
            sections: vec![Section {
                name: "Tires".into(),
                questions: vec![Question::new(
                    "Tire Pressure for Left Front",
                    "Tire Pressure for Left Front:",
                )],
            }],
        };
        let mut session = started();
        let mut p = ScriptedPrompter::new([Transcript::Timeout, text("32psi")]);
        session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();
        assert_eq!(
            p.spoken,
            vec!["Sorry, I couldn't get you. Can you please repeat the tire pressure for left front?"]
        );
    }

    #[test]
    fn retries_are_bounded_by_policy() {
        let schedule = QuestionSchedule::truck_inspection();
        let mut session = started();
        let mut p = ScriptedPrompter::new([text("SN1")]);
        let policy = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };

        let err = session
            .run(&schedule, &mut p, &policy, &AbortHandle::new())
            .unwrap_err();

        assert_eq!(
            err,
            SessionError::RetriesExhausted {
                field: "Truck Model".into(),
                attempts: 3
            }
        );
        // One apology between each pair of attempts.
        assert_eq!(p.spoken.len(), 2);
        assert!(session.state().is_collecting());
        assert!(session.into_record().is_none());
    }

    #[test]
    fn abort_stops_before_the_next_attempt() {
        let schedule = QuestionSchedule::truck_inspection();
        let mut session = started();
        let mut p = ScriptedPrompter::answering(truck_answers());
        let abort = AbortHandle::new();
        abort.abort();

        let err = session
            .run(&schedule, &mut p, &RetryPolicy::unbounded(), &abort)
            .unwrap_err();

        assert_eq!(
            err,
            SessionError::Aborted {
                field: "Truck Serial Number".into()
            }
        );
        assert!(p.prompts.is_empty());
    }

    #[test]
    fn section_is_attached_only_when_complete_and_resume_finishes_it() {
        let schedule = QuestionSchedule::truck_inspection();
        let mut session = started();
        let policy = RetryPolicy {
            max_attempts: Some(1),
            ..RetryPolicy::default()
        };

        // Five flat answers and one tire answer, then silence.
        let mut p = ScriptedPrompter::answering(truck_answers().into_iter().take(6));
        let err = session
            .run(&schedule, &mut p, &policy, &AbortHandle::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::RetriesExhausted { .. }));

        let partial = session.record().unwrap();
        assert!(partial.get("Tires").is_none());
        assert_eq!(partial.text("Location of Inspection"), Some("Depot 3"));
        assert_eq!(
            session.state(),
            &SessionState::Collecting {
                question_index: 6,
                pending_section: vec![("Tire Pressure for Left Front".into(), "32psi".into())],
            }
        );

        let mut rest = ScriptedPrompter::answering(["33psi", "Needs Replacement"]);
        let record = session
            .run(&schedule, &mut rest, &policy, &AbortHandle::new())
            .unwrap();
        let tires = record.section("Tires").unwrap();
        assert_eq!(tires.len(), 3);
        assert_eq!(tires[0].1, "32psi");
        assert_eq!(tires[2].1, "Needs Replacement");
        assert_eq!(rest.prompts.len(), 2);
    }

    fn tires_and_brakes() -> QuestionSchedule {
        QuestionSchedule {
            flat: vec![Question::new("Odometer", "Odometer reading?")],
            sections: vec![
                Section {
                    name: "Tires".into(),
                    questions: vec![
                        Question::new("Left Front", "Left front tire?"),
                        Question::new("Right Front", "Right front tire?"),
                    ],
                },
                Section {
                    name: "Brakes".into(),
                    questions: vec![
                        Question::new("Pad Wear", "Brake pad wear?"),
                        Question::new("Fluid Level", "Brake fluid level?"),
                    ],
                },
            ],
        }
    }

    #[test]
    fn sections_attach_in_schedule_order_with_retry_in_second() {
        let schedule = tires_and_brakes();
        let mut session = started();
        let mut p = ScriptedPrompter::new([
            text("120000 km"),
            text("32psi"),
            text("33psi"),
            Transcript::Unknown,
            text("low"),
            text("full"),
        ]);

        let record = session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();

        assert_eq!(
            record.keys(),
            vec![INSPECTION_ID, INSPECTED_AT, "Odometer", "Tires", "Brakes"]
        );
        assert_eq!(
            record.section("Tires").unwrap(),
            &[
                ("Left Front".to_string(), "32psi".to_string()),
                ("Right Front".to_string(), "33psi".to_string()),
            ][..]
        );
        assert_eq!(
            record.section("Brakes").unwrap(),
            &[
                ("Pad Wear".to_string(), "low".to_string()),
                ("Fluid Level".to_string(), "full".to_string()),
            ][..]
        );
        assert_eq!(
            p.prompts,
            vec![
                "Odometer reading?",
                "Left front tire?",
                "Right front tire?",
                "Brake pad wear?",
                "Brake pad wear?",
                "Brake fluid level?",
            ]
        );
        assert_eq!(
            p.spoken,
            vec!["Sorry, I couldn't get you. Can you please repeat the pad wear?"]
        );
    }

    #[test]
    fn second_section_starts_with_an_empty_pending_list() {
        let schedule = tires_and_brakes();
        let mut session = started();
        let policy = RetryPolicy {
            max_attempts: Some(1),
            ..RetryPolicy::default()
        };

        // Everything up to the first brake answer, then silence.
        let mut p = ScriptedPrompter::answering(["120000 km", "32psi", "33psi", "low"]);
        let err = session
            .run(&schedule, &mut p, &policy, &AbortHandle::new())
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::RetriesExhausted {
                field: "Brakes.Fluid Level".into(),
                attempts: 1
            }
        );

        assert_eq!(
            session.state(),
            &SessionState::Collecting {
                question_index: 4,
                pending_section: vec![("Pad Wear".into(), "low".into())],
            }
        );
        let partial = session.record().unwrap();
        assert_eq!(partial.section("Tires").map(<[_]>::len), Some(2));
        assert!(partial.get("Brakes").is_none());

        let mut rest = ScriptedPrompter::answering(["full"]);
        let record = session
            .run(&schedule, &mut rest, &policy, &AbortHandle::new())
            .unwrap();
        assert_eq!(record.section("Brakes").map(<[_]>::len), Some(2));
        assert_eq!(rest.prompts, vec!["Brake fluid level?"]);
    }

    #[test]
    fn complete_session_is_immutable() {
        let schedule = QuestionSchedule::truck_inspection();
        let mut session = started();
        let mut p = ScriptedPrompter::answering(truck_answers());
        session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();

        let mut again = ScriptedPrompter::answering(["other"]);
        let record = session
            .run(&schedule, &mut again, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();
        assert!(again.prompts.is_empty());
        assert_eq!(record.text("Truck Serial Number"), Some("SN1"));
        assert!(session.begin("9", AT).is_err());
    }

    #[test]
    fn invalid_schedule_is_rejected_before_asking() {
        let schedule = QuestionSchedule {
            flat: vec![Question::new("A.B", "?")],
            sections: vec![],
        };
        let mut session = started();
        let mut p = ScriptedPrompter::answering(["x"]);
        let err = session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::Schedule(ScheduleError::DottedField(_))));
        assert!(p.prompts.is_empty());
    }

    #[test]
    fn events_report_progress() {
        let schedule = QuestionSchedule {
            flat: vec![Question::new("Truck Model", "Model?")],
            sections: vec![Section {
                name: "Tires".into(),
                questions: vec![Question::new("Condition", "Condition?")],
            }],
        };
        let (tx, rx) = mpsc::channel();
        let mut session = InspectionSession::new().with_events(tx);
        session.begin("5", AT).unwrap();
        let mut p = ScriptedPrompter::new([Transcript::Unknown, text("Volvo"), text("Good")]);
        session
            .run(&schedule, &mut p, &RetryPolicy::default(), &AbortHandle::new())
            .unwrap();
        drop(session);

        let events: Vec<SessionEvent> = rx.iter().collect();
        assert_eq!(
            events.first(),
            Some(&SessionEvent::Started {
                inspection_id: "5".into()
            })
        );
        assert!(events.contains(&SessionEvent::Retrying {
            field: "Truck Model".into(),
            attempt: 1,
            reason: "Unknown",
        }));
        assert!(events.contains(&SessionEvent::Heard {
            field: "Tires.Condition".into(),
            text: "Good".into(),
        }));
        assert!(events.contains(&SessionEvent::SectionComplete {
            section: "Tires".into()
        }));
        assert_eq!(events.last(), Some(&SessionEvent::Complete));
    }

    #[test]
    fn policy_from_config() {
        let unbounded = RetryPolicy::from_config(&SessionConfig {
            max_attempts: 0,
            ..SessionConfig::default()
        });
        assert_eq!(unbounded.max_attempts, None);
        assert_eq!(RetryPolicy::default().max_attempts, Some(5));
    }

    #[tokio::test]
    async fn first_interrupt_aborts_and_second_requests_exit() {
        let abort = AbortHandle::new();
        let calls = std::cell::Cell::new(0);
        let exit = watch_interrupts(&abort, || {
            calls.set(calls.get() + 1);
            std::future::ready(Ok(()))
        })
        .await;

        assert!(exit);
        assert!(abort.is_aborted());
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn failed_signal_source_never_requests_exit() {
        let abort = AbortHandle::new();
        let broken = || std::future::ready(Err(io::Error::new(io::ErrorKind::Other, "no signals")));
        assert!(!watch_interrupts(&abort, broken).await);
        assert!(!abort.is_aborted());

        let calls = std::cell::Cell::new(0);
        let exit = watch_interrupts(&abort, || {
            calls.set(calls.get() + 1);
            std::future::ready(if calls.get() == 1 {
                Ok(())
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "gone"))
            })
        })
        .await;
        assert!(!exit);
        assert!(abort.is_aborted());
    }

    #[test]
    fn abort_handle_is_shared_between_clones() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        clone.abort();
        assert!(handle.is_aborted());
        handle.reset();
        assert!(!clone.is_aborted());
    }
}
