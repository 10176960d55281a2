//! Inspection application: the two operator actions.
//!
//! # Architecture
//!
//! [`InspectionApp`] owns the store and the session-scoped state the shell
//! needs between actions:
//!
//! * `pending`: a session interrupted by exhausted retries or an abort,
//!   resumable with [`InspectionApp::resume_collection`].
//! * `current`: the last completed record, consumed by [`InspectionApp::save`].
//!
//! | Action | Effect |
//! |--------|--------|
//! | start collection | mint id, run a fresh session, keep the record |
//! | save | upsert-merge the record, render the PDF report |

use std::sync::mpsc;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::config::{AppConfig, ReportConfig};
use crate::inspection::{format_timestamp, InspectionRecord, QuestionSchedule, ScheduleError};
use crate::report::{render_pdf, ReportError, REPORT_MIME};
use crate::session::{
    AbortHandle, InspectionSession, RetryPolicy, SessionError, SessionEvent,
};
use crate::speech::PromptListener;
use crate::store::{self, InspectionStore, SaveOutcome, StoreError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No inspection data to save.")]
    NoRecord,

    #[error("no interrupted collection to resume")]
    NothingToResume,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("report failed: {0}")]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// SaveReceipt
// ---------------------------------------------------------------------------

/// Result of a successful save: what happened in storage plus the report.
#[derive(Debug, Clone)]
pub struct SaveReceipt {
    pub inspection_id: String,
    pub outcome: SaveOutcome,
    /// PDF bytes.
    pub report: Vec<u8>,
    pub file_name: String,
    pub mime: &'static str,
}

// ---------------------------------------------------------------------------
// InspectionApp
// ---------------------------------------------------------------------------

pub struct InspectionApp<S: InspectionStore> {
    store: S,
    schedule: QuestionSchedule,
    policy: RetryPolicy,
    report: ReportConfig,
    events: Option<mpsc::Sender<SessionEvent>>,
    pending: Option<InspectionSession>,
    current: Option<InspectionRecord>,
}

impl<S: InspectionStore> InspectionApp<S> {
    /// Build from configuration.  The question schedule is validated here.
    pub fn new(store: S, config: &AppConfig) -> Result<Self, AppError> {
        let schedule = config.schedule();
        schedule.validate()?;
        Ok(Self {
            store,
            schedule,
            policy: RetryPolicy::from_config(&config.session),
            report: config.report.clone(),
            events: None,
            pending: None,
            current: None,
        })
    }

    /// Forward session progress to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn schedule(&self) -> &QuestionSchedule {
        &self.schedule
    }

    /// The last completed record.
    pub fn current_record(&self) -> Option<&InspectionRecord> {
        self.current.as_ref()
    }

    /// Partial record of an interrupted collection.
    pub fn pending_record(&self) -> Option<&InspectionRecord> {
        self.pending.as_ref().and_then(InspectionSession::record)
    }

    /// "Start collection", timestamped now.
    pub fn start_collection<P>(
        &mut self,
        prompter: &mut P,
        abort: &AbortHandle,
    ) -> Result<&InspectionRecord, AppError>
    where
        P: PromptListener + ?Sized,
    {
        self.start_collection_at(prompter, abort, Local::now().naive_local())
    }

    /// "Start collection" with an explicit start time.
    ///
    /// Discards any previous record and any interrupted session.  On error the
    /// new session is kept for [`resume_collection`](Self::resume_collection).
    pub fn start_collection_at<P>(
        &mut self,
        prompter: &mut P,
        abort: &AbortHandle,
        at: NaiveDateTime,
    ) -> Result<&InspectionRecord, AppError>
    where
        P: PromptListener + ?Sized,
    {
        self.current = None;
        self.pending = None;

        let id = self.store.next_inspection_id()?.to_string();
        log::info!("app: starting inspection {id}");

        let mut session = InspectionSession::new();
        if let Some(tx) = &self.events {
            session = session.with_events(tx.clone());
        }
        session.begin(id, format_timestamp(at))?;
        self.drive(session, prompter, abort)
    }

    /// Continue an interrupted collection where it stopped.
    pub fn resume_collection<P>(
        &mut self,
        prompter: &mut P,
        abort: &AbortHandle,
    ) -> Result<&InspectionRecord, AppError>
    where
        P: PromptListener + ?Sized,
    {
        let session = self.pending.take().ok_or(AppError::NothingToResume)?;
        self.drive(session, prompter, abort)
    }

    fn drive<P>(
        &mut self,
        mut session: InspectionSession,
        prompter: &mut P,
        abort: &AbortHandle,
    ) -> Result<&InspectionRecord, AppError>
    where
        P: PromptListener + ?Sized,
    {
        let outcome = session
            .run(&self.schedule, prompter, &self.policy, abort)
            .map(|_| ());
        if let Err(e) = outcome {
            log::warn!("app: collection interrupted: {e}");
            self.pending = Some(session);
            return Err(e.into());
        }

        let record = session.into_record().ok_or(SessionError::NotStarted)?;
        log::info!("app: inspection {} complete", record.inspection_id());
        Ok(self.current.insert(record))
    }

    /// "Save": upsert-merge the current record, then render its report.
    ///
    /// # Errors
    ///
    /// [`AppError::NoRecord`] when nothing has been collected;
    /// [`AppError::Store`] when persistence fails (no report is produced);
    /// [`AppError::Report`] when rendering fails.
    pub fn save(&self) -> Result<SaveReceipt, AppError> {
        let record = self.current.as_ref().ok_or(AppError::NoRecord)?;
        let outcome = store::save(&self.store, record)?;
        let report = render_pdf(record, &self.report)?;

        Ok(SaveReceipt {
            inspection_id: record.inspection_id().to_string(),
            outcome,
            report,
            file_name: self.report.file_name.clone(),
            mime: REPORT_MIME,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
