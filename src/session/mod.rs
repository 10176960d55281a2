//! Inspection session: the prompt / listen / validate / retry loop.
//!
//! # Architecture
//!
//! ```text
//! caller ──begin(id, timestamp)──▶ InspectionSession (Idle → Collecting)
//!        ──run(schedule, prompter, policy, abort)──┐
//!                                                  ▼
//!                     for each Step: PromptListener::prompt_and_listen
//!                                    ├─ answer   → record / pending section
//!                                    └─ sentinel → apology, retry (bounded)
//!        ◀──────────── &InspectionRecord (Complete) ┘
//!
//! SessionEvent (mpsc) ───▶ optional observer (transcript side channel)
//! ```

pub mod runner;
pub mod state;

pub use runner::{watch_interrupts, AbortHandle, InspectionSession, RetryPolicy, SessionError};
pub use state::{SessionEvent, SessionState};
