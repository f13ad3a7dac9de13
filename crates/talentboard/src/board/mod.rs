//! Job-board domain: postings, applications, lifecycle rules, and fan-out.
//!
//! The lifecycle engine is the sole mutator of application status and of the
//! derived per-job counters. Stores and the notification transport sit behind
//! traits so the engine can be exercised in isolation.

pub mod auth;
pub mod domain;
pub mod events;
pub mod notify;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use auth::{ApplicationScope, Caller, JobScope, SessionResolver};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ExperienceLevel, Interview, InterviewKind,
    JobCounters, JobDraft, JobField, JobId, JobPosting, JobType, Profile, RecruiterProfile, Role,
    SalaryRange, StudentProfile, UserId, UserRecord, MAX_COVER_LETTER_CHARS,
};
pub use events::{BoardEvent, ChannelKey, EventPublisher, PublishError};
pub use notify::NotificationHub;
pub use repository::{
    ApplicationFilters, ApplicationRepository, IdentityRepository, JobFilters, JobRepository,
    Page, RepositoryError,
};
pub use router::{board_router, BoardState};
pub use service::{LifecycleError, LifecycleService, ReviewCommand, ReviewDecision};
