use std::fmt;

use serde::Serialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Interview, JobField, JobId, Role, UserId,
};

/// Addressable stream a connected client may join.
///
/// Identity channels render as `{role}-{id}`; the informational jobs feed is
/// keyed by professional field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Identity { role: Role, id: UserId },
    JobsFeed(JobField),
}

impl ChannelKey {
    pub fn student(id: UserId) -> Self {
        Self::Identity {
            role: Role::Student,
            id,
        }
    }

    pub fn recruiter(id: UserId) -> Self {
        Self::Identity {
            role: Role::Recruiter,
            id,
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKey::Identity { role, id } => write!(f, "{}-{}", role.label(), id.0),
            ChannelKey::JobsFeed(field) => write!(f, "jobs-{}", field.label()),
        }
    }
}

/// Domain event produced by a committed lifecycle mutation.
///
/// Events are cache-invalidation hints, not a source of truth: a disconnected
/// recipient simply misses them and reconstructs state via a pull query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BoardEvent {
    NewApplication {
        application: Application,
        job_title: String,
        student_name: String,
    },
    ApplicationUpdated {
        application_id: ApplicationId,
        student: UserId,
        status: ApplicationStatus,
        notes: Option<String>,
        interview: Option<Interview>,
    },
    ApplicationWithdrawn {
        application_id: ApplicationId,
        recruiter: UserId,
        student_name: String,
    },
    JobUpdated {
        job_id: JobId,
        field: JobField,
        title: String,
    },
}

impl BoardEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            BoardEvent::NewApplication { .. } => "new-application",
            BoardEvent::ApplicationUpdated { .. } => "application-updated",
            BoardEvent::ApplicationWithdrawn { .. } => "application-withdrawn",
            BoardEvent::JobUpdated { .. } => "job-updated",
        }
    }

    /// The single channel this event is addressed to.
    pub fn channel(&self) -> ChannelKey {
        match self {
            BoardEvent::NewApplication { application, .. } => {
                ChannelKey::recruiter(application.recruiter.clone())
            }
            BoardEvent::ApplicationUpdated { student, .. } => ChannelKey::student(student.clone()),
            BoardEvent::ApplicationWithdrawn { recruiter, .. } => {
                ChannelKey::recruiter(recruiter.clone())
            }
            BoardEvent::JobUpdated { field, .. } => ChannelKey::JobsFeed(*field),
        }
    }
}

/// Outbound notification port. The lifecycle engine hands committed events to
/// an implementor and stays ignorant of channel mechanics.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: BoardEvent) -> Result<(), PublishError>;
}

/// Notification dispatch error. Publish failures never fail the mutation that
/// produced the event.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
