use serde::Serialize;

use super::domain::{Application, JobPosting, Role, UserId};

/// The request-scoped identity a session credential resolves to.
///
/// Admin is a disjoint credential space (a configured token), not a user
/// role, and bypasses ownership scoping for its restricted capability set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Student(UserId),
    Recruiter(UserId),
    Admin,
}

impl Caller {
    pub const fn role(&self) -> Option<Role> {
        match self {
            Caller::Student(_) => Some(Role::Student),
            Caller::Recruiter(_) => Some(Role::Recruiter),
            Caller::Anonymous | Caller::Admin => None,
        }
    }
}

/// Turns an opaque bearer token into a verified [`Caller`]. Transport and
/// credential storage are the implementor's concern.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Caller>;
}

/// Ownership scope applied to every application listing before filters.
///
/// Collapsing the per-role query branching into this one policy guarantees no
/// listing path forgets to scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ApplicationScope {
    All,
    ByStudent(UserId),
    ByRecruiter(UserId),
}

impl ApplicationScope {
    /// The single scoping policy. Anonymous callers get no scope at all.
    pub fn for_caller(caller: &Caller) -> Option<Self> {
        match caller {
            Caller::Anonymous => None,
            Caller::Student(id) => Some(Self::ByStudent(id.clone())),
            Caller::Recruiter(id) => Some(Self::ByRecruiter(id.clone())),
            Caller::Admin => Some(Self::All),
        }
    }

    pub fn permits(&self, application: &Application) -> bool {
        match self {
            Self::All => true,
            Self::ByStudent(id) => application.student == *id,
            Self::ByRecruiter(id) => application.recruiter == *id,
        }
    }
}

/// Visibility scope for job listings. Browsing is open to everyone but only
/// surfaces active postings; owners additionally see their deactivated ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobScope {
    PublicActive,
    ByOwner(UserId),
    All,
}

impl JobScope {
    pub fn permits(&self, job: &JobPosting) -> bool {
        match self {
            Self::PublicActive => job.active,
            Self::ByOwner(id) => job.recruiter == *id,
            Self::All => true,
        }
    }
}
