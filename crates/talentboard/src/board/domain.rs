use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// The two user roles. Admin is a disjoint credential, not a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Recruiter,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Recruiter => "recruiter",
        }
    }
}

/// A registered identity. Records are deactivated by admins, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub credential_hash: String,
    pub active: bool,
    pub profile: Profile,
}

impl UserRecord {
    /// Name shown to the counterpart in notifications.
    pub fn display_name(&self) -> &str {
        match &self.profile {
            Profile::Student(profile) => &profile.display_name,
            Profile::Recruiter(profile) => &profile.company_name,
        }
    }
}

/// Role-specific profile attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Student(StudentProfile),
    Recruiter(RecruiterProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub display_name: String,
    pub field_of_study: String,
    pub graduation_year: Option<u16>,
    /// Blob-store reference to the uploaded resume, if any.
    pub resume: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruiterProfile {
    pub company_name: String,
    pub description: Option<String>,
    /// Blob-store reference to the company logo, if any.
    pub logo: Option<String>,
}

/// Professional field a posting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobField {
    Engineering,
    Design,
    Marketing,
    Sales,
    Finance,
    Operations,
    Other,
}

impl JobField {
    pub const fn label(self) -> &'static str {
        match self {
            JobField::Engineering => "engineering",
            JobField::Design => "design",
            JobField::Marketing => "marketing",
            JobField::Sales => "sales",
            JobField::Finance => "finance",
            JobField::Operations => "operations",
            JobField::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
    Contract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

/// Advertised salary band. `min <= max` is validated at posting time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
    pub currency: String,
}

/// Derived per-job tallies. Always recomputable from the application set;
/// withdrawn applications are excluded from `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub total: u32,
    pub accepted: u32,
    pub rejected: u32,
}

impl JobCounters {
    /// Pure projection over the current application statuses of one job.
    pub fn project(statuses: impl IntoIterator<Item = ApplicationStatus>) -> Self {
        let mut counters = Self::default();
        for status in statuses {
            match status {
                ApplicationStatus::Pending => counters.total += 1,
                ApplicationStatus::Accepted => {
                    counters.total += 1;
                    counters.accepted += 1;
                }
                ApplicationStatus::Rejected => {
                    counters.total += 1;
                    counters.rejected += 1;
                }
                ApplicationStatus::Withdrawn => {}
            }
        }
        counters
    }
}

/// A recruiter-owned listing students may apply to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub recruiter: UserId,
    /// Copied from the recruiter profile at posting time for cheap listings.
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub field: JobField,
    pub job_type: JobType,
    pub experience: ExperienceLevel,
    pub salary: SalaryRange,
    pub skills: Vec<String>,
    pub benefits: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub active: bool,
    pub counters: JobCounters,
    pub views: u64,
}

/// Recruiter-supplied fields of a posting, used for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub field: JobField,
    pub job_type: JobType,
    pub experience: ExperienceLevel,
    pub salary: SalaryRange,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub deadline: DateTime<Utc>,
}

/// High level status tracked throughout an application's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Pending is the only state with outgoing transitions.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewKind {
    OnSite,
    Remote,
    Phone,
}

/// Interview details a recruiter attaches while reviewing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub at: DateTime<Utc>,
    pub location: String,
    pub kind: InterviewKind,
}

/// Upper bound on cover letter length, in characters.
pub const MAX_COVER_LETTER_CHARS: usize = 4000;

/// The entity linking one student to one job. At most one exists per
/// (job, student) pair; withdrawn is a terminal status, not a deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub student: UserId,
    /// Copied from the owning job at creation and never re-derived.
    pub recruiter: UserId,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    /// Resume reference snapshotted at apply time, decoupled from later
    /// profile changes.
    pub resume: String,
    pub notes: Option<String>,
    pub interview: Option<Interview>,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
