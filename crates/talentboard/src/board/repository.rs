use serde::{Deserialize, Serialize};

use super::auth::{ApplicationScope, JobScope};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, ExperienceLevel, JobField, JobId, JobPosting,
    JobType, UserId, UserRecord,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One page of a scoped listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl<T> Page<T> {
    /// Slice an already-filtered collection into the requested page.
    pub fn slice(mut items: Vec<T>, page: usize, per_page: usize) -> Self {
        let total = items.len();
        let page = page.max(1);
        let per_page = per_page.max(1);
        let start = (page - 1).saturating_mul(per_page);
        let items = if start >= total {
            Vec::new()
        } else {
            items.drain(start..).take(per_page).collect()
        };
        Self {
            items,
            total,
            page,
            per_page,
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

/// Listing filters for job postings. Scope is applied separately and first.
#[derive(Debug, Clone, Deserialize)]
pub struct JobFilters {
    pub field: Option<JobField>,
    pub job_type: Option<JobType>,
    pub experience: Option<ExperienceLevel>,
    pub keyword: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for JobFilters {
    fn default() -> Self {
        Self {
            field: None,
            job_type: None,
            experience: None,
            keyword: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl JobFilters {
    pub fn matches(&self, job: &JobPosting) -> bool {
        if self.field.is_some_and(|field| field != job.field) {
            return false;
        }
        if self.job_type.is_some_and(|job_type| job_type != job.job_type) {
            return false;
        }
        if self
            .experience
            .is_some_and(|experience| experience != job.experience)
        {
            return false;
        }
        if let Some(keyword) = &self.keyword {
            let needle = keyword.to_lowercase();
            let haystack = format!("{} {} {}", job.title, job.company_name, job.description);
            if !haystack.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Listing filters for applications. Scope is applied separately and first.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationFilters {
    pub status: Option<ApplicationStatus>,
    pub job: Option<JobId>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for ApplicationFilters {
    fn default() -> Self {
        Self {
            status: None,
            job: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl ApplicationFilters {
    pub fn matches(&self, application: &Application) -> bool {
        if self.status.is_some_and(|status| status != application.status) {
            return false;
        }
        if let Some(job) = &self.job {
            if *job != application.job {
                return false;
            }
        }
        true
    }
}

/// Identity store abstraction. Read side feeds the lifecycle preconditions
/// (resume on file, owning recruiter's company name); writes are limited to
/// profile updates and the admin activation toggle.
pub trait IdentityRepository: Send + Sync {
    fn insert(&self, user: UserRecord) -> Result<UserRecord, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
    fn update(&self, user: UserRecord) -> Result<(), RepositoryError>;
}

/// Job store abstraction.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    fn update(&self, job: JobPosting) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    fn delete(&self, id: &JobId) -> Result<(), RepositoryError>;
    fn list(&self, scope: &JobScope, filters: &JobFilters)
        -> Result<Page<JobPosting>, RepositoryError>;
    /// Best-effort view tally. Callers treat failures as losable.
    fn record_view(&self, id: &JobId) -> Result<(), RepositoryError>;
}

/// Application store abstraction.
///
/// `insert` owns the (job, student) uniqueness constraint: of two concurrent
/// inserts for the same pair exactly one may succeed, the other must observe
/// `RepositoryError::Conflict`. A prior existence check alone leaves a
/// check-then-act window open.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find(
        &self,
        job: &JobId,
        student: &UserId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn list(
        &self,
        scope: &ApplicationScope,
        filters: &ApplicationFilters,
    ) -> Result<Page<Application>, RepositoryError>;
    /// Every application referencing one job, for counter recompute.
    fn for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError>;
}
