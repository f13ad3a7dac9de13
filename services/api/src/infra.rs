use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use talentboard::board::{
    Application, ApplicationFilters, ApplicationId, ApplicationRepository, ApplicationScope,
    Caller, IdentityRepository, JobFilters, JobId, JobPosting, JobRepository, JobScope, Page,
    Profile, RecruiterProfile, RepositoryError, Role, SessionResolver, StudentProfile, UserId,
    UserRecord,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryIdentityRepository {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl IdentityRepository for InMemoryIdentityRepository {
    fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.users.lock().expect("identity store poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.users.lock().expect("identity store poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: UserRecord) -> Result<(), RepositoryError> {
        let mut guard = self.users.lock().expect("identity store poisoned");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryJobRepository {
    jobs: Mutex<HashMap<JobId, JobPosting>>,
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store poisoned");
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update(&self, job: JobPosting) -> Result<(), RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store poisoned");
        if !guard.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        let guard = self.jobs.lock().expect("job store poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(
        &self,
        scope: &JobScope,
        filters: &JobFilters,
    ) -> Result<Page<JobPosting>, RepositoryError> {
        let guard = self.jobs.lock().expect("job store poisoned");
        let mut items: Vec<_> = guard
            .values()
            .filter(|job| scope.permits(job) && filters.matches(job))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Page::slice(items, filters.page, filters.per_page))
    }

    fn record_view(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store poisoned");
        let job = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.views += 1;
        Ok(())
    }
}

/// Application store with a (job, student) uniqueness index maintained under
/// the same lock as the records, standing in for a database unique constraint.
#[derive(Default)]
pub(crate) struct InMemoryApplicationRepository {
    inner: Mutex<ApplicationTable>,
}

#[derive(Default)]
struct ApplicationTable {
    records: HashMap<ApplicationId, Application>,
    pair_index: HashSet<(JobId, UserId)>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.inner.lock().expect("application store poisoned");
        let pair = (application.job.clone(), application.student.clone());
        if guard.pair_index.contains(&pair) || guard.records.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.pair_index.insert(pair);
        guard
            .records
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.inner.lock().expect("application store poisoned");
        if !guard.records.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.records.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.inner.lock().expect("application store poisoned");
        Ok(guard.records.get(id).cloned())
    }

    fn find(
        &self,
        job: &JobId,
        student: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.inner.lock().expect("application store poisoned");
        if !guard.pair_index.contains(&(job.clone(), student.clone())) {
            return Ok(None);
        }
        Ok(guard
            .records
            .values()
            .find(|application| application.job == *job && application.student == *student)
            .cloned())
    }

    fn list(
        &self,
        scope: &ApplicationScope,
        filters: &ApplicationFilters,
    ) -> Result<Page<Application>, RepositoryError> {
        let guard = self.inner.lock().expect("application store poisoned");
        let mut items: Vec<_> = guard
            .records
            .values()
            .filter(|application| scope.permits(application) && filters.matches(application))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Page::slice(items, filters.page, filters.per_page))
    }

    fn for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.inner.lock().expect("application store poisoned");
        Ok(guard
            .records
            .values()
            .filter(|application| application.job == *job)
            .cloned()
            .collect())
    }
}

/// Bearer-token session table. The admin credential comes from configuration
/// and never appears in the table itself.
pub(crate) struct TokenSessions {
    admin_token: Option<String>,
    tokens: Mutex<HashMap<String, Caller>>,
}

impl TokenSessions {
    pub(crate) fn new(admin_token: Option<String>) -> Self {
        Self {
            admin_token,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn issue(&self, token: &str, caller: Caller) {
        self.tokens
            .lock()
            .expect("session table poisoned")
            .insert(token.to_string(), caller);
    }
}

impl SessionResolver for TokenSessions {
    fn resolve(&self, token: &str) -> Option<Caller> {
        if self.admin_token.as_deref() == Some(token) {
            return Some(Caller::Admin);
        }
        self.tokens
            .lock()
            .expect("session table poisoned")
            .get(token)
            .cloned()
    }
}

pub(crate) fn student_record(id: &str, name: &str, resume: Option<&str>) -> UserRecord {
    UserRecord {
        id: UserId(id.to_string()),
        role: Role::Student,
        email: format!("{id}@campus.example"),
        credential_hash: "argon2-opaque".to_string(),
        active: true,
        profile: Profile::Student(StudentProfile {
            display_name: name.to_string(),
            field_of_study: "Computer Science".to_string(),
            graduation_year: Some(2026),
            resume: resume.map(str::to_string),
        }),
    }
}

pub(crate) fn recruiter_record(id: &str, company: &str) -> UserRecord {
    UserRecord {
        id: UserId(id.to_string()),
        role: Role::Recruiter,
        email: format!("talent@{}.example", company.to_lowercase().replace(' ', "-")),
        credential_hash: "argon2-opaque".to_string(),
        active: true,
        profile: Profile::Recruiter(RecruiterProfile {
            company_name: company.to_string(),
            description: Some("Hiring across the stack".to_string()),
            logo: None,
        }),
    }
}

/// Seed a handful of identities and their sessions so a fresh serve can be
/// exercised without a registration flow.
pub(crate) fn seed_demo_data(
    identities: &InMemoryIdentityRepository,
    sessions: &TokenSessions,
) -> Result<(), RepositoryError> {
    let seeds = [
        (
            student_record("s-avery", "Avery Chen", Some("blob://resumes/avery.pdf")),
            "tok-student-avery",
        ),
        (student_record("s-jordan", "Jordan Ruiz", None), "tok-student-jordan"),
        (
            recruiter_record("r-nimbus", "Nimbus Analytics"),
            "tok-recruiter-nimbus",
        ),
    ];

    for (record, token) in seeds {
        let caller = match record.role {
            Role::Student => Caller::Student(record.id.clone()),
            Role::Recruiter => Caller::Recruiter(record.id.clone()),
        };
        identities.insert(record)?;
        sessions.issue(token, caller);
        info!(%token, "demo session issued");
    }
    Ok(())
}
