use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::board::auth::{ApplicationScope, Caller, JobScope, SessionResolver};
use crate::board::domain::{
    Application, ApplicationId, ExperienceLevel, JobDraft, JobField, JobId, JobPosting, JobType,
    Profile, RecruiterProfile, Role, SalaryRange, StudentProfile, UserId, UserRecord,
};
use crate::board::events::{BoardEvent, EventPublisher, PublishError};
use crate::board::repository::{
    ApplicationFilters, ApplicationRepository, IdentityRepository, JobFilters, JobRepository,
    Page, RepositoryError,
};
use crate::board::router::{board_router, BoardState};
use crate::board::service::LifecycleService;

/// Fixed baseline instant for lifecycle scenarios: 2025-09-`day` at `hour`:00.
pub(super) fn instant(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn student_record(id: &str, name: &str, resume: Option<&str>) -> UserRecord {
    UserRecord {
        id: user(id),
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

pub(super) fn recruiter_record(id: &str, company: &str) -> UserRecord {
    UserRecord {
        id: user(id),
        role: Role::Recruiter,
        email: format!("{id}@{}.example", company.to_lowercase().replace(' ', "-")),
        credential_hash: "argon2-opaque".to_string(),
        active: true,
        profile: Profile::Recruiter(RecruiterProfile {
            company_name: company.to_string(),
            description: Some("Hiring across the stack".to_string()),
            logo: None,
        }),
    }
}

pub(super) fn draft(deadline: DateTime<Utc>) -> JobDraft {
    JobDraft {
        title: "Backend Engineer Intern".to_string(),
        description: "Build services in Rust".to_string(),
        requirements: "Comfort with async runtimes".to_string(),
        field: JobField::Engineering,
        job_type: JobType::Internship,
        experience: ExperienceLevel::Entry,
        salary: SalaryRange {
            min: 3200,
            max: 4100,
            currency: "USD".to_string(),
        },
        skills: vec!["rust".to_string(), "sql".to_string()],
        benefits: vec!["housing stipend".to_string()],
        deadline,
    }
}

#[derive(Default)]
pub(super) struct MemoryIdentities {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl IdentityRepository for MemoryIdentities {
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
pub(super) struct MemoryJobs {
    jobs: Mutex<HashMap<JobId, JobPosting>>,
}

impl JobRepository for MemoryJobs {
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

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("application store poisoned");
        let duplicate_pair = guard.values().any(|existing| {
            existing.job == application.job && existing.student == application.student
        });
        if duplicate_pair || guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("application store poisoned");
        if !guard.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find(
        &self,
        job: &JobId,
        student: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        Ok(guard
            .values()
            .find(|application| application.job == *job && application.student == *student)
            .cloned())
    }

    fn list(
        &self,
        scope: &ApplicationScope,
        filters: &ApplicationFilters,
    ) -> Result<Page<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        let mut items: Vec<_> = guard
            .values()
            .filter(|application| scope.permits(application) && filters.matches(application))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Page::slice(items, filters.page, filters.per_page))
    }

    fn for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        Ok(guard
            .values()
            .filter(|application| application.job == *job)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryPublisher {
    events: Mutex<Vec<BoardEvent>>,
}

impl MemoryPublisher {
    pub(super) fn events(&self) -> Vec<BoardEvent> {
        self.events.lock().expect("event log poisoned").clone()
    }
}

impl EventPublisher for MemoryPublisher {
    fn publish(&self, event: BoardEvent) -> Result<(), PublishError> {
        self.events.lock().expect("event log poisoned").push(event);
        Ok(())
    }
}

pub(super) struct MemorySessions {
    tokens: HashMap<String, Caller>,
}

impl MemorySessions {
    pub(super) fn with(tokens: &[(&str, Caller)]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|(token, caller)| (token.to_string(), caller.clone()))
                .collect(),
        }
    }
}

impl SessionResolver for MemorySessions {
    fn resolve(&self, token: &str) -> Option<Caller> {
        self.tokens.get(token).cloned()
    }
}

pub(super) struct Board {
    pub(super) service:
        Arc<LifecycleService<MemoryIdentities, MemoryJobs, MemoryApplications, MemoryPublisher>>,
    pub(super) identities: Arc<MemoryIdentities>,
    pub(super) jobs: Arc<MemoryJobs>,
    pub(super) applications: Arc<MemoryApplications>,
    pub(super) events: Arc<MemoryPublisher>,
}

pub(super) fn board() -> Board {
    let identities = Arc::new(MemoryIdentities::default());
    let jobs = Arc::new(MemoryJobs::default());
    let applications = Arc::new(MemoryApplications::default());
    let events = Arc::new(MemoryPublisher::default());
    let service = Arc::new(LifecycleService::new(
        identities.clone(),
        jobs.clone(),
        applications.clone(),
        events.clone(),
    ));
    Board {
        service,
        identities,
        jobs,
        applications,
        events,
    }
}

pub(super) fn seed_student(board: &Board, id: &str, name: &str, resume: Option<&str>) {
    board
        .identities
        .insert(student_record(id, name, resume))
        .expect("student seeds");
}

pub(super) fn seed_recruiter(board: &Board, id: &str, company: &str) {
    board
        .identities
        .insert(recruiter_record(id, company))
        .expect("recruiter seeds");
}

pub(super) fn post_job(board: &Board, recruiter: &str, deadline: DateTime<Utc>) -> JobPosting {
    board
        .service
        .post_job(&user(recruiter), draft(deadline))
        .expect("job posts")
}

pub(super) fn router_with(board: &Board, tokens: &[(&str, Caller)]) -> axum::Router {
    board_router(BoardState {
        service: board.service.clone(),
        sessions: Arc::new(MemorySessions::with(tokens)),
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
