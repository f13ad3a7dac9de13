use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::auth::{ApplicationScope, Caller, JobScope};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Interview, JobCounters, JobDraft, JobId,
    JobPosting, Profile, UserId, UserRecord, MAX_COVER_LETTER_CHARS,
};
use super::events::{BoardEvent, EventPublisher};
use super::repository::{
    ApplicationFilters, ApplicationRepository, IdentityRepository, JobFilters, JobRepository,
    Page, RepositoryError,
};

/// Error raised by the lifecycle engine. Every variant is recovered at the
/// operation boundary and returned as a typed failure.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("entity not found")]
    NotFound,
    #[error("caller does not own the target entity")]
    Forbidden,
    #[error("no transition allowed from status '{}'", .from.label())]
    InvalidTransition { from: ApplicationStatus },
    #[error("an application for this job already exists")]
    DuplicateApplication,
    #[error("the application deadline has passed")]
    DeadlinePassed,
    #[error("job posting is not accepting applications")]
    Inactive,
    #[error("student profile has no resume on file")]
    MissingResume,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Status a recruiter may move a pending application to. Withdrawn and
/// pending are unreachable through review by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Accepted,
    Rejected,
}

impl From<ReviewDecision> for ApplicationStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Accepted => ApplicationStatus::Accepted,
            ReviewDecision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Recruiter review payload for a single application.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCommand {
    pub status: ReviewDecision,
    pub notes: Option<String>,
    pub interview: Option<Interview>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// The application lifecycle engine: sole mutator of application status and
/// of the derived job counters, and the producer of board events.
pub struct LifecycleService<I, J, A, P> {
    identities: Arc<I>,
    jobs: Arc<J>,
    applications: Arc<A>,
    events: Arc<P>,
}

impl<I, J, A, P> LifecycleService<I, J, A, P>
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(identities: Arc<I>, jobs: Arc<J>, applications: Arc<A>, events: Arc<P>) -> Self {
        Self {
            identities,
            jobs,
            applications,
            events,
        }
    }

    /// Submit an application for a job.
    ///
    /// Preconditions are checked in order, first failure wins: the job
    /// exists, is active, the deadline has not passed (equality to the
    /// deadline instant still accepts), no application for this (job,
    /// student) pair exists, and the student has a resume on file. The
    /// uniqueness precheck is advisory; the store's insert constraint closes
    /// the race between two simultaneous submissions.
    pub fn apply(
        &self,
        job_id: &JobId,
        student_id: &UserId,
        cover_letter: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Application, LifecycleError> {
        if let Some(letter) = &cover_letter {
            if letter.chars().count() > MAX_COVER_LETTER_CHARS {
                return Err(LifecycleError::Validation(format!(
                    "cover letter exceeds {MAX_COVER_LETTER_CHARS} characters"
                )));
            }
        }

        let job = self.jobs.fetch(job_id)?.ok_or(LifecycleError::NotFound)?;
        if !job.active {
            return Err(LifecycleError::Inactive);
        }
        if now > job.deadline {
            return Err(LifecycleError::DeadlinePassed);
        }
        if self.applications.find(job_id, student_id)?.is_some() {
            return Err(LifecycleError::DuplicateApplication);
        }

        let student = self
            .identities
            .fetch(student_id)?
            .ok_or(LifecycleError::NotFound)?;
        let resume = match &student.profile {
            Profile::Student(profile) => profile
                .resume
                .clone()
                .ok_or(LifecycleError::MissingResume)?,
            Profile::Recruiter(_) => return Err(LifecycleError::Forbidden),
        };

        let application = Application {
            id: next_application_id(),
            job: job.id.clone(),
            student: student.id.clone(),
            recruiter: job.recruiter.clone(),
            status: ApplicationStatus::Pending,
            cover_letter,
            resume,
            notes: None,
            interview: None,
            applied_at: now,
            reviewed_at: None,
        };

        let stored = match self.applications.insert(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(LifecycleError::DuplicateApplication),
            Err(err) => return Err(err.into()),
        };

        self.recompute_counters(&job.id);
        self.emit(BoardEvent::NewApplication {
            application: stored.clone(),
            job_title: job.title,
            student_name: student.display_name().to_string(),
        });

        Ok(stored)
    }

    /// Withdraw a pending application. Students may only leave the pending
    /// state; any other starting status is an invalid transition.
    pub fn withdraw(
        &self,
        application_id: &ApplicationId,
        student_id: &UserId,
    ) -> Result<Application, LifecycleError> {
        let mut application = self
            .applications
            .fetch(application_id)?
            .ok_or(LifecycleError::NotFound)?;
        if application.student != *student_id {
            return Err(LifecycleError::Forbidden);
        }
        if application.status != ApplicationStatus::Pending {
            return Err(LifecycleError::InvalidTransition {
                from: application.status,
            });
        }

        application.status = ApplicationStatus::Withdrawn;
        self.applications.update(application.clone())?;

        self.recompute_counters(&application.job);
        self.emit(BoardEvent::ApplicationWithdrawn {
            application_id: application.id.clone(),
            recruiter: application.recruiter.clone(),
            student_name: self.display_name_for(student_id),
        });

        Ok(application)
    }

    /// Review a pending application: accept or reject, optionally attaching
    /// notes and interview details. No deadline check applies to review.
    pub fn review(
        &self,
        application_id: &ApplicationId,
        recruiter_id: &UserId,
        command: ReviewCommand,
        now: DateTime<Utc>,
    ) -> Result<Application, LifecycleError> {
        let mut application = self
            .applications
            .fetch(application_id)?
            .ok_or(LifecycleError::NotFound)?;
        if application.recruiter != *recruiter_id {
            return Err(LifecycleError::Forbidden);
        }
        if application.status != ApplicationStatus::Pending {
            return Err(LifecycleError::InvalidTransition {
                from: application.status,
            });
        }

        application.status = command.status.into();
        if command.notes.is_some() {
            application.notes = command.notes;
        }
        if command.interview.is_some() {
            application.interview = command.interview;
        }
        application.reviewed_at = Some(now);
        self.applications.update(application.clone())?;

        self.recompute_counters(&application.job);
        self.emit(BoardEvent::ApplicationUpdated {
            application_id: application.id.clone(),
            student: application.student.clone(),
            status: application.status,
            notes: application.notes.clone(),
            interview: application.interview.clone(),
        });

        Ok(application)
    }

    /// Transition many applications to one target status.
    ///
    /// Ownership and existence of every referenced application are validated
    /// before anything is written; any miss rejects the call in full.
    /// Applications that already left the pending state are skipped, and the
    /// returned count is the number actually transitioned.
    pub fn bulk_review(
        &self,
        application_ids: &[ApplicationId],
        recruiter_id: &UserId,
        decision: ReviewDecision,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<usize, LifecycleError> {
        let mut applications = Vec::with_capacity(application_ids.len());
        for id in application_ids {
            let application = self.applications.fetch(id)?.ok_or(LifecycleError::NotFound)?;
            if application.recruiter != *recruiter_id {
                return Err(LifecycleError::Forbidden);
            }
            applications.push(application);
        }

        let mut updated = 0;
        let mut touched_jobs = BTreeSet::new();
        for mut application in applications {
            if application.status != ApplicationStatus::Pending {
                continue;
            }
            application.status = decision.into();
            if notes.is_some() {
                application.notes = notes.clone();
            }
            application.reviewed_at = Some(now);
            self.applications.update(application.clone())?;
            touched_jobs.insert(application.job.clone());
            updated += 1;

            self.emit(BoardEvent::ApplicationUpdated {
                application_id: application.id.clone(),
                student: application.student.clone(),
                status: application.status,
                notes: application.notes.clone(),
                interview: application.interview.clone(),
            });
        }

        for job in touched_jobs {
            self.recompute_counters(&job);
        }

        Ok(updated)
    }

    /// Fetch one application, re-checking ownership explicitly.
    ///
    /// List endpoints are pre-filtered by scope; a single-id fetch bypasses
    /// that filter, so the equality check here is mandatory. A mismatch is
    /// `Forbidden`, distinguishable from true absence.
    pub fn get_application(
        &self,
        application_id: &ApplicationId,
        caller: &Caller,
    ) -> Result<Application, LifecycleError> {
        let application = self
            .applications
            .fetch(application_id)?
            .ok_or(LifecycleError::NotFound)?;
        let permitted = match caller {
            Caller::Admin => true,
            Caller::Student(id) => application.student == *id,
            Caller::Recruiter(id) => application.recruiter == *id,
            Caller::Anonymous => false,
        };
        if !permitted {
            return Err(LifecycleError::Forbidden);
        }
        Ok(application)
    }

    /// List applications visible to the caller, scope applied before filters.
    pub fn list_applications(
        &self,
        caller: &Caller,
        filters: &ApplicationFilters,
    ) -> Result<Page<Application>, LifecycleError> {
        let scope = ApplicationScope::for_caller(caller).ok_or(LifecycleError::Forbidden)?;
        Ok(self.applications.list(&scope, filters)?)
    }

    /// Privileged status override. Deliberately bypasses the pending-only
    /// rule as a distinct operation rather than a hidden branch in `review`.
    pub fn admin_override_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<Application, LifecycleError> {
        let mut application = self
            .applications
            .fetch(application_id)?
            .ok_or(LifecycleError::NotFound)?;

        application.status = status;
        application.reviewed_at = match status {
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => Some(now),
            ApplicationStatus::Pending | ApplicationStatus::Withdrawn => None,
        };
        self.applications.update(application.clone())?;

        self.recompute_counters(&application.job);
        self.emit(BoardEvent::ApplicationUpdated {
            application_id: application.id.clone(),
            student: application.student.clone(),
            status: application.status,
            notes: application.notes.clone(),
            interview: application.interview.clone(),
        });

        Ok(application)
    }

    /// Publish a job posting owned by the recruiter. The company name is
    /// copied from the recruiter profile at posting time.
    pub fn post_job(
        &self,
        recruiter_id: &UserId,
        draft: JobDraft,
    ) -> Result<JobPosting, LifecycleError> {
        validate_draft(&draft)?;
        let recruiter = self
            .identities
            .fetch(recruiter_id)?
            .ok_or(LifecycleError::NotFound)?;
        let company_name = match &recruiter.profile {
            Profile::Recruiter(profile) => profile.company_name.clone(),
            Profile::Student(_) => return Err(LifecycleError::Forbidden),
        };

        let job = JobPosting {
            id: next_job_id(),
            recruiter: recruiter.id.clone(),
            company_name,
            title: draft.title,
            description: draft.description,
            requirements: draft.requirements,
            field: draft.field,
            job_type: draft.job_type,
            experience: draft.experience,
            salary: draft.salary,
            skills: draft.skills,
            benefits: draft.benefits,
            deadline: draft.deadline,
            active: true,
            counters: JobCounters::default(),
            views: 0,
        };

        Ok(self.jobs.insert(job)?)
    }

    /// Edit an owned posting. Counters, views, and the active flag are not
    /// recruiter-editable through this path.
    pub fn update_job(
        &self,
        job_id: &JobId,
        recruiter_id: &UserId,
        draft: JobDraft,
    ) -> Result<JobPosting, LifecycleError> {
        validate_draft(&draft)?;
        let mut job = self.fetch_owned_job(job_id, recruiter_id)?;

        job.title = draft.title;
        job.description = draft.description;
        job.requirements = draft.requirements;
        job.field = draft.field;
        job.job_type = draft.job_type;
        job.experience = draft.experience;
        job.salary = draft.salary;
        job.skills = draft.skills;
        job.benefits = draft.benefits;
        job.deadline = draft.deadline;
        self.jobs.update(job.clone())?;

        self.emit(BoardEvent::JobUpdated {
            job_id: job.id.clone(),
            field: job.field,
            title: job.title.clone(),
        });

        Ok(job)
    }

    pub fn set_job_active(
        &self,
        job_id: &JobId,
        recruiter_id: &UserId,
        active: bool,
    ) -> Result<JobPosting, LifecycleError> {
        let mut job = self.fetch_owned_job(job_id, recruiter_id)?;
        job.active = active;
        self.jobs.update(job.clone())?;
        Ok(job)
    }

    /// Delete an owned posting. Its applications stay in the store.
    pub fn delete_job(
        &self,
        job_id: &JobId,
        recruiter_id: &UserId,
    ) -> Result<(), LifecycleError> {
        self.fetch_owned_job(job_id, recruiter_id)?;
        Ok(self.jobs.delete(job_id)?)
    }

    /// Fetch one posting under the visibility rule: deactivated postings are
    /// absent for everyone but the owner and admin. Non-owner fetches tally a
    /// view, best-effort.
    pub fn get_job(&self, job_id: &JobId, caller: &Caller) -> Result<JobPosting, LifecycleError> {
        let job = self.jobs.fetch(job_id)?.ok_or(LifecycleError::NotFound)?;
        let is_owner = matches!(caller, Caller::Recruiter(id) if *id == job.recruiter);
        if !job.active && !is_owner && *caller != Caller::Admin {
            return Err(LifecycleError::NotFound);
        }
        if !is_owner && *caller != Caller::Admin {
            if let Err(err) = self.jobs.record_view(job_id) {
                warn!(job = %job_id.0, error = %err, "view tally failed");
            }
        }
        Ok(job)
    }

    /// Public browse listing: active postings only.
    pub fn list_jobs(&self, filters: &JobFilters) -> Result<Page<JobPosting>, LifecycleError> {
        Ok(self.jobs.list(&JobScope::PublicActive, filters)?)
    }

    /// Owner listing, deactivated postings included.
    pub fn list_jobs_for_owner(
        &self,
        recruiter_id: &UserId,
        filters: &JobFilters,
    ) -> Result<Page<JobPosting>, LifecycleError> {
        Ok(self
            .jobs
            .list(&JobScope::ByOwner(recruiter_id.clone()), filters)?)
    }

    /// Admin activation toggle for an identity.
    pub fn set_identity_active(
        &self,
        user_id: &UserId,
        active: bool,
    ) -> Result<UserRecord, LifecycleError> {
        let mut user = self
            .identities
            .fetch(user_id)?
            .ok_or(LifecycleError::NotFound)?;
        user.active = active;
        self.identities.update(user.clone())?;
        Ok(user)
    }

    /// Update the resume reference on the student's own profile. Existing
    /// application snapshots are unaffected.
    pub fn update_student_resume(
        &self,
        student_id: &UserId,
        resume: Option<String>,
    ) -> Result<UserRecord, LifecycleError> {
        let mut user = self
            .identities
            .fetch(student_id)?
            .ok_or(LifecycleError::NotFound)?;
        match &mut user.profile {
            Profile::Student(profile) => profile.resume = resume,
            Profile::Recruiter(_) => return Err(LifecycleError::Forbidden),
        }
        self.identities.update(user.clone())?;
        Ok(user)
    }

    fn fetch_owned_job(
        &self,
        job_id: &JobId,
        recruiter_id: &UserId,
    ) -> Result<JobPosting, LifecycleError> {
        let job = self.jobs.fetch(job_id)?.ok_or(LifecycleError::NotFound)?;
        if job.recruiter != *recruiter_id {
            return Err(LifecycleError::Forbidden);
        }
        Ok(job)
    }

    /// Unconditional full recompute of one job's counters. A failure here
    /// after a committed status write is a recoverable inconsistency repaired
    /// by the next recompute, so it is logged and swallowed.
    fn recompute_counters(&self, job_id: &JobId) {
        let outcome = (|| -> Result<(), RepositoryError> {
            let Some(mut job) = self.jobs.fetch(job_id)? else {
                return Ok(());
            };
            let statuses = self
                .applications
                .for_job(job_id)?
                .into_iter()
                .map(|application| application.status);
            job.counters = JobCounters::project(statuses);
            self.jobs.update(job)
        })();
        if let Err(err) = outcome {
            warn!(job = %job_id.0, error = %err, "job counter recompute failed");
        }
    }

    /// Publish failures must never fail the mutation that produced the event.
    fn emit(&self, event: BoardEvent) {
        if let Err(err) = self.events.publish(event) {
            warn!(error = %err, "notification publish failed");
        }
    }

    fn display_name_for(&self, user_id: &UserId) -> String {
        match self.identities.fetch(user_id) {
            Ok(Some(user)) => user.display_name().to_string(),
            _ => user_id.0.clone(),
        }
    }
}

fn validate_draft(draft: &JobDraft) -> Result<(), LifecycleError> {
    if draft.title.trim().is_empty() {
        return Err(LifecycleError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    if draft.salary.min > draft.salary.max {
        return Err(LifecycleError::Validation(
            "salary range minimum exceeds maximum".to_string(),
        ));
    }
    Ok(())
}
