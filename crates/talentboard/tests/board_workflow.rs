//! Integration specifications for the application lifecycle workflow.
//!
//! Scenarios drive the public service facade and HTTP router end to end so
//! creation preconditions, status transitions, counter recompute, and event
//! addressing are validated without reaching into private modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};

    use talentboard::board::{
        board_router, Application, ApplicationFilters, ApplicationId, ApplicationRepository,
        ApplicationScope, BoardEvent, BoardState, Caller, EventPublisher, ExperienceLevel,
        IdentityRepository, JobDraft, JobField, JobFilters, JobId, JobPosting, JobRepository,
        JobScope, JobType, LifecycleService, Page, Profile, PublishError, RecruiterProfile,
        RepositoryError, Role, SalaryRange, SessionResolver, StudentProfile, UserId, UserRecord,
    };

    pub(super) fn instant(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0)
            .single()
            .expect("valid instant")
    }

    pub(super) fn user(id: &str) -> UserId {
        UserId(id.to_string())
    }

    pub(super) fn student(id: &str, name: &str, resume: Option<&str>) -> UserRecord {
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

    pub(super) fn recruiter(id: &str, company: &str) -> UserRecord {
        UserRecord {
            id: user(id),
            role: Role::Recruiter,
            email: format!("{id}@corp.example"),
            credential_hash: "argon2-opaque".to_string(),
            active: true,
            profile: Profile::Recruiter(RecruiterProfile {
                company_name: company.to_string(),
                description: None,
                logo: None,
            }),
        }
    }

    pub(super) fn draft(deadline: DateTime<Utc>) -> JobDraft {
        JobDraft {
            title: "Data Platform Intern".to_string(),
            description: "Batch and streaming pipelines".to_string(),
            requirements: "SQL, one systems language".to_string(),
            field: JobField::Engineering,
            job_type: JobType::Internship,
            experience: ExperienceLevel::Entry,
            salary: SalaryRange {
                min: 3000,
                max: 3900,
                currency: "USD".to_string(),
            },
            skills: vec!["rust".to_string()],
            benefits: Vec::new(),
            deadline,
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryIdentities {
        users: Mutex<HashMap<UserId, UserRecord>>,
    }

    impl IdentityRepository for MemoryIdentities {
        fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError> {
            let mut guard = self.users.lock().expect("lock");
            if guard.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
            Ok(self.users.lock().expect("lock").get(id).cloned())
        }

        fn update(&self, record: UserRecord) -> Result<(), RepositoryError> {
            let mut guard = self.users.lock().expect("lock");
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
            let mut guard = self.jobs.lock().expect("lock");
            if guard.contains_key(&job.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(job.id.clone(), job.clone());
            Ok(job)
        }

        fn update(&self, job: JobPosting) -> Result<(), RepositoryError> {
            let mut guard = self.jobs.lock().expect("lock");
            if !guard.contains_key(&job.id) {
                return Err(RepositoryError::NotFound);
            }
            guard.insert(job.id.clone(), job);
            Ok(())
        }

        fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
            Ok(self.jobs.lock().expect("lock").get(id).cloned())
        }

        fn delete(&self, id: &JobId) -> Result<(), RepositoryError> {
            self.jobs
                .lock()
                .expect("lock")
                .remove(id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }

        fn list(
            &self,
            scope: &JobScope,
            filters: &JobFilters,
        ) -> Result<Page<JobPosting>, RepositoryError> {
            let guard = self.jobs.lock().expect("lock");
            let mut items: Vec<_> = guard
                .values()
                .filter(|job| scope.permits(job) && filters.matches(job))
                .cloned()
                .collect();
            items.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(Page::slice(items, filters.page, filters.per_page))
        }

        fn record_view(&self, id: &JobId) -> Result<(), RepositoryError> {
            let mut guard = self.jobs.lock().expect("lock");
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
            let mut guard = self.records.lock().expect("lock");
            let duplicate = guard.values().any(|existing| {
                existing.job == application.job && existing.student == application.student
            });
            if duplicate || guard.contains_key(&application.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(application.id.clone(), application.clone());
            Ok(application)
        }

        fn update(&self, application: Application) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("lock");
            if !guard.contains_key(&application.id) {
                return Err(RepositoryError::NotFound);
            }
            guard.insert(application.id.clone(), application);
            Ok(())
        }

        fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
            Ok(self.records.lock().expect("lock").get(id).cloned())
        }

        fn find(
            &self,
            job: &JobId,
            student: &UserId,
        ) -> Result<Option<Application>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("lock")
                .values()
                .find(|a| a.job == *job && a.student == *student)
                .cloned())
        }

        fn list(
            &self,
            scope: &ApplicationScope,
            filters: &ApplicationFilters,
        ) -> Result<Page<Application>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            let mut items: Vec<_> = guard
                .values()
                .filter(|a| scope.permits(a) && filters.matches(a))
                .cloned()
                .collect();
            items.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(Page::slice(items, filters.page, filters.per_page))
        }

        fn for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("lock")
                .values()
                .filter(|a| a.job == *job)
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
            self.events.lock().expect("lock").clone()
        }
    }

    impl EventPublisher for MemoryPublisher {
        fn publish(&self, event: BoardEvent) -> Result<(), PublishError> {
            self.events.lock().expect("lock").push(event);
            Ok(())
        }
    }

    pub(super) struct StaticSessions {
        tokens: HashMap<String, Caller>,
    }

    impl StaticSessions {
        pub(super) fn with(tokens: &[(&str, Caller)]) -> Self {
            Self {
                tokens: tokens
                    .iter()
                    .map(|(token, caller)| (token.to_string(), caller.clone()))
                    .collect(),
            }
        }
    }

    impl SessionResolver for StaticSessions {
        fn resolve(&self, token: &str) -> Option<Caller> {
            self.tokens.get(token).cloned()
        }
    }

    pub(super) type Service =
        LifecycleService<MemoryIdentities, MemoryJobs, MemoryApplications, MemoryPublisher>;

    pub(super) struct Harness {
        pub(super) service: Arc<Service>,
        pub(super) jobs: Arc<MemoryJobs>,
        pub(super) events: Arc<MemoryPublisher>,
    }

    pub(super) fn harness() -> Harness {
        let identities = Arc::new(MemoryIdentities::default());
        let jobs = Arc::new(MemoryJobs::default());
        let applications = Arc::new(MemoryApplications::default());
        let events = Arc::new(MemoryPublisher::default());

        identities
            .insert(student("s1", "Avery Chen", Some("blob://resumes/s1.pdf")))
            .expect("seed s1");
        identities
            .insert(student("s2", "Jordan Ruiz", None))
            .expect("seed s2");
        identities
            .insert(recruiter("r1", "Nimbus Analytics"))
            .expect("seed r1");

        let service = Arc::new(LifecycleService::new(
            identities,
            jobs.clone(),
            applications,
            events.clone(),
        ));
        Harness {
            service,
            jobs,
            events,
        }
    }

    pub(super) fn router_for(harness: &Harness) -> axum::Router {
        board_router(BoardState {
            service: harness.service.clone(),
            sessions: Arc::new(StaticSessions::with(&[
                ("tok-s1", Caller::Student(user("s1"))),
                ("tok-r1", Caller::Recruiter(user("r1"))),
            ])),
        })
    }
}

mod lifecycle {
    use super::common::*;
    use talentboard::board::{
        ApplicationStatus, BoardEvent, JobCounters, JobRepository, LifecycleError, ReviewCommand,
        ReviewDecision,
    };

    #[test]
    fn full_application_round_trip() {
        let harness = harness();
        let deadline = instant(8, 0);
        let job = harness
            .service
            .post_job(&user("r1"), draft(deadline))
            .expect("job posts");

        // S1 applies with a cover letter.
        let application = harness
            .service
            .apply(
                &job.id,
                &user("s1"),
                Some("hello".to_string()),
                instant(1, 12),
            )
            .expect("apply succeeds");
        assert_eq!(application.status, ApplicationStatus::Pending);

        let stored = harness.jobs.fetch(&job.id).expect("fetch").expect("job");
        assert_eq!(stored.counters.total, 1);
        let first_events = harness.events.events();
        assert_eq!(first_events.len(), 1);
        assert_eq!(first_events[0].kind(), "new-application");
        assert_eq!(first_events[0].channel().to_string(), "recruiter-r1");

        // Applying again is a duplicate.
        match harness
            .service
            .apply(&job.id, &user("s1"), None, instant(1, 13))
        {
            Err(LifecycleError::DuplicateApplication) => {}
            other => panic!("expected duplicate application, got {other:?}"),
        }

        // R1 accepts; the student's channel is notified.
        let accepted = harness
            .service
            .review(
                &application.id,
                &user("r1"),
                ReviewCommand {
                    status: ReviewDecision::Accepted,
                    notes: None,
                    interview: None,
                },
                instant(2, 9),
            )
            .expect("review succeeds");
        assert_eq!(accepted.status, ApplicationStatus::Accepted);

        let stored = harness.jobs.fetch(&job.id).expect("fetch").expect("job");
        assert_eq!(
            stored.counters,
            JobCounters {
                total: 1,
                accepted: 1,
                rejected: 0,
            }
        );
        let events = harness.events.events();
        let update = events.last().expect("update event");
        assert_eq!(update.kind(), "application-updated");
        assert_eq!(update.channel().to_string(), "student-s1");
        match update {
            BoardEvent::ApplicationUpdated { status, .. } => {
                assert_eq!(*status, ApplicationStatus::Accepted);
            }
            other => panic!("expected application-updated, got {other:?}"),
        }

        // Withdrawing the accepted application is an invalid transition.
        match harness.service.withdraw(&application.id, &user("s1")) {
            Err(LifecycleError::InvalidTransition {
                from: ApplicationStatus::Accepted,
            }) => {}
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[test]
    fn missing_resume_blocks_the_application_without_side_effects() {
        let harness = harness();
        let job = harness
            .service
            .post_job(&user("r1"), draft(instant(8, 0)))
            .expect("job posts");

        match harness
            .service
            .apply(&job.id, &user("s2"), None, instant(1, 12))
        {
            Err(LifecycleError::MissingResume) => {}
            other => panic!("expected missing resume, got {other:?}"),
        }

        let stored = harness.jobs.fetch(&job.id).expect("fetch").expect("job");
        assert_eq!(stored.counters.total, 0);
        assert!(harness.events.events().is_empty());
    }

    #[test]
    fn deadline_equality_still_accepts() {
        let harness = harness();
        let deadline = instant(8, 0);
        let job = harness
            .service
            .post_job(&user("r1"), draft(deadline))
            .expect("job posts");

        harness
            .service
            .apply(&job.id, &user("s1"), None, deadline)
            .expect("equality to the deadline is not passed");
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn apply_then_review_over_http() {
        let harness = harness();
        let job = harness
            .service
            .post_job(&user("r1"), draft(Utc::now() + Duration::days(7)))
            .expect("job posts");
        let router = router_for(&harness);

        let apply = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/jobs/{}/applications", job.id.0))
            .header("content-type", "application/json")
            .header("authorization", "Bearer tok-s1")
            .body(Body::from(
                serde_json::to_vec(&json!({ "cover_letter": "hello" })).expect("serialize"),
            ))
            .expect("request");
        let response = router.clone().oneshot(apply).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let application_id = payload
            .get("id")
            .and_then(Value::as_str)
            .expect("application id")
            .to_string();

        let review = Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/applications/{application_id}"))
            .header("content-type", "application/json")
            .header("authorization", "Bearer tok-r1")
            .body(Body::from(
                serde_json::to_vec(&json!({ "status": "accepted" })).expect("serialize"),
            ))
            .expect("request");
        let response = router.oneshot(review).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.get("status"), Some(&json!("accepted")));
        assert!(payload.get("reviewed_at").is_some());
    }
}
