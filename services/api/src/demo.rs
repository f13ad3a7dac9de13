use crate::infra::{
    recruiter_record, student_record, InMemoryApplicationRepository, InMemoryIdentityRepository,
    InMemoryJobRepository,
};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use talentboard::board::{
    BoardEvent, ChannelKey, ExperienceLevel, IdentityRepository, JobDraft, JobField,
    JobRepository, JobType, LifecycleError, LifecycleService, NotificationHub, ReviewCommand,
    ReviewDecision, SalaryRange, UserId,
};
use talentboard::error::AppError;
use tokio::sync::broadcast;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Days until the demo job's application deadline
    #[arg(long, default_value_t = 7)]
    pub(crate) deadline_days: i64,
}

fn io_error(err: LifecycleError) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}

fn drain(receiver: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let identities = Arc::new(InMemoryIdentityRepository::default());
    let jobs = Arc::new(InMemoryJobRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let hub = Arc::new(NotificationHub::new());
    let service = LifecycleService::new(
        identities.clone(),
        jobs.clone(),
        applications,
        hub.clone(),
    );

    let recruiter = UserId("r-nimbus".to_string());
    let avery = UserId("s-avery".to_string());
    let jordan = UserId("s-jordan".to_string());
    identities
        .insert(recruiter_record(&recruiter.0, "Nimbus Analytics"))
        .map_err(|err| io_error(err.into()))?;
    identities
        .insert(student_record(&avery.0, "Avery Chen", Some("blob://resumes/avery.pdf")))
        .map_err(|err| io_error(err.into()))?;
    identities
        .insert(student_record(&jordan.0, "Jordan Ruiz", None))
        .map_err(|err| io_error(err.into()))?;

    let mut recruiter_channel = hub.subscribe(&ChannelKey::recruiter(recruiter.clone()));
    let mut student_channel = hub.subscribe(&ChannelKey::student(avery.clone()));

    println!("== Talentboard lifecycle demo ==\n");

    let job = service
        .post_job(
            &recruiter,
            JobDraft {
                title: "Backend Engineer Intern".to_string(),
                description: "Build lifecycle services in Rust".to_string(),
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
                deadline: Utc::now() + Duration::days(args.deadline_days),
            },
        )
        .map_err(io_error)?;
    println!(
        "Posted '{}' for {} (deadline in {} days)",
        job.title, job.company_name, args.deadline_days
    );

    let application = service
        .apply(&job.id, &avery, Some("hello".to_string()), Utc::now())
        .map_err(io_error)?;
    println!(
        "\nAvery applied: {} is {}",
        application.id.0,
        application.status.label()
    );
    for event in drain(&mut recruiter_channel) {
        println!("  -> recruiter channel received '{}'", event.kind());
    }

    match service.apply(&job.id, &avery, None, Utc::now()) {
        Err(LifecycleError::DuplicateApplication) => {
            println!("Avery applied again: rejected as a duplicate")
        }
        other => println!("Unexpected duplicate-apply outcome: {other:?}"),
    }

    match service.apply(&job.id, &jordan, None, Utc::now()) {
        Err(LifecycleError::MissingResume) => {
            println!("Jordan (no resume on file) applied: rejected")
        }
        other => println!("Unexpected no-resume outcome: {other:?}"),
    }

    let accepted = service
        .review(
            &application.id,
            &recruiter,
            ReviewCommand {
                status: ReviewDecision::Accepted,
                notes: Some("Strong systems background".to_string()),
                interview: None,
            },
            Utc::now(),
        )
        .map_err(io_error)?;
    println!(
        "\nRecruiter accepted {}: status is now {}",
        accepted.id.0,
        accepted.status.label()
    );
    for event in drain(&mut student_channel) {
        println!("  -> student channel received '{}'", event.kind());
    }

    match service.withdraw(&application.id, &avery) {
        Err(LifecycleError::InvalidTransition { from }) => println!(
            "Avery tried to withdraw: invalid transition out of '{}'",
            from.label()
        ),
        other => println!("Unexpected withdraw outcome: {other:?}"),
    }

    let final_job = jobs
        .fetch(&job.id)
        .map_err(|err| io_error(err.into()))?
        .ok_or_else(|| io_error(LifecycleError::NotFound))?;
    println!(
        "\nFinal counters for '{}': total={} accepted={} rejected={}",
        final_job.title,
        final_job.counters.total,
        final_job.counters.accepted,
        final_job.counters.rejected
    );

    Ok(())
}
