//! Demo binary: runs the enrollment flow against the in-memory backend.

use anyhow::Result;
use campus_registry::types::{NewCourse, NewEnrollment, NewStudent};
use campus_registry::{
    selectors, Dispatcher, InMemoryRecordsApi, RegistryConfig, RegistryEnvironment,
    RegistryReducer, RegistryState,
};
use campus_registry_runtime::Store;
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RegistryConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!(api = %config.api_base_url, "Starting campus registry demo");

    let api = InMemoryRecordsApi::new();
    let ada = api.seed_student(NewStudent {
        first_name: "Ada".into(),
        last_name: "Diallo".into(),
        age: 21,
        email: "ada@example.edu".into(),
    });
    let ben = api.seed_student(NewStudent {
        first_name: "Ben".into(),
        last_name: "Okafor".into(),
        age: 23,
        email: "ben@example.edu".into(),
    });
    let systems = api.seed_course(NewCourse {
        name: "Systems Programming".into(),
        code: "CS-301".into(),
        instructor: "R. Huang".into(),
        duration: 40,
        start_date: NaiveDate::from_ymd_opt(2026, 9, 7).ok_or_else(|| anyhow::anyhow!("bad date"))?,
        end_date: NaiveDate::from_ymd_opt(2026, 12, 18).ok_or_else(|| anyhow::anyhow!("bad date"))?,
        capacity: 1,
    });

    let env = RegistryEnvironment::in_memory(api);
    let store = Store::new(RegistryState::default(), RegistryReducer, env);
    let dispatcher = Dispatcher::new(store.clone(), config.request_timeout);

    dispatcher.load_students().await?;
    dispatcher.load_courses().await?;
    dispatcher.load_enrollments().await?;

    // One seat: the first enrollment fills it, the second is turned away.
    // No date given, so the environment clock stamps today.
    let enrollment = dispatcher
        .add_enrollment(NewEnrollment {
            student_id: ada.id,
            course_id: systems.id,
            enrollment_date: None,
        })
        .await?;
    tracing::info!(id = %enrollment.id, "Enrolled {}", ada.full_name());

    match dispatcher
        .add_enrollment(NewEnrollment {
            student_id: ben.id,
            course_id: systems.id,
            enrollment_date: None,
        })
        .await
    {
        Ok(_) => tracing::error!("Second enrollment should have been rejected"),
        Err(err) => tracing::info!(%err, "Second enrollment turned away"),
    }

    // Cancelling frees the seat; deleting the cancelled row does not
    // decrement a second time.
    dispatcher.cancel_enrollment(enrollment.id).await?;
    dispatcher.delete_enrollment(enrollment.id).await?;

    dispatcher
        .state(|state| {
            let courses = selectors::courses_view(state);
            let enrollments = selectors::enrollments_view(state);
            tracing::info!(
                enrolled = courses.courses[0].enrolled,
                utilization = courses.stats.capacity_utilization,
                remaining = enrollments.stats.total,
                "Final snapshot"
            );
        })
        .await;

    store.shutdown(config.shutdown_timeout).await?;
    Ok(())
}
