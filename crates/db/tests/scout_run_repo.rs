//! Repository tests for the scout run registry and scrape targets.
//!
//! These run against a real PostgreSQL database supplied through
//! `DATABASE_URL`; run with `cargo test -- --ignored`.

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use scout_core::scout::run::RunReport;
use scout_core::scout::status::RunStatus;
use scout_db::models::scout_target::CreateScoutTarget;
use scout_db::repositories::{RunReportError, ScoutRunRepo, ScoutTargetRepo};
use sqlx::PgPool;

fn report(status: RunStatus) -> RunReport {
    RunReport {
        status,
        events_found: None,
        log_summary: None,
        ended_at: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn upsert_start_creates_a_single_running_row(pool: PgPool) {
    let first = ScoutRunRepo::upsert_start(&pool, "run-1").await.unwrap();
    let second = ScoutRunRepo::upsert_start(&pool, "run-1").await.unwrap();

    assert_eq!(first.status(), Some(RunStatus::Running));
    assert_eq!(first.status_name, "running");
    assert_eq!(first.started_at, second.started_at);

    let runs = ScoutRunRepo::list_recent(&pool, 50).await.unwrap();
    assert_eq!(runs.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn reports_update_in_place_and_keep_one_row(pool: PgPool) {
    ScoutRunRepo::upsert_start(&pool, "run-2").await.unwrap();

    let mut progress = report(RunStatus::Running);
    progress.events_found = Some(4);
    ScoutRunRepo::report(&pool, "run-2", &progress).await.unwrap();

    let mut done = report(RunStatus::Succeeded);
    done.log_summary = Some("12 events".into());
    let run = ScoutRunRepo::report(&pool, "run-2", &done).await.unwrap();

    assert_eq!(run.status(), Some(RunStatus::Succeeded));
    assert_eq!(run.events_found, Some(4));
    assert_eq!(run.log_summary.as_deref(), Some("12 events"));
    assert!(run.ended_at.is_some());

    let runs = ScoutRunRepo::list_recent(&pool, 50).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, "run-2");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn first_contact_report_creates_the_row(pool: PgPool) {
    let mut failed = report(RunStatus::Failed);
    failed.ended_at = Some(Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap());

    let run = ScoutRunRepo::report(&pool, "unseen", &failed).await.unwrap();

    assert_eq!(run.status(), Some(RunStatus::Failed));
    assert_eq!(run.ended_at, failed.ended_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn terminal_runs_reject_different_status(pool: PgPool) {
    ScoutRunRepo::report(&pool, "run-3", &report(RunStatus::Succeeded))
        .await
        .unwrap();

    let revived = ScoutRunRepo::report(&pool, "run-3", &report(RunStatus::Running)).await;
    assert_matches!(revived, Err(RunReportError::Transition(_)));

    let repeated = ScoutRunRepo::report(&pool, "run-3", &report(RunStatus::Succeeded))
        .await
        .unwrap();
    assert_eq!(repeated.status(), Some(RunStatus::Succeeded));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn running_runs_reject_starting_report(pool: PgPool) {
    ScoutRunRepo::upsert_start(&pool, "run-5").await.unwrap();

    let backwards = ScoutRunRepo::report(&pool, "run-5", &report(RunStatus::Starting)).await;
    assert_matches!(backwards, Err(RunReportError::Transition(_)));

    let stored = ScoutRunRepo::find_by_id(&pool, "run-5").await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(RunStatus::Running));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn list_recent_is_newest_first_and_limited(pool: PgPool) {
    for (id, day) in [("a", 1), ("b", 3), ("c", 2)] {
        let mut r = report(RunStatus::Succeeded);
        r.ended_at = Some(Utc.with_ymd_and_hms(2026, 10, day, 0, 0, 0).unwrap());
        ScoutRunRepo::report(&pool, id, &r).await.unwrap();
        sqlx::query("UPDATE scout_runs SET started_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc.with_ymd_and_hms(2026, 10, day, 0, 0, 0).unwrap())
            .execute(&pool)
            .await
            .unwrap();
    }

    let runs = ScoutRunRepo::list_recent(&pool, 2).await.unwrap();
    let ids: Vec<_> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["b", "c"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn targets_crud(pool: PgPool) {
    let dto = CreateScoutTarget {
        name: "Blue Note".into(),
        url: "https://example.com/events".into(),
        city: Some("New York".into()),
        selector: None,
    };
    let created = ScoutTargetRepo::create(&pool, &dto).await.unwrap();
    assert_eq!(created.url, dto.url);

    let duplicate = ScoutTargetRepo::create(&pool, &dto).await;
    assert_matches!(duplicate, Err(sqlx::Error::Database(_)));

    let listed = ScoutTargetRepo::list(&pool).await.unwrap();
    assert_eq!(listed.len(), 1);

    assert!(ScoutTargetRepo::delete(&pool, created.id).await.unwrap());
    assert!(!ScoutTargetRepo::delete(&pool, created.id).await.unwrap());
    assert!(ScoutTargetRepo::find_by_id(&pool, created.id)
        .await
        .unwrap()
        .is_none());
}
