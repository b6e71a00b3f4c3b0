//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for a job board and drive the
//! dispatcher end-to-end: listing page, job pages, storage.

use job_crawler::config::{parse_config, Config};
use job_crawler::crawler::{CrawlTrigger, Dispatcher, StopReason};
use job_crawler::frontier::{CrawlTask, Frontier};
use job_crawler::storage::{shared, SharedStorage, SqliteStorage, Storage, TrendField};
use job_crawler::CrawlError;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration whose only site points at the mock server
fn create_test_config(
    base_url: &str,
    max_jobs: usize,
    task_timeout_secs: u64,
    frontier_capacity: usize,
) -> Config {
    parse_config(&format!(
        r#"
[crawler]
max-jobs = {max_jobs}
task-timeout-secs = {task_timeout_secs}
frontier-capacity = {frontier_capacity}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "unused.db"

[roles]
allowed = ["devops", "backend"]

[sites.weworkremotely]
base-url = "{base_url}"
"#
    ))
    .expect("Failed to parse test config")
}

fn create_storage(dir: &TempDir) -> SharedStorage {
    let db_path = dir.path().join("jobs.db");
    shared(SqliteStorage::new(&db_path).expect("Failed to open DB"))
}

fn listing_page(slugs: &[&str]) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<li class="new-listing-container">
                     <a href="/listings/{slug}">
                       <h4 class="new-listing__header__title">{slug} title</h4>
                       <p class="new-listing__company-name">{slug} inc</p>
                     </a>
                   </li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", items)
}

fn job_page(title: &str, company: &str, skills: &[&str]) -> String {
    let tags: String = skills
        .iter()
        .map(|s| format!(r#"<span class="box">{}</span>"#, s))
        .collect();
    format!(
        r#"<html><body>
          <h2 class="lis-container__header__hero__company-info__title">{title}</h2>
          <div class="lis-container__header__hero__company-info__description"><strong>{company}</strong></div>
          <div class="lis-container__job__content__description">We deploy with Terraform. 4+ years required.</div>
          <ul>
            <li class="lis-container__job__sidebar__job-about__list__item">Posted on <span>2 days ago</span></li>
            <li class="lis-container__job__sidebar__job-about__list__item--full">Region <span class="box">Anywhere in the World</span></li>
            <li class="lis-container__job__sidebar__job-about__list__item--full">Skills {tags}</li>
          </ul>
        </body></html>"#
    )
}

async fn mount_job(server: &MockServer, slug: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/listings/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(job_page(
            &format!("{} engineer", slug),
            &format!("{} inc", slug),
            &["Docker"],
        )))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn count_postings(storage: &SharedStorage) -> u64 {
    storage
        .lock()
        .expect("Storage lock poisoned")
        .count_postings()
        .expect("Failed to count postings")
}

#[tokio::test]
async fn test_full_crawl_listing_to_jobs() {
    let mock_server = MockServer::start().await;

    // The listing repeats one posting; it must be fetched only once
    Mock::given(method("GET"))
        .and(path("/remote-jobs/search"))
        .and(query_param("term", "devops"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[
            "acme-devops",
            "globex-sre",
            "acme-devops",
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_job(&mock_server, "acme-devops", 1).await;
    mount_job(&mock_server, "globex-sre", 1).await;

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&mock_server.uri(), 10, 5, 20);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");

    let summary = dispatcher
        .run(&["DevOps", "astronaut"], &CancellationToken::new())
        .await;

    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(summary.stored, 2);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(count_postings(&storage), 2);

    let guard = storage.lock().unwrap();
    let run = guard.get_latest_run().unwrap().unwrap();
    assert_eq!(run.roles, vec!["devops".to_string()]);
    assert_eq!(run.stored_count, 2);

    let skills = guard
        .top_values(TrendField::Skills, None, 10)
        .unwrap();
    let names: Vec<&str> = skills.iter().map(|s| s.value.as_str()).collect();
    assert_eq!(names, vec!["docker", "terraform"]);

    let experience = guard
        .top_values(TrendField::Experience, None, 10)
        .unwrap();
    assert_eq!(experience[0].value, "4 years");
    assert_eq!(experience[0].count, 2);
}

#[tokio::test]
async fn test_job_cap_stops_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for i in 0..5 {
        // Only the first three jobs may be fetched with a cap of 3
        let expected = if i < 3 { 1 } else { 0 };
        mount_job(&mock_server, &format!("job-{}", i), expected).await;
    }

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&base_url, 3, 5, 20);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");

    let frontier = Frontier::new(10);
    for i in 0..5 {
        assert!(
            frontier
                .add(CrawlTask::job(format!("{}/listings/job-{}", base_url, i)))
                .await
        );
    }

    let summary = dispatcher.drain(&frontier, &CancellationToken::new()).await;

    assert_eq!(summary.stop_reason, StopReason::JobCapReached);
    assert_eq!(summary.stored, 3);
    assert_eq!(frontier.queue_size(), 2);
    assert_eq!(count_postings(&storage), 3);
}

#[tokio::test]
async fn test_cap_reached_on_last_task_reports_cap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_job(&mock_server, "job-a", 1).await;
    mount_job(&mock_server, "job-b", 1).await;

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&base_url, 2, 5, 20);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");

    let frontier = Frontier::new(10);
    for slug in ["job-a", "job-b"] {
        frontier
            .add(CrawlTask::job(format!("{}/listings/{}", base_url, slug)))
            .await;
    }

    let summary = dispatcher.drain(&frontier, &CancellationToken::new()).await;

    assert_eq!(summary.stop_reason, StopReason::JobCapReached);
    assert_eq!(summary.stored, 2);
    assert_eq!(frontier.queue_size(), 0);
}

#[tokio::test]
async fn test_discoveries_beyond_capacity_are_dropped_then_readmitted() {
    let mock_server = MockServer::start().await;

    // With room for two tasks, j2 cannot be enqueued while the backend
    // listing and j1 are pending; the devops listing times out waiting
    Mock::given(method("GET"))
        .and(path("/remote-jobs/search"))
        .and(query_param("term", "devops"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["j1", "j2"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/remote-jobs/search"))
        .and(query_param("term", "backend"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["j2"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_job(&mock_server, "j1", 1).await;
    mount_job(&mock_server, "j2", 1).await;

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&mock_server.uri(), 10, 1, 2);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");

    let summary = dispatcher
        .run(&["devops", "backend"], &CancellationToken::new())
        .await;

    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.stored, 2);
    assert_eq!(count_postings(&storage), 2);
}

#[tokio::test]
async fn test_unmatched_and_failing_tasks_do_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/listings/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/listings/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_job(&mock_server, "good", 1).await;

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&base_url, 10, 5, 20);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");

    let frontier = Frontier::new(10);
    frontier
        .add(CrawlTask::job("https://unrelated.example.org/listings/x"))
        .await;
    frontier
        .add(CrawlTask::job(format!("{}/listings/gone", base_url)))
        .await;
    frontier
        .add(CrawlTask::job(format!("{}/listings/broken", base_url)))
        .await;
    frontier
        .add(CrawlTask::job(format!("{}/listings/good", base_url)))
        .await;

    let summary = dispatcher.drain(&frontier, &CancellationToken::new()).await;

    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.stored, 1);
    assert_eq!(count_postings(&storage), 1);
}

#[tokio::test]
async fn test_slow_job_times_out_and_crawl_continues() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/listings/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(job_page("slow engineer", "slow inc", &[]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    mount_job(&mock_server, "fast", 1).await;

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&base_url, 10, 1, 20);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");

    let frontier = Frontier::new(10);
    frontier
        .add(CrawlTask::job(format!("{}/listings/slow", base_url)))
        .await;
    frontier
        .add(CrawlTask::job(format!("{}/listings/fast", base_url)))
        .await;

    let started = std::time::Instant::now();
    let summary = dispatcher.drain(&frontier, &CancellationToken::new()).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.stored, 1);
}

#[tokio::test]
async fn test_trigger_runs_crawl_in_background() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/remote-jobs/search"))
        .and(query_param("term", "backend"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["initech-api"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_job(&mock_server, "initech-api", 1).await;

    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir);
    let config = create_test_config(&mock_server.uri(), 10, 5, 20);
    let dispatcher = Dispatcher::from_config(&config, "hash", storage.clone())
        .expect("Failed to create dispatcher");
    let trigger = CrawlTrigger::new(dispatcher);

    assert!(matches!(
        trigger.submit(&["astronaut"]),
        Err(CrawlError::NoValidRoles)
    ));

    let handle = trigger.submit(&["backend"]).expect("Failed to submit crawl");
    assert_eq!(handle.roles(), ["backend".to_string()]);

    let summary = handle.wait().await.expect("Crawl task failed");
    assert_eq!(summary.stored, 1);
    assert_eq!(count_postings(&storage), 1);
}
