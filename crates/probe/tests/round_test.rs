//! End-to-end rounds against local HTTP servers

use probe::client::{ClientConfig, build_client};
use probe::{HttpProber, MetricsStore, Scheduler, Target, TargetRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("probe=debug")
        .with_test_writer()
        .try_init();
}

fn scheduler(urls: &[String], timeout: Duration, store: Arc<MetricsStore>) -> Scheduler {
    let client = build_client(&ClientConfig::default(), timeout).unwrap();
    let registry: TargetRegistry = urls.iter().map(|u| Target::from(u.as_str())).collect();
    Scheduler::new(
        registry,
        Arc::new(HttpProber::new(client, timeout)),
        store,
        Duration::from_secs(1),
    )
}

#[tokio::test]
async fn test_round_against_healthy_and_hanging_targets() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(10)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let fast = format!("{}/fast", server.uri());
    let slow = format!("{}/slow", server.uri());
    let store = Arc::new(MetricsStore::new());
    let scheduler = scheduler(
        &[fast.clone(), slow.clone()],
        Duration::from_millis(500),
        store.clone(),
    );

    let round_start = SystemTime::now();
    let start = Instant::now();
    let summary = scheduler.run_round().await;
    let round_end = SystemTime::now();

    // Bounded by the probe timeout, not the 5s response delay
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(summary.up, 1);
    assert_eq!(summary.down, 1);

    let fast_state = store.get(&fast).unwrap();
    assert!(fast_state.up);
    assert_eq!(fast_state.active_code, Some(200));
    assert!(fast_state.latency_ms.unwrap() >= 10);
    let last_success = fast_state.last_success.unwrap();
    assert!(last_success >= round_start && last_success <= round_end);

    let slow_state = store.get(&slow).unwrap();
    assert!(!slow_state.up);
    assert_eq!(slow_state.errors_total, 1);
    assert_eq!(slow_state.active_code, None);
}

#[tokio::test]
async fn test_many_failing_targets_finish_within_timeout() {
    init_logging();

    // Unroutable and refused targets fail together in one bounded round
    let urls: Vec<String> = (0..20)
        .map(|i| format!("http://127.0.0.1:1/{}", i))
        .chain(["not a url".to_string(), "http://10.255.255.1:81/".to_string()])
        .collect();
    let store = Arc::new(MetricsStore::new());
    let scheduler = scheduler(&urls, Duration::from_millis(300), store.clone());

    let start = Instant::now();
    let summary = scheduler.run_round().await;

    assert!(start.elapsed() < Duration::from_millis(1500));
    assert_eq!(summary.down, urls.len());

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), urls.len());
    assert!(
        snapshot
            .targets
            .iter()
            .all(|(_, s)| !s.up && s.errors_total == 1)
    );
}

#[tokio::test]
async fn test_status_code_changes_between_rounds() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(302))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let store = Arc::new(MetricsStore::new());
    let scheduler = scheduler(&[url.clone()], Duration::from_secs(2), store.clone());

    scheduler.run_round().await;
    let first = store.get(&url).unwrap();
    assert_eq!(first.active_code, Some(302));
    assert!(first.last_success.is_some());

    scheduler.run_round().await;
    let second = store.get(&url).unwrap();

    assert!(second.up);
    assert_eq!(second.active_code, Some(500));
    assert_eq!(second.errors_total, 0);
    // A 5xx response does not count as a success
    assert_eq!(second.last_success, first.last_success);
}
