use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracker_engine::{
    ClientSettings, EngineEvent, EventSink, PollHandle, PollOrigin, PollSlot, ReqwestTaskApi,
    TaskApi,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACTIVE_PATH: &str = "/api/tiktok/tasks/active";

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn api_for(server: &MockServer) -> Arc<dyn TaskApi> {
    let settings = ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    };
    Arc::new(ReqwestTaskApi::new(&settings).expect("client"))
}

async fn mount_active(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(ACTIVE_PATH))
        .respond_with(template)
        .mount(server)
        .await;
}

fn busy() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": [{"id": 1, "type": "run_all", "keyword": null, "status": "running"}]
    }))
}

async fn active_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == ACTIVE_PATH)
        .count()
}

#[tokio::test]
async fn ensure_running_twice_keeps_one_timer() {
    let server = MockServer::start().await;
    mount_active(&server, busy()).await;
    let api = api_for(&server);
    let sink: Arc<TestSink> = Arc::new(TestSink::default());

    let mut slot = PollSlot::new();
    assert!(slot.ensure_running(api.clone(), Duration::from_millis(100), sink.clone()));
    assert!(!slot.ensure_running(api.clone(), Duration::from_millis(100), sink.clone()));
    assert!(slot.is_running());

    tokio::time::sleep(Duration::from_millis(250)).await;
    slot.stop();

    // Ticks at 0, 100 and 200 ms: two timers would have doubled this.
    let calls = active_requests(&server).await;
    assert!((2..=3).contains(&calls), "saw {calls} poll requests");
}

#[tokio::test]
async fn empty_list_ends_the_loop() {
    let server = MockServer::start().await;
    mount_active(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
    )
    .await;
    let sink: Arc<TestSink> = Arc::new(TestSink::default());

    let handle = PollHandle::start(api_for(&server), Duration::from_millis(40), sink.clone());
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(!handle.is_active());
    assert_eq!(active_requests(&server).await, 1);
    let events = sink.take();
    assert_eq!(
        events,
        vec![EngineEvent::ActiveTasks {
            origin: PollOrigin::Timer { tick: 1 },
            result: Ok(Vec::new()),
        }]
    );
}

#[tokio::test]
async fn failed_polls_are_retried() {
    let server = MockServer::start().await;
    mount_active(&server, ResponseTemplate::new(500)).await;
    let sink: Arc<TestSink> = Arc::new(TestSink::default());

    let handle = PollHandle::start(api_for(&server), Duration::from_millis(40), sink.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(handle.is_active());
    handle.cancel();
    let failures = sink
        .take()
        .into_iter()
        .filter(|event| matches!(event, EngineEvent::ActiveTasks { result: Err(_), .. }))
        .count();
    assert!(failures >= 2, "expected retries, saw {failures}");
}

#[tokio::test]
async fn dropping_the_handle_stops_requests() {
    let server = MockServer::start().await;
    mount_active(&server, busy()).await;
    let sink: Arc<TestSink> = Arc::new(TestSink::default());

    let handle = PollHandle::start(api_for(&server), Duration::from_millis(30), sink.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(handle);
    // Let an in-flight request settle before sampling.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let after_drop = active_requests(&server).await;
    let events_after_drop = sink.take().len();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(active_requests(&server).await, after_drop);
    assert!(sink.take().is_empty());
    assert!(events_after_drop >= 1);
}

#[tokio::test]
async fn slot_restarts_after_quiescence() {
    let server = MockServer::start().await;
    mount_active(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
    )
    .await;
    let api = api_for(&server);
    let sink: Arc<TestSink> = Arc::new(TestSink::default());

    let mut slot = PollSlot::new();
    assert!(slot.ensure_running(api.clone(), Duration::from_millis(30), sink.clone()));
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!slot.is_running());

    assert!(slot.ensure_running(api, Duration::from_millis(30), sink.clone()));
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(active_requests(&server).await, 2);
}
