use media_ferry_client::channels::{ClipboardError, ClipboardSink, EncodedImage};
use media_ferry_client::config::Config;
use media_ferry_client::feedback::{
    Notification, NotificationId, NotificationKind, NotificationSink,
};
use media_ferry_client::session::Session;
use media_ferry_host::{COMMAND_QUEUE_DEPTH, Command, Dispatcher, read_commands};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoClipboard;

impl ClipboardSink for NoClipboard {
    fn write_image(&self, _image: &EncodedImage) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable("headless".into()))
    }

    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable("headless".into()))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[derive(Default)]
struct Shown(Mutex<Vec<NotificationKind>>);

impl NotificationSink for Shown {
    fn show(&self, notification: Notification) -> NotificationId {
        let mut shown = self.0.lock().unwrap();
        shown.push(notification.kind);
        shown.len() as NotificationId
    }
}

async fn companion() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/copy-image"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/paste-url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
        )
        .mount(&server)
        .await;
    server
}

fn replies(out: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn script_runs_in_order_and_stops_at_quit() {
    let server = companion().await;
    let dir = tempfile::tempdir().unwrap();
    let shown = Arc::new(Shown::default());
    let session = Session::start_with(
        Config::with_download_dir(&server.uri(), dir.path()),
        Arc::new(NoClipboard),
        shown.clone(),
    )
    .unwrap();
    session.orchestrator().prober().probe().await;

    let script: &[u8] = b"replay\n\
        image https://cdn.example.com/a.png\n\
        video https://example.com/not-a-video\n\
        bogus line\n\
        video https://www.youtube.com/watch?v=dQw4w9WgXcQ\n\
        replay\n\
        recent\n\
        status\n\
        quit\n\
        image https://cdn.example.com/never.png\n";

    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let reader = tokio::spawn(read_commands(script, tx));
    let dispatcher = Dispatcher::new(session.orchestrator(), server.uri());
    let mut out = Vec::new();
    dispatcher.run(rx, &mut out).await.unwrap();
    reader.await.unwrap().unwrap();

    let replies = replies(&out);
    let tags: Vec<&str> = replies.iter().map(|r| r["reply"].as_str().unwrap()).collect();
    assert_eq!(
        tags,
        vec![
            "error", "delivery", "rejected", "delivery", "delivery", "recent", "status", "bye"
        ]
    );
    assert_eq!(replies[0]["message"], "Nothing to replay yet");
    assert_eq!(replies[1]["success"], true);
    assert_eq!(replies[1]["outcomes"][0]["channel"], "remote_service");
    assert_eq!(replies[2]["reason"], "not_a_video_link");
    // Replay picks the most recent item: the video link.
    assert_eq!(replies[4]["kind"], "video_link");
    assert_eq!(replies[5]["items"].as_array().unwrap().len(), 3);
    assert_eq!(replies[6]["liveness"]["reachable"], true);

    assert_eq!(
        *shown.0.lock().unwrap(),
        vec![
            NotificationKind::Ready,
            NotificationKind::Rejected,
            NotificationKind::Ready,
            NotificationKind::Ready
        ]
    );
    session.shutdown().await;
}

#[tokio::test]
async fn closed_queue_ends_dispatcher() {
    let server = companion().await;
    let dir = tempfile::tempdir().unwrap();
    let session = Session::start_with(
        Config::with_download_dir(&server.uri(), dir.path()),
        Arc::new(NoClipboard),
        Arc::new(Shown::default()),
    )
    .unwrap();

    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    tx.send(Command::Recent).await.unwrap();
    drop(tx);
    let mut out = Vec::new();
    Dispatcher::new(session.orchestrator(), server.uri())
        .run(rx, &mut out)
        .await
        .unwrap();
    let replies = replies(&out);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["items"], serde_json::json!([]));
    session.shutdown().await;
}
