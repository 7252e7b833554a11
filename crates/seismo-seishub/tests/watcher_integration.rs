//! End-to-end watcher behavior against a mocked SEISHUB archive.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use seismo_core::{Watcher, WatcherConfig, WatcherState, WatcherVariant};
use seismo_seishub::SeishubWatcher;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn msg_body(event_id: &str, focus_time: &str, lat: &str, long: &str) -> String {
    format!(
        "EVENT PUBLIC ID: {event_id}\n\
         ВРЕМЯ В ОЧАГЕ (UTC): {focus_time}\n\
         ШИРОТА: {lat}\n\
         ДОЛГОТА: {long}\n\
         МАГНИТУДА: 2.1\n\
         ТИП СОБЫТИЯ: earthquake\n\
         ОЦЕНКА КАЧЕСТВА РЕШЕНИЯ: хорошо\n"
    )
}

fn config(id: &str, base: &str) -> WatcherConfig {
    WatcherConfig {
        id: id.to_owned(),
        variant: WatcherVariant::Seishub,
        conn_str: format!("{base}/"),
        timeout: 5,
        check_period: 1,
    }
}

#[tokio::test]
async fn watcher_resumes_and_emits_new_messages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2022-February"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<a href="017538.html">017538.html</a>"#),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2022-February/017538.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(msg_body(
            "ev-1",
            "2022.02.01 05:55:10",
            "54.1",
            "83.0",
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2022-February/017539.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(msg_body(
            "ev-2",
            "2022.02.01 06:10:00",
            "54.2",
            "83.1",
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2022-February/017540.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2022-March/017540.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let watcher = SeishubWatcher::new(config("seishub-test", &server.uri()));
    let cancel = CancellationToken::new();
    let from = Utc.with_ymd_and_hms(2022, 2, 1, 5, 55, 10).unwrap();

    let mut stream = watcher.start_watch(cancel.clone(), from).await.unwrap();
    assert_eq!(watcher.state_info().await, WatcherState::Running);

    let first = tokio::time::timeout(Duration::from_secs(5), stream.recv())
        .await
        .expect("first message within timeout")
        .expect("stream not closed");
    assert_eq!(first.event_id, "ev-1");
    assert_eq!(first.source_id, "seishub-test");

    let second = tokio::time::timeout(Duration::from_secs(5), stream.recv())
        .await
        .expect("second message within timeout")
        .expect("stream not closed");
    assert_eq!(second.event_id, "ev-2");

    cancel.cancel();
    let closed = tokio::time::timeout(Duration::from_secs(5), stream.recv())
        .await
        .expect("stream closes after cancellation");
    assert!(closed.is_none());
}

#[tokio::test]
async fn start_watch_rejects_a_from_in_the_future() {
    let server = MockServer::start().await;
    let watcher = SeishubWatcher::new(config("seishub-future", &server.uri()));
    let from = Utc::now() + chrono::Duration::days(1);

    let result = watcher.start_watch(CancellationToken::new(), from).await;
    assert!(matches!(
        result,
        Err(seismo_core::StartWatchError::FromInFuture { .. })
    ));
}

#[tokio::test]
async fn start_watch_twice_returns_already_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2022-February"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let watcher = SeishubWatcher::new(config("seishub-dup", &server.uri()));
    let from = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();

    let _stream = watcher
        .start_watch(CancellationToken::new(), from)
        .await
        .unwrap();
    let second = watcher.start_watch(CancellationToken::new(), from).await;
    assert!(matches!(
        second,
        Err(seismo_core::StartWatchError::AlreadyRunning(_))
    ));
}
