//! Integration test: a Bot API that accepts connections and never answers.
//! Every call gives up after the request timeout, so neither the reply path,
//! the redirect path, startup nor shutdown can hang on it.

mod support;

use fileshare::channels::{AttachmentRef, TelegramChannel};
use fileshare::gateway;
use fileshare::relay::{FileResolver, PathResolver, ReplyEmitter, ResolveError};
use std::sync::Arc;
use std::time::Duration;
use support::{free_port, settings, spawn_silent_backend, TOKEN};

const BOUND: Duration = Duration::from_secs(10);

#[tokio::test]
async fn send_message_times_out() {
    let base = spawn_silent_backend().await;
    let settings = settings(&base, 0);
    let emitter = ReplyEmitter::new(Arc::new(TelegramChannel::new(&settings)), &settings);
    let attachment = AttachmentRef {
        file_id: "abc123".into(),
        conversation_id: 42,
        message_id: 7,
    };
    let res = tokio::time::timeout(BOUND, emitter.emit_link(&attachment))
        .await
        .expect("sendMessage still pending");
    assert!(res.is_err());
}

#[tokio::test]
async fn get_file_times_out_as_transport_error() {
    let base = spawn_silent_backend().await;
    let settings = settings(&base, 0);
    let resolver = FileResolver::new(Arc::new(TelegramChannel::new(&settings)), &settings);
    let err = tokio::time::timeout(BOUND, resolver.resolve("abc123"))
        .await
        .expect("getFile still pending")
        .unwrap_err();
    assert!(matches!(err, ResolveError::Transport(_)), "got {:?}", err);
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn get_me_times_out() {
    let base = spawn_silent_backend().await;
    let telegram = TelegramChannel::new(&settings(&base, 0));
    let res = tokio::time::timeout(BOUND, telegram.get_me())
        .await
        .expect("getMe still pending");
    assert!(res.is_err());
}

#[tokio::test]
async fn relay_starts_and_stops_against_silent_backend() {
    let base = spawn_silent_backend().await;
    let relay = gateway::run_relay_until(settings(&base, free_port()), async {
        tokio::time::sleep(Duration::from_millis(1500)).await;
    });
    tokio::time::timeout(BOUND, relay)
        .await
        .expect("relay did not stop")
        .unwrap();
}
