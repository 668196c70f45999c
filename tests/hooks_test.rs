//! Lifecycle hooks running under a group.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use server_group::{Group, LifecycleHooks, LifecycleLayer, Server, ServerError};
use tower::Layer;

mod common;

use common::{messages, EventLog, TestServer};

fn recording_hooks(log: &EventLog) -> LifecycleHooks {
    let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
    let describe = |err: Option<&ServerError>| err.map(|e| e.to_string()).unwrap_or_else(|| "ok".into());

    LifecycleHooks::new()
        .before_serve(move || a.push("before_serve"))
        .after_serve(move |err| b.push(format!("after_serve: {}", describe(err))))
        .before_shutdown(move || c.push("before_shutdown"))
        .after_shutdown(move |err| d.push(format!("after_shutdown: {}", describe(err))))
}

#[tokio::test(start_paused = true)]
async fn test_hooks_observe_every_transition_in_order() {
    let log = EventLog::new();
    let inner = TestServer::new("a", &log)
        .serve_for(Duration::ZERO)
        .serve_error("serve error")
        .shutdown_error("shutdown error");
    let server: Arc<dyn Server> = Arc::new(LifecycleLayer::new(recording_hooks(&log)).layer(inner));

    let errors = Group::new().run_until(vec![server], pending()).await;

    assert_eq!(messages(&errors), vec!["serve error", "shutdown error"]);
    assert_eq!(
        log.events(),
        vec![
            "before_serve",
            "serve a",
            "served a",
            "after_serve: serve error",
            "before_shutdown",
            "shutdown a",
            "after_shutdown: shutdown error",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_hooks_do_not_change_clean_results() {
    let log = EventLog::new();
    let inner = Arc::new(TestServer::new("a", &log));
    let wrapped: Arc<dyn Server> = Arc::new(recording_hooks(&log).wrap(inner.clone()));
    let trigger: Arc<dyn Server> = Arc::new(TestServer::new("trigger", &log).serve_for(Duration::from_millis(1)));

    let errors = Group::new().run_until(vec![wrapped, trigger], pending()).await;

    assert!(errors.is_empty());
    assert_eq!(inner.serve_calls(), 1);
    assert_eq!(inner.shutdown_calls(), 1);

    let events = log.events();
    assert!(events.contains(&"after_serve: ok".to_string()));
    assert!(events.contains(&"after_shutdown: ok".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_partial_hooks() {
    let log = EventLog::new();
    let seen = log.clone();
    let hooks = LifecycleHooks::new().after_shutdown(move |_| seen.push("after_shutdown"));
    let server: Arc<dyn Server> = Arc::new(hooks.wrap(TestServer::new("a", &log).serve_for(Duration::ZERO)));

    let errors = Group::new().run_until(vec![server], pending()).await;

    assert!(errors.is_empty());
    assert_eq!(log.events().last().map(String::as_str), Some("after_shutdown"));
}
