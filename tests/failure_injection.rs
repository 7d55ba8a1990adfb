//! Failure injection: real HTTP providers misbehaving behind `call_with_fallback`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use provider_rotation::adapter::{call_with_fallback, AdapterSet, HttpAdapter, InvokeError};
use provider_rotation::{EndpointStatus, ProviderError, RotationEngine};
use serde_json::json;

mod common;

fn http_adapters() -> AdapterSet {
    AdapterSet::uniform(Arc::new(HttpAdapter::new(Duration::from_secs(5)).unwrap()))
}

#[tokio::test]
async fn test_http_failures_fall_through_tiers() {
    let broken = common::start_programmable_backend(|| async { (503, vec![], "{}".to_string()) }).await;
    let limited = common::start_programmable_backend(|| async {
        (429, vec![("Retry-After", "120".to_string())], "{}".to_string())
    })
    .await;
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let healthy = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, vec![], r#"{"results":["ok"]}"#.to_string())
        }
    })
    .await;

    let mut config = common::config(
        &[("jina", vec!["jina_1"]), ("exa", vec!["exa_1"]), ("serper", vec!["serper_1"])],
        &[("search", vec![vec!["jina"], vec!["exa"], vec!["serper"]])],
    );
    config.endpoints[0].base_url = Some(format!("http://{}/", broken).parse().unwrap());
    config.endpoints[1].base_url = Some(format!("http://{}/", limited).parse().unwrap());
    config.endpoints[2].base_url = Some(format!("http://{}/", healthy).parse().unwrap());
    let (engine, _scheduler) = RotationEngine::from_config(&config).unwrap();

    let done = call_with_fallback(&engine, &http_adapters(), "search", &json!({"q": "rust"}))
        .await
        .unwrap();
    assert_eq!(done.endpoint.name, "serper_1");
    assert_eq!(done.attempts, 3);
    assert_eq!(done.response["results"][0], "ok");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let report = engine.snapshot();
    assert_eq!(report.endpoint("jina", "jina_1").unwrap().status, EndpointStatus::Error);
    assert_eq!(report.endpoint("exa", "exa_1").unwrap().status, EndpointStatus::RateLimited);

    // Failed tiers stay out of the way for the next call
    let again = call_with_fallback(&engine, &http_adapters(), "search", &json!({})).await.unwrap();
    assert_eq!(again.endpoint.name, "serper_1");
    assert_eq!(again.attempts, 1);
}

#[tokio::test]
async fn test_sibling_takes_over_after_failure() {
    let failing = Arc::new(AtomicU32::new(0));
    let count = failing.clone();
    let flaky = common::start_programmable_backend(move || {
        let count = count.clone();
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            (500, vec![], "{}".to_string())
        }
    })
    .await;
    let steady = common::start_programmable_backend(|| async { (200, vec![], "{}".to_string()) }).await;

    let mut config = common::config(
        &[("gemini", vec!["gemini_1", "gemini_2"])],
        &[("ai_models", vec![vec!["gemini"]])],
    );
    config.endpoints[0].base_url = Some(format!("http://{}/", flaky).parse().unwrap());
    config.endpoints[1].base_url = Some(format!("http://{}/", steady).parse().unwrap());
    let (engine, _scheduler) = RotationEngine::from_config(&config).unwrap();

    // Single-tier chain: the failure exhausts this call
    let err = call_with_fallback(&engine, &http_adapters(), "ai_models", &json!({})).await.unwrap_err();
    match err {
        InvokeError::Exhausted { attempts, last_error, .. } => {
            assert_eq!(attempts, 1);
            assert_eq!(last_error, ProviderError::Failed("HTTP 500 Internal Server Error".into()));
        }
        other => panic!("unexpected {:?}", other),
    }

    // ...but the cursor already moved to the healthy sibling
    let done = call_with_fallback(&engine, &http_adapters(), "ai_models", &json!({})).await.unwrap();
    assert_eq!(done.endpoint.name, "gemini_2");
    assert_eq!(failing.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scripted_adapter_reports_back() {
    let (engine, _scheduler) = common::engine(
        &[("qwen", vec!["qwen_1"]), ("openai", vec!["openai_1"])],
        &[("ai_generation", vec![vec!["qwen"], vec!["openai"]])],
    );
    let scripted = Arc::new(common::ScriptedAdapter::new());
    scripted.script("qwen_1", Err(ProviderError::RateLimited { retry_after: Some(Duration::from_secs(30)) }));
    let adapters = AdapterSet::uniform(scripted.clone());

    let done = call_with_fallback(&engine, &adapters, "ai_generation", &json!({})).await.unwrap();
    assert_eq!(done.endpoint.name, "openai_1");
    assert_eq!(scripted.calls(), vec!["qwen_1", "openai_1"]);
    assert_eq!(engine.is_available("qwen", "qwen_1"), Some(false));
}

#[tokio::test]
async fn test_absurd_retry_after_is_survived() {
    let limited = common::start_programmable_backend(|| async {
        (429, vec![("Retry-After", u64::MAX.to_string())], "{}".to_string())
    })
    .await;
    let healthy = common::start_programmable_backend(|| async { (200, vec![], r#"{"ok":true}"#.to_string()) }).await;

    let mut config = common::config(
        &[("exa", vec!["exa_1"]), ("tavily", vec!["tavily_1"])],
        &[("search", vec![vec!["exa"], vec!["tavily"]])],
    );
    config.endpoints[0].base_url = Some(format!("http://{}/", limited).parse().unwrap());
    config.endpoints[1].base_url = Some(format!("http://{}/", healthy).parse().unwrap());
    let (engine, _scheduler) = RotationEngine::from_config(&config).unwrap();

    let done = call_with_fallback(&engine, &http_adapters(), "search", &json!({})).await.unwrap();
    assert_eq!(done.endpoint.name, "tavily_1");
    assert_eq!(done.attempts, 2);
    assert_eq!(engine.snapshot().endpoint("exa", "exa_1").unwrap().status, EndpointStatus::RateLimited);

    // Adapters that skip the HTTP cap still cannot overflow the deadline
    let scripted = Arc::new(common::ScriptedAdapter::new());
    scripted.script("tavily_1", Err(ProviderError::RateLimited { retry_after: Some(Duration::MAX) }));
    let err = call_with_fallback(&engine, &AdapterSet::uniform(scripted), "search", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Exhausted { attempts: 1, .. }));
    assert_eq!(engine.is_available("tavily", "tavily_1"), Some(false));
}
