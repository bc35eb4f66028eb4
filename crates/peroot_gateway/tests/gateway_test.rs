//! Tests for ordered fallback dispatch.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use peroot_core::{
    Availability, BackendDescriptor, Completion, Credentials, GenerationRequest, Invocation,
    ProviderFamily, StreamChunk, TextStream, TokenUsage,
};
use peroot_error::{
    BackendError, BackendErrorKind, ConfigError, ExhaustionCause, GatewayErrorKind,
};
use peroot_gateway::{BackendCatalog, FallbackOrder, Gateway};
use peroot_interface::BackendInvoker;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the mock does when a backend is invoked.
#[derive(Clone)]
enum Script {
    Succeed(Vec<&'static str>),
    Fail(BackendErrorKind),
    BreakMidStream,
}

/// Invoker that records every call and replays a script per backend id.
#[derive(Default)]
struct MockInvoker {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
    temperatures: Mutex<Vec<f32>>,
}

impl MockInvoker {
    fn with(mut self, id: &str, script: Script) -> Self {
        self.scripts.insert(id.to_string(), script);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendInvoker for MockInvoker {
    async fn invoke(
        &self,
        backend: &BackendDescriptor,
        invocation: Invocation<'_>,
    ) -> Result<TextStream, BackendError> {
        let id = backend.id().to_string();
        self.calls.lock().unwrap().push(id.clone());
        self.temperatures.lock().unwrap().push(invocation.temperature);

        match self.scripts.get(&id).cloned() {
            Some(Script::Succeed(parts)) => {
                let mut chunks: Vec<Result<StreamChunk, BackendError>> =
                    parts.into_iter().map(|p| Ok(StreamChunk::text(p))).collect();
                chunks.push(Ok(StreamChunk::usage(TokenUsage {
                    prompt_tokens: 4,
                    completion_tokens: 2,
                    total_tokens: 6,
                })));
                Ok(Box::pin(stream::iter(chunks)))
            }
            Some(Script::Fail(kind)) => Err(BackendError::new(id, kind)),
            Some(Script::BreakMidStream) => Ok(Box::pin(stream::iter(vec![
                Ok(StreamChunk::text("partial")),
                Err(BackendError::new(
                    id,
                    BackendErrorKind::StreamInterrupted("connection reset".into()),
                )),
            ]))),
            None => Err(BackendError::new(
                id,
                BackendErrorKind::Transport("unscripted".into()),
            )),
        }
    }
}

/// A on Google, B on Groq, C on DeepSeek.
fn catalog() -> BackendCatalog {
    BackendCatalog::new(vec![
        BackendDescriptor::new("a", "A", ProviderFamily::Google, "model-a", 1000),
        BackendDescriptor::new("b", "B", ProviderFamily::Groq, "model-b", 1000),
        BackendDescriptor::new("c", "C", ProviderFamily::DeepSeek, "model-c", 1000),
    ])
    .unwrap()
}

fn all_credentials() -> Credentials {
    Credentials::default()
        .with_key(ProviderFamily::Google, "g")
        .with_key(ProviderFamily::Groq, "q")
        .with_key(ProviderFamily::DeepSeek, "d")
}

fn gateway(invoker: Arc<MockInvoker>, credentials: Credentials) -> Gateway {
    Gateway::new(
        catalog(),
        FallbackOrder::new(["a", "b", "c"]).unwrap(),
        credentials,
        invoker,
    )
}

fn request() -> GenerationRequest {
    GenerationRequest::new("You improve prompts.", "make it better")
}

#[tokio::test]
async fn test_first_available_backend_serves() -> anyhow::Result<()> {
    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::Succeed(vec!["Hello", " world"]))
            .with("b", Script::Succeed(vec!["never"])),
    );
    let gateway = gateway(invoker.clone(), all_credentials());

    let outcome = gateway.dispatch(&request()).await?;

    assert_eq!(outcome.backend().as_str(), "a");
    assert_eq!(outcome.attempted(), 1);
    assert_eq!(outcome.skipped(), 0);
    assert_eq!(outcome.collect_text().await?, "Hello world");
    assert_eq!(invoker.calls(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn test_falls_back_until_success() -> anyhow::Result<()> {
    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::Fail(BackendErrorKind::Timeout("30s".into())))
            .with(
                "b",
                Script::Fail(BackendErrorKind::UpstreamRateLimited("429".into())),
            )
            .with("c", Script::Succeed(vec!["ok"])),
    );
    let gateway = gateway(invoker.clone(), all_credentials());

    let outcome = gateway.dispatch(&request()).await?;

    assert_eq!(outcome.backend().as_str(), "c");
    assert_eq!(outcome.attempted(), 3);
    assert_eq!(invoker.calls(), vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_all_unavailable_invokes_nothing() {
    let invoker = Arc::new(MockInvoker::default().with("a", Script::Succeed(vec!["x"])));
    let gateway = gateway(invoker.clone(), Credentials::default());

    let err = gateway.dispatch(&request()).await.unwrap_err();

    assert!(invoker.calls().is_empty());
    assert_eq!(
        err.kind().exhaustion_cause(),
        Some(ExhaustionCause::NoBackendAvailable)
    );
    assert!(err.last_error().is_none());
    match err.kind() {
        GatewayErrorKind::AllBackendsExhausted {
            attempted,
            unavailable,
            ..
        } => {
            assert_eq!(*attempted, 0);
            let skipped: Vec<_> = unavailable.iter().map(|u| u.backend.as_str()).collect();
            assert_eq!(skipped, ["a", "b", "c"]);
            assert!(unavailable[1].reason.contains("GROQ_API_KEY"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_all_fail_carries_last_error() {
    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::Fail(BackendErrorKind::Timeout("30s".into())))
            .with("b", Script::Fail(BackendErrorKind::Unauthorized("bad key".into())))
            .with(
                "c",
                Script::Fail(BackendErrorKind::MalformedResponse("not json".into())),
            ),
    );
    let gateway = gateway(invoker.clone(), all_credentials());

    let err = gateway.dispatch(&request()).await.unwrap_err();

    assert_eq!(invoker.calls(), vec!["a", "b", "c"]);
    assert_eq!(
        err.kind().exhaustion_cause(),
        Some(ExhaustionCause::AllBackendsFailed)
    );
    let last = err.last_error().unwrap();
    assert_eq!(last.backend(), "c");
    assert_eq!(last.kind().label(), "malformed");
}

#[tokio::test]
async fn test_failure_then_skip_then_success() -> anyhow::Result<()> {
    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::Fail(BackendErrorKind::Timeout("30s".into())))
            .with("b", Script::Succeed(vec!["never"]))
            .with("c", Script::Succeed(vec!["from c"])),
    );
    let credentials = Credentials::default()
        .with_key(ProviderFamily::Google, "g")
        .with_key(ProviderFamily::DeepSeek, "d");
    let gateway = gateway(invoker.clone(), credentials);

    let outcome = gateway.dispatch(&request()).await?;

    assert_eq!(outcome.backend().as_str(), "c");
    assert_eq!(outcome.attempted(), 2);
    assert_eq!(outcome.skipped(), 1);
    assert_eq!(invoker.calls(), vec!["a", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_unresolved_id_is_skipped() -> anyhow::Result<()> {
    let invoker = Arc::new(MockInvoker::default().with("c", Script::Succeed(vec!["ok"])));
    let gateway = Gateway::new(
        catalog(),
        FallbackOrder::new(["retired-model", "c"])?,
        all_credentials(),
        invoker.clone(),
    );

    let outcome = gateway.dispatch(&request()).await?;

    assert_eq!(outcome.backend().as_str(), "c");
    assert_eq!(outcome.attempted(), 1);
    assert_eq!(outcome.skipped(), 1);
    assert_eq!(invoker.calls(), vec!["c"]);
    Ok(())
}

#[tokio::test]
async fn test_availability_is_evaluated_per_dispatch() -> anyhow::Result<()> {
    fn disabled(_: &BackendDescriptor, _: &Credentials) -> Availability {
        Availability::Disabled("maintenance".into())
    }

    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::Succeed(vec!["a"]))
            .with("b", Script::Succeed(vec!["b"])),
    );
    let catalog = BackendCatalog::new(vec![
        BackendDescriptor::new("a", "A", ProviderFamily::Google, "model-a", 1000)
            .with_availability_check(disabled),
        BackendDescriptor::new("b", "B", ProviderFamily::Groq, "model-b", 1000),
    ])?;
    let gateway = Gateway::new(
        catalog,
        FallbackOrder::new(["a", "b"])?,
        all_credentials(),
        invoker.clone(),
    );

    let outcome = gateway.dispatch(&request()).await?;

    assert_eq!(outcome.backend().as_str(), "b");
    assert_eq!(invoker.calls(), vec!["b"]);
    Ok(())
}

#[tokio::test]
async fn test_cancellation_stops_fallback() {
    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::Fail(BackendErrorKind::Cancelled))
            .with("b", Script::Succeed(vec!["never"])),
    );
    let gateway = gateway(invoker.clone(), all_credentials());

    let err = gateway.dispatch(&request()).await.unwrap_err();

    assert!(matches!(err.kind(), GatewayErrorKind::Cancelled(_)));
    assert_eq!(err.kind().exhaustion_cause(), None);
    assert_eq!(invoker.calls(), vec!["a"]);
}

#[tokio::test]
async fn test_mid_stream_error_is_not_retried() {
    let invoker = Arc::new(
        MockInvoker::default()
            .with("a", Script::BreakMidStream)
            .with("b", Script::Succeed(vec!["never"])),
    );
    let gateway = gateway(invoker.clone(), all_credentials());

    let outcome = gateway.dispatch(&request()).await.unwrap();
    assert_eq!(outcome.backend().as_str(), "a");

    let err = outcome.collect_text().await.unwrap_err();
    assert_eq!(err.kind().label(), "stream");
    assert_eq!(invoker.calls(), vec!["a"]);
}

#[tokio::test]
async fn test_temperature_reaches_invoker() -> anyhow::Result<()> {
    let invoker = Arc::new(MockInvoker::default().with("a", Script::Succeed(vec!["x"])));
    let gateway = gateway(invoker.clone(), all_credentials());

    let default = request();
    gateway.dispatch(&default).await?;

    let cool = GenerationRequest::builder()
        .system("s")
        .prompt("p")
        .temperature(0.2)
        .build()?;
    gateway.dispatch(&cool).await?;

    let temperatures = invoker.temperatures.lock().unwrap().clone();
    assert_eq!(temperatures, vec![0.7, 0.2]);
    Ok(())
}

#[tokio::test]
async fn test_completion_hook_runs_once_after_stream() -> anyhow::Result<()> {
    let invoker = Arc::new(MockInvoker::default().with("b", Script::Succeed(vec!["Hi", "!"])));
    let credentials = Credentials::default().with_key(ProviderFamily::Groq, "q");
    let gateway = gateway(invoker, credentials);

    let seen: Arc<Mutex<Vec<Completion>>> = Arc::default();
    let sink = seen.clone();
    let request = GenerationRequest::builder()
        .system("s")
        .prompt("p")
        .on_finish(move |completion: Completion| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(completion);
                Ok(())
            }
        })
        .build()?;

    let outcome = gateway.dispatch(&request).await?;
    assert!(seen.lock().unwrap().is_empty());

    assert_eq!(outcome.collect_text().await?, "Hi!");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].backend.as_str(), "b");
    assert_eq!(seen[0].text, "Hi!");
    assert_eq!(seen[0].usage.map(|u| u.total_tokens), Some(6));
    Ok(())
}

#[tokio::test]
async fn test_failing_hook_does_not_fail_call() -> anyhow::Result<()> {
    let invoker = Arc::new(MockInvoker::default().with("a", Script::Succeed(vec!["done"])));
    let gateway = gateway(invoker, all_credentials());

    let request = GenerationRequest::builder()
        .system("s")
        .prompt("p")
        .on_finish(|_completion: Completion| async {
            Err(ConfigError::new("telemetry sink offline").into())
        })
        .build()?;

    let outcome = gateway.dispatch(&request).await?;
    assert_eq!(outcome.collect_text().await?, "done");
    Ok(())
}

#[tokio::test]
async fn test_panicking_hook_does_not_fail_call() -> anyhow::Result<()> {
    let invoker = Arc::new(MockInvoker::default().with("a", Script::Succeed(vec!["done"])));
    let gateway = gateway(invoker, all_credentials());

    let request = GenerationRequest::builder()
        .system("s")
        .prompt("p")
        .on_finish(|completion: Completion| async move {
            assert!(completion.text.is_empty(), "hook exploded");
            Ok(())
        })
        .build()?;

    let outcome = gateway.dispatch(&request).await?;
    let mut stream = outcome.into_stream();
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?.text);
    }
    assert_eq!(text, "done");
    Ok(())
}

#[tokio::test]
async fn test_hook_skipped_when_stream_fails() -> anyhow::Result<()> {
    let invoker = Arc::new(MockInvoker::default().with("a", Script::BreakMidStream));
    let gateway = gateway(invoker, all_credentials());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let request = GenerationRequest::builder()
        .system("s")
        .prompt("p")
        .on_finish(move |_completion: Completion| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .build()?;

    let outcome = gateway.dispatch(&request).await?;
    assert!(outcome.collect_text().await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn test_duplicate_ids_rejected() {
    assert!(FallbackOrder::new(["a", "b", "a"]).is_err());
    assert!(
        BackendCatalog::new(vec![
            BackendDescriptor::new("a", "A", ProviderFamily::Google, "m", 1),
            BackendDescriptor::new("a", "A2", ProviderFamily::Groq, "m", 1),
        ])
        .is_err()
    );
}

#[test]
fn test_order_validation_reports_unknown_ids() {
    let catalog = catalog();
    let order = FallbackOrder::new(["a", "zz", "c"]).unwrap();
    let unresolved: Vec<_> = order
        .unresolved(&catalog)
        .into_iter()
        .map(|id| id.as_str()).collect();
    assert_eq!(unresolved, ["zz"]);

    let err = FallbackOrder::validated(["a", "zz"], &catalog).unwrap_err();
    assert!(err.to_string().contains("zz"));
}

#[test]
fn test_default_order_resolves_in_builtin_catalog() {
    let catalog = BackendCatalog::builtin();
    let order = FallbackOrder::default();
    assert!(order.unresolved(&catalog).is_empty());
    let ids: Vec<_> = order.iter().map(|id| id.as_str()).collect();
    assert_eq!(
        ids,
        ["gemini-2.0-flash", "gemini-1.5-flash", "llama-3-70b", "deepseek-chat"]
    );
}
