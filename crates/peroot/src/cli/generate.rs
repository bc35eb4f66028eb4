//! The generate command: quota check, then fallback dispatch.

use chrono::Utc;
use futures::StreamExt;
use peroot::{
    CallerIdentity, Completion, Credentials, Gateway, GenerationRequest, PerootConfig,
    REDIS_URL_VAR, RateLimiter, RedisCounterStore, Tier,
};
use std::io::Write;
use tracing::{debug, info, warn};

/// Arguments of one generate invocation.
#[derive(Debug)]
pub struct GenerateArgs {
    pub system: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub caller: String,
    pub tier: Tier,
}

/// Check the caller's quota, dispatch, and stream the completion to stdout.
pub async fn generate(
    config: &PerootConfig,
    credentials: Credentials,
    args: GenerateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = CallerIdentity::new(args.caller);
    check_quota(config, &identity, args.tier).await?;

    let gateway = Gateway::from_config(&config.gateway, credentials)?;

    let mut builder = GenerationRequest::builder();
    builder
        .system(args.system)
        .prompt(args.prompt)
        .on_finish(|completion: Completion| async move {
            info!(
                backend = %completion.backend,
                chars = completion.text.chars().count(),
                total_tokens = completion.usage.map(|u| u.total_tokens),
                "Completion finished"
            );
            Ok(())
        });
    if let Some(temperature) = args.temperature {
        builder.temperature(temperature);
    }
    let request = builder.build()?;

    let outcome = gateway.dispatch(&request).await?;
    info!(
        backend = %outcome.backend(),
        attempted = outcome.attempted(),
        skipped = outcome.skipped(),
        "Streaming completion"
    );

    let mut stream = outcome.into_stream();
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        write!(stdout, "{}", chunk?.text)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}

/// Count this run against the caller's quota in the shared counter store.
///
/// Without a configured store there is nothing to count against, so quotas are off. A store
/// that cannot be reached admits the run.
async fn check_quota(
    config: &PerootConfig,
    identity: &CallerIdentity,
    tier: Tier,
) -> Result<(), Box<dyn std::error::Error>> {
    let Ok(url) = std::env::var(REDIS_URL_VAR) else {
        warn!(var = REDIS_URL_VAR, "Counter store not configured, rate limiting disabled");
        return Ok(());
    };

    let store = match RedisCounterStore::connect(&url, config.rate_limit.store_timeout()).await {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "Rate limit store unreachable, failing open");
            return Ok(());
        }
    };
    let limiter = RateLimiter::new(store, config.rate_limit.clone());

    let decision = limiter.check(identity, tier).await;
    debug!(
        caller = %identity,
        tier = %tier,
        limit = decision.limit,
        remaining = decision.remaining,
        "Quota checked"
    );
    if decision.admitted {
        return Ok(());
    }

    let retry = decision
        .retry_after_secs(Utc::now())
        .map(|secs| format!(", retry in {}s", secs))
        .unwrap_or_default();
    Err(format!(
        "Rate limit exceeded for {} ({} requests per window{})",
        identity, decision.limit, retry
    )
    .into())
}
