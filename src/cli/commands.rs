use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use url::Url;

use crate::cli::config::SchedulerConfig;
use crate::monitor::SchedulerMonitor;
use crate::scheduler::{RedisScheduler, Request, TierPolicy};
use crate::store::StoreFactory;

/// Load configuration from an explicit path or the default location
pub fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => SchedulerConfig::load_from_file(path),
        None => SchedulerConfig::load_default(),
    }
}

/// Build a scheduler from the configuration
async fn build_scheduler(config: &SchedulerConfig, priority: bool) -> Result<RedisScheduler> {
    let store = StoreFactory::create(&config.store).await?;
    let policy = if priority {
        TierPolicy::Priority
    } else {
        TierPolicy::Fifo
    };

    Ok(RedisScheduler::new(store, &config.store.key_prefix, policy))
}

/// Push a request onto a task's queue
#[allow(clippy::too_many_arguments)]
pub async fn push(
    config: &SchedulerConfig,
    priority_queue: bool,
    task: &str,
    url: &str,
    priority: i64,
    depth: u32,
    headers: &[String],
    cookies: &[String],
    method: Option<String>,
) -> Result<()> {
    Url::parse(url).context(format!("Invalid URL: {}", url))?;

    let mut request = Request::new(url).with_priority(priority).with_depth(depth);
    for header in headers {
        let (name, value) = split_pair(header).context("Headers must be name=value")?;
        request = request.with_header(name, value);
    }
    for cookie in cookies {
        let (name, value) = split_pair(cookie).context("Cookies must be name=value")?;
        request = request.with_cookie(name, value);
    }
    request.method = method;

    let scheduler = build_scheduler(config, priority_queue).await?;

    if scheduler.push(&request, task).await? {
        println!("Accepted: {}", url);
    } else {
        println!("Duplicate (already seen for task {}): {}", task, url);
    }

    Ok(())
}

/// Poll the next request for a task and print it
pub async fn poll(config: &SchedulerConfig, priority_queue: bool, task: &str) -> Result<()> {
    let scheduler = build_scheduler(config, priority_queue).await?;

    match scheduler.poll(task).await? {
        Some(request) => {
            let rendered = serde_json::to_string_pretty(&request)
                .context("Failed to render request")?;
            println!("{}", rendered);
        }
        None => {
            println!("No request available for task: {}", task);
        }
    }

    Ok(())
}

/// Show pending and total request counts for a task
pub async fn status(config: &SchedulerConfig, priority_queue: bool, task: &str) -> Result<()> {
    let scheduler = build_scheduler(config, priority_queue).await?;

    // Read-only view; status must never mutate scheduler state
    let monitor: &dyn SchedulerMonitor = &scheduler;
    let left = monitor.left_request_count(task).await?;
    let total = monitor.total_request_count(task).await?;

    println!("Task: {}", task);
    println!("Pending Requests: {}", left);
    println!("Total Accepted URLs: {}", total);

    Ok(())
}

/// Clear a task's duplicate-check set
pub async fn reset(config: &SchedulerConfig, priority_queue: bool, task: &str) -> Result<()> {
    let scheduler = build_scheduler(config, priority_queue).await?;

    scheduler.reset_duplicate_check(task).await?;
    info!("Duplicate check reset for task: {}", task);
    println!("Duplicate check reset for task: {}", task);

    Ok(())
}

fn split_pair(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}
