//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator is the single owner of the frontier, the dedup index, the
//! commit buffer and the assembler. Workers only ever see a record id and a
//! URL; they fetch and extract, then hand an outcome back. The coordinator
//! applies outcomes in discovery order, which is what makes the output
//! independent of fetch timing.
//!
//! # Crawl loop
//!
//! 1. Dispatch ready records while worker permits are available
//! 2. Wait for the next worker result, retry timer, time limit or interrupt
//! 3. Settle the result and commit everything that is now in order
//! 4. Stop when the frontier is drained or a cap is reached, then assemble

use crate::config::Config;
use crate::crawler::commit::CommitQueue;
use crate::crawler::dedup::DedupIndex;
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchError};
use crate::crawler::frontier::{Dequeue, Frontier, RecordId};
use crate::crawler::rate_limit::HostLimiter;
use crate::document::PageDocument;
use crate::output::{AssembledOutput, Assembler, CrawlStats, SkipReason};
use crate::robots::RobotsCache;
use crate::state::{CrawlPhase, UrlStatus};
use crate::url::{canonicalize, host_key, origin_of, CrawlScope};
use crate::{DocFetchError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Accepted pages between progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// Why a crawl stopped before its frontier was exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PageLimit,
    TimeLimit,
    Interrupted,
}

impl StopReason {
    /// Stops that cut the crawl short of its configured scope
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::TimeLimit | Self::Interrupted)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageLimit => write!(f, "page limit reached"),
            Self::TimeLimit => write!(f, "time limit reached"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub phase: CrawlPhase,

    /// Set when the crawl ended early
    pub stop: Option<StopReason>,

    pub stats: CrawlStats,

    pub elapsed: Duration,

    /// Requests granted per host
    pub host_requests: HashMap<String, u32>,

    pub output: AssembledOutput,
}

impl CrawlReport {
    pub fn was_aborted(&self) -> bool {
        self.stop.map(|s| s.is_abort()).unwrap_or(false)
    }
}

/// What a worker reports back for one record
#[derive(Debug)]
enum WorkerOutcome {
    Page(PageDocument),
    Retry { error: FetchError, delay: Duration },
    Skip(SkipReason),
    Cancelled,
}

/// A record's final result, waiting in the commit buffer
#[derive(Debug)]
enum Settled {
    Page(PageDocument),
    Skip(SkipReason),
}

enum Dispatch {
    /// Every worker permit is taken
    Busy,

    /// Nothing ready; a retry becomes due after the given delay, if any
    Idle(Option<Duration>),

    Drained,
}

/// Read-only state shared by every worker
struct WorkerContext {
    config: Arc<Config>,
    scope: Arc<CrawlScope>,
    client: Client,
    robots: RobotsCache,
    limiter: HostLimiter,
    robots_token: String,
    cancel: CancellationToken,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    ctx: Arc<WorkerContext>,
    interrupt: CancellationToken,
    phase: CrawlPhase,
    frontier: Frontier,
    dedup: DedupIndex,
    commits: CommitQueue<Settled>,
    assembler: Assembler,
    stats: CrawlStats,
    stop: Option<StopReason>,
    fatal: Option<String>,

    /// Record handled by each running worker task
    workers: HashMap<task::Id, RecordId>,
}

impl Coordinator {
    /// Creates a coordinator for a validated configuration
    ///
    /// `interrupt` is the caller's cancellation token; cancelling it stops
    /// the crawl and keeps whatever has been committed so far.
    pub fn new(config: Config, interrupt: CancellationToken) -> Result<Self> {
        let scope = CrawlScope::from_config(&config)?;
        let client = build_http_client(&config)?;
        let config = Arc::new(config);

        let ctx = WorkerContext {
            config: Arc::clone(&config),
            robots_token: config.user_agent.robots_token(),
            limiter: HostLimiter::new(config.crawler.requests_per_second, config.crawler.burst),
            robots: RobotsCache::new(),
            scope: Arc::new(scope),
            client,
            cancel: interrupt.child_token(),
        };

        let assembler = Assembler::new(ctx.scope.start().clone(), config.output.title.clone());

        Ok(Self {
            frontier: Frontier::new(config.crawler.max_depth, config.crawler.max_retries),
            ctx: Arc::new(ctx),
            config,
            interrupt,
            phase: CrawlPhase::Idle,
            dedup: DedupIndex::new(),
            commits: CommitQueue::new(),
            assembler,
            stats: CrawlStats::new(),
            stop: None,
            fatal: None,
            workers: HashMap::new(),
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(DocFetchError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs the crawl to completion
    pub async fn run(mut self) -> Result<CrawlReport> {
        let root = self.ctx.scope.root().clone();
        let start = self.ctx.scope.start().clone();
        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {}, concurrency {})",
            start,
            self.config.crawler.max_depth,
            self.config.crawler.max_pages,
            self.config.crawler.concurrency
        );

        self.transition(CrawlPhase::Running)?;
        let started = Instant::now();
        let deadline = self
            .config
            .crawler
            .max_duration()
            .map(|d| tokio::time::Instant::now() + d);

        self.dedup.mark_url_seen(root.as_str());
        if self.frontier.enqueue(start, 0) {
            self.stats.discovered += 1;
        }

        let semaphore = Arc::new(Semaphore::new(self.config.crawler.concurrency as usize));
        let mut tasks: JoinSet<(RecordId, WorkerOutcome)> = JoinSet::new();

        loop {
            let wake = if self.phase.accepts_work() {
                match self.dispatch(&mut tasks, &semaphore) {
                    Dispatch::Busy => None,
                    Dispatch::Idle(wake) => wake,
                    Dispatch::Drained if tasks.is_empty() => break,
                    Dispatch::Drained => None,
                }
            } else {
                None
            };

            if tasks.is_empty() && (wake.is_none() || !self.phase.accepts_work()) {
                break;
            }

            tokio::select! {
                biased;

                _ = self.interrupt.cancelled(), if self.stop.is_none() => {
                    tracing::warn!("Interrupted; finishing in-flight requests");
                    self.begin_draining(StopReason::Interrupted)?;
                }

                _ = sleep_until_deadline(deadline), if self.stop.is_none() => {
                    tracing::warn!("Time limit reached; finishing in-flight requests");
                    self.begin_draining(StopReason::TimeLimit)?;
                }

                joined = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    match joined {
                        Some(Ok((task, (id, outcome)))) => {
                            self.workers.remove(&task);
                            self.handle_outcome(id, outcome)?;
                        }
                        Some(Err(e)) => self.handle_worker_failure(e)?,
                        None => {}
                    }
                }

                _ = tokio::time::sleep(wake.unwrap_or_default()), if wake.is_some() => {}
            }

            if self.fatal.is_some() {
                self.ctx.cancel.cancel();
                tasks.shutdown().await;
                break;
            }
        }

        self.finish(started).await
    }

    /// Hands ready records to workers until permits or work run out
    fn dispatch(
        &mut self,
        tasks: &mut JoinSet<(RecordId, WorkerOutcome)>,
        semaphore: &Arc<Semaphore>,
    ) -> Dispatch {
        loop {
            let permit = match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => return Dispatch::Busy,
            };

            match self.frontier.dequeue(Instant::now()) {
                Dequeue::Ready(id) => self.spawn_worker(tasks, id, permit),
                Dequeue::Wait(wake) => return Dispatch::Idle(wake),
                Dequeue::Drained => return Dispatch::Drained,
            }
        }
    }

    fn spawn_worker(
        &mut self,
        tasks: &mut JoinSet<(RecordId, WorkerOutcome)>,
        id: RecordId,
        permit: OwnedSemaphorePermit,
    ) {
        let (url, attempts) = match self.frontier.get(id) {
            Some(record) => (record.url.clone(), record.attempts),
            None => return,
        };
        tracing::debug!("Fetching {} (attempt {})", url, attempts);

        let ctx = Arc::clone(&self.ctx);
        let handle = tasks.spawn(async move {
            let _permit = permit;
            let outcome = process_url(&ctx, url, attempts).await;
            (id, outcome)
        });
        self.workers.insert(handle.id(), id);
    }

    /// Settles the record of a worker task that panicked
    fn handle_worker_failure(&mut self, error: JoinError) -> Result<()> {
        let Some(id) = self.workers.remove(&error.id()) else {
            tracing::error!("Worker task failed: {}", error);
            return Err(DocFetchError::Worker(error.to_string()));
        };

        tracing::error!("Worker for record {} failed: {}", id, error);
        self.commits
            .settle(id, Settled::Skip(SkipReason::Worker(error.to_string())));
        self.commit_ready()
    }

    fn handle_outcome(&mut self, id: RecordId, outcome: WorkerOutcome) -> Result<()> {
        match outcome {
            WorkerOutcome::Page(mut doc) => {
                self.stats.fetched += 1;
                if let Some(record) = self.frontier.get(id) {
                    doc.order = id;
                    doc.depth = record.depth;
                }
                self.commits.settle(id, Settled::Page(doc));
            }
            WorkerOutcome::Skip(reason) => self.commits.settle(id, Settled::Skip(reason)),
            WorkerOutcome::Retry { error, delay } => self.handle_retry(id, error, delay)?,
            WorkerOutcome::Cancelled => {}
        }

        self.commit_ready()
    }

    fn handle_retry(&mut self, id: RecordId, error: FetchError, delay: Duration) -> Result<()> {
        // Retries are not scheduled once the crawl is winding down
        if !self.phase.accepts_work() {
            return Ok(());
        }

        let url = match self.frontier.get(id) {
            Some(record) => record.url.clone(),
            None => return Ok(()),
        };

        if id == 0 && error.status().is_none() {
            tracing::error!("Root URL {} is unreachable: {}", url, error);
            self.fatal = Some(format!("root URL {} is unreachable: {}", url, error));
            return self.frontier.mark_failed(id);
        }

        if self.frontier.requeue(id, delay, Instant::now())? {
            self.stats.retries += 1;
            tracing::debug!("Retrying {} in {:?}: {}", url, delay, error);
        } else {
            tracing::warn!("Giving up on {}: {}", url, error);
            self.commits
                .settle(id, Settled::Skip(SkipReason::RetriesExhausted(error.to_string())));
        }
        Ok(())
    }

    fn commit_ready(&mut self) -> Result<()> {
        while let Some((id, settled)) = self.commits.pop_ready() {
            self.commit(id, settled)?;
        }
        Ok(())
    }

    /// Applies one settled record, in discovery order
    fn commit(&mut self, id: RecordId, settled: Settled) -> Result<()> {
        let max_pages = self.config.crawler.max_pages;
        let running = self.phase.accepts_work();

        // Past the page cap nothing further is recorded
        if !running && self.stop == Some(StopReason::PageLimit) {
            return Ok(());
        }

        let (url, depth) = match self.frontier.get(id) {
            Some(record) => (record.url.clone(), record.depth),
            None => return Err(DocFetchError::Worker(format!("unknown record {}", id))),
        };

        match settled {
            Settled::Page(doc) => {
                if self.stats.included >= max_pages {
                    return Ok(());
                }
                self.frontier.mark_done(id)?;

                if !doc.has_empty_body() && !self.dedup.record_content_hash(&doc.content_hash) {
                    tracing::debug!("Skipping {}: duplicate content", url);
                    self.stats.record_skip(id, url.as_str(), SkipReason::DuplicateContent);
                    return Ok(());
                }

                let links = if running { doc.links.clone() } else { Vec::new() };
                self.assembler.accept(doc);
                self.stats.included += 1;
                self.log_progress();

                let next_depth = depth + 1;
                if next_depth <= self.config.crawler.max_depth {
                    for link in links {
                        let Ok(key) = canonicalize(link.clone()) else {
                            continue;
                        };
                        if self.dedup.mark_url_seen(key.as_str())
                            && self.frontier.enqueue(link, next_depth)
                        {
                            self.stats.discovered += 1;
                        }
                    }
                }

                if running && self.stats.included >= max_pages {
                    tracing::info!("Reached page limit of {}", max_pages);
                    self.begin_draining(StopReason::PageLimit)?;
                }
            }
            Settled::Skip(reason) => {
                if self.frontier.get(id).map(|r| r.status) == Some(UrlStatus::InFlight) {
                    self.frontier.mark_failed(id)?;
                }
                if reason.is_failure() {
                    tracing::warn!("Failed {}: {}", url, reason);
                } else {
                    tracing::debug!("Skipped {}: {}", url, reason);
                }
                self.stats.record_skip(id, url.as_str(), reason);
            }
        }

        Ok(())
    }

    fn log_progress(&self) {
        if self.stats.included % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages accepted, {} queued, {} in flight, {} failed",
                self.stats.included,
                self.frontier.pending(),
                self.frontier.in_flight(),
                self.stats.failed
            );
        }
    }

    /// Stops dispatching and cancels in-flight fetches
    fn begin_draining(&mut self, reason: StopReason) -> Result<()> {
        self.transition(CrawlPhase::Draining)?;
        self.stop = Some(reason);
        self.ctx.cancel.cancel();
        self.frontier.close();
        Ok(())
    }

    async fn finish(mut self, started: Instant) -> Result<CrawlReport> {
        let root = self.ctx.scope.start().clone();

        if let Some(message) = self.fatal.take() {
            self.transition(CrawlPhase::Failed)?;
            return Err(DocFetchError::CrawlFailed(message));
        }

        // Results stuck behind cancelled records
        for (id, settled) in self.commits.drain_all() {
            self.commit(id, settled)?;
        }

        if self.assembler.is_empty() {
            if self.phase.accepts_work() {
                self.transition(CrawlPhase::Failed)?;
                tracing::error!("No pages could be fetched from {}", root);
                return Err(DocFetchError::CrawlFailed(format!(
                    "no pages could be fetched from {}",
                    root
                )));
            }
            self.transition(CrawlPhase::Completed)?;
            let reason = self.stop.map(|s| s.to_string()).unwrap_or_default();
            return Err(DocFetchError::Aborted(format!(
                "{} before any page was fetched",
                reason
            )));
        }

        if self.phase.accepts_work() {
            self.transition(CrawlPhase::Draining)?;
        }
        self.transition(CrawlPhase::Completed)?;

        let elapsed = started.elapsed();
        tracing::info!(
            "Crawl completed: {} pages included, {} failed, {} skipped in {:.2?}",
            self.stats.included,
            self.stats.failed,
            self.stats.skipped,
            elapsed
        );

        if let Some(stop) = self.stop.filter(|s| s.is_abort()) {
            if self.config.output.discard_on_abort {
                return Err(DocFetchError::Aborted(format!(
                    "{}; partial output discarded",
                    stop
                )));
            }
        }

        let host_requests = self.ctx.limiter.request_counts().await;
        let output = self.assembler.finalize(&self.stats);

        Ok(CrawlReport {
            phase: self.phase,
            stop: self.stop,
            stats: self.stats,
            elapsed,
            host_requests,
            output,
        })
    }
}

async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Fetches and extracts one URL
///
/// This function:
/// 1. Checks robots.txt and applies its crawl delay
/// 2. Waits for the host's rate limiter
/// 3. Fetches the page
/// 4. Checks the post-redirect URL is still in scope
/// 5. Extracts the page document off the async threads
async fn process_url(ctx: &WorkerContext, url: Url, attempts: u32) -> WorkerOutcome {
    let host = host_key(&url).unwrap_or_default();

    if ctx.config.crawler.respect_robots {
        let origin = origin_of(&url).unwrap_or_default();
        let robots = tokio::select! {
            _ = ctx.cancel.cancelled() => return WorkerOutcome::Cancelled,
            robots = ctx.robots.rules_for(&ctx.client, &origin) => robots,
        };

        if !robots.is_allowed(url.as_str(), &ctx.robots_token) {
            return WorkerOutcome::Skip(SkipReason::RobotsDisallowed);
        }
        if let Some(delay) = robots.rules.crawl_delay(&ctx.robots_token) {
            let delay = ctx.config.crawler.crawl_delay(delay);
            ctx.limiter.apply_crawl_delay(&host, delay).await;
        }
    }

    if !ctx.limiter.acquire(&host, &ctx.cancel).await {
        return WorkerOutcome::Cancelled;
    }

    let result = tokio::select! {
        _ = ctx.cancel.cancelled() => return WorkerOutcome::Cancelled,
        result = fetch_url(&ctx.client, &url) => result,
    };

    let fetch = match result {
        Ok(fetch) => fetch,
        Err(error) => return failed_fetch(ctx, &host, error, attempts).await,
    };

    if fetch.final_url != url {
        match canonicalize(fetch.final_url.clone()) {
            Ok(final_url) if ctx.scope.contains(&final_url) => {}
            _ => {
                return WorkerOutcome::Skip(SkipReason::RedirectOutOfScope(
                    fetch.final_url.to_string(),
                ))
            }
        }
    }

    let scope = Arc::clone(&ctx.scope);
    match tokio::task::spawn_blocking(move || extract(&fetch, &scope)).await {
        Ok(doc) => WorkerOutcome::Page(doc),
        Err(e) => WorkerOutcome::Skip(SkipReason::Worker(e.to_string())),
    }
}

async fn failed_fetch(
    ctx: &WorkerContext,
    host: &str,
    error: FetchError,
    attempts: u32,
) -> WorkerOutcome {
    if !error.is_transient() {
        return match error {
            FetchError::NotHtml(content_type) => WorkerOutcome::Skip(SkipReason::NotHtml(content_type)),
            FetchError::Status { status, .. } => WorkerOutcome::Skip(SkipReason::Http(status)),
            other => WorkerOutcome::Skip(SkipReason::RetriesExhausted(other.to_string())),
        };
    }

    let crawler = &ctx.config.crawler;
    let delay = match error.retry_after() {
        Some(hint) => hint.min(Duration::from_secs(crawler.max_retry_after_secs)),
        None => crawler.backoff_for(attempts),
    };

    if error.is_rate_limited() {
        tracing::warn!("Rate limited by {}; pausing for {:?}", host, delay);
        ctx.limiter.pause(host, Instant::now() + delay).await;
    }

    WorkerOutcome::Retry { error, delay }
}
