//! Redis-backed job queue for policy generation.
//!
//! `POST /public/policy` pushes the document id onto `policy:jobs`. The worker
//! started by the `api` binary moves each id onto `policy:jobs:processing`
//! while [`generate_policy`] runs and removes it afterwards, so a job cut
//! short by a crash is still in Redis when the worker starts again.

use std::collections::HashSet;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::document::list_pending_document_ids;
use crate::policy::tasks::generate_policy;
use crate::state::AppState;

pub const POLICY_QUEUE: &str = "policy:jobs";
pub const POLICY_PROCESSING: &str = "policy:jobs:processing";

/// Seconds a blocking pop waits before the worker checks for shutdown again.
const POP_TIMEOUT_SECS: u64 = 5;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub async fn enqueue(redis: &redis::Client, document_id: Uuid) -> redis::RedisResult<()> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("LPUSH")
        .arg(POLICY_QUEUE)
        .arg(document_id.to_string())
        .query_async::<_, ()>(&mut conn)
        .await
}

/// Queues the generation, or runs it on a spawned task when Redis is
/// unreachable. A spawned job lost at shutdown leaves its document `pending`
/// and is picked up again by [`requeue_pending`].
pub async fn submit(state: &AppState, document_id: Uuid) {
    match enqueue(&state.redis, document_id).await {
        Ok(()) => info!("Queued policy generation for document {document_id}"),
        Err(e) => {
            warn!("Could not queue document {document_id} ({e}), generating in-process");
            let state = state.clone();
            tokio::spawn(async move {
                // Failure is already recorded on the document.
                let _ = generate_policy(&state, document_id).await;
            });
        }
    }
}

/// Moves the oldest job onto the processing list and returns it.
async fn claim(conn: &mut MultiplexedConnection) -> redis::RedisResult<Option<String>> {
    redis::cmd("BLMOVE")
        .arg(POLICY_QUEUE)
        .arg(POLICY_PROCESSING)
        .arg("RIGHT")
        .arg("LEFT")
        .arg(POP_TIMEOUT_SECS)
        .query_async(conn)
        .await
}

/// Drops a finished job from the processing list.
async fn acknowledge(conn: &mut MultiplexedConnection, job: &str) -> redis::RedisResult<()> {
    redis::cmd("LREM")
        .arg(POLICY_PROCESSING)
        .arg(1)
        .arg(job)
        .query_async::<_, ()>(conn)
        .await
}

/// Moves every entry of `from` to the consuming end of `to`. Returns how
/// many entries moved.
async fn move_all(conn: &mut MultiplexedConnection, from: &str, to: &str) -> redis::RedisResult<usize> {
    let mut moved = 0;
    loop {
        let job: Option<String> = redis::cmd("LMOVE")
            .arg(from)
            .arg(to)
            .arg("LEFT")
            .arg("RIGHT")
            .query_async(conn)
            .await?;
        if job.is_none() {
            return Ok(moved);
        }
        moved += 1;
    }
}

/// Pending documents that are not waiting in the queue.
pub fn ids_to_requeue(pending: &[Uuid], queued: &[String]) -> Vec<Uuid> {
    let queued: HashSet<&str> = queued.iter().map(String::as_str).collect();
    pending
        .iter()
        .filter(|id| !queued.contains(id.to_string().as_str()))
        .copied()
        .collect()
}

/// Puts interrupted jobs back on the queue and queues every `pending`
/// document that has no job. Returns the number of jobs restored.
pub async fn requeue_pending(state: &AppState, conn: &mut MultiplexedConnection) -> anyhow::Result<usize> {
    let interrupted = move_all(conn, POLICY_PROCESSING, POLICY_QUEUE).await?;
    if interrupted > 0 {
        warn!("Restored {interrupted} interrupted policy jobs");
    }

    let pending = list_pending_document_ids(&state.db).await?;
    let queued: Vec<String> = redis::cmd("LRANGE")
        .arg(POLICY_QUEUE)
        .arg(0)
        .arg(-1)
        .query_async(conn)
        .await?;
    let missing = ids_to_requeue(&pending, &queued);
    for id in &missing {
        redis::cmd("LPUSH")
            .arg(POLICY_QUEUE)
            .arg(id.to_string())
            .query_async::<_, ()>(conn)
            .await?;
    }
    if !missing.is_empty() {
        warn!("Queued {} pending documents that had no job", missing.len());
    }
    Ok(interrupted + missing.len())
}

/// Doubles `current`, capped at 30 seconds.
pub fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Consumes the queue until `shutdown` flips to `true`. Jobs run one at a
/// time; a job in progress is finished before the worker stops.
pub async fn run_worker(state: AppState, mut shutdown: watch::Receiver<bool>) {
    info!("Policy worker listening on {POLICY_QUEUE}");
    let mut backoff = Duration::from_secs(1);
    let mut recovered = false;

    while !*shutdown.borrow() {
        let mut conn = match state.redis.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Policy worker cannot reach Redis: {e}; retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown.changed() => break,
                }
                backoff = next_backoff(backoff);
                continue;
            }
        };

        if !recovered {
            match requeue_pending(&state, &mut conn).await {
                Ok(_) => recovered = true,
                Err(e) => warn!("Could not restore pending policy jobs: {e}"),
            }
        }

        loop {
            let claimed = tokio::select! {
                claimed = claim(&mut conn) => claimed,
                _ = shutdown.changed() => break,
            };
            match claimed {
                Ok(Some(job)) => {
                    backoff = Duration::from_secs(1);
                    match Uuid::parse_str(&job) {
                        Ok(document_id) => {
                            info!("Generating policy for document {document_id}");
                            let _ = generate_policy(&state, document_id).await;
                        }
                        Err(_) => warn!("Dropping malformed job '{job}' from {POLICY_QUEUE}"),
                    }
                    if let Err(e) = acknowledge(&mut conn, &job).await {
                        error!("Could not acknowledge policy job {job}: {e}");
                    }
                }
                Ok(None) => backoff = Duration::from_secs(1),
                Err(e) => {
                    error!("Policy worker lost its Redis connection: {e}; retrying in {backoff:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = shutdown.changed() => {}
                    }
                    backoff = next_backoff(backoff);
                    break;
                }
            }
        }
    }

    info!("Policy worker stopped");
}
