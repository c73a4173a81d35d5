use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use indicatif::ProgressBar;
use log::*;

use crate::client::{ClientConfig, NntpClient};
use crate::config::IngestionRequest;
use crate::error::{Error, Result};
use crate::ingest::progress;
use crate::store::{ArticleRecord, Store};
use crate::types::response::HeaderFields;
use crate::types::ArticleNumber;

/// FIFO of article numbers awaiting a `HEAD` fetch
///
/// Pops are mutex-guarded; the critical section is a dequeue and nothing
/// else.
pub(crate) struct WorkQueue {
    items: Mutex<VecDeque<ArticleNumber>>,
}

impl WorkQueue {
    pub(crate) fn new(range: impl IntoIterator<Item = ArticleNumber>) -> Self {
        Self {
            items: Mutex::new(range.into_iter().collect()),
        }
    }

    /// The next article number, or `None` once the queue has drained
    pub(crate) fn pop(&self) -> Option<ArticleNumber> {
        lock(&self.items).pop_front()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock(&self.items).len()
    }
}

/// Lock a mutex, riding over poisoning from a panicked peer
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything a worker needs, shared behind one `Arc`
struct WorkerContext {
    /// Session template; each worker dials its own connection from it
    session: ClientConfig,
    group: String,
    retries: u32,
    queue: WorkQueue,
    /// The writer mutex: the store is not thread-safe, so every persistence
    /// call holds this lock
    writer: Mutex<Store>,
    progress: ProgressBar,
}

/// Fan `HEAD` requests for `[first, last]` out over the worker pool
///
/// Returns the store once every worker has exited.
pub(crate) fn run(
    request: &IngestionRequest,
    store: Store,
    first: ArticleNumber,
    last: ArticleNumber,
) -> Result<Store> {
    let total = last.saturating_sub(first) as usize + 1;
    let worker_count = request.workers.min(total);

    let mut session = ClientConfig::new(&request.host, request.port);
    session
        .transport(request.transport)
        .group(Some(&request.group));
    if let Some((user, pass)) = &request.credentials {
        session.authinfo_user_pass(user.clone(), pass.clone());
    }

    let ctx = Arc::new(WorkerContext {
        session,
        group: request.group.clone(),
        retries: request.retries,
        queue: WorkQueue::new(first..=last),
        writer: Mutex::new(store),
        progress: progress::bar("Headers (HEAD)", total as u64, request.progress_width),
    });

    info!(
        "fetching {} headers with {} workers",
        total, worker_count
    );

    let mut handles = Vec::with_capacity(worker_count);
    for id in 0..worker_count {
        let ctx = Arc::clone(&ctx);
        let handle = thread::Builder::new()
            .name(format!("head-worker-{}", id))
            .spawn(move || head_worker(id, ctx))?;
        handles.push(handle);
    }

    for handle in handles {
        if handle.join().is_err() {
            warn!("a worker panicked");
        }
    }

    let ctx = Arc::try_unwrap(ctx)
        .map_err(|_| Error::Runtime("worker context still shared after join".to_string()))?;
    ctx.progress.finish();

    Ok(ctx
        .writer
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner()))
}

/// One worker: own session, own bring-up, drain the queue
///
/// Bring-up failure takes out this worker only; the others keep draining.
fn head_worker(id: usize, ctx: Arc<WorkerContext>) {
    let mut client = match ctx.session.connect() {
        Ok(client) => client,
        Err(e) => {
            warn!("worker {}: session bring-up failed: {}", id, e);
            return;
        }
    };

    while let Some(artnum) = ctx.queue.pop() {
        let lines = match fetch_with_retries(&mut client, artnum, ctx.retries) {
            Fetch::Got(lines) => lines,
            Fetch::GaveUp => continue,
            Fetch::SessionLost(e) => {
                warn!("worker {}: session lost: {}", id, e);
                return;
            }
        };

        let record = ArticleRecord::from_headers(artnum, HeaderFields::from_lines(&lines));
        {
            let mut store = lock(&ctx.writer);
            store.save_article(&ctx.group, &record);
        }
        ctx.progress.inc(1);
    }

    client.quit();
}

enum Fetch {
    Got(Vec<String>),
    GaveUp,
    SessionLost(Error),
}

/// Issue `HEAD` up to `1 + retries` times on the same session
fn fetch_with_retries(client: &mut NntpClient, artnum: ArticleNumber, retries: u32) -> Fetch {
    for attempt in 0..=retries {
        match client.head(artnum) {
            Ok(Some(lines)) => return Fetch::Got(lines),
            Ok(None) if attempt < retries => {
                debug!("retrying HEAD {} ({}/{})", artnum, attempt + 1, retries)
            }
            Ok(None) => {}
            Err(e) => return Fetch::SessionLost(e),
        }
    }
    warn!(
        "skipping article {} after {} failed attempts",
        artnum,
        retries + 1
    );
    Fetch::GaveUp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_pops_in_increasing_order() {
        let queue = WorkQueue::new(95..=100);
        assert_eq!(queue.len(), 6);

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![95, 96, 97, 98, 99, 100]);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn empty_queue_pops_none() {
        let queue = WorkQueue::new(std::iter::empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn queue_survives_concurrent_draining() {
        let queue = Arc::new(WorkQueue::new(1..=1000));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    while let Some(n) = queue.pop() {
                        lock(&seen).push(n);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut seen = lock(&seen).clone();
        seen.sort_unstable();
        assert_eq!(seen, (1..=1000).collect::<Vec<_>>());
    }
}
