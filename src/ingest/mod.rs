//! The orchestrator: drives one [`IngestionRequest`] end-to-end
//!
//! Bring-up of the main session and schema provisioning are fatal; once
//! workers are running, failures stay local to a worker or a single
//! article.

use log::*;

use crate::client::ClientConfig;
use crate::config::{FetchMode, IngestionRequest};
use crate::error::Result;
use crate::ingest::progress::bar;
use crate::store::{ArticleRecord, GroupRecord, Store};
use crate::types::response::{Group, OverviewEntry};
use crate::types::ArticleNumber;

mod pool;
pub(crate) mod progress;

/// Run an ingestion request to completion
///
/// Sequence: open store → connect/upgrade/authenticate the main session →
/// select and persist the group → window the range → drain `XOVER` in
/// process or fan `HEAD` out over the pool → close everything.
pub fn run(request: &IngestionRequest) -> Result<()> {
    let mut store = Store::open(&request.backend, request.upsert)?;

    let mut session = ClientConfig::new(&request.host, request.port);
    session.transport(request.transport);
    if let Some((user, pass)) = &request.credentials {
        session.authinfo_user_pass(user.clone(), pass.clone());
    }
    let mut client = session.connect()?;

    // the group row lands before any worker starts
    let group = client.select_group(&request.group)?;
    store.save_group(&GroupRecord::from(&group));

    if group.count == 0 {
        warn!("group {} has no articles", group.name);
        store.close();
        client.quit();
        return Ok(());
    }

    let (fetch_first, fetch_last) = fetch_window(&group, request.limit);
    debug!(
        "ingesting [{}, {}] of {} (limit {:?})",
        fetch_first, fetch_last, group.name, request.limit
    );

    let store = match request.fetch {
        FetchMode::Overview => {
            ingest_overview(&mut client, &mut store, request, fetch_first, fetch_last)?;
            store
        }
        // the main session idles while the workers run on their own sessions
        FetchMode::PerArticleHead => pool::run(request, store, fetch_first, fetch_last)?,
    };

    store.close();
    client.quit();
    Ok(())
}

/// Single-threaded bulk path: one `XOVER` on the main session
fn ingest_overview(
    client: &mut crate::client::NntpClient,
    store: &mut Store,
    request: &IngestionRequest,
    first: ArticleNumber,
    last: ArticleNumber,
) -> Result<()> {
    let lines = client.overview(first, last)?;
    if lines.is_empty() {
        warn!("XOVER returned no data");
        return Ok(());
    }

    let pb = bar("Headers (XOVER)", lines.len() as u64, request.progress_width);
    for line in &lines {
        let record = ArticleRecord::from(OverviewEntry::parse(line));
        store.save_article(&request.group, &record);
        pb.inc(1);
    }
    pb.finish();
    Ok(())
}

/// The window of article numbers to ingest
///
/// A limit of `L` keeps the newest `L` articles: `[last - L + 1, last]`,
/// clamped so the window never reaches below the group's first article.
fn fetch_window(group: &Group, limit: Option<u32>) -> (ArticleNumber, ArticleNumber) {
    let (first, last) = (group.low, group.high);
    let span = last.saturating_sub(first).saturating_add(1);

    match limit {
        Some(l) if l < span => (last.saturating_sub(l - 1).max(first), last),
        _ => (first, last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(low: ArticleNumber, high: ArticleNumber) -> Group {
        Group {
            count: high - low + 1,
            low,
            high,
            name: "misc.test".to_string(),
        }
    }

    #[test]
    fn no_limit_keeps_the_whole_range() {
        assert_eq!(fetch_window(&group(10, 50), None), (10, 50));
    }

    #[test]
    fn limit_keeps_the_newest_articles() {
        assert_eq!(fetch_window(&group(1, 100), Some(10)), (91, 100));
        assert_eq!(fetch_window(&group(1, 100), Some(1)), (100, 100));
    }

    #[test]
    fn limit_larger_than_the_range_is_a_noop() {
        assert_eq!(fetch_window(&group(1, 3), Some(10)), (1, 3));
        assert_eq!(fetch_window(&group(1, 3), Some(3)), (1, 3));
    }

    #[test]
    fn window_is_clamped_to_the_group_floor() {
        // limit below span but large enough that last - l + 1 < first can
        // only happen with a sparse floor; the max() guards it
        assert_eq!(fetch_window(&group(95, 100), Some(4)), (97, 100));
        assert_eq!(fetch_window(&group(95, 100), Some(6)), (95, 100));
    }
}
