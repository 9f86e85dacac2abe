//! Source retrieval
//!
//! Each source is fetched as an independent task; a timeout or error on one
//! becomes a recorded failure in that source's outcome and never touches
//! the others. The pipeline decides what a run with failures means.

use std::time::Duration;

use tokio::task::JoinSet;

use hn_compiler::{FetchFailure, FetchOutcome, SourceSpec};

use crate::config::Location;

/// Fetch every source concurrently, yielding one outcome per source in the
/// original configuration order.
pub async fn fetch_all(
    sources: Vec<(SourceSpec, Location)>,
    timeout: Duration,
) -> Vec<FetchOutcome> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("hn-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("http client init failed: {e}"));

    let mut tasks = JoinSet::new();
    for (index, (spec, location)) in sources.into_iter().enumerate() {
        let client = client.clone();
        tasks.spawn(async move {
            let payload = match client {
                Ok(client) => fetch_one(&client, &location).await,
                Err(e) => Err(FetchFailure(e)),
            };
            (index, FetchOutcome { spec, payload })
        });
    }

    let mut outcomes: Vec<(usize, FetchOutcome)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            // A panicked fetch task loses its outcome; nothing left to
            // report for it, the remaining sources still count.
            Err(e) => log::error!("fetch task failed: {e}"),
        }
    }
    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

async fn fetch_one(client: &reqwest::Client, location: &Location) -> Result<String, FetchFailure> {
    match location {
        Location::Path(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchFailure(format!("read '{path}': {e}"))),
        Location::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| FetchFailure(format!("fetch '{url}': {e}")))?;
            response
                .text()
                .await
                .map_err(|e| FetchFailure(format!("decode '{url}': {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use hn_compiler::FormatTag;
    use hn_core::types::Category;

    fn spec(id: &str) -> SourceSpec {
        SourceSpec {
            id: id.to_string(),
            format: FormatTag::BlockList,
            default_category: Category::Remove,
            priority: 0,
        }
    }

    #[tokio::test]
    async fn test_local_path_fetch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "spam.example.com").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let outcomes = fetch_all(
            vec![(spec("local"), Location::Path(path))],
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].payload.as_ref().unwrap().trim(),
            "spam.example.com"
        );
    }

    #[tokio::test]
    async fn test_missing_path_is_isolated_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ok.example.com").unwrap();
        let good = file.path().to_string_lossy().to_string();

        let outcomes = fetch_all(
            vec![
                (spec("bad"), Location::Path("/no/such/file.txt".into())),
                (spec("good"), Location::Path(good)),
            ],
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].payload.is_err());
        assert!(outcomes[1].payload.is_ok());
        // Order mirrors the input regardless of completion order.
        assert_eq!(outcomes[0].spec.id, "bad");
        assert_eq!(outcomes[1].spec.id, "good");
    }
}
