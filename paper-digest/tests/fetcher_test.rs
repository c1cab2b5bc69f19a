mod common;

use common::init_tracing;
use paper_digest::types::{FetchConfig, PaperSource};
use paper_digest::ArxivFetcher;

fn unreachable_fetcher() -> ArxivFetcher {
    ArxivFetcher::new(FetchConfig {
        api_url: "http://127.0.0.1:9/api/query".into(),
        timeout_seconds: 5,
        max_retries: 0,
        retry_delay_seconds: 0,
        ..FetchConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn unreachable_catalog_yields_no_papers() {
    init_tracing();
    let fetcher = unreachable_fetcher();

    assert!(fetcher.fetch_papers("cat:cs.CL", 5).await.is_err());
    assert!(fetcher.fetch("cat:cs.CL", 5).await.is_empty());
}

#[test]
fn query_url_requests_newest_first() {
    let url = unreachable_fetcher()
        .query_url("(cat:cs.CL) AND submittedDate:[202401080000 TO 202401152359]", 25)
        .unwrap();
    let params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    assert_eq!(
        params,
        vec![
            (
                "search_query".to_string(),
                "(cat:cs.CL) AND submittedDate:[202401080000 TO 202401152359]".to_string()
            ),
            ("start".to_string(), "0".to_string()),
            ("max_results".to_string(), "25".to_string()),
            ("sortBy".to_string(), "submittedDate".to_string()),
            ("sortOrder".to_string(), "descending".to_string()),
        ]
    );
    assert_eq!(url.path(), "/api/query");
}
