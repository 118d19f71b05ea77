//! End-to-end client tests against a wiremock Semantic Scholar.
//!
//! Waits are captured with a `RecordingSleeper` so backoff behavior can be
//! asserted without sleeping.

use std::sync::Arc;
use std::time::Duration;

use semantic_scholar_resolver::client::{FailureKind, RecordingSleeper};
use semantic_scholar_resolver::config::{Config, fields};
use semantic_scholar_resolver::models::EPOCH_DATE;
use semantic_scholar_resolver::{ClientError, MemoryCache, ScholarError, SemanticScholarClient};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TITLE: &str = "Attention Is All You Need";
const ATTENTION_ID: &str = "204e3073870fae3d05bcbc2f6a8e263d9b72e776";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn client_for(server: &MockServer) -> SemanticScholarClient {
    let config = Config::for_testing(&server.uri());
    SemanticScholarClient::new(config).unwrap()
}

/// Client whose rate-limit and short waits are recorded, not slept.
fn recording_client_with(
    config: Config,
    max_retry_count: u32,
) -> (SemanticScholarClient, Arc<RecordingSleeper>) {
    init_tracing();
    let mut config = config
        .with_max_retry_count(max_retry_count)
        .with_silent(false);
    config.retry.short_delay = Duration::from_secs(3);
    config.retry.rate_limit_delay = Duration::from_secs(30);

    let sleeper = Arc::new(RecordingSleeper::new());
    let client = SemanticScholarClient::new(config).unwrap();
    (client.with_sleeper(sleeper.clone()), sleeper)
}

fn recording_client(
    server: &MockServer,
    max_retry_count: u32,
) -> (SemanticScholarClient, Arc<RecordingSleeper>) {
    recording_client_with(Config::for_testing(&server.uri()), max_retry_count)
}

fn search_body() -> Value {
    json!({
        "total": 3,
        "offset": 0,
        "data": [
            {"paperId": "a1b2", "title": "Attention Is Not Explanation"},
            {"paperId": ATTENTION_ID, "title": "Attention is All you Need"},
            {"paperId": "c3d4", "title": "Attention Is All You Need In Speech Separation"},
        ]
    })
}

// =============================================================================
// Title Resolution
// =============================================================================

#[tokio::test]
async fn test_resolve_title_exact_text_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "attention is all you need"))
        .and(query_param("fields", "title"))
        .and(query_param("limit", "100"))
        .respond_with(ok_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let paper_id = client.get_paper_id_from_title(TITLE).await.unwrap();

    assert_eq!(paper_id.as_deref(), Some(ATTENTION_ID));
}

#[tokio::test]
async fn test_resolve_title_without_confident_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ok_json(json!({
            "data": [{"paperId": "x", "title": "Graph Attention Networks"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let paper_id = client.get_paper_id_from_title(TITLE).await.unwrap();

    assert!(paper_id.is_none());
}

#[tokio::test]
async fn test_resolve_title_skips_results_without_paper_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ok_json(json!({
            "data": [
                {"paperId": null, "title": "Unrelated"},
                {"paperId": "good", "title": "Attention Is All You Need"},
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let paper_id = client.get_paper_id_from_title(TITLE).await.unwrap();

    assert_eq!(paper_id.as_deref(), Some("good"));
}

#[tokio::test]
async fn test_resolve_title_search_without_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ok_json(json!({"total": 0, "offset": 0})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let title = "Nonexistent Paper";
    let err = client.get_paper_id_from_title(title).await.unwrap_err();

    assert!(matches!(err, ScholarError::NoPaperFound { .. }));
}

#[tokio::test]
async fn test_rate_limited_search_recovers_after_two_waits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ok_json(search_body()))
        .with_priority(2)
        .mount(&server)
        .await;

    let (client, sleeper) = recording_client(&server, 5);
    let paper_id = client.get_paper_id_from_title(TITLE).await.unwrap();

    assert_eq!(paper_id.as_deref(), Some(ATTENTION_ID));
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(30); 2]);
}

// =============================================================================
// Paper Detail
// =============================================================================

#[tokio::test]
async fn test_get_paper_caps_nesting_at_one_level() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/root"))
        .and(query_param("fields", fields::join(fields::PAPER_DETAIL)))
        .respond_with(ok_json(json!({
            "paperId": "root",
            "title": "Attention is All you Need",
            "abstract": null,
            "year": 2017,
            "publicationDate": "2017-06-12",
            "citationCount": 100000,
            "isOpenAccess": false,
            "fieldsOfStudy": ["Computer Science"],
            "authors": [
                {"authorId": "1", "name": "Ashish Vaswani", "affiliations": []},
                {"authorId": "2", "name": "Noam Shazeer"},
            ],
            "citations": [
                {"paperId": "c1", "title": "BERT", "year": 2018, "authors": []},
                {"paperId": "c2", "title": "GPT-2"},
            ],
            "references": [{
                "paperId": "r1",
                "title": "Sequence to Sequence Learning",
                "publicationDate": null,
                "year": 2014,
            }],
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let paper = client.get_paper("root").await.unwrap();

    assert_eq!(paper.paper_id, "root");
    assert_eq!(paper.r#abstract, "");
    assert_eq!(paper.year(), 2017);
    assert_eq!(paper.author_names(), "Ashish Vaswani, Noam Shazeer");
    assert!(!paper.citations.is_empty());
    assert!(!paper.references.is_empty());
    assert!(paper.is_depth_capped());
    assert_eq!(paper.references[0].year(), 2014);
    assert_eq!(paper.citations[1].publication_date, EPOCH_DATE);
}

#[tokio::test]
async fn test_get_paper_not_found() {
    let server = MockServer::start().await;
    let body = json!({"error": "Paper not found"});

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let (client, sleeper) = recording_client(&server, 5);
    let err = client.get_paper("missing").await.unwrap_err();

    assert!(matches!(err, ScholarError::NoPaperFound { ref query } if query == "missing"));
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_server_error_is_fatal() {
    let server = MockServer::start().await;
    let body = "upstream exploded";

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/p1"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let (client, sleeper) = recording_client(&server, 5);
    let err = client.get_paper("p1").await.unwrap_err();

    match err {
        ScholarError::Client(e) => assert_eq!(e.status_code(), Some(500)),
        other => panic!("expected fatal client error, got {other:?}"),
    }
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_rate_limit_exhausts_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let (client, sleeper) = recording_client(&server, 2);
    let err = client.get_paper("busy").await.unwrap_err();

    match err {
        ScholarError::ExceededMaxRetryCount {
            target,
            retries,
            ..
        } => {
            assert_eq!(target, "busy");
            assert_eq!(retries, 2);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(30); 2]);
}

#[tokio::test]
async fn test_retry_after_is_reported_but_configured_delay_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(2)
        .mount(&server)
        .await;

    let (client, sleeper) = recording_client(&server, 1);
    let err = client.get_paper("busy").await.unwrap_err();

    match err {
        ScholarError::ExceededMaxRetryCount {
            source: ClientError::RateLimited { retry_after },
            ..
        } => assert_eq!(retry_after, Duration::from_secs(7)),
        other => panic!("expected rate-limit exhaustion, got {other:?}"),
    }
    assert_eq!(sleeper.waits(), [Duration::from_secs(30)]);
}

#[tokio::test]
async fn test_undecodable_body_is_retried_with_short_wait() {
    let server = MockServer::start().await;
    let html = "<html>gateway</html>";

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/p1"))
        .respond_with(ok_json(json!({"paperId": "p1", "title": "Recovered"})))
        .with_priority(2)
        .mount(&server)
        .await;

    let (client, sleeper) = recording_client(&server, 5);
    let paper = client.get_paper("p1").await.unwrap();

    assert_eq!(paper.title, "Recovered");
    assert_eq!(sleeper.waits(), [Duration::from_secs(3)]);
}

#[tokio::test]
async fn test_get_paper_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/p1"))
        .respond_with(ok_json(json!({"paperId": "p1", "title": "Once"})))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new(10, Duration::from_secs(60)));
    let client = client_for(&server).with_cache(cache);

    let first = client.get_paper("p1").await.unwrap();
    let second = client.get_paper("p1").await.unwrap();

    assert!(first.exact_match(&second));
}

#[tokio::test]
async fn test_get_paper_by_alias_is_cached_under_both_ids() {
    const ALIAS: &str = "arXiv:1706.03762";
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/arXiv:1706.03762"))
        .respond_with(ok_json(json!({"paperId": ATTENTION_ID, "title": TITLE})))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::from_config(&Config::default()));
    let client = client_for(&server).with_cache(cache);

    let first = client.get_paper(ALIAS).await.unwrap();
    let again = client.get_paper(ALIAS).await.unwrap();
    let canonical = client.get_paper(ATTENTION_ID).await.unwrap();

    assert_eq!(first.paper_id, ATTENTION_ID);
    assert!(first.exact_match(&again));
    assert!(first.exact_match(&canonical));
}

// =============================================================================
// Transport Failures
// =============================================================================

#[tokio::test]
async fn test_timed_out_attempt_is_retried_with_short_wait() {
    let server = MockServer::start().await;
    let delay = Duration::from_secs(2);

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/slow"))
        .respond_with(ok_json(json!({"paperId": "slow"})).set_delay(delay))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/slow"))
        .respond_with(ok_json(json!({"paperId": "slow", "title": "Eventually"})))
        .with_priority(2)
        .mount(&server)
        .await;

    let mut config = Config::for_testing(&server.uri());
    config.request_timeout = Duration::from_millis(300);
    let (client, sleeper) = recording_client_with(config, 5);

    let paper = client.get_paper("slow").await.unwrap();

    assert_eq!(paper.title, "Eventually");
    assert_eq!(sleeper.waits(), [Duration::from_secs(3)]);
}

#[tokio::test]
async fn test_refused_connection_exhausts_budget_with_short_waits() {
    // Nothing listens on the discard port.
    let config = Config::for_testing("http://127.0.0.1:9");
    let (client, sleeper) = recording_client_with(config, 2);

    let err = client.get_paper("p1").await.unwrap_err();

    match err {
        ScholarError::ExceededMaxRetryCount {
            retries,
            source,
            ..
        } => {
            assert_eq!(retries, 2);
            assert_eq!(FailureKind::classify(&source), FailureKind::Connectivity);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(3); 2]);
}

// =============================================================================
// Authors
// =============================================================================

#[tokio::test]
async fn test_get_author_with_empty_affiliations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/author/1741101"))
        .respond_with(ok_json(json!({
            "authorId": "1741101",
            "url": "https://www.semanticscholar.org/author/1741101",
            "name": "Oren Etzioni",
            "affiliations": [],
            "paperCount": 400,
            "citationCount": 50000,
            "hIndex": 90,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let author = client.get_author("1741101").await.unwrap();

    assert_eq!(author.name, "Oren Etzioni");
    assert!(author.affiliations.is_empty());
    assert_eq!(author.h_index, 90);
}

#[tokio::test]
async fn test_get_author_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/author/0"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_author("0").await.unwrap_err();

    assert!(matches!(err, ScholarError::NoAuthorFound { .. }));
}

#[tokio::test]
async fn test_get_author_by_name_filters_on_paper() {
    const NAME: &str = "John Smith";
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/author/search"))
        .and(query_param("query", "john smith"))
        .respond_with(ok_json(json!({
            "data": [
                {"authorId": "11", "name": NAME, "papers": [{"paperId": "other"}]},
                {
                    "authorId": "22",
                    "name": NAME,
                    "papers": [{"paperId": "p1"}, {"paperId": "p2"}],
                },
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let spaced = "John  Smith";
    let author = client.get_author_by_name(spaced, Some("p2")).await.unwrap();
    assert_eq!(author.author_id, "22");

    let author = client.get_author_by_name(NAME, None).await.unwrap();
    assert_eq!(author.author_id, "11");

    let nowhere = Some("nowhere");
    let err = client.get_author_by_name(NAME, nowhere).await.unwrap_err();
    assert!(matches!(err, ScholarError::NoAuthorFound { .. }));
}

#[tokio::test]
async fn test_get_author_by_blank_name_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_author_by_name("   ", None).await.unwrap_err();

    assert!(err.is_not_found());
}

// =============================================================================
// References
// =============================================================================

#[tokio::test]
async fn test_get_references_skips_rows_without_cited_paper() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/root/references"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "0"))
        .respond_with(ok_json(json!({
            "offset": 0,
            "data": [
                {
                    "contexts": ["Recurrent neural networks [35] have been firmly established"],
                    "intents": ["background"],
                    "isInfluential": false,
                    "citedPaper": {
                        "paperId": "r1",
                        "title": "Long Short-Term Memory",
                        "year": 1997,
                    },
                },
                {
                    "contexts": [],
                    "intents": [],
                    "isInfluential": false,
                    "citedPaper": null,
                },
                {
                    "contexts": null,
                    "intents": ["methodology"],
                    "isInfluential": true,
                    "citedPaper": {"paperId": "r2", "title": "Adam", "citationCount": 90000},
                },
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let references = client.get_references("root").await.unwrap();

    assert_eq!(references.len(), 2);
    assert_eq!(references[0].paper.year(), 1997);
    assert!(references[1].contexts.is_empty());
    assert!(references[1].is_influential);
    assert_eq!(references[1].paper.citation_count, 90000);
}

// =============================================================================
// Headers
// =============================================================================

#[tokio::test]
async fn test_api_key_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/author/1"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ok_json(json!({"authorId": "1", "name": "A"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::for_testing(&server.uri());
    config.api_key = Some("test-key".to_string());
    let client = SemanticScholarClient::new(config).unwrap();

    assert!(client.has_api_key());
    assert_eq!(client.get_author("1").await.unwrap().name, "A");
}
