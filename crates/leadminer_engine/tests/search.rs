use std::time::Duration;

use leadminer_engine::{ArchiveOrgSearch, GoogleSearch, SearchError, SearchProvider, SearchResult};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn archive_search_queries_pdf_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .and(query_param("q", "(water board) AND format:PDF"))
        .and(query_param("fl[]", "identifier,title"))
        .and(query_param("rows", "3"))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseHeader": {"status": 0},
            "response": {
                "numFound": 3,
                "docs": [
                    {"identifier": "wb-1990", "title": "Water Board Minutes"},
                    {"identifier": "wb-1991", "title": ["Annual Report", "alt"]},
                    {"identifier": "wb-1992"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let search = ArchiveOrgSearch::new(&server.uri(), TIMEOUT).unwrap();
    let results = search.search("water board", 3).await.unwrap();

    assert_eq!(
        results,
        vec![
            SearchResult {
                locator: "wb-1990".into(),
                title: "Water Board Minutes".into()
            },
            SearchResult {
                locator: "wb-1991".into(),
                title: "Annual Report".into()
            },
            SearchResult {
                locator: "wb-1992".into(),
                title: "wb-1992".into()
            },
        ]
    );
}

#[tokio::test]
async fn archive_resolves_first_pdf_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/wb-1990"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"name": "wb-1990_meta.xml"},
                {"name": "Minutes 1990.PDF"},
                {"name": "other.pdf"}
            ]
        })))
        .mount(&server)
        .await;

    let search = ArchiveOrgSearch::new(&server.uri(), TIMEOUT).unwrap();
    let candidate = SearchResult {
        locator: "wb-1990".into(),
        title: "Minutes".into(),
    };
    let url = search.resolve(&candidate).await.unwrap();

    assert_eq!(
        url,
        Some(format!("{}/download/wb-1990/Minutes%201990.PDF", server.uri()))
    );
}

#[tokio::test]
async fn archive_pdf_in_subdirectory_keeps_its_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/council-1988"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"name": "minutes/march 1988.pdf"}]
        })))
        .mount(&server)
        .await;

    let search = ArchiveOrgSearch::new(&server.uri(), TIMEOUT).unwrap();
    let candidate = SearchResult {
        locator: "council-1988".into(),
        title: "Council".into(),
    };
    let url = search.resolve(&candidate).await.unwrap();

    assert_eq!(
        url,
        Some(format!(
            "{}/download/council-1988/minutes/march%201988.pdf",
            server.uri()
        ))
    );
}

#[tokio::test]
async fn archive_item_without_pdf_resolves_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/scans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"name": "page1.jp2"}]
        })))
        .mount(&server)
        .await;

    let search = ArchiveOrgSearch::new(&server.uri(), TIMEOUT).unwrap();
    let candidate = SearchResult {
        locator: "scans".into(),
        title: "Scans".into(),
    };
    assert_eq!(search.resolve(&candidate).await.unwrap(), None);
}

#[tokio::test]
async fn archive_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let search = ArchiveOrgSearch::new(&server.uri(), TIMEOUT).unwrap();
    let err = search.search("anything", 5).await.unwrap_err();
    assert_eq!(err, SearchError::RateLimited);
}

#[tokio::test]
async fn archive_garbage_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let search = ArchiveOrgSearch::new(&server.uri(), TIMEOUT).unwrap();
    let err = search.search("anything", 5).await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)));
}

#[tokio::test]
async fn google_pages_and_keeps_only_pdf_links() {
    let server = MockServer::start().await;
    let first_page: Vec<_> = (0..10)
        .map(|i| {
            let link = if i % 2 == 0 {
                format!("https://site{i}.org/doc{i}.pdf")
            } else {
                format!("https://site{i}.org/page{i}.html")
            };
            json!({"link": link, "title": format!("Result {i}")})
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "k-123"))
        .and(query_param("cx", "cx-9"))
        .and(query_param("q", "grants filetype:pdf"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": first_page })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("start", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"link": "https://late.org/final.PDF?dl=1", "title": ""},
                {"link": "https://late.org/extra.pdf", "title": "Extra"}
            ]
        })))
        .mount(&server)
        .await;

    let search = GoogleSearch::new(&server.uri(), "k-123", "cx-9", TIMEOUT).unwrap();
    let results = search.search("grants", 6).await.unwrap();

    let links: Vec<_> = results.iter().map(|r| r.locator.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://site0.org/doc0.pdf",
            "https://site2.org/doc2.pdf",
            "https://site4.org/doc4.pdf",
            "https://site6.org/doc6.pdf",
            "https://site8.org/doc8.pdf",
            "https://late.org/final.PDF?dl=1",
        ]
    );
    assert_eq!(results[5].title, "https://late.org/final.PDF?dl=1");
}

#[tokio::test]
async fn google_stops_when_no_more_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let search = GoogleSearch::new(&server.uri(), "k", "cx", TIMEOUT).unwrap();
    assert!(search.search("nothing", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn google_first_page_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let search = GoogleSearch::new(&server.uri(), "k", "cx", TIMEOUT).unwrap();
    let err = search.search("grants", 5).await.unwrap_err();
    assert_eq!(err, SearchError::HttpStatus(403));
}
