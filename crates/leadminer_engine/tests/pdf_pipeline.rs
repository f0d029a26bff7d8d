use std::sync::Arc;
use std::time::Duration;

use leadminer_core::{DocumentStatus, FilterMode};
use leadminer_engine::{
    join_pages, ArchiveOrgSearch, FetchSettings, NullSink, PdfExtractor, PdfTextExtractor,
    Pipeline, ReqwestFetcher, RunRequest, SystemClock, TokioSleeper,
};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a one-page PDF with a single line of Helvetica text.
fn make_test_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    build_pdf(vec![Stream::new(dictionary! {}, content.into_bytes())])
}

/// One Helvetica page per content stream.
fn build_pdf(contents: Vec<Stream>) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let content_id = doc.add_object(content);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn extracts_text_layer_per_page() {
    let pdf = make_test_pdf("Hello from the supplier directory");
    let pages = PdfTextExtractor.extract_pages(&pdf).unwrap();
    assert_eq!(pages.len(), 1);
    let text = join_pages(&pages);
    assert!(text.contains("supplier"), "unexpected text: {text:?}");
}

#[test]
fn corrupt_page_does_not_sink_the_document() {
    let good = Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 72 720 Td (Hello from page one) Tj ET".to_vec(),
    );
    let corrupt = Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        b"\x00\x01 definitely not deflate \xff\xfe".to_vec(),
    );
    let pdf = build_pdf(vec![good, corrupt]);

    let pages = PdfTextExtractor.extract_pages(&pdf).unwrap();
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn archive_run_downloads_and_filters_real_pdf() {
    miner_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"docs": [
                {"identifier": "dir-2020", "title": "Supplier Directory"},
                {"identifier": "bad-2021", "title": "Corrupt Scan"}
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata/dir-2020"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"name": "directory.pdf"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata/bad-2021"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"name": "scan.pdf"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/dir-2020/directory.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(make_test_pdf("Orders via www.acme-supplies.com"), "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/bad-2021/scan.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-garbage", "application/pdf"))
        .mount(&server)
        .await;

    let timeout = Duration::from_secs(5);
    let pipeline = Pipeline::new(
        Arc::new(ArchiveOrgSearch::new(&server.uri(), timeout).unwrap()),
        Arc::new(ReqwestFetcher::new(FetchSettings {
            request_timeout: timeout,
            ..FetchSettings::default()
        })),
        Arc::new(PdfTextExtractor),
        Arc::new(TokioSleeper),
        Arc::new(SystemClock::new()),
    );
    let request = RunRequest {
        limit: 2,
        mode: FilterMode::UrlsOnly,
        delay_seconds: 0.0,
        ..RunRequest::new("suppliers")
    };

    let report = pipeline.run(&request, &NullSink).await.unwrap();

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].status, DocumentStatus::Success);
    assert_eq!(report.entries[1].status, DocumentStatus::Error);
    assert!(report.text.contains("acme-supplies"));
    assert!(report
        .text
        .contains(&format!("SOURCE: {}/download/dir-2020/directory.pdf", server.uri())));
}
