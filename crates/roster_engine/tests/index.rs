use pretty_assertions::assert_eq;
use roster_engine::{
    DocumentError, FailureKind, IdentifierCollector, IndexError, IndexFormatError, IndexSettings,
    ReqwestFetcher,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn index_page(counter: Option<&str>, hrefs: &[&str]) -> String {
    let counter = counter
        .map(|text| format!(r#"<font class="large_bold">{text}</font>"#))
        .unwrap_or_default();
    let rows: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<tr><td headers="id"><a href="{href}">view</a></td><td headers="name">X</td></tr>"#
            )
        })
        .collect();
    format!("<html><body>{counter}<table>{rows}</table></body></html>")
}

async fn mount_page(server: &MockServer, offset: usize, body: String) {
    Mock::given(method("GET"))
        .and(path("/roster_cursor"))
        .and(query_param("p_display_start", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

fn settings(server: &MockServer, page_count_override: Option<usize>) -> IndexSettings {
    IndexSettings {
        url_template: format!("{}/roster_cursor?p_display_start={{offset}}", server.uri()),
        records_per_page: 25,
        page_count_override,
    }
}

#[tokio::test]
async fn walks_one_page_past_derived_count_in_order() {
    harvest_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        index_page(
            Some("Total 3 Records"),
            &[
                "bus_name_inq_frm?p_record_id=aaa111222",
                "bus_name_inq_frm?p_record_id=bbb333444",
                "bus_name_inq_frm?p_record_id=ccc555666",
            ],
        ),
    )
    .await;
    mount_page(&server, 1, index_page(None, &[])).await;

    let fetcher = ReqwestFetcher::default();
    let collector = IdentifierCollector::initialize(&fetcher, settings(&server, None))
        .await
        .expect("initialize");
    assert_eq!(collector.total_records(), 3);
    assert_eq!(collector.page_count(), 1);

    let ids = collector.collect().await.expect("collect");
    assert_eq!(ids, vec!["aaa111222", "bbb333444", "ccc555666"]);

    // page 0 twice (initialize + walk) and page 1 once
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn duplicates_across_pages_are_kept() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        index_page(Some("Total 30 Records"), &["x?id=ABCDEFGHI", "x?id=111111111"]),
    )
    .await;
    mount_page(&server, 1, index_page(None, &["x?id=ABCDEFGHI"])).await;
    mount_page(&server, 2, index_page(None, &[])).await;

    let fetcher = ReqwestFetcher::default();
    let collector = IdentifierCollector::initialize(&fetcher, settings(&server, None))
        .await
        .expect("initialize");
    assert_eq!(collector.page_count(), 2);

    let ids = collector.collect().await.expect("collect");
    assert_eq!(ids, vec!["ABCDEFGHI", "111111111", "ABCDEFGHI"]);
}

#[tokio::test]
async fn page_count_override_replaces_derived_count() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        index_page(Some("Total 5000 Records"), &["x?id=AAAAAAAAA"]),
    )
    .await;

    let fetcher = ReqwestFetcher::default();
    let collector = IdentifierCollector::initialize(&fetcher, settings(&server, Some(0)))
        .await
        .expect("initialize");
    assert_eq!(collector.total_records(), 5000);
    assert_eq!(collector.page_count(), 0);
    assert_eq!(collector.collect().await.unwrap(), vec!["AAAAAAAAA"]);
}

#[tokio::test]
async fn missing_counter_fails_initialization() {
    let server = MockServer::start().await;
    mount_page(&server, 0, index_page(None, &["x?id=AAAAAAAAA"])).await;

    let fetcher = ReqwestFetcher::default();
    let err = IdentifierCollector::initialize(&fetcher, settings(&server, None))
        .await
        .err()
        .expect("should fail");
    assert!(matches!(
        err,
        IndexError::Format(IndexFormatError::MissingCounter { .. })
    ));
}

#[tokio::test]
async fn unparsable_counter_fails_initialization() {
    let server = MockServer::start().await;
    mount_page(&server, 0, index_page(Some("Total several Records"), &[])).await;

    let fetcher = ReqwestFetcher::default();
    let err = IdentifierCollector::initialize(&fetcher, settings(&server, None))
        .await
        .err()
        .expect("should fail");
    assert!(matches!(
        err,
        IndexError::Format(IndexFormatError::UnparsableCounter { .. })
    ));
}

#[tokio::test]
async fn missing_walk_page_aborts_collection() {
    let server = MockServer::start().await;
    mount_page(&server, 0, index_page(Some("Total 3 Records"), &["x?id=AAAAAAAAA"])).await;
    // page 1 is not mounted: the stub answers 404

    let fetcher = ReqwestFetcher::default();
    let collector = IdentifierCollector::initialize(&fetcher, settings(&server, None))
        .await
        .expect("initialize");
    let err = collector.collect().await.unwrap_err();
    match err {
        IndexError::Document(DocumentError::Fetch(fetch)) => {
            assert_eq!(fetch.kind, FailureKind::HttpStatus(404))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn identifier_cell_may_carry_several_headers() {
    let server = MockServer::start().await;
    let body = r#"<html><body><font class="large_bold">Total 1 Records</font><table>
        <tr><td headers="id name"><a href="x?id=ABCDEFGHI">view</a></td>
        <td headers="name"><a href="x?id=NOTANIDXX">n</a></td></tr>
        </table></body></html>"#;
    mount_page(&server, 0, body.to_string()).await;

    let fetcher = ReqwestFetcher::default();
    let collector = IdentifierCollector::initialize(&fetcher, settings(&server, Some(0)))
        .await
        .expect("initialize");
    assert_eq!(collector.collect().await.unwrap(), vec!["ABCDEFGHI"]);
}

#[tokio::test]
async fn template_without_offset_placeholder_is_rejected_before_fetching() {
    let server = MockServer::start().await;
    let settings = IndexSettings {
        url_template: format!("{}/roster_cursor?p_display_start=0", server.uri()),
        records_per_page: 25,
        page_count_override: None,
    };

    let fetcher = ReqwestFetcher::default();
    let err = IdentifierCollector::initialize(&fetcher, settings)
        .await
        .err()
        .expect("should fail");
    assert!(matches!(
        err,
        IndexError::Format(IndexFormatError::MissingOffsetPlaceholder { .. })
    ));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}
