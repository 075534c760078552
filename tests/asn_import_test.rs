use httpmock::prelude::*;
use mapping_tools::AsnImporter;
use rusqlite::Connection;
use tempfile::TempDir;

fn asn(asn: &str, name: &str, changed: &str) -> serde_json::Value {
    serde_json::json!({
        "asn": asn,
        "asnName": name,
        "country": "NZ",
        "orgId": {"orgName": "University of Waikato"},
        "changed": changed
    })
}

#[tokio::test]
async fn test_import_follows_pages_until_last() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("asn.db");

    let server = MockServer::start();
    let first_page = server.mock(|when, then| {
        when.method(GET)
            .path("/as2org/dev/asns/")
            .query_param("verbose", "true")
            .query_param("page", "1");
        then.status(200).json_body(serde_json::json!({
            "totalCount": 3,
            "pageInfo": {"pageSize": 2, "pageOffset": 0, "hasNextPage": true},
            "data": [
                asn("681", "WAIKATO", "2020-06-16T22:21:28Z"),
                asn("682", "", "2019-01-01T00:00:00Z")
            ]
        }));
    });
    let second_page = server.mock(|when, then| {
        when.method(GET)
            .path("/as2org/dev/asns/")
            .query_param("page", "2");
        then.status(200).json_body(serde_json::json!({
            "totalCount": 3,
            "pageInfo": {"pageSize": 2, "pageOffset": 2, "hasNextPage": false},
            "data": [
                asn("681", "WAIKATO", "2020-06-16T22:21:28Z")
            ]
        }));
    });

    let conn = Connection::open(&db_path).unwrap();
    let mut importer =
        AsnImporter::new(conn, &server.url("/as2org/dev/asns/"), "asn_mappings").unwrap();

    let mut progress: Vec<u8> = Vec::new();
    let summary = importer.run(&mut progress).await.unwrap();
    importer.close().unwrap();

    first_page.assert();
    second_page.assert();
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.records_seen, 3);
    assert_eq!(summary.rows_inserted, 2);

    let output = String::from_utf8(progress).unwrap();
    assert!(output.contains("682 Name Unknown, NZ (University of Waikato) -- 1546300800"));

    let conn = Connection::open(&db_path).unwrap();
    let label: String = conn
        .query_row(
            "SELECT label FROM asn_mappings WHERE code = '682'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(label, "Name Unknown, NZ");
}

#[tokio::test]
async fn test_bad_page_rolls_back_and_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/asns/");
        then.status(200).json_body(serde_json::json!({
            "pageInfo": {"hasNextPage": false},
            "data": [
                asn("681", "WAIKATO", "2020-06-16T22:21:28Z"),
                asn("682", "OTHER", "not a timestamp")
            ]
        }));
    });

    let conn = Connection::open_in_memory().unwrap();
    let mut importer = AsnImporter::new(conn, &server.url("/asns/"), "asn_mappings").unwrap();

    let mut progress: Vec<u8> = Vec::new();
    assert!(importer.run(&mut progress).await.is_err());
}

#[tokio::test]
async fn test_api_error_is_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/asns/");
        then.status(503);
    });

    let conn = Connection::open_in_memory().unwrap();
    let mut importer = AsnImporter::new(conn, &server.url("/asns/"), "asn_mappings").unwrap();

    let mut progress: Vec<u8> = Vec::new();
    assert!(importer.run(&mut progress).await.is_err());
    assert!(progress.is_empty());
}

#[tokio::test]
async fn test_requests_identify_as_friendlytagger() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET)
            .path("/asns/")
            .header("user-agent", "telegraf-friendlytagger");
        then.status(200).json_body(serde_json::json!({
            "pageInfo": {"hasNextPage": false},
            "data": []
        }));
    });

    let conn = Connection::open_in_memory().unwrap();
    let mut importer = AsnImporter::new(conn, &server.url("/asns/"), "asn_mappings").unwrap();

    let mut progress: Vec<u8> = Vec::new();
    let summary = importer.run(&mut progress).await.unwrap();

    page.assert();
    assert_eq!(summary.pages, 1);
}
