// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde_json::json;
use std::io::Read;
use std::thread;
use std::time::Duration;
use stockdesk_api::Client;
use stockdesk_app::{ApiError, Listing, User, WaterRateInput, failure_message};
use tiny_http::{Header, Request, Response, Server};

fn json_response(body: &str, status: i32) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

fn start_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

#[test]
fn unreachable_server_is_a_transport_failure() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .list::<User>("users")
        .expect_err("list should fail for unreachable endpoint");
    assert!(matches!(
        error.downcast_ref::<ApiError>(),
        Some(ApiError::Transport(_))
    ));
    assert_eq!(failure_message(&error), "request failed");
}

#[test]
fn list_page_sends_query_and_decodes_paged_shape() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(
            request.url(),
            "/api/users/?page=2&page_size=10&username=abc"
        );
        assert!(header_value(&request, "X-CSRFToken").is_none());
        let body = json!({
            "status": "success",
            "data": {
                "count": 23,
                "total_pages": 3,
                "results": [{"id": 11, "username": "abc11", "is_active": true}]
            }
        });
        request
            .respond(json_response(&body.to_string(), 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let query = vec![
        ("page".to_owned(), "2".to_owned()),
        ("page_size".to_owned(), "10".to_owned()),
        ("username".to_owned(), "abc".to_owned()),
    ];
    let listing = client.list_page::<User>("users", &query)?;
    match listing {
        Listing::Paged {
            count,
            total_pages,
            results,
        } => {
            assert_eq!(count, 23);
            assert_eq!(total_pages, Some(3));
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].username, "abc11");
        }
        Listing::Flat(_) => panic!("expected paged listing"),
    }

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn legacy_array_payload_decodes_as_flat_listing() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = r#"{"status":"success","data":[{"id":1,"username":"a"},{"id":2,"username":"b"}]}"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let listing = client.list_page::<User>("users", &[("page".to_owned(), "1".to_owned())])?;
    assert!(matches!(listing, Listing::Flat(ref users) if users.len() == 2));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn mutating_requests_carry_csrf_token_from_cookie() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &tiny_http::Method::Post);
        assert_eq!(request.url(), "/api/water-deduction-rates/");
        assert_eq!(
            header_value(&request, "X-CSRFToken").as_deref(),
            Some("tok123")
        );
        let cookie = header_value(&request, "Cookie").unwrap_or_default();
        assert!(cookie.contains("sessionid=s1"), "cookie header: {cookie}");

        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(parsed["rate"], json!(55.5));

        let reply = r#"{"status":"success","message":"创建成功","data":{"id":31}}"#;
        request
            .respond(json_response(reply, 201))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?
        .with_session_cookie("sessionid=s1; csrftoken=tok123");
    assert_eq!(client.csrf_token().as_deref(), Some("tok123"));

    let input = WaterRateInput {
        name: "Spring".to_owned(),
        rate: 55.5,
        organization: None,
        description: String::new(),
    };
    let mutation = client.create("water-deduction-rates", &input)?;
    assert_eq!(mutation.id, Some(31));
    assert_eq!(mutation.message.as_deref(), Some("创建成功"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn set_cookie_refreshes_csrf_token() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = json_response(r#"{"status":"success","data":[]}"#, 200).with_header(
            Header::from_bytes("Set-Cookie", "csrftoken=fresh; Path=/")
                .expect("valid set-cookie header"),
        );
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    assert_eq!(client.csrf_token(), None);
    let users = client.list::<User>("users")?;
    assert!(users.is_empty());
    assert_eq!(client.csrf_token().as_deref(), Some("fresh"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn rejected_envelope_surfaces_server_message() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &tiny_http::Method::Put);
        assert_eq!(request.url(), "/api/packaging/4/");
        request
            .respond(json_response(
                r#"{"status":"error","message":"名称已存在"}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .update("packaging", 4, &json!({"name": "Box"}))
        .expect_err("rejected update should fail");
    assert!(matches!(
        error.downcast_ref::<ApiError>(),
        Some(ApiError::Rejected { .. })
    ));
    assert_eq!(failure_message(&error), "名称已存在");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn non_success_status_keeps_json_detail_but_not_html() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let first = server.recv().expect("first request expected");
        assert_eq!(first.method(), &tiny_http::Method::Delete);
        first
            .respond(json_response(r#"{"detail":"CSRF Failed"}"#, 403))
            .expect("response should succeed");

        let second = server.recv().expect("second request expected");
        second
            .respond(Response::from_string("<h1>Bad Gateway</h1>").with_status_code(502))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let forbidden = client.delete("users", 8).expect_err("403 should fail");
    assert_eq!(
        forbidden.downcast_ref::<ApiError>(),
        Some(&ApiError::Status {
            code: 403,
            message: Some("CSRF Failed".to_owned())
        })
    );
    assert_eq!(failure_message(&forbidden), "CSRF Failed");

    let gateway = client.get::<User>("users", 8).expect_err("502 should fail");
    assert_eq!(failure_message(&gateway), "request failed");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn empty_delete_response_counts_as_success() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/product-models/5/");
        request
            .respond(Response::empty(tiny_http::StatusCode(204)))
            .expect("response should succeed");
    });

    let client = Client::new(&format!("{addr}/"), Duration::from_secs(1))?;
    let mutation = client.delete("product-models", 5)?;
    assert_eq!(mutation.id, None);
    assert_eq!(mutation.message, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn base_url_must_be_absolute() {
    assert!(Client::new("", Duration::from_secs(1)).is_err());
    assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
    let client = Client::new("http://intranet.local/stock", Duration::from_secs(1))
        .expect("path prefix should be accepted");
    assert_eq!(client.base_url(), "http://intranet.local/stock/");
}

#[test]
fn reads_without_data_are_malformed() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let bodies = [
            r#"{"status":"success"}"#,
            r#"{"count":23,"total_pages":3,"results":[{"id":1,"username":"a"}]}"#,
            "",
            r#"{"status":"success"}"#,
        ];
        for body in bodies {
            let request = server.recv().expect("request expected");
            request
                .respond(json_response(body, 200))
                .expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let query = [("page".to_owned(), "1".to_owned())];

    let no_data = client
        .list::<User>("users")
        .expect_err("envelope without data should fail");
    let unenveloped = client
        .list_page::<User>("users", &query)
        .expect_err("bare page object should fail");
    let empty = client
        .list_page::<User>("users", &query)
        .expect_err("empty body should fail");
    let no_record = client
        .get::<User>("users", 1)
        .expect_err("read without data should fail");

    for error in [no_data, unenveloped, empty, no_record] {
        assert!(
            matches!(error.downcast_ref::<ApiError>(), Some(ApiError::Malformed(_))),
            "{error:#}"
        );
        assert_eq!(failure_message(&error), "request failed");
    }

    handle.join().expect("server thread should join");
    Ok(())
}
