//! End-to-end dispatch behavior through the mock transport.

use crossbar_core::prelude::*;
use crossbar_core::{Body, body_kind, BodyKind};
use crossbar_test::{MockAdapter, MockExchange};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

async fn connected(routes: Vec<Route>) -> Server<MockAdapter> {
    let mut server = Server::new(MockAdapter::new(), routes);
    server
        .connect(&ServerConfig::default())
        .await
        .expect("connect");
    server
}

fn hello_routes() -> Vec<Route> {
    vec![
        Route::new(Method::Get, "/hello")
            .handler_fn(|_req, mut res| async move {
                res.set_status(200);
                res.set_body(json!(["Hello"]));
                Ok(Flow::Continue(res))
            })
            .child(
                Route::nested("/world")
                    .handler_fn(|_req, mut res| async move {
                        res.set_body(json!(["Hello"]));
                        Ok(Flow::Continue(res))
                    })
                    .handler_fn(|_req, mut res| async move {
                        if let Body::Array(items) = res.body_mut() {
                            items.push(json!("World"));
                        }
                        res.set_status(200);
                        Ok(Flow::Continue(res))
                    }),
            ),
    ]
}

#[tokio::test]
async fn hello_route_sends_staged_body_once() {
    let server = connected(hello_routes()).await;

    let mut exchange = MockExchange::get("/hello");
    assert!(server.adapter().fire(&mut exchange).await);

    assert_eq!(exchange.status(), Some(200));
    assert_eq!(exchange.sent_once(), &json!(["Hello"]));
}

#[tokio::test]
async fn nested_two_handler_chain_runs_in_order() {
    let server = connected(hello_routes()).await;

    let mut exchange = MockExchange::get("/hello/world");
    assert!(server.adapter().fire(&mut exchange).await);

    assert_eq!(exchange.status(), Some(200));
    assert_eq!(exchange.sent_once(), &json!(["Hello", "World"]));
}

#[tokio::test]
async fn path_params_bind_into_request() {
    let routes = vec![Route::new(Method::Get, "/:value").handler_fn(
        |req, mut res| async move {
            res.set_body(json!(req.param("value")));
            Ok(Flow::Continue(res))
        },
    )];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/abc");
    assert!(server.adapter().fire(&mut exchange).await);
    assert_eq!(exchange.sent_once(), &json!("abc"));
}

#[tokio::test]
async fn undeclared_route_is_no_callout_and_no_handler_runs() {
    let ran = Arc::new(AtomicBool::new(false));
    let ran_probe = Arc::clone(&ran);
    let routes = vec![Route::new(Method::Get, "/declared").handler_fn(move |_req, res| {
        let ran = Arc::clone(&ran_probe);
        async move {
            ran.store(true, Ordering::SeqCst);
            Ok(Flow::Continue(res))
        }
    })];
    let server = connected(routes).await;

    // The transport delivered a request the core has no callout for.
    let mut exchange = MockExchange::post("/nope");
    assert!(server.adapter().fire_first(&mut exchange).await);

    assert_eq!(exchange.status(), Some(412));
    assert_eq!(exchange.sent_once(), &json!("No callout"));
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unclassified_method_is_rejected() {
    let server = connected(hello_routes()).await;

    let mut exchange = MockExchange::new(None, "/hello");
    assert!(server.adapter().fire_first(&mut exchange).await);

    assert_eq!(exchange.status(), Some(412));
    assert_eq!(exchange.sent_once(), &json!("No request method"));
}

#[tokio::test]
async fn failing_handler_stops_chain_with_single_error_response() {
    let later_ran = Arc::new(AtomicBool::new(false));
    let later_probe = Arc::clone(&later_ran);
    let routes = vec![
        Route::new(Method::Get, "/boom")
            .handler_fn(|_req, mut res| async move {
                res.set_body(json!(["partial"]));
                Ok(Flow::Continue(res))
            })
            .handler_fn(|_req, _res| async move { Err(anyhow::anyhow!("boom")) })
            .handler_fn(move |_req, res| {
                let later = Arc::clone(&later_probe);
                async move {
                    later.store(true, Ordering::SeqCst);
                    Ok(Flow::Continue(res))
                }
            }),
    ];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/boom");
    assert!(server.adapter().fire(&mut exchange).await);

    // Single internal-error response; the first handler's staged body is
    // discarded, the trailing handler never ran.
    assert_eq!(exchange.status(), Some(500));
    assert_eq!(exchange.sent_once(), &json!("boom"));
    assert!(!later_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn halt_skips_remaining_handlers_but_still_commits_once() {
    let later_ran = Arc::new(AtomicBool::new(false));
    let later_probe = Arc::clone(&later_ran);
    let routes = vec![
        Route::new(Method::Get, "/early")
            .handler_fn(|_req, mut res| async move {
                res.set_status(204);
                Ok(Flow::Halt(res))
            })
            .handler_fn(move |_req, res| {
                let later = Arc::clone(&later_probe);
                async move {
                    later.store(true, Ordering::SeqCst);
                    Ok(Flow::Continue(res))
                }
            }),
    ];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/early");
    assert!(server.adapter().fire(&mut exchange).await);

    assert_eq!(exchange.status(), Some(204));
    assert_eq!(exchange.send_count(), 1);
    assert!(!later_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn registration_order_beats_specificity() {
    let routes = vec![
        Route::new(Method::Get, "/:value").handler_fn(|req, mut res| async move {
            res.set_body(json!({ "matched": "param", "value": req.param("value") }));
            Ok(Flow::Continue(res))
        }),
        Route::new(Method::Get, "/literal").handler_fn(|_req, mut res| async move {
            res.set_body(json!({ "matched": "literal" }));
            Ok(Flow::Continue(res))
        }),
    ];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/literal");
    assert!(server.adapter().fire(&mut exchange).await);
    assert_eq!(
        exchange.sent_once(),
        &json!({ "matched": "param", "value": "literal" })
    );
}

#[tokio::test]
async fn misc_side_channel_flows_between_handlers() {
    #[derive(Debug, PartialEq)]
    struct Tag(&'static str);

    let routes = vec![
        Route::new(Method::Get, "/tagged")
            .handler_fn(|_req, mut res| async move {
                res.misc_mut().put(Tag("from-first"));
                Ok(Flow::Continue(res))
            })
            .handler_fn(|_req, mut res| async move {
                let tag = res.misc_mut().take::<Tag>();
                res.set_body(json!(tag.map(|t| t.0)));
                Ok(Flow::Continue(res))
            }),
    ];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/tagged");
    assert!(server.adapter().fire(&mut exchange).await);
    assert_eq!(exchange.sent_once(), &json!("from-first"));
}

#[tokio::test]
async fn slash_variants_dispatch_identically() {
    let server = connected(hello_routes()).await;

    for path in ["/hello", "/hello/", "//hello"] {
        let mut exchange = MockExchange::get(path);
        assert!(server.adapter().fire(&mut exchange).await, "path {path}");
        assert_eq!(exchange.sent_once(), &json!(["Hello"]), "path {path}");
    }
}

#[tokio::test]
async fn staged_headers_flush_in_insertion_order() {
    let routes = vec![Route::new(Method::Get, "/headers").handler_fn(
        |_req, mut res| async move {
            res.set_header("x-alpha", "1");
            res.set_header("x-beta", "2");
            res.set_header("X-Alpha", "replaced");
            Ok(Flow::Continue(res))
        },
    )];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/headers");
    assert!(server.adapter().fire(&mut exchange).await);
    assert_eq!(
        exchange.header_calls,
        vec![
            ("x-alpha".to_string(), "replaced".to_string()),
            ("x-beta".to_string(), "2".to_string()),
        ]
    );
}

#[tokio::test]
async fn unset_status_defaults_to_ok_on_commit() {
    let routes = vec![Route::new(Method::Get, "/plain").handler_fn(
        |_req, mut res| async move {
            res.set_body(json!("just text"));
            Ok(Flow::Continue(res))
        },
    )];
    let server = connected(routes).await;

    let mut exchange = MockExchange::get("/plain");
    assert!(server.adapter().fire(&mut exchange).await);
    assert_eq!(exchange.status(), Some(200));
}

#[tokio::test]
async fn request_exposes_adapter_supplied_context() {
    let routes = vec![Route::new(Method::Post, "/echo").handler_fn(
        |req, mut res| async move {
            res.set_body(json!({
                "q": req.query().get("q"),
                "accept": req.headers().get("accept"),
                "body": req.body(),
            }));
            Ok(Flow::Continue(res))
        },
    )];
    let server = connected(routes).await;

    let mut exchange = MockExchange::post("/echo")
        .with_query("q", "42")
        .with_header("accept", "application/json")
        .with_body(json!({ "inner": true }));
    assert!(server.adapter().fire(&mut exchange).await);

    assert_eq!(
        exchange.sent_once(),
        &json!({
            "q": "42",
            "accept": "application/json",
            "body": { "inner": true },
        })
    );
}

#[test]
fn body_shape_classification_is_pure() {
    assert_eq!(body_kind(&Body::Null), BodyKind::Empty);
    assert_eq!(body_kind(&json!({})), BodyKind::Structured);
    assert_eq!(body_kind(&json!("s")), BodyKind::Scalar);
}
