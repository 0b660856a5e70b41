// tests/dev_proxy.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use futures_util::StreamExt;
use tokio::net::TcpListener;

use themewatch::config::Upstream;
use themewatch::proxy::inject::{inject_client, is_rewritable, script_tag, OriginRewriter};
use themewatch::proxy::{start_proxy, ProxyConfig, ProxyHandle, CLIENT_SCRIPT_PATH, LIVERELOAD_PATH};

async fn start_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let port = addr.port();

    let app = Router::new()
        .route(
            "/",
            get(move || async move {
                Html(format!(
                    "<html><body><a href=\"http://127.0.0.1:{port}/about\">About</a></BODY></html>"
                ))
            }),
        )
        .route(
            "/style.css",
            get(move || async move {
                (
                    [(header::CONTENT_TYPE, "text/css")],
                    format!("a{{background:url(//127.0.0.1:{port}/bg.png)}}"),
                )
            }),
        )
        .route(
            "/data.bin",
            get(move || async move {
                (
                    [(header::CONTENT_TYPE, "application/octet-stream")],
                    format!("//127.0.0.1:{port}"),
                )
            }),
        )
        .route(
            "/old",
            get(move || async move {
                (
                    StatusCode::FOUND,
                    [(header::LOCATION, format!("http://127.0.0.1:{port}/new"))],
                )
                    .into_response()
            }),
        )
        .route(
            "/echo",
            post(|headers: HeaderMap, body: String| async move {
                let tag = headers
                    .get("x-test")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-")
                    .to_string();
                format!("{tag}:{body}")
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn proxy_for(upstream_port: u16) -> ProxyHandle {
    start_proxy(ProxyConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        upstream: Upstream {
            host: "127.0.0.1".to_string(),
            port: upstream_port,
        },
    })
    .await
    .unwrap()
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn html_is_forwarded_with_client_injected_and_origin_rewritten() {
    init_tracing();
    let upstream = start_upstream().await;
    let proxy = proxy_for(upstream.port()).await;
    assert_ne!(proxy.local_addr.port(), upstream.port());

    let resp = with_timeout(client().get(proxy.url()).send()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();

    let tag = script_tag();
    assert!(body.contains(&format!("{tag}</BODY>")), "body was {body}");
    assert!(body.contains(&format!("http://{}/about", proxy.local_addr)), "body was {body}");
    assert!(!body.contains(&format!(":{}/", upstream.port())));
}

#[tokio::test]
async fn css_is_rewritten_but_other_bodies_are_untouched() {
    let upstream = start_upstream().await;
    let proxy = proxy_for(upstream.port()).await;

    let css = client()
        .get(format!("{}/style.css", proxy.url()))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(css, format!("a{{background:url(//{}/bg.png)}}", proxy.local_addr));

    let bin = client()
        .get(format!("{}/data.bin", proxy.url()))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(bin, format!("//127.0.0.1:{}", upstream.port()));
}

#[tokio::test]
async fn redirects_are_passed_through_with_rewritten_location() {
    let upstream = start_upstream().await;
    let proxy = proxy_for(upstream.port()).await;

    let resp = client().get(format!("{}/old", proxy.url())).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        format!("http://{}/new", proxy.local_addr)
    );
}

#[tokio::test]
async fn method_headers_and_body_are_forwarded() {
    let upstream = start_upstream().await;
    let proxy = proxy_for(upstream.port()).await;

    let body = client()
        .post(format!("{}/echo", proxy.url()))
        .header("x-test", "yes")
        .body("payload")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "yes:payload");
}

#[tokio::test]
async fn client_script_is_served_locally() {
    let upstream = start_upstream().await;
    let proxy = proxy_for(upstream.port()).await;

    let resp = client()
        .get(format!("{}{}", proxy.url(), CLIENT_SCRIPT_PATH))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));
    assert!(resp.text().await.unwrap().contains(LIVERELOAD_PATH));
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = closed.local_addr().unwrap().port();
    drop(closed);

    let proxy = proxy_for(dead_port).await;
    let resp = client().get(proxy.url()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    // Still serving afterwards.
    let again = client().get(proxy.url()).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn reload_reaches_connected_websocket_clients() {
    init_tracing();
    let upstream = start_upstream().await;
    let proxy = proxy_for(upstream.port()).await;

    let url = format!("ws://{}{}", proxy.local_addr, LIVERELOAD_PATH);
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    with_timeout(async {
        while proxy.hub.client_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert_eq!(proxy.reload(), 1);

    let msg = with_timeout(socket.next()).await.unwrap().unwrap();
    assert_eq!(msg.to_text().unwrap(), "reload");
}

#[test]
fn injection_goes_before_the_last_body_close() {
    let tag = script_tag();
    assert_eq!(
        inject_client("<p></body></body>"),
        format!("<p></body>{tag}</body>")
    );
    assert_eq!(inject_client("<p>no body"), format!("<p>no body{tag}"));
    let once = inject_client("<body></body>");
    assert_eq!(inject_client(&once), once);
}

#[test]
fn origin_rewriting_respects_port_boundaries() {
    let upstream = Upstream {
        host: "localhost".to_string(),
        port: 8080,
    };
    let rewriter = OriginRewriter::new(&upstream).unwrap();
    assert_eq!(
        rewriter.rewrite("href=\"http://localhost:8080/x\" src='//localhost:80801/y'", "localhost:3000"),
        "href=\"http://localhost:3000/x\" src='//localhost:80801/y'"
    );

    let port80 = OriginRewriter::new(&Upstream {
        host: "example.test".to_string(),
        port: 80,
    })
    .unwrap();
    assert_eq!(
        port80.rewrite("//example.test/a //example.test:80/b //example.testing/c", "localhost:3000"),
        "//localhost:3000/a //localhost:3000/b //example.testing/c"
    );

    assert!(is_rewritable("text/html; charset=UTF-8"));
    assert!(is_rewritable("application/javascript"));
    assert!(!is_rewritable("image/png"));
}
