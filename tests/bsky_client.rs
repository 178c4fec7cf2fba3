// tests/bsky_client.rs
use std::time::Duration;

use hn_bsky_bot::platform::{BskyClient, ExternalEmbed, LinkFacet, Platform, PostDraft};
use hn_bsky_bot::secrets::Credentials;
use hn_bsky_bot::BotError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds() -> Credentials {
    Credentials {
        handle: "hn-bot.bsky.social".into(),
        password: "app-pass".into(),
    }
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .and(body_partial_json(json!({"identifier": "hn-bot.bsky.social", "password": "app-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessJwt": "jwt-access",
            "refreshJwt": "jwt-refresh",
            "handle": "hn-bot.bsky.social",
            "did": "did:plc:bot"
        })))
        .mount(server)
        .await;
}

async fn logged_in(server: &MockServer) -> BskyClient {
    mount_session(server).await;
    let c = BskyClient::new(&server.uri(), Duration::from_secs(5)).expect("client");
    c.login(&creds()).await.expect("login");
    c
}

fn draft() -> PostDraft {
    PostDraft {
        text: "Title [Discussion]".into(),
        facets: vec![LinkFacet {
            byte_start: 6,
            byte_end: 18,
            uri: "https://news.ycombinator.com/item?id=7".into(),
        }],
        embed: Some(ExternalEmbed {
            title: "Title".into(),
            description: "Title".into(),
            uri: "https://example.com/t".into(),
            thumb: None,
        }),
    }
}

#[tokio::test]
async fn rejected_login_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "AuthenticationRequired",
            "message": "Invalid identifier or password"
        })))
        .mount(&server)
        .await;

    let c = BskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = c.login(&creds()).await.unwrap_err();
    assert!(matches!(err, BotError::AuthenticationFailure { .. }), "{err}");
}

#[tokio::test]
async fn author_feed_extracts_embedded_links() {
    let server = MockServer::start().await;
    let c = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getAuthorFeed"))
        .and(query_param("actor", "hn-bot.bsky.social"))
        .and(query_param("limit", "20"))
        .and(header("authorization", "Bearer jwt-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "feed": [
                {"post": {
                    "uri": "at://did:plc:bot/app.bsky.feed.post/1",
                    "cid": "c1",
                    "record": {"$type": "app.bsky.feed.post", "text": "A [Discussion]"},
                    "embed": {
                        "$type": "app.bsky.embed.external#view",
                        "external": {"uri": "https://example.com/a", "title": "A", "description": "A"}
                    }
                }},
                {"post": {
                    "uri": "at://did:plc:bot/app.bsky.feed.post/2",
                    "cid": "c2",
                    "record": {"$type": "app.bsky.feed.post", "text": "no link"}
                }}
            ],
            "cursor": "next"
        })))
        .mount(&server)
        .await;

    let posts = c.author_feed("hn-bot.bsky.social", 20).await.expect("feed");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].external_uri.as_deref(), Some("https://example.com/a"));
    assert_eq!(posts[1].external_uri, None);
}

fn feed_page(from: usize, count: usize, cursor: Option<&str>) -> serde_json::Value {
    let feed: Vec<_> = (from..from + count)
        .map(|i| {
            json!({"post": {
                "uri": format!("at://did:plc:bot/app.bsky.feed.post/{i}"),
                "cid": format!("c{i}"),
                "embed": {"$type": "app.bsky.embed.external#view", "external": {"uri": format!("https://example.com/{i}")}}
            }})
        })
        .collect();
    match cursor {
        Some(c) => json!({ "feed": feed, "cursor": c }),
        None => json!({ "feed": feed }),
    }
}

#[tokio::test]
async fn author_feed_pages_past_the_per_request_cap() {
    let server = MockServer::start().await;
    let c = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getAuthorFeed"))
        .and(query_param("limit", "100"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_page(0, 100, Some("page-2"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getAuthorFeed"))
        .and(query_param("limit", "20"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_page(100, 20, Some("page-3"))))
        .expect(1)
        .mount(&server)
        .await;

    // top_n = 60 with the default factor of 2
    let posts = c.author_feed("hn-bot.bsky.social", 120).await.expect("feed");
    assert_eq!(posts.len(), 120);
    assert_eq!(posts[119].external_uri.as_deref(), Some("https://example.com/119"));
}

#[tokio::test]
async fn author_feed_stops_when_history_runs_out() {
    let server = MockServer::start().await;
    let c = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getAuthorFeed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_page(0, 3, None)))
        .expect(1)
        .mount(&server)
        .await;

    let posts = c.author_feed("hn-bot.bsky.social", 120).await.expect("feed");
    assert_eq!(posts.len(), 3);
}

#[tokio::test]
async fn author_feed_requires_login() {
    let server = MockServer::start().await;
    let c = BskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = c.author_feed("x", 20).await.unwrap_err();
    assert!(matches!(err, BotError::HistoryUnavailable { .. }));
}

#[tokio::test]
async fn upload_returns_blob_reference() {
    let server = MockServer::start().await;
    let c = logged_in(&server).await;
    let blob = json!({"$type": "blob", "ref": {"$link": "bafkrei"}, "mimeType": "image/png", "size": 3});
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.uploadBlob"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blob": blob })))
        .mount(&server)
        .await;

    let r = c.upload_blob(vec![1, 2, 3], "image/png").await.expect("upload");
    assert_eq!(r.0, blob);
}

#[tokio::test]
async fn publish_sends_facet_and_embed() {
    let server = MockServer::start().await;
    let c = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.createRecord"))
        .and(body_partial_json(json!({
            "repo": "did:plc:bot",
            "collection": "app.bsky.feed.post",
            "record": {
                "text": "Title [Discussion]",
                "facets": [{
                    "index": {"byteStart": 6, "byteEnd": 18},
                    "features": [{"$type": "app.bsky.richtext.facet#link", "uri": "https://news.ycombinator.com/item?id=7"}]
                }],
                "embed": {"$type": "app.bsky.embed.external", "external": {"uri": "https://example.com/t"}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "at://did:plc:bot/app.bsky.feed.post/3",
            "cid": "c3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let r = c.publish(&draft()).await.expect("publish");
    assert_eq!(r.uri, "at://did:plc:bot/app.bsky.feed.post/3");
}

#[tokio::test]
async fn rejected_publish_is_publish_failure() {
    let server = MockServer::start().await;
    let c = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.createRecord"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "InvalidRequest"})))
        .mount(&server)
        .await;

    let err = c.publish(&draft()).await.unwrap_err();
    match err {
        BotError::PublishFailure { article_url, reason } => {
            assert_eq!(article_url, "https://example.com/t");
            assert!(reason.contains("400"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
}
