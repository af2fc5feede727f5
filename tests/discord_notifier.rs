//! Integration tests for the Discord notifier using wiremock mock servers.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pubg_watch::config::DiscordConfig;
use pubg_watch::services::announcement::Announcement;
use pubg_watch::services::classifier::OutcomeTier;
use pubg_watch::services::notifier::{DiscordNotifier, Notifier};

fn notifier(server: &MockServer) -> DiscordNotifier {
    DiscordNotifier::new(&DiscordConfig {
        base_url: server.uri(),
        bot_token: "bot-token".into(),
        channel_id: "1234".into(),
    })
}

fn announcement() -> Announcement {
    Announcement {
        match_id: "m-7".into(),
        tier: OutcomeTier::Podium,
        title: "🥈 Top 2 of 25".into(),
        sentence: "alice made it to the podium.".into(),
        map_name: "Miramar".into(),
        game_mode: "Squad FPP".into(),
        match_type: "Normal".into(),
        duration_minutes: 28,
        rank: 2,
        team_count: 25,
        stat_lines: vec!["**alice**: 4 kill(s), 1 assist(s), 390 damage".into()],
        untracked_mates: 0,
    }
}

#[tokio::test]
async fn test_publish_posts_embed_to_channel() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/1234/messages"))
        .and(header("authorization", "Bot bot-token"))
        .and(body_partial_json(json!({
            "content": "alice made it to the podium.",
            "embeds": [{ "title": "🥈 Top 2 of 25", "footer": { "text": "m-7" } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "999" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server).publish(&announcement()).await;

    assert!(result.is_ok(), "publish should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_publish_accepts_empty_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/1234/messages"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server).publish(&announcement()).await;

    assert!(result.is_ok(), "publish should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_publish_surfaces_rejections() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Missing Access",
            "code": 50001
        })))
        .mount(&server)
        .await;

    let err = notifier(&server)
        .publish(&announcement())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("403"), "got {err}");
}
