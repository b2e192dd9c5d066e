//! HTTP endpoint for inbound interactions.

use crate::discord::FollowUp;
use crate::interaction::{Interaction, InteractionResponse, APPLICATION_COMMAND, PING};
use crate::signature::{InteractionVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use staffrank_core::{CommandError, GuildId, Message, TransitionHandler};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Edited into the deferred reply when a transition task dies.
pub const APPLY_FAILED: &str = "❌ Something went wrong while applying the rank change.";

/// Shared state for the interaction endpoint.
pub struct AppState {
    /// The only guild whose commands are served
    pub guild_id: GuildId,
    pub handler: TransitionHandler,
    pub verifier: InteractionVerifier,
    pub follow_up: Arc<dyn FollowUp>,
}

type SharedState = Arc<AppState>;

/// Build the router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/interactions", post(interactions))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Interactions ---

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn interactions(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(signature), Some(timestamp)) =
        (header(&headers, SIGNATURE_HEADER), header(&headers, TIMESTAMP_HEADER))
    else {
        return (StatusCode::UNAUTHORIZED, "missing request signature").into_response();
    };

    if let Err(e) = state.verifier.verify(signature, timestamp, &body) {
        warn!("Rejected interaction: {}", e);
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(i) => i,
        Err(e) => {
            warn!("Malformed interaction: {}", e);
            return (StatusCode::BAD_REQUEST, "malformed interaction").into_response();
        }
    };

    match interaction.kind {
        PING => {
            debug!("Ping");
            Json(InteractionResponse::pong()).into_response()
        }
        APPLICATION_COMMAND => Json(dispatch(state, interaction)).into_response(),
        other => {
            debug!("Unsupported interaction type {}", other);
            (StatusCode::BAD_REQUEST, "unsupported interaction type").into_response()
        }
    }
}

/// Refusals are answered inline. Accepted transitions are deferred and
/// applied on their own task, which then edits the deferred reply.
fn dispatch(state: SharedState, interaction: Interaction) -> InteractionResponse {
    if interaction.is_foreign(&state.guild_id) {
        warn!(
            guild = ?interaction.guild_id,
            "Refused command from foreign guild"
        );
        return InteractionResponse::message(Message::from(&CommandError::ForeignGuild));
    }

    let invocation = interaction.invocation();

    let plan = match state.handler.check(&invocation) {
        Ok(plan) => plan,
        Err(e) => {
            info!(
                command = %invocation.command,
                by = %invocation.invoker,
                "Refused: {:?}", e
            );
            return InteractionResponse::message(Message::from(&e));
        }
    };

    let token = interaction.token;
    tokio::spawn(async move {
        let job_state = Arc::clone(&state);
        let job = tokio::spawn(async move { job_state.handler.apply(plan).await });

        // a panic inside apply stays inside its task
        let reply = match job.await {
            Ok(outcome) => outcome.reply,
            Err(e) => {
                error!("Transition task failed: {}", e);
                Message::text(APPLY_FAILED)
            }
        };

        if let Err(e) = state.follow_up.edit_original(&token, &reply).await {
            warn!("Failed to deliver reply: {}", e);
        }
    });

    InteractionResponse::deferred()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::{json, Value};
    use staffrank_core::{
        AllowedRoles, ChannelId, Platform, PlatformResult, RankLadder, RankPolicy, RoleId, UserId,
    };
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingPlatform {
        calls: Mutex<Vec<String>>,
        panic_on_add: bool,
    }

    impl RecordingPlatform {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: String) -> PlatformResult<()> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl Platform for RecordingPlatform {
        async fn add_role(&self, user: &UserId, role: &RoleId) -> PlatformResult<()> {
            if self.panic_on_add {
                panic!("role service exploded");
            }
            self.push(format!("add {user} {role}"))
        }
        async fn remove_role(&self, user: &UserId, role: &RoleId) -> PlatformResult<()> {
            self.push(format!("remove {user} {role}"))
        }
        async fn set_nickname(&self, user: &UserId, nickname: &str) -> PlatformResult<()> {
            self.push(format!("nick {user} {nickname}"))
        }
        async fn send_direct_message(&self, user: &UserId, _message: &Message) -> PlatformResult<()> {
            self.push(format!("dm {user}"))
        }
        async fn send_channel_message(&self, channel: &ChannelId, _message: &Message) -> PlatformResult<()> {
            self.push(format!("post {channel}"))
        }
        async fn role_name(&self, role: &RoleId) -> Option<String> {
            match role.as_str() {
                "jr" => Some("Jr".to_string()),
                "helper" => Some("Helper".to_string()),
                "sr" => Some("Sr".to_string()),
                _ => None,
            }
        }
        async fn guild_name(&self) -> Option<String> {
            Some("Staff HQ".to_string())
        }
    }

    struct ChannelFollowUp(mpsc::UnboundedSender<(String, Message)>);

    #[async_trait]
    impl FollowUp for ChannelFollowUp {
        async fn edit_original(&self, token: &str, message: &Message) -> PlatformResult<()> {
            let _ = self.0.send((token.to_string(), message.clone()));
            Ok(())
        }
    }

    struct Harness {
        router: Router,
        key: SigningKey,
        platform: Arc<RecordingPlatform>,
        replies: mpsc::UnboundedReceiver<(String, Message)>,
    }

    fn harness() -> Harness {
        harness_with(RecordingPlatform::default())
    }

    fn harness_with(platform: RecordingPlatform) -> Harness {
        let key = SigningKey::from_bytes(&[3u8; 32]);
        let ladder = RankLadder::new(vec!["jr".into(), "helper".into(), "sr".into()]).unwrap();
        let allowed = AllowedRoles::new(vec![RoleId::from("owner")]).unwrap();
        let policy = Arc::new(RankPolicy::new(ladder, allowed, ChannelId::from("log")));

        let platform = Arc::new(platform);
        let (tx, replies) = mpsc::unbounded_channel();
        let state = Arc::new(AppState {
            guild_id: GuildId::from("guild"),
            handler: TransitionHandler::new(policy, Arc::clone(&platform) as Arc<dyn Platform>),
            verifier: InteractionVerifier::new(key.verifying_key()),
            follow_up: Arc::new(ChannelFollowUp(tx)),
        });

        Harness {
            router: build_router(state),
            key,
            platform,
            replies,
        }
    }

    fn signed(key: &SigningKey, body: &Value) -> Request<Body> {
        let body = serde_json::to_vec(body).unwrap();
        let timestamp = "1700000000";
        let mut msg = timestamp.as_bytes().to_vec();
        msg.extend_from_slice(&body);
        let signature = hex::encode(key.sign(&msg).to_bytes());

        Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp)
            .body(Body::from(body))
            .unwrap()
    }

    fn command(name: &str, invoker_roles: &[&str], target_roles: &[&str]) -> Value {
        json!({
            "type": 2,
            "token": "interaction-token",
            "guild_id": "guild",
            "member": { "user": { "id": "admin", "username": "boss" }, "roles": invoker_roles },
            "data": {
                "name": name,
                "options": [ { "name": "user", "type": 6, "value": "bob" } ],
                "resolved": {
                    "users": { "bob": { "id": "bob", "username": "bobby" } },
                    "members": { "bob": { "roles": target_roles } }
                }
            }
        })
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let h = harness();
        let response = h
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let h = harness();
        let response = h.router.oneshot(signed(&h.key, &json!({ "type": 1 }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn unsigned_request_is_rejected() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/interactions")
            .body(Body::from(r#"{"type":1}"#))
            .unwrap();
        let response = h.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_key_is_rejected() {
        let h = harness();
        let other = SigningKey::from_bytes(&[9u8; 32]);
        let response = h
            .router
            .oneshot(signed(&other, &command("promote", &["owner"], &["jr"])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_interaction_type_is_bad_request() {
        let h = harness();
        let response = h.router.oneshot(signed(&h.key, &json!({ "type": 3 }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unauthorized_invoker_gets_ephemeral_rejection() {
        let h = harness();
        let response = h
            .router
            .oneshot(signed(&h.key, &command("promote", &["helper"], &["jr"])))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["type"], 4);
        assert_eq!(body["data"]["content"], "❌ You are NOT allowed to use staff commands.");
        assert_eq!(body["data"]["flags"], 64);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn boundary_refusal_is_answered_inline() {
        let h = harness();
        let response = h
            .router
            .oneshot(signed(&h.key, &command("promote", &["owner"], &["sr"])))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["type"], 4);
        assert_eq!(body["data"]["content"], "❌ Already at **highest rank**.");
        assert!(body["data"].get("flags").is_none());
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn promotion_is_deferred_then_completed() {
        let mut h = harness();
        let response = h
            .router
            .oneshot(signed(&h.key, &command("promote", &["owner"], &["helper"])))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!({ "type": 5 }));

        let (token, reply) = tokio::time::timeout(Duration::from_secs(5), h.replies.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token, "interaction-token");
        assert_eq!(reply.embeds[0].description, "Promoted <@bob>: **Helper** → **Sr**");

        assert_eq!(
            h.platform.calls(),
            vec![
                "remove bob helper".to_string(),
                "add bob sr".to_string(),
                "nick bob Sr | bobby".to_string(),
                "post log".to_string(),
                "dm bob".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn foreign_guild_is_refused_without_mutation() {
        let h = harness();
        let mut payload = command("promote", &["owner"], &["helper"]);
        payload["guild_id"] = json!("elsewhere");

        let response = h.router.oneshot(signed(&h.key, &payload)).await.unwrap();

        let body = json_body(response).await;
        assert_eq!(body["type"], 4);
        assert_eq!(
            body["data"]["content"],
            "❌ Staff commands only work in this bot's home server."
        );
        assert_eq!(body["data"]["flags"], 64);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn panicking_transition_still_edits_the_reply() {
        let mut h = harness_with(RecordingPlatform {
            panic_on_add: true,
            ..Default::default()
        });
        let response = h
            .router
            .oneshot(signed(&h.key, &command("promote", &["owner"], &["helper"])))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!({ "type": 5 }));

        let (token, reply) = tokio::time::timeout(Duration::from_secs(5), h.replies.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token, "interaction-token");
        assert_eq!(reply.content.as_deref(), Some(APPLY_FAILED));
        assert!(reply.embeds.is_empty());
    }
}
