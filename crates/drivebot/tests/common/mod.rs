//! Common test utilities
//!
//! Builds Telegram updates from JSON, a bot pointed at a wiremock Bot API
//! and the full handler dependencies on top of a wiremock Drive API.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use drivebot::telegram::{schema, Bot, HandlerDeps, HandlerError, TelegramGateway};
use drivecore::credentials::StaticToken;
use drivecore::relay::UploadOrchestrator;
use drivecore::session::{SessionKey, SessionStore};
use drivecore::storage::DriveClient;
use serde_json::{json, Value};
use teloxide::dptree;
use teloxide::types::{Me, Update};
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAT_ID: i64 = 123456789;
pub const BOT_TOKEN: &str = "123456:TEST-TOKEN";

/// A private-chat message from the test user with extra fields merged in
pub fn message_json(fields: Value) -> Value {
    let mut message = json!({
        "message_id": 1,
        "date": 1700000000,
        "chat": {
            "id": CHAT_ID,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": CHAT_ID,
            "is_bot": false,
            "first_name": "Test",
            "username": "testuser"
        }
    });
    if let (Some(target), Value::Object(extra)) = (message.as_object_mut(), fields) {
        target.extend(extra);
    }
    message
}

pub fn text_update(text: &str) -> Update {
    update(json!({ "text": text }))
}

pub fn document_update(file_id: &str, file_name: &str) -> Update {
    update(json!({
        "document": {
            "file_id": file_id,
            "file_unique_id": "AgADdoc",
            "file_name": file_name,
            "file_size": 8
        }
    }))
}

pub fn update(fields: Value) -> Update {
    let payload = json!({ "update_id": 1, "message": message_json(fields) });
    serde_json::from_str(&payload.to_string()).expect("valid update JSON")
}

pub fn me() -> Me {
    serde_json::from_value(json!({
        "id": 42,
        "is_bot": true,
        "first_name": "Drive Drop",
        "username": "drivedrop_bot",
        "can_join_groups": true,
        "can_read_all_group_messages": false,
        "supports_inline_queries": false,
        "can_connect_to_business": false,
        "has_main_web_app": false,
        "has_topics_enabled": false,
        "allows_users_to_create_topics": false
    }))
    .expect("valid Me JSON")
}

/// Bot API and Drive API fakes plus the handler tree wired to them
pub struct TestEnvironment {
    pub telegram: MockServer,
    pub drive: MockServer,
    pub bot: Bot,
    pub sessions: SessionStore,
    pub deps: HandlerDeps,
    pub scratch: TempDir,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let telegram = MockServer::start().await;
        let drive = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"(?i)^/bot[^/]+/sendmessage$"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": true, "result": message_json(json!({ "text": "ok" })) })),
            )
            .mount(&telegram)
            .await;

        let bot = Bot::new(BOT_TOKEN).set_api_url(telegram.uri().parse().unwrap());
        let storage = DriveClient::builder(Arc::new(StaticToken::new("drive-token")))
            .api_base(drive.uri().parse().unwrap())
            .build()
            .unwrap();

        let scratch = TempDir::new().unwrap();
        let sessions = SessionStore::in_memory();
        let orchestrator = UploadOrchestrator::new(
            sessions.clone(),
            Arc::new(TelegramGateway::new(bot.clone())),
            Arc::new(storage),
            scratch.path(),
        );
        let deps = HandlerDeps::new(sessions.clone(), Arc::new(orchestrator));

        Self {
            telegram,
            drive,
            bot,
            sessions,
            deps,
            scratch,
        }
    }

    pub fn session(&self) -> SessionKey {
        SessionKey(CHAT_ID)
    }

    /// Runs one update through the production schema.
    pub async fn dispatch(&self, update: Update) -> ControlFlow<Result<(), HandlerError>, ()> {
        let handler = schema(self.deps.clone());
        match handler
            .dispatch(dptree::deps![self.bot.clone(), me(), update])
            .await
        {
            ControlFlow::Break(result) => ControlFlow::Break(result),
            ControlFlow::Continue(_) => ControlFlow::Continue(()),
        }
    }

    /// Texts of every sendMessage call so far, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        let requests = self.telegram.received_requests().await.unwrap_or_default();
        requests
            .iter()
            .filter(|request| request.url.path().to_lowercase().ends_with("/sendmessage"))
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter_map(|body| body.get("text").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    /// Waits for spawned upload runs to send `count` messages.
    pub async fn wait_for_texts(&self, count: usize) -> Vec<String> {
        for _ in 0..100 {
            let texts = self.sent_texts().await;
            if texts.len() >= count {
                return texts;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.sent_texts().await
    }

    pub async fn requests_matching(&self, server: &MockServer, needle: &str) -> usize {
        let requests = server.received_requests().await.unwrap_or_default();
        requests
            .iter()
            .filter(|request| request.url.path().to_lowercase().contains(&needle.to_lowercase()))
            .count()
    }

    pub fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.scratch.path()).unwrap().next().is_none()
    }
}
