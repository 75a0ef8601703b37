//! Shared fixtures: a recording [`Outbound`] and a local mock of the
//! chat-completions endpoint.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use travelbot::config::{Config, OverflowPolicy, RelayConfig};
use travelbot::llm::LlmProvider;
use travelbot::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use travelbot::subsystems::relay::{Outbound, Relay, SendError};

pub const PERSONA: &str = "You are TravelBot, a friendly travel guide.";

// ── Event log ─────────────────────────────────────────────────────────────────

/// Everything observable the relay caused, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Typing(i64),
    /// The mock endpoint received a request whose user message was this text.
    Completion(String),
    Text(i64, String),
}

#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<Event>>>);

impl Events {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn all(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn for_chat(&self, chat_id: i64) -> Vec<Event> {
        self.all()
            .into_iter()
            .filter(|e| matches!(e, Event::Typing(c) | Event::Text(c, _) if *c == chat_id))
            .collect()
    }

    pub fn texts_for(&self, chat_id: i64) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Event::Text(c, t) if c == chat_id => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.all().iter().filter(|e| matches!(e, Event::Completion(_))).count()
    }
}

// ── Recording outbound ────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingOutbound {
    pub events: Events,
    failing_chats: Arc<Mutex<HashSet<i64>>>,
}

impl RecordingOutbound {
    pub fn new(events: Events) -> Self {
        Self { events, failing_chats: Arc::default() }
    }

    /// Every send to `chat_id` is recorded and then reported as failed.
    pub fn fail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }

    fn outcome(&self, chat_id: i64) -> Result<(), SendError> {
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            Err(SendError::new(chat_id, "Forbidden: bot was blocked by the user"))
        } else {
            Ok(())
        }
    }
}

impl Outbound for RecordingOutbound {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<(), SendError> {
        self.events.push(Event::Text(chat_id, text));
        self.outcome(chat_id)
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), SendError> {
        self.events.push(Event::Typing(chat_id));
        self.outcome(chat_id)
    }
}

// ── Mock completion endpoint ──────────────────────────────────────────────────

/// What the mock answers with.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(content: &str) -> Self {
        let body = serde_json::json!({ "choices": [{ "message": { "content": content } }] });
        Self::raw(StatusCode::OK, body.to_string())
    }

    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

type Responder = Arc<dyn Fn(&str) -> MockReply + Send + Sync>;

#[derive(Clone)]
struct MockState {
    events: Events,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    respond: Responder,
}

pub struct MockCompletion {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockCompletion {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Provider pointed at this mock, configured like production.
    pub fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAiCompatible(
            OpenAiCompatibleProvider::new(
                self.url.clone(),
                "llama-3.3-70b-versatile".into(),
                0.7,
                1024,
                5,
                Some("test-key".into()),
            )
            .unwrap(),
        )
    }
}

/// Start a mock `/v1/chat/completions` on an ephemeral port. `respond`
/// receives the user message text of each request.
pub async fn spawn_mock(
    events: Events,
    respond: impl Fn(&str) -> MockReply + Send + Sync + 'static,
) -> MockCompletion {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState { events, requests: requests.clone(), respond: Arc::new(respond) };

    let router = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockCompletion { url: format!("http://{addr}/v1/chat/completions"), requests }
}

async fn completions(State(state): State<MockState>, headers: HeaderMap, body: String) -> (StatusCode, String) {
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let user_text = json["messages"][1]["content"].as_str().unwrap_or_default().to_string();

    state.events.push(Event::Completion(user_text.clone()));
    state.requests.lock().unwrap().push(RecordedRequest {
        authorization: header_str(&headers, header::AUTHORIZATION),
        content_type: header_str(&headers, header::CONTENT_TYPE),
        body: json,
    });

    let reply = (state.respond)(&user_text);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (reply.status, reply.body)
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

// ── Relay builders ────────────────────────────────────────────────────────────

pub fn relay_config() -> RelayConfig {
    let mut relay = Config::test_default().relay;
    relay.persona = PERSONA.to_string();
    relay
}

pub fn relay_with(
    provider: LlmProvider,
    outbound: RecordingOutbound,
    max_in_flight: usize,
    overflow: OverflowPolicy,
) -> Relay<RecordingOutbound> {
    let mut config = relay_config();
    config.max_in_flight = max_in_flight;
    config.overflow = overflow;
    Relay::new(&config, provider, outbound, Some("TravelGuideBot".into()))
}

/// Wait for every spawned exchange to finish.
pub async fn settle(relay: &Relay<RecordingOutbound>) {
    assert!(relay.drain(Duration::from_secs(5)).await, "exchanges did not finish in time");
}
