#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use pairline::{
    models::{Gender, ServerEvent},
    services::{
        jwt::JwtService,
        notification::{NotificationRequest, NotificationService, NotifyError},
        registry::{ConnectionRegistry, RoomId},
    },
};
use sqlx::PgPool;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn init_tracing_once() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // test-log may already have installed a subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter("pairline=debug")
            .with_test_writer()
            .try_init();
    });
}

/// How [`MockNotifier`] answers once it has recorded a request.
#[derive(Debug, Default, Clone, Copy)]
pub enum NotifierBehavior {
    #[default]
    Succeed,
    Fail,
    /// Never completes, leaving the dispatch timeout to end it
    Hang,
}

/// A mock notifier that records dispatched notifications for testing purposes.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
    behavior: NotifierBehavior,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: NotifierBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Get all recorded notifications
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Notifications are dispatched on a detached task, so poll until one shows up.
    pub async fn wait_for_first(&self) -> NotificationRequest {
        for _ in 0..50 {
            if let Some(request) = self.sent.lock().unwrap().first().cloned() {
                return request;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("No notification was dispatched");
    }
}

#[async_trait]
impl NotificationService for MockNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(request.clone());
        match self.behavior {
            NotifierBehavior::Succeed => Ok(()),
            NotifierBehavior::Fail => Err(NotifyError::SendFailed(
                "notification service unavailable".to_string(),
            )),
            NotifierBehavior::Hang => std::future::pending().await,
        }
    }
}

pub struct TestApp {
    /// Format: `http://127.0.0.1:8492`
    pub address: String,
    pub notifier: Arc<MockNotifier>,
    pub registry: Arc<ConnectionRegistry>,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn token_for(&self, user_id: i64) -> String {
        self.jwt
            .create_access_token(user_id)
            .expect("Failed to create access token")
    }

    pub fn ws_url(&self, room_id: RoomId, token: &str) -> String {
        let host = self.address.trim_start_matches("http://");
        format!("ws://{host}/ws/chat/{room_id}?token={token}")
    }

    /// Opens a chat socket for `user_id` and waits until the registry holds
    /// `expected_connections` for the room.
    pub async fn connect(
        &self,
        room_id: RoomId,
        user_id: i64,
        expected_connections: usize,
    ) -> WsClient {
        let (ws, _) = tokio_tungstenite::connect_async(self.ws_url(room_id, &self.token_for(user_id)))
            .await
            .expect("Failed to connect chat socket");
        self.wait_for_connections(room_id, expected_connections).await;
        ws
    }

    pub async fn wait_for_connections(&self, room_id: RoomId, expected: usize) {
        for _ in 0..50 {
            if self.registry.connection_count(room_id) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "Room {room_id} has {} connections, expected {expected}",
            self.registry.connection_count(room_id)
        );
    }
}

/// Spawns the application with a succeeding mock notifier and its own registry.
/// Includes both main app routes and admin routes.
pub async fn spawn_app(test_db_pool: PgPool) -> TestApp {
    spawn_app_with_notifier(test_db_pool, NotifierBehavior::Succeed).await
}

pub async fn spawn_app_with_notifier(test_db_pool: PgPool, behavior: NotifierBehavior) -> TestApp {
    dotenvy::from_filename_override("tests/data/.test.env").unwrap();
    init_tracing_once();

    let notifier = Arc::new(MockNotifier::with_behavior(behavior));
    let registry = Arc::new(ConnectionRegistry::new());

    // Randomly choose an available port
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port at localhost");
    let port = listener.local_addr().unwrap().port();

    let notifier_cloned: Arc<dyn NotificationService> = notifier.clone();
    let registry_cloned = Arc::clone(&registry);
    tokio::spawn(async move {
        let main_app =
            pairline::app_with_services(test_db_pool.clone(), Some(notifier_cloned), registry_cloned);
        let admin_router = pairline::handlers::admin::admin_router(test_db_pool);
        let combined_app = main_app.merge(admin_router);

        axum::serve(listener, combined_app).await.unwrap();
    });

    let address = format!("http://127.0.0.1:{port}");

    // Wait for server to be ready
    let client = reqwest::Client::new();
    for _ in 0..10 {
        if client
            .get(format!("{address}/health-check"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let secret = std::env::var("JWT_SECRET").unwrap();
    TestApp {
        address,
        notifier,
        registry,
        jwt: JwtService::from_secret(secret.as_bytes()),
    }
}

pub async fn insert_user(pool: &PgPool, user_id: i64, name: &str, age: i32, gender: Gender) {
    sqlx::query("INSERT INTO users (user_id, name, age, gender) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(name)
        .bind(age)
        .bind(gender)
        .execute(pool)
        .await
        .expect("Failed to insert user");
}

pub async fn insert_room(pool: &PgPool, user1_id: i64, user2_id: i64) -> RoomId {
    sqlx::query_scalar("INSERT INTO chat_rooms (user1_id, user2_id) VALUES ($1, $2) RETURNING id")
        .bind(user1_id)
        .bind(user2_id)
        .fetch_one(pool)
        .await
        .expect("Failed to insert chat room")
}

/// Inserts two users of opposite gender and a room between them
pub async fn setup_room(pool: &PgPool) -> (i64, i64, RoomId) {
    insert_user(pool, 1, "alice", 28, Gender::Female).await;
    insert_user(pool, 2, "bob", 30, Gender::Male).await;
    let room_id = insert_room(pool, 1, 2).await;
    (1, 2, room_id)
}

/// Next server event on the socket, skipping control frames.
pub async fn next_event(ws: &mut WsClient) -> ServerEvent {
    let deadline = Duration::from_secs(3);
    loop {
        let msg = tokio::time::timeout(deadline, ws.next())
            .await
            .expect("Timed out waiting for chat event")
            .expect("Chat socket closed")
            .expect("Chat socket error");

        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("Invalid server event");
        }
    }
}

/// Asserts that no text frame arrives within a short window.
pub async fn assert_no_event(ws: &mut WsClient) {
    let outcome = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await;

    if let Ok(Some(text)) = outcome {
        panic!("Unexpected chat event: {text}");
    }
}
