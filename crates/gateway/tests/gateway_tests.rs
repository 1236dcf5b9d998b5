use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use skillswap_auth::AccessTokenCodec;
use skillswap_config::AppConfig;
use skillswap_database::{
    initialize_database, Exchange, NewExchange, NewUser, Repositories, User,
};
use skillswap_gateway::{create_router, GatewayState, INTERNAL_TOKEN_HEADER};
use skillswap_jobs::{spawn_worker, JobWorker};
use skillswap_realtime::{ConnectionManager, ExchangeStatus, FanoutGateway, Room};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tower::ServiceExt;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const INTERNAL_TOKEN: &str = "callback-secret";

struct TestServer {
    router: Router,
    address: String,
    repos: Repositories,
    connections: Arc<ConnectionManager>,
    codec: AccessTokenCodec,
    ada: User,
    alan: User,
    grace: User,
    exchange: Exchange,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn start() -> TestResult<Self> {
        Self::start_with(Some(INTERNAL_TOKEN)).await
    }

    async fn start_with(internal_token: Option<&str>) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", temp_dir.path().join("gateway.db").display());
        config.database.max_connections = 4;
        config.auth.access_token_secret = "gateway_test_secret_that_is_long_enough".to_string();
        config.http.internal_token = internal_token.map(str::to_string);

        let pool = initialize_database(&config.database).await?;
        let repos = Repositories::new(pool);
        repos.achievements.seed_catalogue().await?;

        let ada = create_user(&repos, "ada", "Ada Lovelace").await?;
        let alan = create_user(&repos, "alan", "Alan Turing").await?;
        let grace = create_user(&repos, "grace", "Grace Hopper").await?;
        let rust = repos.skills.upsert_topic("Rust").await?;
        let guitar = repos.skills.upsert_topic("Guitar").await?;
        let exchange = repos
            .exchanges
            .create(&NewExchange {
                initiator: ada.id.clone(),
                receiver: alan.id.clone(),
                topic_to_learn: guitar.id,
                topic_to_teach: rust.id,
                status: ExchangeStatus::Accepted,
            })
            .await?;

        let connections = Arc::new(ConnectionManager::new(config.realtime.outbound_buffer));
        let worker = JobWorker::new(
            repos.clone(),
            FanoutGateway::new(connections.clone()),
            config.jobs.clone(),
        );
        let (jobs, _worker) = spawn_worker(worker, config.jobs.queue_capacity);

        let state = GatewayState::new(&config, repos.clone(), connections.clone(), jobs);
        let router = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        let app = router.clone();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            router,
            address,
            repos,
            connections,
            codec: AccessTokenCodec::from_config(&config.auth),
            ada,
            alan,
            grace,
            exchange,
            _temp_dir: temp_dir,
        })
    }

    fn token(&self, user: &User) -> TestResult<String> {
        Ok(self.codec.issue(user.id.as_str(), None, Some(&user.username))?)
    }

    async fn connect(&self, user: &User) -> TestResult<Socket> {
        let mut request = format!("ws://{}/ws", self.address).into_client_request()?;
        let cookie = format!("theme=dark; accessToken={}", self.token(user)?);
        request
            .headers_mut()
            .insert("cookie", HeaderValue::from_str(&cookie)?);
        let (socket, _) = connect_async(request).await?;
        Ok(socket)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)?));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    /// Wait until `count` connections have joined the exchange room.
    async fn wait_for_members(&self, count: usize) -> TestResult {
        let room = Room::Exchange(self.exchange.id.clone());
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.connections.room_members(&room).await.len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await?;
        Ok(())
    }
}

async fn create_user(repos: &Repositories, username: &str, full_name: &str) -> TestResult<User> {
    Ok(repos
        .users
        .create(&NewUser {
            full_name: full_name.to_string(),
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            avatar: None,
        })
        .await?)
}

async fn emit(socket: &mut Socket, event: &str, data: Value) -> TestResult {
    let frame = json!({ "event": event, "data": data }).to_string();
    socket.send(Message::Text(frame)).await?;
    Ok(())
}

/// Next server event with the given name, skipping any others.
async fn next_event(socket: &mut Socket, name: &str) -> TestResult<Value> {
    let wait = async {
        while let Some(message) = socket.next().await {
            if let Message::Text(text) = message? {
                let value: Value = serde_json::from_str(&text)?;
                if value["event"] == name {
                    return Ok(value["data"].clone());
                }
            }
        }
        Err::<Value, Box<dyn std::error::Error>>("socket closed".into())
    };
    tokio::time::timeout(Duration::from_secs(5), wait).await?
}

#[tokio::test(flavor = "multi_thread")]
async fn handshake_without_cookie_is_rejected() -> TestResult {
    let server = TestServer::start().await?;

    let result = connect_async(format!("ws://{}/ws", server.address)).await;

    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected an HTTP rejection, got {:?}", other.map(|_| ())),
    }
    assert_eq!(server.connections.connection_count().await, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn participants_chat_through_the_exchange_room() -> TestResult {
    let server = TestServer::start().await?;
    let mut ada = server.connect(&server.ada).await?;
    let mut alan = server.connect(&server.alan).await?;

    emit(&mut ada, "joinExchange", json!(server.exchange.id.as_str())).await?;
    emit(&mut alan, "joinExchange", json!(server.exchange.id.as_str())).await?;
    server.wait_for_members(2).await?;

    emit(
        &mut ada,
        "sendMessage",
        json!({ "exchangeId": server.exchange.id.as_str(), "content": "hello" }),
    )
    .await?;

    for socket in [&mut ada, &mut alan] {
        let message = next_event(socket, "newMessage").await?;
        assert_eq!(message["content"], "hello");
        assert_eq!(message["sender"]["fullName"], "Ada Lovelace");
        assert_eq!(message["sender"]["_id"], server.ada.id.as_str());
        assert_eq!(message["receiver"], server.alan.id.as_str());
    }

    let (status, body) = server
        .call(
            Method::GET,
            &format!("/api/exchanges/{}/messages", server.exchange.id),
            Some(&server.alan),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["content"], "hello");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn outsiders_cannot_join_or_send() -> TestResult {
    let server = TestServer::start().await?;
    let mut grace = server.connect(&server.grace).await?;

    emit(&mut grace, "joinExchange", json!(server.exchange.id.as_str())).await?;
    let error = next_event(&mut grace, "joinExchangeError").await?;
    assert_eq!(error["message"], "Unauthorized to join this exchange.");

    emit(
        &mut grace,
        "sendMessage",
        json!({ "exchangeId": server.exchange.id.as_str(), "content": "let me in" }),
    )
    .await?;
    let error = next_event(&mut grace, "sendMessageError").await?;
    assert_eq!(error["message"], "Unauthorized to send message to this exchange.");

    assert!(server.repos.messages.history(&server.exchange.id).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn history_requires_a_participant() -> TestResult {
    let server = TestServer::start().await?;
    let uri = format!("/api/exchanges/{}/messages", server.exchange.id);

    let (status, body) = server.call(Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 401);

    let (status, body) = server.call(Method::GET, &uri, Some(&server.grace), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to view these messages.");

    let (status, body) = server
        .call(Method::GET, "/api/exchanges/NOT-AN-ID/messages", Some(&server.ada), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid exchange ID.");

    let (status, _) = server
        .call(Method::GET, "/api/exchanges/missing/messages", Some(&server.ada), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn completing_an_exchange_unlocks_achievements_live() -> TestResult {
    let server = TestServer::start().await?;
    let mut ada = server.connect(&server.ada).await?;

    let (status, body) = server
        .call(
            Method::PATCH,
            &format!("/api/exchanges/{}/status", server.exchange.id),
            Some(&server.alan),
            Some(json!({ "status": "completed" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Exchange has been completed.");
    assert_eq!(body["data"]["status"], "completed");

    let unlocked = next_event(&mut ada, "achievementUnlocked").await?;
    assert_eq!(unlocked["name"], "First Exchange");
    assert_eq!(unlocked["points"], 25);

    let (status, body) = server
        .call(Method::GET, "/api/achievements/me", Some(&server.ada), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["criteria"], "FIRST_EXCHANGE");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn accepting_a_request_notifies_the_initiator() -> TestResult {
    let server = TestServer::start().await?;
    let rust = server.repos.skills.upsert_topic("Rust").await?;
    let pending = server
        .repos
        .exchanges
        .create(&NewExchange {
            initiator: server.grace.id.clone(),
            receiver: server.alan.id.clone(),
            topic_to_learn: rust.id.clone(),
            topic_to_teach: rust.id,
            status: ExchangeStatus::Pending,
        })
        .await?;
    let mut grace = server.connect(&server.grace).await?;
    let uri = format!("/api/exchanges/{}/status", pending.id);

    let (status, _) = server
        .call(Method::PATCH, &uri, Some(&server.grace), Some(json!({ "status": "accepted" })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .call(Method::PATCH, &uri, Some(&server.alan), Some(json!({ "status": "accepted" })))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let notification = next_event(&mut grace, "newNotification").await?;
    assert_eq!(notification["message"], "Alan Turing accepted your exchange request.");
    assert_eq!(notification["link"], format!("/exchange/{}", pending.id));

    let (status, body) = server
        .call(Method::GET, "/api/notifications", Some(&server.grace), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = server
        .call(Method::POST, "/api/notifications/read", Some(&server.grace), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notifications marked as read.");
    assert_eq!(server.repos.notifications.unread_count(&server.grace.id).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn reviews_are_validated_and_accepted_once() -> TestResult {
    let server = TestServer::start().await?;
    let exchange_uri = format!("/api/exchanges/{}", server.exchange.id);

    let (status, body) = server
        .call(
            Method::POST,
            &format!("{exchange_uri}/review"),
            Some(&server.ada),
            Some(json!({ "rating": 5 })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Can only review completed exchanges.");

    server
        .repos
        .exchanges
        .update_status(&server.exchange.id, ExchangeStatus::Completed)
        .await?;

    let (status, body) = server
        .call(
            Method::POST,
            &format!("{exchange_uri}/review"),
            Some(&server.ada),
            Some(json!({ "rating": 9 })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A rating between 1 and 5 is required.");

    let review = json!({ "rating": 5, "review": "Great guitar lessons" });
    let (status, body) = server
        .call(Method::POST, &format!("{exchange_uri}/review"), Some(&server.ada), Some(review.clone()))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["initiatorRating"], 5);

    let (status, body) = server
        .call(Method::POST, &format!("{exchange_uri}/review"), Some(&server.ada), Some(review.clone()))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have already reviewed this exchange.");

    let (status, _) = server
        .call(Method::POST, &format!("{exchange_uri}/review"), Some(&server.grace), Some(review))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn internal_callbacks_require_the_shared_token() -> TestResult {
    let server = TestServer::start().await?;
    let recording = server
        .repos
        .recordings
        .create(&server.exchange.id, "https://media.test/session.webm")
        .await?;
    let mut ada = server.connect(&server.ada).await?;
    let uri = format!("/internal/recordings/{}/transcript", recording.id);
    let body = json!({ "transcript": "We practised borrowing." }).to_string();

    let unauthorised = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(INTERNAL_TOKEN_HEADER, "wrong")
        .body(Body::from(body.clone()))?;
    let response = server.router.clone().oneshot(unauthorised).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let authorised = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(INTERNAL_TOKEN_HEADER, INTERNAL_TOKEN)
        .body(Body::from(body))?;
    let response = server.router.clone().oneshot(authorised).await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let ready = next_event(&mut ada, "transcriptReady").await?;
    assert_eq!(ready["recordingId"], recording.id.as_str());
    assert!(ready["title"]
        .as_str()
        .is_some_and(|title| title.starts_with("Recording from ")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn internal_routes_are_hidden_without_a_token() -> TestResult {
    let server = TestServer::start_with(None).await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/internal/users/{}/review-summary", server.ada.id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(INTERNAL_TOKEN_HEADER, "anything")
        .body(Body::from(json!({ "positive": "a", "negative": "b" }).to_string()))?;
    let response = server.router.clone().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn closing_the_socket_removes_the_connection() -> TestResult {
    let server = TestServer::start().await?;
    let mut ada = server.connect(&server.ada).await?;
    emit(&mut ada, "joinExchange", json!(server.exchange.id.as_str())).await?;
    server.wait_for_members(1).await?;

    ada.close(None).await?;

    tokio::time::timeout(Duration::from_secs(5), async {
        while server.connections.connection_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    assert!(server
        .connections
        .room_members(&Room::Exchange(server.exchange.id.clone()))
        .await
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn health_reports_ok() -> TestResult {
    let server = TestServer::start().await?;
    let (status, body) = server.call(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}
