//! End-to-end pipeline tests with in-memory queue and store, the real
//! protobuf decoder and HTTP sender, and a local callback receiver.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use prost::Message;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use ingestion_callback::error::{FetchError, QueueError};
use ingestion_callback::{
    Consumer, ConsumerDeps, ConsumerSettings, CycleReport, HttpCallbackSender, IngestDocument,
    ObjectFetcher, ProtobufDecoder, QueueAcker, QueueHandle, QueueMessage, QueuePoller,
    QueueResolver, Topology,
};

const NOTIFICATION: &str =
    r#"{"Records":[{"eventName":"ObjectCreated:Put","s3":{"object":{"key":"doc-1"}}}]}"#;

/// Queue that hands out its pending messages once and records deletions.
#[derive(Default)]
struct InMemoryQueue {
    pending: Mutex<Vec<QueueMessage>>,
    acked: Mutex<Vec<String>>,
}

impl InMemoryQueue {
    fn with_messages(messages: Vec<QueueMessage>) -> Self {
        Self {
            pending: Mutex::new(messages),
            acked: Mutex::default(),
        }
    }

    fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueResolver for InMemoryQueue {
    async fn resolve(&self, name: &str) -> Result<QueueHandle, QueueError> {
        Ok(QueueHandle::new(format!("memory://{name}")))
    }
}

#[async_trait]
impl QueuePoller for InMemoryQueue {
    async fn poll(
        &self,
        _queue: &QueueHandle,
        max_messages: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let mut pending = self.pending.lock().unwrap();
        let take = pending.len().min(max_messages as usize);
        Ok(pending.drain(..take).collect())
    }
}

#[async_trait]
impl QueueAcker for InMemoryQueue {
    async fn ack(&self, _queue: &QueueHandle, ack_token: &str) -> Result<(), QueueError> {
        self.acked.lock().unwrap().push(ack_token.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryStore {
    objects: HashMap<String, Bytes>,
}

#[async_trait]
impl ObjectFetcher for InMemoryStore {
    async fn fetch(&self, key: &str) -> Result<Bytes, FetchError> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                bucket: "test-bucket".to_string(),
                key: key.to_string(),
            })
    }
}

/// Callback receiver: 200 on `/callback`, 404 elsewhere. Records paths and bodies.
async fn spawn_receiver() -> (SocketAddr, Arc<Mutex<Vec<(String, String)>>>) {
    let hits: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let sink = Arc::clone(&hits);
    let fallback_sink = Arc::clone(&hits);

    let app = Router::new()
        .route(
            "/callback",
            post(move |body: String| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(("/callback".to_string(), body));
                    StatusCode::OK
                }
            }),
        )
        .fallback(move |uri: axum::http::Uri, body: String| {
            let sink = Arc::clone(&fallback_sink);
            async move {
                sink.lock().unwrap().push((uri.path().to_string(), body));
                StatusCode::NOT_FOUND
            }
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, hits)
}

fn encoded_document(callback_url: &str) -> (IngestDocument, Bytes) {
    let mut configuration = BTreeMap::new();
    configuration.insert("callback_url".to_string(), callback_url.to_string());
    let document = IngestDocument {
        version: 0,
        uuid: "test-uuid".to_string(),
        routing_key: "test-routing".to_string(),
        natural_id: "test-natural-id".to_string(),
        source: "call".to_string(),
        document_date: "test-date".to_string(),
        language_id: "en".to_string(),
        topology: Some(Topology {
            name: "agent_assist".to_string(),
            configuration,
        }),
    };
    let bytes = Bytes::from(document.encode_to_vec());
    (document, bytes)
}

async fn consumer_for(queue: Arc<InMemoryQueue>, store: InMemoryStore) -> Consumer {
    let deps = ConsumerDeps {
        poller: queue.clone(),
        acker: queue.clone(),
        fetcher: Arc::new(store),
        decoder: Arc::new(ProtobufDecoder),
        sender: Arc::new(HttpCallbackSender::with_client(
            reqwest::Client::new(),
            Duration::from_secs(5),
        )),
    };

    Consumer::connect(queue.as_ref(), "test-queue", deps, ConsumerSettings::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_created_document_triggers_callback_and_ack() {
    let (addr, hits) = spawn_receiver().await;
    let (document, bytes) = encoded_document(&format!("http://{addr}/callback"));
    let mut store = InMemoryStore::default();
    store.objects.insert("doc-1".to_string(), bytes);
    let queue = Arc::new(InMemoryQueue::with_messages(vec![QueueMessage::new(
        "msg-1",
        NOTIFICATION,
        "receipt-1",
    )]));
    let consumer = consumer_for(queue.clone(), store).await;

    let report = consumer.run_cycle(&CancellationToken::new()).await;

    assert_eq!(
        report,
        CycleReport {
            received: 1,
            acknowledged: 1,
            unacknowledged: 0,
            ack_failed: 0,
        }
    );
    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "/callback");
    assert_eq!(hits[0].1, document.to_json().unwrap());
    assert_eq!(queue.acked(), vec!["receipt-1".to_string()]);
}

#[tokio::test]
async fn test_rejected_callback_leaves_message_on_queue() {
    let (addr, hits) = spawn_receiver().await;
    let (_, bytes) = encoded_document(&format!("http://{addr}/elsewhere"));
    let mut store = InMemoryStore::default();
    store.objects.insert("doc-1".to_string(), bytes);
    let queue = Arc::new(InMemoryQueue::with_messages(vec![QueueMessage::new(
        "msg-1",
        NOTIFICATION,
        "receipt-1",
    )]));
    let consumer = consumer_for(queue.clone(), store).await;

    let report = consumer.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.unacknowledged, 1);
    assert_eq!(hits.lock().unwrap().len(), 1);
    assert!(queue.acked().is_empty());
}

#[tokio::test]
async fn test_missing_object_is_not_dispatched_or_acked() {
    let (_, hits) = spawn_receiver().await;
    let queue = Arc::new(InMemoryQueue::with_messages(vec![QueueMessage::new(
        "msg-1",
        NOTIFICATION,
        "receipt-1",
    )]));
    let consumer = consumer_for(queue.clone(), InMemoryStore::default()).await;

    let report = consumer.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.unacknowledged, 1);
    assert!(hits.lock().unwrap().is_empty());
    assert!(queue.acked().is_empty());
}

#[tokio::test]
async fn test_corrupt_document_is_not_dispatched_or_acked() {
    let (_, hits) = spawn_receiver().await;
    let mut store = InMemoryStore::default();
    store
        .objects
        .insert("doc-1".to_string(), Bytes::from_static(b"not a protobuf document"));
    let queue = Arc::new(InMemoryQueue::with_messages(vec![QueueMessage::new(
        "msg-1",
        NOTIFICATION,
        "receipt-1",
    )]));
    let consumer = consumer_for(queue.clone(), store).await;

    let report = consumer.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.unacknowledged, 1);
    assert!(hits.lock().unwrap().is_empty());
    assert!(queue.acked().is_empty());
}

#[tokio::test]
async fn test_run_loop_drains_queue_until_cancelled() {
    let (addr, hits) = spawn_receiver().await;
    let (_, bytes) = encoded_document(&format!("http://{addr}/callback"));
    let mut store = InMemoryStore::default();
    store.objects.insert("doc-1".to_string(), bytes);
    let messages = (0..12)
        .map(|i| QueueMessage::new(format!("msg-{i}"), NOTIFICATION, format!("receipt-{i}")))
        .collect();
    let queue = Arc::new(InMemoryQueue::with_messages(messages));
    let deps = ConsumerDeps {
        poller: queue.clone(),
        acker: queue.clone(),
        fetcher: Arc::new(store),
        decoder: Arc::new(ProtobufDecoder),
        sender: Arc::new(HttpCallbackSender::with_client(
            reqwest::Client::new(),
            Duration::from_secs(5),
        )),
    };
    let settings = ConsumerSettings {
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    };
    let consumer = Consumer::new(QueueHandle::new("memory://test-queue"), deps, settings);
    let shutdown = CancellationToken::new();

    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { consumer.run(shutdown).await }
    });

    // Batches of 10 then 2.
    for _ in 0..100 {
        if queue.acked().len() == 12 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(queue.acked().len(), 12);
    assert_eq!(queue.acked()[0], "receipt-0");
    assert_eq!(hits.lock().unwrap().len(), 12);
}
