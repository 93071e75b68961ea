//! Integration tests covering both serializer codecs through the public
//! [`Task::submit`]/broker path, rather than the crate-private encode/decode
//! functions exercised in the unit tests.

use std::sync::Arc;
use std::time::Duration;

use aio_pool::config::{SerializerKind, TaskConfig};
use aio_pool::distributed::broker::Broker;
use aio_pool::distributed::task::Task;
use aio_pool::infra::broker::memory::InMemoryBroker;

#[tokio::test]
async fn binary_serialized_calls_round_trip_through_the_broker() {
    let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
    let config = TaskConfig::new("binary-q", 1, "memory://", SerializerKind::Binary);
    let received = Arc::new(tokio::sync::Mutex::new(None));
    let received2 = Arc::clone(&received);

    let task = Task::new(config, Arc::clone(&broker), move |args: (u32, String)| {
        let received = Arc::clone(&received2);
        async move {
            *received.lock().await = Some(args);
        }
    })
    .unwrap();

    task.submit((7, "seven".to_string())).await.unwrap();
    task.start_consuming().await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if received.lock().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(*received.lock().await, Some((7, "seven".to_string())));
    task.close().await.unwrap();
}

#[tokio::test]
async fn structured_payloads_are_plain_json_on_the_wire() {
    let broker = InMemoryBroker::new();
    broker
        .push_blocking("json-q", serde_json::to_vec(&serde_json::json!({"args": 99})).unwrap())
        .await
        .unwrap();

    let bytes = broker
        .pop_blocking("json-q", Duration::from_millis(50))
        .await
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["args"], 99);
}
