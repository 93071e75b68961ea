//! Integration tests for [`Task`], including the back-pressure contract between
//! a task's consumer loop and its locally-owned pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aio_pool::config::{SerializerKind, TaskConfig};
use aio_pool::distributed::broker::Broker;
use aio_pool::distributed::task::{batch_consume, ConsumableTask, Task};
use aio_pool::infra::broker::memory::InMemoryBroker;

#[tokio::test]
async fn consumer_never_pops_more_than_the_local_pool_can_immediately_run() {
    let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
    // One worker, no staging room: the consumer must never hold more than one
    // payload it cannot yet hand to a worker.
    let config = TaskConfig::new("backpressure-q", 1, "memory://", SerializerKind::Structured)
        .with_max_queue_size(0);

    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_observed = Arc::new(AtomicUsize::new(0));
    let in_flight2 = Arc::clone(&in_flight);
    let max_observed2 = Arc::clone(&max_observed);

    let task = Task::new(config, Arc::clone(&broker), move |_: ()| {
        let in_flight = Arc::clone(&in_flight2);
        let max_observed = Arc::clone(&max_observed2);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_observed.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    })
    .unwrap();

    for _ in 0..10 {
        task.submit(()).await.unwrap();
    }

    task.start_consuming().await.unwrap();
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            if task.get_queue_size().await.unwrap() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    // Drain whatever unit is still executing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(max_observed.load(Ordering::SeqCst) <= 1);
    task.close().await.unwrap();
}

#[tokio::test]
async fn batch_consume_starts_every_task_concurrently() {
    let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
    let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));

    let mut tasks: Vec<Arc<dyn ConsumableTask>> = Vec::new();
    for name in ["alpha", "beta", "gamma"] {
        let config = TaskConfig::new(name, 1, "memory://", SerializerKind::Structured);
        let seen = Arc::clone(&seen);
        let label = name.to_string();
        let task = Arc::new(
            Task::new(config, Arc::clone(&broker), move |_: ()| {
                let seen = Arc::clone(&seen);
                let label = label.clone();
                async move {
                    seen.lock().await.push(label);
                }
            })
            .unwrap(),
        );
        broker.push_blocking(name, serde_json::to_vec(&serde_json::json!({"args": null})).unwrap())
            .await
            .unwrap();
        tasks.push(task);
    }

    batch_consume(&tasks).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if seen.lock().await.len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let mut names = seen.lock().await.clone();
    names.sort();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);

    for task in &tasks {
        task.stop().await.unwrap();
    }
}

#[tokio::test]
async fn stop_halts_consumption_without_losing_in_flight_work() {
    let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
    let config = TaskConfig::new("stoppable-q", 2, "memory://", SerializerKind::Structured);
    let completed = Arc::new(AtomicUsize::new(0));
    let completed2 = Arc::clone(&completed);

    let task = Task::new(config, Arc::clone(&broker), move |_: ()| {
        let completed = Arc::clone(&completed2);
        async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            completed.fetch_add(1, Ordering::SeqCst);
        }
    })
    .unwrap();

    task.submit(()).await.unwrap();
    task.start_consuming().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    task.stop().await.unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}
