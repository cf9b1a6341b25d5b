// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use bookiki_edge::led::LedClient;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::common::{lit, memory_controller, memory_controller_with_hold, start_iot_server, wait_for};

fn shelf_message(shelf_id: i64, book_id: i64) -> String {
    json!({
        "type": "BOOK_RETURN",
        "bookId": book_id,
        "shelf": {"id": shelf_id, "shelfNumber": 1, "lineNumber": 1, "category": "NOVEL"},
        "timestamp": "2025-02-14T10:00:00"
    })
    .to_string()
}

#[tokio::test]
async fn test_lights_shelf_from_message() {
    let server = start_iot_server(
        vec![json!({"type": "CONNECT_SUCCESS"}).to_string(), shelf_message(2, 41)],
        false,
    )
    .await;
    let (controller, driver) = memory_controller();
    let client = LedClient::new(server.url.clone(), Duration::from_millis(50), controller);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(client.run(shutdown.clone()));

    wait_for("shelf 2 to light", || {
        driver.frames().iter().any(|f| lit(f) == (9..=16).collect::<Vec<_>>())
    })
    .await;

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("client did not stop")
        .unwrap()
        .unwrap();

    let frames = driver.frames();
    // Off at start, and the strip ends dark
    assert!(lit(&frames[0]).is_empty());
    assert!(lit(frames.last().unwrap()).is_empty());
    // Green in GRB order
    let lit_frame = frames.iter().find(|f| !lit(f).is_empty()).unwrap();
    assert_eq!(&lit_frame[27..30], &[255, 0, 0]);
}

#[tokio::test]
async fn test_ignores_invalid_messages() {
    let server = start_iot_server(
        vec![
            "garbage".to_string(),
            json!({"type": "NOTICE"}).to_string(),
            shelf_message(9, 1),
            shelf_message(1, 2),
        ],
        false,
    )
    .await;
    let (controller, driver) = memory_controller();
    let client = LedClient::new(server.url.clone(), Duration::from_millis(50), controller);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(client.run(shutdown.clone()));

    wait_for("shelf 1 to light", || {
        driver.frames().iter().any(|f| !lit(f).is_empty())
    })
    .await;
    shutdown.cancel();
    task.await.unwrap().unwrap();

    let lit_frames: Vec<_> = driver
        .frames()
        .into_iter()
        .filter(|f| !lit(f).is_empty())
        .collect();
    assert_eq!(lit_frames.len(), 1);
    assert_eq!(lit(&lit_frames[0]), (0..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_reconnects_after_close() {
    let server = start_iot_server(vec![json!({"type": "CONNECT_SUCCESS"}).to_string()], true).await;
    let (controller, _driver) = memory_controller();
    // Only failed connects wait out the delay
    let client = LedClient::new(server.url.clone(), Duration::from_secs(30), controller);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(client.run(shutdown.clone()));

    wait_for("a reconnect", || server.accepts() >= 2).await;
    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_keeps_retrying_unreachable_server() {
    let (controller, driver) = memory_controller();
    let client = LedClient::new("ws://127.0.0.1:1/iot/ws", Duration::from_millis(20), controller);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(client.run(shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!task.is_finished());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(driver.frames().iter().all(|f| lit(f).is_empty()));
}

#[tokio::test]
async fn test_shutdown_cuts_hold_and_drops_queue() {
    let server = start_iot_server(vec![shelf_message(1, 1), shelf_message(2, 2)], false).await;
    let (controller, driver) = memory_controller_with_hold(3);
    let client = LedClient::new(server.url.clone(), Duration::from_millis(50), controller);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(client.run(shutdown.clone()));

    wait_for("shelf 1 to light", || {
        driver.frames().iter().any(|f| !lit(f).is_empty())
    })
    .await;

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("shutdown waited for the hold")
        .unwrap()
        .unwrap();

    let frames = driver.frames();
    assert!(lit(frames.last().unwrap()).is_empty());
    // Shelf 2 was still queued and never lit
    assert!(frames.iter().all(|f| lit(f) != (9..=16).collect::<Vec<_>>()));
}
