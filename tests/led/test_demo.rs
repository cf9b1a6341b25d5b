// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use bookiki_edge::led::{rainbow, ColorOrder, DemoClient, DemoServer};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use super::common::{lit, memory_controller, wait_for};

#[tokio::test]
async fn test_server_relays_only_valid_numbers() {
    let (input, input_rx) = mpsc::channel(8);
    let server = DemoServer::new("127.0.0.1:0", 26);
    let handle = server.start(input_rx).await.unwrap();

    let url = format!("ws://{}", handle.local_addr());
    let (mut ws, _) = connect_async(url).await.unwrap();
    wait_for("the client to register", || handle.client_count() == 1).await;

    for line in ["0", "27", "abc", "5"] {
        input.send(line.to_string()).await.unwrap();
    }

    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(msg, Message::Text("5".to_string()));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_server_broadcasts_to_every_client() {
    let (input, input_rx) = mpsc::channel(8);
    let handle = DemoServer::new("127.0.0.1:0", 26)
        .start(input_rx)
        .await
        .unwrap();

    let url = format!("ws://{}", handle.local_addr());
    let (mut first, _) = connect_async(url.as_str()).await.unwrap();
    let (mut second, _) = connect_async(url.as_str()).await.unwrap();
    wait_for("both clients", || handle.client_count() == 2).await;

    input.send("26".to_string()).await.unwrap();

    for ws in [&mut first, &mut second] {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(msg, Message::Text("26".to_string()));
    }

    handle.shutdown().await;
}

#[tokio::test]
async fn test_demo_client_lights_rainbow_led() {
    let (input, input_rx) = mpsc::channel(8);
    let handle = DemoServer::new("127.0.0.1:0", 26)
        .start(input_rx)
        .await
        .unwrap();

    let (controller, driver) = memory_controller();
    let client = DemoClient::new(format!("ws://{}", handle.local_addr()), controller);
    let task = tokio::spawn(client.run(CancellationToken::new()));

    wait_for("the demo client", || handle.client_count() == 1).await;
    input.send("3".to_string()).await.unwrap();

    wait_for("LED 3", || driver.frames().iter().any(|f| lit(f) == vec![2])).await;
    let frame = driver.last_frame().unwrap();
    assert_eq!(&frame[6..9], &rainbow(26)[2].to_wire(ColorOrder::Grb));

    // Server shutdown closes the socket and the client turns the strip off
    handle.shutdown().await;
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("client did not stop")
        .unwrap()
        .unwrap();
    assert!(lit(&driver.last_frame().unwrap()).is_empty());
}

#[tokio::test]
async fn test_server_stops_while_input_is_open() {
    let (input, input_rx) = mpsc::channel::<String>(8);
    let handle = DemoServer::new("127.0.0.1:0", 26).start(input_rx).await.unwrap();
    let (_ws, _) = connect_async(format!("ws://{}", handle.local_addr())).await.unwrap();
    wait_for("the client to register", || handle.client_count() == 1).await;

    let token = CancellationToken::new();
    let serving = tokio::spawn(handle.serve_until(token.clone()));
    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), serving)
        .await
        .expect("server waited for input")
        .unwrap();

    // Nothing reads the input any more
    assert!(input.is_closed());
}

#[tokio::test]
async fn test_demo_client_fails_without_server() {
    let (controller, _driver) = memory_controller();
    let client = DemoClient::new("ws://127.0.0.1:1", controller);
    assert!(client.run(CancellationToken::new()).await.is_err());
}
