//! # Node Flows
//!
//! Two real [`MonitorNode`]s on 127.0.0.1 with ephemeral ports: actions
//! reported over HTTP on one node reach the other over the TCP peer
//! transport, and observers on either node see the result over WebSocket.

use monitor_node::{MonitorNode, NodeConfig, NodeError};
use std::path::Path;

/// Configuration for a node bound to loopback ephemeral ports.
pub fn loopback_config(id: &str, asset_dir: &Path) -> NodeConfig {
    NodeConfig {
        node_id: Some(id.to_string()),
        advertised_host: Some("127.0.0.1".to_string()),
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        peer_host: "127.0.0.1".to_string(),
        peer_port: 0,
        asset_dir: asset_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Start two nodes that list each other as peers.
///
/// The second node learns the first from configuration. The first learns
/// the second afterwards, once its ephemeral port is known.
pub async fn start_pair(asset_dir: &Path) -> Result<(MonitorNode, MonitorNode), NodeError> {
    let a = MonitorNode::start(loopback_config("node-a", asset_dir)).await?;
    let b = MonitorNode::start(NodeConfig {
        peers: vec![a.member().clone()],
        ..loopback_config("node-b", asset_dir)
    })
    .await?;
    a.membership().replace_peers(vec![b.member().clone()]);
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::cluster_flows::{placements, wait_until};
    use futures::{SinkExt, StreamExt};
    use shard_topology::{decode_snapshot, Action, TopologyApi};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    const SETTLE: Duration = Duration::from_secs(5);

    async fn post_action(node: &MonitorNode, body: String) -> u16 {
        reqwest::Client::new()
            .post(format!("http://{}/actions", node.http_addr()))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    }

    #[tokio::test]
    async fn test_http_report_reaches_peer_over_tcp() {
        let assets = tempfile::tempdir().unwrap();
        let (a, b) = start_pair(assets.path()).await.unwrap();

        let status = post_action(
            &a,
            Action::start("node-a", "s0", "e42").to_json().unwrap(),
        )
        .await;
        assert_eq!(status, 202);

        for node in [&a, &b] {
            assert!(
                wait_until(node.topology(), |root| placements(root).len() == 1, SETTLE).await,
                "{} missed the action",
                node.member()
            );
        }

        // Relocation reported on the other node flows back.
        assert_eq!(
            post_action(&b, Action::start("node-b", "s1", "e42").to_json().unwrap()).await,
            202
        );
        for node in [&a, &b] {
            assert!(
                wait_until(
                    node.topology(),
                    |root| root.children.len() == 1 && root.children[0].name == "node-b",
                    SETTLE
                )
                .await
            );
        }

        a.shutdown().await;
        b.shutdown().await;
    }

    #[tokio::test]
    async fn test_observer_gets_snapshot_then_close_on_binary() {
        let assets = tempfile::tempdir().unwrap();
        let (a, b) = start_pair(assets.path()).await.unwrap();

        a.topology()
            .submit(Action::start("node-a", "s0", "e1"))
            .await
            .unwrap();
        assert!(wait_until(b.topology(), |root| !root.children.is_empty(), SETTLE).await);

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/events", b.http_addr()))
            .await
            .unwrap();

        ws.send(Message::text("refresh")).await.unwrap();
        let document = match ws.next().await {
            Some(Ok(Message::Text(text))) => text.to_string(),
            other => panic!("expected a snapshot, got {other:?}"),
        };
        let root = decode_snapshot(&document).unwrap();
        assert_eq!(placements(&root), placements(&a.topology().snapshot()));

        ws.send(Message::binary(vec![0u8, 1, 2])).await.unwrap();
        match ws.next().await {
            Some(Ok(Message::Close(Some(frame)))) => assert_eq!(u16::from(frame.code), 1003),
            other => panic!("expected a close frame, got {other:?}"),
        }
        drop(ws);

        a.shutdown().await;
        b.shutdown().await;
    }

    #[tokio::test]
    async fn test_pages_and_snapshot_routes() {
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("monitor.html"), "<html>monitor</html>").unwrap();
        let node = MonitorNode::start(loopback_config("solo", assets.path()))
            .await
            .unwrap();
        let base = format!("http://{}", node.http_addr());
        let client = reqwest::Client::new();

        let page = client.get(format!("{base}/")).send().await.unwrap();
        assert_eq!(page.status().as_u16(), 200);
        assert_eq!(page.text().await.unwrap(), "<html>monitor</html>");

        let missing = client.get(format!("{base}/monitor3")).send().await.unwrap();
        assert_eq!(missing.status().as_u16(), 503);

        let unknown = client.get(format!("{base}/elsewhere")).send().await.unwrap();
        assert_eq!(unknown.status().as_u16(), 404);

        let snapshot = client.get(format!("{base}/snapshot")).send().await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&snapshot.text().await.unwrap()).unwrap();
        assert_eq!(body["name"], "cluster");
        assert_eq!(body["type"], "cluster");

        let rejected = client
            .post(format!("{base}/actions"))
            .body("{\"kind\":\"pause\"}")
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status().as_u16(), 400);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_peer_does_not_block_local_apply() {
        let assets = tempfile::tempdir().unwrap();
        let dead_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let node = MonitorNode::start(NodeConfig {
            peers: monitor_node::parse_peers(&format!("ghost@127.0.0.1:{dead_port}")).unwrap(),
            delivery_timeout_ms: 200,
            ..loopback_config("node-a", assets.path())
        })
        .await
        .unwrap();

        node.topology()
            .submit(Action::start("node-a", "s0", "e1"))
            .await
            .unwrap();
        assert!(wait_until(node.topology(), |root| !root.children.is_empty(), SETTLE).await);

        node.shutdown().await;
    }
}
