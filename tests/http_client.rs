//! Ledger client and sync loop against a mock node over real HTTP.

use std::net::TcpListener;
use std::sync::Arc;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use mychain_dashboard::endpoint::{EndpointResolver, Loopback};
use mychain_dashboard::error::Operation;
use mychain_dashboard::sync::{FormField, FETCH_FAILED};
use mychain_dashboard::{
    HttpLedgerClient, LedgerClient, LedgerError, PreviousHash, RefreshOutcome, SyncLoop,
    Transaction,
};

fn port_of(server: &ServerGuard) -> String {
    let host = server.host_with_port();
    host.rsplit(':').next().unwrap().to_string()
}

fn client_for(port: String) -> HttpLedgerClient {
    HttpLedgerClient::new(EndpointResolver::new(Some(port), Arc::new(Loopback)))
}

fn chain_body() -> serde_json::Value {
    json!({
        "chain": [
            {
                "index": 1,
                "timestamp": 1700000000.5,
                "transactions": [],
                "proof": 100,
                "previous_hash": 1
            },
            {
                "index": 2,
                "timestamp": 1700000030.0,
                "transactions": [
                    {"sender": "Alan", "recipient": "Bob", "amount": 5},
                    {"sender": "0", "recipient": "miner-node", "amount": 1}
                ],
                "proof": 35293,
                "previous_hash": "c5e3a9f0b1d2"
            }
        ],
        "length": 2
    })
}

#[tokio::test]
async fn fetch_chain_reads_snapshot() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/chain")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chain_body().to_string())
        .expect(1)
        .create_async()
        .await;

    let chain = client_for(port_of(&server)).fetch_chain().await.unwrap();

    mock.assert_async().await;
    assert_eq!(chain.length, 2);
    assert_eq!(chain.blocks()[0].previous_hash, PreviousHash::Integer(1));
    assert_eq!(
        chain.blocks()[1].previous_hash,
        PreviousHash::Text("c5e3a9f0b1d2".into())
    );
    assert_eq!(chain.transactions().count(), 2);
}

#[tokio::test]
async fn submit_posts_transaction_as_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/transactions/new")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "sender": "Alan",
            "recipient": "Bob",
            "amount": 5.0
        })))
        .with_status(201)
        .with_body(
            json!({
                "message": "Transaction will be added to Block 3",
                "index": 3,
                "transactions": [{"sender": "Alan", "recipient": "Bob", "amount": 5}],
                "proof": 35293,
                "previous_hash": "c5e3a9f0b1d2"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let result = client_for(port_of(&server))
        .submit_transaction(&Transaction::new("Alan", "Bob", 5.0))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.message, "Transaction will be added to Block 3");
    assert_eq!(result.index, Some(3));
}

#[tokio::test]
async fn non_success_status_is_a_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/chain")
        .with_status(500)
        .create_async()
        .await;

    let err = client_for(port_of(&server)).fetch_chain().await.unwrap_err();

    assert_eq!(
        err,
        LedgerError::Remote {
            operation: Operation::FetchChain,
            status: 500,
            status_text: "Internal Server Error".into(),
        }
    );
}

#[tokio::test]
async fn rejected_submit_names_the_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/transactions/new")
        .with_status(400)
        .create_async()
        .await;

    let err = client_for(port_of(&server))
        .submit_transaction(&Transaction::new("Alan", "Bob", 5.0))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Error creating transaction: Bad Request");
}

#[tokio::test]
async fn unknown_status_falls_back_to_its_code() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/transactions/new")
        .with_status(599)
        .create_async()
        .await;

    let err = client_for(port_of(&server))
        .submit_transaction(&Transaction::new("Alan", "Bob", 5.0))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Error creating transaction: 599");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/chain")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let err = client_for(port_of(&server)).fetch_chain().await.unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Decode {
            operation: Operation::FetchChain,
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_node_is_a_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = client_for(port.to_string()).fetch_chain().await.unwrap_err();

    assert!(matches!(err, LedgerError::Network { .. }));
    assert_eq!(err.to_string(), "Failed to fetch");
}

#[tokio::test]
async fn sync_loop_keeps_last_good_chain_when_node_fails() {
    let mut server = Server::new_async().await;
    let sync = SyncLoop::new(Arc::new(client_for(port_of(&server))));

    let ok = server
        .mock("GET", "/chain")
        .with_status(200)
        .with_body(chain_body().to_string())
        .create_async()
        .await;
    assert_eq!(sync.refresh().await, RefreshOutcome::Applied);
    ok.remove_async().await;

    let _failing = server
        .mock("GET", "/chain")
        .with_status(500)
        .create_async()
        .await;
    assert_eq!(sync.refresh().await, RefreshOutcome::Failed);

    assert_eq!(sync.last_error().as_deref(), Some(FETCH_FAILED));
    let view = sync.view();
    assert_eq!(view.block_count, 2);
    assert_eq!(view.transactions, vec![Transaction::new("Alan", "Bob", 5.0)]);
}

#[tokio::test]
async fn submit_through_sync_loop_refreshes_once() {
    let mut server = Server::new_async().await;
    let submit = server
        .mock("POST", "/transactions/new")
        .with_status(201)
        .with_body(json!({"message": "Transaction will be added to Block 3"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let chain = server
        .mock("GET", "/chain")
        .with_status(200)
        .with_body(chain_body().to_string())
        .expect(1)
        .create_async()
        .await;

    let sync = SyncLoop::new(Arc::new(client_for(port_of(&server))));
    sync.set_field(FormField::Sender, "Alan");
    sync.set_field(FormField::Recipient, "Bob");
    sync.set_field(FormField::Amount, "5");
    sync.submit().await.unwrap();

    submit.assert_async().await;
    chain.assert_async().await;
    assert_eq!(sync.view().transaction_count(), 1);
    assert!(sync.form().amount.is_empty());
}
