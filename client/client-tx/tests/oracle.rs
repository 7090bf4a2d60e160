mod common;

use mockito::Matcher;
use serde_json::json;

use solana_sdk::pubkey::Pubkey;

use lander_client_api::errors::{ClientError, ClientSpecificError, RpcClientSpecificError};
use lander_client_tx::oracle::{probe_percentile_support, recommended_fee, PercentileSupport};
use lander_client_tx::priority_fee::Percentile;

use common::*;

#[tokio::test]
async fn endpoint_answering_percentile_queries_is_detected() {
    let client = MockClient::new().with_percentile_fees(&[10, 20]);

    assert_eq!(probe_percentile_support(&client).await, PercentileSupport::Endpoint);
    assert_eq!(client.state().fee_queries, vec![(vec![], Some(5000))]);
}

#[tokio::test]
async fn endpoint_rejecting_percentile_queries_is_unsupported() {
    let client = MockClient::new().with_fees(&[10, 20]);

    assert_eq!(
        probe_percentile_support(&client).await,
        PercentileSupport::Unsupported
    );
}

#[tokio::test]
async fn plain_endpoint_ranks_fees_locally() {
    let client = MockClient::new().with_fees(&[0, 100, 200, 300, 400]);
    let account = Pubkey::new_unique();

    let fee = recommended_fee(&client, PercentileSupport::Unsupported, &[account], Percentile::P75)
        .await
        .unwrap();

    assert_eq!(fee, 400);
    assert_eq!(client.state().fee_queries, vec![(vec![account], None)]);
}

#[tokio::test]
async fn cluster_node_is_asked_over_its_advertised_rpc_address() {
    let mut server = mockito::Server::new_async().await;
    let account = Pubkey::new_unique();
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "getRecentPrioritizationFees",
            "params": [{
                "lockedWritableAccounts": [account.to_string()],
                "percentile": 9500,
            }],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"jsonrpc":"2.0","id":1,"result":[{"slot":1,"prioritizationFee":0},{"slot":2,"prioritizationFee":30},{"slot":3,"prioritizationFee":50},{"slot":4,"prioritizationFee":70}]}"#,
        )
        .create_async()
        .await;

    let client = MockClient::new().with_cluster_node_rpc(&server.host_with_port());

    let fee = recommended_fee(&client, PercentileSupport::ClusterNode, &[account], Percentile::P95)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(fee, 50);
    assert!(client.state().fee_queries.is_empty());
}

#[tokio::test]
async fn missing_cluster_rpc_address_is_an_error_not_a_zero_fee() {
    let client = MockClient::new().with_fees(&[100]);

    let error = recommended_fee(
        &client,
        PercentileSupport::ClusterNode,
        &[Pubkey::new_unique()],
        Percentile::P50,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        ClientError::ClientSpecific(ClientSpecificError::RpcClient(
            RpcClientSpecificError::Custom(ref message)
        )) if message.contains("no cluster node advertises an rpc address")
    ));
}
