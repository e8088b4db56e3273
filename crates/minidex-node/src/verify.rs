use std::path::Path;

use anyhow::{bail, Result};
use minidex_core::{Address, ContractKind};
use serde::Serialize;
use tracing::{error, info};

use crate::client::RpcClient;
use crate::deploy::{load_record, required, MOCK_TOKENS};

/// Body posted to the explorer for one contract
#[derive(Debug, Serialize)]
pub struct VerificationRequest {
    pub address: Address,
    pub contract: String,
    pub constructor_arguments: Vec<String>,
    pub code_hash: String,
}

struct Expected {
    label: &'static str,
    address: Address,
    kind: ContractKind,
    args: Vec<String>,
}

/// Check and submit every recorded contract, stopping at the first failure
pub async fn verify_contracts(
    client: &RpcClient,
    record_path: &Path,
    explorer_url: Option<&str>,
    api_key: &str,
) -> Result<()> {
    let record = load_record(record_path)?;
    let Some(explorer_url) = explorer_url else {
        bail!("Network has no explorer_url configured");
    };

    let token_args = |i: usize| vec![MOCK_TOKENS[i].0.to_string(), MOCK_TOKENS[i].1.to_string()];
    let contracts = [
        Expected {
            label: "Token A",
            address: required(record.token_a, "tokenA")?,
            kind: ContractKind::MockToken,
            args: token_args(0),
        },
        Expected {
            label: "Token B",
            address: required(record.token_b, "tokenB")?,
            kind: ContractKind::MockToken,
            args: token_args(1),
        },
        Expected {
            label: "MinimalDex",
            address: required(record.dex, "dex")?,
            kind: ContractKind::MinimalDex,
            args: Vec::new(),
        },
    ];

    let http = reqwest::Client::new();
    for expected in contracts {
        println!("Verifying {} at {}...", expected.label, expected.address);
        if let Err(e) = verify_one(client, &http, explorer_url, api_key, &expected).await {
            error!("Verification of {} failed: {}", expected.label, e);
            return Err(e);
        }
        println!("{} verified successfully", expected.label);
    }

    Ok(())
}

async fn verify_one(
    client: &RpcClient,
    http: &reqwest::Client,
    explorer_url: &str,
    api_key: &str,
    expected: &Expected,
) -> Result<()> {
    let contract = client.contract(&expected.address).await?;

    if contract.kind != expected.kind {
        bail!(
            "{} is a {}, expected {}",
            expected.address,
            contract.contract_name,
            expected.kind.contract_name()
        );
    }
    if contract.constructor_args != expected.args {
        bail!(
            "Constructor arguments {:?} do not match {:?}",
            contract.constructor_args,
            expected.args
        );
    }

    let request = VerificationRequest {
        address: expected.address,
        contract: contract.contract_name,
        constructor_arguments: contract.constructor_args,
        code_hash: contract.code_hash,
    };

    let response = http
        .post(explorer_url)
        .query(&[("apikey", api_key)])
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Explorer returned {}: {}", status, body);
    }

    info!("Explorer accepted {}", expected.address);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use minidex_core::KeyPair;

    use super::*;
    use crate::deploy::{deploy_dex, deploy_tokens, save_record};
    use crate::node::test_support::{spawn_local_node, temp_record_path};

    type Submissions = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    async fn spawn_explorer(status: StatusCode) -> (String, Submissions) {
        let submissions: Submissions = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/api/verify",
                post(
                    move |State(seen): State<Submissions>,
                          Query(params): Query<std::collections::HashMap<String, String>>,
                          Json(body): Json<serde_json::Value>| async move {
                        let key = params.get("apikey").cloned().unwrap_or_default();
                        seen.lock().unwrap().push((key, body));
                        status
                    },
                ),
            )
            .with_state(Arc::clone(&submissions));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/api/verify", addr), submissions)
    }

    async fn deployed(name: &str) -> (RpcClient, std::path::PathBuf) {
        let client = RpcClient::new(&spawn_local_node().await);
        let signer = KeyPair::generate();
        let path = temp_record_path(name);
        deploy_tokens(&client, &signer, &path).await.unwrap();
        deploy_dex(&client, &signer, &path).await.unwrap();
        (client, path)
    }

    #[tokio::test]
    async fn test_verify_submits_all_contracts() {
        let (client, path) = deployed("verify").await;
        let (explorer, submissions) = spawn_explorer(StatusCode::OK).await;

        verify_contracts(&client, &path, Some(&explorer), "DUMMY_KEY")
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        let seen = submissions.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "DUMMY_KEY");
        assert_eq!(seen[0].1["contract"], "MockERC20");
        assert_eq!(
            seen[1].1["constructor_arguments"],
            serde_json::json!(["Mock USDT", "USDT"])
        );
        assert_eq!(seen[2].1["contract"], "MinimalDex");
        assert_eq!(seen[2].1["constructor_arguments"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_verify_stops_at_first_rejection() {
        let (client, path) = deployed("verify-reject").await;
        let (explorer, submissions) = spawn_explorer(StatusCode::BAD_REQUEST).await;

        let result = verify_contracts(&client, &path, Some(&explorer), "key").await;
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
        assert_eq!(submissions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_detects_swapped_addresses() {
        let (client, path) = deployed("verify-swapped").await;
        let mut record = load_record(&path).unwrap();
        std::mem::swap(&mut record.token_a, &mut record.token_b);
        save_record(&path, &record).unwrap();
        let (explorer, submissions) = spawn_explorer(StatusCode::OK).await;

        let err = verify_contracts(&client, &path, Some(&explorer), "key")
            .await
            .unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("do not match"));
        assert!(submissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_requires_explorer() {
        let (client, path) = deployed("verify-no-explorer").await;

        let err = verify_contracts(&client, &path, None, "key").await.unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("explorer_url"));
    }
}
