use anyhow::{anyhow, bail, Result};
use minidex_core::{Address, Amount, Call, KeyPair, Transaction};
use minidex_rpc::{
    AccountResponse, AllowanceResponse, BalanceResponse, ContractResponse, PoolResponse,
    QuoteResponse, StatusResponse, TokenResponse, TxResponse, TxSubmitRequest,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for a minidex node
pub struct RpcClient {
    base_url: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(base_url: &str) -> Self {
        RpcClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        decode(response).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        self.get("/status").await
    }

    pub async fn nonce(&self, address: &Address) -> Result<u64> {
        let account: AccountResponse = self.get(&format!("/account/{}", address)).await?;
        Ok(account.nonce)
    }

    pub async fn token(&self, token: &Address) -> Result<TokenResponse> {
        self.get(&format!("/token/{}", token)).await
    }

    pub async fn balance(&self, token: &Address, holder: &Address) -> Result<Amount> {
        let response: BalanceResponse = self
            .get(&format!("/token/{}/balance/{}", token, holder))
            .await?;
        Ok(response.balance)
    }

    pub async fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount> {
        let response: AllowanceResponse = self
            .get(&format!("/token/{}/allowance/{}/{}", token, owner, spender))
            .await?;
        Ok(response.allowance)
    }

    pub async fn pool(
        &self,
        dex: &Address,
        token_x: &Address,
        token_y: &Address,
    ) -> Result<PoolResponse> {
        self.get(&format!("/dex/{}/pool/{}/{}", dex, token_x, token_y))
            .await
    }

    pub async fn quote(
        &self,
        dex: &Address,
        token_in: &Address,
        token_out: &Address,
        amount_in: Amount,
    ) -> Result<QuoteResponse> {
        self.get(&format!(
            "/dex/{}/quote/{}/{}/{}",
            dex, token_in, token_out, amount_in
        ))
        .await
    }

    pub async fn contract(&self, address: &Address) -> Result<ContractResponse> {
        self.get(&format!("/contract/{}", address)).await
    }

    /// Submit a signed transaction as-is
    pub async fn submit(&self, tx: Transaction) -> Result<TxResponse> {
        let url = format!("{}/tx", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&TxSubmitRequest { transaction: tx })
            .send()
            .await?;
        decode(response).await
    }

    /// Sign `call` with `signer` at `nonce`, submit it and require success
    pub async fn send_call(&self, signer: &KeyPair, nonce: u64, call: Call) -> Result<TxResponse> {
        let name = call.name();
        let tx = Transaction::new_signed(nonce, call, &signer.secret)?;
        let result = self.submit(tx).await?;

        if !result.success {
            bail!(
                "{} reverted: {}",
                name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(result)
    }

    /// Deploy a contract and return its address
    pub async fn deploy(&self, signer: &KeyPair, nonce: u64, call: Call) -> Result<Address> {
        let result = self.send_call(signer, nonce, call).await?;
        let value = result
            .return_value
            .ok_or_else(|| anyhow!("Deployment {} returned no address", result.hash))?;
        Ok(value.parse()?)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("no error message");
    bail!("Node returned {}: {}", status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = RpcClient::new("http://127.0.0.1:8545/");
        assert_eq!(client.base_url, "http://127.0.0.1:8545");
    }
}
