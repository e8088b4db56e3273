use std::path::Path;

use anyhow::Result;
use minidex_core::{format_units, parse_units, Address, Amount, Call, KeyPair, MOCK_DECIMALS};
use tracing::info;

use crate::client::RpcClient;
use crate::deploy::{load_record, required};

/// Run the approve, add-liquidity and swap sequence against the recorded deployment
pub async fn interact(client: &RpcClient, signer: &KeyPair, record_path: &Path) -> Result<()> {
    let record = load_record(record_path)?;
    let token_a = required(record.token_a, "tokenA")?;
    let token_b = required(record.token_b, "tokenB")?;
    let dex = required(record.dex, "dex")?;
    let owner = signer.address();

    println!("Using token A: {}", token_a);
    println!("Using token B: {}", token_b);
    println!("Using MinimalDex: {}", dex);

    let balance_a = client.balance(&token_a, &owner).await?;
    println!("Token A balance: {} tokens", format_units(balance_a, MOCK_DECIMALS));

    // One lookup, then sequential local increments.
    let mut nonce = client.nonce(&owner).await?;

    for (label, token, whole) in [("A", token_a, "110"), ("B", token_b, "60")] {
        let required_allowance = parse_units(whole, MOCK_DECIMALS)?;
        let current = client.allowance(&token, &owner, &dex).await?;
        if current < required_allowance {
            println!("Approving DEX to spend {} token {}...", whole, label);
            let call = Call::Approve {
                token,
                spender: dex,
                amount: required_allowance,
            };
            client.send_call(signer, nonce, call).await?;
            nonce += 1;
            println!("Approved DEX for token {}", label);
        } else {
            println!("Sufficient allowance for token {}", label);
        }
    }

    println!("Adding liquidity...");
    let call = Call::AddLiquidity {
        dex,
        token_x: token_a,
        token_y: token_b,
        amount_x: parse_units("100", MOCK_DECIMALS)?,
        amount_y: parse_units("50", MOCK_DECIMALS)?,
    };
    client.send_call(signer, nonce, call).await?;
    nonce += 1;
    println!("Liquidity added");

    println!("Swapping 10 token A for token B...");
    let call = Call::Swap {
        dex,
        token_in: token_a,
        token_out: token_b,
        amount_in: parse_units("10", MOCK_DECIMALS)?,
    };
    let result = client.send_call(signer, nonce, call).await?;
    info!("Swap {} returned {:?}", result.hash, result.return_value);
    println!("Swap complete");

    let new_a = client.balance(&token_a, &owner).await?;
    let new_b = client.balance(&token_b, &owner).await?;
    println!("New token A balance: {} tokens", format_units(new_a, MOCK_DECIMALS));
    println!("New token B balance: {} tokens", format_units(new_b, MOCK_DECIMALS));

    Ok(())
}

/// Print the recorded pool and what `amount` whole token A would buy
pub async fn show_pool(client: &RpcClient, record_path: &Path, amount: &str) -> Result<()> {
    let record = load_record(record_path)?;
    let token_a = required(record.token_a, "tokenA")?;
    let token_b = required(record.token_b, "tokenB")?;
    let dex = required(record.dex, "dex")?;

    let decimals_a = client.token(&token_a).await?.decimals;
    let decimals_b = client.token(&token_b).await?.decimals;

    let pool = client.pool(&dex, &token_a, &token_b).await?;
    println!("Pool {} / {} on {}", token_a, token_b, dex);
    println!("  Reserve A: {}", format_units(pool.reserve_a, decimals_a));
    println!("  Reserve B: {}", format_units(pool.reserve_b, decimals_b));

    let amount_in = parse_units(amount, decimals_a)?;
    print_quote(client, &dex, &token_a, &token_b, amount_in, decimals_b).await;

    Ok(())
}

async fn print_quote(
    client: &RpcClient,
    dex: &Address,
    token_in: &Address,
    token_out: &Address,
    amount_in: Amount,
    decimals_out: u8,
) {
    // An empty pool has no price; report it instead of failing the command.
    match client.quote(dex, token_in, token_out, amount_in).await {
        Ok(quote) => println!(
            "  Quote: {} in -> {} out",
            quote.amount_in,
            format_units(quote.amount_out, decimals_out)
        ),
        Err(e) => println!("  Quote unavailable: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{deploy_dex, deploy_tokens};
    use crate::node::test_support::{spawn_local_node, temp_record_path};

    #[tokio::test]
    async fn test_interaction_sequence() {
        let client = RpcClient::new(&spawn_local_node().await);
        let signer = KeyPair::generate();
        let path = temp_record_path("interact");

        deploy_tokens(&client, &signer, &path).await.unwrap();
        let record = deploy_dex(&client, &signer, &path).await.unwrap();
        let (token_a, token_b, dex) = (
            record.token_a.unwrap(),
            record.token_b.unwrap(),
            record.dex.unwrap(),
        );

        interact(&client, &signer, &path).await.unwrap();

        let pool = client.pool(&dex, &token_a, &token_b).await.unwrap();
        assert_eq!(pool.reserve_a, parse_units("110", MOCK_DECIMALS).unwrap());
        assert_eq!(pool.reserve_b, 45_454_545_454_545_454_546);

        // 3 deployments, 2 approvals, add liquidity, swap
        assert_eq!(client.nonce(&signer.address()).await.unwrap(), 7);
        assert_eq!(
            client.allowance(&token_a, &signer.address(), &dex).await.unwrap(),
            0
        );
        assert_eq!(
            client.allowance(&token_b, &signer.address(), &dex).await.unwrap(),
            parse_units("10", MOCK_DECIMALS).unwrap()
        );

        // Token B allowance is still short of 60, so both are approved again.
        interact(&client, &signer, &path).await.unwrap();
        assert_eq!(client.nonce(&signer.address()).await.unwrap(), 11);

        show_pool(&client, &path, "1").await.unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_interact_requires_dex() {
        let client = RpcClient::new(&spawn_local_node().await);
        let signer = KeyPair::generate();
        let path = temp_record_path("interact-no-dex");

        deploy_tokens(&client, &signer, &path).await.unwrap();
        let err = interact(&client, &signer, &path).await.unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("no dex address"));
    }
}
