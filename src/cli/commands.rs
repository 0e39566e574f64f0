//! CLI command implementations

use alloy::primitives::Address;
use anyhow::{Context, Result};
use dialoguer::Confirm;
use solana_client::nonblocking::rpc_client::RpcClient;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::clmm::PoolPlan;
use crate::config::Config;
use crate::pipeline::{self, Launch};
use crate::pump::price::{
    format_price, lamports_to_sol, price_per_token_sol, tokens_to_human, DEFAULT_TOKEN_DECIMALS,
};
use crate::pump::program::pump_fun_url;
use crate::wormhole::{MessageId, WormholescanClient};

/// Run the whole launch
pub async fn run(config: &Config, yes: bool, report_path: Option<&Path>) -> Result<()> {
    let launch = Launch::new(config.clone())?;

    println!("\n=== LAUNCH ===\n");
    println!("Network:  {}", config.network);
    println!("Token:    {} ({})", config.token.name, config.token.symbol);
    println!("Mint:     {}", launch.mint());
    println!("Creator:  {}", launch.creator());
    println!("Buy:      {} SOL", config.pump.buy_amount_sol);
    println!(
        "Pool:     {} positions from {} WETH/token, fee {}",
        config.clmm.num_positions, config.clmm.initial_price, config.clmm.fee_tier
    );

    if !yes && !confirm("Create, bridge and deploy this token?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let (report, result) = launch.run().await;

    println!("\n=== RESULT ===\n");
    if let Some(reason) = &report.stopped {
        println!("Stopped: {}", reason);
    }
    if let Some(failed) = &report.failed {
        println!("Failed during {}: {}", failed.step, failed.error);
    }
    if let Some(signature) = &report.create_signature {
        println!("Created:  {}", signature);
    }
    println!("Pump.fun: {}", report.pump_url);
    if let Some(wrapped) = report.wrapped_token {
        println!("Wrapped:  {}", wrapped);
    }
    if let Some(transfer) = &report.transfer {
        match (&transfer.redeem_tx, &transfer.error) {
            (_, Some(e)) => println!("Transfer {}: FAILED ({})", transfer.message_id, e),
            (Some(tx), None) => println!("Transfer {}: redeemed in {}", transfer.message_id, tx),
            (None, None) => println!("Transfer {}: already redeemed", transfer.message_id),
        }
    }
    if let Some(pool) = report.pool {
        println!("Pool:     {}", pool);
    }
    for position in &report.positions {
        println!(
            "  #{} ticks [{}, {}] NFT {}",
            position.index, position.tick_lower, position.tick_upper, position.token_id
        );
    }

    if let Some(path) = report_path {
        report.save(path).await?;
    }

    result?;
    Ok(())
}

/// Create the token on pump.fun only
pub async fn create(config: &Config, yes: bool) -> Result<()> {
    let launch = Launch::new(config.clone())?;

    if let Some(curve) = launch.status().await?.bonding_curve {
        println!("{} already exists (complete: {})", launch.mint(), curve.complete);
        println!("{}", pump_fun_url(&launch.mint()));
        return Ok(());
    }

    println!(
        "Creating {} ({}) as {} with a {} SOL buy",
        config.token.name,
        config.token.symbol,
        launch.mint(),
        config.pump.buy_amount_sol
    );
    if !yes && !confirm("Send the create transaction?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let created = launch.create().await?;
    println!("\nSignature: {}", created.signature);
    println!("Metadata:  {}", created.metadata_uri);
    println!(
        "Bought:    {} tokens",
        tokens_to_human(created.tokens_bought, DEFAULT_TOKEN_DECIMALS)
    );
    println!("{}", pump_fun_url(&launch.mint()));
    Ok(())
}

/// Attest a mint and register its wrapped token on Base
pub async fn attest(config: &Config, mint: Option<&str>) -> Result<()> {
    let launch = Launch::new(config.clone())?;
    let mint = resolve_mint(&launch, mint)?;

    let outcome = launch.attest(&mint).await?;
    match outcome.message {
        Some(id) => println!("Attested {} (message {})", mint, id),
        None => println!("{} was already attested", mint),
    }
    if let Some(tx) = outcome.create_wrapped_tx {
        println!("createWrapped: {}", tx);
    }
    if let Some(wrapped) = outcome.wrapped_token {
        println!("Wrapped token on Base: {}", wrapped);
    }
    Ok(())
}

/// Bridge the creator's tokens to the Base signer
pub async fn bridge(config: &Config, mint: Option<&str>, amount: Option<u64>) -> Result<()> {
    let launch = Launch::new(config.clone())?;
    let mint = resolve_mint(&launch, mint)?;

    let Some(record) = launch.bridge(&mint, amount).await? else {
        println!("Nothing bridged.");
        return Ok(());
    };

    println!(
        "{} units, message {} (tx {})",
        record.amount, record.message_id, record.signature
    );
    match (&record.redeem_tx, &record.error) {
        (_, Some(e)) => anyhow::bail!(
            "Transfer {} was not redeemed: {}. Retry with `launch redeem {}`",
            record.message_id,
            e,
            record.message_id
        ),
        (Some(tx), None) => println!("  redeemed: {}", tx),
        (None, None) => println!("  already redeemed"),
    }
    Ok(())
}

/// Redeem a posted transfer on Base by its Wormhole message id
pub async fn redeem(config: &Config, message: &str) -> Result<()> {
    let id = MessageId::from_str(message)
        .with_context(|| format!("Invalid message id {} (expected chain/emitter/sequence)", message))?;
    let launch = Launch::new(config.clone())?;
    launch.check_base_chain().await?;

    match launch.redeem(&id).await? {
        Some(tx) => println!("Redeemed {} in {}", id, tx),
        None => println!("{} was already redeemed", id),
    }
    Ok(())
}

/// Print the position ladder for a token without sending anything
pub fn plan(config: &Config, token: &str, decimals: u8) -> Result<()> {
    let token = parse_address(token)?;
    let plan = pipeline::plan(config, token, decimals)?;
    print_plan(&plan);
    Ok(())
}

/// Wrap ETH, create the pool and mint the planned positions
pub async fn deploy(config: &Config, token: &str, yes: bool) -> Result<()> {
    let token = parse_address(token)?;
    let launch = Launch::new(config.clone())?;
    launch.check_base_chain().await?;

    let decimals = launch.base()?.token_decimals(token).await?;
    print_plan(&pipeline::plan(config, token, decimals)?);

    if !yes && !confirm("Wrap ETH and mint these positions?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let deployed = launch.deploy(token).await?;
    if let Some((amount, tx)) = deployed.weth_wrapped {
        println!("\nWrapped {} wei ETH in {}", amount, tx);
    }
    if let Some(pool) = deployed.pool {
        println!("Pool: {}", pool);
    }
    for position in &deployed.positions {
        println!(
            "  #{} NFT {} liquidity {} tx {}",
            position.index, position.token_id, position.liquidity, position.tx_hash
        );
    }
    Ok(())
}

/// Show the persisted mint and where it stands
pub async fn status(config: &Config) -> Result<()> {
    let launch = Launch::new(config.clone())?;
    let status = launch.status().await?;

    println!("\n=== LAUNCH STATUS ===\n");
    println!("Network: {}", config.network);
    println!("Creator: {} ({} SOL)", status.creator, lamports_to_sol(status.sol_balance));
    println!("Mint:    {}", status.mint);

    match &status.bonding_curve {
        Some(curve) => {
            println!("Created: yes ({})", pump_fun_url(&status.mint));
            println!("  Complete: {}", curve.complete);
            println!(
                "  Price: {} SOL/token",
                format_price(price_per_token_sol(curve.get_price()?, DEFAULT_TOKEN_DECIMALS))
            );
            println!(
                "  Real SOL reserves: {} SOL",
                lamports_to_sol(curve.real_sol_reserves)
            );
            println!(
                "  Creator holds: {} tokens",
                tokens_to_human(status.token_balance, DEFAULT_TOKEN_DECIMALS)
            );
            if let Some(value) = status.holdings_value {
                println!("  Sell value: {} SOL", lamports_to_sol(value));
            }
            if let Some(tokens) = status.buy_quote {
                println!(
                    "  A {} SOL buy gets: {} tokens",
                    config.pump.buy_amount_sol,
                    tokens_to_human(tokens, DEFAULT_TOKEN_DECIMALS)
                );
            }
        }
        None => println!("Created: no"),
    }

    match status.wrapped_token {
        Some(wrapped) => println!("Wrapped on Base: {}", wrapped),
        None => println!("Wrapped on Base: no"),
    }

    if let Ok(base) = launch.base() {
        println!("\nBase signer: {}", base.address());
        println!("  ETH:  {} wei", base.eth_balance().await?);
        println!("  WETH: {} wei", base.weth_balance().await?);
    }

    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check system health
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;

    print!("Solana RPC... ");
    match check_solana_rpc(config).await {
        Ok(latency) => println!("OK ({}ms)", latency),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Wormholescan... ");
    match check_wormholescan(config).await {
        Ok(latency) => println!("OK ({}ms)", latency),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Base RPC... ");
    match check_base_rpc(config).await {
        Ok(latency) => println!("OK ({}ms)", latency),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
        Ok(())
    } else {
        anyhow::bail!("Some health checks failed")
    }
}

async fn check_solana_rpc(config: &Config) -> Result<u64> {
    let client = RpcClient::new_with_timeout(
        config.solana.rpc_endpoint.clone(),
        Duration::from_millis(config.solana.timeout_ms),
    );

    let start = Instant::now();
    client.get_latest_blockhash().await?;
    Ok(start.elapsed().as_millis() as u64)
}

async fn check_wormholescan(config: &Config) -> Result<u64> {
    let client = WormholescanClient::new(config.wormhole.api_url.clone(), Duration::from_secs(10))?;

    let start = Instant::now();
    client.ping().await?;
    Ok(start.elapsed().as_millis() as u64)
}

async fn check_base_rpc(config: &Config) -> Result<u64> {
    use alloy::providers::{Provider, ProviderBuilder};

    let url = config
        .base
        .rpc_url
        .parse()
        .with_context(|| format!("Invalid Base RPC url {}", crate::config::mask_url(&config.base.rpc_url)))?;
    let provider = ProviderBuilder::new().on_http(url);

    let start = Instant::now();
    let chain_id = provider.get_chain_id().await?;
    let latency = start.elapsed().as_millis() as u64;

    if chain_id != config.base.chain_id {
        anyhow::bail!(
            "chain id {} does not match configured {}",
            chain_id,
            config.base.chain_id
        );
    }
    Ok(latency)
}

fn print_plan(plan: &PoolPlan) {
    let (token_total, weth_total) = plan.totals();

    println!("\n=== POOL PLAN ===\n");
    println!("token0: {}", plan.token0);
    println!("token1: {}", plan.token1);
    println!("Fee: {}", plan.fee_tier);
    println!(
        "Initial price: {} WETH/token (tick {}, sqrtPriceX96 {})",
        plan.initial_price, plan.tick, plan.sqrt_price_x96
    );
    println!();
    for position in &plan.positions {
        println!(
            "#{} [{:.8}, {:.8}] ticks [{}, {}] liquidity {} amounts ({}, {})",
            position.index,
            position.lower_price,
            position.upper_price,
            position.tick_lower,
            position.tick_upper,
            position.liquidity,
            position.amount0,
            position.amount1
        );
    }
    println!("\nNeeds {} token units and {} WETH wei", token_total, weth_total);
}

fn resolve_mint(launch: &Launch, mint: Option<&str>) -> Result<solana_sdk::pubkey::Pubkey> {
    match mint {
        Some(mint) => solana_sdk::pubkey::Pubkey::from_str(mint)
            .with_context(|| format!("Invalid mint address {}", mint)),
        None => {
            info!("Using persisted mint {}", launch.mint());
            Ok(launch.mint())
        }
    }
}

fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address).with_context(|| format!("Invalid EVM address {}", address))
}

fn confirm(prompt: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !confirmed {
        warn!("Declined: {}", prompt);
    }
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let parsed = parse_address("0x4200000000000000000000000000000000000006").unwrap();
        assert_eq!(parsed, Address::from_str("0x4200000000000000000000000000000000000006").unwrap());
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn test_plan_command_offline() {
        let config = Config::default();
        assert!(plan(&config, "0x0101010101010101010101010101010101010101", 6).is_ok());
        assert!(plan(&config, "0x01", 6).is_err());
    }
}
