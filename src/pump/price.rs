//! Price and unit helpers for pump.fun bonding curves

/// Token decimals - pump.fun uses 6 decimals (not Solana's standard 9)
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// SOL decimals (lamports)
pub const SOL_DECIMALS: u8 = 9;

/// Calculate maximum SOL to spend for a buy with slippage
pub fn calculate_max_sol_with_slippage(expected_sol: u64, slippage_bps: u32) -> u64 {
    let scaled = expected_sol as u128 * (10_000 + slippage_bps as u128) / 10_000;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 10f64.powi(SOL_DECIMALS as i32)
}

/// Convert SOL to lamports
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * 10f64.powi(SOL_DECIMALS as i32)).round() as u64
}

/// Convert token amount to human-readable (with decimals)
pub fn tokens_to_human(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

/// Curve price (lamports per raw unit) as SOL per whole token
pub fn price_per_token_sol(lamports_per_unit: f64, decimals: u8) -> f64 {
    lamports_per_unit * 10f64.powi(decimals as i32) / 10f64.powi(SOL_DECIMALS as i32)
}

/// Format price for display
pub fn format_price(price: f64) -> String {
    if price < 0.000001 {
        format!("{:.10}", price)
    } else if price < 0.001 {
        format!("{:.8}", price)
    } else if price < 1.0 {
        format!("{:.6}", price)
    } else {
        format!("{:.4}", price)
    }
}
