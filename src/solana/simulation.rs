//! Transaction simulation
//!
//! Pre-flight simulation of transactions before submission.

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::transaction::Transaction;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Simulation result
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Whether simulation succeeded
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Compute units consumed
    pub compute_units: Option<u64>,
    /// Logs from simulation
    pub logs: Vec<String>,
}

impl SimulationResult {
    /// Turn a failed simulation into an error carrying the last program logs
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        let tail: Vec<&str> = self.logs.iter().rev().take(5).rev().map(String::as_str).collect();
        Err(Error::TransactionSimulation(format!(
            "{} | {}",
            self.error.unwrap_or_else(|| "unknown error".to_string()),
            tail.join(" | ")
        )))
    }
}

/// Simulate a transaction before sending
pub async fn simulate_transaction(
    rpc_client: &RpcClient,
    transaction: &Transaction,
) -> Result<SimulationResult> {
    info!("Simulating transaction...");

    let result = rpc_client
        .simulate_transaction(transaction)
        .await
        .map_err(|e| Error::TransactionSimulation(e.to_string()))?;

    let success = result.value.err.is_none();
    let error = result.value.err.map(|e| e.to_string());
    let logs = result.value.logs.unwrap_or_default();
    let compute_units = result.value.units_consumed;

    if success {
        debug!("Simulation succeeded, compute units: {:?}", compute_units);
    } else {
        warn!("Simulation failed: {:?}", error);
        for log in &logs {
            debug!("  Log: {}", log);
        }
    }

    Ok(SimulationResult {
        success,
        error,
        compute_units,
        logs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_simulation_keeps_log_tail() {
        let result = SimulationResult {
            success: false,
            error: Some("InstructionError(2, Custom(6002))".to_string()),
            compute_units: Some(41_000),
            logs: (0..8).map(|i| format!("log {}", i)).collect(),
        };

        let err = result.into_result().unwrap_err().to_string();
        assert!(err.contains("Custom(6002)"));
        assert!(err.contains("log 7"));
        assert!(err.contains("log 3"));
        assert!(!err.contains("log 2"));
    }

    #[test]
    fn test_successful_simulation_passes_through() {
        let result = SimulationResult {
            success: true,
            error: None,
            compute_units: Some(10),
            logs: vec![],
        };
        assert_eq!(result.into_result().unwrap().compute_units, Some(10));
    }
}
