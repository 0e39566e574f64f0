//! SPL token and balance helpers

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::error::{Error, Result};

/// Derive associated token account address
pub fn derive_ata(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(wallet, mint)
}

/// Fetch an account, `None` when it does not exist
pub async fn get_account(rpc_client: &RpcClient, address: &Pubkey) -> Result<Option<Account>> {
    let response = rpc_client
        .get_account_with_commitment(address, CommitmentConfig::confirmed())
        .await?;
    Ok(response.value)
}

/// SOL balance in lamports
pub async fn sol_balance(rpc_client: &RpcClient, address: &Pubkey) -> Result<u64> {
    rpc_client
        .get_balance(address)
        .await
        .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))
}

/// Raw SPL balance of `owner`'s associated account for `mint`
pub async fn token_balance(rpc_client: &RpcClient, owner: &Pubkey, mint: &Pubkey) -> Result<u64> {
    let ata = derive_ata(owner, mint);
    let balance = rpc_client
        .get_token_account_balance(&ata)
        .await
        .map_err(|e| Error::Rpc(format!("Failed to get token balance of {}: {}", ata, e)))?;

    parse_raw_amount(&balance.amount)
}

/// Read decimals from a mint account
pub async fn fetch_decimals(rpc_client: &RpcClient, mint: &Pubkey) -> Result<u8> {
    let account = rpc_client
        .get_account(mint)
        .await
        .map_err(|e| Error::Rpc(format!("Failed to fetch mint account: {}", e)))?;

    decimals_from_mint_data(&account.data)
}

/// Mint layout: mint_authority COption<Pubkey> (36) | supply u64 (8) | decimals u8
pub fn decimals_from_mint_data(data: &[u8]) -> Result<u8> {
    if data.len() < 45 {
        return Err(Error::Deserialization(format!(
            "Mint account data too short: {} bytes",
            data.len()
        )));
    }
    Ok(data[44])
}

fn parse_raw_amount(amount: &str) -> Result<u64> {
    amount
        .parse::<u64>()
        .map_err(|e| Error::Deserialization(format!("Invalid token amount {:?}: {}", amount, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_ata() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(derive_ata(&wallet, &mint), derive_ata(&wallet, &mint));
        assert_ne!(derive_ata(&wallet, &mint), derive_ata(&mint, &wallet));
    }

    #[test]
    fn test_decimals_from_mint_data() {
        let mut data = vec![0u8; 82];
        data[44] = 6;
        assert_eq!(decimals_from_mint_data(&data).unwrap(), 6);
    }

    #[test]
    fn test_short_mint_data_is_a_decode_error() {
        let err = decimals_from_mint_data(&[0u8; 40]).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
        assert!(err.to_string().contains("40 bytes"));
    }

    #[test]
    fn test_parse_raw_amount() {
        assert_eq!(parse_raw_amount("34528931000000").unwrap(), 34_528_931_000_000);
        assert!(parse_raw_amount("1.5").is_err());
    }
}
