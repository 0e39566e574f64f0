//! Keypair persistence and loading
//!
//! Solana keypairs are stored as Solana CLI JSON byte arrays in the keys
//! folder, one `<name>.json` per role (`creator`, `mint`). Files are created
//! with mode 0600 and refused when readable by group or others.

use alloy::signers::local::PrivateKeySigner;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Environment variable holding the creator's base58 secret key
pub const SOLANA_PRIVATE_KEY_ENV: &str = "SOLANA_PRIVATE_KEY";

/// Environment variable holding the Base deployer's hex private key
pub const BASE_PRIVATE_KEY_ENV: &str = "BASE_PRIVATE_KEY";

/// Keypair file name for a role
pub fn keypair_path(folder: &Path, name: &str) -> PathBuf {
    folder.join(format!("{}.json", name))
}

/// Load `<folder>/<name>.json`, generating and persisting it on first use
pub fn get_or_create_keypair(folder: &Path, name: &str) -> Result<Keypair> {
    let path = keypair_path(folder, name);

    if path.exists() {
        let keypair = read_keypair(&path)?;
        debug!("Loaded {} keypair {} from {:?}", name, keypair.pubkey(), path);
        return Ok(keypair);
    }

    std::fs::create_dir_all(folder)
        .map_err(|e| Error::Io(format!("Failed to create keys folder {:?}: {}", folder, e)))?;

    let keypair = Keypair::new();
    write_keypair(&path, &keypair)?;
    info!("Generated new {} keypair {} at {:?}", name, keypair.pubkey(), path);

    Ok(keypair)
}

fn read_keypair(path: &Path) -> Result<Keypair> {
    check_permissions(path)?;

    let keypair_bytes = std::fs::read(path)
        .map_err(|e| Error::InvalidKeypair(format!("Failed to read {:?}: {}", path, e)))?;

    let keypair_json: Vec<u8> = serde_json::from_slice(&keypair_bytes).map_err(|e| {
        Error::InvalidKeypair(format!("Failed to parse keypair JSON {:?}: {}", path, e))
    })?;

    Keypair::from_bytes(&keypair_json)
        .map_err(|e| Error::InvalidKeypair(format!("Invalid keypair bytes in {:?}: {}", path, e)))
}

fn write_keypair(path: &Path, keypair: &Keypair) -> Result<()> {
    let json = serde_json::to_string(&keypair.to_bytes().to_vec())?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| Error::Io(format!("Failed to create {:?}: {}", path, e)))?;
    file.write_all(json.as_bytes())?;

    Ok(())
}

/// Refuse keypair files readable by group or others
fn check_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)?;
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(Error::InsecureKeypair(format!(
                "{} has permissions {:o}. Run 'chmod 600 {}'",
                path.display(),
                mode & 0o777,
                path.display()
            )));
        }
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

/// Decode a 64-byte base58 secret key (Phantom / Solana CLI export)
pub fn keypair_from_base58(secret: &str) -> Result<Keypair> {
    let bytes = bs58::decode(secret.trim())
        .into_vec()
        .map_err(|e| Error::InvalidKeypair(format!("Invalid base58 secret key: {}", e)))?;

    if bytes.len() != 64 {
        return Err(Error::InvalidKeypair(format!(
            "Secret key must be 64 bytes, got {}",
            bytes.len()
        )));
    }

    Keypair::from_bytes(&bytes)
        .map_err(|e| Error::InvalidKeypair(format!("Invalid secret key: {}", e)))
}

/// Creator keypair: `SOLANA_PRIVATE_KEY` if set, else the persisted `creator`
pub fn load_creator(keys_folder: &Path) -> Result<Keypair> {
    match std::env::var(SOLANA_PRIVATE_KEY_ENV) {
        Ok(secret) if !secret.trim().is_empty() => {
            let keypair = keypair_from_base58(&secret)?;
            info!("Using creator {} from {}", keypair.pubkey(), SOLANA_PRIVATE_KEY_ENV);
            Ok(keypair)
        }
        _ => get_or_create_keypair(keys_folder, "creator"),
    }
}

/// Mint keypair, persisted so reruns target the same token
pub fn load_mint(keys_folder: &Path) -> Result<Keypair> {
    get_or_create_keypair(keys_folder, "mint")
}

/// Parse a hex private key (with or without 0x) into a local signer
pub fn evm_signer_from_hex(key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(key.trim())
        .map_err(|e| Error::InvalidKeypair(format!("Invalid EVM private key: {}", e)))
}

/// Base signer from `BASE_PRIVATE_KEY`
pub fn evm_signer_from_env() -> Result<PrivateKeySigner> {
    let key = std::env::var(BASE_PRIVATE_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::MissingEnvVar(BASE_PRIVATE_KEY_ENV.to_string()))?;
    evm_signer_from_hex(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_or_create_persists() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("keys");

        let first = get_or_create_keypair(&folder, "mint").unwrap();
        assert!(keypair_path(&folder, "mint").exists());

        let second = get_or_create_keypair(&folder, "mint").unwrap();
        assert_eq!(first.pubkey(), second.pubkey());

        let other = get_or_create_keypair(&folder, "creator").unwrap();
        assert_ne!(first.pubkey(), other.pubkey());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_keypair_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        get_or_create_keypair(dir.path(), "creator").unwrap();
        let mode = std::fs::metadata(keypair_path(dir.path(), "creator"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_world_readable_keypair() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        get_or_create_keypair(dir.path(), "creator").unwrap();
        let path = keypair_path(dir.path(), "creator");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = get_or_create_keypair(dir.path(), "creator").unwrap_err();
        assert!(matches!(err, Error::InsecureKeypair(_)));
    }

    #[test]
    fn test_rejects_corrupt_keypair() {
        let dir = tempdir().unwrap();
        let path = keypair_path(dir.path(), "mint");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        }

        assert!(matches!(
            get_or_create_keypair(dir.path(), "mint"),
            Err(Error::InvalidKeypair(_))
        ));
    }

    #[test]
    fn test_keypair_from_base58() {
        let keypair = Keypair::new();
        let encoded = keypair.to_base58_string();
        let decoded = keypair_from_base58(&format!("  {}\n", encoded)).unwrap();
        assert_eq!(decoded.pubkey(), keypair.pubkey());

        assert!(keypair_from_base58("0OIl").is_err());
        assert!(keypair_from_base58(&bs58::encode([7u8; 32]).into_string()).is_err());
    }

    #[test]
    fn test_evm_signer_from_hex() {
        // anvil account 0
        let signer = evm_signer_from_hex(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert!(evm_signer_from_hex("0x1234").is_err());
    }
}
