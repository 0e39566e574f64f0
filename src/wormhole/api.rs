//! Fetching signed VAAs
//!
//! Guardians sign asynchronously; the VAA for a posted message shows up
//! on Wormholescan some seconds after finality. Callers poll until it
//! appears or a fixed timeout elapses.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::vaa::{MessageId, Vaa};
use crate::error::{Error, Result};

pub const MAINNET_API_URL: &str = "https://api.wormholescan.io";
pub const TESTNET_API_URL: &str = "https://api.testnet.wormholescan.io";

/// Anything that can look up a signed VAA by message id
#[async_trait]
pub trait VaaSource: Send + Sync {
    /// `Ok(None)` while the VAA is not signed yet
    async fn fetch_vaa(&self, id: &MessageId) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedVaaResponse {
    vaa_bytes: String,
}

/// Wormholescan guardian-compatible API client
pub struct WormholescanClient {
    client: Client,
    api_url: String,
}

impl WormholescanClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Wormholescan(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn signed_vaa_url(&self, id: &MessageId) -> String {
        format!(
            "{}/v1/signed_vaa/{}/{}/{}",
            self.api_url,
            id.chain,
            id.emitter.to_hex(),
            id.sequence
        )
    }

    /// Reachability check for the health command
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v1/health", self.api_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Wormholescan(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Wormholescan(format!("HTTP {}", response.status())))
        }
    }
}

#[async_trait]
impl VaaSource for WormholescanClient {
    async fn fetch_vaa(&self, id: &MessageId) -> Result<Option<Vec<u8>>> {
        let url = self.signed_vaa_url(id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Wormholescan(format!("HTTP request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: SignedVaaResponse = response.json().await.map_err(|e| {
                    Error::Deserialization(format!("Failed to parse signed VAA response: {}", e))
                })?;
                decode_vaa_bytes(&body.vaa_bytes).map(Some)
            }
            status => Err(Error::Wormholescan(format!("HTTP {} for {}", status, id))),
        }
    }
}

fn decode_vaa_bytes(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::VaaDecode(format!("Invalid base64 VAA: {}", e)))
}

/// Poll `source` until the VAA for `id` is signed, or fail after `timeout`
pub async fn wait_for_vaa<S: VaaSource + ?Sized>(
    source: &S,
    id: &MessageId,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Vaa> {
    info!("Waiting up to {}s for VAA {}", timeout.as_secs(), id);

    let policy = ExponentialBackoff {
        initial_interval: poll_interval,
        max_interval: poll_interval,
        multiplier: 1.0,
        randomization_factor: 0.0,
        max_elapsed_time: Some(timeout),
        ..Default::default()
    };

    let bytes = retry(policy, || async {
        match source.fetch_vaa(id).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(backoff::Error::transient(Error::VaaPending(id.to_string()))),
            Err(e) if e.is_retryable() => {
                warn!("Retryable VAA lookup error: {}", e);
                Err(backoff::Error::transient(e))
            }
            Err(e) => Err(backoff::Error::permanent(e)),
        }
    })
    .await
    .map_err(|e| match e {
        Error::VaaPending(_) => Error::VaaTimeout(id.to_string(), timeout.as_secs()),
        other => other,
    })?;

    let vaa = Vaa::parse(&bytes)?;
    if vaa.id() != *id {
        return Err(Error::VaaDecode(format!(
            "Requested {} but received {}",
            id,
            vaa.id()
        )));
    }

    info!("VAA {} signed by {} guardians", id, vaa.signatures.len());
    Ok(vaa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wormhole::address::UniversalAddress;
    use crate::wormhole::vaa::tests::sample_vaa_bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns `None` for the first `pending` lookups
    struct FakeSource {
        pending: usize,
        calls: AtomicUsize,
        bytes: Vec<u8>,
    }

    #[async_trait]
    impl VaaSource for FakeSource {
        async fn fetch_vaa(&self, _id: &MessageId) -> Result<Option<Vec<u8>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.pending {
                Ok(None)
            } else {
                Ok(Some(self.bytes.clone()))
            }
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl VaaSource for BrokenSource {
        async fn fetch_vaa(&self, _id: &MessageId) -> Result<Option<Vec<u8>>> {
            Err(Error::VaaDecode("garbage".to_string()))
        }
    }

    fn id(sequence: u64) -> MessageId {
        MessageId {
            chain: 1,
            emitter: UniversalAddress([0xec; 32]),
            sequence,
        }
    }

    #[tokio::test]
    async fn test_waits_until_signed() {
        let source = FakeSource {
            pending: 2,
            calls: AtomicUsize::new(0),
            bytes: sample_vaa_bytes(7, &[2]),
        };

        let vaa = wait_for_vaa(&source, &id(7), Duration::from_secs(5), Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(vaa.sequence, 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_times_out() {
        let source = FakeSource {
            pending: usize::MAX,
            calls: AtomicUsize::new(0),
            bytes: Vec::new(),
        };

        let err = wait_for_vaa(&source, &id(7), Duration::from_millis(50), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VaaTimeout(_, _)));
        assert!(source.calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let err = wait_for_vaa(&BrokenSource, &id(7), Duration::from_secs(5), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VaaDecode(_)));
    }

    #[tokio::test]
    async fn test_mismatched_vaa_is_rejected() {
        let source = FakeSource {
            pending: 0,
            calls: AtomicUsize::new(0),
            bytes: sample_vaa_bytes(8, &[2]),
        };
        let err = wait_for_vaa(&source, &id(7), Duration::from_secs(5), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VaaDecode(_)));
    }

    #[test]
    fn test_signed_vaa_url() {
        let client = WormholescanClient::new(MAINNET_API_URL.to_string() + "/", Duration::from_secs(10)).unwrap();
        assert_eq!(
            client.signed_vaa_url(&id(42)),
            format!("https://api.wormholescan.io/v1/signed_vaa/1/{}/42", "ec".repeat(32))
        );
    }

    #[test]
    fn test_decode_vaa_bytes() {
        let json = r#"{"vaaBytes":"AQAAAAQ="}"#;
        let body: SignedVaaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(decode_vaa_bytes(&body.vaa_bytes).unwrap(), vec![1, 0, 0, 0, 4]);
        assert!(decode_vaa_bytes("!!").is_err());
    }
}
