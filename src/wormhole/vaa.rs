//! Verified Action Approval (VAA) decoding
//!
//! Layout (all integers big-endian):
//! - header: version u8 | guardian_set_index u32 | n u8 | n * (index u8, signature [u8; 65])
//! - body: timestamp u32 | nonce u32 | emitter_chain u16 | emitter [u8; 32] |
//!   sequence u64 | consistency_level u8 | payload

use alloy::primitives::{keccak256, B256};
use std::fmt;
use std::str::FromStr;

use super::address::UniversalAddress;
use crate::error::{Error, Result};

const SIGNATURE_LEN: usize = 66;
const BODY_FIXED_LEN: usize = 4 + 4 + 2 + 32 + 8 + 1;

/// Identifies a VAA before it exists: who emitted it and at which sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId {
    pub chain: u16,
    pub emitter: UniversalAddress,
    pub sequence: u64,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.chain, self.emitter, self.sequence)
    }
}

/// Parses the `chain/emitter/sequence` form printed by `Display` and used
/// in Wormholescan URLs
impl FromStr for MessageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let [chain, emitter, sequence] = parts.as_slice() else {
            return Err(Error::Deserialization(format!(
                "Message id {} is not chain/emitter/sequence",
                s
            )));
        };
        let number = |name: &str, value: &str| {
            Error::Deserialization(format!("Invalid {} {:?} in message id", name, value))
        };

        Ok(Self {
            chain: chain.parse().map_err(|_| number("chain", chain))?,
            emitter: emitter.parse()?,
            sequence: sequence.parse().map_err(|_| number("sequence", sequence))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSignature {
    pub index: u8,
    pub signature: [u8; 65],
}

/// Decoded VAA, keeping the raw bytes for on-chain submission
#[derive(Debug, Clone)]
pub struct Vaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: u16,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
    body_offset: usize,
    raw: Vec<u8>,
}

impl Vaa {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let version = reader.u8()?;
        if version != 1 {
            return Err(Error::VaaDecode(format!("Unsupported VAA version {}", version)));
        }
        let guardian_set_index = reader.u32()?;
        let count = reader.u8()? as usize;

        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            let chunk = reader.take(SIGNATURE_LEN)?;
            let mut signature = [0u8; 65];
            signature.copy_from_slice(&chunk[1..]);
            signatures.push(GuardianSignature {
                index: chunk[0],
                signature,
            });
        }

        let body_offset = reader.pos;
        if bytes.len() - body_offset < BODY_FIXED_LEN {
            return Err(Error::VaaDecode("VAA body too short".to_string()));
        }

        let timestamp = reader.u32()?;
        let nonce = reader.u32()?;
        let emitter_chain = reader.u16()?;
        let emitter_address = UniversalAddress(reader.array32()?);
        let sequence = reader.u64()?;
        let consistency_level = reader.u8()?;
        let payload = reader.rest().to_vec();

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
            body_offset,
            raw: bytes.to_vec(),
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.raw[self.body_offset..]
    }

    /// keccak256(keccak256(body)), the hash guardians sign
    pub fn digest(&self) -> B256 {
        keccak256(keccak256(self.body()))
    }

    pub fn id(&self) -> MessageId {
        MessageId {
            chain: self.emitter_chain,
            emitter: self.emitter_address,
            sequence: self.sequence,
        }
    }

    /// Bytes to pass to `createWrapped` / `completeTransfer`
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Bounds-checked big-endian cursor
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pub(crate) pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Error::VaaDecode(format!(
                    "Unexpected end of data: need {} bytes at offset {}, have {}",
                    len,
                    self.pos,
                    self.data.len()
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap_or_default()))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap_or_default()))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap_or_default()))
    }

    pub(crate) fn array32(&mut self) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32)?);
        Ok(out)
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A VAA with two fake signatures around `payload`
    pub(crate) fn sample_vaa_bytes(sequence: u64, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.push(2);
        for index in [0u8, 3] {
            bytes.push(index);
            bytes.extend_from_slice(&[index + 1; 65]);
        }
        bytes.extend_from_slice(&1_700_000_000u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&[0xec; 32]);
        bytes.extend_from_slice(&sequence.to_be_bytes());
        bytes.push(1);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_parse_vaa() {
        let bytes = sample_vaa_bytes(812_345, &[2, 9, 9]);
        let vaa = Vaa::parse(&bytes).unwrap();

        assert_eq!(vaa.guardian_set_index, 4);
        assert_eq!(vaa.signatures.len(), 2);
        assert_eq!(vaa.signatures[1].index, 3);
        assert_eq!(vaa.signatures[1].signature, [4u8; 65]);
        assert_eq!(vaa.emitter_chain, 1);
        assert_eq!(vaa.sequence, 812_345);
        assert_eq!(vaa.consistency_level, 1);
        assert_eq!(vaa.payload, vec![2, 9, 9]);
        assert_eq!(vaa.raw(), bytes.as_slice());
        assert_eq!(vaa.id().to_string(), format!("1/{}/812345", "ec".repeat(32)));
    }

    #[test]
    fn test_message_id_from_str() {
        let text = format!("1/{}/812345", "ec".repeat(32));
        let id: MessageId = text.parse().unwrap();
        assert_eq!(id.chain, 1);
        assert_eq!(id.emitter, UniversalAddress([0xec; 32]));
        assert_eq!(id.sequence, 812_345);
        assert_eq!(id.to_string(), text);

        assert!("1/ec/5".parse::<MessageId>().is_err());
        assert!(format!("x/{}/5", "ec".repeat(32)).parse::<MessageId>().is_err());
        assert!(format!("1/{}", "ec".repeat(32)).parse::<MessageId>().is_err());
    }

    #[test]
    fn test_digest_covers_body_only() {
        let a = Vaa::parse(&sample_vaa_bytes(1, &[1])).unwrap();

        let mut resigned = sample_vaa_bytes(1, &[1]);
        resigned[7] = 0xff; // first signature byte
        let b = Vaa::parse(&resigned).unwrap();
        assert_eq!(a.digest(), b.digest());

        let c = Vaa::parse(&sample_vaa_bytes(2, &[1])).unwrap();
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest(), keccak256(keccak256(a.body())));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut bytes = sample_vaa_bytes(1, &[]);
        bytes[0] = 2;
        assert!(matches!(Vaa::parse(&bytes), Err(Error::VaaDecode(_))));

        let bytes = sample_vaa_bytes(1, &[]);
        assert!(Vaa::parse(&bytes[..bytes.len() - 1]).is_err());
        assert!(Vaa::parse(&bytes[..20]).is_err());
        assert!(Vaa::parse(&[]).is_err());
    }
}
