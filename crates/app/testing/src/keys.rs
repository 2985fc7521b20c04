//! Deterministic secp256k1 keys that produce real signatures.

use evmd_ante::tx::{Address, PubKey};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use sha3::{Digest, Keccak256};

#[derive(Clone)]
pub struct TestKey {
    signing: SigningKey,
}

impl TestKey {
    /// Key derived from a one-byte seed. `seed` must be non-zero.
    pub fn from_seed(seed: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = seed.max(1);
        bytes[0] = 0x11;
        let signing = SigningKey::from_bytes(&bytes.into()).expect("valid scalar");
        Self { signing }
    }

    fn compressed(&self) -> [u8; 33] {
        let point = self.signing.verifying_key().to_encoded_point(true);
        point.as_bytes().try_into().expect("compressed point is 33 bytes")
    }

    pub fn pub_key(&self) -> PubKey {
        PubKey::Secp256k1(self.compressed())
    }

    pub fn address(&self) -> Address {
        self.pub_key().address()
    }

    pub fn eth_pub_key(&self) -> PubKey {
        PubKey::EthSecp256k1(self.compressed())
    }

    pub fn eth_address(&self) -> Address {
        self.eth_pub_key().address()
    }

    /// SHA-256 ECDSA signature as `r || s`.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let sig: Signature = self.signing.sign(msg);
        sig.to_bytes().to_vec()
    }

    /// Keccak-256 ECDSA signature as `r || s`.
    pub fn sign_eth(&self, msg: &[u8]) -> Vec<u8> {
        let digest = Keccak256::digest(msg);
        let sig: Signature = self.signing.sign_prehash(&digest).expect("32-byte digest");
        sig.to_bytes().to_vec()
    }
}

impl std::fmt::Debug for TestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestKey")
            .field("address", &self.address())
            .finish()
    }
}
