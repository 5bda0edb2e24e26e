//! Tron密钥对生成与地址派生
//!
//! 地址派生：secp256k1公钥（未压缩，去掉0x04前缀）→ Keccak256 →
//! 取后20字节 → 前缀0x41 → Base58Check（双SHA256校验和）

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Tron主网地址前缀字节
pub const ADDRESS_PREFIX: u8 = 0x41;

/// 新生成的托管密钥对
///
/// 私钥字节在Drop时清零；十六进制形式只在入库和"wallet"回复时导出
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TronKeypair {
    secret_bytes: [u8; 32],
    #[zeroize(skip)]
    address: String,
}

impl TronKeypair {
    /// 使用操作系统CSPRNG生成随机密钥对并派生地址
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let address = derive_address(&signing_key);
        let secret_bytes: [u8; 32] = signing_key.to_bytes().into();
        Self {
            secret_bytes,
            address,
        }
    }

    /// Base58Check格式的Tron地址
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 私钥的十六进制表示（仅用于持久化和单次展示）
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_bytes)
    }
}

impl std::fmt::Debug for TronKeypair {
    // 私钥绝不进入Debug输出
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TronKeypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// 从签名私钥派生Base58Check地址
fn derive_address(signing_key: &SigningKey) -> String {
    let verifying_key = signing_key.verifying_key();
    let point = verifying_key.to_encoded_point(false);
    let pubkey_bytes = point.as_bytes();

    // 未压缩公钥65字节，首字节0x04不参与哈希
    let mut hasher = Keccak256::new();
    hasher.update(&pubkey_bytes[1..]);
    let hash = hasher.finalize();

    let mut payload = [0u8; 21];
    payload[0] = ADDRESS_PREFIX;
    payload[1..].copy_from_slice(&hash[12..]);

    base58check_encode(&payload)
}

/// Base58Check编码：payload || first4(sha256(sha256(payload)))
pub fn base58check_encode(payload: &[u8]) -> String {
    let checksum = double_sha256(payload);
    let mut data = payload.to_vec();
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

pub(crate) fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::address_validator::is_valid_tron_address;

    #[test]
    fn test_generated_address_is_valid() {
        // 生成的地址必须通过自身的地址校验
        for _ in 0..8 {
            let kp = TronKeypair::generate();
            assert!(is_valid_tron_address(kp.address()), "{}", kp.address());
            assert!(kp.address().starts_with('T'));
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let a = TronKeypair::generate();
        let b = TronKeypair::generate();
        assert_ne!(a.address(), b.address());
        assert_ne!(a.private_key_hex(), b.private_key_hex());
    }

    #[test]
    fn test_private_key_hex_is_64_chars() {
        let kp = TronKeypair::generate();
        let hex_key = kp.private_key_hex();
        assert_eq!(hex_key.len(), 64);
        assert!(hex_key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let kp = TronKeypair::generate();
        let dbg = format!("{:?}", kp);
        assert!(!dbg.contains(&kp.private_key_hex()));
    }
}
