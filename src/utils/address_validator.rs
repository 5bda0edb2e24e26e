//! Tron地址验证模块
//!
//! 统一的地址验证逻辑：纯语法+校验和验证，不发起任何网络调用

use crate::domain::keypair::{double_sha256, ADDRESS_PREFIX};

/// 验证Base58Check格式的Tron地址
///
/// 规则：
/// 1. Base58解码后必须恰好25字节（21字节payload + 4字节校验和）
/// 2. 首字节必须是0x41（主网前缀，显示形式以'T'开头）
/// 3. 校验和 = sha256(sha256(payload))的前4字节
pub fn is_valid_tron_address(address: &str) -> bool {
    // 典型长度34字符，解码前先做廉价的长度过滤
    if address.len() < 26 || address.len() > 36 {
        return false;
    }

    let decoded = match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    if decoded.len() != 25 {
        return false;
    }
    if decoded[0] != ADDRESS_PREFIX {
        return false;
    }

    let (payload, checksum) = decoded.split_at(21);
    let expected = double_sha256(payload);
    checksum == &expected[..4]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keypair::base58check_encode;

    #[test]
    fn test_valid_address_round_trip() {
        let mut payload = [0x41u8; 21];
        payload[1..].copy_from_slice(&[7u8; 20]);
        let address = base58check_encode(&payload);
        assert!(is_valid_tron_address(&address));
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut payload = [0x41u8; 21];
        payload[1..].copy_from_slice(&[7u8; 20]);
        let mut address = base58check_encode(&payload);
        // 篡改最后一个字符破坏校验和
        let last = address.pop().unwrap();
        address.push(if last == '1' { '2' } else { '1' });
        assert!(!is_valid_tron_address(&address));
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        // Bitcoin风格0x00前缀，校验和正确但不是Tron地址
        let payload = [0x00u8; 21];
        let address = base58check_encode(&payload);
        assert!(!is_valid_tron_address(&address));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(!is_valid_tron_address(""));
        assert!(!is_valid_tron_address("T"));
        assert!(!is_valid_tron_address("not-base58-0OIl"));
        assert!(!is_valid_tron_address(
            "TJRabPrwbZy45sbavfcjinPJC18kjpRTv8XXXXXXXXXXXXXXXX"
        ));
    }
}
