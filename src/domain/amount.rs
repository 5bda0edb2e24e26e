//! TRX金额单位转换
//!
//! Tron固定6位小数：1 TRX = 1_000_000 sun
//! 超过6位小数的部分截断，不做四舍五入

use crate::error::{AppError, AppErrorCode};

/// TRX小数位数
pub const TRX_DECIMALS: u32 = 6;

/// 1 TRX 对应的 sun 数量
pub const SUN_PER_TRX: u64 = 1_000_000;

/// 将用户输入的显示金额（TRX）解析为内部金额（sun）
///
/// - 接受整数或小数形式："5"、"1.5"、"1.23456789"
/// - 小数部分超过6位的直接截断："1.23456789" -> 1_234_567
/// - 非数字、负数、零金额均返回 InvalidAmount
pub fn parse_trx_to_sun(input: &str) -> Result<u64, AppError> {
    let s = input.trim();
    if s.is_empty() || s.starts_with('-') || s.starts_with('+') {
        return Err(invalid_amount(input));
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid_amount(input));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid_amount(input));
    }

    let whole: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid_amount(input))?
    };

    // 截断到6位小数，不足右补零
    let mut frac_digits: String = frac_part.chars().take(TRX_DECIMALS as usize).collect();
    while frac_digits.len() < TRX_DECIMALS as usize {
        frac_digits.push('0');
    }
    let frac: u64 = if frac_digits.is_empty() {
        0
    } else {
        frac_digits.parse().map_err(|_| invalid_amount(input))?
    };

    let sun = whole
        .checked_mul(SUN_PER_TRX)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(|| invalid_amount(input))?;

    if sun == 0 {
        return Err(invalid_amount(input));
    }

    Ok(sun)
}

/// 将内部金额（sun）格式化为显示金额（TRX）
///
/// 去掉小数部分多余的尾随零："1500000" -> "1.5"，"5000000" -> "5"
pub fn format_sun_as_trx(sun: u64) -> String {
    let whole = sun / SUN_PER_TRX;
    let frac = sun % SUN_PER_TRX;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:06}", frac);
    let trimmed = frac_str.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

fn invalid_amount(input: &str) -> AppError {
    AppError::new(
        AppErrorCode::InvalidAmount,
        format!("invalid amount: {}", input),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount() {
        assert_eq!(parse_trx_to_sun("5").unwrap(), 5_000_000);
    }

    #[test]
    fn test_fractional_amount() {
        assert_eq!(parse_trx_to_sun("1.5").unwrap(), 1_500_000);
    }

    #[test]
    fn test_truncates_beyond_six_decimals() {
        // 截断而非四舍五入
        assert_eq!(parse_trx_to_sun("1.23456789").unwrap(), 1_234_567);
        assert_eq!(parse_trx_to_sun("0.9999999").unwrap(), 999_999);
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert!(parse_trx_to_sun("0").is_err());
        assert!(parse_trx_to_sun("0.0000000").is_err());
        assert!(parse_trx_to_sun("-1").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_trx_to_sun("abc").is_err());
        assert!(parse_trx_to_sun("1.2.3").is_err());
        assert!(parse_trx_to_sun("").is_err());
        assert!(parse_trx_to_sun(".").is_err());
        assert!(parse_trx_to_sun("1e6").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format_sun_as_trx(1_500_000), "1.5");
        assert_eq!(format_sun_as_trx(5_000_000), "5");
        assert_eq!(format_sun_as_trx(1_234_567), "1.234567");
    }
}
