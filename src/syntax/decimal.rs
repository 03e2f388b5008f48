use rust_decimal::Decimal;

/// Builds a decimal from the digit bytes of `tok`, skipping every other
/// byte, with the last `nfractional` digits after the decimal point.
///
/// Returns `None` if the significand does not fit into 64 bits.
pub fn fast_decimal(tok: &[u8], nfractional: u32) -> Option<Decimal> {
    let mut significand: i64 = 0;
    for b in tok.iter().filter(|b| b.is_ascii_digit()) {
        significand = significand
            .checked_mul(10)?
            .checked_add(i64::from(b - b'0'))?;
    }
    Decimal::try_new(significand, nfractional).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn reference(tok: &str, nfractional: usize) -> Decimal {
        let mut digits: String = tok.chars().filter(char::is_ascii_digit).collect();
        if digits.len() <= nfractional {
            digits = format!("{}{}", "0".repeat(nfractional - digits.len() + 1), digits);
        }
        if nfractional > 0 {
            digits.insert(digits.len() - nfractional, '.');
        }
        Decimal::from_str(&digits).unwrap()
    }

    /// Every string of up to `max_len` bytes over `alphabet`.
    fn tokens(alphabet: &[u8], max_len: usize) -> Vec<String> {
        let mut all = vec![String::new()];
        let mut level = vec![String::new()];
        for _ in 0..max_len {
            level = level
                .iter()
                .flat_map(|t| alphabet.iter().map(move |&b| format!("{t}{}", b as char)))
                .collect();
            all.extend(level.iter().cloned());
        }
        all
    }

    #[test]
    fn test_fast_decimal() {
        assert_eq!(fast_decimal(b"10,101.99", 2), Some(Decimal::new(1010199, 2)));
        assert_eq!(fast_decimal(b"4 $ 56", 2), Some(Decimal::new(456, 2)));
        assert_eq!(fast_decimal(b"4.567", 0), Some(Decimal::new(4567, 0)));
        assert_eq!(fast_decimal(b"", 0), Some(Decimal::ZERO));
    }

    #[test]
    fn test_fast_decimal_overflow() {
        assert_eq!(fast_decimal(b"99999999999999999999", 0), None);
    }

    #[test]
    fn test_matches_string_parse() {
        let all = tokens(b"0159,._", 5);
        assert_eq!(all.len(), 1 + 7 + 49 + 343 + 2401 + 16807);
        for tok in &all {
            for n in 0..=3usize {
                assert_eq!(
                    fast_decimal(tok.as_bytes(), n as u32),
                    Some(reference(tok, n)),
                    "token {tok:?} with {n} fractional digits"
                );
            }
        }
    }

    #[test]
    fn test_matches_string_parse_long_tokens() {
        let tokens = [
            "1,000,000.25", "1.000.000", "12.345,678", "1_2_3_4", "4.567,89", "007",
        ];
        for tok in tokens {
            for n in 0..=3usize {
                assert_eq!(
                    fast_decimal(tok.as_bytes(), n as u32),
                    Some(reference(tok, n)),
                    "token {tok:?} with {n} fractional digits"
                );
            }
        }
    }
}
