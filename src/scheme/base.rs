//! Positional numeral encoding with bases 2 to 36

use crate::error::{RevisionError, Result};

/// Digits for base 28: no vowels and none of `l`, `q`, `y`, so encoded values
/// do not spell words and do not mix up with digits.
pub const BASE28_ALPHABET: &str = "0123456789bcdfghjkmnprstvwxz";

const STANDARD_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Digit alphabet for `base`.
pub fn alphabet(base: u32) -> Result<&'static str> {
    match base {
        28 => Ok(BASE28_ALPHABET),
        2..=36 => Ok(&STANDARD_ALPHABET[..base as usize]),
        _ => Err(RevisionError::format(format!(
            "Unsupported numeral base {}, expected 2 to 36",
            base
        ))),
    }
}

/// Encode `value`, left-padded with the zero digit to at least `min_len`.
pub fn encode(value: u64, alphabet: &str, min_len: usize) -> String {
    let digits: Vec<char> = alphabet.chars().collect();
    let base = digits.len() as u64;

    let mut out = Vec::new();
    let mut rest = value;
    loop {
        out.push(digits[(rest % base) as usize]);
        rest /= base;
        if rest == 0 {
            break;
        }
    }
    while out.len() < min_len {
        out.push(digits[0]);
    }

    out.iter().rev().collect()
}

/// Decode a value produced by [`encode`]. Letters are matched
/// case-insensitively.
pub fn decode(text: &str, alphabet: &str) -> Result<u64> {
    if text.is_empty() {
        return Err(RevisionError::format("Cannot decode an empty value"));
    }

    let base = alphabet.chars().count() as u64;
    text.chars().try_fold(0u64, |acc, c| {
        let lower = c.to_ascii_lowercase();
        let digit = alphabet.chars().position(|d| d == lower).ok_or_else(|| {
            RevisionError::format(format!(
                "Character '{}' in '{}' is not a base-{} digit",
                c, text, base
            ))
        })?;
        acc.checked_mul(base)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| RevisionError::bounds(format!("Value '{}' is too large", text)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base28_alphabet_membership() {
        assert_eq!(BASE28_ALPHABET.len(), 28);
        for vowel in ['a', 'e', 'i', 'o', 'u'] {
            assert!(!BASE28_ALPHABET.contains(vowel), "contains vowel {}", vowel);
        }
        for ambiguous in ['l', 'q', 'y'] {
            assert!(!BASE28_ALPHABET.contains(ambiguous));
        }
        let mut seen = std::collections::HashSet::new();
        assert!(BASE28_ALPHABET.chars().all(|c| seen.insert(c)));
    }

    #[test]
    fn test_alphabet_prefixes() {
        assert_eq!(alphabet(2).unwrap(), "01");
        assert_eq!(alphabet(16).unwrap(), "0123456789abcdef");
        assert_eq!(alphabet(36).unwrap().len(), 36);
        assert_eq!(alphabet(28).unwrap(), BASE28_ALPHABET);
    }

    #[test]
    fn test_alphabet_rejects_bad_base() {
        assert!(alphabet(1).is_err());
        assert!(alphabet(37).is_err());
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(0, alphabet(10).unwrap(), 1), "0");
        assert_eq!(encode(255, alphabet(16).unwrap(), 1), "ff");
        assert_eq!(encode(5, alphabet(2).unwrap(), 8), "00000101");
        assert_eq!(encode(28, BASE28_ALPHABET, 1), "10");
        assert_eq!(encode(27, BASE28_ALPHABET, 3), "00z");
    }

    #[test]
    fn test_encode_length_and_alphabet() {
        for base in 2..=36u32 {
            let digits = alphabet(base).unwrap();
            for (value, min_len) in [(0u64, 4usize), (1, 1), (987_654, 3), (u64::MAX, 2)] {
                let encoded = encode(value, digits, min_len);
                assert!(encoded.len() >= min_len);
                assert!(encoded.chars().all(|c| digits.contains(c)));
            }
        }
    }

    #[test]
    fn test_decode_inverts_encode() {
        for base in [2u32, 10, 16, 28, 36] {
            let digits = alphabet(base).unwrap();
            for value in [0u64, 1, 27, 1_000_000, u64::MAX] {
                assert_eq!(decode(&encode(value, digits, 6), digits).unwrap(), value);
            }
        }
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(decode("FF", alphabet(16).unwrap()).unwrap(), 255);
    }

    #[test]
    fn test_decode_rejects_foreign_characters() {
        assert!(decode("1a", BASE28_ALPHABET).is_err());
        assert!(decode("12", alphabet(2).unwrap()).is_err());
        assert!(decode("", alphabet(10).unwrap()).is_err());
    }

    #[test]
    fn test_decode_overflow() {
        assert!(decode("zzzzzzzzzzzzzzzzzzzz", alphabet(36).unwrap()).is_err());
    }
}
