//! Gift card codes
//!
//! Canonical form is `XXXX-XXXXXX`: four characters, a dash, six
//! characters, all drawn from an alphabet without `0 O 1 I`. Customers
//! type codes by hand, so lookups go through [`normalize_code`] first.

use rand::Rng;
use uuid::Uuid;

/// Unambiguous uppercase alphabet (32 symbols)
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const PREFIX_LEN: usize = 4;
pub const SUFFIX_LEN: usize = 6;
pub const SEPARATOR: char = '-';

const CODE_LEN: usize = PREFIX_LEN + SUFFIX_LEN;

/// Generate a random code with the thread-local RNG
pub fn generate_code() -> String {
    generate_code_with(&mut rand::thread_rng())
}

/// Generate a random code from the given RNG
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let chars: Vec<u8> = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())])
        .collect();
    format_canonical(&chars)
}

/// Deterministic code derived from a UUID.
///
/// Used when random codes keep colliding: a fresh v4 UUID has far more
/// entropy than the 50 bits a code can hold, and the alphabet has exactly
/// 32 symbols so each byte maps without bias.
pub fn fallback_code(seed: Uuid) -> String {
    let chars: Vec<u8> = seed
        .as_bytes()
        .iter()
        .take(CODE_LEN)
        .map(|b| CODE_ALPHABET[(*b as usize) % CODE_ALPHABET.len()])
        .collect();
    format_canonical(&chars)
}

/// Canonicalize user input: uppercase, drop everything that is not ASCII
/// alphanumeric, then re-insert the separator when the length is right.
///
/// Input of any other length comes back stripped and uppercased, which
/// never matches a stored code. Idempotent.
pub fn normalize_code(input: &str) -> String {
    let stripped: Vec<u8> = input
        .bytes()
        .filter(u8::is_ascii_alphanumeric)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if stripped.len() == CODE_LEN {
        format_canonical(&stripped)
    } else {
        String::from_utf8_lossy(&stripped).into_owned()
    }
}

/// Is `code` already in canonical `XXXX-XXXXXX` form?
pub fn is_canonical(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == CODE_LEN + 1
        && bytes[PREFIX_LEN] == SEPARATOR as u8
        && bytes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != PREFIX_LEN)
            .all(|(_, b)| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn format_canonical(chars: &[u8]) -> String {
    let mut out = String::with_capacity(CODE_LEN + 1);
    out.push_str(&String::from_utf8_lossy(&chars[..PREFIX_LEN]));
    out.push(SEPARATOR);
    out.push_str(&String::from_utf8_lossy(&chars[PREFIX_LEN..]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_code_with(&mut rng);
            assert!(is_canonical(&code), "bad code {code}");
            assert!(
                code.bytes()
                    .filter(|b| *b != b'-')
                    .all(|b| CODE_ALPHABET.contains(&b))
            );
        }
    }

    #[test]
    fn test_generate_code_varies() {
        let a = generate_code();
        let b = generate_code();
        let c = generate_code();
        assert!(a != b || b != c);
    }

    #[test]
    fn test_fallback_code() {
        let seed = Uuid::new_v4();
        let code = fallback_code(seed);
        assert!(is_canonical(&code));
        assert_eq!(code, fallback_code(seed));
        assert_eq!(normalize_code(&code), code);
    }

    #[test]
    fn test_normalize_human_input() {
        assert_eq!(normalize_code("abcd-efgh23"), "ABCD-EFGH23");
        assert_eq!(normalize_code(" abcd efgh 23 "), "ABCD-EFGH23");
        assert_eq!(normalize_code("ABCDEFGH23"), "ABCD-EFGH23");
        assert_eq!(normalize_code("ab.cd/ef_gh-23"), "ABCD-EFGH23");
    }

    #[test]
    fn test_normalize_wrong_length() {
        assert_eq!(normalize_code("abc-12"), "ABC12");
        assert_eq!(normalize_code(""), "");
        assert_eq!(normalize_code("ñandú"), "AND");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in [
            "abcd-efgh23",
            "ABCD-EFGH23",
            "x",
            "abc-12",
            "  zz zz zz zz zz ",
            "----",
            "ABCDEFGHJKLMN",
        ] {
            let once = normalize_code(input);
            assert_eq!(normalize_code(&once), once, "not idempotent for {input:?}");
        }
        let generated = generate_code();
        assert_eq!(normalize_code(&generated), generated);
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("ABCD-EFGH23"));
        assert!(!is_canonical("abcd-efgh23"));
        assert!(!is_canonical("ABCDEFGH23"));
        assert!(!is_canonical("ABCD-EFGH2"));
        assert!(!is_canonical("ABC-DEFGH23"));
    }
}
