//! RUN (Rol Único Nacional) handling for the Liceo portal.
//!
//! Every function in this crate is total: malformed input is normalized
//! best-effort or reported as invalid, never as an error.

#![deny(missing_docs)]

use std::sync::LazyLock;

use regex::Regex;

/// Shape of a normalized RUN: a numeric body, a dash, and a single check
/// character (digit or K). `normalize` uppercases the check character, so
/// the pattern only needs the uppercase form.
static RUN_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-([\dK])$").expect("the RUN pattern is valid"));

/// Canonicalizes a user-supplied RUN string into `body-CHECK` form.
///
/// Dots and whitespace are stripped. When the input carries a dash, the part
/// after the last dash is taken as the check character; otherwise the last
/// character is. Inputs too short to split are returned uppercased as-is.
///
/// ```
/// assert_eq!(identity::normalize("11.111.111-1"), "11111111-1");
/// assert_eq!(identity::normalize(" 12345678k "), "12345678-K");
/// ```
pub fn normalize(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| *c != '.' && !c.is_whitespace()).collect();

    if let Some((body, check)) = cleaned.rsplit_once('-') {
        return format!("{body}-{}", check.to_uppercase());
    }

    if cleaned.len() < 2 {
        return cleaned.to_uppercase();
    }

    // No separator: the last character is the check character.
    let split_at = cleaned.len() - cleaned.chars().next_back().map(char::len_utf8).unwrap_or(1);
    let (body, check) = cleaned.split_at(split_at);

    format!("{body}-{}", check.to_uppercase())
}

/// Verifies the check character of a RUN against the weighted modulo-11
/// scheme. Returns `false` for anything that does not normalize into the
/// `digits-check` shape; never panics.
pub fn validate(input: &str) -> bool {
    let normalized = normalize(input);

    let Some(captures) = RUN_SHAPE.captures(&normalized) else {
        return false;
    };

    let body = &captures[1];
    let supplied = captures[2].chars().next().unwrap_or_default();

    check_digit(body) == Some(supplied)
}

/// Computes the expected check character for a RUN body.
///
/// Digits are weighted least-significant-first with the multiplier cycle
/// 2, 3, 4, 5, 6, 7, 2, ... and summed; `11 - (sum % 11)` maps to `'0'` for
/// 11, `'K'` for 10, and the decimal digit otherwise. Returns `None` when
/// the body is empty or contains a non-digit.
pub fn check_digit(body: &str) -> Option<char> {
    if body.is_empty() {
        return None;
    }

    let mut sum: u32 = 0;
    let mut multiplier = 2;

    for c in body.chars().rev() {
        let digit = c.to_digit(10)?;
        sum += digit * multiplier;

        multiplier = if multiplier == 7 { 2 } else { multiplier + 1 };
    }

    Some(match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        digit => char::from_digit(digit, 10)?,
    })
}

/// Derives the synthetic login handle sent to the credential issuer:
/// the normalized RUN concatenated with `@` and the configured domain.
pub fn login_handle(run: &str, domain: &str) -> String {
    format!("{}@{domain}", normalize(run))
}
