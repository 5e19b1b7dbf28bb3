//! Phone number normalization for tenant routing.
//!
//! Inbound providers deliver dialed numbers in a variety of shapes -
//! `+14255550100`, `(425) 555-0100`, `1-425-555-0100`, `00 44 7123 456789` -
//! and the routing table is keyed by one canonical form. Everything is
//! normalized to E.164 (`+` followed by digits) before lookup so that all
//! fractional formats of the same number converge on the same tenant.

/// Separator characters tolerated inside a phone number.
const SEPARATORS: [char; 5] = [' ', '-', '.', '(', ')'];

/// Normalizes a raw phone number to E.164 (`+<digits>`).
///
/// Rules:
/// - Leading `+` marks the number as fully international.
/// - A `00` prefix (international dialing prefix) is equivalent to `+`.
/// - Bare 10-digit numbers are treated as NANP national and promoted to `+1`.
/// - 11-digit numbers starting with `1` are accepted as NANP with country code.
/// - Separators (space, dash, dot, parentheses) are stripped; any other
///   non-digit character rejects the input.
///
/// Returns `None` for input that cannot be a routable number.
pub fn normalize_e164(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (explicit_plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !SEPARATORS.contains(&ch) {
            return None;
        }
    }

    if digits.is_empty() {
        return None;
    }

    // "00" international prefix is the dial-pad spelling of "+".
    let international = explicit_plus || digits.starts_with("00");
    if !explicit_plus && international {
        digits.drain(..2);
    }

    if international {
        return (7..=15).contains(&digits.len()).then(|| format!("+{digits}"));
    }

    // National shapes: NANP 10-digit, or 11-digit with leading country code 1.
    match digits.len() {
        10 => Some(format!("+1{digits}")),
        11 if digits.starts_with('1') => Some(format!("+{digits}")),
        _ => None,
    }
}
