/// Compares an inbound verification token against the configured one.
///
/// An absent inbound token or an empty configured token never matches.
pub fn tokens_match(posted: Option<&str>, expected: &str) -> bool {
    match posted {
        Some(posted) if !expected.is_empty() => {
            constant_time_eq(posted.as_bytes(), expected.as_bytes())
        }
        _ => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
