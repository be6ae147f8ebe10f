//! ISBN check-digit validation.

/// Validates an ISBN candidate and returns it in normalized form.
///
/// Hyphens and spaces are stripped before validation, so
/// `978-7-5063-8026-3` and `9787506380263` are the same ISBN. Both the
/// 10-digit form (mod-11 weighted sum, trailing `X` allowed as the check
/// digit) and the 13-digit form (alternating 1/3 weights, mod 10) are
/// accepted; anything else returns `None`.
#[must_use]
pub fn check_isbn(candidate: &str) -> Option<String> {
    let normalized: String = candidate
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    match normalized.len() {
        10 if valid_isbn10(&normalized) => Some(normalized),
        13 if valid_isbn13(&normalized) => Some(normalized),
        _ => None,
    }
}

fn valid_isbn10(isbn: &str) -> bool {
    let mut sum = 0;
    let mut weight = 10u32;
    for c in isbn.chars() {
        let value = match c.to_digit(10) {
            Some(digit) => digit,
            // X counts as 10 and is only valid in the check position.
            None if matches!(c, 'X' | 'x') && weight == 1 => 10,
            None => return false,
        };
        sum += weight * value;
        weight -= 1;
    }
    sum % 11 == 0
}

fn valid_isbn13(isbn: &str) -> bool {
    let mut sum = 0;
    for (position, c) in isbn.chars().enumerate() {
        match c.to_digit(10) {
            Some(digit) if position % 2 == 0 => sum += digit,
            Some(digit) => sum += 3 * digit,
            None => return false,
        }
    }
    sum % 10 == 0
}
