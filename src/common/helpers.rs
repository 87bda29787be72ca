// Format checks shared by model validators

/// Returns true if the value looks like an email address
///
/// Accepts exactly one `@` that is neither the first nor the last character.
pub fn is_email_address(value: &str) -> bool {
    let Some(at) = value.find('@') else {
        return false;
    };

    at != 0 && at != value.len() - 1 && value.rfind('@') == Some(at)
}

/// Returns true if the value looks like a phone number
///
/// Digits plus `-`, `.`, `(`, `)` and whitespace, an optional leading `+`
/// and an optional trailing extension (`ext.`, `ext` or `x` followed by
/// digits). At least one digit is required.
pub fn is_phone_number(value: &str) -> bool {
    let trimmed = value.trim_end();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let body = strip_extension(body);

    let mut has_digit = false;
    for c in body.chars() {
        if c.is_ascii_digit() {
            has_digit = true;
        } else if !matches!(c, '-' | '.' | '(' | ')') && !c.is_whitespace() {
            return false;
        }
    }

    has_digit
}

fn strip_extension(value: &str) -> &str {
    let lower = value.to_ascii_lowercase();
    for marker in ["ext.", "ext", "x"] {
        if let Some(idx) = lower.rfind(marker) {
            let digits = value[idx + marker.len()..].trim_start();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return &value[..idx];
            }
        }
    }
    value
}

/// Returns true if the value is an absolute http, https or ftp url
pub fn is_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    ["http://", "https://", "ftp://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Returns true if the value is empty or only whitespace
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
