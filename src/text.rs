// 🔤 Text Validation - Character set and length checks for registry text
//
// Registry text must be printable ASCII or a Latin-1 letter; control
// characters, symbols outside that range and emoji are rejected.

/// Validate one text value. Returns the error sentence, or None if valid.
pub fn validate_text(value: &str, field_label: &str) -> Option<String> {
    let invalid: Vec<char> = value.chars().filter(|c| !is_valid_char(*c)).collect();
    if invalid.is_empty() {
        return None;
    }
    let listed: String = invalid.iter().map(|c| c.escape_default().to_string()).collect();
    Some(format!(
        "{} contains characters that are not allowed: {}.",
        field_label, listed
    ))
}

/// Validate a required text value with a maximum length.
pub fn validate_required_text(value: &str, field_label: &str, max_length: usize) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{} is required.", field_label));
    }
    if value.chars().count() > max_length {
        return Some(format!(
            "{} must be {} characters or fewer.",
            field_label, max_length
        ));
    }
    validate_text(value, field_label)
}

fn is_valid_char(c: char) -> bool {
    match c {
        ' '..='~' => true,
        // Latin-1 letters, excluding × and ÷
        'À'..='ÿ' => c != '×' && c != '÷',
        _ => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================
