/// Normalize recognized text for industrial codes.
///
/// Trims surrounding whitespace, then keeps only ASCII letters, ASCII digits,
/// `-`, `_` and whitespace. Whitespace uncovered by the removal is trimmed as
/// well, so the function is idempotent. Look-alike substitutions (0/O, 1/l)
/// are not attempted.
pub fn clean_text(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || c.is_whitespace())
        .collect();
    kept.trim().to_string()
}
