pub const MAX_USERNAME_LEN: usize = 64;

// Trimmed, non-empty, no ':' (Basic auth separator), no control characters
pub fn normalize_username(raw: &str) -> Option<String> {
    let username = raw.trim();
    let valid = !username.is_empty()
        && username.chars().count() <= MAX_USERNAME_LEN
        && !username.chars().any(|c| c == ':' || c.is_control());
    valid.then(|| username.to_string())
}
