//! Display-name formatting.

/// Hard platform limit on nickname length, in characters.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// `"{rank} | {username}"`, cut to [`MAX_NICKNAME_CHARS`].
///
/// The cut is a plain suffix cut on character boundaries: no ellipsis, no
/// word awareness.
pub fn format_nickname(rank_name: &str, username: &str) -> String {
    format!("{rank_name} | {username}")
        .chars()
        .take(MAX_NICKNAME_CHARS)
        .collect()
}
