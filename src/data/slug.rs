use chrono::{DateTime, Utc};
use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Characters in a slug.
pub const SLUG_LEN: usize = 4;

/// Characters in a time salt. Base 36 seconds fit in seven digits until well past 4000 AD.
pub const SALT_LEN: usize = 7;

pub const SEPARATOR: char = ':';

/// Mint a short pseudo-random slug. Uniqueness is left to the store.
pub fn new_slug_with(rng: &mut impl Rng) -> String {
    (0..SLUG_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Render a timestamp as a fixed-width base 36 salt.
///
/// Fixed width keeps lexicographic order equal to chronological order.
pub fn salt(now: DateTime<Utc>) -> String {
    let mut seconds = now.timestamp().max(0) as u64;
    let mut digits = [b'0'; SALT_LEN];
    for digit in digits.iter_mut().rev() {
        *digit = DIGITS[(seconds % 36) as usize];
        seconds /= 36;
    }
    String::from_utf8_lossy(&digits).into_owned()
}

/// Build a full slug: `salt:slug` for a top-level comment, or the parent's
/// full slug followed by `:salt:slug` for a reply.
pub fn compose_full_slug(parent_full_slug: Option<&str>, slug: &str, salt: &str) -> String {
    match parent_full_slug {
        Some(parent) => format!("{parent}{SEPARATOR}{salt}{SEPARATOR}{slug}"),
        None => format!("{salt}{SEPARATOR}{slug}"),
    }
}

/// Number of ancestors encoded in a full slug.
pub fn depth(full_slug: &str) -> usize {
    if full_slug.is_empty() {
        return 0;
    }
    let parts = full_slug.split(SEPARATOR).count();
    (parts / 2).saturating_sub(1)
}

/// Whether `full_slug` sits strictly inside the subtree rooted at `ancestor`.
#[cfg(test)]
pub(crate) fn is_descendant(full_slug: &str, ancestor: &str) -> bool {
    full_slug.len() > ancestor.len()
        && full_slug.starts_with(ancestor)
        && full_slug[ancestor.len()..].starts_with(SEPARATOR)
}
