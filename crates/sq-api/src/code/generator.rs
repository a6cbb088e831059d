use rand::Rng;

/// Uppercase letters and digits without the easily confused `I`, `L`, `O`,
/// `0` and `1`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 8;

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Canonical form of a typed code: uppercase, spaces and hyphens removed.
///
/// Returns `None` when the result cannot be a code, so lookups can be
/// skipped.
pub fn normalize_code(input: &str) -> Option<String> {
    let code: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let well_formed = code.len() == CODE_LENGTH
        && code.bytes().all(|b| CODE_ALPHABET.contains(&b));

    well_formed.then_some(code)
}
