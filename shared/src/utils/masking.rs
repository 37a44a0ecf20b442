//! Masking of identifiers shown on the verification page and in logs

/// Mask the local part of an email-like identifier.
///
/// Local parts of up to four characters keep only their first character;
/// longer ones keep the first two and last two. Everything from the first
/// `@` onwards is left as-is. Identifiers without `@` are masked as a bare
/// local part.
///
/// # Example
/// ```
/// use mfa_shared::utils::mask_email;
///
/// assert_eq!(mask_email("ab@x.com"), "a*@x.com");
/// assert_eq!(mask_email("abcdef@x.com"), "ab**ef@x.com");
/// ```
pub fn mask_email(identifier: &str) -> String {
    let (local, remainder) = match identifier.find('@') {
        Some(at) => identifier.split_at(at),
        None => (identifier, ""),
    };

    let chars: Vec<char> = local.chars().collect();
    let len = chars.len();

    let masked: String = if len <= 4 {
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i == 0 { *c } else { '*' })
            .collect()
    } else {
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < 2 || i >= len - 2 { *c } else { '*' })
            .collect()
    };

    format!("{}{}", masked, remainder)
}
