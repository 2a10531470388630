use deunicode::deunicode;

/// Transliterates text to its closest ASCII approximation.
///
/// Lossy and one-way: the original Unicode is not kept anywhere. ASCII input is
/// returned unchanged, so normalizing twice gives the same result as once.
#[inline]
pub fn to_ascii(text: &str) -> String {
    if text.is_ascii() {
        return text.to_owned();
    }
    deunicode(text)
}
