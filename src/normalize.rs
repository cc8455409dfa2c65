/// Strips the query string and fragment from a URI.
///
/// Everything from the first `?` or `#` onwards is removed, so applying it
/// twice gives the same result as applying it once.
pub fn truncate_query_string_fragment(uri: &str) -> &str {
    match uri.find(['?', '#']) {
        Some(idx) => &uri[..idx],
        None => uri,
    }
}
