use anyhow::Context;
use std::fs;
use std::path::Path;

/// Blocked URIs produced by browser extensions, in-app webviews and other
/// sources that never indicate a problem with the reporting page.
pub const DEFAULT_IGNORED_BLOCKED_URIS: &[&str] = &[
    "resource://",
    "chromenull://",
    "chrome-extension://",
    "safari-extension://",
    "mxjscall://",
    "webviewprogressproxy://",
    "res://",
    "mx://",
    "safari-resource://",
    "chromeinvoke://",
    "chromeinvokeimmediate://",
    "mbinit://",
    "opera://",
    "ms-appx://",
    "ms-appx-web://",
    "localhost",
    "127.0.0.1",
    "none://",
    "about:blank",
    "android-webview",
    "ms-browser-extension",
    "wvjbscheme://__wvjb_queue_message__",
    "nativebaiduhd://adblock",
    "bdvideo://error",
];

pub fn default_ignored_blocked_uris() -> Vec<String> {
    DEFAULT_IGNORED_BLOCKED_URIS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Drops blank lines and `#` comments, keeping the order of the rest.
pub fn trim_empty_and_comments<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let trimmed = line.as_ref().trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

pub fn load_filter_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading filter file {}", path.display()))?;
    Ok(trim_empty_and_comments(content.lines()))
}

/// Literal prefix match; an entry equal to the whole URI matches too.
pub fn is_ignored(blocked_uris: &[String], uri: &str) -> bool {
    blocked_uris.iter().any(|prefix| uri.starts_with(prefix.as_str()))
}
