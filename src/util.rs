//! Small utility helpers used across modules.

/// Log-safe truncation for user input and large strings.
/// Cuts on a char boundary so multi-byte input never panics.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}

/// Render seconds as `m:ss` for the drill clock.
pub fn format_clock(secs: u32) -> String {
  format!("{}:{:02}", secs / 60, secs % 60)
}
