//! Small utility helpers used across modules.

/// Replaces occurrences of `{key}` in the template with provided values.
/// Unknown placeholders and literal braces are left alone.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings; never splits a UTF-8 sequence.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_known_placeholders_only() {
    let out = fill_template(r#"{"topic": "{topic}", "n": {n}, "keep": "{other}"}"#, &[("topic", "IAM"), ("n", "5")]);
    assert_eq!(out, r#"{"topic": "IAM", "n": 5, "keep": "{other}"}"#);
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let out = trunc_for_log("héllo wörld", 2);
    assert!(out.starts_with("h…"));
    assert!(out.ends_with("(13 bytes total)"));
  }
}
