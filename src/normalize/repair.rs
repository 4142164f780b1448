//! Best-effort repair of near-JSON model output.
//!
//! Pure text → text. Rules run unconditionally and in order:
//!   1. trim to the first `{` .. last `}` span (drops chatter and code fences)
//!   2. collapse raw newlines to spaces
//!   3. escape backslashes that do not start a valid JSON escape
//!   4. append missing `}` when the text does not already end with one
//!
//! Step 2 does not track string boundaries. It only ever runs on text that
//! already failed to parse, so well-formed multi-line JSON is never touched.

use serde_json::Value;

pub fn repair(raw: &str) -> String {
  let trimmed = trim_to_braces(raw);
  let flattened = collapse_newlines(trimmed);
  let escaped = escape_stray_backslashes(&flattened);
  close_braces(escaped)
}

/// Parse as-is, otherwise parse the repaired text.
/// `Ok((value, repaired))` tells the caller which of the two succeeded.
pub fn parse_lenient(raw: &str) -> Result<(Value, bool), serde_json::Error> {
  match serde_json::from_str::<Value>(raw) {
    Ok(v) => Ok((v, false)),
    Err(_) => serde_json::from_str::<Value>(&repair(raw)).map(|v| (v, true)),
  }
}

fn trim_to_braces(text: &str) -> &str {
  match (text.find('{'), text.rfind('}')) {
    (Some(start), Some(end)) if start < end => &text[start..=end],
    _ => text,
  }
}

fn collapse_newlines(text: &str) -> String {
  text.replace("\r\n", " ").replace(|c: char| c == '\n' || c == '\r', " ")
}

fn escape_stray_backslashes(text: &str) -> String {
  let chars: Vec<char> = text.chars().collect();
  let mut out = String::with_capacity(text.len() + 8);
  let mut i = 0;
  while i < chars.len() {
    let ch = chars[i];
    if ch != '\\' {
      out.push(ch);
      i += 1;
      continue;
    }
    match chars.get(i + 1) {
      Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
        out.push('\\');
        out.push(chars[i + 1]);
        i += 2;
      }
      Some('u') if is_unicode_escape(&chars[i + 2..]) => {
        out.push('\\');
        i += 1;
      }
      _ => {
        out.push_str("\\\\");
        i += 1;
      }
    }
  }
  out
}

fn is_unicode_escape(rest: &[char]) -> bool {
  rest.len() >= 4 && rest[..4].iter().all(|c| c.is_ascii_hexdigit())
}

fn close_braces(mut text: String) -> String {
  if text.trim_end().ends_with('}') {
    return text;
  }
  let open = text.matches('{').count();
  let close = text.matches('}').count();
  for _ in close..open {
    text.push('}');
  }
  text
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_commentary_around_object() {
    let raw = "Sure! Here is your path:\n```json\n{\"title\": \"X\"}\n```\nHope it helps.";
    assert_eq!(repair(raw), "{\"title\": \"X\"}");
  }

  #[test]
  fn already_trimmed_text_is_left_alone() {
    let raw = r#"{"a": {"b": [1, 2]}}"#;
    assert_eq!(repair(raw), raw);
  }

  #[test]
  fn raw_newlines_inside_strings_become_spaces() {
    let raw = "{\"description\": \"line one\nline two\"}";
    let fixed = repair(raw);
    let v: Value = serde_json::from_str(&fixed).unwrap();
    assert_eq!(v["description"], "line one line two");
  }

  #[test]
  fn stray_backslashes_are_escaped_but_valid_escapes_survive() {
    let raw = r#"{"path": "C:\Users\dev", "quote": "say \"hi\"", "tab": "a\tb", "u": "\u00e9"}"#;
    let v: Value = serde_json::from_str(&repair(raw)).unwrap();
    assert_eq!(v["path"], "C:\\Users\\dev");
    assert_eq!(v["quote"], "say \"hi\"");
    assert_eq!(v["tab"], "a\tb");
    assert_eq!(v["u"], "é");
  }

  #[test]
  fn truncated_object_gets_closing_braces() {
    let raw = r#"{"title": "Path", "metadata": {"level": "beginner""#;
    let fixed = repair(raw);
    assert!(fixed.ends_with("}}"));
    let v: Value = serde_json::from_str(&fixed).unwrap();
    assert_eq!(v["metadata"]["level"], "beginner");
  }

  #[test]
  fn text_without_braces_passes_through() {
    assert_eq!(repair("not json at all"), "not json at all");
  }

  #[test]
  fn valid_inner_object_always_parses_after_repair() {
    let samples = [
      "prefix {\"a\": 1} suffix",
      "{\"nested\": {\"list\": [\"x\\\\y\", \"\\n\"]}}",
      "```\n{\n  \"k\": \"v\",\n  \"n\": null\n}\n```",
      "noise } { \"late\": true } trailing",
    ];
    for s in samples {
      let start = s.find('{').unwrap();
      let end = s.rfind('}').unwrap();
      if serde_json::from_str::<Value>(&s[start..=end]).is_ok() {
        assert!(serde_json::from_str::<Value>(&repair(s)).is_ok(), "failed on {s:?}");
      }
    }
  }

  #[test]
  fn parse_lenient_reports_which_path_succeeded() {
    let (_, repaired) = parse_lenient(r#"{"ok": true}"#).unwrap();
    assert!(!repaired);
    let (v, repaired) = parse_lenient("Result: {\"ok\": true}").unwrap();
    assert!(repaired);
    assert_eq!(v["ok"], true);
    assert!(parse_lenient("nothing here").is_err());
  }
}
