/* src/engine/rust/src/escape.rs */

pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      c => out.push(c),
    }
  }
  out
}

/// Make JSON text safe to place inside an inline `<script>` element.
///
/// `<`, `>` and `&` can only occur inside JSON strings, where the `\uXXXX`
/// form decodes to the same character, so `</script>` and `<!--` can never
/// terminate the element early. U+2028/U+2029 are escaped because older JS
/// engines treat them as line terminators inside string literals.
pub fn escape_script_json(json: &str) -> String {
  let mut out = String::with_capacity(json.len());
  for ch in json.chars() {
    match ch {
      '<' => out.push_str("\\u003c"),
      '>' => out.push_str("\\u003e"),
      '&' => out.push_str("\\u0026"),
      '\u{2028}' => out.push_str("\\u2028"),
      '\u{2029}' => out.push_str("\\u2029"),
      c => out.push(c),
    }
  }
  out
}
