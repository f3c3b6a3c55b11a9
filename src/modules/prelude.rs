use crate::modules::error::SemanticsError;
use crate::modules::kast::{KInner, KSort};

pub fn int_token(i: i64) -> KInner {
  KInner::token(&i.to_string(), KSort::int())
}

pub fn bool_token(b: bool) -> KInner {
  KInner::token(if b { "true" } else { "false" }, KSort::bool())
}

pub fn string_token(s: &str) -> KInner {
  let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
  KInner::token(&format!("\"{}\"", escaped), KSort::string())
}

/// Encodes raw bytes as a K `b"..."` literal.
pub fn bytes_token(bs: &[u8]) -> KInner {
  let mut text = String::with_capacity(bs.len() + 3);
  text.push_str("b\"");
  for &b in bs {
    match b {
      b'"' => text.push_str("\\\""),
      b'\\' => text.push_str("\\\\"),
      b'\n' => text.push_str("\\n"),
      b'\r' => text.push_str("\\r"),
      b'\t' => text.push_str("\\t"),
      0x0c => text.push_str("\\f"),
      0x20..=0x7e => text.push(b as char),
      _ => text.push_str(&format!("\\x{:02x}", b)),
    }
  }
  text.push('"');
  KInner::token(&text, KSort::bytes())
}

/// Decodes a Bytes token produced by [`bytes_token`] (or by the K frontend).
pub fn pretty_bytes(term: &KInner) -> Result<Vec<u8>, SemanticsError> {
  let text = match term {
    KInner::Token(text, sort) if *sort == KSort::bytes() => text,
    _ => return Err(SemanticsError::InvalidBytesToken(term.to_string())),
  };
  let invalid = || SemanticsError::InvalidBytesToken(text.clone());
  let body = text.strip_prefix("b\"").and_then(|t| t.strip_suffix('"')).ok_or_else(invalid)?;

  let raw = body.as_bytes();
  let mut out = Vec::with_capacity(raw.len());
  let mut i = 0;
  while i < raw.len() {
    if raw[i] != b'\\' {
      out.push(raw[i]);
      i += 1;
      continue;
    }
    let esc = *raw.get(i + 1).ok_or_else(invalid)?;
    match esc {
      b'"' => out.push(b'"'),
      b'\\' => out.push(b'\\'),
      b'n' => out.push(b'\n'),
      b'r' => out.push(b'\r'),
      b't' => out.push(b'\t'),
      b'f' => out.push(0x0c),
      b'x' => {
        let digits = raw.get(i + 2..i + 4).ok_or_else(invalid)?;
        let decoded = hex::decode(digits).map_err(|_| invalid())?;
        out.push(decoded[0]);
        i += 2;
      }
      _ => return Err(invalid()),
    }
    i += 2;
  }
  Ok(out)
}

pub fn eq_int(a: KInner, b: KInner) -> KInner {
  KInner::apply("_==Int_", vec![a, b])
}

pub fn neq_int(a: KInner, b: KInner) -> KInner {
  KInner::apply("_=/=Int_", vec![a, b])
}

pub fn lt_int(a: KInner, b: KInner) -> KInner {
  KInner::apply("_<Int_", vec![a, b])
}

pub fn not_bool(b: KInner) -> KInner {
  KInner::apply("notBool_", vec![b])
}

pub fn ml_top() -> KInner {
  KInner::apply0("#Top")
}

pub fn ml_bottom() -> KInner {
  KInner::apply0("#Bottom")
}

pub fn ml_equals_true(term: KInner) -> KInner {
  KInner::apply("#Equals", vec![bool_token(true), term])
}

pub fn ml_equals_false(term: KInner) -> KInner {
  KInner::apply("#Equals", vec![bool_token(false), term])
}
