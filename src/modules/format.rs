use crate::modules::error::SemanticsError;

pub fn strip_0x_str(s: &str) -> &str {
  s.strip_prefix("0x").unwrap_or(s)
}

/// Parses hex-encoded bytecode as emitted by solc `--bin`, tolerating a `0x`
/// prefix and surrounding whitespace.
pub fn parse_bytecode(text: &str) -> Result<Vec<u8>, SemanticsError> {
  Ok(hex::decode(strip_0x_str(text.trim()))?)
}

pub fn bitmap_hex(jumpdests: &[u8]) -> String {
  format!("0x{}", hex::encode(jumpdests))
}
