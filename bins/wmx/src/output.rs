//! Output helpers.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json { pretty: bool },
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json { .. })
    }

    /// Print `value` as one JSON document.
    pub fn print_json<T: Serialize>(self, value: &T) -> anyhow::Result<()> {
        let text = match self {
            Self::Json { pretty: true } => serde_json::to_string_pretty(value)?,
            _ => serde_json::to_string(value)?,
        };
        println!("{}", text);
        Ok(())
    }
}

/// Lowercase hex, no separators.
pub fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse hex digits, ignoring whitespace and `:` separators.
pub fn hex_decode(s: &str) -> anyhow::Result<Vec<u8>> {
    let digits: Vec<u8> = s
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        anyhow::bail!("odd number of hex digits");
    }
    digits
        .chunks(2)
        .map(|pair| -> anyhow::Result<u8> {
            let pair = std::str::from_utf8(pair)?;
            u8::from_str_radix(pair, 16)
                .map_err(|_| anyhow::anyhow!("invalid hex byte \"{}\"", pair))
        })
        .collect()
}

/// Classic 16-bytes-per-line dump with offsets.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in data.chunks(16).enumerate() {
        let bytes: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:04x}  {:<47}  {}\n", i * 16, bytes.join(" "), ascii));
    }
    out
}
