//! Pretty rendering of stored values
//!
//! Values are opaque bytes. When the bytes are recognized as a known format
//! they get a readable rendering next to the raw hex form. Sniffers run in a
//! fixed order and the first one that accepts the bytes wins:
//!
//! 1. CBOR, when the bytes are exactly one well-formed data item
//! 2. JSON, re-indented with two spaces
//! 3. Plain text, when every character is graphic or whitespace
//!
//! Bytes no sniffer accepts have no pretty form and are shown as hex only.
//! Renderings never rewrite the data: JSON keeps every token as written.

use crate::models::Pretty;
use ciborium::Value as CborValue;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Recognized content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Cbor,
    Json,
    String,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cbor => "cbor",
            Self::Json => "json",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single format sniffer
pub trait Prettifier {
    /// Content type reported when this sniffer accepts the bytes
    fn content_type(&self) -> ContentType;

    /// Readable rendering, or `None` if the bytes are not in this format
    fn prettify(&self, bytes: &[u8]) -> Option<String>;
}

/// Accepts a single well-formed CBOR data item with no trailing bytes
///
/// Items render as a tab-indented tree, containers prefixed with their
/// length: `Map<len:2> {`, `Array<len:3> [`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CborPrettifier;

impl Prettifier for CborPrettifier {
    fn content_type(&self) -> ContentType {
        ContentType::Cbor
    }

    fn prettify(&self, bytes: &[u8]) -> Option<String> {
        let mut rest = bytes;
        let value: CborValue = ciborium::de::from_reader(&mut rest).ok()?;
        if !rest.is_empty() {
            return None;
        }
        let mut out = String::new();
        write_cbor(&mut out, &value, 0);
        Some(out)
    }
}

fn write_cbor(out: &mut String, value: &CborValue, depth: usize) {
    let indent = |out: &mut String, depth: usize| {
        out.push('\n');
        out.extend(std::iter::repeat_n('\t', depth));
    };

    match value {
        CborValue::Integer(n) => {
            let _ = write!(out, "{}", i128::from(*n));
        }
        CborValue::Float(f) => {
            let _ = write!(out, "{f}");
        }
        CborValue::Text(text) => {
            let _ = write!(out, "{text:?}");
        }
        CborValue::Bytes(bytes) => {
            let _ = write!(out, "Bytes<len:{}> 0x{}", bytes.len(), hex::encode(bytes));
        }
        CborValue::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        CborValue::Null => out.push_str("null"),
        CborValue::Tag(tag, inner) => {
            let _ = write!(out, "Tag<{tag}> ");
            write_cbor(out, inner, depth);
        }
        CborValue::Array(items) => {
            let _ = write!(out, "Array<len:{}> [", items.len());
            for item in items {
                indent(out, depth + 1);
                write_cbor(out, item, depth + 1);
            }
            indent(out, depth);
            out.push(']');
        }
        CborValue::Map(entries) => {
            let _ = write!(out, "Map<len:{}> {{", entries.len());
            for (key, item) in entries {
                indent(out, depth + 1);
                write_cbor(out, key, depth + 1);
                out.push_str(": ");
                write_cbor(out, item, depth + 1);
            }
            indent(out, depth);
            out.push('}');
        }
        _ => out.push_str("undefined"),
    }
}

/// Accepts valid JSON documents
///
/// The document is validated by `serde_json` and then re-indented token by
/// token, so number literals and duplicate object keys survive unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPrettifier;

impl Prettifier for JsonPrettifier {
    fn content_type(&self) -> ContentType {
        ContentType::Json
    }

    fn prettify(&self, bytes: &[u8]) -> Option<String> {
        serde_json::from_slice::<serde::de::IgnoredAny>(bytes).ok()?;
        let text = std::str::from_utf8(bytes).ok()?;
        Some(reindent_json(text))
    }
}

/// Re-indent a valid JSON document with two spaces per level
///
/// Empty containers stay on one line.
fn reindent_json(json: &str) -> String {
    let newline = |out: &mut String, depth: usize| {
        out.push('\n');
        out.extend(std::iter::repeat_n(' ', depth * 2));
    };

    let mut out = String::with_capacity(json.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = json.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                out.push(c);
                while chars.next_if(char::is_ascii_whitespace).is_some() {}
                if let Some(close) = chars.next_if(|n| matches!(*n, '}' | ']')) {
                    out.push(close);
                } else {
                    depth += 1;
                    newline(&mut out, depth);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                newline(&mut out, depth);
            }
            ':' => out.push_str(": "),
            c if c.is_ascii_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Accepts displayable UTF-8 text
#[derive(Debug, Default, Clone, Copy)]
pub struct StringPrettifier;

impl Prettifier for StringPrettifier {
    fn content_type(&self) -> ContentType {
        ContentType::String
    }

    fn prettify(&self, bytes: &[u8]) -> Option<String> {
        let text = std::str::from_utf8(bytes).ok()?;
        crate::key::is_displayable(text).then(|| text.to_string())
    }
}

/// Ordered list of sniffers
pub struct PrettyPrinter {
    prettifiers: Vec<Box<dyn Prettifier + Send + Sync>>,
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self {
            prettifiers: vec![
                Box::new(CborPrettifier),
                Box::new(JsonPrettifier),
                Box::new(StringPrettifier),
            ],
        }
    }
}

impl PrettyPrinter {
    /// Printer with a custom sniffer order
    #[must_use]
    pub fn with_prettifiers(prettifiers: Vec<Box<dyn Prettifier + Send + Sync>>) -> Self {
        Self { prettifiers }
    }

    /// Render `bytes` with the first sniffer that accepts them
    #[must_use]
    pub fn print(&self, bytes: &[u8]) -> Option<Pretty> {
        self.prettifiers.iter().find_map(|p| {
            p.prettify(bytes).map(|text| Pretty {
                content_type: p.content_type().to_string(),
                text,
            })
        })
    }
}

/// Render `bytes` with the default sniffers
#[must_use]
pub fn prettify(bytes: &[u8]) -> Option<Pretty> {
    PrettyPrinter::default().print(bytes)
}
