//! Canonical block hashing.
//!
//! Blocks are encoded as JSON with sorted keys, `", "` and `": "` separators and
//! every character outside printable ASCII escaped as `\uXXXX`. Numbers keep
//! the digits they arrived with when they are integers; anything with a
//! fraction or exponent is written in shortest round-trip form, switching to
//! `1e-05` / `1e+16` notation outside `[1e-4, 1e16)`. Every peer on the network
//! hashes with exactly this layout, so chains validate across nodes.

use crate::Block;
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, Serializer};
use sha2::{Digest, Sha256};
use std::io::{self, Write};

/// Hex SHA-256 of the block's canonical encoding.
pub fn digest(block: &Block) -> String {
    sha256_hex(&canonical_bytes(block))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    let mut ser = Serializer::with_formatter(&mut out, CanonicalFormatter);
    // Writing plain structs into a Vec has no failure path.
    if let Err(err) = value.serialize(&mut ser) {
        tracing::error!(%err, "canonical encoding failed");
    }
    out
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    /// Every `serde_json::Number` lands here, holding the text it was parsed from.
    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if !value.contains(['.', 'e', 'E']) {
            let digits = if value == "-0" { "0" } else { value };
            return writer.write_all(digits.as_bytes());
        }
        match value.parse::<f64>() {
            Ok(float) => self.write_f64(writer, float),
            Err(_) => writer.write_all(value.as_bytes()),
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.bytes().all(|b| b < 0x7f) {
            return CompactFormatter.write_string_fragment(writer, fragment);
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (ch as u32) < 0x7f {
                let mut buf = [0u8; 4];
                writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Shortest round-trip text for `value`: `2.5`, `10.0`, `0.0001`, `1e-05`,
/// `1e+16`, `1.5e+300`. Non-finite values become `NaN` / `Infinity`.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // `{:e}` yields the shortest digits, e.g. `1.5e-7`.
    let sci = format!("{:e}", value.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exponent + 1;

    let body = if point <= -4 || point > 16 {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{lead}{fraction}e{sign}{:02}", exponent.abs())
    } else if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}.0", "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{whole}.{fraction}")
    };

    if value.is_sign_negative() {
        format!("-{body}")
    } else {
        body
    }
}
