//! Source map v3 emission.
//!
//! The edit buffer reports (generated, original) position pairs while it
//! applies edits; this module packs them into the standard base64-VLQ
//! `mappings` string and a JSON document the bundler host can forward.
//! There is a single source per map (the transformer works file-at-a-time)
//! and no symbol names are tracked.

use serde_json::json;

/// One recorded mapping, all positions 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mapping {
    gen_line: u32,
    gen_col: u32,
    src_line: u32,
    src_col: u32,
}

/// Collects mappings and serialises them as a source map v3 document.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that generated position maps back to original position.
    /// Mappings must be added in generated order; duplicates are dropped.
    pub fn add_mapping(&mut self, gen_line: u32, gen_col: u32, src_line: u32, src_col: u32) {
        let mapping = Mapping {
            gen_line,
            gen_col,
            src_line,
            src_col,
        };
        if self.mappings.last() == Some(&mapping) {
            return;
        }
        self.mappings.push(mapping);
    }

    /// Serialise to a source map v3 JSON string.
    pub fn build(&self, source_path: &str, source_content: &str) -> String {
        let mut out = String::new();

        let mut current_line = 0u32;
        let mut first_on_line = true;
        // VLQ fields are deltas against the previous segment; generated
        // column resets per line, source fields do not.
        let mut prev_gen_col = 0i64;
        let mut prev_src_line = 0i64;
        let mut prev_src_col = 0i64;

        for m in &self.mappings {
            while current_line < m.gen_line {
                out.push(';');
                current_line += 1;
                first_on_line = true;
                prev_gen_col = 0;
            }

            if !first_on_line {
                out.push(',');
            }
            first_on_line = false;

            encode_vlq(&mut out, m.gen_col as i64 - prev_gen_col);
            encode_vlq(&mut out, 0); // single source, index never moves
            encode_vlq(&mut out, m.src_line as i64 - prev_src_line);
            encode_vlq(&mut out, m.src_col as i64 - prev_src_col);

            prev_gen_col = m.gen_col as i64;
            prev_src_line = m.src_line as i64;
            prev_src_col = m.src_col as i64;
        }

        json!({
            "version": 3,
            "sources": [source_path],
            "sourcesContent": [source_content],
            "names": [],
            "mappings": out,
        })
        .to_string()
    }
}

const BASE64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Base64 VLQ as used by source map v3: the low bit of the first digit is
/// the sign, each digit carries 5 payload bits, the high bit marks
/// continuation.
fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq: u64 = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq != 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(&mut s, value);
        s
    }

    #[test]
    fn test_vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
    }

    #[test]
    fn test_identity_line_mappings() {
        let mut builder = SourceMapBuilder::new();
        builder.add_mapping(0, 0, 0, 0);
        builder.add_mapping(1, 0, 1, 0);

        let map: serde_json::Value =
            serde_json::from_str(&builder.build("a.tsx", "x\ny\n")).unwrap();
        assert_eq!(map["mappings"], "AAAA;AACA");
        assert_eq!(map["sources"][0], "a.tsx");
    }

    #[test]
    fn test_column_shift_after_insertion() {
        let mut builder = SourceMapBuilder::new();
        builder.add_mapping(0, 0, 0, 0);
        // 10 inserted characters: generated column 14 maps to original 4.
        builder.add_mapping(0, 14, 0, 4);

        let map: serde_json::Value =
            serde_json::from_str(&builder.build("a.tsx", "abcd")).unwrap();
        assert_eq!(map["mappings"], "AAAA,cAAI");
    }
}
