//! Ordered text-edit buffer.
//!
//! All rewriting is expressed as localised edits against the original source
//! text: pure insertions (zero-width) and span replacements. Edits are
//! applied in one pass, sorted by position; replacement spans must not
//! overlap. Edits anchored at the same position apply in authoring order,
//! except that an insertion at the start of a replaced span lands before the
//! replacement text (a fragment wrapper opens before the expression it
//! wraps).

use crate::srcmap::SourceMapBuilder;

/// A single edit against the original text.
#[derive(Debug, Clone)]
struct Edit {
    /// Byte offset where the edit starts
    start: u32,
    /// Byte offset where the replaced span ends; equal to `start` for
    /// insertions
    end: u32,
    /// Replacement text
    text: String,
    /// Authoring order, tie-breaker for same-anchor edits
    seq: usize,
}

/// Accumulates edits and applies them in one pass.
#[derive(Debug, Default)]
pub struct EditBuffer {
    edits: Vec<Edit>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `text` at byte offset `at`.
    pub fn insert(&mut self, at: u32, text: impl Into<String>) {
        let seq = self.edits.len();
        self.edits.push(Edit {
            start: at,
            end: at,
            text: text.into(),
            seq,
        });
    }

    /// Replace the bytes in `start..end` with `text`.
    pub fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        debug_assert!(start <= end);
        let seq = self.edits.len();
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
            seq,
        });
    }

    /// True when no edits were recorded; the driver suppresses output in
    /// that case so downstream passes see the original source.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    fn sorted(&self) -> Vec<&Edit> {
        let mut sorted: Vec<&Edit> = self.edits.iter().collect();
        // Insertions at the start of a replaced span sort first because
        // their end (== start) is smaller.
        sorted.sort_by_key(|e| (e.start, e.end, e.seq));
        sorted
    }

    /// Apply all edits to `source`, producing the rewritten text.
    pub fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + self.edits.len() * 16);
        let mut cursor = 0usize;

        for edit in self.sorted() {
            let start = edit.start as usize;
            let end = edit.end as usize;
            debug_assert!(start >= cursor, "overlapping edits at byte {}", start);

            out.push_str(&source[cursor..start]);
            out.push_str(&edit.text);
            cursor = end.max(cursor);
        }

        out.push_str(&source[cursor..]);
        out
    }

    /// Apply all edits while recording mappings from the rewritten text back
    /// to the original. A mapping is emitted at the start of every copied
    /// segment and at the start of every generated line inside one, which is
    /// enough resolution for debuggers to land on the right token.
    pub fn apply_with_map(&self, source: &str, map: &mut SourceMapBuilder) -> String {
        let mut out = String::with_capacity(source.len() + self.edits.len() * 16);
        let mut cursor = 0usize;

        // Both positions are 0-indexed (line, column) pairs.
        let mut gen = (0u32, 0u32);
        let mut orig = (0u32, 0u32);

        for edit in self.sorted() {
            let start = edit.start as usize;
            let end = edit.end as usize;
            debug_assert!(start >= cursor, "overlapping edits at byte {}", start);

            if start > cursor {
                copy_segment(&source[cursor..start], &mut gen, &mut orig, map, &mut out);
            }

            // Inserted text advances only the generated position and maps
            // back to the edit anchor.
            if !edit.text.is_empty() {
                map.add_mapping(gen.0, gen.1, orig.0, orig.1);
                advance(&edit.text, &mut gen);
                out.push_str(&edit.text);
            }

            // Skip over any replaced original text.
            if end > start.max(cursor) {
                advance(&source[start.max(cursor)..end], &mut orig);
            }
            cursor = end.max(cursor);
        }

        if cursor < source.len() {
            copy_segment(&source[cursor..], &mut gen, &mut orig, map, &mut out);
        }

        out
    }
}

/// Copy an unchanged chunk, emitting a mapping at its start and at the
/// start of every generated line inside it.
fn copy_segment(
    text: &str,
    gen: &mut (u32, u32),
    orig: &mut (u32, u32),
    map: &mut SourceMapBuilder,
    out: &mut String,
) {
    map.add_mapping(gen.0, gen.1, orig.0, orig.1);
    for ch in text.chars() {
        if ch == '\n' {
            gen.0 += 1;
            gen.1 = 0;
            orig.0 += 1;
            orig.1 = 0;
            map.add_mapping(gen.0, gen.1, orig.0, orig.1);
        } else {
            gen.1 += ch.len_utf8() as u32;
            orig.1 += ch.len_utf8() as u32;
        }
    }
    out.push_str(text);
}

/// Advance a 0-indexed (line, column) position over `text`.
fn advance(text: &str, pos: &mut (u32, u32)) {
    for ch in text.chars() {
        if ch == '\n' {
            pos.0 += 1;
            pos.1 = 0;
        } else {
            pos.1 += ch.len_utf8() as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_replace() {
        let mut edits = EditBuffer::new();
        edits.replace(4, 5, "__scope.x");
        edits.insert(0, "const t = ");

        assert_eq!(edits.apply("use(x);"), "const t = use(__scope.x);");
    }

    #[test]
    fn test_same_anchor_preserves_authoring_order() {
        let mut edits = EditBuffer::new();
        edits.insert(3, "a");
        edits.insert(3, "b");

        assert_eq!(edits.apply("xyz"), "xyzab");
    }

    #[test]
    fn test_insert_before_replacement_at_same_start() {
        // Fragment wrap around an identifier that is itself rewritten.
        let mut edits = EditBuffer::new();
        edits.replace(0, 1, "__scope.x");
        edits.insert(0, "<>");
        edits.insert(1, "{__task_0}</>");

        assert_eq!(edits.apply("x"), "<>__scope.x{__task_0}</>");
    }

    #[test]
    fn test_empty_buffer_is_identity() {
        let edits = EditBuffer::new();
        assert!(edits.is_empty());
        assert_eq!(edits.apply("unchanged"), "unchanged");
    }

    #[test]
    fn test_apply_with_map_tracks_lines() {
        let mut edits = EditBuffer::new();
        edits.insert(8, "const __task_0 = ");

        let source = "let a=1;\nuse(a);\n";
        let mut map = SourceMapBuilder::new();
        let out = edits.apply_with_map(source, &mut map);

        assert_eq!(out, "let a=1;const __task_0 = \nuse(a);\n");
        let json: serde_json::Value =
            serde_json::from_str(&map.build("t.tsx", source)).unwrap();
        assert_eq!(json["version"], 3);
        assert!(json["mappings"].as_str().unwrap().contains(';'));
    }
}
