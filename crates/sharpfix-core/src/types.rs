//! Common types shared between error and output modules.

use serde::{Deserialize, Serialize};

use crate::patch::Span;
use crate::text::byte_offset_to_position_str;

// ============================================================================
// Location Type
// ============================================================================

/// Location in a source file.
///
/// - `file`: Workspace-relative path
/// - `line`: 1-indexed line number
/// - `col`: 1-indexed column, counted in characters
/// - `byte_start`/`byte_end`: optional byte span, end exclusive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path (workspace-relative).
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
    /// Byte offset from file start (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_start: Option<usize>,
    /// Byte offset end, exclusive (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_end: Option<usize>,
}

impl Location {
    /// Create a new location without byte offsets.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
            byte_start: None,
            byte_end: None,
        }
    }

    /// Create a location for a span of `content`, computing line and column.
    pub fn from_span(file: impl Into<String>, content: &str, span: Span) -> Self {
        let (line, col) = byte_offset_to_position_str(content, span.start);
        Location {
            file: file.into(),
            line,
            col,
            byte_start: Some(span.start),
            byte_end: Some(span.end),
        }
    }

    /// Parse a location from "path:line:col" format.
    ///
    /// Robust against paths containing colons (e.g., Windows paths).
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.rsplitn(3, ':').collect();
        if parts.len() != 3 {
            return None;
        }
        let col: u32 = parts[0].parse().ok()?;
        let line: u32 = parts[1].parse().ok()?;
        let file = parts[2].to_string();
        Some(Location::new(file, line, col))
    }

    /// Comparison key for deterministic sorting: (file, line, col).
    fn sort_key(&self) -> (&str, u32, u32) {
        (&self.file, self.line, self.col)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod location_tests {
        use super::*;

        #[test]
        fn location_new_serializes_without_byte_offsets() {
            let loc = Location::new("Program.cs", 42, 8);
            let json = serde_json::to_string(&loc).unwrap();
            assert!(!json.contains("byte_start"));
            assert!(!json.contains("byte_end"));
            assert!(json.contains("\"file\":\"Program.cs\""));
            assert!(json.contains("\"line\":42"));
            assert!(json.contains("\"col\":8"));
        }

        #[test]
        fn location_from_span_computes_position() {
            let content = "class C\n{\n    void M(ref int a) {}\n}\n";
            let start = content.find("ref").unwrap();
            let loc = Location::from_span("C.cs", content, Span::new(start, start + 3));
            assert_eq!(loc.line, 3);
            assert_eq!(loc.col, 12);
            assert_eq!(loc.byte_start, Some(start));
            assert_eq!(loc.byte_end, Some(start + 3));
        }

        #[test]
        fn location_parse_valid() {
            let loc = Location::parse("src/Utils.cs:42:5").unwrap();
            assert_eq!(loc.file, "src/Utils.cs");
            assert_eq!(loc.line, 42);
            assert_eq!(loc.col, 5);
            assert_eq!(loc.byte_start, None);
        }

        #[test]
        fn location_parse_windows_path() {
            let loc = Location::parse("C:/Users/foo/src/Utils.cs:10:3").unwrap();
            assert_eq!(loc.file, "C:/Users/foo/src/Utils.cs");
            assert_eq!(loc.line, 10);
            assert_eq!(loc.col, 3);
        }

        #[test]
        fn location_parse_invalid() {
            assert!(Location::parse("src/Utils.cs").is_none());
            assert!(Location::parse("src/Utils.cs:42").is_none());
            assert!(Location::parse("src/Utils.cs:abc:5").is_none());
        }

        #[test]
        fn locations_sort_by_file_line_col() {
            let mut locs = vec![
                Location::new("b.cs", 1, 1),
                Location::new("a.cs", 9, 1),
                Location::new("a.cs", 2, 7),
                Location::new("a.cs", 2, 3),
            ];
            locs.sort();
            let keys: Vec<_> = locs.iter().map(|l| (l.file.as_str(), l.line, l.col)).collect();
            assert_eq!(
                keys,
                vec![("a.cs", 2, 3), ("a.cs", 2, 7), ("a.cs", 9, 1), ("b.cs", 1, 1)]
            );
        }
    }
}
