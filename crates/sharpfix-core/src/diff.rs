//! Unified diff generation utilities.
//!
//! Produces standard unified diff text from before/after file contents, with
//! three lines of context around each change.

use difference::{Changeset, Difference};

/// Lines of unchanged context shown around each change.
const CONTEXT: usize = 3;

/// Before and after contents of one file.
#[derive(Debug, Clone, Copy)]
pub struct FileDiff<'a> {
    pub path: &'a str,
    pub old: &'a str,
    pub new: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Same,
    Removed,
    Added,
}

#[derive(Debug)]
struct DiffLine {
    tag: Tag,
    text: String,
    /// 1-indexed line numbers in the old and new file *before* this line.
    old_no: usize,
    new_no: usize,
    /// Last line of a side that does not end in a newline.
    no_newline: bool,
}

/// Lines in `text`, not counting the empty piece after a final newline.
fn line_count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.split('\n').count() - usize::from(text.ends_with('\n'))
}

fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let changeset = Changeset::new(old, new, "\n");
    let (old_lines, new_lines) = (line_count(old), line_count(new));
    let old_open = !old.is_empty() && !old.ends_with('\n');
    let new_open = !new.is_empty() && !new.ends_with('\n');

    let mut lines = Vec::new();
    // Positions among the split pieces, which include the trailing empty one.
    let (mut old_piece, mut new_piece) = (0, 0);
    let (mut old_no, mut new_no) = (0, 0);
    let mut push = |tag: Tag, text: &str, old_no: &mut usize, new_no: &mut usize| {
        let no_newline = match tag {
            Tag::Removed | Tag::Same => old_open && *old_no + 1 == old_lines,
            Tag::Added => new_open && *new_no + 1 == new_lines,
        };
        lines.push(DiffLine {
            tag,
            text: text.to_string(),
            old_no: *old_no,
            new_no: *new_no,
            no_newline,
        });
        match tag {
            Tag::Same => {
                *old_no += 1;
                *new_no += 1;
            }
            Tag::Removed => *old_no += 1,
            Tag::Added => *new_no += 1,
        }
    };

    for chunk in &changeset.diffs {
        let (tag, text) = match chunk {
            Difference::Same(text) => (Tag::Same, text),
            Difference::Rem(text) => (Tag::Removed, text),
            Difference::Add(text) => (Tag::Added, text),
        };
        for piece in text.split('\n') {
            let in_old = tag != Tag::Added && old_piece < old_lines;
            let in_new = tag != Tag::Removed && new_piece < new_lines;
            if tag != Tag::Added {
                old_piece += 1;
            }
            if tag != Tag::Removed {
                new_piece += 1;
            }
            match (in_old, in_new) {
                (true, true) => {
                    let old_last = old_open && old_no + 1 == old_lines;
                    let new_last = new_open && new_no + 1 == new_lines;
                    if old_last == new_last {
                        push(Tag::Same, piece, &mut old_no, &mut new_no);
                    } else {
                        // Same text, but only one side ends the file without a newline.
                        push(Tag::Removed, piece, &mut old_no, &mut new_no);
                        push(Tag::Added, piece, &mut old_no, &mut new_no);
                    }
                }
                (true, false) => push(Tag::Removed, piece, &mut old_no, &mut new_no),
                (false, true) => push(Tag::Added, piece, &mut old_no, &mut new_no),
                (false, false) => {}
            }
        }
    }
    lines
}

/// Unified diff of one file, or an empty string when nothing changed.
pub fn unified_diff(path: &str, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }
    let lines = diff_lines(old, new);
    let changed: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.tag != Tag::Same)
        .map(|(i, _)| i)
        .collect();
    if changed.is_empty() {
        return String::new();
    }

    // Group changes whose context windows touch.
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &idx in &changed {
        let lo = idx.saturating_sub(CONTEXT);
        let hi = (idx + CONTEXT + 1).min(lines.len());
        match hunks.last_mut() {
            Some((_, end)) if lo <= *end => *end = hi,
            _ => hunks.push((lo, hi)),
        }
    }

    let mut diff = String::new();
    diff.push_str(&format!("--- a/{}\n", path));
    diff.push_str(&format!("+++ b/{}\n", path));

    for (lo, hi) in hunks {
        let slice = &lines[lo..hi];
        let old_count = slice.iter().filter(|l| l.tag != Tag::Added).count();
        let new_count = slice.iter().filter(|l| l.tag != Tag::Removed).count();
        let old_start = if old_count == 0 {
            slice[0].old_no
        } else {
            slice[0].old_no + 1
        };
        let new_start = if new_count == 0 {
            slice[0].new_no
        } else {
            slice[0].new_no + 1
        };
        diff.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, old_count, new_start, new_count
        ));
        for line in slice {
            let marker = match line.tag {
                Tag::Same => ' ',
                Tag::Removed => '-',
                Tag::Added => '+',
            };
            diff.push(marker);
            diff.push_str(&line.text);
            diff.push('\n');
            if line.no_newline {
                diff.push_str("\\ No newline at end of file\n");
            }
        }
    }

    diff
}

/// Generate a unified diff covering several files, ordered by path.
pub fn generate_unified_diff(files: &[FileDiff<'_>]) -> String {
    let mut sorted: Vec<&FileDiff<'_>> = files.iter().collect();
    sorted.sort_by_key(|f| f.path);
    sorted
        .into_iter()
        .map(|f| unified_diff(f.path, f.old, f.new))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_diff_single_line_change() {
        let old = "class C\n{\n    void M(ref int a) {}\n}\n";
        let new = "class C\n{\n    void M(int a) {}\n}\n";
        let diff = unified_diff("C.cs", old, new);

        assert!(diff.starts_with("--- a/C.cs\n+++ b/C.cs\n"));
        assert!(diff.contains("@@ -1,4 +1,4 @@\n"));
        assert!(diff.contains("-    void M(ref int a) {}\n"));
        assert!(diff.contains("+    void M(int a) {}\n"));
        assert!(diff.contains(" class C\n"));
    }

    #[test]
    fn distant_changes_produce_separate_hunks() {
        let old: String = (1..=20).map(|i| format!("line{}\n", i)).collect();
        let new = old.replace("line2\n", "LINE2\n").replace("line18\n", "LINE18\n");
        let diff = unified_diff("a.cs", &old, &new);
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(diff.contains("@@ -1,5 +1,5 @@"));
        assert!(diff.contains("@@ -15,6 +15,6 @@"));
    }

    #[test]
    fn one_line_file_counts_one_line() {
        assert_eq!(
            unified_diff("a.cs", "aaa\n", "bbb\n"),
            "--- a/a.cs\n+++ b/a.cs\n@@ -1,1 +1,1 @@\n-aaa\n+bbb\n"
        );
    }

    #[test]
    fn added_final_newline_is_shown() {
        assert_eq!(
            unified_diff("a.cs", "a\nb", "a\nb\n"),
            "--- a/a.cs\n+++ b/a.cs\n@@ -1,2 +1,2 @@\n a\n-b\n\\ No newline at end of file\n+b\n"
        );
    }

    #[test]
    fn removed_trailing_blank_line() {
        assert_eq!(
            unified_diff("a.cs", "a\n\n", "a\n"),
            "--- a/a.cs\n+++ b/a.cs\n@@ -1,2 +1,1 @@\n a\n-\n"
        );
    }

    #[test]
    fn change_on_last_line_without_newline() {
        assert_eq!(
            unified_diff("a.cs", "x\ny", "x\nz"),
            "--- a/a.cs\n+++ b/a.cs\n@@ -1,2 +1,2 @@\n x\n-y\n\\ No newline at end of file\n+z\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn unchanged_file_produces_nothing() {
        assert!(unified_diff("a.cs", "same\n", "same\n").is_empty());
    }

    #[test]
    fn generate_diff_multiple_files_sorted() {
        let files = [
            FileDiff {
                path: "b.cs",
                old: "x\n",
                new: "y\n",
            },
            FileDiff {
                path: "a.cs",
                old: "aaa\n",
                new: "bbb\n",
            },
        ];
        let diff = generate_unified_diff(&files);
        let a = diff.find("--- a/a.cs").unwrap();
        let b = diff.find("--- a/b.cs").unwrap();
        assert!(a < b);
        assert!(diff.contains("@@ -1,1 +1,1 @@\n-aaa\n+bbb\n"));
        assert!(diff.contains("@@ -1,1 +1,1 @@\n-x\n+y\n"));
        assert!(!diff.contains("\n-\n"));
    }

    #[test]
    fn generate_diff_empty_input() {
        assert!(generate_unified_diff(&[]).is_empty());
    }
}
