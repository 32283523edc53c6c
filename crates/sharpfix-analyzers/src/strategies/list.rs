//! Removing items from parameter and argument lists.
//!
//! An item goes together with one adjacent separator: the one after it, or
//! for items after the last survivor, the one before. When the separator
//! left in front of the close paren carries a comment or a line break, that
//! trivia stays and becomes the close paren's leading trivia.

use sharpfix_core::patch::Span;
use sharpfix_cst::{SyntaxTree, Trivia};

use crate::strategies::Rewrite;
use crate::syntax::SeparatedList;

/// Deletions that remove the items at `remove` from `list`.
///
/// `None` when an index is out of range or the list has a trailing
/// separator.
pub fn remove_items(tree: &SyntaxTree, list: &SeparatedList, remove: &[usize]) -> Option<Vec<Rewrite>> {
    let count = list.items.len();
    if count == 0 || list.separators.len() + 1 != count || remove.iter().any(|&i| i >= count) {
        return None;
    }
    let removed = |i: usize| remove.contains(&i);
    let item_start = |i: usize| tree.token(tree.first_token(list.items[i])).full_start();
    let close = tree.token(list.close);

    let Some(last_kept) = (0..count).rev().find(|&i| !removed(i)) else {
        return Some(vec![Rewrite::delete(Span::new(item_start(0), close.full_start()))]);
    };

    let mut spans: Vec<Span> = (0..last_kept)
        .filter(|&i| removed(i))
        .map(|i| Span::new(item_start(i), tree.token(list.separators[i]).full_end()))
        .collect();
    if last_kept + 1 < count {
        let separator = tree.token(list.separators[last_kept]);
        if separator.trailing.iter().all(Trivia::is_whitespace) {
            spans.push(Span::new(separator.full_start(), close.full_start()));
        } else {
            spans.push(separator.span());
            spans.push(Span::new(separator.full_end(), close.offset));
        }
    }
    Some(merge_adjacent(spans).into_iter().map(Rewrite::delete).collect())
}

fn merge_adjacent(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.end == span.start => last.end = span.end,
            _ => merged.push(span),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::tests::{apply, nth};
    use sharpfix_cst::{parse_source, SyntaxKind};

    fn remove_arguments(call: &str, remove: &[usize]) -> String {
        let source = format!("class C {{ void M() {{ {} }} }}", call);
        let tree = parse_source(&source).unwrap();
        let list = SeparatedList::new(&tree, nth(&tree, SyntaxKind::ArgumentList, 0));
        let rewrites = remove_items(&tree, &list, remove).unwrap();
        let result = apply(&source, &rewrites);
        result["class C { void M() { ".len()..result.len() - " } }".len()].to_string()
    }

    #[test]
    fn removes_first_middle_and_last() {
        assert_eq!(remove_arguments("F(1, 2, 3);", &[0]), "F(2, 3);");
        assert_eq!(remove_arguments("F(1, 2, 3);", &[1]), "F(1, 3);");
        assert_eq!(remove_arguments("F(1, 2, 3);", &[2]), "F(1, 2);");
    }

    #[test]
    fn removes_several_items() {
        assert_eq!(remove_arguments("F(1, 2, 3);", &[0, 2]), "F(2);");
        assert_eq!(remove_arguments("F(1, 2, 3, 4);", &[1, 2]), "F(1, 4);");
        assert_eq!(remove_arguments("F(1, 2, 3);", &[1, 2]), "F(1);");
    }

    #[test]
    fn removing_every_item_keeps_the_parens() {
        assert_eq!(remove_arguments("F(1);", &[0]), "F();");
        assert_eq!(remove_arguments("F(1, 2);", &[0, 1]), "F();");
    }

    #[test]
    fn close_paren_takes_the_trivia_of_the_last_separator() {
        assert_eq!(
            remove_arguments("F(1, // one\n 2);", &[1]),
            "F(1 // one\n);"
        );
        assert_eq!(remove_arguments("F(1,\n 2);", &[1]), "F(1\n);");
    }

    #[test]
    fn leading_items_take_their_line_with_them() {
        assert_eq!(
            remove_arguments("F(\n 1,\n 2);", &[0]),
            "F(\n 2);"
        );
    }

    #[test]
    fn rejects_out_of_range_indexes() {
        let source = "class C { void M() { F(1); } }";
        let tree = parse_source(source).unwrap();
        let list = SeparatedList::new(&tree, nth(&tree, SyntaxKind::ArgumentList, 0));
        assert!(remove_items(&tree, &list, &[1]).is_none());
    }

    #[test]
    fn adjacent_deletions_merge() {
        let merged = merge_adjacent(vec![Span::new(4, 6), Span::new(0, 4), Span::new(8, 9)]);
        assert_eq!(merged, vec![Span::new(0, 6), Span::new(8, 9)]);
    }
}
