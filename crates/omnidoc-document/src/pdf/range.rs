// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range expression parser.
//
// Grammar: `range_set := token (',' token)*` where `token := INT | INT '-' INT`,
// whitespace around tokens ignored. Groups come out in the order the user
// wrote them, overlaps and duplicates preserved; the implicit leftover group
// collects every uncovered page in ascending order.

use omnidoc_core::error::{OmnidocError, Result};
use omnidoc_core::{PageRange, RangeSet};
use tracing::debug;

/// Parse a range-set expression against a document of `page_count` pages.
///
/// # Errors
///
/// `RangeSyntax` for a non-numeric token or `A-B` with `A > B`;
/// `RangeBounds` when any page falls outside `[1, page_count]`.
pub fn parse_range_set(expression: &str, page_count: u32) -> Result<RangeSet> {
    let mut groups = Vec::new();

    for token in expression.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(OmnidocError::RangeSyntax(
                "empty token in range expression".to_string(),
            ));
        }
        groups.push(parse_token(token)?);
    }

    // Bounds check after the whole expression parses, so syntax errors win.
    for group in &groups {
        for page in [group.start, group.end] {
            if page == 0 || page > page_count {
                return Err(OmnidocError::RangeBounds { page, page_count });
            }
        }
    }

    let mut covered = vec![false; page_count as usize + 1];
    for group in &groups {
        for page in group.pages() {
            covered[page as usize] = true;
        }
    }
    let leftover: Vec<u32> = (1..=page_count).filter(|&p| !covered[p as usize]).collect();

    debug!(
        groups = groups.len(),
        leftover = leftover.len(),
        "Range expression parsed"
    );

    Ok(RangeSet {
        groups,
        leftover,
        page_count,
    })
}

fn parse_token(token: &str) -> Result<PageRange> {
    if let Some((start_str, end_str)) = token.split_once('-') {
        let start = parse_page_number(start_str.trim())?;
        let end = parse_page_number(end_str.trim())?;
        if start > end {
            return Err(OmnidocError::RangeSyntax(format!(
                "descending range '{token}'"
            )));
        }
        Ok(PageRange { start, end })
    } else {
        let page = parse_page_number(token)?;
        Ok(PageRange {
            start: page,
            end: page,
        })
    }
}

fn parse_page_number(text: &str) -> Result<u32> {
    text.parse()
        .map_err(|_| OmnidocError::RangeSyntax(format!("invalid page number '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pages_and_ranges() {
        let set = parse_range_set("1-3,5", 6).unwrap();
        assert_eq!(
            set.groups,
            vec![
                PageRange { start: 1, end: 3 },
                PageRange { start: 5, end: 5 },
            ]
        );
        assert_eq!(set.leftover, vec![4, 6]);
    }

    #[test]
    fn full_coverage_has_empty_leftover() {
        let set = parse_range_set("1-4", 4).unwrap();
        assert!(set.leftover.is_empty());
    }

    #[test]
    fn explicit_and_leftover_cover_whole_document() {
        let page_count = 9;
        let set = parse_range_set("2-4,7", page_count).unwrap();
        let mut all: Vec<u32> = set.explicit_pages().collect();
        all.extend(&set.leftover);
        all.sort_unstable();
        assert_eq!(all, (1..=page_count).collect::<Vec<_>>());
    }

    #[test]
    fn overlap_is_preserved_not_deduplicated() {
        let set = parse_range_set("1-3,2-4", 5).unwrap();
        assert_eq!(set.groups.len(), 2);
        let flattened: Vec<u32> = set.explicit_pages().collect();
        assert_eq!(flattened, vec![1, 2, 3, 2, 3, 4]);
        assert_eq!(set.leftover, vec![5]);
    }

    #[test]
    fn whitespace_around_tokens_ignored() {
        let set = parse_range_set(" 1 , 3 - 5 ", 5).unwrap();
        assert_eq!(
            set.groups,
            vec![
                PageRange { start: 1, end: 1 },
                PageRange { start: 3, end: 5 },
            ]
        );
        assert_eq!(set.leftover, vec![2, 4]);
    }

    #[test]
    fn descending_range_is_syntax_error() {
        let err = parse_range_set("5-3", 10).unwrap_err();
        assert!(matches!(err, OmnidocError::RangeSyntax(_)));
    }

    #[test]
    fn non_numeric_token_is_syntax_error() {
        for expr in ["abc", "1,x", "1-", "-3", ""] {
            let err = parse_range_set(expr, 10).unwrap_err();
            assert!(
                matches!(err, OmnidocError::RangeSyntax(_)),
                "expected syntax error for {expr:?}"
            );
        }
    }

    #[test]
    fn out_of_bounds_pages_are_rejected() {
        let err = parse_range_set("7", 6).unwrap_err();
        assert!(matches!(
            err,
            OmnidocError::RangeBounds {
                page: 7,
                page_count: 6
            }
        ));

        let err = parse_range_set("0", 6).unwrap_err();
        assert!(matches!(err, OmnidocError::RangeBounds { page: 0, .. }));
    }

    #[test]
    fn syntax_errors_win_over_bounds_errors() {
        // The malformed second token is reported even though the first token
        // is also out of bounds.
        let err = parse_range_set("99,oops", 6).unwrap_err();
        assert!(matches!(err, OmnidocError::RangeSyntax(_)));
    }
}
