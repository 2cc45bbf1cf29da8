//! Page-set expressions: explicit page lists, inclusive ranges, and the
//! `$total` marker.

use std::collections::BTreeSet;

use super::ExprError;

/// Parses a page-set expression against a document of `total_pages` pages.
///
/// Tokens are separated by commas and/or whitespace. Each token is a positive
/// 1-based page number, an inclusive range `a..b`, or `$total` (the last
/// page). The result is the union of all referenced pages as 0-based
/// indices, deduplicated and sorted ascending. References past the last page
/// are dropped rather than raised, matching the engine's lenient selection
/// behavior; malformed tokens are errors.
pub fn parse_page_set(input: &str, total_pages: usize) -> Result<Vec<usize>, ExprError> {
    let tokens: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(ExprError::EmptyPageSet);
    }

    let mut pages = BTreeSet::new();
    for token in tokens {
        if let Some((start, end)) = token.split_once("..") {
            let start = parse_page_number(start, token)?;
            let end = parse_page_number(end, token)?;
            if start > end {
                return Err(ExprError::InvalidRange(token.to_string()));
            }
            for page in start..=end {
                if page <= total_pages {
                    pages.insert(page - 1);
                }
            }
        } else if token == "$total" {
            if total_pages > 0 {
                pages.insert(total_pages - 1);
            }
        } else {
            let page = parse_page_number(token, token)?;
            if page <= total_pages {
                pages.insert(page - 1);
            }
        }
    }

    Ok(pages.into_iter().collect())
}

fn parse_page_number(text: &str, token: &str) -> Result<usize, ExprError> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ExprError::InvalidPageToken(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_pages() {
        assert_eq!(parse_page_set("1,3,5", 10).unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            parse_page_set("1..3,5..7", 10).unwrap(),
            vec![0, 1, 2, 4, 5, 6]
        );
    }

    #[test]
    fn test_total_marker() {
        assert_eq!(parse_page_set("1,$total", 10).unwrap(), vec![0, 9]);
    }

    #[test]
    fn test_whitespace_separators() {
        assert_eq!(parse_page_set("1 3  5", 10).unwrap(), vec![0, 2, 4]);
        assert_eq!(parse_page_set("1, 3 ,5", 10).unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn test_deduplication_and_order() {
        assert_eq!(parse_page_set("5,1,5,2..3,2", 10).unwrap(), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_out_of_range_pages_dropped() {
        assert_eq!(parse_page_set("1,20", 10).unwrap(), vec![0]);
        assert_eq!(parse_page_set("8..15", 10).unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn test_empty_set_is_error() {
        assert_eq!(parse_page_set("", 10), Err(ExprError::EmptyPageSet));
        assert_eq!(parse_page_set("  , ", 10), Err(ExprError::EmptyPageSet));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            parse_page_set("abc", 10),
            Err(ExprError::InvalidPageToken(_))
        ));
        assert!(matches!(
            parse_page_set("0", 10),
            Err(ExprError::InvalidPageToken(_))
        ));
        assert!(matches!(
            parse_page_set("-2", 10),
            Err(ExprError::InvalidPageToken(_))
        ));
        assert!(matches!(
            parse_page_set("1..x", 10),
            Err(ExprError::InvalidPageToken(_))
        ));
        assert!(matches!(
            parse_page_set("5..2", 10),
            Err(ExprError::InvalidRange(_))
        ));
    }
}
