//! Paginated token grid projection.
//!
//! The token grid shows the flattened token stream as rows of fixed width,
//! optionally windowed into pages. Projection is a pure view: the token list
//! itself is never reordered or copied, only sliced.

use crate::midi::Token;

/// One displayed token block.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell<'a> {
    /// Index in the flattened token stream.
    pub index: usize,
    /// Position label shown on hover, e.g. "2.15" or "155".
    pub heading: String,
    pub token: &'a Token,
}

/// Result of projecting a token list.
#[derive(Debug, Clone, PartialEq)]
pub struct GridProjection<'a> {
    /// Page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub rows: Vec<Vec<GridCell<'a>>>,
}

/// Returns the number of pages needed for `total` tokens.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Clamps a page index into `[0, total_pages - 1]` (0 when there are no pages).
pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    page.min(total_pages(total, page_size).saturating_sub(1))
}

/// Builds the position label of a token block.
///
/// Paginated labels are `"{page+1}.{offset+1}"` where `offset` counts from the
/// start of the page; unpaginated labels are the plain 1-based index.
pub fn heading(
    page: usize,
    row: usize,
    col: usize,
    chunk_size: usize,
    pagination_enabled: bool,
) -> String {
    let offset = row * chunk_size + col + 1;
    if pagination_enabled {
        format!("{}.{}", page + 1, offset)
    } else {
        offset.to_string()
    }
}

/// Builds the position label of the token at a flat index.
///
/// Gives the same label [`project`] assigns to that token's cell.
pub fn heading_for_index(
    index: usize,
    page_size: usize,
    chunk_size: usize,
    pagination_enabled: bool,
) -> String {
    let page_size = page_size.max(1);
    let chunk_size = chunk_size.max(1);
    let (page, offset) = if pagination_enabled {
        (index / page_size, index % page_size)
    } else {
        (0, index)
    };
    heading(
        page,
        offset / chunk_size,
        offset % chunk_size,
        chunk_size,
        pagination_enabled,
    )
}

/// Projects the flattened token list into display rows.
///
/// With pagination enabled only the window
/// `[page * page_size, page * page_size + page_size)` is used; otherwise the
/// whole list. The window is then split into rows of `chunk_size` tokens, the
/// last row possibly shorter. Out-of-range pages are clamped rather than
/// rejected. Zero sizes are treated as one.
pub fn project(
    tokens: &[Token],
    page: usize,
    pagination_enabled: bool,
    page_size: usize,
    chunk_size: usize,
) -> GridProjection<'_> {
    let page_size = page_size.max(1);
    let chunk_size = chunk_size.max(1);
    let page = clamp_page(page, tokens.len(), page_size);

    let base = if pagination_enabled { page * page_size } else { 0 };
    let window = if pagination_enabled {
        let end = (base + page_size).min(tokens.len());
        &tokens[base.min(end)..end]
    } else {
        tokens
    };

    let rows = window
        .chunks(chunk_size)
        .enumerate()
        .map(|(row, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(col, token)| GridCell {
                    index: base + row * chunk_size + col,
                    heading: heading(page, row, col, chunk_size, pagination_enabled),
                    token,
                })
                .collect()
        })
        .collect();

    GridProjection {
        page,
        total_pages: total_pages(tokens.len(), page_size),
        rows,
    }
}

/// Page navigation state of one token grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub enabled: bool,
    pub page_size: usize,
}

impl Pager {
    /// Creates a pager on the first page with pagination enabled.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            enabled: true,
            page_size: page_size.max(1),
        }
    }

    /// Advances one page. Returns false (and does nothing) on the last page.
    pub fn next(&mut self, total: usize) -> bool {
        let last = total_pages(total, self.page_size).saturating_sub(1);
        if self.page < last {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Goes back one page. Returns false (and does nothing) on the first page.
    pub fn prev(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Toggles pagination without touching the remembered page.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Whether the pagination toggle should be offered at all.
    pub fn can_paginate(&self, total: usize) -> bool {
        total_pages(total, self.page_size) > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::TokenType;

    fn tokens(n: usize) -> Vec<Token> {
        (0..n)
            .map(|i| Token::new(TokenType::Pitch, i.to_string(), i as f64, None))
            .collect()
    }

    fn concat_pages(tokens: &[Token], page_size: usize, chunk_size: usize) -> Vec<usize> {
        let pages = total_pages(tokens.len(), page_size);
        (0..pages)
            .flat_map(|page| {
                project(tokens, page, true, page_size, chunk_size)
                    .rows
                    .into_iter()
                    .flatten()
                    .map(|cell| cell.index)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_pages_cover_all_tokens_exactly_once() {
        for n in [0, 1, 13, 14, 139, 140, 141, 300] {
            for page_size in [1, 7, 140] {
                let data = tokens(n);
                let indices = concat_pages(&data, page_size, 14);
                assert_eq!(indices, (0..n).collect::<Vec<_>>(), "n={} P={}", n, page_size);
            }
        }
    }

    #[test]
    fn test_cells_reference_the_original_tokens() {
        let data = tokens(30);
        let projection = project(&data, 1, true, 20, 7);
        for cell in projection.rows.iter().flatten() {
            assert!(std::ptr::eq(cell.token, &data[cell.index]));
        }
    }

    #[test]
    fn test_rows_are_chunked() {
        let data = tokens(30);
        let projection = project(&data, 0, false, 140, 14);
        let widths: Vec<usize> = projection.rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![14, 14, 2]);
    }

    #[test]
    fn test_headings() {
        let data = tokens(300);
        let projection = project(&data, 1, true, 140, 14);
        assert_eq!(projection.rows[0][0].heading, "2.1");
        assert_eq!(projection.rows[1][2].heading, "2.17");
        assert_eq!(projection.rows[1][2].index, 140 + 16);

        let flat = project(&data, 1, false, 140, 14);
        assert_eq!(flat.rows[1][2].heading, "17");
        assert_eq!(flat.rows[11][0].heading, "155");
    }

    #[test]
    fn test_heading_for_index_matches_projection() {
        let data = tokens(300);
        for enabled in [true, false] {
            for page in 0..3 {
                let projection = project(&data, page, enabled, 140, 14);
                for cell in projection.rows.iter().flatten() {
                    assert_eq!(heading_for_index(cell.index, 140, 14, enabled), cell.heading);
                }
            }
        }
    }

    #[test]
    fn test_page_is_clamped() {
        let data = tokens(300);
        let projection = project(&data, 99, true, 140, 14);
        assert_eq!(projection.page, 2);
        assert_eq!(projection.total_pages, 3);
        assert_eq!(projection.rows.iter().flatten().count(), 20);

        let empty = project(&[], 5, true, 140, 14);
        assert_eq!(empty.page, 0);
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn test_pager_bounds_are_no_ops() {
        let mut pager = Pager::new(140);
        assert!(!pager.prev());
        assert_eq!(pager.page, 0);

        assert!(pager.next(300));
        assert!(pager.next(300));
        assert!(!pager.next(300));
        assert_eq!(pager.page, 2);

        assert!(!Pager::new(140).next(0));
    }

    #[test]
    fn test_pager_toggle_offered_only_with_multiple_pages() {
        let pager = Pager::new(140);
        assert!(!pager.can_paginate(140));
        assert!(pager.can_paginate(141));
    }
}
