use serde::Serialize;

/// Slice of a result set selected by the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Missing or non-numeric page numbers select the first page, out of range
    /// numbers clamp to the first or last page. An empty result set still has
    /// one (empty) page.
    pub fn resolve(requested: Option<&str>, total: i64, page_size: i64) -> Self {
        let page_size = page_size.max(1);
        let num_pages = if total <= 0 {
            1
        } else {
            (total - 1) / page_size + 1
        };
        let number = requested
            .and_then(|page| page.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, num_pages);
        PageWindow {
            number,
            num_pages,
            limit: page_size,
            offset: (number - 1) * page_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: i64,
    pub next_page_number: i64,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, window: PageWindow, count: i64) -> Self {
        Page {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count,
            has_previous: window.number > 1,
            has_next: window.number < window.num_pages,
            previous_page_number: (window.number - 1).max(1),
            next_page_number: (window.number + 1).min(window.num_pages),
        }
    }
}
