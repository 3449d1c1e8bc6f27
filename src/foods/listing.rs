//! Search and pagination over a user's in-memory list of entries.

use serde::{Deserialize, Serialize};

use super::model::FoodEntry;

pub const PAGE_SIZE: usize = 5;

pub const EMPTY_MESSAGE: &str = "ไม่พบข้อมูลอาหารที่ตรงกับการค้นหา";

/// Entries whose name contains `search`, ignoring case. Order is kept and an
/// empty search keeps everything.
pub fn filter_by_name<'a>(entries: &'a [FoodEntry], search: &str) -> Vec<&'a FoodEntry> {
    let needle = search.to_lowercase();
    entries
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nav {
    Previous,
    Next,
}

/// Search box plus current page of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    search: String,
    page: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
        }
    }
}

impl ListState {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// A new search always starts over from the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn submit_search(&mut self) {
        self.page = 1;
    }

    /// Jumps to `page`, clamped into the pages that exist.
    pub fn go_to(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// Does nothing on the first page.
    pub fn previous(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    /// Does nothing on the last page.
    pub fn next(&mut self, total_pages: usize) {
        if self.page < total_pages {
            self.page += 1;
        }
    }

    pub fn navigate(&mut self, nav: Nav, total_pages: usize) {
        match nav {
            Nav::Previous => self.previous(),
            Nav::Next => self.next(total_pages),
        }
    }

    pub fn view<'a>(&self, entries: &'a [FoodEntry]) -> ListView<'a> {
        let filtered = filter_by_name(entries, &self.search);
        let total_items = filtered.len();
        let total_pages = total_pages(total_items);
        if total_pages == 0 {
            return ListView {
                items: Vec::new(),
                page: 1,
                total_pages: 0,
                total_items: 0,
                has_previous: false,
                has_next: false,
                empty_message: Some(EMPTY_MESSAGE),
            };
        }

        let page = self.page.clamp(1, total_pages);
        let items = filtered
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect();
        ListView {
            items,
            page,
            total_pages,
            total_items,
            has_previous: page > 1,
            has_next: page < total_pages,
            empty_message: None,
        }
    }
}

/// One rendered page of the dashboard table.
#[derive(Debug, Serialize)]
pub struct ListView<'a> {
    pub items: Vec<&'a FoodEntry>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
    /// Set only when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
}

#[cfg(test)]
impl ListView<'_> {
    pub fn is_empty(&self) -> bool {
        self.empty_message.is_some()
    }
}
