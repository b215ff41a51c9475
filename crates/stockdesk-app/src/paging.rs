// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_BUTTONS: u32 = 5;

/// Filter keys accepted by the user search form, in display order.
pub const SEARCH_KEYS: [&str; 4] = ["username", "name", "email", "status"];

/// Active search filters. Absent keys mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams(BTreeMap<String, String>);

impl SearchParams {
    /// Keeps the non-blank recognised filters, trimmed.
    pub fn from_filters<'a, I>(filters: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self(
            filters
                .into_iter()
                .filter(|(key, _)| SEARCH_KEYS.contains(key))
                .map(|(key, value)| (key, value.trim()))
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Visible page-number buttons around the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub pages: RangeInclusive<u32>,
    pub current: u32,
    pub total_pages: u32,
}

impl PageWindow {
    pub fn width(&self) -> u32 {
        self.pages.end() - self.pages.start() + 1
    }

    pub fn buttons(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.pages.clone().map(|page| (page, page == self.current))
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    current_page: u32,
    page_size: u32,
    total_count: u64,
    total_pages: u32,
    search: SearchParams,
    visible: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_count: 0,
            total_pages: 0,
            search: SearchParams::default(),
            visible: true,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn search_params(&self) -> &SearchParams {
        &self.search
    }

    /// False after a legacy (unpaginated) response; controls stay hidden.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn search(&mut self, search: SearchParams) {
        self.search = search;
        self.current_page = 1;
    }

    pub fn clear_search(&mut self) {
        self.search = SearchParams::default();
        self.current_page = 1;
    }

    /// Returns false and leaves state untouched when `page` is out of range.
    pub fn go_to_page(&mut self, page: i64) -> bool {
        if page < 1 || page > i64::from(self.total_pages) {
            return false;
        }
        self.current_page = page as u32;
        true
    }

    pub fn change_page(&mut self, delta: i64) -> bool {
        self.go_to_page(i64::from(self.current_page) + delta)
    }

    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_owned(), self.current_page.to_string()),
            ("page_size".to_owned(), self.page_size.to_string()),
        ];
        query.extend(
            self.search
                .iter()
                .map(|(key, value)| (key.to_owned(), value.to_owned())),
        );
        query
    }

    /// Records totals from a paginated response. The page count is derived
    /// from `count`; a disagreeing server figure is only logged.
    pub fn apply_page(&mut self, count: u64, server_total_pages: Option<u32>) {
        self.total_count = count;
        self.total_pages = pages_for(count, self.page_size);
        if let Some(reported) = server_total_pages
            && reported != self.total_pages
        {
            tracing::debug!(
                reported,
                computed = self.total_pages,
                "server page count disagrees with count/page_size"
            );
        }
        self.visible = true;
        self.clamp();
    }

    /// Legacy response: the whole payload is one page.
    pub fn apply_unpaged(&mut self, len: usize) {
        self.total_count = len as u64;
        self.total_pages = 1;
        self.current_page = 1;
        self.visible = false;
    }

    pub fn window(&self) -> PageWindow {
        let total = self.total_pages.max(1);
        let width = MAX_PAGE_BUTTONS.min(total);
        let current = self.current_page.clamp(1, total);
        let mut start = current.saturating_sub(width / 2).max(1);
        let mut end = start + width - 1;
        if end > total {
            end = total;
            start = end + 1 - width;
        }
        PageWindow {
            pages: start..=end,
            current,
            total_pages: total,
        }
    }

    /// 1-based row numbers shown on the current page; empty when no rows.
    pub fn row_range(&self) -> Option<RangeInclusive<u64>> {
        if self.total_count == 0 {
            return None;
        }
        let first = u64::from(self.current_page - 1) * u64::from(self.page_size) + 1;
        if first > self.total_count {
            return None;
        }
        let last = (first + u64::from(self.page_size) - 1).min(self.total_count);
        Some(first..=last)
    }

    fn clamp(&mut self) {
        let upper = self.total_pages.max(1);
        self.current_page = self.current_page.clamp(1, upper);
    }
}

pub fn pages_for(count: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    u32::try_from(count.div_ceil(size)).unwrap_or(u32::MAX)
}
