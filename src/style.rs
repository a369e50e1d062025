//! Per-sheet style cache
//!
//! Title and header styles are created once when a sheet is initialized.
//! Data column styles are created lazily, one per (column, alignment), by
//! cloning the template for the alignment and attaching the number format of
//! the first value written to that column.

use crate::types::Alignment;
use indexmap::IndexMap;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern};
use std::sync::Arc;

/// Cache key for data column styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleKey {
    pub column: u16,
    pub alignment: Alignment,
}

impl StyleKey {
    /// Create a key
    pub fn new(column: u16, alignment: Alignment) -> Self {
        StyleKey { column, alignment }
    }
}

/// Shared, immutable cell style
#[derive(Debug, Clone)]
pub struct StyleHandle(Arc<Format>);

impl StyleHandle {
    fn new(format: Format) -> Self {
        StyleHandle(Arc::new(format))
    }

    /// Backend format
    pub fn format(&self) -> &Format {
        &self.0
    }

    /// Check if both handles are the same cached instance
    pub fn same_as(&self, other: &StyleHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Style pools of one sheet
#[derive(Debug)]
pub struct StyleCache {
    title: StyleHandle,
    header: StyleHandle,
    templates: [Format; 4],
    columns: IndexMap<StyleKey, StyleHandle>,
}

impl StyleCache {
    /// Build the title/header styles and data templates for a font
    pub fn new(font_name: &str) -> Self {
        let title = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_font_name(font_name)
            .set_font_size(16.0)
            .set_bold();

        let data = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border_color(Color::Gray)
            .set_font_name(font_name)
            .set_font_size(10.0);

        let header = data
            .clone()
            .set_align(FormatAlign::Center)
            .set_background_color(Color::Gray)
            .set_pattern(FormatPattern::Solid)
            .set_font_color(Color::White)
            .set_bold();

        let templates = [
            data.clone(),
            data.clone().set_align(FormatAlign::Left),
            data.clone().set_align(FormatAlign::Center),
            data.set_align(FormatAlign::Right),
        ];

        StyleCache {
            title: StyleHandle::new(title),
            header: StyleHandle::new(header),
            templates,
            columns: IndexMap::new(),
        }
    }

    /// Style of the merged title row
    pub fn title(&self) -> &StyleHandle {
        &self.title
    }

    /// Style of header cells
    pub fn header(&self) -> &StyleHandle {
        &self.header
    }

    /// Return the cached style for a key, creating it on first use
    ///
    /// `num_format` only applies when the entry is created; later calls get
    /// the stored handle unchanged.
    pub fn get_or_create(&mut self, key: StyleKey, num_format: &str) -> StyleHandle {
        let templates = &self.templates;
        self.columns
            .entry(key)
            .or_insert_with(|| {
                let template = &templates[key.alignment.code() as usize];
                StyleHandle::new(template.clone().set_num_format(num_format))
            })
            .clone()
    }

    /// Cached style for a key, if created
    pub fn get(&self, key: &StyleKey) -> Option<&StyleHandle> {
        self.columns.get(key)
    }

    /// Number of data column styles created so far
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if no data column style was created yet
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_returns_identical_handle() {
        let mut cache = StyleCache::new("Arial");
        let key = StyleKey::new(2, Alignment::Right);

        let first = cache.get_or_create(key, "0.00");
        let second = cache.get_or_create(key, "@");

        assert!(first.same_as(&second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_get_distinct_handles() {
        let mut cache = StyleCache::new("Arial");
        let a = cache.get_or_create(StyleKey::new(0, Alignment::Left), "@");
        let b = cache.get_or_create(StyleKey::new(0, Alignment::Center), "@");
        let c = cache.get_or_create(StyleKey::new(1, Alignment::Left), "@");

        assert!(!a.same_as(&b));
        assert!(!a.same_as(&c));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_unknown_alignment_code_uses_unaligned_template() {
        let mut cache = StyleCache::new("Arial");
        let unknown = cache.get_or_create(StyleKey::new(0, Alignment::from_code(9)), "0");
        let unaligned = cache.get_or_create(StyleKey::new(0, Alignment::None), "0");
        assert!(unknown.same_as(&unaligned));
    }

    #[test]
    fn test_title_and_header_pools_are_separate() {
        let mut cache = StyleCache::new("Arial");
        assert!(cache.is_empty());
        assert!(!cache.title().same_as(cache.header()));

        let data = cache.get_or_create(StyleKey::new(0, Alignment::None), "@");
        assert!(!data.same_as(cache.header()));
        assert!(cache.get(&StyleKey::new(0, Alignment::None)).is_some());
    }
}
