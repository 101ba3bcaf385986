//! Keyword filter applied to every item before it becomes an article.
//!
//! An item is skipped when any keyword either equals one of its categories
//! exactly, or occurs anywhere in its lower-cased title.  Keywords are used
//! as given; write them in lower case if they should match titles.
//!
//! An empty keyword is a substring of every title, so `[""]` drops
//! everything.  It is kept as configured, and the binary warns about it at
//! startup.

use std::collections::HashSet;

use crate::source::Item;

#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    /// The first keyword that rejects `item`, if any.
    pub fn matching_keyword(&self, item: &Item) -> Option<&str> {
        if self.keywords.is_empty() {
            return None;
        }

        let categories: HashSet<&str> = item.categories.iter().map(String::as_str).collect();
        let title = item.title.to_lowercase();

        self.keywords
            .iter()
            .find(|kw| categories.contains(kw.as_str()) || title.contains(kw.as_str()))
            .map(String::as_str)
    }

    pub fn should_skip(&self, item: &Item) -> bool {
        self.matching_keyword(item).is_some()
    }
}
