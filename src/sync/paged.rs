use crate::common::{Identified, Page};

use super::dedup::dedup_by_key;

/// Client-side accumulation of an offset-paginated collection.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: Vec<T>,
    current_page: u32,
    has_more: bool,
    initialized: bool,
    loading: bool,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            has_more: true,
            initialized: false,
            loading: false,
        }
    }
}

impl<T: Identified> PagedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn next_page(&self) -> u32 {
        if self.initialized {
            self.current_page + 1
        } else {
            0
        }
    }

    /// Marks a load of `page` as in flight. Refuses while another load runs,
    /// and refuses follow-up pages once the list is exhausted; page 0 is
    /// always allowed so the list can be refreshed.
    pub fn begin_load(&mut self, page: u32) -> bool {
        if self.loading {
            return false;
        }
        if page > 0 && self.initialized && !self.has_more {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn fail_load(&mut self) {
        self.loading = false;
    }

    /// Page 0 replaces the list, later pages append.
    pub fn apply_page(&mut self, page_index: u32, page: Page<T>) {
        let exhausted = page.is_exhausted();
        self.items = if page_index == 0 {
            dedup_by_key(page.content)
        } else {
            let existing = std::mem::take(&mut self.items);
            dedup_by_key(existing.into_iter().chain(page.content))
        };
        self.current_page = page_index;
        self.has_more = !exhausted;
        self.initialized = true;
        self.loading = false;
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| &item.key() == key)
    }

    /// Swaps in a server-updated item; false if it is not loaded.
    pub fn replace(&mut self, item: T) -> bool {
        let key = item.key();
        match self.items.iter_mut().find(|existing| existing.key() == key) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let index = self.items.iter().position(|item| &item.key() == key)?;
        Some(self.items.remove(index))
    }

    /// New items go to the head regardless of server order.
    pub fn prepend(&mut self, item: T) {
        let key = item.key();
        self.items.retain(|existing| existing.key() != key);
        self.items.insert(0, item);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Post;
    use crate::common::fixtures::post;

    fn ids(list: &PagedList<Post>) -> Vec<i64> {
        list.iter().map(|post| post.id).collect()
    }

    fn page(number: u32, ids: &[i64], last: bool) -> Page<Post> {
        Page::new(number, ids.iter().copied().map(post).collect(), last)
    }

    #[test]
    fn first_page_replaces_and_later_pages_append() {
        let mut list = PagedList::new();
        assert!(list.begin_load(0));
        list.apply_page(0, page(0, &[1, 2], false));
        assert!(list.begin_load(1));
        list.apply_page(1, page(1, &[3, 4], false));
        assert_eq!(ids(&list), vec![1, 2, 3, 4]);
        assert_eq!(list.next_page(), 2);

        assert!(list.begin_load(0));
        list.apply_page(0, page(0, &[9], false));
        assert_eq!(ids(&list), vec![9]);
    }

    #[test]
    fn overlapping_pages_do_not_duplicate() {
        let mut list = PagedList::new();
        list.apply_page(0, page(0, &[1, 2, 3], false));
        list.apply_page(1, page(1, &[3, 4], false));
        assert_eq!(ids(&list), vec![1, 2, 3, 4]);
    }

    #[test]
    fn has_more_follows_last_flag_and_empty_pages() {
        let mut list = PagedList::new();
        assert!(list.has_more());

        list.apply_page(0, page(0, &[1], false));
        assert!(list.has_more());

        list.apply_page(1, page(1, &[], false));
        assert!(!list.has_more(), "empty page ends pagination");
        assert!(!list.begin_load(2));

        list.apply_page(0, page(0, &[1], true));
        assert!(!list.has_more());
    }

    #[test]
    fn overlapping_loads_are_refused() {
        let mut list: PagedList<Post> = PagedList::new();
        assert!(list.begin_load(0));
        assert!(!list.begin_load(1));
        list.fail_load();
        assert!(list.begin_load(0));
    }

    #[test]
    fn targeted_mutations() {
        let mut list = PagedList::new();
        list.apply_page(0, page(0, &[1, 2, 3], false));

        let mut edited = post(2);
        edited.content = "edited".into();
        assert!(list.replace(edited));
        assert!(!list.replace(post(42)));
        assert_eq!(list.get(&2).unwrap().content, "edited");

        assert_eq!(list.remove(&1).map(|post| post.id), Some(1));
        assert!(list.remove(&1).is_none());

        list.prepend(post(7));
        assert_eq!(ids(&list), vec![7, 2, 3]);
    }
}
