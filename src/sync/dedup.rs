use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::common::Identified;

/// Collapses items sharing a key. Each key keeps the position of its first
/// occurrence and the value of its last one, so repeated merges of the same
/// data are idempotent.
pub fn dedup_by_key<T, I>(items: I) -> Vec<T>
where
    T: Identified,
    I: IntoIterator<Item = T>,
{
    let mut positions: HashMap<T::Key, usize> = HashMap::new();
    let mut unique = Vec::new();
    for item in items {
        match positions.entry(item.key()) {
            Entry::Occupied(slot) => unique[*slot.get()] = item,
            Entry::Vacant(slot) => {
                slot.insert(unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::message;

    fn ids(messages: &[crate::common::Message]) -> Vec<i64> {
        messages.iter().map(|message| message.id).collect()
    }

    #[test]
    fn keeps_first_position_and_last_value() {
        let mut edited = message(2, 1);
        edited.content = Some("edited".into());

        let merged = dedup_by_key(vec![message(1, 1), message(2, 1), message(3, 1), edited]);

        assert_eq!(ids(&merged), vec![1, 2, 3]);
        assert_eq!(merged[1].content.as_deref(), Some("edited"));
    }

    #[test]
    fn is_idempotent() {
        let once = dedup_by_key(vec![message(3, 1), message(1, 1), message(3, 1)]);
        let twice = dedup_by_key(once.clone());
        assert_eq!(once, twice);
        assert_eq!(ids(&twice), vec![3, 1]);
    }
}
