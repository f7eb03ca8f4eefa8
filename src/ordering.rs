//! Ordering Utilities
//!
//! Helpers for the position invariant: siblings in a container carry
//! positions `0..n-1`, and sorting by position gives display order.

use std::collections::HashMap;

use crate::error::OrderingViolation;
use crate::models::{Column, Todo};

/// Anything ranked by a sibling position
pub trait Positioned {
    fn id(&self) -> &str;
    fn position(&self) -> i32;
    fn set_position(&mut self, position: i32);
}

impl Positioned for Todo {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }
}

impl Positioned for Column {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }
}

/// Borrow items in display order (stable for equal positions)
pub fn sorted_by_position<T: Positioned>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| item.position());
    sorted
}

/// Sort in place by position (stable)
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| item.position());
}

/// Rewrite every position to match the current vector order
pub fn renumber<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index as i32);
    }
}

/// Move the element at `from` so it ends up at index `to`
pub fn splice_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let moved = items.remove(from);
    items.insert(to.min(items.len()), moved);
}

/// Rebuild `items` in the order given by `ids`.
///
/// Ids the container does not hold are dropped. Items the payload does not
/// name keep their relative order after the named ones. Positions are
/// renumbered from zero.
pub fn reorder_by_ids<T: Positioned>(items: Vec<T>, ids: &[String]) -> Vec<T> {
    let mut items = items;
    sort_by_position(&mut items);

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let index: HashMap<String, usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().map(|item| (item.id().to_string(), i)))
        .collect();

    let mut ordered = Vec::with_capacity(slots.len());
    for id in ids {
        if let Some(&i) = index.get(id) {
            if let Some(item) = slots[i].take() {
                ordered.push(item);
            }
        }
    }
    ordered.extend(slots.into_iter().flatten());

    renumber(&mut ordered);
    ordered
}

/// Check that positions in a container are exactly `0..n-1`
pub fn check_contiguous<T: Positioned>(container: &str, items: &[T]) -> Result<(), OrderingViolation> {
    let mut positions: Vec<i32> = items.iter().map(|item| item.position()).collect();
    positions.sort_unstable();

    for (index, &position) in positions.iter().enumerate() {
        if index > 0 && positions[index - 1] == position {
            return Err(OrderingViolation::Duplicate {
                container: container.to_string(),
                position,
            });
        }
        if position != index as i32 {
            return Err(OrderingViolation::Gap {
                container: container.to_string(),
                expected: index as i32,
                found: position,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todos(layout: &[(&str, i32)]) -> Vec<Todo> {
        layout.iter().map(|(id, pos)| Todo::new(*id, *id, "col1", *pos)).collect()
    }

    fn ids(items: &[Todo]) -> Vec<&str> {
        items.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_position() {
        let items = todos(&[("c", 2), ("a", 0), ("b", 1)]);
        let sorted: Vec<&str> = sorted_by_position(&items).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_renumber() {
        let mut items = todos(&[("a", 3), ("b", 7), ("c", 7)]);
        renumber(&mut items);
        assert_eq!(items.iter().map(|t| t.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_splice_move() {
        let mut items = vec!["a", "b", "c", "d"];
        splice_move(&mut items, 0, 2);
        assert_eq!(items, vec!["b", "c", "a", "d"]);
        splice_move(&mut items, 3, 0);
        assert_eq!(items, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_reorder_filters_unknown_ids() {
        let items = todos(&[("A", 0), ("B", 1)]);
        let order = vec!["B".to_string(), "non-existent".to_string(), "A".to_string()];
        let reordered = reorder_by_ids(items, &order);
        assert_eq!(ids(&reordered), vec!["B", "A"]);
        assert_eq!(reordered[0].position, 0);
        assert_eq!(reordered[1].position, 1);
    }

    #[test]
    fn test_reorder_keeps_unnamed_items() {
        let items = todos(&[("A", 0), ("B", 1), ("C", 2)]);
        let order = vec!["C".to_string(), "C".to_string()];
        let reordered = reorder_by_ids(items, &order);
        assert_eq!(ids(&reordered), vec!["C", "A", "B"]);
        assert!(check_contiguous("col1", &reordered).is_ok());
    }

    #[test]
    fn test_check_contiguous() {
        assert!(check_contiguous("col1", &todos(&[])).is_ok());
        assert!(check_contiguous("col1", &todos(&[("a", 1), ("b", 0)])).is_ok());

        assert_eq!(
            check_contiguous("col1", &todos(&[("a", 0), ("b", 2)])),
            Err(OrderingViolation::Gap { container: "col1".to_string(), expected: 1, found: 2 })
        );
        assert_eq!(
            check_contiguous("col1", &todos(&[("a", 0), ("b", 0)])),
            Err(OrderingViolation::Duplicate { container: "col1".to_string(), position: 0 })
        );
    }
}
