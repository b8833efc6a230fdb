/// Layer ordering for selected characters
///
/// Storage order is back-to-front: index 0 is the back-most layer and the
/// last entry is the top layer. The layer manager lists layers top-to-bottom,
/// so every screen interaction goes through `display_order`.

use thiserror::Error;

use super::data::CharacterId;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("reordered layers are not a permutation of the current selection")]
    NotAPermutation,
}

/// Ordered set of selected character ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOrder {
    ids: Vec<CharacterId>,
}

impl SelectionOrder {
    /// Remove `id` if selected, otherwise push it on top
    pub fn toggle(&mut self, id: &CharacterId) {
        if let Some(index) = self.position(id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id.clone());
        }
    }

    /// Replace the order wholesale with a permutation of the current members
    pub fn reorder(&mut self, new_order: Vec<CharacterId>) -> Result<(), SelectionError> {
        if !self.is_permutation(&new_order) {
            return Err(SelectionError::NotAPermutation);
        }
        self.ids = new_order;
        Ok(())
    }

    /// Move `dragged` onto `target`'s slot in the top-to-bottom view.
    ///
    /// Returns `false` (and changes nothing) when either id is not selected
    /// or both are the same.
    pub fn move_in_display_order(&mut self, dragged: &CharacterId, target: &CharacterId) -> bool {
        if dragged == target {
            return false;
        }

        let mut screen = self.display_order();
        let from = screen.iter().position(|id| id == dragged);
        let to = screen.iter().position(|id| id == target);
        let (Some(from), Some(to)) = (from, to) else {
            return false;
        };

        let moved = screen.remove(from);
        screen.insert(to, moved);
        screen.reverse();

        self.reorder(screen).is_ok()
    }

    /// Layers top-to-bottom, the order the layer manager shows them in
    pub fn display_order(&self) -> Vec<CharacterId> {
        self.ids.iter().rev().cloned().collect()
    }

    /// Layers back-to-front
    pub fn ids(&self) -> &[CharacterId] {
        &self.ids
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn position(&self, id: &CharacterId) -> Option<usize> {
        self.ids.iter().position(|current| current == id)
    }

    fn is_permutation(&self, candidate: &[CharacterId]) -> bool {
        if candidate.len() != self.ids.len() {
            return false;
        }
        let mut remaining = self.ids.clone();
        for id in candidate {
            match remaining.iter().position(|current| current == id) {
                Some(index) => {
                    remaining.swap_remove(index);
                }
                None => return false,
            }
        }
        remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<CharacterId> {
        names.iter().map(|name| CharacterId::from(*name)).collect()
    }

    fn order_of(names: &[&str]) -> SelectionOrder {
        let mut order = SelectionOrder::default();
        for id in ids(names) {
            order.toggle(&id);
        }
        order
    }

    #[test]
    fn test_toggle_appends_in_selection_order() {
        let order = order_of(&["a", "b", "c"]);
        assert_eq!(order.ids(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn test_toggle_never_duplicates() {
        let mut order = order_of(&["a", "b"]);
        order.toggle(&"a".into());
        order.toggle(&"a".into());

        assert_eq!(order.ids(), ids(&["b", "a"]).as_slice());
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_double_toggle_restores_prior_order() {
        let mut order = order_of(&["a", "b", "c"]);
        let before = order.clone();

        order.toggle(&"d".into());
        order.toggle(&"d".into());
        assert_eq!(order, before);

        order.toggle(&"b".into());
        assert_eq!(order.ids(), ids(&["a", "c"]).as_slice());
    }

    #[test]
    fn test_reorder_with_current_order_is_idempotent() {
        let mut order = order_of(&["a", "b", "c"]);
        let before = order.clone();

        order.reorder(before.ids().to_vec()).unwrap();
        order.reorder(before.ids().to_vec()).unwrap();

        assert_eq!(order, before);
    }

    #[test]
    fn test_reorder_rejects_foreign_ids() {
        let mut order = order_of(&["a", "b"]);

        assert_eq!(order.reorder(ids(&["a", "z"])), Err(SelectionError::NotAPermutation));
        assert_eq!(order.reorder(ids(&["a"])), Err(SelectionError::NotAPermutation));
        assert_eq!(order.reorder(ids(&["a", "a"])), Err(SelectionError::NotAPermutation));
        assert_eq!(order.ids(), ids(&["a", "b"]).as_slice());
    }

    #[test]
    fn test_display_order_is_top_to_bottom() {
        let order = order_of(&["a", "b", "c"]);
        assert_eq!(order.display_order(), ids(&["c", "b", "a"]));
    }

    #[test]
    fn test_drag_top_layer_onto_bottom_slot() {
        // Screen [C, B, A]; dropping C on A gives screen [B, A, C]
        let mut order = order_of(&["A", "B", "C"]);

        assert!(order.move_in_display_order(&"C".into(), &"A".into()));
        assert_eq!(order.display_order(), ids(&["B", "A", "C"]));
        assert_eq!(order.ids(), ids(&["C", "A", "B"]).as_slice());
    }

    #[test]
    fn test_drag_bottom_layer_to_top() {
        let mut order = order_of(&["A", "B", "C"]);

        assert!(order.move_in_display_order(&"A".into(), &"C".into()));
        assert_eq!(order.ids(), ids(&["B", "C", "A"]).as_slice());
    }

    #[test]
    fn test_drag_noops() {
        let mut order = order_of(&["A", "B"]);
        let before = order.clone();

        assert!(!order.move_in_display_order(&"A".into(), &"A".into()));
        assert!(!order.move_in_display_order(&"A".into(), &"missing".into()));
        assert!(!order.move_in_display_order(&"missing".into(), &"B".into()));
        assert_eq!(order, before);
    }
}
