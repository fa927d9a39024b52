use foundation::ids::EventId;
use tracing::debug;

/// Single source of truth for the selected event.
///
/// Also owns the one-shot suppression slot: the id of an event a manual
/// "fly to" action is already moving the camera toward. The automatic
/// selection fly-to consumes the slot instead of flying a second time.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    selected: Option<EventId>,
    suppression: Option<EventId>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&EventId> {
        self.selected.as_ref()
    }

    /// Returns `true` if the selection changed.
    pub fn select(&mut self, id: Option<EventId>) -> bool {
        if self.selected == id {
            return false;
        }
        debug!(from = ?self.selected, to = ?id, "selection changed");
        self.selected = id;
        true
    }

    /// Clears both the selection and any armed suppression.
    pub fn clear(&mut self) -> bool {
        self.suppression = None;
        self.select(None)
    }

    pub fn arm_suppression(&mut self, id: EventId) {
        self.suppression = Some(id);
    }

    pub fn suppression(&self) -> Option<&EventId> {
        self.suppression.as_ref()
    }

    /// Consumes the slot if it names `id`. A slot naming some other id is
    /// left in place.
    pub fn take_suppression_for(&mut self, id: &EventId) -> bool {
        if self.suppression.as_ref() == Some(id) {
            self.suppression = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionCoordinator;
    use foundation::ids::EventId;

    #[test]
    fn select_reports_changes_only() {
        let mut sel = SelectionCoordinator::new();
        assert!(sel.select(Some(EventId::from("a"))));
        assert!(!sel.select(Some(EventId::from("a"))));
        assert_eq!(sel.selected().map(EventId::as_str), Some("a"));
        assert!(sel.select(None));
    }

    #[test]
    fn suppression_is_one_shot_and_id_specific() {
        let mut sel = SelectionCoordinator::new();
        sel.arm_suppression(EventId::from("e1"));
        assert!(!sel.take_suppression_for(&EventId::from("e2")));
        assert!(sel.take_suppression_for(&EventId::from("e1")));
        assert!(!sel.take_suppression_for(&EventId::from("e1")));
    }

    #[test]
    fn clear_drops_armed_slot() {
        let mut sel = SelectionCoordinator::new();
        sel.select(Some(EventId::from("e1")));
        sel.arm_suppression(EventId::from("e1"));
        assert!(sel.clear());
        assert!(sel.suppression().is_none());
        assert!(sel.selected().is_none());
    }
}
