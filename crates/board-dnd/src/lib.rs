//! Board DragDrop State Machine
//!
//! Drag-and-drop session tracking for board columns and cards.
//! The renderer turns pointer events into start / over / end callbacks;
//! this crate turns those callbacks into an explicit state machine.

use tracing::{debug, trace};

/// Prefix that marks a drag id as a column (sortable column handles)
pub const COLUMN_PREFIX: &str = "column-";

/// What kind of entity is being dragged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragKind {
    Column,
    Todo,
}

/// A drag id classified by shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragId<'a> {
    /// Column-tagged id, holding the bare column id
    Column(&'a str),
    /// Anything else (todo ids and bare column ids used as drop zones)
    Todo(&'a str),
}

impl<'a> DragId<'a> {
    /// Classify an id by its prefix
    pub fn classify(raw: &'a str) -> Self {
        match raw.strip_prefix(COLUMN_PREFIX) {
            Some(column_id) => DragId::Column(column_id),
            None => DragId::Todo(raw),
        }
    }

    pub fn kind(&self) -> DragKind {
        match self {
            DragId::Column(_) => DragKind::Column,
            DragId::Todo(_) => DragKind::Todo,
        }
    }
}

/// Build the drag id for a column
pub fn column_drag_id(column_id: &str) -> String {
    format!("{}{}", COLUMN_PREFIX, column_id)
}

/// Strip the column tag if present
pub fn strip_column_prefix(raw: &str) -> &str {
    raw.strip_prefix(COLUMN_PREFIX).unwrap_or(raw)
}

/// Resolves hover targets to their containers
pub trait ContainerLookup {
    /// Owning column of a todo, if the todo is known
    fn column_of_todo(&self, todo_id: &str) -> Option<String>;

    /// Whether a bare column id exists
    fn has_column(&self, column_id: &str) -> bool;
}

/// Lookup used when no board is loaded: nothing resolves
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContainers;

impl ContainerLookup for NoContainers {
    fn column_of_todo(&self, _todo_id: &str) -> Option<String> {
        None
    }

    fn has_column(&self, _column_id: &str) -> bool {
        false
    }
}

/// Drag gesture state. One gesture at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    /// A column is being dragged; only column-level hover is tracked
    DraggingColumn {
        active_id: String,
        hover_column_id: Option<String>,
    },
    /// A card is being dragged
    DraggingTodo {
        active_id: String,
        hover_column_id: Option<String>,
        /// Used for insertion-line rendering only
        hover_todo_id: Option<String>,
    },
}

impl DragState {
    /// Begin a gesture. Any previous gesture is replaced and hover state reset.
    pub fn start(self, id: &str) -> DragState {
        if !self.is_idle() {
            debug!("[DND] start while dragging {:?}, replacing", self.active_id());
        }
        match DragId::classify(id) {
            DragId::Column(_) => DragState::DraggingColumn {
                active_id: id.to_string(),
                hover_column_id: None,
            },
            DragId::Todo(_) => DragState::DraggingTodo {
                active_id: id.to_string(),
                hover_column_id: None,
                hover_todo_id: None,
            },
        }
    }

    /// Pointer moved over `over` (None = left every drop target)
    pub fn over<C>(self, over: Option<&str>, containers: &C) -> DragState
    where
        C: ContainerLookup + ?Sized,
    {
        match self {
            DragState::Idle => DragState::Idle,
            DragState::DraggingColumn { active_id, hover_column_id } => {
                let hover_column_id = match over.map(DragId::classify) {
                    None => None,
                    Some(DragId::Column(column_id)) => Some(column_id.to_string()),
                    // Cards never become targets while a column is dragged
                    Some(DragId::Todo(_)) => hover_column_id,
                };
                DragState::DraggingColumn { active_id, hover_column_id }
            }
            DragState::DraggingTodo { active_id, hover_column_id, .. } => {
                let (hover_column_id, hover_todo_id) = match over.map(DragId::classify) {
                    None => (None, None),
                    Some(DragId::Column(column_id)) => (Some(column_id.to_string()), None),
                    Some(DragId::Todo(id)) => match containers.column_of_todo(id) {
                        Some(column_id) => (Some(column_id), Some(id.to_string())),
                        None if containers.has_column(id) => (Some(id.to_string()), None),
                        None => (hover_column_id, None),
                    },
                };
                DragState::DraggingTodo { active_id, hover_column_id, hover_todo_id }
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn active_id(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::DraggingColumn { active_id, .. } | DragState::DraggingTodo { active_id, .. } => {
                Some(active_id)
            }
        }
    }

    pub fn active_kind(&self) -> Option<DragKind> {
        match self {
            DragState::Idle => None,
            DragState::DraggingColumn { .. } => Some(DragKind::Column),
            DragState::DraggingTodo { .. } => Some(DragKind::Todo),
        }
    }

    pub fn hover_column_id(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::DraggingColumn { hover_column_id, .. }
            | DragState::DraggingTodo { hover_column_id, .. } => hover_column_id.as_deref(),
        }
    }

    pub fn hover_todo_id(&self) -> Option<&str> {
        match self {
            DragState::DraggingTodo { hover_todo_id, .. } => hover_todo_id.as_deref(),
            _ => None,
        }
    }
}

/// Receives the final gesture when a drag ends over a target
pub trait DropHandler {
    type Output;

    fn on_drop(&mut self, kind: DragKind, active_id: &str, over_id: &str) -> Option<Self::Output>;
}

/// Owns the state of one drag session
#[derive(Clone, Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn start(&mut self, id: &str) {
        self.state = std::mem::take(&mut self.state).start(id);
        trace!("[DND] start: {}", id);
    }

    pub fn over<C>(&mut self, over: Option<&str>, containers: &C)
    where
        C: ContainerLookup + ?Sized,
    {
        self.state = std::mem::take(&mut self.state).over(over, containers);
    }

    /// Abort the gesture without dropping
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// End the gesture. State is cleared unconditionally, then the handler
    /// sees the drop if there was an active item and a target.
    pub fn end<H>(&mut self, over: Option<&str>, handler: &mut H) -> Option<H::Output>
    where
        H: DropHandler + ?Sized,
    {
        let finished = std::mem::take(&mut self.state);
        let (kind, active_id) = match (finished.active_kind(), finished.active_id()) {
            (Some(kind), Some(active_id)) => (kind, active_id),
            _ => return None,
        };
        let Some(over_id) = over else {
            debug!("[DND] drop of {} outside any target", active_id);
            return None;
        };
        debug!("[DND] drop: active={}, over={}", active_id, over_id);
        handler.on_drop(kind, active_id, over_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Columns {
        todos: HashMap<&'static str, &'static str>,
        columns: Vec<&'static str>,
    }

    impl ContainerLookup for Columns {
        fn column_of_todo(&self, todo_id: &str) -> Option<String> {
            self.todos.get(todo_id).map(|c| c.to_string())
        }

        fn has_column(&self, column_id: &str) -> bool {
            self.columns.contains(&column_id)
        }
    }

    fn lookup() -> Columns {
        Columns {
            todos: HashMap::from([("t1", "col1"), ("t2", "col1"), ("t3", "col2")]),
            columns: vec!["col1", "col2"],
        }
    }

    struct Recorder(Vec<(DragKind, String, String)>);

    impl DropHandler for Recorder {
        type Output = usize;

        fn on_drop(&mut self, kind: DragKind, active_id: &str, over_id: &str) -> Option<usize> {
            self.0.push((kind, active_id.to_string(), over_id.to_string()));
            Some(self.0.len())
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(DragId::classify("column-col1"), DragId::Column("col1"));
        assert_eq!(DragId::classify("t1"), DragId::Todo("t1"));
        assert_eq!(column_drag_id("col1"), "column-col1");
        assert_eq!(strip_column_prefix("column-col1"), "col1");
        assert_eq!(strip_column_prefix("col1"), "col1");
    }

    #[test]
    fn test_start_classifies_and_resets_hover() {
        let state = DragState::Idle.start("t1").over(Some("t3"), &lookup());
        assert_eq!(state.hover_todo_id(), Some("t3"));

        let state = state.start("column-col1");
        assert_eq!(state.active_kind(), Some(DragKind::Column));
        assert_eq!(state.active_id(), Some("column-col1"));
        assert_eq!(state.hover_column_id(), None);
        assert_eq!(state.hover_todo_id(), None);
    }

    #[test]
    fn test_column_drag_never_tracks_cards() {
        let state = DragState::Idle
            .start("column-col1")
            .over(Some("column-col2"), &lookup());
        assert_eq!(state.hover_column_id(), Some("col2"));

        // Hovering a card keeps the column hover and never highlights the card
        let state = state.over(Some("t1"), &lookup());
        assert_eq!(state.hover_column_id(), Some("col2"));
        assert_eq!(state.hover_todo_id(), None);
    }

    #[test]
    fn test_todo_drag_hover_resolution() {
        let state = DragState::Idle.start("t1");

        let state = state.over(Some("t3"), &lookup());
        assert_eq!(state.hover_column_id(), Some("col2"));
        assert_eq!(state.hover_todo_id(), Some("t3"));

        // Empty column body uses the bare column id
        let state = state.over(Some("col1"), &lookup());
        assert_eq!(state.hover_column_id(), Some("col1"));
        assert_eq!(state.hover_todo_id(), None);

        let state = state.over(Some("column-col2"), &lookup());
        assert_eq!(state.hover_column_id(), Some("col2"));

        // Unknown id keeps the column but drops the card
        let state = state.over(Some("ghost"), &lookup());
        assert_eq!(state.hover_column_id(), Some("col2"));
        assert_eq!(state.hover_todo_id(), None);

        let state = state.over(None, &lookup());
        assert_eq!(state.hover_column_id(), None);
    }

    #[test]
    fn test_over_while_idle_is_ignored() {
        let state = DragState::Idle.over(Some("t1"), &lookup());
        assert!(state.is_idle());
    }

    #[test]
    fn test_end_clears_state_and_calls_handler() {
        let mut session = DragSession::new();
        let mut recorder = Recorder(Vec::new());

        session.start("t1");
        session.over(Some("t3"), &lookup());
        let out = session.end(Some("t3"), &mut recorder);

        assert_eq!(out, Some(1));
        assert!(session.state().is_idle());
        assert_eq!(recorder.0, vec![(DragKind::Todo, "t1".to_string(), "t3".to_string())]);
    }

    #[test]
    fn test_end_without_target_still_clears() {
        let mut session = DragSession::new();
        let mut recorder = Recorder(Vec::new());

        session.start("column-col1");
        assert_eq!(session.end(None, &mut recorder), None);
        assert!(session.state().is_idle());
        assert!(recorder.0.is_empty());

        // End with nothing active is a no-op
        assert_eq!(session.end(Some("col1"), &mut recorder), None);
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut session = DragSession::new();
        session.start("t1");
        session.cancel();
        assert!(session.state().is_idle());
    }
}
