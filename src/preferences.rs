use crate::flow::{MappedStateFlow, StateFlow};
use std::sync::Arc;

/// Generated accessor for one preferences declaration.
///
/// `get` hands out the cached snapshot, `mutable` a write-through editor and
/// `update` publishes an editor's values as the new snapshot.
pub trait Preferences: Send + Sync {
    type Snapshot: Clone + Send + Sync + 'static;
    type Editor: PreferencesEditor<Snapshot = Self::Snapshot>;

    /// Storage namespace the preferences live in.
    fn id(&self) -> &str;

    fn get(&self) -> Arc<Self::Snapshot>;

    fn mutable(&self) -> Self::Editor;

    fn update(&self, editor: &Self::Editor);

    fn as_state_flow(&self) -> StateFlow<Arc<Self::Snapshot>>;

    fn map_state_flow<R, F>(&self, transform: F) -> MappedStateFlow<Arc<Self::Snapshot>, R>
    where
        F: Fn(&Self::Snapshot) -> R + Send + Sync + 'static,
        R: 'static,
    {
        self.as_state_flow()
            .map(move |snapshot: &Arc<Self::Snapshot>| transform(snapshot.as_ref()))
    }

    /// Edits through a fresh editor and publishes the result.
    fn edit<F>(&self, edit: F) -> Arc<Self::Snapshot>
    where
        F: FnOnce(&mut Self::Editor),
    {
        let mut editor = self.mutable();
        edit(&mut editor);
        self.update(&editor);
        self.get()
    }
}

pub trait PreferencesEditor {
    type Snapshot;

    fn to_immutable(&self) -> Self::Snapshot;
}

/// Ordinal mapping for enums stored as their declaration index.
pub trait PrefEnum: Sized + 'static {
    const ENTRIES: &'static [Self];

    fn ordinal(&self) -> i32;

    /// `None` for negative or out of range ordinals.
    fn from_ordinal(ordinal: i32) -> Option<Self>;
}
