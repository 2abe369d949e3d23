use std::collections::HashMap;

use crate::foundation::ids::FrameId;

/// Interned frame names. Ids are dense and stable for the lifetime of the table.
#[derive(Debug, Default, Clone)]
pub(crate) struct FrameTable {
    ids_by_name: HashMap<String, FrameId>,
    names_by_id: Vec<String>,
}

impl FrameTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the id and whether the name was newly added.
    pub(crate) fn intern(&mut self, name: &str) -> (FrameId, bool) {
        if let Some(&id) = self.ids_by_name.get(name) {
            return (id, false);
        }
        let id = FrameId(u32::try_from(self.names_by_id.len()).unwrap_or(u32::MAX));
        self.names_by_id.push(name.to_owned());
        self.ids_by_name.insert(name.to_owned(), id);
        (id, true)
    }

    pub(crate) fn id(&self, name: &str) -> Option<FrameId> {
        self.ids_by_name.get(name).copied()
    }

    pub(crate) fn name(&self, id: FrameId) -> &str {
        &self.names_by_id[id.index()]
    }

    pub(crate) fn len(&self) -> usize {
        self.names_by_id.len()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.names_by_id.iter().map(String::as_str)
    }

    pub(crate) fn clear(&mut self) {
        self.ids_by_name.clear();
        self.names_by_id.clear();
    }
}
