use std::collections::HashSet;

/// The set of series identifiers marked for export.
///
/// This is the only state owned by the client itself: it has no server
/// representation until export time. Membership is keyed by the stable series
/// identifier, never by row position, so entries keep their selection across
/// refetches, page navigation, and filter changes until explicitly toggled.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of a single identifier.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// The page-scoped "select all" toggle.
    ///
    /// If every visible id is already selected, exactly those ids are
    /// removed; otherwise every missing visible id is added. Selections made
    /// on other pages are never touched, and calling this twice with the same
    /// visible ids restores the previous state.
    pub fn select_all_visible<S: AsRef<str>>(&mut self, visible_ids: &[S]) {
        let all_selected = visible_ids
            .iter()
            .all(|id| self.ids.contains(id.as_ref()));
        if all_selected {
            for id in visible_ids {
                self.ids.remove(id.as_ref());
            }
        } else {
            for id in visible_ids {
                if !self.ids.contains(id.as_ref()) {
                    self.ids.insert(id.as_ref().to_string());
                }
            }
        }
    }

    pub fn clear_all(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in a deterministic (sorted) order for building the export
    /// request body.
    pub fn export_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
