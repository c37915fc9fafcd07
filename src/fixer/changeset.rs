/// Edits buffered between `begin_changeset` and `end_changeset`.
///
/// Entries keep their first insertion slot; buffering the same position
/// again only updates the pending content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    entries: Vec<(usize, String)>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pos: usize, content: String) {
        match self.entries.iter_mut().find(|(p, _)| *p == pos) {
            Some((_, pending)) => *pending = content,
            None => self.entries.push((pos, content)),
        }
    }

    pub fn get(&self, pos: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| *p == pos)
            .map(|(_, content)| content.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(usize, String)> {
        self.entries
    }
}
