/// Ordered token contents whose concatenation is the file as it currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStore {
    tokens: Vec<String>,
}

impl TokenStore {
    /// Load a store from a host's token contents, in file order.
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Number of token positions.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Content at `pos`, or `None` past the end.
    pub fn get(&self, pos: usize) -> Option<&str> {
        self.tokens.get(pos).map(String::as_str)
    }

    /// Replace the content at `pos`, returning what was there before.
    ///
    /// Returns `None` (and changes nothing) if `pos` is out of range.
    pub fn set(&mut self, pos: usize, content: String) -> Option<String> {
        let slot = self.tokens.get_mut(pos)?;
        Some(std::mem::replace(slot, content))
    }

    /// Join every token into the full text.
    pub fn contents(&self) -> String {
        let mut out = String::with_capacity(self.tokens.iter().map(String::len).sum());
        for token in &self.tokens {
            out.push_str(token);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}
