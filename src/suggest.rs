use crate::config::SUGGESTION_MIN_LEN;

/// Autocomplete over a fixed list of known item names.
///
/// Matches are case-insensitive substrings and come back in list order.
/// Callers debounce keystrokes themselves.
#[derive(Debug, Clone, Default)]
pub struct SuggestionIndex {
    names: Vec<String>,
    lowered: Vec<String>,
}

impl SuggestionIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let lowered = names.iter().map(|n| n.to_lowercase()).collect();
        Self { names, lowered }
    }

    /// Load the name list from a JSON array of strings.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let names: Vec<String> = serde_json::from_str(json)?;
        Ok(Self::new(names))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names containing `fragment`, or nothing for fragments shorter than three characters.
    pub fn suggest(&self, fragment: &str) -> Vec<&str> {
        if fragment.chars().count() < SUGGESTION_MIN_LEN {
            return Vec::new();
        }
        let needle = fragment.to_lowercase();
        self.lowered
            .iter()
            .zip(&self.names)
            .filter(|(lowered, _)| lowered.contains(&needle))
            .map(|(_, name)| name.as_str())
            .collect()
    }
}
