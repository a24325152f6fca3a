use std::collections::HashSet;

/// Lower-cases and splits text on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Should,
    Must,
    MustNot,
}

/// A query string split into terms. `+term` is required, `-term` excluded,
/// anything else optional.
#[derive(Debug, Default)]
pub struct Query {
    pub terms: Vec<(Occur, String)>,
}

impl Query {
    pub fn parse(query: &str) -> Self {
        let mut terms = Vec::new();
        for raw in query.split_whitespace() {
            let (occur, rest) = if let Some(rest) = raw.strip_prefix('+') {
                (Occur::Must, rest)
            } else if let Some(rest) = raw.strip_prefix('-') {
                (Occur::MustNot, rest)
            } else {
                (Occur::Should, raw)
            };
            let mut tokens: Vec<String> = tokenize(rest).into_iter().collect();
            tokens.sort();
            for token in tokens {
                terms.push((occur, token));
            }
        }
        Self { terms }
    }

    pub fn with(&self, occur: Occur) -> impl Iterator<Item = &String> {
        self.terms
            .iter()
            .filter(move |(o, _)| *o == occur)
            .map(|(_, term)| term)
    }

    /// Renders the query as an FTS5 match expression, `None` when nothing
    /// could match.
    pub fn to_fts5(&self) -> Option<String> {
        let quote = |term: &String| format!("\"{}\"", term.replace('"', "\"\""));

        let required: Vec<String> = self.with(Occur::Must).map(quote).collect();
        let optional: Vec<String> = self.with(Occur::Should).map(quote).collect();
        let excluded: Vec<String> = self.with(Occur::MustNot).map(quote).collect();

        let positive = if !required.is_empty() {
            required.join(" AND ")
        } else if !optional.is_empty() {
            optional.join(" OR ")
        } else {
            return None;
        };

        if excluded.is_empty() {
            Some(positive)
        } else {
            Some(format!("({}) NOT ({})", positive, excluded.join(" OR ")))
        }
    }
}
