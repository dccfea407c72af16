//! Lookup subjects: a player name or a player identifier.

/// What a lookup input refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Player name, fetched via the search endpoint.
    Name(String),
    /// Player UUID, fetched via the profile endpoint.
    Id(String),
}

impl Subject {
    /// Classify trimmed input. 32 hex digits (dashes allowed) is an id;
    /// anything else is a name.
    pub fn parse(input: &str) -> Self {
        if is_uuid(input) { Subject::Id(input.to_string()) } else { Subject::Name(input.to_string()) }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Subject::Name(s) | Subject::Id(s) => s,
        }
    }

    /// The single fallback variant of a name: first character uppercased,
    /// the rest lowercased. `None` for ids or when the variant is identical.
    pub fn capitalized(&self) -> Option<Subject> {
        let Subject::Name(name) = self else {
            return None;
        };

        let mut chars = name.chars();
        let first = chars.next()?;
        let variant: String = first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect();

        (variant != *name).then_some(Subject::Name(variant))
    }
}

fn is_uuid(input: &str) -> bool {
    let dashes = input.chars().filter(|&c| c == '-').count();
    if dashes != 0 && (dashes != 4 || input.len() != 36) {
        return false;
    }
    let hex: Vec<char> = input.chars().filter(|&c| c != '-').collect();
    hex.len() == 32 && hex.iter().all(char::is_ascii_hexdigit)
}
