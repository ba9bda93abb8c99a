use std::fmt;

/// Source of a primary key for a sample.
///
/// Returning `None` means the context carries no usable key and the
/// sample is skipped rather than filed under a made-up key. The aggregator
/// calls `derive_key` before taking its lock, so implementations may read
/// the aggregator they are recorded into.
pub trait KeyContext<P> {
    fn derive_key(&self) -> Option<P>;
}

impl<P: Clone> KeyContext<P> for Option<P> {
    fn derive_key(&self) -> Option<P> {
        self.clone()
    }
}

/// Context of a typed key: the file type of the edited document, if known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorContext {
    pub file_type: Option<String>,
}

impl EditorContext {
    pub fn new(file_type: Option<impl Into<String>>) -> Self {
        Self {
            file_type: file_type.map(Into::into),
        }
    }
}

impl KeyContext<String> for EditorContext {
    fn derive_key(&self) -> Option<String> {
        self.file_type
            .as_deref()
            .filter(|ft| !ft.is_empty())
            .map(str::to_owned)
    }
}

/// Normalized secondary key for a typed action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    /// ASCII letter or digit.
    Letter,
    Space,
    Enter,
    /// Any other single character.
    Other(char),
    /// Labels that are not exactly one character pass through unchanged.
    Verbatim(String),
}

impl ActionKey {
    pub fn classify(raw: &str) -> Self {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' => Self::Letter,
                ' ' => Self::Space,
                '\n' => Self::Enter,
                other => Self::Other(other),
            },
            _ => Self::Verbatim(raw.to_owned()),
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter => f.write_str("Letter"),
            Self::Space => f.write_str("Space"),
            Self::Enter => f.write_str("Enter"),
            Self::Other(c) => write!(f, "{c}"),
            Self::Verbatim(s) => f.write_str(s),
        }
    }
}

/// String form of [`ActionKey::classify`].
pub fn classify_secondary_key(raw: &str) -> String {
    ActionKey::classify(raw).to_string()
}
