use serde::{Deserialize, Serialize};

/// The negotiation style a student reports for themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStyle {
    #[default]
    Competitive,
    Collaborative,
    Yielding,
    Analytical,
}

impl NegotiationStyle {
    pub const ALL: [NegotiationStyle; 4] = [
        Self::Competitive,
        Self::Collaborative,
        Self::Yielding,
        Self::Analytical,
    ];

    /// Human-facing label, as offered in the style picker.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Competitive => "Competitive",
            Self::Collaborative => "Collaborative",
            Self::Yielding => "Yielding / Soft",
            Self::Analytical => "Analytical / Logical",
        }
    }

    /// Resolve a UI label, falling back to `Competitive` for anything
    /// unrecognized. Missing or unknown styles are not an error.
    pub fn from_label_or_default(label: &str) -> Self {
        match label.parse() {
            Ok(style) => style,
            Err(_) => {
                tracing::warn!(label, "unrecognized negotiation style, using competitive");
                Self::Competitive
            }
        }
    }
}

impl std::fmt::Display for NegotiationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Competitive => write!(f, "competitive"),
            Self::Collaborative => write!(f, "collaborative"),
            Self::Yielding => write!(f, "yielding"),
            Self::Analytical => write!(f, "analytical"),
        }
    }
}

impl std::str::FromStr for NegotiationStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "competitive" | "competitivo" => Ok(Self::Competitive),
            "collaborative" | "colaborativo" => Ok(Self::Collaborative),
            "yielding soft" | "yielding" | "soft" | "cediendo suave" | "cediendo" | "suave" => {
                Ok(Self::Yielding)
            }
            "analytical logical" | "analytical" | "logical" | "analitico logico"
            | "analitico" | "logico" => Ok(Self::Analytical),
            _ => Err(format!("unknown negotiation style: {s}")),
        }
    }
}

/// Lowercase, strip Spanish accents, and collapse every run of separators
/// (spaces, slashes, dashes, underscores) into a single space.
fn normalize_label(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Language used for the counterpart's fixed lines and instruction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::English => write!(f, "en"),
            Self::Spanish => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "es" | "spanish" | "español" | "espanol" => Ok(Self::Spanish),
            _ => Err(format!("unknown language: {s}")),
        }
    }
}
