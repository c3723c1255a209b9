use std::fmt;
use std::str::FromStr;

/// Six-point proficiency scale, A1 lowest and C2 highest.
///
/// Variants are declared in ascending order so the derived `Ord` matches the
/// scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize,
    serde::Deserialize,
)]
pub enum EnglishLevel {
    A1,
    A2,
    #[default]
    B1,
    B2,
    C1,
    C2,
}

impl EnglishLevel {
    pub const ALL: [EnglishLevel; 6] = [
        EnglishLevel::A1,
        EnglishLevel::A2,
        EnglishLevel::B1,
        EnglishLevel::B2,
        EnglishLevel::C1,
        EnglishLevel::C2,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EnglishLevel::A1 => "A1",
            EnglishLevel::A2 => "A2",
            EnglishLevel::B1 => "B1",
            EnglishLevel::B2 => "B2",
            EnglishLevel::C1 => "C1",
            EnglishLevel::C2 => "C2",
        }
    }

    /// Display name shown next to the code, e.g. "Intermediate" for B1.
    pub fn name(&self) -> &'static str {
        match self {
            EnglishLevel::A1 => "Beginner",
            EnglishLevel::A2 => "Elementary",
            EnglishLevel::B1 => "Intermediate",
            EnglishLevel::B2 => "Upper Int.",
            EnglishLevel::C1 => "Advanced",
            EnglishLevel::C2 => "Mastery",
        }
    }
}

impl fmt::Display for EnglishLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EnglishLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnglishLevel::ALL
            .into_iter()
            .find(|level| level.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown proficiency level: {s}"))
    }
}
