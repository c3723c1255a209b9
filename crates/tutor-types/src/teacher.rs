use std::fmt;
use std::str::FromStr;

/// Identifier of one of the built-in tutors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherId {
    #[default]
    Sophia,
    Sebas,
}

impl TeacherId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherId::Sophia => "sophia",
            TeacherId::Sebas => "sebas",
        }
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeacherId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sophia" => Ok(TeacherId::Sophia),
            "sebas" => Ok(TeacherId::Sebas),
            other => Err(format!("unknown teacher: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TeacherProfile {
    pub id: TeacherId,
    pub name: String,
    pub title: String,
    /// Voice preset handed to the live transport.
    pub voice: String,
    pub avatar: String,
    pub description: String,
}
