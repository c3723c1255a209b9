use fluent_tutor_types::{EnglishLevel, TeacherId, TeacherProfile};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

pub fn teachers() -> Vec<TeacherProfile> {
    vec![
        TeacherProfile {
            id: TeacherId::Sophia,
            name: "Sophia Victoria".to_string(),
            title: "Fluency Specialist".to_string(),
            voice: "Kore".to_string(),
            avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=Sophia&gender=female"
                .to_string(),
            description: "Warm and encouraging.".to_string(),
        },
        TeacherProfile {
            id: TeacherId::Sebas,
            name: "Super Sebas".to_string(),
            title: "High-Energy Coach".to_string(),
            voice: "Fenrir".to_string(),
            avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=Sebas&gender=male"
                .to_string(),
            description: "Dynamic and direct.".to_string(),
        },
    ]
}

pub fn teacher(id: TeacherId) -> TeacherProfile {
    teachers()
        .into_iter()
        .find(|t| t.id == id)
        .unwrap_or_else(|| teachers().remove(0))
}

/// Short description and focus area shown for a proficiency level.
pub fn level_description(level: EnglishLevel) -> (&'static str, &'static str) {
    match level {
        EnglishLevel::A1 => ("Starting your journey.", "Basic greetings & common nouns"),
        EnglishLevel::A2 => ("Handling simple tasks.", "Daily routines & past events"),
        EnglishLevel::B1 => ("Getting independent.", "Opinions & hypothetical situations"),
        EnglishLevel::B2 => ("Communicating fluently.", "Complex arguments & technical talk"),
        EnglishLevel::C1 => ("Near native proficiency.", "Nuance, sarcasm & academic topics"),
        EnglishLevel::C2 => ("Ultimate fluency.", "Literary analysis & total ease"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhonemeCategory {
    Vowels,
    Consonants,
    Diphthongs,
    Clusters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonemeItem {
    pub label: &'static str,
    pub phoneme: &'static str,
    pub example: &'static str,
    /// Fragment spliced into the practice request sent to the tutor.
    pub command: &'static str,
    pub category: PhonemeCategory,
}

const fn item(
    label: &'static str,
    phoneme: &'static str,
    example: &'static str,
    category: PhonemeCategory,
    command: &'static str,
) -> PhonemeItem {
    PhonemeItem {
        label,
        phoneme,
        example,
        command,
        category,
    }
}

use PhonemeCategory::{Clusters, Consonants, Diphthongs, Vowels};

pub const PHONEME_PRACTICE_ITEMS: &[PhonemeItem] = &[
    item("TH (Unvoiced)", "/θ/", "Three, Healthy, Earth", Consonants, "unvoiced \"th\" /θ/"),
    item("TH (Voiced)", "/ð/", "That, Weather, Smooth", Consonants, "voiced \"th\" /ð/"),
    item(
        "TH Mastery",
        "/θ/ & /ð/",
        "Think vs. These",
        Consonants,
        "comprehensive practice of both voiced and unvoiced \"th\" sounds (/θ/ and /ð/)",
    ),
    item("R vs L", "/r/ vs /l/", "Read, Lead", Consonants, "distinction between /r/ and /l/"),
    item("V vs B", "/v/ vs /b/", "Very, Berry", Consonants, "distinction between /v/ and /b/"),
    item("S vs SH", "/s/ vs /ʃ/", "Sea, She", Consonants, "/s/ and /ʃ/ sounds"),
    item("W vs V", "/w/ vs /v/", "Wet, Vet", Consonants, "distinction between the /w/ and /v/ sounds"),
    item(
        "CH vs SH",
        "/tʃ/ vs /ʃ/",
        "Chair, Share",
        Consonants,
        "distinction between the /tʃ/ and /ʃ/ sounds",
    ),
    item("Z vs S", "/z/ vs /s/", "Zip, Sip", Consonants, "voiced /z/ and unvoiced /s/"),
    item("NG Sound", "/ŋ/", "Sing, Long", Consonants, "velar nasal /ŋ/ sound"),
    item("ZH Sound", "/ʒ/", "Measure, Vision", Consonants, "voiced /ʒ/ sound"),
    item("Sheep vs Ship", "/i:/ vs /ɪ/", "Sheet, Sit", Vowels, "long /i:/ and short /ɪ/ vowel sounds"),
    item("Bad vs Bed", "/æ/ vs /e/", "Bad, Bed", Vowels, "difference between the /æ/ and /e/ vowel sounds"),
    item("Foot vs Food", "/ʊ/ vs /u:/", "Foot, Food", Vowels, "short /ʊ/ and long /u:/ vowel sounds"),
    item("Caught vs Cot", "/ɔ:/ vs /ɒ/", "Caught, Cot", Vowels, "difference between /ɔ:/ and /ɒ/ vowels"),
    item("Diphthong AY", "/eɪ/", "Face, Day", Diphthongs, "/eɪ/ diphthong"),
    item("Diphthong AI", "/aɪ/", "Price, Sky", Diphthongs, "/aɪ/ diphthong"),
    item("Diphthong OW", "/əʊ/", "Go, Home", Diphthongs, "/əʊ/ diphthong"),
    item("Diphthong AIR", "/eə/", "Square, Chair", Diphthongs, "/eə/ diphthong"),
    item("Diphthong EAR", "/ɪə/", "Near, Clear", Diphthongs, "/ɪə/ diphthong"),
    item("Diphthong OY", "/ɔɪ/", "Boy, Coin", Diphthongs, "/ɔɪ/ diphthong"),
    item("Diphthong OU", "/aʊ/", "Mouth, Cloud", Diphthongs, "/aʊ/ diphthong"),
    item("STR Cluster", "/str/", "Street, Strong", Clusters, "/str/ consonant cluster"),
    item("THR Cluster", "/θr/", "Three, Through", Clusters, "/θr/ consonant cluster"),
    item("Ending STS", "/sts/", "Lists, Ghosts", Clusters, "/sts/ consonant cluster"),
    item("SPL Cluster", "/spl/", "Splash, Split", Clusters, "/spl/ consonant cluster"),
    item("SCR Cluster", "/scr/", "Screen, Scratch", Clusters, "/scr/ consonant cluster"),
    item("TR vs DR", "/tr/ vs /dr/", "Train, Drain", Clusters, "distinction between /tr/ and /dr/ clusters"),
    item("FT Ending", "/ft/", "Soft, Gift", Clusters, "/ft/ cluster at the end of words"),
];

/// Minimum skim score for a fuzzy label match.
const FUZZY_MATCH_THRESHOLD: i64 = 50;

pub struct PhonemeCatalog {
    pub items: &'static [PhonemeItem],
    matcher: SkimMatcherV2,
}

impl Default for PhonemeCatalog {
    fn default() -> Self {
        Self::new(PHONEME_PRACTICE_ITEMS)
    }
}

impl PhonemeCatalog {
    pub fn new(items: &'static [PhonemeItem]) -> Self {
        Self {
            items,
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Exact, case-insensitive label lookup.
    pub fn by_label(&self, label: &str) -> Option<&'static PhonemeItem> {
        self.items
            .iter()
            .find(|item| item.label.eq_ignore_ascii_case(label.trim()))
    }

    /// Exact label match, falling back to the best fuzzy match.
    pub fn resolve(&self, label: &str) -> Option<&'static PhonemeItem> {
        self.by_label(label).or_else(|| {
            self.find_mentions(label, FUZZY_MATCH_THRESHOLD)
                .into_iter()
                .next()
        })
    }

    // Returns items whose label fuzzily matches the query above a threshold, best first.
    pub fn find_mentions(&self, query: &str, threshold: i64) -> Vec<&'static PhonemeItem> {
        let query = query.to_lowercase();
        let mut scored: Vec<(i64, &'static PhonemeItem)> = self
            .items
            .iter()
            .filter_map(|item| {
                let label = item.label.to_lowercase();
                self.matcher
                    .fuzzy_match(&label, &query)
                    .filter(|score| *score > threshold)
                    .map(|score| (score, item))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, item)| item).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleplayScenario {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub command: &'static str,
}

pub const ROLEPLAY_SCENARIOS: &[RoleplayScenario] = &[
    RoleplayScenario {
        title: "Job Interview",
        description: "Practice answering questions.",
        icon: "💼",
        command: "I want to roleplay a job interview. You are the hiring manager.",
    },
    RoleplayScenario {
        title: "Doctor Visit",
        description: "Explain symptoms.",
        icon: "🩺",
        command: "I want to roleplay a visit to the doctor. You are the doctor.",
    },
    RoleplayScenario {
        title: "Airport Security",
        description: "Navigate travel checks.",
        icon: "✈️",
        command: "I want to roleplay going through airport security. You are the officer.",
    },
];

pub fn roleplay_scenario(title: &str) -> Option<&'static RoleplayScenario> {
    ROLEPLAY_SCENARIOS
        .iter()
        .find(|s| s.title.eq_ignore_ascii_case(title.trim()))
}
