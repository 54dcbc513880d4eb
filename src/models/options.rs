//! Closed option lists the UI offers for each filter.

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::FilterSet,
};

/// Genres with their subgenres
pub const GENRES: &[(&str, &[&str])] = &[
    ("Rock", &["Alternative Rock", "Classic Rock", "Indie Rock", "Progressive Rock", "Punk Rock", "Hard Rock", "Post-Rock", "Psychedelic Rock"]),
    ("Pop", &["Indie Pop", "Synth-pop", "K-pop", "Dream Pop", "Electropop", "Pop Rock", "Dance Pop"]),
    ("Electronic", &["House", "Techno", "Trance", "Dubstep", "Ambient", "Drum and Bass", "IDM", "Synthwave"]),
    ("Hip-Hop", &["Rap", "Trap", "Alternative Hip Hop", "Old School Hip Hop", "Conscious Hip Hop", "Boom Bap"]),
    ("Metal", &["Heavy Metal", "Black Metal", "Death Metal", "Thrash Metal", "Doom Metal", "Power Metal", "Metalcore"]),
    ("Jazz", &["Bebop", "Cool Jazz", "Fusion", "Free Jazz", "Smooth Jazz", "Modal Jazz"]),
    ("Folk", &["Indie Folk", "Folk Rock", "Traditional Folk", "Singer-Songwriter", "Americana"]),
    ("R&B", &["Soul", "Neo Soul", "Contemporary R&B", "Funk", "Motown"]),
    ("Classical", &["Baroque", "Romantic", "Contemporary Classical", "Minimalist", "Chamber Music", "Opera"]),
    ("Country", &["Alternative Country", "Country Rock", "Bluegrass", "Country Pop", "Outlaw Country"]),
    ("Blues", &["Chicago Blues", "Delta Blues", "Electric Blues", "Blues Rock"]),
    ("Reggae", &["Dub", "Dancehall", "Roots Reggae", "Ska"]),
    ("Punk", &["Post-Punk", "Hardcore Punk", "Pop Punk", "Emo", "Skate Punk"]),
    ("Indie", &["Indie Rock", "Indie Pop", "Indie Folk", "Shoegaze", "Indie Electronic"]),
    ("Alternative", &["Alternative Rock", "Post-Punk", "Grunge", "Britpop", "Lo-fi"]),
];

pub const MOODS: &[&str] = &[
    "Happy", "Energetic", "Calm", "Relaxed", "Focused", "Melancholic", "Romantic", "Angry",
    "Nostalgic", "Uplifting", "Dreamy", "Confident", "Emotional", "Peaceful", "Intense",
];

pub const BPM_RANGES: &[&str] = &[
    "Very Slow (< 60 BPM)",
    "Slow (60-90 BPM)",
    "Medium (90-120 BPM)",
    "Fast (120-150 BPM)",
    "Very Fast (150+ BPM)",
    "Variable BPM",
];

pub const ACTIVITIES: &[&str] = &[
    "Gym/Workout", "Walking", "Running", "Cycling", "Driving", "Commuting", "Studying",
    "Working/Focus", "Relaxing", "Meditation", "Party", "Dancing", "Gaming", "Reading",
    "Cooking", "Sleeping/Bedtime",
];

pub const ERAS: &[&str] = &[
    super::LATEST_RELEASES,
    "2020s",
    "2010s",
    "2000s",
    "1990s",
    "1980s",
    "1970s",
    "1960s",
    "1950s",
];

pub const TIMES_OF_DAY: &[&str] = &[
    "Early Morning", "Morning", "Afternoon", "Evening", "Night", "Late Night", "Dawn", "Dusk",
];

#[derive(Debug, Serialize)]
pub struct GenreOption {
    pub name: &'static str,
    pub subgenres: &'static [&'static str],
}

/// Every option list, as served to the UI
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub genres: Vec<GenreOption>,
    pub moods: &'static [&'static str],
    pub bpm_ranges: &'static [&'static str],
    pub activities: &'static [&'static str],
    pub eras: &'static [&'static str],
    pub times_of_day: &'static [&'static str],
}

impl FilterOptions {
    pub fn catalog() -> Self {
        Self {
            genres: GENRES
                .iter()
                .map(|(name, subgenres)| GenreOption {
                    name: *name,
                    subgenres: *subgenres,
                })
                .collect(),
            moods: MOODS,
            bpm_ranges: BPM_RANGES,
            activities: ACTIVITIES,
            eras: ERAS,
            times_of_day: TIMES_OF_DAY,
        }
    }
}

fn check(field: &str, value: Option<&str>, allowed: impl Fn(&str) -> bool) -> AppResult<()> {
    match value {
        Some(v) if !allowed(v) => Err(AppError::InvalidInput(format!(
            "Unsupported {}: {}",
            field, v
        ))),
        _ => Ok(()),
    }
}

/// Rejects filter values that are not drawn from the option lists.
///
/// A subgenre is accepted when it belongs to the selected genre, or to any
/// genre when none is selected. Weather is not checked.
pub fn validate(filters: &FilterSet) -> AppResult<()> {
    check("genre", filters.genre.as_deref(), |v| {
        GENRES.iter().any(|(name, _)| *name == v)
    })?;
    check("subgenre", filters.subgenre.as_deref(), |v| {
        GENRES
            .iter()
            .filter(|(name, _)| filters.genre.as_deref().map_or(true, |g| g == *name))
            .any(|(_, subs)| subs.contains(&v))
    })?;
    check("mood", filters.mood.as_deref(), |v| MOODS.contains(&v))?;
    check("bpm", filters.bpm_range.as_deref(), |v| BPM_RANGES.contains(&v))?;
    check("activity", filters.activity.as_deref(), |v| {
        ACTIVITIES.contains(&v)
    })?;
    check("era", filters.era.as_deref(), |v| ERAS.contains(&v))?;
    check("timeOfDay", filters.time_of_day.as_deref(), |v| {
        TIMES_OF_DAY.contains(&v)
    })?;
    Ok(())
}
