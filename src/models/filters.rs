use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Era value that switches context building to recency-capable sources
pub const LATEST_RELEASES: &str = "Latest Releases";

/// Placeholder used in history keys for filters the user left empty
const ANY: &str = "any";

/// Taste filters selected in the UI
///
/// Every field is optional. Values come from the closed option lists in
/// [`crate::models::options`], except `weather` which is supplied by the
/// weather lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub genre: Option<String>,
    pub subgenre: Option<String>,
    pub mood: Option<String>,
    #[serde(rename = "bpm")]
    pub bpm_range: Option<String>,
    pub activity: Option<String>,
    pub era: Option<String>,
    pub time_of_day: Option<String>,
    pub weather: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FilterSet {
    /// Trims every value and treats empty strings as absent
    pub fn normalized(self) -> Self {
        Self {
            genre: non_empty(self.genre),
            subgenre: non_empty(self.subgenre),
            mood: non_empty(self.mood),
            bpm_range: non_empty(self.bpm_range),
            activity: non_empty(self.activity),
            era: non_empty(self.era),
            time_of_day: non_empty(self.time_of_day),
            weather: non_empty(self.weather),
        }
    }

    pub fn is_latest_releases(&self) -> bool {
        self.era.as_deref() == Some(LATEST_RELEASES)
    }

    /// Era text usable inside a search query, e.g. "(1990s)" becomes "1990s".
    /// `None` for no era or for the Latest Releases sentinel.
    pub fn era_qualifier(&self) -> Option<String> {
        let era = self.era.as_deref()?;
        let cleaned = era.replace(['(', ')'], "").trim().to_string();
        if cleaned.is_empty() || cleaned == LATEST_RELEASES {
            None
        } else {
            Some(cleaned)
        }
    }

    /// Whether any catalog-shaping filter is set. Time of day and weather only
    /// flavor the prompt, so they do not count.
    pub fn has_any_filter(&self) -> bool {
        self.genre.is_some()
            || self.subgenre.is_some()
            || self.mood.is_some()
            || self.era.is_some()
            || self.activity.is_some()
            || self.bpm_range.is_some()
    }

    /// Human-readable sentences for every active filter, in a fixed order
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(genre) = &self.genre {
            lines.push(format!("The user is looking for {} songs.", genre));
        }
        if let Some(era) = &self.era {
            lines.push(format!("The time period selected is: {}.", era));
        }
        if let Some(subgenre) = &self.subgenre {
            lines.push(format!("The subgenre preference is: {}.", subgenre));
        }
        if let Some(mood) = &self.mood {
            lines.push(format!("The mood requested is: {}.", mood));
        }
        if let Some(bpm) = &self.bpm_range {
            lines.push(format!("The BPM range is: {}.", bpm));
        }
        if let Some(activity) = &self.activity {
            lines.push(format!("The activity context is: {}.", activity));
        }
        if let Some(time) = &self.time_of_day {
            lines.push(format!("The time of day is: {}.", time));
        }
        if let Some(weather) = &self.weather {
            lines.push(format!("The weather is: {}.", weather));
        }
        lines
    }
}

/// Key under which already-recommended tracks are remembered.
///
/// Derived from genre, era, subgenre and mood only; the remaining filters do
/// not change which candidates are gathered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryKey(String);

impl HistoryKey {
    pub fn from_filters(filters: &FilterSet) -> Self {
        let part = |value: &Option<String>| value.as_deref().unwrap_or(ANY).to_string();
        Self(format!(
            "{}-{}-{}-{}",
            part(&filters.genre),
            part(&filters.era),
            part(&filters.subgenre),
            part(&filters.mood)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&FilterSet> for HistoryKey {
    fn from(filters: &FilterSet) -> Self {
        Self::from_filters(filters)
    }
}

impl Display for HistoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
