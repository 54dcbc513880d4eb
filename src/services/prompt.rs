//! Prompt assembly for the recommendation model.

use rand::seq::SliceRandom;

use crate::models::{CandidateTrack, FilterSet, ProvenanceTag};

/// Upper bound on tracks embedded in one prompt
pub const MAX_PROMPT_TRACKS: usize = 20;

/// Number of songs the model is asked to pick
pub const RECOMMENDATION_COUNT: usize = 5;

/// Used when the user submitted no free text
pub const DEFAULT_USER_PROMPT: &str = "Suggest me some songs";

/// Shuffles the candidates and keeps at most [`MAX_PROMPT_TRACKS`]
pub fn select_tracks(mut candidates: Vec<CandidateTrack>) -> Vec<CandidateTrack> {
    candidates.shuffle(&mut rand::rng());
    candidates.truncate(MAX_PROMPT_TRACKS);
    candidates
}

/// Text hints for a track's provenance, e.g. " (Genre Match) (1990s Era)"
pub fn provenance_hints(track: &CandidateTrack) -> String {
    track
        .provenance_tags
        .iter()
        .map(|tag| match tag {
            ProvenanceTag::GenreMatch => " (Genre Match)".to_string(),
            ProvenanceTag::RecentRelease => " (Recent Release)".to_string(),
            ProvenanceTag::Era(era) => format!(" ({} Era)", era),
        })
        .collect()
}

fn track_line(position: usize, track: &CandidateTrack) -> String {
    format!(
        "{}. \"{}\" by {} (popularity: {}){}",
        position,
        track.title,
        track.artist,
        track.popularity,
        provenance_hints(track)
    )
}

/// Builds the instruction sent to the model
pub fn build_prompt(user_prompt: &str, filters: &FilterSet, tracks: &[CandidateTrack]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("User request: {}\n\n", user_prompt));

    let preferences = filters.describe();
    if !preferences.is_empty() {
        prompt.push_str("Preferences:\n");
        for line in &preferences {
            prompt.push_str(&format!("- {}\n", line));
        }
        prompt.push('\n');
    }

    prompt.push_str("Available tracks:\n");
    for (index, track) in tracks.iter().enumerate() {
        prompt.push_str(&track_line(index + 1, track));
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nChoose exactly {count} songs from the list above. Only use tracks from this list and \
         never invent new titles or artists.\n\
         Prefer tracks marked (Genre Match), (Recent Release) or with an era that matches the \
         preferences.\n\
         Respond with exactly {count} lines in this format and nothing else:\n\
         1. \"Song Title\" by Artist\n\
         Do not add any commentary, explanation or extra text.\n",
        count = RECOMMENDATION_COUNT
    ));

    prompt
}
