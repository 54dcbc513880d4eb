//! Turns free-form model output into a fixed-size list of pool tracks.
//!
//! Only lines shaped like `1. "Title" by Artist` are read. Parsed songs that
//! are not in the prompt's track list are dropped, duplicates are removed, and
//! the result is truncated or topped up from the list to exactly
//! [`RECOMMENDATION_COUNT`] entries whenever enough tracks exist.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use rand::seq::SliceRandom;
use regex::Regex;

use crate::{
    models::{CandidateTrack, SongLine, TrackIdentity},
    services::prompt::RECOMMENDATION_COUNT,
};

static SONG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\d+\.\s*"([^"]+)"\s*by\s+(.+?)\s*$"#).expect("valid song line pattern")
});

/// Annotations the prompt puts after a track that models tend to echo back
static TRAILING_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\((?:Genre Match|Recent Release|[^()]*\bEra|popularity:[^()]*)\)\s*$")
        .expect("valid hint pattern")
});

fn strip_hints(artist: &str) -> &str {
    let mut artist = artist.trim();
    while let Some(found) = TRAILING_HINT.find(artist) {
        artist = artist[..found.start()].trim_end();
    }
    artist
}

/// Every well-formed song line in `raw`, in order
pub fn parse_song_lines(raw: &str) -> Vec<SongLine> {
    raw.lines()
        .filter_map(|line| {
            let captures = SONG_LINE.captures(line)?;
            let title = captures.get(1)?.as_str().trim();
            let artist = strip_hints(captures.get(2)?.as_str());
            if title.is_empty() || artist.is_empty() {
                return None;
            }
            Some(SongLine::new(title, artist))
        })
        .collect()
}

/// Finalizes the model's answer against the tracks it was offered
pub fn repair(raw: &str, selected: &[CandidateTrack]) -> Vec<SongLine> {
    let by_identity: HashMap<TrackIdentity, &CandidateTrack> = selected
        .iter()
        .map(|track| (track.identity(), track))
        .collect();

    let parsed = parse_song_lines(raw);
    let parsed_count = parsed.len();

    let mut used = HashSet::new();
    let mut lines: Vec<SongLine> = parsed
        .into_iter()
        .filter_map(|song| {
            let identity = song.identity();
            let track = by_identity.get(&identity)?;
            used.insert(identity).then(|| SongLine::from(*track))
        })
        .take(RECOMMENDATION_COUNT)
        .collect();

    if parsed_count > lines.len() {
        tracing::debug!(
            parsed = parsed_count,
            kept = lines.len(),
            "Dropped model lines outside the offered tracks"
        );
    }

    if lines.len() < RECOMMENDATION_COUNT {
        let mut remaining: Vec<&CandidateTrack> = selected
            .iter()
            .filter(|track| !used.contains(&track.identity()))
            .collect();
        remaining.shuffle(&mut rand::rng());

        let missing = RECOMMENDATION_COUNT - lines.len();
        tracing::info!(
            parsed = lines.len(),
            available = remaining.len(),
            "Topping up model output from the pool"
        );

        for track in remaining {
            if lines.len() == RECOMMENDATION_COUNT {
                break;
            }
            if used.insert(track.identity()) {
                lines.push(SongLine::from(track));
            }
        }

        if lines.len() < RECOMMENDATION_COUNT {
            tracing::warn!(
                missing = missing,
                returned = lines.len(),
                "Not enough tracks to fill the recommendation"
            );
        }
    }

    lines
}
