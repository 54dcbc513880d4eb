//! Candidate pool assembly.
//!
//! Builds an ordered plan of catalog queries from the filters, runs it against
//! the track sources stage by stage, and merges the results into a
//! de-duplicated pool capped at a limit.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Datelike;

use crate::{
    models::{CandidateTrack, FilterSet, Popularity, ProvenanceTag, TrackIdentity},
    services::providers::{TrackQuery, TrackSource},
};

/// Fewer candidates than this triggers fallback stages
pub const MIN_CANDIDATES: usize = 5;

pub const DEFAULT_POOL_LIMIT: usize = 50;

/// Handed out when every source comes back empty
const SAFE_DEFAULT_TRACKS: [(&str, &str, u64); 5] = [
    ("Blinding Lights", "The Weeknd", 1_000_000),
    ("Dance The Night", "Dua Lipa", 950_000),
    ("As It Was", "Harry Styles", 980_000),
    ("Cruel Summer", "Taylor Swift", 970_000),
    ("Flowers", "Miley Cyrus", 960_000),
];

pub fn safe_default_tracks() -> Vec<CandidateTrack> {
    SAFE_DEFAULT_TRACKS
        .iter()
        .map(|(title, artist, listeners)| {
            CandidateTrack::new(*title, *artist).with_popularity(Popularity::Score(*listeners))
        })
        .collect()
}

/// Ordered, de-duplicated, capped sequence of candidates
#[derive(Debug, Clone)]
pub struct CandidatePool {
    tracks: Vec<CandidateTrack>,
    seen: HashSet<TrackIdentity>,
    limit: usize,
}

impl CandidatePool {
    pub fn new(limit: usize) -> Self {
        Self {
            tracks: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    /// Appends unseen tracks in order until the pool is full.
    ///
    /// A track already in the pool is not added again, but `tags` are still
    /// recorded on the existing entry. Returns the number of tracks added.
    pub fn merge(
        &mut self,
        incoming: impl IntoIterator<Item = CandidateTrack>,
        tags: &[ProvenanceTag],
    ) -> usize {
        let mut added = 0;

        for mut track in incoming {
            let identity = track.identity();

            if self.seen.contains(&identity) {
                if let Some(existing) = self.tracks.iter_mut().find(|t| t.identity() == identity) {
                    existing.provenance_tags.extend(tags.iter().cloned());
                }
                continue;
            }

            if self.is_full() {
                break;
            }

            track.provenance_tags.extend(tags.iter().cloned());
            self.seen.insert(identity);
            self.tracks.push(track);
            added += 1;
        }

        added
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tracks.len() >= self.limit
    }

    pub fn tracks(&self) -> &[CandidateTrack] {
        &self.tracks
    }
}

/// When a stage is allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageGate {
    /// While the pool is below its limit
    UntilLimit,
    /// Only while the pool is below [`MIN_CANDIDATES`]
    BelowMinimum,
}

impl StageGate {
    fn is_open(&self, pool: &CandidatePool) -> bool {
        match self {
            StageGate::UntilLimit => !pool.is_full(),
            StageGate::BelowMinimum => pool.len() < MIN_CANDIDATES && !pool.is_full(),
        }
    }
}

/// One catalog query and the tags its results receive
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStep {
    pub query: TrackQuery,
    pub limit: usize,
    pub tags: Vec<ProvenanceTag>,
}

impl MergeStep {
    fn new(query: TrackQuery, limit: usize) -> Self {
        Self {
            query,
            limit,
            tags: Vec::new(),
        }
    }

    fn tagged(mut self, tag: ProvenanceTag) -> Self {
        self.tags.push(tag);
        self
    }
}

/// Steps fetched concurrently and merged in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStage {
    pub gate: StageGate,
    pub steps: Vec<MergeStep>,
}

impl MergeStage {
    fn single(gate: StageGate, step: MergeStep) -> Self {
        Self {
            gate,
            steps: vec![step],
        }
    }
}

/// Gathers candidates for a filter set from the track sources
pub struct ContextBuilder {
    source: Arc<dyn TrackSource>,
    reference_year: i32,
}

impl ContextBuilder {
    pub fn new(source: Arc<dyn TrackSource>) -> Self {
        Self {
            source,
            reference_year: chrono::Utc::now().year(),
        }
    }

    /// Year used for recency queries ("2025 new music")
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Ordered merge plan for the filters
    pub fn plan(&self, filters: &FilterSet, limit: usize) -> Vec<MergeStage> {
        if filters.is_latest_releases() {
            self.latest_releases_plan(filters, limit)
        } else {
            self.catalog_plan(filters, limit)
        }
    }

    /// Recency-capable sources only; every result is tagged as a recent release
    fn latest_releases_plan(&self, filters: &FilterSet, limit: usize) -> Vec<MergeStage> {
        let half = (limit / 2).max(1);
        let year = self.reference_year;
        let recent = ProvenanceTag::RecentRelease;
        let mut stages = vec![MergeStage::single(
            StageGate::UntilLimit,
            MergeStep::new(TrackQuery::search(format!("{} new music", year)), half)
                .tagged(recent.clone()),
        )];

        if let Some(genre) = &filters.genre {
            stages.push(MergeStage::single(
                StageGate::UntilLimit,
                MergeStep::new(
                    TrackQuery::search(format!("{} {} music new releases", genre, year)),
                    half,
                )
                .tagged(recent.clone()),
            ));
        }

        stages.push(MergeStage::single(
            StageGate::UntilLimit,
            MergeStep::new(
                TrackQuery::NewReleases {
                    genre: filters.genre.clone(),
                },
                limit,
            )
            .tagged(recent.clone()),
        ));

        if let Some(genre) = &filters.genre {
            stages.push(MergeStage::single(
                StageGate::BelowMinimum,
                MergeStep::new(
                    TrackQuery::Genre {
                        genre: genre.clone(),
                        era: None,
                    },
                    limit,
                )
                .tagged(recent.clone())
                .tagged(ProvenanceTag::GenreMatch),
            ));
        }

        stages.push(MergeStage::single(
            StageGate::BelowMinimum,
            MergeStep::new(TrackQuery::search(format!("{} new music", year - 1)), limit)
                .tagged(recent),
        ));

        stages
    }

    /// Genre, subgenre, mood and era queries fetched together, then the tag chart
    fn catalog_plan(&self, filters: &FilterSet, limit: usize) -> Vec<MergeStage> {
        let half = (limit / 2).max(1);
        let era = filters.era_qualifier();
        let with_era = |base: String| match &era {
            Some(era) => format!("{} {}", base, era),
            None => base,
        };

        let mut steps = Vec::new();

        if let Some(genre) = &filters.genre {
            steps.push(
                MergeStep::new(
                    TrackQuery::Genre {
                        genre: genre.clone(),
                        era: era.clone(),
                    },
                    half,
                )
                .tagged(ProvenanceTag::GenreMatch),
            );
        }
        if let Some(subgenre) = &filters.subgenre {
            steps.push(MergeStep::new(TrackQuery::search(with_era(subgenre.clone())), half));
        }
        if let Some(mood) = &filters.mood {
            steps.push(MergeStep::new(
                TrackQuery::search(with_era(format!("{} music", mood))),
                half,
            ));
        }
        if let Some(era) = &era {
            let query = match &filters.genre {
                Some(genre) => format!("{} {} music", genre, era),
                None => format!("{} music", era),
            };
            steps.push(MergeStep::new(TrackQuery::search(query), half));
        }

        if let (Some(label), Some(_)) = (&filters.era, &era) {
            for step in &mut steps {
                step.tags.push(ProvenanceTag::Era(label.clone()));
            }
        }

        let mut stages = Vec::new();
        if !steps.is_empty() {
            stages.push(MergeStage {
                gate: StageGate::UntilLimit,
                steps,
            });
        }

        let tag = filters
            .genre
            .clone()
            .or_else(|| filters.subgenre.clone())
            .or_else(|| filters.mood.clone());
        stages.push(MergeStage::single(
            StageGate::BelowMinimum,
            MergeStep::new(TrackQuery::TagChart { tag }, limit),
        ));

        stages
    }

    /// Runs the plan and returns a pool of at least one and at most `limit` tracks
    pub async fn build_context(&self, filters: &FilterSet, limit: usize) -> CandidatePool {
        let limit = limit.max(1);
        let mut pool = CandidatePool::new(limit);

        for (index, stage) in self.plan(filters, limit).into_iter().enumerate() {
            if !stage.gate.is_open(&pool) {
                tracing::debug!(stage = index, gate = ?stage.gate, pool = pool.len(), "Skipping stage");
                continue;
            }

            let results = self.run_stage(&stage).await;

            for (step, tracks) in stage.steps.iter().zip(results) {
                let fetched = tracks.len();
                let added = pool.merge(tracks, &step.tags);
                tracing::info!(
                    query = %step.query,
                    fetched,
                    added,
                    pool = pool.len(),
                    "Merged step"
                );
            }
        }

        if pool.is_empty() {
            tracing::warn!(
                genre = filters.genre.as_deref().unwrap_or("any"),
                era = filters.era.as_deref().unwrap_or("any"),
                "No candidates from any source, using safe defaults"
            );
            pool.merge(safe_default_tracks(), &[]);
        } else if pool.len() < MIN_CANDIDATES {
            tracing::warn!(pool = pool.len(), minimum = MIN_CANDIDATES, "Candidate pool below minimum");
        }

        tracing::info!(
            genre = filters.genre.as_deref().unwrap_or("any"),
            era = filters.era.as_deref().unwrap_or("any"),
            tracks = pool.len(),
            "Candidate pool built"
        );

        pool
    }

    /// Fetches every step of a stage concurrently; results keep step order
    async fn run_stage(&self, stage: &MergeStage) -> Vec<Vec<CandidateTrack>> {
        let mut tasks = Vec::new();

        for step in &stage.steps {
            let source = self.source.clone();
            let query = step.query.clone();
            let limit = step.limit;
            tasks.push(tokio::spawn(async move { source.fetch(&query, limit).await }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(tracks) => results.push(tracks),
                Err(e) => {
                    tracing::error!(error = %e, "Source task join error");
                    results.push(Vec::new());
                }
            }
        }

        results
    }
}
