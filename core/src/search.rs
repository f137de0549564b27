//! Fuzzy prefix search over a built [`QGramIndex`].
//!
//! Candidates come from merging the inverted lists of the query's q-grams.
//! Only candidates sharing at least `|x| - q * delta` q-grams with the query
//! `x` can be within `delta` edits, so only those get a PED computation.

use crate::entity::Entity;
use crate::error::{IndexError, Result};
use crate::index::{Posting, QGramIndex};
use crate::merge::merge_all;
use crate::ped::prefix_edit_distance;
use crate::tokenizer::{normalize, prefix_qgrams};
use serde::Serialize;

/// Number of results the bundled front ends display.
pub const DEFAULT_TOP_K: usize = 5;

/// Error budget used when the caller does not pick one: a quarter of the query length.
pub fn default_delta(normalized_query: &str) -> usize {
    normalized_query.chars().count() / 4
}

/// An entity matched by one query, with the query-scoped scoring result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Match<'a> {
    pub entity: &'a Entity,
    pub ped: usize,
    /// Set when the entity matched through a synonym rather than its name.
    pub matched_synonym: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult<'a> {
    /// Ranked by (PED ascending, score descending).
    pub matches: Vec<Match<'a>>,
    pub ped_computations: usize,
}

impl QGramIndex {
    /// Search with a caller-supplied budget, rejecting negative values.
    pub fn search(&self, raw_query: &str, delta: i64) -> Result<SearchResult<'_>> {
        let delta = usize::try_from(delta).map_err(|_| IndexError::InvalidDelta(delta))?;
        Ok(self.find_matches(raw_query, delta))
    }

    /// All entities whose name (or, with synonyms enabled, a synonym) has
    /// `PED(query, name) <= delta`, ranked.
    pub fn find_matches(&self, query: &str, delta: usize) -> SearchResult<'_> {
        let prefix = normalize(query);
        if prefix.is_empty() {
            return SearchResult::default();
        }
        let q = self.config.q;
        let threshold = prefix.chars().count().saturating_sub(q.saturating_mul(delta));

        let lists: Vec<&[Posting]> = prefix_qgrams(&prefix, q)
            .filter_map(|gram| self.inverted_list(&gram))
            .collect();
        let candidates = merge_all(&lists);

        let mut matches = Vec::new();
        let mut ped_computations = 0;
        for posting in candidates.iter().filter(|p| p.frequency as usize >= threshold) {
            let Some(entity) = self.catalogue.get(posting.entity_id) else {
                continue;
            };

            let ped = prefix_edit_distance(&prefix, &normalize(&entity.name), delta);
            ped_computations += 1;
            if ped <= delta {
                matches.push(Match { entity, ped, matched_synonym: None });
                continue;
            }

            if self.config.with_synonyms {
                let mut best: Option<(usize, &str)> = None;
                for synonym in &entity.synonyms {
                    let syn_ped = prefix_edit_distance(&prefix, &normalize(synonym), delta);
                    ped_computations += 1;
                    if syn_ped <= delta && best.map_or(true, |(b, _)| syn_ped < b) {
                        best = Some((syn_ped, synonym.as_str()));
                    }
                }
                if let Some((ped, synonym)) = best {
                    matches.push(Match { entity, ped, matched_synonym: Some(synonym) });
                }
            }
        }

        rank_matches(&mut matches);
        tracing::debug!(
            query = %prefix,
            delta,
            threshold,
            candidates = candidates.len(),
            matches = matches.len(),
            ped_computations,
            "fuzzy search"
        );
        SearchResult { matches, ped_computations }
    }
}

/// Stable sort by (PED ascending, score descending).
pub fn rank_matches(matches: &mut [Match<'_>]) {
    matches.sort_by(|a, b| a.ped.cmp(&b.ped).then_with(|| b.entity.score.cmp(&a.entity.score)));
}
