use crate::entity::{Catalogue, Entity};
use crate::error::{IndexError, Result};
use crate::tokenizer::qgrams;
use crate::EntityId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

/// Build-time settings of a [`QGramIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Length of the q-grams; must be at least 1.
    pub q: usize,
    /// Also index (and later match against) entity synonyms.
    pub with_synonyms: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { q: 3, with_synonyms: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub entity_id: EntityId,
    /// Occurrences of the q-gram in the entity's indexed names.
    pub frequency: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entities: usize,
    pub qgrams: usize,
    pub postings: usize,
}

/// Q-gram index over an entity catalogue. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QGramIndex {
    pub(crate) config: IndexConfig,
    pub(crate) inverted_lists: BTreeMap<String, Vec<Posting>>, // postings sorted by entity_id
    pub(crate) catalogue: Catalogue,
}

impl QGramIndex {
    /// Build from a catalogue file. The first line is a header and is skipped.
    pub fn build_from_file<P: AsRef<Path>>(config: IndexConfig, path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |source| IndexError::Load { path: path.to_path_buf(), source };
        let file = File::open(path).map_err(load_err)?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            lines.push(line.map_err(load_err)?);
        }
        Self::from_rows(config, lines)
    }

    /// Build from any line source. Read failures abort the build.
    pub fn build_from_reader<R: BufRead>(config: IndexConfig, reader: R) -> Result<Self> {
        let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
        Self::from_rows(config, lines)
    }

    /// Build from in-memory rows, the first of which is a header.
    ///
    /// Row `k` (1-based, header excluded) gets entity id `k`. Rows whose name
    /// is empty after normalization are skipped but still consume their id.
    pub fn from_rows<I, S>(config: IndexConfig, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if config.q == 0 {
            return Err(IndexError::InvalidQ(config.q));
        }
        let start = Instant::now();
        let mut index = QGramIndex { config, inverted_lists: BTreeMap::new(), catalogue: Catalogue::new() };

        let mut skipped = 0usize;
        for (line_no, row) in rows.into_iter().skip(1).enumerate() {
            let entity_id = line_no as EntityId + 1;
            match Entity::parse_row(entity_id, row.as_ref()) {
                Some(entity) => index.add_entity(entity),
                None => skipped += 1,
            }
        }

        let stats = index.stats();
        tracing::info!(
            entities = stats.entities,
            skipped,
            qgrams = stats.qgrams,
            postings = stats.postings,
            q = config.q,
            with_synonyms = config.with_synonyms,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built q-gram index"
        );
        Ok(index)
    }

    // All q-grams of one entity are added before the next entity, so an
    // entity's postings are always at the tail of each list it touches.
    fn add_entity(&mut self, entity: Entity) {
        self.add_qgrams(entity.id, &entity.name);
        if self.config.with_synonyms {
            for synonym in &entity.synonyms {
                self.add_qgrams(entity.id, synonym);
            }
        }
        self.catalogue.push(entity);
    }

    fn add_qgrams(&mut self, entity_id: EntityId, text: &str) {
        for gram in qgrams(text, self.config.q) {
            let list = self.inverted_lists.entry(gram).or_default();
            if let Some(last) = list.last_mut() {
                if last.entity_id == entity_id {
                    last.frequency += 1;
                    continue;
                }
                debug_assert!(last.entity_id < entity_id);
            }
            list.push(Posting { entity_id, frequency: 1 });
        }
    }

    pub fn config(&self) -> IndexConfig { self.config }

    pub fn catalogue(&self) -> &Catalogue { &self.catalogue }

    pub fn inverted_list(&self, gram: &str) -> Option<&[Posting]> {
        self.inverted_lists.get(gram).map(Vec::as_slice)
    }

    /// Inverted lists in lexicographic q-gram order.
    pub fn qgrams(&self) -> impl Iterator<Item = (&str, &[Posting])> {
        self.inverted_lists.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entities: self.catalogue.len(),
            qgrams: self.inverted_lists.len(),
            postings: self.inverted_lists.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: &[&str] = &[
        "name\tscore\tdescription\twikipedia\twikidata\tsynonyms",
        "frei\t3",
        "brei\t2",
    ];

    fn render(index: &QGramIndex) -> String {
        index
            .qgrams()
            .map(|(gram, list)| {
                let ids: Vec<String> = list.iter().map(|p| format!("{}:{}", p.entity_id, p.frequency)).collect();
                format!("{gram}=[{}]", ids.join(", "))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn builds_sorted_lists() {
        let index = QGramIndex::from_rows(IndexConfig::default(), ROWS).unwrap();
        assert_eq!(
            render(&index),
            "$$b=[2:1] $$f=[1:1] $br=[2:1] $fr=[1:1] bre=[2:1] ei$=[1:1, 2:1] fre=[1:1] i$$=[1:1, 2:1] rei=[1:1, 2:1]"
        );
        assert_eq!(index.stats(), IndexStats { entities: 2, qgrams: 9, postings: 12 });
    }

    #[test]
    fn repeated_qgrams_accumulate_frequency() {
        let index = QGramIndex::from_rows(IndexConfig { q: 2, with_synonyms: false }, ["h", "anana"]).unwrap();
        assert_eq!(index.inverted_list("an"), Some(&[Posting { entity_id: 1, frequency: 2 }][..]));
        assert_eq!(index.inverted_list("na"), Some(&[Posting { entity_id: 1, frequency: 2 }][..]));
    }

    #[test]
    fn synonyms_share_the_entity_posting() {
        let rows = ["h", "Munich\t5\t\t\t\tMünchen;Monaco"];
        let plain = QGramIndex::from_rows(IndexConfig::default(), rows).unwrap();
        assert!(plain.inverted_list("mon").is_none());

        let with = QGramIndex::from_rows(IndexConfig { q: 3, with_synonyms: true }, rows).unwrap();
        assert_eq!(with.inverted_list("mon"), Some(&[Posting { entity_id: 1, frequency: 1 }][..]));
        // "$$m" from the name and both synonyms
        assert_eq!(with.inverted_list("$$m"), Some(&[Posting { entity_id: 1, frequency: 3 }][..]));
    }

    #[test]
    fn skipped_rows_keep_line_numbering() {
        let rows = ["h", "Berlin\t10", "\t99", "!!!\t5", "Bern\t20"];
        let index = QGramIndex::from_rows(IndexConfig::default(), rows).unwrap();
        let ids: Vec<EntityId> = index.catalogue().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(index.catalogue().get(4).unwrap().name, "Bern");
        assert!(index.inverted_list("$$$").is_none());
    }

    #[test]
    fn build_is_deterministic() {
        let rows = ["h", "Berlin\t10\t\t\t\tBärlin", "Bern\t20", "Bremen\t5"];
        let config = IndexConfig { q: 3, with_synonyms: true };
        let a = QGramIndex::from_rows(config, rows).unwrap();
        let b = QGramIndex::from_rows(config, rows).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_zero_q() {
        let err = QGramIndex::from_rows(IndexConfig { q: 0, with_synonyms: false }, ["h"]).unwrap_err();
        assert!(matches!(err, IndexError::InvalidQ(0)));
    }

    #[test]
    fn header_only_builds_empty_index() {
        let index = QGramIndex::from_rows(IndexConfig::default(), ["h"]).unwrap();
        assert_eq!(index.stats(), IndexStats { entities: 0, qgrams: 0, postings: 0 });
        let empty: [&str; 0] = [];
        assert!(QGramIndex::from_rows(IndexConfig::default(), empty).unwrap().catalogue().is_empty());
    }
}
