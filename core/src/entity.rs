use crate::tokenizer::normalize;
use crate::EntityId;
use serde::Serialize;

/// One catalogue row. Query-derived state (PED, matched synonym) lives in
/// [`crate::search::Match`], never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Popularity weight, only used to break ranking ties.
    pub score: u32,
    pub description: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikidata_id: Option<String>,
    pub synonyms: Vec<String>,
}

impl Entity {
    /// Parse a tab-separated row
    /// `name \t score \t description \t wikipedia_url \t wikidata_id \t syn1;syn2;...`.
    ///
    /// Missing trailing fields take their defaults. Returns `None` when the
    /// name is absent or normalizes to the empty string.
    pub fn parse_row(id: EntityId, line: &str) -> Option<Entity> {
        let mut parts = line.trim_end_matches(['\r', '\n']).split('\t');

        let name = parts.next().unwrap_or_default();
        if normalize(name).is_empty() {
            return None;
        }

        let score = match parts.next() {
            None => 0,
            Some(raw) if raw.trim().is_empty() => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(id, raw, "score is not a non-negative integer, using 0");
                0
            }),
        };
        let description = optional(parts.next());
        let wikipedia_url = optional(parts.next());
        let wikidata_id = optional(parts.next());
        let synonyms = parts
            .next()
            .map(|field| {
                field
                    .split(';')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Entity {
            id,
            name: name.to_string(),
            score,
            description,
            wikipedia_url,
            wikidata_id,
            synonyms,
        })
    }
}

fn optional(field: Option<&str>) -> Option<String> {
    field.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Append-only list of entities, ordered by ascending id.
///
/// Ids follow source line numbers, so skipped rows leave gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    entities: Vec<Entity>,
}

impl Catalogue {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn push(&mut self, entity: Entity) {
        debug_assert!(self.entities.last().map_or(true, |last| last.id < entity.id));
        self.entities.push(entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|pos| &self.entities[pos])
    }

    pub fn len(&self) -> usize { self.entities.len() }

    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_row() {
        let e = Entity::parse_row(
            7,
            "Freiburg\t42\tcity in Germany\thttps://en.wikipedia.org/wiki/Freiburg\tQ2833\tFreiburg im Breisgau;Friburgo",
        )
        .unwrap();
        assert_eq!(e.id, 7);
        assert_eq!(e.name, "Freiburg");
        assert_eq!(e.score, 42);
        assert_eq!(e.description.as_deref(), Some("city in Germany"));
        assert_eq!(e.wikidata_id.as_deref(), Some("Q2833"));
        assert_eq!(e.synonyms, vec!["Freiburg im Breisgau", "Friburgo"]);
    }

    #[test]
    fn missing_trailing_fields_default() {
        let e = Entity::parse_row(1, "Bern").unwrap();
        assert_eq!(e.score, 0);
        assert!(e.description.is_none());
        assert!(e.wikipedia_url.is_none());
        assert!(e.synonyms.is_empty());

        let e = Entity::parse_row(2, "Bern\t\t\t\t\t").unwrap();
        assert_eq!(e.score, 0);
        assert!(e.synonyms.is_empty());
    }

    #[test]
    fn bad_score_defaults_to_zero() {
        let e = Entity::parse_row(1, "Bern\tmany").unwrap();
        assert_eq!(e.score, 0);
        let e = Entity::parse_row(1, "Bern\t-3").unwrap();
        assert_eq!(e.score, 0);
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(Entity::parse_row(1, "").is_none());
        assert!(Entity::parse_row(1, "\t10\tdesc").is_none());
        assert!(Entity::parse_row(1, " ?! \t10").is_none());
    }

    #[test]
    fn catalogue_lookup_by_sparse_id() {
        let mut c = Catalogue::new();
        c.push(Entity::parse_row(1, "Berlin").unwrap());
        c.push(Entity::parse_row(3, "Bern").unwrap());
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(3).map(|e| e.name.as_str()), Some("Bern"));
        assert!(c.get(2).is_none());
        assert!(c.get(0).is_none());
    }
}
