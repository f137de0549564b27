//! Fuzzy prefix search over a catalogue of named entities, backed by a
//! q-gram index and bounded prefix edit distance.

pub mod entity;
pub mod error;
pub mod index;
pub mod merge;
pub mod ped;
pub mod search;
pub mod tokenizer;

pub type EntityId = u32;

pub use entity::{Catalogue, Entity};
pub use error::{IndexError, Result};
pub use index::{IndexConfig, IndexStats, Posting, QGramIndex};
pub use search::{default_delta, rank_matches, Match, SearchResult, DEFAULT_TOP_K};
