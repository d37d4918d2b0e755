use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::config::Difficulty;

static PASSAGE_DIR: Dir = include_dir!("passages");

#[derive(Deserialize, Clone, Debug)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub difficulty: Difficulty,
}

#[derive(Deserialize, Debug)]
pub struct PassageSet {
    pub category: String,
    pub language: String,
    pub passages: Vec<Passage>,
}

/// Immutable source text plus metadata, fixed for the lifetime of a session.
#[derive(Clone, Debug)]
pub struct SourceText {
    pub id: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub text: String,
}

impl SourceText {
    pub fn custom(text: String) -> Self {
        Self {
            id: "custom".to_string(),
            category: "custom".to_string(),
            difficulty: Difficulty::Medium,
            language: "english".to_string(),
            text,
        }
    }
}

/// Embedded passage library the source-text provider draws from.
#[derive(Debug)]
pub struct Library {
    sets: Vec<PassageSet>,
}

impl Library {
    pub fn load() -> Self {
        let sets = PASSAGE_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
            .map(|f| {
                let raw = f
                    .contents_utf8()
                    .expect("Unable to interpret passage file as a string");
                serde_json::from_str(raw).expect("Unable to deserialize passage json")
            })
            .collect();
        Self { sets }
    }

    pub fn categories(&self) -> Vec<&str> {
        self.sets.iter().map(|s| s.category.as_str()).collect()
    }

    /// Pick a random passage matching the filters. None when nothing matches.
    pub fn pick(
        &self,
        category: Option<&str>,
        difficulty: Option<Difficulty>,
        rng: &mut impl Rng,
    ) -> Option<SourceText> {
        let candidates: Vec<(&PassageSet, &Passage)> = self
            .sets
            .iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .flat_map(|s| s.passages.iter().map(move |p| (s, p)))
            .filter(|(_, p)| difficulty.map_or(true, |d| p.difficulty == d))
            .collect();

        candidates.choose(rng).map(|(set, passage)| SourceText {
            id: passage.id.clone(),
            category: set.category.clone(),
            difficulty: passage.difficulty,
            language: set.language.clone(),
            text: passage.text.clone(),
        })
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_library_loads_embedded_sets() {
        let lib = Library::load();
        assert!(!lib.categories().is_empty());
        for set in &lib.sets {
            assert!(!set.passages.is_empty());
            assert_eq!(set.language, "english");
        }
    }

    #[test]
    fn test_pick_any() {
        let lib = Library::load();
        let mut rng = StdRng::seed_from_u64(7);
        let src = lib.pick(None, None, &mut rng).unwrap();
        assert!(!src.text.is_empty());
        assert!(!src.id.is_empty());
    }

    #[test]
    fn test_pick_respects_category() {
        let lib = Library::load();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let src = lib.pick(Some("quotes"), None, &mut rng).unwrap();
            assert_eq!(src.category, "quotes");
        }
    }

    #[test]
    fn test_pick_respects_difficulty() {
        let lib = Library::load();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let src = lib.pick(None, Some(Difficulty::Easy), &mut rng).unwrap();
            assert_eq!(src.difficulty, Difficulty::Easy);
        }
    }

    #[test]
    fn test_pick_unknown_category_is_none() {
        let lib = Library::load();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(lib.pick(Some("klingon"), None, &mut rng).is_none());
    }

    #[test]
    fn test_passage_texts_are_single_spaced() {
        // word navigation assumes single spaces between words
        let lib = Library::load();
        for set in &lib.sets {
            for p in &set.passages {
                assert!(!p.text.contains("  "), "double space in {}", p.id);
                assert!(!p.text.contains('\n'), "newline in {}", p.id);
                assert!(!p.text.starts_with(' ') && !p.text.ends_with(' '));
            }
        }
    }

    #[test]
    fn test_custom_source_text() {
        let src = SourceText::custom("hello world".into());
        assert_eq!(src.id, "custom");
        assert_eq!(src.text, "hello world");
    }
}
