//! Built-in catalog of symptom tags.
//!
//! Daily logs store symptoms as free-form tags. Known symptoms (and their
//! common aliases) are normalized to one canonical tag so that "Cramping",
//! "cramps" and "period pain" end up as the same entry.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

/// A known symptom with its display name and accepted aliases
#[derive(Clone, Debug)]
pub struct Symptom {
    pub tag: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

/// The symptom catalog, indexed by canonical tag and alias
#[derive(Clone, Debug)]
pub struct SymptomCatalog {
    symptoms: Vec<Symptom>,
    lookup: HashMap<String, usize>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<SymptomCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static SymptomCatalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of known symptoms
pub fn build_default_catalog() -> SymptomCatalog {
    SymptomCatalog::new(vec![
        Symptom {
            tag: "cramps",
            name: "Cramps",
            aliases: &["cramping", "period_pain"],
        },
        Symptom {
            tag: "headache",
            name: "Headache",
            aliases: &["migraine"],
        },
        Symptom {
            tag: "bloating",
            name: "Bloating",
            aliases: &["bloated"],
        },
        Symptom {
            tag: "fatigue",
            name: "Fatigue",
            aliases: &["tired", "tiredness", "low_energy"],
        },
        Symptom {
            tag: "breast_tenderness",
            name: "Breast tenderness",
            aliases: &["tender_breasts"],
        },
        Symptom {
            tag: "acne",
            name: "Acne",
            aliases: &["breakout", "spots"],
        },
        Symptom {
            tag: "mood_swings",
            name: "Mood swings",
            aliases: &["moody", "irritability", "irritable"],
        },
        Symptom {
            tag: "back_pain",
            name: "Back pain",
            aliases: &["backache", "lower_back_pain"],
        },
        Symptom {
            tag: "nausea",
            name: "Nausea",
            aliases: &["nauseous"],
        },
        Symptom {
            tag: "cravings",
            name: "Cravings",
            aliases: &["food_cravings"],
        },
        Symptom {
            tag: "insomnia",
            name: "Insomnia",
            aliases: &["poor_sleep", "sleeplessness"],
        },
    ])
}

/// Lowercase, trim and snake_case a raw tag
fn slug(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl SymptomCatalog {
    pub fn new(symptoms: Vec<Symptom>) -> Self {
        let mut lookup = HashMap::new();
        for (idx, symptom) in symptoms.iter().enumerate() {
            lookup.insert(symptom.tag.to_string(), idx);
            for alias in symptom.aliases {
                lookup.insert(slug(alias), idx);
            }
        }
        Self { symptoms, lookup }
    }

    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    pub fn get(&self, tag: &str) -> Option<&Symptom> {
        self.lookup.get(&slug(tag)).map(|idx| &self.symptoms[*idx])
    }

    /// Canonical tag for a user-entered symptom
    ///
    /// Unknown symptoms are kept as custom tags in slug form.
    pub fn normalize(&self, raw: &str) -> Result<String> {
        let slugged = slug(raw);
        if slugged.is_empty() {
            return Err(Error::Validation("symptom tag cannot be empty".into()));
        }

        match self.lookup.get(&slugged) {
            Some(idx) => Ok(self.symptoms[*idx].tag.to_string()),
            None => {
                tracing::debug!("Keeping custom symptom tag '{}'", slugged);
                Ok(slugged)
            }
        }
    }

    /// Normalize a batch of tags, collapsing duplicates
    pub fn normalize_all<'a, I>(&self, raw: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        raw.into_iter().map(|tag| self.normalize(tag)).collect()
    }

    /// Validate catalog integrity: returns a list of problems found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen: HashMap<String, &str> = HashMap::new();

        for symptom in &self.symptoms {
            if slug(symptom.tag) != symptom.tag {
                errors.push(format!("Tag '{}' is not in canonical form", symptom.tag));
            }
            for key in std::iter::once(symptom.tag).chain(symptom.aliases.iter().copied()) {
                if let Some(owner) = seen.insert(slug(key), symptom.tag) {
                    if owner != symptom.tag {
                        errors.push(format!(
                            "'{}' maps to both '{}' and '{}'",
                            key, owner, symptom.tag
                        ));
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_validates() {
        let errors = default_catalog().validate();
        assert!(errors.is_empty(), "Catalog errors: {:?}", errors);
    }

    #[test]
    fn test_aliases_normalize_to_canonical_tag() {
        let catalog = default_catalog();
        assert_eq!(catalog.normalize("Cramping").unwrap(), "cramps");
        assert_eq!(catalog.normalize("period pain").unwrap(), "cramps");
        assert_eq!(catalog.normalize("  Lower-Back pain ").unwrap(), "back_pain");
    }

    #[test]
    fn test_unknown_symptom_kept_as_custom_tag() {
        let catalog = default_catalog();
        assert_eq!(catalog.normalize("Hot Flashes").unwrap(), "hot_flashes");
        assert!(catalog.get("hot_flashes").is_none());
    }

    #[test]
    fn test_empty_symptom_rejected() {
        assert!(default_catalog().normalize("   ").is_err());
    }

    #[test]
    fn test_normalize_all_collapses_duplicates() {
        let raw = vec!["cramps".to_string(), "Cramping".to_string(), "tired".to_string()];
        let tags = default_catalog().normalize_all(&raw).unwrap();

        assert_eq!(tags.len(), 2);
        assert!(tags.contains("cramps"));
        assert!(tags.contains("fatigue"));
    }

    #[test]
    fn test_conflicting_alias_detected() {
        let catalog = SymptomCatalog::new(vec![
            Symptom {
                tag: "a",
                name: "A",
                aliases: &["shared"],
            },
            Symptom {
                tag: "b",
                name: "B",
                aliases: &["shared"],
            },
        ]);
        assert_eq!(catalog.validate().len(), 1);
    }
}
