//! Read-only hero reference list, loaded from a `heroes.json` file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

/// A single hero entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: u32,
    /// Internal name, e.g. `npc_dota_hero_antimage`.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
}

impl Hero {
    /// Display name: the localized name when present, otherwise the internal
    /// name with the `npc_dota_hero_` prefix stripped.
    pub fn display_name(&self) -> &str {
        if let Some(localized) = self.localized_name.as_deref() {
            return localized;
        }
        self.name
            .strip_prefix("npc_dota_hero_")
            .unwrap_or(&self.name)
    }
}

/// Accepted on-disk shapes: the `GetHeroes` response or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum HeroFile {
    Api { result: HeroesResult },
    Plain(Vec<Hero>),
}

#[derive(Deserialize)]
struct HeroesResult {
    heroes: Vec<Hero>,
}

/// Ordered list of known heroes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroList {
    heroes: Vec<Hero>,
}

impl HeroList {
    /// Parse a hero list from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let heroes = match serde_json::from_str::<HeroFile>(content)? {
            HeroFile::Api { result } => result.heroes,
            HeroFile::Plain(heroes) => heroes,
        };
        Ok(Self { heroes })
    }

    /// Load a hero list from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MatchError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::from_json_str(&content)?;
        if list.is_empty() {
            tracing::warn!("Hero list {} is empty", path.display());
        }
        Ok(list)
    }

    pub fn get(&self, id: u32) -> Option<&Hero> {
        self.heroes.iter().find(|h| h.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter()
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}
