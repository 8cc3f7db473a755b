//! Persisted user profile: settings, favourite places and recent searches.
//!
//! The engine only reads units from here; everything else is kept for the
//! presentation layer.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{fs, sync::Mutex};

use crate::{config::project_dirs, geocoding::Place, request::UnitSystem};

pub const MAX_FAVOURITES: usize = 20;
pub const MAX_SEARCHES: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Maximum number of favourites reached ({limit})")]
    FavouritesFull { limit: usize },

    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub units: UnitSystem,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favourite {
    pub id_api: i64,
    pub city: String,
    pub country_code: String,
}

impl Favourite {
    pub fn from_place(place: &Place) -> Self {
        Self {
            id_api: place.id,
            city: place.name.clone(),
            country_code: place.country_code.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id_api: i64,
    pub city: String,
    pub country_code: String,
}

impl RecentSearch {
    pub fn from_place(place: &Place) -> Self {
        Self {
            id_api: place.id,
            city: place.name.clone(),
            country_code: place.country_code.clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync + Debug {
    async fn settings(&self) -> Settings;

    async fn set_units(&self, units: UnitSystem) -> Result<(), StoreError>;

    async fn set_theme(&self, theme: Theme) -> Result<(), StoreError>;

    async fn favourites(&self) -> Vec<Favourite>;

    /// Insert or replace by `id_api`. Fails without writing anything if the
    /// new entries would push the list past [`MAX_FAVOURITES`].
    async fn upsert_favourites(&self, favourites: Vec<Favourite>) -> Result<(), StoreError>;

    /// Remove the entry matching all three fields. Returns whether one existed.
    async fn delete_favourite(
        &self,
        city: &str,
        country_code: &str,
        id_api: i64,
    ) -> Result<bool, StoreError>;

    async fn count_favourites(&self) -> usize;

    async fn searches(&self) -> Vec<RecentSearch>;

    /// Insert or replace by `id_api`. Skipped (returns `false`) once more
    /// than [`MAX_SEARCHES`] entries are held; the check runs before the
    /// write, so a full history still takes one more batch.
    async fn upsert_searches(&self, searches: Vec<RecentSearch>) -> Result<bool, StoreError>;

    async fn delete_search(
        &self,
        city: &str,
        country_code: &str,
        id_api: i64,
    ) -> Result<bool, StoreError>;

    async fn count_searches(&self) -> usize;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Profile {
    #[serde(default)]
    settings: Settings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    favourites: Vec<Favourite>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    searches: Vec<RecentSearch>,
}

/// Replace the entry with the same id, or append.
fn upsert_by_id<T>(list: &mut Vec<T>, item: T, id: impl Fn(&T) -> i64) {
    let key = id(&item);
    match list.iter_mut().find(|held| id(held) == key) {
        Some(held) => *held = item,
        None => list.push(item),
    }
}

/// [`ProfileStore`] kept in a single TOML file.
///
/// Every mutation rewrites the file before the in-memory copy is updated, so
/// a failed write leaves both unchanged.
#[derive(Debug)]
pub struct TomlProfileStore {
    path: PathBuf,
    profile: Mutex<Profile>,
}

impl TomlProfileStore {
    /// Open `profile.toml` in the platform data directory.
    pub async fn open() -> anyhow::Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    pub async fn open_at(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let profile = if fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check profile file: {}", path.display()))?
        {
            let contents = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse profile file: {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "no profile file, starting empty");
            Profile::default()
        };

        Ok(Self {
            path,
            profile: Mutex::new(profile),
        })
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("profile.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, profile: &Profile) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create profile directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(profile).context("Failed to serialize profile to TOML")?;
        fs::write(&self.path, toml)
            .await
            .with_context(|| format!("Failed to write profile file: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }

    /// Apply `change` to a copy, persist it, then publish it.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut Profile) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.profile.lock().await;
        let mut next = guard.clone();
        let out = change(&mut next)?;

        if next != *guard {
            self.persist(&next).await?;
            *guard = next;
        }
        Ok(out)
    }
}

#[async_trait]
impl ProfileStore for TomlProfileStore {
    async fn settings(&self) -> Settings {
        self.profile.lock().await.settings
    }

    async fn set_units(&self, units: UnitSystem) -> Result<(), StoreError> {
        self.update(|p| {
            p.settings.units = units;
            Ok(())
        })
        .await
    }

    async fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.update(|p| {
            p.settings.theme = theme;
            Ok(())
        })
        .await
    }

    async fn favourites(&self) -> Vec<Favourite> {
        self.profile.lock().await.favourites.clone()
    }

    async fn upsert_favourites(&self, favourites: Vec<Favourite>) -> Result<(), StoreError> {
        self.update(|p| {
            for favourite in favourites {
                upsert_by_id(&mut p.favourites, favourite, |f| f.id_api);
            }
            if p.favourites.len() > MAX_FAVOURITES {
                tracing::warn!(limit = MAX_FAVOURITES, "favourites limit reached");
                return Err(StoreError::FavouritesFull {
                    limit: MAX_FAVOURITES,
                });
            }
            Ok(())
        })
        .await
    }

    async fn delete_favourite(
        &self,
        city: &str,
        country_code: &str,
        id_api: i64,
    ) -> Result<bool, StoreError> {
        self.update(|p| {
            let before = p.favourites.len();
            p.favourites.retain(|f| {
                !(f.city == city && f.country_code == country_code && f.id_api == id_api)
            });
            Ok(p.favourites.len() != before)
        })
        .await
    }

    async fn count_favourites(&self) -> usize {
        self.profile.lock().await.favourites.len()
    }

    async fn searches(&self) -> Vec<RecentSearch> {
        self.profile.lock().await.searches.clone()
    }

    async fn upsert_searches(&self, searches: Vec<RecentSearch>) -> Result<bool, StoreError> {
        self.update(|p| {
            if p.searches.len() > MAX_SEARCHES {
                tracing::debug!(limit = MAX_SEARCHES, "search history full, skipping");
                return Ok(false);
            }
            for search in searches {
                upsert_by_id(&mut p.searches, search, |s| s.id_api);
            }
            Ok(true)
        })
        .await
    }

    async fn delete_search(
        &self,
        city: &str,
        country_code: &str,
        id_api: i64,
    ) -> Result<bool, StoreError> {
        self.update(|p| {
            let before = p.searches.len();
            p.searches.retain(|s| {
                !(s.city == city && s.country_code == country_code && s.id_api == id_api)
            });
            Ok(p.searches.len() != before)
        })
        .await
    }

    async fn count_searches(&self) -> usize {
        self.profile.lock().await.searches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favourite(id: i64, city: &str) -> Favourite {
        Favourite {
            id_api: id,
            city: city.to_string(),
            country_code: "DE".to_string(),
        }
    }

    fn search(id: i64, city: &str) -> RecentSearch {
        RecentSearch {
            id_api: id,
            city: city.to_string(),
            country_code: "FR".to_string(),
        }
    }

    async fn fresh_store(dir: &tempfile::TempDir) -> TomlProfileStore {
        TomlProfileStore::open_at(dir.path().join("profile.toml"))
            .await
            .expect("open store")
    }

    #[tokio::test]
    async fn missing_file_yields_default_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = fresh_store(&dir).await;

        let settings = store.settings().await;
        assert_eq!(settings.units, UnitSystem::Metric);
        assert_eq!(settings.theme, Theme::System);
        assert_eq!(store.count_favourites().await, 0);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn settings_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = fresh_store(&dir).await;

        store.set_units(UnitSystem::Imperial).await.expect("set units");
        store.set_theme(Theme::Dark).await.expect("set theme");
        drop(store);

        let reopened = fresh_store(&dir).await;
        assert_eq!(
            reopened.settings().await,
            Settings {
                units: UnitSystem::Imperial,
                theme: Theme::Dark
            }
        );
    }

    #[tokio::test]
    async fn favourites_upsert_replaces_by_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = fresh_store(&dir).await;

        store
            .upsert_favourites(vec![favourite(1, "Berlin"), favourite(2, "Hamburg")])
            .await
            .expect("insert");
        store
            .upsert_favourites(vec![favourite(1, "Berlin-Mitte")])
            .await
            .expect("replace");

        let all = store.favourites().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].city, "Berlin-Mitte");
    }

    #[tokio::test]
    async fn favourites_cap_rejects_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = fresh_store(&dir).await;

        let full: Vec<Favourite> = (0..MAX_FAVOURITES as i64)
            .map(|id| favourite(id, "Town"))
            .collect();
        store.upsert_favourites(full).await.expect("fill to cap");

        let err = store
            .upsert_favourites(vec![favourite(999, "Overflow")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Maximum number of favourites reached"));
        assert_eq!(store.count_favourites().await, MAX_FAVOURITES);

        // replacing an existing entry at the cap is still fine
        store
            .upsert_favourites(vec![favourite(3, "Renamed")])
            .await
            .expect("replace at cap");
    }

    #[tokio::test]
    async fn delete_requires_all_fields_to_match() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = fresh_store(&dir).await;
        store
            .upsert_favourites(vec![favourite(7, "Munich")])
            .await
            .expect("insert");

        assert!(!store.delete_favourite("Munich", "AT", 7).await.expect("delete"));
        assert!(store.delete_favourite("Munich", "DE", 7).await.expect("delete"));
        assert_eq!(store.count_favourites().await, 0);
    }

    #[tokio::test]
    async fn searches_are_skipped_once_over_the_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = fresh_store(&dir).await;

        let history: Vec<RecentSearch> = (0..MAX_SEARCHES as i64)
            .map(|id| search(id, "Paris"))
            .collect();
        assert!(store.upsert_searches(history).await.expect("fill"));

        // exactly at the limit still accepts a batch
        assert!(store.upsert_searches(vec![search(100, "Lyon")]).await.expect("at limit"));
        assert_eq!(store.count_searches().await, MAX_SEARCHES + 1);

        assert!(!store.upsert_searches(vec![search(101, "Nice")]).await.expect("skip"));
        assert_eq!(store.count_searches().await, MAX_SEARCHES + 1);

        assert!(store.delete_search("Paris", "FR", 0).await.expect("delete"));
        assert!(store.upsert_searches(vec![search(101, "Nice")]).await.expect("room again"));
        assert_eq!(store.searches().await.last().map(|s| s.id_api), Some(101));
    }

    #[test]
    fn records_are_built_from_places() {
        let mut place = Place::new(2988507, "Paris", 48.85, 2.35);
        place.country_code = Some("FR".into());

        assert_eq!(
            Favourite::from_place(&place),
            Favourite {
                id_api: 2988507,
                city: "Paris".into(),
                country_code: "FR".into(),
            }
        );
        assert_eq!(RecentSearch::from_place(&Place::unselected()).country_code, "");
    }

    #[tokio::test]
    async fn malformed_profile_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, "[settings]\nunits = 42\n").expect("write profile");

        let err = TomlProfileStore::open_at(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse profile file"));
    }
}
