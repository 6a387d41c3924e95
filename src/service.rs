//! Request-level operations
//!
//! [`TrackerService`] is built once at startup and shared by the API and
//! CLI. It owns the link store, snapshot cache, scraper and identity
//! resolver, and never branches on which link backend is active.

use chrono::Utc;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::{IdentityResolver, Leaderboard, LeaderboardPage, Stat};
use crate::error::TrackerError;
use crate::models::{LinkListing, LinkRecord, ProfileSnapshot};
use crate::scraper::{parse_profile_url, ProfileScraper};
use crate::store::{open_link_store, LinkStore, SnapshotCache};

pub struct TrackerService {
    links: Arc<dyn LinkStore>,
    snapshots: SnapshotCache,
    scraper: ProfileScraper,
    resolver: Arc<dyn IdentityResolver>,
}

impl TrackerService {
    pub fn new(
        links: Arc<dyn LinkStore>,
        snapshots: SnapshotCache,
        scraper: ProfileScraper,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            links,
            snapshots,
            scraper,
            resolver,
        }
    }

    /// Wire up every component from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, TrackerError> {
        let links = open_link_store(&config.storage)?;
        let snapshots = SnapshotCache::open(config.storage.snapshots_path())?;
        let scraper = ProfileScraper::new(config.scraper.clone(), &config.selector_table()?)?;
        let resolver = config.identity_resolver()?;

        tracing::info!(
            "Tracker service ready (links: {}, snapshots: {:?})",
            links.backend_name(),
            snapshots.path()
        );

        Ok(Self::new(links, snapshots, scraper, resolver))
    }

    pub fn link_backend(&self) -> &'static str {
        self.links.backend_name()
    }

    /// Self-service link; refuses to overwrite an existing link
    pub fn link(&self, user_id: &str, profile_url: &str) -> Result<LinkRecord, TrackerError> {
        let (platform, player_id) = parse_profile_url(profile_url)?;
        if !self.links.put_if_absent(user_id, &platform, &player_id)? {
            return Err(TrackerError::AlreadyLinked {
                user_id: user_id.to_string(),
            });
        }

        tracing::info!("Linked {} to {}/{}", user_id, platform, player_id);
        Ok(LinkRecord::new(user_id, platform, player_id))
    }

    /// Admin link; replaces whatever the user had
    pub fn force_link(&self, user_id: &str, profile_url: &str) -> Result<LinkRecord, TrackerError> {
        let (platform, player_id) = parse_profile_url(profile_url)?;
        self.links.put(user_id, &platform, &player_id)?;

        tracing::info!("Linked {} to {}/{}", user_id, platform, player_id);
        Ok(LinkRecord::new(user_id, platform, player_id))
    }

    /// Returns whether a link was removed. Cached snapshots are kept.
    pub fn unlink(&self, user_id: &str) -> Result<bool, TrackerError> {
        let removed = self.links.delete(user_id)?;
        tracing::info!("Unlink {}: {}", user_id, if removed { "removed" } else { "no link" });
        Ok(removed)
    }

    pub fn clear_links(&self) -> Result<(), TrackerError> {
        self.links.clear()?;
        tracing::warn!("All linked profiles cleared");
        Ok(())
    }

    /// Every link with a display name; unknown users get a placeholder
    pub fn list_links(&self) -> Result<Vec<LinkListing>, TrackerError> {
        Ok(self
            .links
            .list()?
            .into_iter()
            .map(|record| LinkListing {
                display_name: self
                    .resolver
                    .display_name(&record.user_id)
                    .unwrap_or_else(|| format!("UnknownUser ({})", record.user_id)),
                record,
            })
            .collect())
    }

    /// Re-scrape the user's linked profile and cache the result
    pub async fn refresh(
        &self,
        user_id: &str,
        mode: Option<&str>,
    ) -> Result<ProfileSnapshot, TrackerError> {
        let (platform, player_id) =
            self.links
                .get(user_id)?
                .ok_or_else(|| TrackerError::LinkNotFound {
                    user_id: user_id.to_string(),
                })?;

        let profile = self.scraper.extract(&platform, &player_id, mode).await?;
        tracing::info!(
            "Refreshed {} ({}/{}): {} [{}]",
            user_id,
            platform,
            player_id,
            profile.name,
            profile.stats.rank
        );

        let snapshot = profile.into_snapshot(user_id, &platform, &player_id, Utc::now());
        self.snapshots.upsert(user_id, &snapshot)?;
        Ok(snapshot)
    }

    /// Last cached snapshot, without scraping
    pub fn cached(&self, user_id: &str) -> Result<ProfileSnapshot, TrackerError> {
        self.snapshots
            .get(user_id)?
            .ok_or_else(|| TrackerError::SnapshotNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Rank cached snapshots by `stat` and return one page
    pub fn leaderboard(
        &self,
        stat: &str,
        page: usize,
        per_page: usize,
    ) -> Result<LeaderboardPage, TrackerError> {
        let stat = stat.parse::<Stat>().map_err(|stat| TrackerError::UnsupportedStat {
            stat,
            supported: Stat::ALL
                .iter()
                .map(|s| s.key())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

        let snapshots = self.snapshots.get_all()?;
        let board = Leaderboard::build(stat, &snapshots, self.resolver.as_ref());
        tracing::info!(
            "Leaderboard {}: {} of {} cached profiles ranked",
            stat,
            board.len(),
            snapshots.len()
        );

        Ok(board.page(page, per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Passthrough, UserDirectory};
    use crate::scraper::{
        FixtureRenderer, PageRenderer, ScraperConfig, SelectorTable, UnreachableRenderer,
    };
    use crate::store::JsonLinkStore;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const PROFILE_HTML: &str = include_str!("../tests/fixtures/profile.html");
    const URL: &str = "https://www.rematchtracker.com/player/steam/76561198000000000";

    fn service_with(
        dir: &TempDir,
        renderer: Arc<dyn PageRenderer>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> TrackerService {
        let links = Arc::new(JsonLinkStore::open(dir.path().join("links.json")).unwrap());
        let snapshots = SnapshotCache::open(dir.path().join("cache.json")).unwrap();
        let scraper = ProfileScraper::with_renderer(
            ScraperConfig::default(),
            &SelectorTable::default(),
            renderer,
        )
        .unwrap();
        TrackerService::new(links, snapshots, scraper, resolver)
    }

    fn service(dir: &TempDir) -> TrackerService {
        service_with(
            dir,
            Arc::new(FixtureRenderer::new(PROFILE_HTML)),
            Arc::new(Passthrough),
        )
    }

    #[test]
    fn test_link_then_relink_requires_force() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        let record = service.link("u1", URL).unwrap();
        assert_eq!(record.platform, "steam");
        assert_eq!(record.player_id, "76561198000000000");

        let err = service
            .link("u1", "https://www.rematchtracker.com/player/psn/other")
            .unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyLinked { .. }));

        service
            .force_link("u1", "https://www.rematchtracker.com/player/psn/other")
            .unwrap();
        let links = service.list_links().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].record.platform, "psn");
    }

    #[test]
    fn test_concurrent_self_links_keep_first() {
        let dir = TempDir::new().unwrap();
        let service = Arc::new(service(&dir));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let handles: Vec<_> = ["steam/AAA", "psn/BBB"]
            .into_iter()
            .map(|target| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    service.link(
                        "u1",
                        &format!("https://www.rematchtracker.com/player/{}", target),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TrackerError::AlreadyLinked { .. }))));

        let links = service.list_links().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].record, *winners[0]);
    }

    #[test]
    fn test_cached_without_refresh() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.link("u1", URL).unwrap();

        let err = service.cached("u1").unwrap_err();
        assert!(matches!(err, TrackerError::SnapshotNotFound { .. }));
        assert_eq!(err.code(), "snapshot_not_found");
    }

    #[test]
    fn test_link_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let err = service(&dir).link("u1", "https://u.gg/rematch").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidProfileUrl(_)));
    }

    #[test]
    fn test_list_links_names_unknown_users() {
        let dir = TempDir::new().unwrap();
        let mut names = HashMap::new();
        names.insert("u1".to_string(), "Alice".to_string());
        let service = service_with(
            &dir,
            Arc::new(FixtureRenderer::new(PROFILE_HTML)),
            Arc::new(UserDirectory::new(names)),
        );

        service.force_link("u1", URL).unwrap();
        service.force_link("u2", URL).unwrap();

        let names: Vec<_> = service
            .list_links()
            .unwrap()
            .into_iter()
            .map(|l| l.display_name)
            .collect();
        assert_eq!(names, vec!["Alice", "UnknownUser (u2)"]);
    }

    #[tokio::test]
    async fn test_refresh_without_link() {
        let dir = TempDir::new().unwrap();
        let err = service(&dir).refresh("nobody", None).await.unwrap_err();
        assert!(matches!(err, TrackerError::LinkNotFound { .. }));
    }

    #[tokio::test]
    async fn test_refresh_caches_snapshot() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.link("u1", URL).unwrap();

        let snapshot = service.refresh("u1", None).await.unwrap();
        assert_eq!(snapshot.user_id, "u1");
        assert_eq!(snapshot.stats.rank, "Diamond");
        assert_eq!(snapshot.stats.wins, "1,204");

        let cached = service.cached("u1").unwrap();
        assert_eq!(cached.stats, snapshot.stats);
        assert_eq!(cached.player_id, "76561198000000000");
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        service(&dir).link("u1", URL).unwrap();
        service(&dir).refresh("u1", None).await.unwrap();

        let offline = service_with(&dir, Arc::new(UnreachableRenderer), Arc::new(Passthrough));
        let err = offline.refresh("u1", None).await.unwrap_err();
        assert!(matches!(err, TrackerError::Acquisition(_)));
        assert_eq!(offline.cached("u1").unwrap().stats.rank, "Diamond");
    }

    #[tokio::test]
    async fn test_unlink_keeps_snapshot() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.link("u1", URL).unwrap();
        service.refresh("u1", None).await.unwrap();

        assert!(service.unlink("u1").unwrap());
        assert!(!service.unlink("u1").unwrap());
        assert!(service.cached("u1").is_ok());

        let page = service.leaderboard("wins", 1, 10).unwrap();
        assert_eq!(page.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_leaderboard_over_refreshed_profiles() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.link("u1", URL).unwrap();
        service.link("u2", URL).unwrap();
        service.refresh("u1", None).await.unwrap();
        service.refresh("u2", None).await.unwrap();

        let page = service.leaderboard("win%", 1, 10).unwrap();
        assert_eq!(page.stat, Stat::WinPercent);
        assert_eq!(page.entries.len(), 2);
        // 1204 / (1204 + 876)
        assert_eq!(page.entries[0].display_value, "57.9%");
        // Equal keys keep cache order
        assert_eq!(page.entries[0].user_id, "u1");
    }

    #[test]
    fn test_leaderboard_unsupported_stat() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        // A corrupt cache would fail the read; the stat check must come first
        std::fs::write(dir.path().join("cache.json"), "garbage").unwrap();

        let err = service.leaderboard("mvps", 1, 10).unwrap_err();
        match err {
            TrackerError::UnsupportedStat { stat, supported } => {
                assert_eq!(stat, "mvps");
                assert!(supported.contains("win-percent"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_clear_links() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.link("u1", URL).unwrap();
        service.link("u2", URL).unwrap();

        service.clear_links().unwrap();
        assert!(service.list_links().unwrap().is_empty());
    }
}
