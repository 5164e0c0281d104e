//! HomeContent — the loading gate in front of the carousel and popular grid.
//!
//! Every mount starts a new generation: wait the artificial loading delay,
//! probe the catalog once, then flip to ready. A failed probe leaves an error
//! message behind but still flips to ready, so the children render it.

use std::time::Duration;

use anime_proto::{CatalogClient, CatalogError};
use tracing::{debug, info, warn};

pub const HOME_TITLE: &str = "Welcome to the Anime Schedule App!";
pub const HOME_ERROR: &str = "Failed to load anime.";

#[derive(Debug, Default)]
pub struct HomeContent {
    generation: Option<u64>,
    ready: bool,
    error: Option<String>,
}

impl HomeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, generation: u64) {
        debug!("home: mount generation {}", generation);
        self.generation = Some(generation);
        self.ready = false;
        self.error = None;
    }

    pub fn unmount(&mut self) {
        self.generation = None;
        self.ready = false;
        self.error = None;
    }

    /// Apply the probe outcome for `generation`. Returns false when the
    /// outcome belongs to a mount that is gone.
    pub fn on_ready(&mut self, generation: u64, probe: Result<(), CatalogError>) -> bool {
        if self.generation != Some(generation) || self.ready {
            debug!("home: discarding probe for generation {}", generation);
            return false;
        }
        match probe {
            Ok(()) => info!("home: catalog reachable"),
            Err(e) => {
                warn!("home: probe failed: {}", e);
                self.error = Some(HOME_ERROR.to_string());
            }
        }
        self.ready = true;
        true
    }

    #[cfg(test)]
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Background half of a Home mount: minimum loading time, then one probe.
pub async fn run_activation(client: CatalogClient, delay: Duration) -> Result<(), CatalogError> {
    tokio::time::sleep(delay).await;
    client.probe().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> CatalogClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        CatalogClient::new(format!("http://127.0.0.1:{}", port))
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_before_delay() {
        let delay = Duration::from_millis(2500);
        let early = tokio::time::timeout(
            delay - Duration::from_millis(1),
            run_activation(unreachable_client(), delay),
        )
        .await;
        assert!(early.is_err(), "activation finished before the loading delay");
    }

    #[tokio::test]
    async fn test_failed_probe_sets_error_and_ready() {
        let mut home = HomeContent::new();
        home.mount(3);
        assert!(!home.is_ready());

        let probe = run_activation(unreachable_client(), Duration::ZERO).await;
        assert!(probe.is_err());
        assert!(home.on_ready(3, probe));
        assert!(home.is_ready());
        assert_eq!(home.error(), Some(HOME_ERROR));
    }

    #[test]
    fn test_successful_probe_has_no_error() {
        let mut home = HomeContent::new();
        home.mount(1);
        assert!(home.on_ready(1, Ok(())));
        assert!(home.is_ready());
        assert!(home.error().is_none());
    }

    #[test]
    fn test_probe_for_old_mount_is_discarded() {
        let mut home = HomeContent::new();
        home.mount(1);
        home.unmount();
        home.mount(2);
        assert!(!home.on_ready(1, Ok(())));
        assert!(!home.is_ready());
        assert_eq!(home.generation(), Some(2));

        home.unmount();
        assert!(!home.on_ready(2, Ok(())));
    }
}
