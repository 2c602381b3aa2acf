//! View container
//!
//! Holds the current view and sidebar flag, owns the metrics ticker and
//! watches the session. When the session ends every piece of dependent state
//! is discarded: the ticker stops, the metrics window empties and the view
//! state resets.

use crate::config::DashboardConfig;
use crate::error::ConsoleError;
use crate::metrics::{spawn_ticker, MetricsWindow, TickerHandle};
use console_security::{Role, SessionEvent, SessionStore};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Console panels reachable from the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    /// Overview with the live graph
    #[default]
    Dashboard,
    /// Compute nodes
    Compute,
    /// Storage pools
    Storage,
    /// Security alerts
    Sentinel,
    /// Usage analytics
    Analytics,
    /// Team membership
    TeamManagement,
    /// Billing and invoices
    Billing,
    /// Account settings and API keys
    Settings,
}

impl View {
    /// Sidebar order
    pub const ALL: [View; 8] = [
        View::Dashboard,
        View::Compute,
        View::Storage,
        View::Sentinel,
        View::Analytics,
        View::TeamManagement,
        View::Billing,
        View::Settings,
    ];

    /// Sidebar label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Compute => "Compute",
            View::Storage => "Storage",
            View::Sentinel => "Sentinel",
            View::Analytics => "Analytics",
            View::TeamManagement => "Team Management",
            View::Billing => "Billing",
            View::Settings => "Settings",
        }
    }

    /// Minimum role allowed to open the view
    #[must_use]
    pub fn required_role(self) -> Role {
        match self {
            View::Sentinel | View::Billing | View::TeamManagement => Role::Administrator,
            View::Compute | View::Storage | View::Settings => Role::Developer,
            View::Dashboard | View::Analytics => Role::Viewer,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Presentation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsoleState {
    /// Visible panel
    pub view: View,
    /// Whether the mobile sidebar is expanded
    pub sidebar_open: bool,
}

/// Running console bound to one session
pub struct Console {
    session: Arc<SessionStore>,
    state: Arc<Mutex<ConsoleState>>,
    metrics: MetricsWindow,
    ticker: Arc<Mutex<Option<TickerHandle>>>,
    watcher: JoinHandle<()>,
}

impl Console {
    /// Open the console for the active session
    ///
    /// # Errors
    /// - `ConsoleError::NotAuthenticated` when no session is active
    pub fn open(session: Arc<SessionStore>, dashboard: DashboardConfig) -> Result<Self, ConsoleError> {
        // Subscribe before checking so an end racing with open is not missed.
        let events = session.subscribe();
        if !session.is_authenticated() {
            return Err(ConsoleError::NotAuthenticated);
        }

        let state = Arc::new(Mutex::new(ConsoleState::default()));
        let metrics = MetricsWindow::seeded(dashboard.window);
        let ticker = Arc::new(Mutex::new(Some(spawn_ticker(
            metrics.clone(),
            dashboard.tick_interval(),
        ))));

        let watcher = tokio::spawn(watch_session(
            events,
            Arc::clone(&state),
            metrics.clone(),
            Arc::clone(&ticker),
        ));

        info!(window = dashboard.window, "console opened");
        Ok(Self {
            session,
            state,
            metrics,
            ticker,
            watcher,
        })
    }

    /// Switch to `view` and collapse the sidebar
    ///
    /// # Errors
    /// - `ConsoleError::NotAuthenticated` after the session ended
    /// - `ConsoleError::Forbidden` when the active role is too low
    pub fn navigate(&self, view: View) -> Result<(), ConsoleError> {
        if !self.session.is_authenticated() {
            return Err(ConsoleError::NotAuthenticated);
        }
        let required = view.required_role();
        if !self.session.has_permission(required) {
            return Err(ConsoleError::Forbidden {
                view: view.label(),
                required,
            });
        }

        let mut state = self.state.lock();
        state.view = view;
        state.sidebar_open = false;
        debug!(view = view.label(), "navigated");
        Ok(())
    }

    /// Flip the sidebar flag and return the new value
    pub fn toggle_sidebar(&self) -> bool {
        let mut state = self.state.lock();
        state.sidebar_open = !state.sidebar_open;
        state.sidebar_open
    }

    /// Current presentation flags
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        *self.state.lock()
    }

    /// Live metrics window
    #[must_use]
    pub fn metrics(&self) -> &MetricsWindow {
        &self.metrics
    }

    /// Whether the metrics ticker is still running
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Views the active role may open
    #[must_use]
    pub fn available_views(&self) -> Vec<View> {
        View::ALL
            .into_iter()
            .filter(|view| self.session.has_permission(view.required_role()))
            .collect()
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.watcher.abort();
        self.ticker.lock().take();
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("state", &self.state())
            .field("samples", &self.metrics.len())
            .finish_non_exhaustive()
    }
}

async fn watch_session(
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
    state: Arc<Mutex<ConsoleState>>,
    metrics: MetricsWindow,
    ticker: Arc<Mutex<Option<TickerHandle>>>,
) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Ended { reason, .. }) => {
                metrics.close();
                ticker.lock().take();
                *state.lock() = ConsoleState::default();
                info!(?reason, "session ended, console state discarded");
                return;
            }
            Ok(SessionEvent::Established { .. }) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_security::{Identity, Token};
    use std::time::Duration;

    fn fast_dashboard() -> DashboardConfig {
        DashboardConfig {
            tick_interval_ms: 10,
            window: 6,
        }
    }

    fn developer_session() -> Arc<SessionStore> {
        Arc::new(SessionStore::with_session(
            Identity::new("USR-007", "Dev", "dev@mk-multiverse.io", Role::Developer),
            Token::new("dev-token").unwrap(),
        ))
    }

    #[test]
    fn view_labels_and_roles() {
        assert_eq!(View::TeamManagement.label(), "Team Management");
        assert_eq!(View::Sentinel.required_role(), Role::Administrator);
        assert_eq!(View::Billing.required_role(), Role::Administrator);
        assert_eq!(View::Settings.required_role(), Role::Developer);
        assert_eq!(View::Compute.required_role(), Role::Developer);
        assert_eq!(View::Analytics.required_role(), Role::Viewer);
        assert_eq!(View::default(), View::Dashboard);
    }

    #[tokio::test]
    async fn open_requires_session() {
        let err = Console::open(Arc::new(SessionStore::new()), fast_dashboard()).unwrap_err();
        assert!(matches!(err, ConsoleError::NotAuthenticated));
    }

    #[tokio::test]
    async fn navigate_closes_sidebar() {
        let console = Console::open(Arc::new(SessionStore::demo()), fast_dashboard()).unwrap();

        assert!(console.toggle_sidebar());
        console.navigate(View::Settings).unwrap();

        assert_eq!(
            console.state(),
            ConsoleState {
                view: View::Settings,
                sidebar_open: false
            }
        );
    }

    #[tokio::test]
    async fn developer_cannot_open_billing() {
        let console = Console::open(developer_session(), fast_dashboard()).unwrap();

        console.navigate(View::Settings).unwrap();
        console.navigate(View::Compute).unwrap();
        let err = console.navigate(View::Billing).unwrap_err();

        assert!(matches!(
            err,
            ConsoleError::Forbidden {
                required: Role::Administrator,
                ..
            }
        ));
        assert_eq!(console.state().view, View::Compute);
        assert_eq!(
            console.available_views(),
            vec![
                View::Dashboard,
                View::Compute,
                View::Storage,
                View::Analytics,
                View::Settings
            ]
        );
    }

    #[tokio::test]
    async fn new_identity_discards_previous_state() {
        let session = Arc::new(SessionStore::demo());
        let console = Console::open(Arc::clone(&session), fast_dashboard()).unwrap();
        console.navigate(View::Billing).unwrap();

        session.establish(
            Identity::new("USR-002", "Viewer", "viewer@mk-multiverse.io", Role::Viewer),
            Token::new("viewer-token").unwrap(),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(session.is_authenticated());
        assert!(!console.is_live());
        assert!(console.metrics().is_empty());
        assert_eq!(console.state(), ConsoleState::default());
        assert!(matches!(
            console.navigate(View::Billing),
            Err(ConsoleError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn logout_discards_console_state() {
        let session = Arc::new(SessionStore::demo());
        let console = Console::open(Arc::clone(&session), fast_dashboard()).unwrap();
        console.navigate(View::Billing).unwrap();
        console.toggle_sidebar();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(console.is_live());

        session.logout();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(!console.is_live());
        assert!(console.metrics().is_empty());
        assert_eq!(console.state(), ConsoleState::default());
        assert!(matches!(
            console.navigate(View::Dashboard),
            Err(ConsoleError::NotAuthenticated)
        ));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(console.metrics().is_empty());
    }
}
