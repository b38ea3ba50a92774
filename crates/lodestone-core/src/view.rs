//! View-state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LodestoneError, Result};
use crate::session::AuthFlowKind;

/// Which flow the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Home,
    Login,
    Register,
    Files,
    Search,
}

impl ViewState {
    pub const ALL: [ViewState; 5] = [
        ViewState::Home,
        ViewState::Login,
        ViewState::Register,
        ViewState::Files,
        ViewState::Search,
    ];

    /// Views that can only be entered with a resolved identity.
    pub fn requires_session(self) -> bool {
        matches!(self, ViewState::Files | ViewState::Search)
    }

    /// The authentication form this view shows, if any.
    pub fn auth_flow_kind(self) -> Option<AuthFlowKind> {
        match self {
            ViewState::Login => Some(AuthFlowKind::Login),
            ViewState::Register => Some(AuthFlowKind::Register),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Home => "home",
            ViewState::Login => "login",
            ViewState::Register => "register",
            ViewState::Files => "files",
            ViewState::Search => "search",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewState {
    type Err = LodestoneError;

    fn from_str(s: &str) -> Result<Self> {
        ViewState::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LodestoneError::validation(format!("Unknown view '{}'", s)))
    }
}

/// Side effect the caller must run after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    None,
    RefreshFiles,
}

/// Finite-state router over [`ViewState`].
///
/// Transitions are user-initiated, except that logout always lands on `Home`.
/// No state is terminal.
#[derive(Debug, Clone, Default)]
pub struct ViewController {
    current: ViewState,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ViewState {
        self.current
    }

    /// Moves to `target`.
    ///
    /// # Errors
    ///
    /// Returns `Auth` and stays on the current view when `target` needs a
    /// session and `authenticated` is false.
    pub fn navigate(&mut self, target: ViewState, authenticated: bool) -> Result<ViewEffect> {
        if target.requires_session() && !authenticated {
            return Err(LodestoneError::auth(format!("Sign in to access {}", target)));
        }

        tracing::debug!(from = %self.current, to = %target, "view transition");
        self.current = target;

        Ok(match target {
            ViewState::Files => ViewEffect::RefreshFiles,
            _ => ViewEffect::None,
        })
    }

    /// Forced transition on logout.
    pub fn on_logout(&mut self) {
        self.current = ViewState::Home;
    }

    /// Return to `Home` after a successful sign-in or registration.
    pub fn on_authenticated(&mut self) {
        self.current = ViewState::Home;
    }

    /// Switches between the sign-in and sign-up forms.
    ///
    /// Has no effect outside the two authentication views.
    pub fn toggle_auth_flow(&mut self) -> ViewState {
        self.current = match self.current {
            ViewState::Login => ViewState::Register,
            ViewState::Register => ViewState::Login,
            other => other,
        };
        self.current
    }
}
