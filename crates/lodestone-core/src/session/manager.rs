//! Session lifecycle: sign-in, registration, profile resolution and logout.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::model::{Credential, LoginRequest, RegisterRequest, Session, TokenResponse, User};
use super::store::CredentialStore;
use crate::api::{ApiGateway, HttpMethod, RequestBody, endpoints};
use crate::error::{LodestoneError, Result};

/// Message surfaced for every rejected sign-in.
pub const LOGIN_FAILED: &str = "Login failed";

/// Refusal returned when signing in over an existing session.
pub const ALREADY_SIGNED_IN: &str = "Already signed in; log out before switching accounts";

/// Owns the credential and the resolved identity.
///
/// `SessionManager` is responsible for:
/// - Signing in and registering
/// - Resolving the identity behind a credential
/// - Persisting the credential and restoring it on startup
/// - Tearing the session down on logout or validation failure
///
/// The session lock is held only to read or replace the state, never across
/// a network call, so overlapping operations are not serialized.
pub struct SessionManager {
    gateway: Arc<ApiGateway>,
    store: Arc<dyn CredentialStore>,
    session: RwLock<Session>,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(gateway: Arc<ApiGateway>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            gateway,
            store,
            session: RwLock::new(Session::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Restores a persisted credential and validates it.
    ///
    /// Returns the resolved user, or `None` when no credential was stored or
    /// the stored one was rejected (in which case the store is cleared).
    pub async fn restore(&self) -> Option<User> {
        let credential = match self.store.load().await {
            Ok(Some(credential)) => credential,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted credential");
                return None;
            }
        };

        tracing::debug!("restoring persisted credential");
        *self.session.write().await = Session::pending(credential);

        match self.fetch_profile().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "session restored");
                Some(user)
            }
            Err(_) => None,
        }
    }

    /// Signs in with form-encoded credentials and resolves the profile.
    ///
    /// # Errors
    ///
    /// - `Auth` if a credential is already held, or the service rejected the
    ///   sign-in. The session is left unchanged.
    /// - `Network` if the request could not be completed.
    pub async fn login(&self, request: &LoginRequest) -> Result<User> {
        self.ensure_signed_out().await?;

        let token: TokenResponse = self
            .gateway
            .call_json(
                endpoints::LOGIN,
                HttpMethod::Post,
                RequestBody::Form(request.form_fields()),
                None,
            )
            .await
            .map_err(|e| match e {
                LodestoneError::Network(_) => e,
                other => {
                    tracing::debug!(username = %request.username, error = %other, "sign-in rejected");
                    LodestoneError::auth(LOGIN_FAILED)
                }
            })?;

        self.establish(Credential::new(token.access_token)).await
    }

    /// Creates an account, then signs in with the same username and password.
    ///
    /// If the account is created but the follow-up sign-in fails, the
    /// account exists and no session is held. No retry is attempted.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.ensure_signed_out().await?;

        self.gateway
            .call(
                endpoints::REGISTER,
                HttpMethod::Post,
                RequestBody::json(request)?,
                None,
            )
            .await?;
        tracing::info!(username = %request.username, "account created");

        self.login(&request.login_request()).await
    }

    /// Resolves the identity behind the held credential.
    ///
    /// Any failure is fatal to the session: the credential that was used is
    /// dropped from memory and from the store, and `Auth` is returned.
    pub async fn fetch_profile(&self) -> Result<User> {
        let Some(credential) = self.credential().await else {
            self.logout().await;
            return Err(LodestoneError::auth("Not signed in"));
        };

        let result = self
            .gateway
            .call_json::<User>(endpoints::PROFILE, HttpMethod::Get, RequestBody::Empty, Some(&credential))
            .await;

        match result {
            Ok(user) => {
                let mut session = self.session.write().await;
                // A logout or account switch may have happened while the request was in flight.
                if session.credential.as_ref() != Some(&credential) {
                    return Err(LodestoneError::auth("Session changed while resolving profile"));
                }
                session.identity = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    tracing::info!(error = %e, "credential rejected by the service; ending session");
                } else {
                    tracing::warn!(error = %e, "failed to fetch user profile; ending session");
                }
                self.invalidate(&credential).await;
                Err(LodestoneError::auth(format!("Session is no longer valid: {}", e.user_message())))
            }
        }
    }

    /// Clears the credential and identity from memory and storage.
    ///
    /// Idempotent. A storage failure is logged and does not keep the session alive.
    pub async fn logout(&self) {
        let had_session = {
            let mut session = self.session.write().await;
            let had_session = session.credential.is_some();
            *session = Session::default();
            if had_session {
                self.generation.fetch_add(1, Ordering::SeqCst);
            }
            had_session
        };

        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "failed to clear persisted credential");
        }

        if had_session {
            tracing::info!("signed out");
        }
    }

    /// Counts sessions torn down so far.
    ///
    /// Bumped whenever a held credential is dropped, whether by logout or by
    /// a failed profile fetch. Callers compare values taken before and after
    /// an operation to learn that the session ended underneath it.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.session.read().await.credential.clone()
    }

    pub async fn identity(&self) -> Option<User> {
        self.session.read().await.identity.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    async fn ensure_signed_out(&self) -> Result<()> {
        if self.session.read().await.credential.is_some() {
            return Err(LodestoneError::auth(ALREADY_SIGNED_IN));
        }
        Ok(())
    }

    async fn establish(&self, credential: Credential) -> Result<User> {
        *self.session.write().await = Session::pending(credential.clone());

        if let Err(e) = self.store.save(&credential).await {
            tracing::warn!(error = %e, "failed to persist credential; session will not survive a restart");
        }

        let user = self.fetch_profile().await?;
        tracing::info!(username = %user.username, "signed in");
        Ok(user)
    }

    /// Ends the session only if it still holds `credential`.
    async fn invalidate(&self, credential: &Credential) {
        let still_current = self.session.read().await.credential.as_ref() == Some(credential);
        if still_current {
            self.logout().await;
        }
    }
}
