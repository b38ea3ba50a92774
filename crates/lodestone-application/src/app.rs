//! LodestoneApp - the facade presentation layers drive.

use lodestone_core::api::{ApiGateway, ApiTransport};
use lodestone_core::config::ClientConfig;
use lodestone_core::files::{BlobSink, DownloadedFile, FileRecord, FileRegistry, UploadFile};
use lodestone_core::search::{SearchController, SearchQuery, SearchResultSet};
use lodestone_core::session::{
    ALREADY_SIGNED_IN, AuthFlow, AuthFlowKind, Credential, CredentialStore, LOGIN_FAILED, SessionManager, User,
};
use lodestone_core::{ErrorState, LodestoneError, Result, ViewController, ViewEffect, ViewState};
use lodestone_infrastructure::{DirectoryBlobSink, FileCredentialStore, LodestonePaths, ReqwestTransport};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::snapshot::AppSnapshot;

pub const SIGN_IN_REQUIRED: &str = "Sign in to continue";

/// Coordinates the session, the view router and the two flows.
///
/// Every operation records a user-facing message in the shared
/// [`ErrorState`] on failure and also returns the error, so callers can
/// branch on it without having to render it.
///
/// # Session teardown
///
/// Logout and any failed profile re-validation clear the credential, the file
/// mirror and the search results together and land on [`ViewState::Home`].
/// Failures inside the file and search flows never reach session or view
/// state.
pub struct LodestoneApp {
    session: Arc<SessionManager>,
    files: FileRegistry,
    search: SearchController,
    errors: Arc<ErrorState>,
    views: RwLock<ViewController>,
    sink: Arc<dyn BlobSink>,
    in_flight: AtomicUsize,
}

/// Counts one in-flight request for [`AppSnapshot::busy`].
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LodestoneApp {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn BlobSink>,
    ) -> Self {
        let gateway = Arc::new(ApiGateway::new(transport));
        let errors = Arc::new(ErrorState::new());

        Self {
            session: Arc::new(SessionManager::new(gateway.clone(), store)),
            files: FileRegistry::new(gateway.clone(), errors.clone()),
            search: SearchController::new(gateway, errors.clone()),
            errors,
            views: RwLock::new(ViewController::new()),
            sink,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Builds the app over HTTP, the credential file and the download
    /// directory.
    pub fn from_config(config: &ClientConfig, paths: &LodestonePaths) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        let store = FileCredentialStore::new(paths)?;
        let download_dir = match &config.download_dir {
            Some(dir) => dir.clone(),
            None => paths.download_dir()?,
        };

        tracing::debug!(
            base_url = %transport.base_url(),
            download_dir = %download_dir.display(),
            "building Lodestone client"
        );

        Ok(Self::new(
            Arc::new(transport),
            Arc::new(store),
            Arc::new(DirectoryBlobSink::new(download_dir)),
        ))
    }

    /// Restores a persisted session, if one validates.
    pub async fn start(&self) -> Option<User> {
        self.session.restore().await
    }

    /// Moves to `view`.
    ///
    /// While a credential is held it is re-validated first; if that fails
    /// the session ends and the app lands on `Home`. Entering `Files`
    /// re-fetches the listing.
    pub async fn navigate(&self, view: ViewState) -> Result<ViewEffect> {
        if self.session.credential().await.is_some()
            && let Err(e) = self.session.fetch_profile().await
        {
            self.end_session().await;
            self.errors.set(e.user_message()).await;
            return Err(e);
        }

        let authenticated = self.session.is_authenticated().await;
        let transition = self.views.write().await.navigate(view, authenticated);

        let effect = match transition {
            Ok(effect) => effect,
            Err(e) => {
                self.errors.set(e.user_message()).await;
                return Err(e);
            }
        };

        if effect == ViewEffect::RefreshFiles
            && let Some(credential) = self.session.credential().await
        {
            // A failed refresh is recorded by the registry; the transition stands.
            let _ = self.files.refresh(&credential).await;
        }

        Ok(effect)
    }

    /// Switches between the sign-in and sign-up forms.
    pub async fn toggle_auth_flow(&self) -> ViewState {
        self.views.write().await.toggle_auth_flow()
    }

    /// Runs a sign-in or registration.
    ///
    /// On success the app returns to `Home`. On failure the user stays on the
    /// form and sees `"Login failed"` for a rejected sign-in, or the error's
    /// own message otherwise. If the credential was issued but the profile
    /// fetch rejected it, the session is torn down and the app lands on
    /// `Home`.
    pub async fn submit_auth(&self, flow: AuthFlow) -> Result<User> {
        let _busy = BusyGuard::enter(&self.in_flight);
        self.errors.clear().await;

        let kind = flow.kind();
        let generation = self.session.generation();
        tracing::debug!(flow = ?kind, "submitting credentials");

        let result = match &flow {
            AuthFlow::Login(request) => self.session.login(request).await,
            AuthFlow::Register(request) => self.session.register(request).await,
        };

        match result {
            Ok(user) => {
                self.views.write().await.on_authenticated();
                Ok(user)
            }
            Err(e) => {
                if self.session.generation() != generation {
                    self.end_session().await;
                }
                self.errors.set(auth_failure_message(kind, &e)).await;
                Err(e)
            }
        }
    }

    /// Signs out and forgets everything fetched under the session.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.end_session().await;
    }

    /// Re-fetches the file listing.
    pub async fn refresh_files(&self) -> Result<()> {
        let credential = self.require_identity().await?;
        self.files.refresh(&credential).await
    }

    /// Uploads `file` and returns the record the service created.
    pub async fn upload(&self, file: UploadFile) -> Result<FileRecord> {
        let credential = self.require_identity().await?;
        let _busy = BusyGuard::enter(&self.in_flight);
        self.files.upload(file, &credential).await
    }

    pub async fn delete_file(&self, id: i64) -> Result<()> {
        let credential = self.require_identity().await?;
        self.files.delete(id, &credential).await
    }

    /// Downloads `id` into the configured sink. A blank `filename` defers to
    /// the name the service suggests.
    pub async fn download(&self, id: i64, filename: &str) -> Result<DownloadedFile> {
        let credential = self.require_identity().await?;
        self.files
            .download(id, filename, &credential, self.sink.as_ref())
            .await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResultSet> {
        let credential = self.require_identity().await?;
        let _busy = BusyGuard::enter(&self.in_flight);
        self.search.submit(query, &credential).await
    }

    pub async fn dismiss_error(&self) {
        self.errors.clear().await;
    }

    pub async fn snapshot(&self) -> AppSnapshot {
        let session = self.session.session().await;
        AppSnapshot {
            view: self.views.read().await.current(),
            authenticated: session.is_authenticated(),
            user: session.identity,
            files: self.files.files().await,
            search_results: self.search.results().await,
            error: self.errors.current().await,
            busy: self.in_flight.load(Ordering::SeqCst) > 0,
        }
    }

    pub async fn current_view(&self) -> ViewState {
        self.views.read().await.current()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    async fn require_identity(&self) -> Result<Credential> {
        let session = self.session.session().await;
        match session.credential {
            Some(credential) if session.identity.is_some() => Ok(credential),
            _ => {
                self.errors.set(SIGN_IN_REQUIRED).await;
                Err(LodestoneError::auth(SIGN_IN_REQUIRED))
            }
        }
    }

    async fn end_session(&self) {
        self.files.clear().await;
        self.search.clear().await;
        self.views.write().await.on_logout();
    }
}

/// Sign-in rejections collapse to one message; anything else keeps its reason.
fn auth_failure_message(kind: AuthFlowKind, error: &LodestoneError) -> String {
    match kind {
        AuthFlowKind::Login if !error.is_network() && *error != LodestoneError::auth(ALREADY_SIGNED_IN) => {
            LOGIN_FAILED.to_string()
        }
        _ => error.user_message(),
    }
}
