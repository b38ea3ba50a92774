//! Session domain models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::FormField;

/// Opaque bearer token authorizing requests to the service.
///
/// `Debug` is redacted; the token itself is reachable only through
/// [`Credential::expose`] and [`Credential::bearer_header`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Identity resolved from the credential by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// The authenticated-session state.
///
/// `identity` is only ever `Some` alongside the credential it was resolved
/// from. A restored credential sits here with `identity == None` until the
/// profile fetch validates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub credential: Option<Credential>,
    pub identity: Option<User>,
}

impl Session {
    /// A credential that has not been validated yet.
    pub fn pending(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            identity: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some() && self.identity.is_some()
    }
}

/// Form-encoded sign-in request.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn form_fields(&self) -> Vec<FormField> {
        vec![
            FormField::text("username", &self.username),
            FormField::text("password", &self.password),
        ]
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// JSON account-creation request.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// The sign-in that follows a successful registration.
    pub fn login_request(&self) -> LoginRequest {
        LoginRequest::new(&self.username, &self.password)
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Which authentication form is being submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlow {
    Login(LoginRequest),
    Register(RegisterRequest),
}

impl AuthFlow {
    pub fn kind(&self) -> AuthFlowKind {
        match self {
            AuthFlow::Login(_) => AuthFlowKind::Login,
            AuthFlow::Register(_) => AuthFlowKind::Register,
        }
    }
}

/// Tag of an [`AuthFlow`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFlowKind {
    Login,
    Register,
}

/// Body of a successful login response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}
