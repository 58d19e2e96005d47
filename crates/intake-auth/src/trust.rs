//! The device trust manager.
//!
//! Per browser and slug the flow is `Loading -> {RequiresPassword,
//! Authorized, NoSuchActiveClient}`; a successful [`DeviceTrust::login`]
//! moves `RequiresPassword` to `Authorized`. Lookups that fail on the store
//! resolve to `RequiresPassword`, never to a stuck or silently authorized
//! state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use intake_core::models::client::Client;
use intake_core::models::device::TrustedDevice;
use intake_core::store_keys;
use intake_storage::store::Store;

use crate::cookie::{self, CredentialScope};
use crate::error::AuthError;
use crate::secret;
use crate::token;

/// Where a visitor of `/assess/{slug}` should end up.
#[derive(Debug, Clone)]
pub enum Access {
    /// Skip the password prompt and open the workspace.
    Authorized(Client),
    /// Show the password prompt. The client is absent when the lookup
    /// itself failed.
    RequiresPassword(Option<Client>),
    /// The link is invalid: no client, or the client was deactivated.
    NoSuchActiveClient,
}

/// A credential handed out by a successful login.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub client: Client,
    pub token: String,
    pub scope: CredentialScope,
}

impl IssuedCredential {
    /// The `Set-Cookie` header value that stores this credential in the browser.
    pub fn set_cookie_header(&self, secure: bool) -> String {
        cookie::set_cookie_header(
            &self.client.slug,
            &self.token,
            self.scope,
            secure,
            jiff::Timestamp::now(),
        )
    }
}

/// How long a session-scoped credential opens the workspace by default.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

pub struct DeviceTrust {
    store: Arc<dyn Store>,
    /// Session-scoped credentials issued by this process, keyed by
    /// `(client_id, token)`, with the time they were issued. Never persisted.
    sessions: RwLock<HashMap<(Uuid, String), Instant>>,
    session_ttl: Duration,
}

impl DeviceTrust {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_session_ttl(store, DEFAULT_SESSION_TTL)
    }

    pub fn with_session_ttl(store: Arc<dyn Store>, session_ttl: Duration) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
            session_ttl,
        }
    }

    /// Forget expired session credentials. Returns how many are still live.
    pub async fn prune_sessions(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let ttl = self.session_ttl;
        sessions.retain(|_, issued| issued.elapsed() < ttl);
        sessions.len()
    }

    /// Decide whether this browser can skip the password prompt.
    ///
    /// Only persisted trusted devices count here; a session-scoped credential
    /// is never found and falls through to the password prompt.
    pub async fn check_access(&self, slug: &str, credential: Option<&str>) -> Access {
        let client = match self.lookup_client(slug).await {
            Ok(client) => client,
            Err(access) => return access,
        };

        match credential.filter(|token| !token.is_empty()) {
            Some(token) if self.is_trusted_device(&client, token).await => {
                Access::Authorized(client)
            }
            _ => Access::RequiresPassword(Some(client)),
        }
    }

    /// Guard for the workspace itself: like [`Self::check_access`], but a
    /// session-scoped credential issued by this process also gets in.
    pub async fn authorize(&self, slug: &str, credential: Option<&str>) -> Access {
        let client = match self.lookup_client(slug).await {
            Ok(client) => client,
            Err(access) => return access,
        };

        let Some(token) = credential.filter(|token| !token.is_empty()) else {
            return Access::RequiresPassword(Some(client));
        };

        if self.is_trusted_device(&client, token).await || self.is_session(client.id, token).await
        {
            Access::Authorized(client)
        } else {
            Access::RequiresPassword(Some(client))
        }
    }

    /// Verify the shared password and issue a device credential.
    ///
    /// With `remember_device` the credential is stored as a trusted device
    /// and lasts a year; without it the credential only lives for this
    /// browsing session.
    pub async fn login(
        &self,
        slug: &str,
        password: &str,
        remember_device: bool,
        user_agent: Option<&str>,
    ) -> Result<IssuedCredential, AuthError> {
        let no_such_client = || AuthError::NoSuchActiveClient {
            slug: slug.to_string(),
        };

        store_keys::validate_slug(slug).map_err(|_| no_such_client())?;
        let client = self
            .store
            .find_active_client(slug)
            .await?
            .ok_or_else(no_such_client)?;

        let stored = client.password_hash.clone();
        let entered = password.to_string();
        let matches = tokio::task::spawn_blocking(move || secret::verify_secret(&stored, &entered))
            .await
            .map_err(|e| AuthError::Verification(e.to_string()))??;

        if !matches {
            tracing::info!(slug, "login rejected: invalid password");
            return Err(AuthError::InvalidPassword);
        }

        if let Err(e) = self
            .store
            .touch_client_activity(slug, jiff::Timestamp::now())
            .await
        {
            tracing::warn!(slug, error = %e, "failed to update client last_activity");
        }

        let token = token::generate_device_token();
        let scope = if remember_device {
            let device =
                TrustedDevice::new(client.id, token.clone(), user_agent.map(str::to_string));
            match self.store.insert_trusted_device(&device).await {
                Ok(()) => CredentialScope::Remembered,
                Err(e) => {
                    tracing::warn!(
                        slug,
                        error = %e,
                        "failed to store trusted device, issuing session credential instead"
                    );
                    self.register_session(client.id, &token).await;
                    CredentialScope::Session
                }
            }
        } else {
            self.register_session(client.id, &token).await;
            CredentialScope::Session
        };

        tracing::info!(slug, scope = ?scope, "login succeeded");

        Ok(IssuedCredential {
            client,
            token,
            scope,
        })
    }

    async fn lookup_client(&self, slug: &str) -> Result<Client, Access> {
        if store_keys::validate_slug(slug).is_err() {
            return Err(Access::NoSuchActiveClient);
        }

        match self.store.find_active_client(slug).await {
            Ok(Some(client)) => Ok(client),
            Ok(None) => {
                tracing::debug!(slug, "no active client for slug");
                Err(Access::NoSuchActiveClient)
            }
            Err(e) => {
                tracing::warn!(slug, error = %e, "client lookup failed, falling back to login");
                Err(Access::RequiresPassword(None))
            }
        }
    }

    async fn is_trusted_device(&self, client: &Client, token: &str) -> bool {
        if !token::is_well_formed(token) {
            tracing::debug!(slug = %client.slug, "malformed device token ignored");
            return false;
        }

        match self.store.find_trusted_device(client.id, token).await {
            Ok(Some(_)) => {
                if let Err(e) = self
                    .store
                    .touch_trusted_device(client.id, token, jiff::Timestamp::now())
                    .await
                {
                    tracing::warn!(slug = %client.slug, error = %e, "failed to update device last_used");
                }
                true
            }
            Ok(None) => {
                // Session credential, expired row or a token for another
                // client: treated as an anonymous visit, the cookie is left alone.
                tracing::debug!(slug = %client.slug, "device token not registered");
                false
            }
            Err(e) => {
                tracing::warn!(slug = %client.slug, error = %e, "device lookup failed");
                false
            }
        }
    }

    async fn is_session(&self, client_id: Uuid, token: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(&(client_id, token.to_string()))
            .is_some_and(|issued| issued.elapsed() < self.session_ttl)
    }

    async fn register_session(&self, client_id: Uuid, token: &str) {
        let mut sessions = self.sessions.write().await;
        let ttl = self.session_ttl;
        sessions.retain(|_, issued| issued.elapsed() < ttl);
        sessions.insert((client_id, token.to_string()), Instant::now());
    }
}
