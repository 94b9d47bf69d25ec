// crates/strongbox-core/src/core/lease.rs
// ============================================================================
// Module: Strongbox Lease Capping
// Description: Lease options for renewable credentials and the extend rule.
// Purpose: Bound how far a renewal may push a credential's expiration.
// Dependencies: thiserror, time, tracing
// ============================================================================

//! ## Overview
//! Renewable credentials carry [`LeaseOptions`] on exactly one context: an
//! [`Auth`] (login token) or a [`Secret`] (leased secret). A renewal request
//! asks for the credential to live `lease_increment` past its current
//! expiration; [`LeaseExtender`] admits that only up to `max_offset` past the
//! current instant.
//!
//! The lease is a duration measured from the credential's issue time, not from
//! now, so a clamped lease is computed against the original expiration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Lease Options
// ============================================================================

/// Lease data attached to an auth or secret context.
///
/// # Invariants
/// - `lease` is relative to `issue_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseOptions {
    /// Current lease length measured from `issue_time`.
    pub lease: Duration,
    /// Increment requested by the renewing caller.
    pub lease_increment: Duration,
    /// Instant the credential was issued.
    pub issue_time: OffsetDateTime,
    /// Whether the holder may renew at all.
    pub renewable: bool,
}

impl LeaseOptions {
    /// Creates renewable lease options with no pending increment.
    #[must_use]
    pub const fn new(lease: Duration, issue_time: OffsetDateTime) -> Self {
        Self {
            lease,
            lease_increment: Duration::ZERO,
            issue_time,
            renewable: true,
        }
    }

    /// Returns a copy with the requested increment set.
    #[must_use]
    pub const fn with_increment(mut self, increment: Duration) -> Self {
        self.lease_increment = increment;
        self
    }

    /// Returns the instant the current lease runs out.
    ///
    /// Saturates at the maximum representable instant.
    #[must_use]
    pub fn expiration_time(&self) -> OffsetDateTime {
        self.issue_time.saturating_add(self.lease)
    }

    /// Returns the lease, counted from `now`, that ends `increment` past the
    /// current expiration.
    ///
    /// The result is negative when the current expiration plus `increment`
    /// lies before `now`. Returns `None` when an instant leaves the
    /// representable range.
    #[must_use]
    pub fn incremented_lease(
        &self,
        increment: Duration,
        now: OffsetDateTime,
    ) -> Option<Duration> {
        let extended = self.issue_time.checked_add(self.lease)?.checked_add(increment)?;
        Some(extended - now)
    }
}

// ============================================================================
// SECTION: Contexts
// ============================================================================

/// Authentication result carrying a renewable lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    /// Token issued to the client.
    pub client_token: String,
    /// Policies attached to the token.
    pub policies: Vec<String>,
    /// Free-form metadata recorded at login.
    pub metadata: BTreeMap<String, String>,
    /// Lease data for the token.
    pub lease_options: LeaseOptions,
}

/// Leased secret carrying a renewable lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Lease identifier handed to the client.
    pub lease_id: String,
    /// Backend-private data needed to renew or revoke.
    pub internal_data: BTreeMap<String, String>,
    /// Lease data for the secret.
    pub lease_options: LeaseOptions,
}

/// The single lease-bearing context of a renewal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseContext {
    /// Token renewal.
    Auth(Auth),
    /// Secret renewal.
    Secret(Secret),
}

impl LeaseContext {
    /// Returns the lease options of the context.
    #[must_use]
    pub const fn lease_options(&self) -> &LeaseOptions {
        match self {
            Self::Auth(auth) => &auth.lease_options,
            Self::Secret(secret) => &secret.lease_options,
        }
    }

    /// Returns mutable lease options of the context.
    pub const fn lease_options_mut(&mut self) -> &mut LeaseOptions {
        match self {
            Self::Auth(auth) => &mut auth.lease_options,
            Self::Secret(secret) => &mut secret.lease_options,
        }
    }
}

/// Renewal request routed to the lease extender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request path, used for diagnostics only.
    pub path: String,
    /// Lease-bearing context, absent for non-renewal requests.
    pub context: Option<LeaseContext>,
}

impl Request {
    /// Creates a request with no lease context.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            context: None,
        }
    }

    /// Creates a token renewal request.
    #[must_use]
    pub fn renew_auth(path: impl Into<String>, auth: Auth) -> Self {
        Self {
            path: path.into(),
            context: Some(LeaseContext::Auth(auth)),
        }
    }

    /// Creates a secret renewal request.
    #[must_use]
    pub fn renew_secret(path: impl Into<String>, secret: Secret) -> Self {
        Self {
            path: path.into(),
            context: Some(LeaseContext::Secret(secret)),
        }
    }
}

/// Response to a successful renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Renewed context with the admitted lease.
    pub context: LeaseContext,
}

impl Response {
    /// Returns the renewed auth, if this was a token renewal.
    #[must_use]
    pub const fn auth(&self) -> Option<&Auth> {
        match &self.context {
            LeaseContext::Auth(auth) => Some(auth),
            LeaseContext::Secret(_) => None,
        }
    }

    /// Returns the renewed secret, if this was a secret renewal.
    #[must_use]
    pub const fn secret(&self) -> Option<&Secret> {
        match &self.context {
            LeaseContext::Auth(_) => None,
            LeaseContext::Secret(secret) => Some(secret),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lease extension errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeaseError {
    /// The request carries neither an auth nor a secret context.
    #[error("no lease options for request")]
    MissingLeaseOptions,
    /// Time arithmetic left the representable range.
    #[error("lease arithmetic overflow: {0}")]
    Overflow(&'static str),
}

// ============================================================================
// SECTION: Extender
// ============================================================================

/// Extends leases up to a fixed offset past the current instant.
///
/// A `max_offset` of two hours forces the holder to renew again within the
/// next two hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseExtender {
    /// Maximum distance past now that an expiration may reach.
    max_offset: Duration,
}

impl LeaseExtender {
    /// Creates an extender bounded by `max_offset`.
    #[must_use]
    pub const fn new(max_offset: Duration) -> Self {
        Self {
            max_offset,
        }
    }

    /// Returns the configured maximum offset.
    #[must_use]
    pub const fn max_offset(&self) -> Duration {
        self.max_offset
    }

    /// Extends the lease of `request` using the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError`] when the request has no lease context or the
    /// computation overflows. The request is not modified on error.
    pub fn extend(&self, request: &mut Request) -> Result<Response, LeaseError> {
        self.extend_at(request, OffsetDateTime::now_utc())
    }

    /// Extends the lease of `request` as if the current instant were `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError`] when the request has no lease context or the
    /// computation overflows. The request is not modified on error.
    pub fn extend_at(
        &self,
        request: &mut Request,
        now: OffsetDateTime,
    ) -> Result<Response, LeaseError> {
        let Some(context) = request.context.as_mut() else {
            return Err(LeaseError::MissingLeaseOptions);
        };
        let options = context.lease_options_mut();
        let expiration = options
            .issue_time
            .checked_add(options.lease)
            .ok_or(LeaseError::Overflow("current expiration"))?;
        let requested = options
            .incremented_lease(options.lease_increment, now)
            .ok_or(LeaseError::Overflow("requested lease"))?;
        let max_expiration =
            now.checked_add(self.max_offset).ok_or(LeaseError::Overflow("max expiration"))?;
        let new_expiration =
            now.checked_add(requested).ok_or(LeaseError::Overflow("requested expiration"))?;
        // A capped lease is measured from the original expiration, not from
        // now, and keeps its sign.
        let admitted =
            if new_expiration > max_expiration { max_expiration - expiration } else { requested };
        tracing::debug!(
            path = %request.path,
            requested_secs = requested.whole_seconds(),
            admitted_secs = admitted.whole_seconds(),
            clamped = admitted != requested,
            "lease extended"
        );
        options.lease = admitted;
        Ok(Response {
            context: context.clone(),
        })
    }
}
