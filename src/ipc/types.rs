use serde::Deserialize;
use std::collections::HashMap;

use crate::curriculum::{Catalog, Navigator};
use crate::guard::EntitlementDirectory;
use crate::identity::{identity_of, Identity, ProviderDirectory, Role, RoleClassifier};
use crate::lens::LensState;
use crate::portal::PortalState;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One page-session. The identity is never stored here, only the raw token,
/// re-resolved against the provider directory on every check.
pub struct Session {
    pub token: Option<String>,
    pub portal: PortalState,
    pub lens: LensState,
    /// Deployments whose guard granted access, keyed to the page epoch of the
    /// granting run.
    pub grants: HashMap<String, u64>,
    /// Per-deployment page epoch; bumped by every guard run so in-flight
    /// state from a previous page load can never leak into the new one.
    pub epochs: HashMap<String, u64>,
    /// Per-deployment curriculum navigators; dropped on a fresh guard run.
    pub navigators: HashMap<String, Navigator>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            portal: PortalState::Start,
            lens: LensState::default(),
            grants: HashMap::new(),
            epochs: HashMap::new(),
            navigators: HashMap::new(),
        }
    }
}

pub struct AppState {
    pub classifier: RoleClassifier,
    pub provider: ProviderDirectory,
    pub entitlements: EntitlementDirectory,
    pub catalog: Catalog,
    pub sessions: HashMap<String, Session>,
    /// Configured class deployments, "6" through "12" by default.
    pub class_ids: Vec<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            classifier: RoleClassifier::default(),
            provider: ProviderDirectory::default(),
            entitlements: EntitlementDirectory::default(),
            catalog: Catalog::default(),
            sessions: HashMap::new(),
            class_ids: (6..=12).map(|n| n.to_string()).collect(),
        }
    }

    pub fn has_class(&self, class_id: &str) -> bool {
        self.class_ids.iter().any(|c| c == class_id)
    }

    /// Fresh resolution + classification for a session, with the lens
    /// override applied. Guest on any provider failure.
    pub fn effective_role(&self, session: &Session) -> (Option<Identity>, Role) {
        match self.provider.resolve(session.token.as_deref()) {
            None => (None, Role::Guest),
            Some(rec) => {
                let classified = self.classifier.classify(rec);
                let role = match (classified, session.lens.viewing_as) {
                    (Role::Owner, Some(viewing_as)) => viewing_as,
                    (role, _) => role,
                };
                (Some(identity_of(rec)), role)
            }
        }
    }

    /// Owner-ness of the underlying identity, ignoring any lens override, so
    /// the lens stays available while viewing as another role.
    pub fn is_true_owner(&self, session: &Session) -> bool {
        self.provider
            .resolve(session.token.as_deref())
            .map(|rec| self.classifier.classify(rec) == Role::Owner)
            .unwrap_or(false)
    }
}
