use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::identity::{identity_of, Identity, ProviderDirectory, Role, RoleClassifier};

/// One independently served class site. Statically known, never mutated.
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub class_id: String,
}

impl DeploymentContext {
    pub fn new(class_id: &str) -> Self {
        Self {
            class_id: class_id.to_string(),
        }
    }

    pub fn base_path(&self) -> String {
        format!("cbse/class-{}", self.class_id)
    }

    /// The deployment's own index. Guest redirects always land here, never on
    /// another deployment's index.
    pub fn index_url(&self) -> String {
        format!("{}/index.html", self.base_path())
    }

    pub fn console_url(&self, role_slug: &str) -> String {
        format!("{}/consoles/{}.html", self.base_path(), role_slug)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementRecord {
    pub uid: String,
    #[serde(rename = "classId")]
    pub class_id: String,
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    /// RFC3339 expiry instant; the record denies once this has passed.
    #[serde(default, rename = "expiresAt")]
    pub expires_at: Option<String>,
}

/// Live access determination for (identity, deployment). Recomputed on every
/// guard run; never cached past the page lifetime.
#[derive(Debug, Clone)]
pub struct Entitlement {
    pub class_id: String,
    pub allowed: bool,
    pub reason: Option<String>,
}

/// Stand-in for the external expiry/entitlement collaborator, seeded over
/// IPC. An absent record is allowed, matching the collaborator's defaults
/// (`checkClassAccess -> {allowed: true}`, `isSignupExpired -> false`).
#[derive(Default)]
pub struct EntitlementDirectory {
    records: HashMap<(String, String), EntitlementRecord>,
}

impl EntitlementDirectory {
    pub fn seed(&mut self, records: Vec<EntitlementRecord>) {
        for r in records {
            self.records
                .insert((r.uid.clone(), r.class_id.clone()), r);
        }
    }

    pub fn check(&self, uid: &str, class_id: &str, now: DateTime<Utc>) -> Entitlement {
        match self.records.get(&(uid.to_string(), class_id.to_string())) {
            None => Entitlement {
                class_id: class_id.to_string(),
                allowed: true,
                reason: None,
            },
            Some(rec) => {
                let expired = rec
                    .expires_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|t| t.with_timezone(&Utc) <= now)
                    .unwrap_or(false);
                let allowed = rec.allowed && !expired;
                let reason = if expired && rec.reason.is_none() {
                    Some("signup_expired".to_string())
                } else {
                    rec.reason.clone()
                };
                Entitlement {
                    class_id: class_id.to_string(),
                    allowed,
                    reason,
                }
            }
        }
    }
}

/// Result of one guard run. Protected content is revealed only on Granted;
/// the other outcomes keep the app container hidden.
#[derive(Debug)]
pub enum GuardOutcome {
    /// Guest on a protected page: silent redirect to this deployment's index.
    Redirect { target: String },
    /// Resolved identity without access: blocking interstitial, no redirect.
    Expired { entitlement: Entitlement },
    Granted {
        identity: Identity,
        role: Role,
        entitlement: Entitlement,
    },
}

/// Runs the per-deployment access guard. Identity is resolved fresh against
/// the provider directory (never trusted across deployments), then the
/// entitlement for this class is computed. `override_role` is the persona
/// lens override, applied after classification.
pub fn run(
    classifier: &RoleClassifier,
    provider: &ProviderDirectory,
    entitlements: &EntitlementDirectory,
    deployment: &DeploymentContext,
    token: Option<&str>,
    override_role: Option<Role>,
    now: DateTime<Utc>,
) -> GuardOutcome {
    let Some(rec) = provider.resolve(token) else {
        return GuardOutcome::Redirect {
            target: deployment.index_url(),
        };
    };

    let entitlement = entitlements.check(&rec.uid, &deployment.class_id, now);
    if !entitlement.allowed {
        return GuardOutcome::Expired { entitlement };
    }

    let classified = classifier.classify(rec);
    let role = match (classified, override_role) {
        // The lens override only exists for owner identities.
        (Role::Owner, Some(viewing_as)) => viewing_as,
        (role, _) => role,
    };
    GuardOutcome::Granted {
        identity: identity_of(rec),
        role,
        entitlement,
    }
}
