use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Role of a resolved identity. Derived on every resolution, never stored
/// independently of the identity that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Guest,
    Student,
    DemoPrincipal,
    SchoolAdmin,
    Principal,
    Owner,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(Self::Guest),
            "student" => Some(Self::Student),
            "demo_principal" => Some(Self::DemoPrincipal),
            "admin" => Some(Self::SchoolAdmin),
            "principal" => Some(Self::Principal),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Student => "student",
            Self::DemoPrincipal => "demo_principal",
            Self::SchoolAdmin => "admin",
            Self::Principal => "principal",
            Self::Owner => "owner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

/// One provisioned provider record, seeded over IPC the same way the
/// front-end test harness substitutes canned auth modules.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRecord {
    pub token: String,
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Explicit role claim on the identity record, if any.
    #[serde(default)]
    pub role: Option<String>,
    /// Demo-provisioned account (no real role claim expected).
    #[serde(default)]
    pub demo: bool,
    /// Simulated provider error: resolution fails soft to Guest.
    #[serde(default)]
    pub fail: bool,
}

/// Stand-in for the external auth collaborator. Resolution is a fresh lookup
/// every time; nothing is cached across calls.
#[derive(Default)]
pub struct ProviderDirectory {
    records: HashMap<String, ProviderRecord>,
}

impl ProviderDirectory {
    pub fn seed(&mut self, records: Vec<ProviderRecord>) {
        for r in records {
            self.records.insert(r.token.clone(), r);
        }
    }

    /// Resolve a raw session token. Absent token, unknown token, or a
    /// provider failure all resolve to Guest (None); no page may hard-crash
    /// on auth failure.
    pub fn resolve(&self, token: Option<&str>) -> Option<&ProviderRecord> {
        let token = token?;
        let rec = self.records.get(token)?;
        if rec.fail {
            return None;
        }
        Some(rec)
    }
}

/// Maps a provider record to a Role. The owner allow-list is injected state,
/// not a module constant, so tests can substitute it.
#[derive(Default)]
pub struct RoleClassifier {
    owner_emails: HashSet<String>,
}

impl RoleClassifier {
    pub fn set_owner_emails(&mut self, emails: Vec<String>) {
        self.owner_emails = emails.into_iter().map(|e| e.to_lowercase()).collect();
    }

    pub fn classify(&self, rec: &ProviderRecord) -> Role {
        // Owner is granted only by exact allow-list match. A role claim of
        // "owner" on its own does not escalate.
        if let Some(email) = &rec.email {
            if self.owner_emails.contains(&email.to_lowercase()) {
                return Role::Owner;
            }
        }
        match rec.role.as_deref() {
            Some("principal") => Role::Principal,
            Some("admin") => Role::SchoolAdmin,
            Some("student") => Role::Student,
            // Demo-provisioned accounts with no real claim get the demo
            // principal console.
            None if rec.demo => Role::DemoPrincipal,
            // Missing or unknown claim: least-privilege default.
            _ => Role::Student,
        }
    }
}

pub fn identity_of(rec: &ProviderRecord) -> Identity {
    Identity {
        uid: rec.uid.clone(),
        email: rec.email.clone(),
    }
}
