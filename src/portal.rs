use crate::guard::DeploymentContext;
use crate::identity::Role;

/// The four options of the school-role prompt. The prompt always renders all
/// four before any redirect; a role that already implies one only marks it
/// pre-selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolRole {
    Principal,
    Admin,
    Student,
    Staff,
}

pub const SCHOOL_ROLE_OPTIONS: [SchoolRole; 4] = [
    SchoolRole::Principal,
    SchoolRole::Admin,
    SchoolRole::Student,
    SchoolRole::Staff,
];

impl SchoolRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "principal" => Some(Self::Principal),
            "admin" => Some(Self::Admin),
            "student" => Some(Self::Student),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::Admin => "admin",
            Self::Student => "student",
            Self::Staff => "staff",
        }
    }
}

/// Root entry-point state machine. The enum holds at most one modal, so the
/// portal-choice and school-role prompts are structurally exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalState {
    Start,
    /// Guest: non-blocking login affordance, free browsing, no modal.
    NoAuthLanding,
    /// Resolved non-owner identity: the two-option Student/School prompt.
    PortalChoice,
    SchoolRoleChoice { preselected: Option<SchoolRole> },
    /// Student portal chosen: modal closed, navigation unrestricted.
    Browsing,
    /// Owner identities skip the portal entirely; the persona lens is
    /// requested instead.
    OwnerBypass,
    Redirected { target: String },
}

impl PortalState {
    pub fn open(role: Role) -> Self {
        match role {
            Role::Guest => Self::NoAuthLanding,
            Role::Owner => Self::OwnerBypass,
            _ => Self::PortalChoice,
        }
    }

    pub fn choose(&self, portal: &str, role: Role) -> Result<Self, String> {
        if *self != Self::PortalChoice {
            return Err("portal choice is not open".to_string());
        }
        match portal {
            "student" => Ok(Self::Browsing),
            "school" => Ok(Self::SchoolRoleChoice {
                preselected: implied_school_role(role),
            }),
            other => Err(format!("unknown portal: {}", other)),
        }
    }

    pub fn select_school_role(
        &self,
        deployment: &DeploymentContext,
        school_role: SchoolRole,
    ) -> Result<Self, String> {
        match self {
            Self::SchoolRoleChoice { .. } => Ok(Self::Redirected {
                target: deployment.console_url(school_role.as_str()),
            }),
            _ => Err("school role choice is not open".to_string()),
        }
    }
}

fn implied_school_role(role: Role) -> Option<SchoolRole> {
    match role {
        Role::Principal | Role::DemoPrincipal => Some(SchoolRole::Principal),
        Role::SchoolAdmin => Some(SchoolRole::Admin),
        _ => None,
    }
}
