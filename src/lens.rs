use crate::identity::Role;

/// Persona lens overlay state. Exists only for owner identities; the overlay
/// owns the override and downstream consumers only ever see its effect on the
/// classified role.
#[derive(Debug, Clone, Default)]
pub struct LensState {
    /// Set when an owner passes the portal or a deployment guard; the module
    /// load is kicked off but nothing waits on it.
    pub requested: bool,
    /// The asynchronous load completed. Absence is a normal, handled case.
    pub ready: bool,
    pub viewing_as: Option<Role>,
}

impl LensState {
    pub fn request(&mut self) {
        self.requested = true;
    }
}

/// One switch-target in the lens widget.
#[derive(Debug, Clone)]
pub struct LensTarget {
    pub label: String,
    pub role: Role,
    pub class_id: Option<String>,
}

/// One student target per configured class, plus the global consoles.
pub fn targets(class_ids: &[String]) -> Vec<LensTarget> {
    let mut out = Vec::new();
    for id in class_ids {
        out.push(LensTarget {
            label: format!("Student ({})", id),
            role: Role::Student,
            class_id: Some(id.clone()),
        });
    }
    out.push(LensTarget {
        label: "Principal".to_string(),
        role: Role::Principal,
        class_id: None,
    });
    out.push(LensTarget {
        label: "Admin (IAM)".to_string(),
        role: Role::SchoolAdmin,
        class_id: None,
    });
    out.push(LensTarget {
        label: "Owner".to_string(),
        role: Role::Owner,
        class_id: None,
    });
    out
}
