use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Well-known account roles, ordered by privilege.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, ToSchema)]
pub enum RoleName {
    User,
    Instructor,
    Admin,
}

impl RoleName {
    /// Indicates whether users with this role can manage catalog content
    /// (courses, sections, videos).
    pub fn can_manage_content(self) -> bool {
        self >= RoleName::Instructor
    }

    pub fn is_admin(self) -> bool {
        self == RoleName::Admin
    }

    pub const ALL: [RoleName; 3] = [RoleName::User, RoleName::Instructor, RoleName::Admin];
}

impl std::default::Default for RoleName {
    fn default() -> Self {
        RoleName::User
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleName::User => write!(f, "User"),
            RoleName::Instructor => write!(f, "Instructor"),
            RoleName::Admin => write!(f, "Admin"),
        }
    }
}

impl std::str::FromStr for RoleName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(RoleName::User),
            "Instructor" => Ok(RoleName::Instructor),
            "Admin" => Ok(RoleName::Admin),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_ordering() {
        assert!(RoleName::User < RoleName::Instructor);
        assert!(RoleName::Instructor < RoleName::Admin);
    }

    #[test]
    fn content_management_gate() {
        assert!(!RoleName::User.can_manage_content());
        assert!(RoleName::Instructor.can_manage_content());
        assert!(RoleName::Admin.can_manage_content());
    }

    #[test]
    fn admin_gate() {
        assert!(RoleName::Admin.is_admin());
        assert!(!RoleName::Instructor.is_admin());
    }

    #[test]
    fn name_round_trip() {
        for role in RoleName::ALL {
            assert_eq!(role.to_string().parse::<RoleName>(), Ok(role));
        }
    }
}
