use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Donor,
    Foundation,
    Beneficiary,
    Admin,
}

impl UserRole {
    /// Roles a visitor may pick for themselves at registration.
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, UserRole::Donor | UserRole::Foundation)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Donor => write!(f, "DONOR"),
            UserRole::Foundation => write!(f, "FOUNDATION"),
            UserRole::Beneficiary => write!(f, "BENEFICIARY"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "DONOR" => Ok(UserRole::Donor),
            "FOUNDATION" => Ok(UserRole::Foundation),
            "BENEFICIARY" => Ok(UserRole::Beneficiary),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for role in [UserRole::Donor, UserRole::Foundation, UserRole::Beneficiary, UserRole::Admin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("donor".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_donor_and_foundation_are_self_assignable() {
        assert!(UserRole::Donor.is_self_assignable());
        assert!(UserRole::Foundation.is_self_assignable());
        assert!(!UserRole::Admin.is_self_assignable());
        assert!(!UserRole::Beneficiary.is_self_assignable());
    }
}
