use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Account role. The four variants are the whole universe; anything else
/// coming off the wire parses to the default customer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Employee,
    RetailCustomer,
    ResellerCustomer,
}

impl Role {
    /// Landing route after login. Total over the enum; unknown raw strings
    /// fall back to the retail landing via `Default` at the parse site.
    pub fn landing_route(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Employee => "/employee/dashboard",
            Role::RetailCustomer => "/dashboard",
            Role::ResellerCustomer => "/reseller/catalog",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Employee => "Employee",
            Role::RetailCustomer => "Retail Customer",
            Role::ResellerCustomer => "Reseller Customer",
        }
    }

    /// Roles an admin may assign when creating accounts. ADMIN itself is
    /// provisioned out-of-band and RETAIL_CUSTOMER only via self-signup.
    pub fn admin_assignable(self) -> bool {
        matches!(self, Role::Employee | Role::ResellerCustomer)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::RetailCustomer
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "EMPLOYEE" => Ok(Role::Employee),
            "RETAIL_CUSTOMER" => Ok(Role::RetailCustomer),
            "RESELLER_CUSTOMER" => Ok(Role::ResellerCustomer),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_role_has_its_own_landing_route() {
        assert_eq!(Role::Admin.landing_route(), "/admin/dashboard");
        assert_eq!(Role::Employee.landing_route(), "/employee/dashboard");
        assert_eq!(Role::RetailCustomer.landing_route(), "/dashboard");
        assert_eq!(Role::ResellerCustomer.landing_route(), "/reseller/catalog");

        let routes = [
            Role::Admin.landing_route(),
            Role::Employee.landing_route(),
            Role::RetailCustomer.landing_route(),
            Role::ResellerCustomer.landing_route(),
        ];
        for (i, a) in routes.iter().enumerate() {
            for b in routes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_role_falls_back_to_the_retail_landing() {
        let route = "BOGUS"
            .parse::<Role>()
            .unwrap_or_default()
            .landing_route();
        assert_eq!(route, Role::RetailCustomer.landing_route());
    }

    #[test]
    fn parses_the_four_wire_names() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("EMPLOYEE".parse::<Role>(), Ok(Role::Employee));
        assert_eq!("RETAIL_CUSTOMER".parse::<Role>(), Ok(Role::RetailCustomer));
        assert_eq!(
            "RESELLER_CUSTOMER".parse::<Role>(),
            Ok(Role::ResellerCustomer)
        );
        assert_eq!("admin".parse::<Role>(), Err(()));
    }

    #[test]
    fn only_employee_and_reseller_are_admin_assignable() {
        assert!(Role::Employee.admin_assignable());
        assert!(Role::ResellerCustomer.admin_assignable());
        assert!(!Role::Admin.admin_assignable());
        assert!(!Role::RetailCustomer.admin_assignable());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::ResellerCustomer).unwrap(),
            "\"RESELLER_CUSTOMER\""
        );
        let role: Role = serde_json::from_str("\"EMPLOYEE\"").unwrap();
        assert_eq!(role, Role::Employee);
    }
}
