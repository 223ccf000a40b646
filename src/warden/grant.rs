//! Consent grant policies.

use std::str::FromStr;

pub const DEFAULT_GRANT_SCOPES: [&str; 3] = ["offline_access", "offline", "openid"];

/// How the granted scope set is derived for a consent challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrantPolicy {
    /// Grant every scope the client requested.
    Requested,
    /// Grant the requested scopes the user ticked, in requested order.
    UserSelected,
    /// Grant a configured set regardless of the request.
    Fixed(Vec<String>),
}

impl Default for GrantPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_GRANT_SCOPES.iter().map(ToString::to_string).collect())
    }
}

impl GrantPolicy {
    /// Whether [`GrantPolicy::grant`] looks at the requested scopes, i.e. the
    /// consent request has to be resolved before accepting it.
    #[must_use]
    pub const fn needs_requested_scopes(&self) -> bool {
        !matches!(self, Self::Fixed(_))
    }

    /// Compute the scopes to grant. Deterministic and free of duplicates.
    #[must_use]
    pub fn grant(&self, requested: &[String], selected: &[String]) -> Vec<String> {
        let scopes: Vec<&String> = match self {
            Self::Requested => requested.iter().collect(),
            Self::UserSelected => requested
                .iter()
                .filter(|scope| selected.contains(*scope))
                .collect(),
            Self::Fixed(scopes) => scopes.iter().collect(),
        };

        let mut granted: Vec<String> = Vec::new();
        for scope in scopes {
            if !scope.is_empty() && !granted.contains(scope) {
                granted.push(scope.clone());
            }
        }
        granted
    }

    /// Build a policy from its configuration name.
    ///
    /// # Errors
    /// Returns an error for an unknown policy name.
    pub fn from_name(name: &str, fixed_scopes: Vec<String>) -> Result<Self, String> {
        match name.parse::<GrantPolicyKind>()? {
            GrantPolicyKind::Requested => Ok(Self::Requested),
            GrantPolicyKind::UserSelected => Ok(Self::UserSelected),
            GrantPolicyKind::Fixed => Ok(Self::Fixed(fixed_scopes)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantPolicyKind {
    Requested,
    UserSelected,
    Fixed,
}

impl FromStr for GrantPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(Self::Requested),
            "user-selected" | "user_selected" => Ok(Self::UserSelected),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("unknown grant policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn default_policy_is_fixed_superset() {
        let policy = GrantPolicy::default();
        assert!(!policy.needs_requested_scopes());
        assert_eq!(
            policy.grant(&scopes(&["openid", "offline"]), &[]),
            scopes(&["offline_access", "offline", "openid"])
        );
    }

    #[test]
    fn fixed_policy_ignores_request() {
        let policy = GrantPolicy::default();
        let a = policy.grant(&scopes(&["openid"]), &[]);
        let b = policy.grant(&scopes(&["profile", "email"]), &scopes(&["email"]));
        assert_eq!(a, b);
    }

    #[test]
    fn requested_policy_mirrors_request_without_duplicates() {
        let policy = GrantPolicy::Requested;
        assert!(policy.needs_requested_scopes());
        assert_eq!(
            policy.grant(&scopes(&["openid", "offline", "openid"]), &[]),
            scopes(&["openid", "offline"])
        );
    }

    #[test]
    fn user_selection_is_limited_to_requested_scopes() {
        let policy = GrantPolicy::UserSelected;
        assert_eq!(
            policy.grant(
                &scopes(&["openid", "offline", "email"]),
                &scopes(&["email", "admin", "openid"])
            ),
            scopes(&["openid", "email"])
        );
        assert!(policy.grant(&scopes(&["openid"]), &[]).is_empty());
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!(
            GrantPolicy::from_name("requested", vec![]),
            Ok(GrantPolicy::Requested)
        );
        assert_eq!(
            GrantPolicy::from_name("User-Selected", vec![]),
            Ok(GrantPolicy::UserSelected)
        );
        assert_eq!(
            GrantPolicy::from_name("fixed", scopes(&["openid"])),
            Ok(GrantPolicy::Fixed(scopes(&["openid"])))
        );
        assert!(GrantPolicy::from_name("everything", vec![]).is_err());
    }
}
