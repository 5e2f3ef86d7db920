//! Cache key construction.
//!
//! Every kind of cached data lives under its own prefix. Compound keys join
//! their parts with `:`, which neither npm package names nor GitLab usernames
//! may contain.

/// Stand-in for a caller without a username. `$` is not valid in GitLab
/// usernames, so it can never match a real account.
pub const ANONYMOUS: &str = "$anonymous";

pub fn token(username: &str) -> String {
    format!("token-{username}")
}

pub fn user(username: &str) -> String {
    format!("user-{username}")
}

pub fn project(package: &str) -> String {
    format!("project-{package}")
}

pub fn group_member(group_id: u64, user_id: u64) -> String {
    format!("groupmember-{group_id}:{user_id}")
}

pub fn access(package: &str, username: Option<&str>) -> String {
    format!("access-{package}:{}", username.unwrap_or(ANONYMOUS))
}

pub fn publish(package: &str, username: Option<&str>) -> String {
    format!("publish-{package}:{}", username.unwrap_or(ANONYMOUS))
}

pub fn auth(username: &str) -> String {
    format!("auth-{username}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_keys_do_not_collide_on_hyphens() {
        assert_ne!(access("a-b", Some("c")), access("a", Some("b-c")));
    }

    #[test]
    fn anonymous_is_distinct_from_any_username() {
        assert_ne!(access("pkg", None), access("pkg", Some("undefined")));
        assert_eq!(access("pkg", None), "access-pkg:$anonymous");
    }

    #[test]
    fn kinds_use_separate_prefixes() {
        assert_ne!(access("pkg", Some("ada")), publish("pkg", Some("ada")));
        assert_ne!(user("ada"), token("ada"));
        assert_ne!(user("ada"), auth("ada"));
    }
}
