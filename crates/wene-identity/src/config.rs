//! Master/demo token configuration (spec §4.G), read once from the
//! environment the way [`wene_pop::PopSignerConfig`] reads its signer env.

use wene_types::constants::ADMIN_PASSWORD_PLACEHOLDER;

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    master_password: Option<String>,
    demo_password: Option<String>,
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self {
            master_password: std::env::var("ADMIN_PASSWORD").ok(),
            demo_password: std::env::var("ADMIN_DEMO_PASSWORD").ok(),
        }
    }

    pub fn new(master_password: Option<String>, demo_password: Option<String>) -> Self {
        Self { master_password, demo_password }
    }

    /// `None` when unset or left at the default placeholder, per spec §4.G.
    pub fn master_token(&self) -> Option<&str> {
        self.master_password
            .as_deref()
            .filter(|p| *p != ADMIN_PASSWORD_PLACEHOLDER && !p.is_empty())
    }

    pub fn master_configured(&self) -> bool {
        self.master_token().is_some()
    }

    pub fn demo_token(&self) -> Option<&str> {
        self.demo_password.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_master_password_counts_as_unconfigured() {
        let config = IdentityConfig::new(Some(ADMIN_PASSWORD_PLACEHOLDER.to_string()), None);
        assert!(!config.master_configured());
        assert_eq!(config.master_token(), None);
    }

    #[test]
    fn real_master_password_is_configured() {
        let config = IdentityConfig::new(Some("correct-horse".to_string()), None);
        assert!(config.master_configured());
        assert_eq!(config.master_token(), Some("correct-horse"));
    }
}
