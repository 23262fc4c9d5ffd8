//! Runtime secret resolution.
//!
//! Config stores the env var NAME of the git token (`git.token_env`), never the
//! token. Resolution happens once at startup; `Debug` output redacts the value and
//! errors name the variable only.

use crate::ProvisionerConfig;

pub const DEFAULT_GIT_TOKEN_ENV: &str = "ACMQ_GIT_TOKEN";

/// Token used to publish reconciled artifacts. `None` when the named env var is unset
/// or blank. **Value is redacted in `Debug` output.**
#[derive(Clone)]
pub struct ResolvedGitToken {
    pub env_name: String,
    pub token: Option<String>,
}

impl ResolvedGitToken {
    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }
}

impl std::fmt::Debug for ResolvedGitToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedGitToken")
            .field("env_name", &self.env_name)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

pub fn resolve_git_token(cfg: &ProvisionerConfig) -> ResolvedGitToken {
    ResolvedGitToken {
        env_name: cfg.git_token_env.clone(),
        token: resolve_env(&cfg.git_token_env),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_the_token() {
        let t = ResolvedGitToken {
            env_name: "ACMQ_GIT_TOKEN".to_string(),
            token: Some("ghp_supersecretvalue".to_string()),
        };
        let dbg = format!("{t:?}");
        assert!(dbg.contains("<REDACTED>"));
        assert!(dbg.contains("ACMQ_GIT_TOKEN"));
        assert!(!dbg.contains("supersecret"));
    }

    #[test]
    fn absent_token_debug_shows_none() {
        let t = ResolvedGitToken {
            env_name: "ACMQ_TEST_TOKEN_UNSET".to_string(),
            token: None,
        };
        assert!(!t.is_present());
        assert!(format!("{t:?}").contains("token: None"));
    }
}
