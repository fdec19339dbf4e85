use crate::document::SecurityScheme;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};

/// Per-build accumulator for state collected while extracting operations.
///
/// A fresh `BuildState` is created for every document build, so rebuilding after an
/// invalidation never sees schemes or token URLs from an earlier build.
#[derive(Debug, Default)]
pub struct BuildState {
    security_schemes: IndexMap<String, SecurityScheme>,
    token_url: Option<String>,
}

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a security scheme under `name`. The first registration of a name wins.
    pub fn register_scheme(&mut self, name: &str, scheme: &SecurityScheme) {
        match self.security_schemes.get(name) {
            Some(existing) if existing != scheme => {
                warn!(
                    "Security scheme '{}' registered with a different definition; keeping the first",
                    name
                );
            }
            Some(_) => {}
            None => {
                debug!("Registering security scheme: {}", name);
                self.security_schemes.insert(name.to_string(), scheme.clone());
            }
        }
    }

    /// Records `path` as the OAuth2 password-flow token endpoint.
    pub fn record_token_url(&mut self, path: &str) -> Result<()> {
        match &self.token_url {
            Some(first) if first != path => Err(Error::ConflictingTokenUrl {
                first: first.clone(),
                second: path.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                debug!("Token URL: {}", path);
                self.token_url = Some(path.to_string());
                Ok(())
            }
        }
    }

    pub fn token_url(&self) -> Option<&str> {
        self.token_url.as_deref()
    }

    pub fn security_schemes(&self) -> &IndexMap<String, SecurityScheme> {
        &self.security_schemes
    }

    /// Consumes the accumulator, returning the registered schemes with the recorded token
    /// URL filled into every OAuth2 password flow.
    pub fn into_security_schemes(self) -> IndexMap<String, SecurityScheme> {
        let Some(token_url) = self.token_url else {
            return self.security_schemes;
        };

        self.security_schemes
            .into_iter()
            .map(|(name, mut scheme)| {
                if let Some(flow) = scheme.flows.as_mut().and_then(|f| f.password.as_mut()) {
                    flow.token_url = Some(token_url.clone());
                }
                (name, scheme)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration_wins() {
        let mut state = BuildState::new();
        state.register_scheme("bearer", &SecurityScheme::http_bearer(Some("JWT")));
        state.register_scheme("bearer", &SecurityScheme::http_bearer(None));

        assert_eq!(state.security_schemes().len(), 1);
        assert_eq!(
            state.security_schemes()["bearer"].bearer_format.as_deref(),
            Some("JWT")
        );
    }

    #[test]
    fn test_same_token_url_twice_is_fine() {
        let mut state = BuildState::new();
        state.record_token_url("/token").unwrap();
        state.record_token_url("/token").unwrap();
        assert_eq!(state.token_url(), Some("/token"));
    }

    #[test]
    fn test_second_token_url_conflicts() {
        let mut state = BuildState::new();
        state.record_token_url("/token").unwrap();

        let err = state.record_token_url("/login").unwrap_err();
        assert!(matches!(
            err,
            Error::ConflictingTokenUrl { ref first, ref second } if first == "/token" && second == "/login"
        ));
    }

    #[test]
    fn test_token_url_substituted_into_password_flows() {
        let mut state = BuildState::new();
        state.register_scheme("oauth", &SecurityScheme::oauth2_password(&[("read", "Read")]));
        state.register_scheme("bearer", &SecurityScheme::http_bearer(None));
        state.record_token_url("/token").unwrap();

        let schemes = state.into_security_schemes();
        let flow = schemes["oauth"]
            .flows
            .as_ref()
            .and_then(|f| f.password.as_ref())
            .unwrap();
        assert_eq!(flow.token_url.as_deref(), Some("/token"));
        assert!(schemes["bearer"].flows.is_none());
    }

    #[test]
    fn test_without_token_url_schemes_are_unchanged() {
        let mut state = BuildState::new();
        let scheme = SecurityScheme::oauth2_password(&[]);
        state.register_scheme("oauth", &scheme);

        let schemes = state.into_security_schemes();
        assert_eq!(schemes["oauth"], scheme);
    }
}
