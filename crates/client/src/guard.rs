//! Navigation guards evaluated against a session snapshot

use crate::session::Session;
use std::fmt;

/// Access level a destination requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    Authenticated,
    Admin,
}

/// Where a denied caller should be sent instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Dashboard,
}

impl Redirect {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("sign in required"),
            Self::Dashboard => f.write_str("administrator access required"),
        }
    }
}

impl Guard {
    pub fn check(self, session: &Session) -> Result<(), Redirect> {
        match self {
            Self::Public => Ok(()),
            Self::Authenticated if session.is_authenticated() => Ok(()),
            Self::Admin if session.is_admin() => Ok(()),
            Self::Admin if session.is_authenticated() => Err(Redirect::Dashboard),
            Self::Authenticated | Self::Admin => Err(Redirect::Login),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn session_with_role(role: &str) -> Session {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"role":"{role}"}}"#));
        Session {
            access_token: Some(format!("e30.{payload}.sig")),
            ..Default::default()
        }
    }

    #[test]
    fn test_anonymous() {
        let session = Session::default();
        assert_eq!(Guard::Public.check(&session), Ok(()));
        assert_eq!(Guard::Authenticated.check(&session), Err(Redirect::Login));
        assert_eq!(Guard::Admin.check(&session), Err(Redirect::Login));
    }

    #[test]
    fn test_regular_user_bounced_from_admin() {
        let session = session_with_role("USER");
        assert_eq!(Guard::Authenticated.check(&session), Ok(()));
        assert_eq!(Guard::Admin.check(&session), Err(Redirect::Dashboard));
        assert_eq!(Redirect::Dashboard.path(), "/dashboard");
    }

    #[test]
    fn test_admin() {
        let session = session_with_role("ADMIN");
        assert_eq!(Guard::Admin.check(&session), Ok(()));
    }
}
