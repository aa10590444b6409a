use std::sync::RwLock;

use fundpay_types::models::{Role, User};
use tracing::info;

/// Read-only view of the auth collaborator. Screens consult it; they never
/// write session state except through [`Session::logout`].
pub trait Session: Send + Sync {
    fn current_user(&self) -> Option<User>;

    fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|u| u.role == Role::Admin)
    }

    fn logout(&self);
}

/// In-process session, for the terminal front-end and tests.
#[derive(Debug, Default)]
pub struct MemorySession {
    user: RwLock<Option<User>>,
}

impl MemorySession {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self::new(Some(user))
    }
}

impl Session for MemorySession {
    fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn logout(&self) {
        let previous = self
            .user
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(user) = previous {
            info!(email = %user.email, "logged out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> User {
        User {
            name: "Ravi Kumar".into(),
            email: "ravi@example.com".into(),
            role: Role::Admin,
            image_url: None,
        }
    }

    #[test]
    fn admin_role_is_detected() {
        let session = MemorySession::signed_in(admin());
        assert!(session.is_admin());

        let session = MemorySession::signed_in(User {
            role: Role::User,
            ..admin()
        });
        assert!(!session.is_admin());
    }

    #[test]
    fn logout_clears_user() {
        let session = MemorySession::signed_in(admin());
        session.logout();
        assert!(session.current_user().is_none());
        assert!(!session.is_admin());
    }
}
