use std::sync::RwLock;

/// Source of the authenticated user id that scopes every query and write.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// In-process identity holding the signed-in user, if any.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user_id: RwLock<Option<String>>,
}

impl SessionIdentity {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        tracing::info!(user_id = %user_id, "Signed in");
        match self.user_id.write() {
            Ok(mut guard) => *guard = Some(user_id),
            Err(poisoned) => *poisoned.into_inner() = Some(user_id),
        }
    }

    pub fn sign_out(&self) {
        tracing::info!("Signed out");
        match self.user_id.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user_id(&self) -> Option<String> {
        match self.user_id.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
