use souk_auth::Principal;

/// Caller on a public route: a principal when a valid bearer token was
/// presented, anonymous otherwise.
///
/// Protected routes receive a plain [`Principal`] extension instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Caller {
    principal: Option<Principal>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_some_and(|p| p.is_admin())
    }
}
