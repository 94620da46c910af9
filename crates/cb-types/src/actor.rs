/// The identity on whose behalf an operation runs.
///
/// Authentication happens outside the core. The caller decides who the actor
/// is and whether they hold site-wide admin rights; the core only checks
/// these inputs against document state (authorship, moderator sets).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_admin: false }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_admin: true }
    }

    /// Whether this actor is the named user.
    pub fn is(&self, username: &str) -> bool {
        self.name == username
    }
}
