//! Session state
//!
//! Which database the caller has selected. Held in memory only and owned by
//! the caller, so independent callers never see each other's selection.

use crate::error::{Error, Result};

/// A caller's session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_database: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected database, if any
    pub fn current_database(&self) -> Option<&str> {
        self.current_database.as_deref()
    }

    /// The selected database, or `NoDatabaseSelected`
    pub fn require_database(&self) -> Result<&str> {
        self.current_database().ok_or(Error::NoDatabaseSelected)
    }

    pub fn select(&mut self, database: impl Into<String>) {
        self.current_database = Some(database.into());
    }

    /// Forget the selection if it names `database`
    pub fn deselect_if(&mut self, database: &str) {
        if self.current_database.as_deref() == Some(database) {
            self.current_database = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_database() {
        let mut session = Session::new();
        assert!(matches!(
            session.require_database(),
            Err(Error::NoDatabaseSelected)
        ));

        session.select("shop");
        assert_eq!(session.require_database().unwrap(), "shop");
    }

    #[test]
    fn test_deselect_if() {
        let mut session = Session::new();
        session.select("shop");

        session.deselect_if("other");
        assert_eq!(session.current_database(), Some("shop"));

        session.deselect_if("shop");
        assert_eq!(session.current_database(), None);
    }
}
