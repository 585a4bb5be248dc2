//! System tiddler classification.
//!
//! System tiddlers hold TiddlyWiki's own bookkeeping (boot code, the core
//! plugin, UI state, the story list and so on). They are stored like any
//! other tiddler but left out of listings, because the client ships them in
//! the wiki file itself.
//!
//! `$:/themes/` is not on the list. Theme tiddlers carry the user's
//! appearance settings, and hiding them makes those settings vanish after the
//! next reload.

/// Title prefixes that mark a tiddler as a system tiddler.
pub const SYSTEM_PREFIXES: &[&str] = &[
    "$:/boot/",
    "$:/core",
    "$:/HistoryList",
    "$:/isEncrypted",
    "$:/library/",
    "$:/plugins/",
    "$:/state/",
    "$:/status/",
    "$:/StoryList",
    "$:/temp/",
];

/// A set of system title prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrefixes {
    prefixes: Vec<String>,
}

impl SystemPrefixes {
    /// Creates a prefix set from arbitrary prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `title` starts with any prefix in the set.
    #[must_use]
    pub fn is_system(&self, title: &str) -> bool {
        self.prefixes.iter().any(|p| title.starts_with(p.as_str()))
    }

    /// Returns the prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for SystemPrefixes {
    fn default() -> Self {
        Self::new(SYSTEM_PREFIXES.iter().copied())
    }
}

/// Classifies `title` against the default prefix set.
#[must_use]
pub fn is_system_title(title: &str) -> bool {
    SYSTEM_PREFIXES.iter().any(|p| title.starts_with(p))
}
