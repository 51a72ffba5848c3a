//! Target platform identifiers.
//!
//! A [`Platform`] names one consumer tool that rulesmith generates output for.
//! Documents declare the platforms they are eligible for with a `targets:` list,
//! which is parsed into a [`PlatformSet`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::RulesmithError;
use crate::utils::suggest;

/// A consumer tool that output can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Claude Code (`.claude/`, `CLAUDE.md`)
    Claude,
    /// Cursor (`.cursor/rules/*.mdc`)
    Cursor,
    /// OpenCode (`.opencode/`, `AGENTS.md`)
    #[serde(rename = "opencode")]
    OpenCode,
}

impl Platform {
    /// Every platform known to this build, in canonical order.
    pub const ALL: [Platform; 3] = [Platform::Claude, Platform::Cursor, Platform::OpenCode];

    /// The lowercase identifier used in documents, template blocks and the CLI.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Platform::Claude => "claude",
            Platform::Cursor => "cursor",
            Platform::OpenCode => "opencode",
        }
    }

    /// Identifiers of every known platform.
    pub fn ids() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|p| p.id())
    }

    /// Exact, case-sensitive identifier lookup.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = RulesmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Platform::ALL.into_iter().find(|p| p.id() == normalized).ok_or_else(|| {
            RulesmithError::UnknownPlatform {
                name: s.trim().to_string(),
                suggestion: suggest(&normalized, Platform::ids()),
            }
        })
    }
}

/// An ordered set of platforms.
///
/// Ordering is fixed by [`Platform`]'s declaration order so that iteration is
/// deterministic regardless of how the set was written in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlatformSet(BTreeSet<Platform>);

impl PlatformSet {
    /// The set of every known platform (the default for documents).
    #[must_use]
    pub fn all() -> Self {
        Self(Platform::ALL.into_iter().collect())
    }

    /// An empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.0.contains(&platform)
    }

    pub fn insert(&mut self, platform: Platform) -> bool {
        self.0.insert(platform)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Platform> + '_ {
        self.0.iter().copied()
    }

    /// Parse a list of identifiers. The keyword `all` expands to every platform.
    pub fn parse_ids<'a, I>(ids: I) -> Result<Self, RulesmithError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::empty();
        for id in ids {
            if id.trim().eq_ignore_ascii_case("all") {
                return Ok(Self::all());
            }
            set.insert(id.parse()?);
        }
        Ok(set)
    }
}

impl Default for PlatformSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Platform> for PlatformSet {
    fn from_iter<T: IntoIterator<Item = Platform>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PlatformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.iter().map(Platform::id).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}
