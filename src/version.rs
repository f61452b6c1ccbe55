//! Engine version strings and build targets.
//!
//! Version strings look like `2020.3.4f1`: up to four numeric parts with the
//! build type letter between the third and fourth.  Field layouts of the
//! built-in classes depend on these numbers, so comparisons are tuple-wise.

use std::cmp::Ordering;
use std::fmt;

/// Parsed engine version.  Missing parts compare as zero.
#[derive(Debug, Clone, Default)]
pub struct UnityVersion {
    pub parts:      [u32; 4],
    pub build_type: String,
    raw:            String,
}

impl UnityVersion {
    pub fn parse(s: &str) -> Self {
        let mut parts = [0u32; 4];
        let mut build_type = String::new();
        let mut idx = 0;
        let mut current: Option<u32> = None;

        for ch in s.chars() {
            if let Some(d) = ch.to_digit(10) {
                current = Some(current.unwrap_or(0).saturating_mul(10).saturating_add(d));
                continue;
            }
            if let Some(n) = current.take() {
                if idx < 4 { parts[idx] = n; }
                idx += 1;
            }
            if ch.is_ascii_alphabetic() && idx == 3 && build_type.is_empty() {
                build_type.push(ch);
            }
        }
        if let Some(n) = current {
            if idx < 4 { parts[idx] = n; }
        }

        Self { parts, build_type, raw: s.to_owned() }
    }

    /// `true` for the placeholder written into stripped builds.
    pub fn is_stripped(&self) -> bool {
        self.parts[..3].iter().all(|&p| p == 0)
    }

    pub fn major(&self) -> u32 { self.parts[0] }
    pub fn minor(&self) -> u32 { self.parts[1] }

    /// `self >= major.minor.patch`.
    pub fn at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        (self.parts[0], self.parts[1], self.parts[2]) >= (major, minor, patch)
    }

    pub fn as_str(&self) -> &str { &self.raw }
}

impl PartialEq for UnityVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for UnityVersion {}

impl PartialOrd for UnityVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.parts.cmp(&other.parts))
    }
}

impl fmt::Display for UnityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── BuildTarget ──────────────────────────────────────────────────────────────

/// Target platform recorded in a container header.  Kept as the raw value
/// since new platforms appear with every engine release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildTarget(pub i32);

impl BuildTarget {
    pub const NO_TARGET:            BuildTarget = BuildTarget(-2);
    pub const UNKNOWN:              BuildTarget = BuildTarget(-1);
    pub const STANDALONE_OSX:       BuildTarget = BuildTarget(2);
    pub const STANDALONE_WINDOWS:   BuildTarget = BuildTarget(5);
    pub const IOS:                  BuildTarget = BuildTarget(9);
    pub const ANDROID:              BuildTarget = BuildTarget(13);
    pub const STANDALONE_WINDOWS64: BuildTarget = BuildTarget(19);
    pub const WEBGL:                BuildTarget = BuildTarget(20);
    pub const STANDALONE_LINUX64:   BuildTarget = BuildTarget(24);
    pub const SWITCH:               BuildTarget = BuildTarget(38);

    /// Editor-only files carry extra per-object fields.
    pub fn is_editor(self) -> bool { self == Self::NO_TARGET }
}

impl Default for BuildTarget {
    fn default() -> Self { Self::UNKNOWN }
}
