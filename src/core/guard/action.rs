//! Pure computation of a new guard name from an old one.

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// 8-4-4-4-12 hex groups joined by underscores, the UUID-shaped segment of a
/// guard name. Case-insensitive on extraction; always emitted uppercase.
fn uuid_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"([0-9A-Fa-f]{8}_[0-9A-Fa-f]{4}_[0-9A-Fa-f]{4}_[0-9A-Fa-f]{4}_[0-9A-Fa-f]{12})",
        )
        .expect("uuid suffix pattern")
    })
}

/// The requested transform(s) plus the configured prefix.
#[derive(Debug, Clone)]
pub struct GuardAction {
    prefix: String,
    refresh_prefix: bool,
    regen_uuid: bool,
}

impl GuardAction {
    pub fn new(prefix: impl Into<String>, refresh_prefix: bool, regen_uuid: bool) -> Self {
        GuardAction {
            prefix: prefix.into(),
            refresh_prefix,
            regen_uuid,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Human-readable transform list for the summary block.
    pub fn describe(&self) -> &'static str {
        match (self.refresh_prefix, self.regen_uuid) {
            (true, true) => "refresh-prefix + regen-uuid",
            (false, true) => "regen-uuid",
            (true, false) => "refresh-prefix",
            (false, false) => "none",
        }
    }

    /// Compute the new guard name, or `None` when nothing can/should change.
    ///
    /// Regeneration wins when both transforms are requested: the fresh suffix
    /// makes preserving the old one moot. A refresh with no recognizable UUID
    /// suffix yields `None`, which the runner counts as a skip.
    pub fn compute_new_guard(&self, old_guard: &str) -> Option<String> {
        if old_guard.trim().is_empty() {
            return None;
        }

        if self.regen_uuid {
            return Some(format!("{}{}", self.prefix, uuid_macro()));
        }

        if self.refresh_prefix {
            let suffix = extract_uuid_suffix(old_guard)?;
            return Some(format!("{}{}", self.prefix, suffix));
        }

        None
    }
}

/// Fresh v4 UUID shaped as a macro segment: uppercased, hyphens replaced
/// with underscores.
fn uuid_macro() -> String {
    Uuid::new_v4()
        .to_string()
        .to_uppercase()
        .replace('-', "_")
}

/// First UUID-shaped substring of `guard`, uppercased.
pub fn extract_uuid_suffix(guard: &str) -> Option<String> {
    uuid_suffix_re()
        .find(guard)
        .map(|m| m.as_str().to_uppercase())
}
