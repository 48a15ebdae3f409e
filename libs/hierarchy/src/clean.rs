//! Display names for mangled synthesis identifiers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SOURCE_PATH: Regex =
        Regex::new(r"\$?(?:[A-Za-z]:[\\/]|/)[^:]*\.s?v(?::.*)?$").unwrap();
    static ref HASH: Regex = Regex::new(r"\$[0-9a-f]{32,}").unwrap();
    static ref PARAMETERS: Regex = Regex::new(r"\\[A-Z_][A-Z0-9_]*=.*$").unwrap();
    static ref NUMBERED_PREFIX: Regex = Regex::new(r"^\$[0-9]+\$").unwrap();
}

/// Turns raw identifiers from a synthesis tool into human-readable names.
pub trait NameCleaner: Send + Sync {
    /// Returns the display name for `raw`. Never returns an empty string.
    fn clean(&self, raw: &str) -> String;
}

/// Cleans the identifiers Yosys generates for parametrized modules and
/// automatically named cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct YosysNameCleaner;

impl NameCleaner for YosysNameCleaner {
    fn clean(&self, raw: &str) -> String {
        let mut name = SOURCE_PATH.replace(raw, "").into_owned();

        // $paramod\<module>\<PARAM>=<value>... or $paramod$<hash>\<module>
        if name.starts_with("$paramod") {
            if let Some(module) = name.split('\\').nth(1).filter(|s| !s.is_empty()) {
                name = module.to_string();
            }
        }

        name = HASH.replace_all(&name, "").into_owned();
        name = PARAMETERS.replace(&name, "").into_owned();
        name = NUMBERED_PREFIX.replace(&name, "").into_owned();
        let name = name.trim_matches(|c| c == '$' || c == '\\');

        if !name.is_empty() {
            return name.to_string();
        }
        raw.rsplit('\\')
            .map(|s| s.trim_matches('$'))
            .find(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string()
    }
}
