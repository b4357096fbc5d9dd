/* 📖 # How are preference keys grouped?

By naming convention only. A key belongs to a category when it starts with the
category's prefix, e.g. `temp_session_token` is a Temp key. Nothing about the
category is stored alongside the value.

Bulk removal takes a snapshot of the keys first and then removes the matching keys
one by one. Writers running at the same time may revive a key or add one the scan
never saw; there is no transaction spanning the whole sweep.
*/

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use prefkit_base::{PrefError, err};

use crate::preferences::Preferences;

/// Key-prefix categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Temp,
    System,
    User,
    Setting,
    Default,
    General,
    Common,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Temp,
        Category::System,
        Category::User,
        Category::Setting,
        Category::Default,
        Category::General,
        Category::Common,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Category::Temp => "temp_",
            Category::System => "system_",
            Category::User => "user_",
            Category::Setting => "setting_",
            Category::Default => "default_",
            Category::General => "general_",
            Category::Common => "common_",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Temp => "temp",
            Category::System => "system",
            Category::User => "user",
            Category::Setting => "setting",
            Category::Default => "default",
            Category::General => "general",
            Category::Common => "common",
        }
    }

    pub fn matches(self, key: &str) -> bool {
        key.starts_with(self.prefix())
    }

    /// The category a key belongs to, if any.
    pub fn of_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|category| category.matches(key))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Category {
    type Err = Box<PrefError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                err!(
                    "Unknown category '{}', expected one of: {}",
                    s,
                    Category::ALL.map(Category::name).join(", ")
                )
            })
    }
}

/// Removes every key in `category` from `prefs`.
///
/// Returns `false` without touching the store when `category` is `None`.
/// Otherwise returns whether at least one key was removed.
pub fn remove_by_category(prefs: &Preferences, category: Option<Category>) -> bool {
    let Some(category) = category else {
        debug!(store = prefs.name(), "no category given, nothing removed");
        return false;
    };
    let snapshot = prefs.get_all();
    let mut removed = 0usize;
    for key in snapshot.keys().filter(|key| category.matches(key)) {
        if prefs.remove(key) {
            removed += 1;
        }
    }
    info!(store = prefs.name(), %category, removed, "removed preferences by category");
    removed > 0
}

impl Preferences {
    /// See [`remove_by_category`].
    pub fn remove_by_category(&self, category: Option<Category>) -> bool {
        remove_by_category(self, category)
    }

    /// Removes every `temp_` key.
    pub fn remove_temp(&self) -> bool {
        self.remove_by_category(Some(Category::Temp))
    }

    /// Sorted keys currently stored under `category`.
    pub fn keys_in_category(&self, category: Category) -> Vec<String> {
        self.get_all()
            .into_keys()
            .filter(|key| category.matches(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use expect_test::expect;
    use parking_lot::Mutex;

    use crate::store::{ChangeListener, InMemoryStore, StoreHandle};
    use crate::value::PrefValue;

    fn sample_prefs() -> Preferences {
        let store = InMemoryStore::with_values(
            "prefs",
            [
                ("temp_a".to_string(), PrefValue::Bool(true)),
                ("temp_b".to_string(), PrefValue::Int(1)),
                ("user_x".to_string(), PrefValue::from("k")),
            ],
        );
        Preferences::new(StoreHandle::new(store))
    }

    #[test]
    fn test_prefixes() {
        let prefixes = Category::ALL.map(Category::prefix).join(" ");
        expect!["temp_ system_ user_ setting_ default_ general_ common_"].assert_eq(&prefixes);
    }

    #[test]
    fn test_of_key() {
        assert_eq!(Category::of_key("temp_token"), Some(Category::Temp));
        assert_eq!(Category::of_key("setting_theme"), Some(Category::Setting));
        assert_eq!(Category::of_key("tempfile"), None);
        assert_eq!(Category::of_key("TEMP_upper"), None);
        assert_eq!(Category::of_key(""), None);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("temp".parse::<Category>().unwrap(), Category::Temp);
        assert_eq!("COMMON".parse::<Category>().unwrap(), Category::Common);
        assert_eq!(Category::General.to_string(), "general");

        let err = "bogus".parse::<Category>().unwrap_err();
        expect![[r#"Unknown category 'bogus', expected one of: temp, system, user, setting, default, general, common"#]]
            .assert_eq(&err.to_string());
    }

    #[test]
    fn test_remove_by_none_has_no_effect() {
        let prefs = sample_prefs();
        let writes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&writes);
        let listener: ChangeListener = Arc::new(move |_: &str, _: &str| *counter.lock() += 1);
        prefs.subscribe(&listener);

        assert!(!prefs.remove_by_category(None));

        assert_eq!(prefs.get_all().len(), 3);
        assert_eq!(*writes.lock(), 0);
    }

    #[test]
    fn test_remove_by_category_temp() {
        let prefs = sample_prefs();

        assert!(prefs.remove_by_category(Some(Category::Temp)));

        assert!(!prefs.contains("temp_a"));
        assert!(!prefs.contains("temp_b"));
        assert_eq!(prefs.get::<String>("user_x").unwrap(), "k");

        assert!(!prefs.remove_by_category(Some(Category::Temp)));
    }

    #[test]
    fn test_remove_temp_matches_remove_by_category() {
        let by_category = sample_prefs();
        let temp = sample_prefs();

        assert_eq!(
            by_category.remove_by_category(Some(Category::Temp)),
            temp.remove_temp()
        );
        assert_eq!(by_category.get_all(), temp.get_all());
        assert!(!temp.remove_temp());
    }

    #[test]
    fn test_remove_by_category_without_matches() {
        let prefs = sample_prefs();

        assert!(!remove_by_category(&prefs, Some(Category::System)));
        assert_eq!(prefs.get_all().len(), 3);
    }

    #[test]
    fn test_keys_in_category() {
        let prefs = sample_prefs();

        assert_eq!(prefs.keys_in_category(Category::Temp), ["temp_a", "temp_b"]);
        assert_eq!(prefs.keys_in_category(Category::User), ["user_x"]);
        assert!(prefs.keys_in_category(Category::Common).is_empty());
    }
}
