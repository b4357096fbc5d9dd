/* 📖 # How is prefkit_store layered?

From the bottom up:

- `value`: the six storable kinds (`PrefValue`) and the `PrefType` trait mapping
  Rust types onto them
- `store`: the `PreferenceStore` trait, its in-memory and JSON-file backends, and
  `StoreHandle`, which shares a store between threads and dispatches change listeners
- `scope` and `config`: open stores by name, once per scope, as configured in `prefkit.toml`
- `preferences`, `editor` and `category`: the typed API applications use

Applications normally only touch the last layer:

```
use prefkit_store::{Category, PreferenceScope, Preferences};

let scope = PreferenceScope::in_memory();
let prefs = Preferences::prefs(&scope).unwrap();

prefs.put("temp_download_id", 17);
prefs.put("user_name", "ada".to_string());

assert!(prefs.remove_by_category(Some(Category::Temp)));
assert_eq!(prefs.keys_in_category(Category::User), ["user_name"]);
```
*/

pub mod category;
pub mod config;
pub mod editor;
pub mod preferences;
pub mod scope;
pub mod store;
pub mod value;

pub use category::{Category, remove_by_category};
pub use config::{Backend, PrefsConfig, load_config};
pub use editor::Editor;
pub use preferences::{PREFERENCES_NAME, Preferences};
pub use scope::PreferenceScope;
pub use store::{ChangeListener, StoreHandle, WriteMode};
pub use value::{PrefType, PrefValue};
