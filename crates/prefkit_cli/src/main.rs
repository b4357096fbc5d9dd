/* 📖 # Why does the CLI parse its own arguments?

The command set is small and fixed, so a match over the argument list is all it
takes. No clap or similar dependency needed.

The CLI always runs against the current directory: `prefkit.toml` there configures
where stores live (defaults apply if the file is missing).

Commands:
- `list [store]`: print every key of a store (the default store if none given)
- `get <store> <key>`
- `set <store> <key> <type> <value>` with type one of bool, int, long, float,
  string, string_set (comma-separated)
- `remove <store> <key>`
- `clear <store>`
- `remove-category <store> <category>`
- `categories`: print the known categories and their prefixes

Exit codes:
- 0: Success
- 1: Error (bad arguments, unreadable store, failed commit, missing key)
*/

use std::env;
use std::io::{self, Write};
use std::process;

use prefkit_base::tracing::init_tracing;
use prefkit_base::{FilePath, PalHandle, PrefResult, RealPal, bail};
use prefkit_store::{Category, PrefValue, PreferenceScope, Preferences, load_config};
use tracing::debug;

const USAGE: &str = "\
Usage: prefkit <command> [args]

Commands:
  list [store]
  get <store> <key>
  set <store> <key> <type> <value>
  remove <store> <key>
  clear <store>
  remove-category <store> <category>
  categories";

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let current_dir = env::current_dir().unwrap_or_else(|e| {
        eprintln!("Error: Failed to get current directory: {}", e);
        process::exit(1);
    });

    let pal = PalHandle::new(RealPal::new(current_dir));
    let config = match load_config(&pal, &FilePath::from("prefkit.toml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config from prefkit.toml: {}", e);
            process::exit(1);
        }
    };
    debug!(?config, "configuration loaded");

    let scope = PreferenceScope::new(pal, config);
    let args: Vec<String> = env::args().skip(1).collect();
    let mut stdout = io::stdout().lock();

    match run(&scope, &args, &mut stdout) {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Executes one command. `Ok(false)` means the command ran but did not succeed.
fn run(scope: &PreferenceScope, args: &[String], out: &mut impl Write) -> PrefResult<bool> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let success = match args.as_slice() {
        ["list"] => list(&Preferences::open_default(scope)?, out)?,
        ["list", store] => list(&Preferences::open(scope, store)?, out)?,
        ["get", store, key] => {
            let prefs = Preferences::open(scope, store)?;
            match prefs.store().get(key) {
                Some(value) => {
                    print_line(out, format_args!("{} ({})", value, value.kind()))?;
                    true
                }
                None => {
                    eprintln!("Key '{}' not found in store '{}'", key, store);
                    false
                }
            }
        }
        ["set", store, key, kind, raw] => {
            let value = PrefValue::parse(kind, raw)?;
            Preferences::open(scope, store)?
                .edit()
                .put_value(*key, value)
                .commit()
        }
        ["remove", store, key] => {
            let removed = Preferences::open(scope, store)?.remove(key);
            if !removed {
                eprintln!("Key '{}' not removed from store '{}'", key, store);
            }
            removed
        }
        ["clear", store] => Preferences::open(scope, store)?.clear(),
        ["remove-category", store, category] => {
            let category: Category = category.parse()?;
            let prefs = Preferences::open(scope, store)?;
            let keys = prefs.keys_in_category(category);
            prefs.remove_by_category(Some(category));
            let removed = keys.iter().filter(|key| !prefs.contains(key)).count();
            print_line(
                out,
                format_args!("Removed {} {} preference(s)", removed, category),
            )?;
            if removed < keys.len() {
                eprintln!(
                    "Failed to remove {} of {} {} preference(s) from store '{}'",
                    keys.len() - removed,
                    keys.len(),
                    category,
                    store
                );
            }
            removed == keys.len()
        }
        ["categories"] => {
            for category in Category::ALL {
                print_line(out, format_args!("{:<10}{}", category, category.prefix()))?;
            }
            true
        }
        _ => bail!("Unrecognized arguments\n\n{}", USAGE),
    };
    Ok(success)
}

fn list(prefs: &Preferences, out: &mut impl Write) -> PrefResult<bool> {
    for (key, value) in prefs.get_all() {
        print_line(out, format_args!("{} = {} ({})", key, value, value.kind()))?;
    }
    Ok(true)
}

fn print_line(out: &mut impl Write, line: std::fmt::Arguments<'_>) -> PrefResult<()> {
    writeln!(out, "{}", line).map_err(|e| prefkit_base::err!("Failed to write output: {}", e))
}
