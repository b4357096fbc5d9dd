/* 📖 # Why use a separate file for these error tests?

The span trace tests depend on the tracing subscriber being installed with an
ErrorLayer. Keeping them next to the pretty-printing tests, but away from the
error module, keeps the module itself short.
*/

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{PrefError, PrefResult, ResultExt};
    use expect_test::expect;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use tracing::span;
    use tracing_error::{ErrorLayer, SpanTraceStatus};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Set up tracing with ErrorLayer for tests.
    /// Uses `try_init()` to handle multiple tests running concurrently.
    fn setup_tracing_subscriber() {
        let _ = tracing_subscriber::registry()
            .with(ErrorLayer::default())
            .try_init();
    }

    fn mismatch() -> PrefError {
        PrefError::new(ErrorKind::TypeMismatch {
            key: "volume".to_string(),
            expected: "int",
            found: "string",
        })
    }

    #[test]
    fn test_error_from_file_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let path = PathBuf::from("prefs.json");
        let error = PrefError::new(ErrorKind::FileError {
            path: path.clone(),
            source: io_err,
        });

        match error.kind() {
            ErrorKind::FileError { path: p, .. } => assert_eq!(p, &path),
            _ => panic!("Expected FileError variant"),
        }
    }

    #[test]
    fn test_type_mismatch_display() {
        assert_eq!(
            mismatch().to_string(),
            "Preference 'volume' holds a string value, expected int"
        );
    }

    #[test]
    fn test_invalid_store_name_display() {
        let error = PrefError::new(ErrorKind::InvalidStoreName {
            name: "../etc".to_string(),
        });
        assert_eq!(error.to_string(), "Invalid store name '../etc'");
    }

    #[test]
    fn test_error_context_attachment() {
        let error = PrefError::message("original error")
            .context("first context")
            .context("second context");

        assert_eq!(error.get_context(), ["first context", "second context"]);
    }

    #[test]
    fn test_error_with_context_lazy_evaluation() {
        let mut called = false;
        let error = PrefError::message("error").with_context(|| {
            called = true;
            "lazy context".to_string()
        });

        assert!(called);
        assert_eq!(error.get_context()[0], "lazy context");
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = PrefError::message("root error")
            .context("first")
            .context("second")
            .context("third");
        assert_eq!(error.to_string(), "first: second: third: root error");
    }

    #[test]
    fn test_error_source_file_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error = PrefError::new(ErrorKind::FileError {
            path: PathBuf::from("prefs.json"),
            source: io_err,
        });
        assert_eq!(error.source().unwrap().to_string(), "access denied");
    }

    #[test]
    fn test_error_source_type_mismatch() {
        assert!(mismatch().source().is_none());
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: PrefResult<i32> = Ok(42);
        assert_eq!(result.context("operation failed").unwrap(), 42);
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: PrefResult<i32> = Err(Box::new(PrefError::message("root")));
        let err = result
            .context("step 1")
            .context("step 2")
            .with_context(|| "step 3".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: step 3: root");
    }

    #[test]
    fn test_err_macro_formats_message() {
        let error = crate::err!("store '{}' is closed", "prefs");
        assert_eq!(error.to_string(), "store 'prefs' is closed");
    }

    #[test]
    fn test_bail_macro_returns_early() {
        fn fails(flag: bool) -> PrefResult<u8> {
            if flag {
                crate::bail!("flag was {}", flag);
            }
            Ok(1)
        }
        assert_eq!(fails(false).unwrap(), 1);
        assert_eq!(fails(true).unwrap_err().to_string(), "flag was true");
    }

    #[test]
    fn test_debug_pretty_print_format() {
        let error = PrefError::message("something went wrong")
            .context("while writing store 'prefs'")
            .context("in commit");

        expect![[r#"
            something went wrong
            ├─ while writing store 'prefs'
            └─ in commit
        "#]]
        .assert_debug_eq(&error);
    }

    #[test]
    fn test_debug_without_context() {
        expect![[r#"
            Preference 'volume' holds a string value, expected int
        "#]]
        .assert_debug_eq(&mismatch());
    }

    #[test]
    fn test_spantrace_captured_inside_span() {
        setup_tracing_subscriber();

        let operation_span = span!(tracing::Level::DEBUG, "commit_store", attempt = 3);
        let _guard = operation_span.enter();

        let error = PrefError::message("disk full");
        assert_eq!(error.span_trace().status(), SpanTraceStatus::CAPTURED);

        let debug = format!("{:?}", error);
        assert!(debug.starts_with("disk full\nTrace: "));
        assert!(debug.contains("commit_store"));
        assert!(debug.contains("attempt=3"));
    }
}
