//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use crate::config::StyleMode;
    use std::path::PathBuf;

    pub fn source() -> PathBuf {
        "src".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn style() -> StyleMode {
        StyleMode::Page
    }

    pub mod tailwind {
        pub fn command() -> Vec<String> {
            vec!["tailwindcss".into()]
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }
}
