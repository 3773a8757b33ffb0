pub mod tools {
    use std::path::PathBuf;

    pub fn project_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_tests_dir_has_config() {
        assert!(tools::project_dir().join("tests").join("using-test-config.yml").is_file());
    }
}
