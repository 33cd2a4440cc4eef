//! Unique names and URLs for test-created resources.

use rand::distributions::Alphanumeric;
use rand::Rng;

const NAME_LENGTH: usize = 10;

/// Fixture host used for throwaway repository URLs
pub const FIXTURE_BASE_URL: &str = "https://content-services.github.io/fixtures";

/// Ten random lowercase alphanumerics
pub fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NAME_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// A syntactically valid repository URL nobody else will be using
pub fn random_url() -> String {
    format!("{}/{}/", FIXTURE_BASE_URL, random_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_name_shape() {
        let name = random_name();
        assert_eq!(name.len(), 10);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(random_name(), random_name());
    }

    #[test]
    fn test_random_url_shape() {
        let url = random_url();
        assert!(url.starts_with("https://content-services.github.io/fixtures/"));
        assert!(url.ends_with('/'));
    }
}
