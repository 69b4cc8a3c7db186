use pam_fs::NormalizedPath;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_normalization_is_idempotent(s in "[a-z./\\\\]{0,24}") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_normalized_paths_have_no_empty_components(s in "[a-z./]{0,24}") {
        let path = NormalizedPath::new(&s);
        let body = path.as_str().trim_start_matches('/');
        prop_assert!(!path.as_str().contains("//"));
        prop_assert!(!body.ends_with('/') || body.is_empty());
    }
}
