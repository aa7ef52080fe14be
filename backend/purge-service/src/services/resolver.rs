/// Key resolution - maps a logical identifier onto the objects to purge
use crate::config::PathConfig;
use crate::models::{PurgeTarget, TargetRole};

#[derive(Debug, Clone)]
pub struct KeyResolver {
    paths: PathConfig,
}

impl KeyResolver {
    pub fn new(paths: PathConfig) -> Self {
        Self { paths }
    }

    /// Primary target first, then the secondary target when a secondary path is configured
    pub fn resolve(&self, identifier: &str) -> Vec<PurgeTarget> {
        let file_name = format!("{}{}", identifier, self.paths.extension);

        let mut targets = vec![PurgeTarget::new(
            identifier,
            TargetRole::Primary,
            join_key(&self.paths.primary_path, &file_name),
        )];

        if let Some(secondary) = &self.paths.secondary_path {
            targets.push(PurgeTarget::new(
                identifier,
                TargetRole::Secondary,
                join_key(secondary, &file_name),
            ));
        }

        targets
    }
}

/// Join a path prefix and a file name with exactly one `/`
pub fn join_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(secondary: Option<&str>) -> PathConfig {
        PathConfig {
            primary_path: "products/".to_string(),
            secondary_path: secondary.map(str::to_string),
            extension: ".webp".to_string(),
        }
    }

    #[test]
    fn test_primary_only_without_secondary_path() {
        let targets = KeyResolver::new(paths(None)).resolve("abc123");

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].role, TargetRole::Primary);
        assert_eq!(targets[0].store_key, "products/abc123.webp");
        assert_eq!(targets[0].edge_path, "/products/abc123.webp");
        assert_eq!(targets[0].identifier, "abc123");
    }

    #[test]
    fn test_primary_then_secondary() {
        let targets = KeyResolver::new(paths(Some("products/200/"))).resolve("abc123");

        let keys: Vec<_> = targets.iter().map(|t| (t.role, t.store_key.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (TargetRole::Primary, "products/abc123.webp"),
                (TargetRole::Secondary, "products/200/abc123.webp"),
            ]
        );
    }

    #[test]
    fn test_secondary_presence_never_depends_on_identifier() {
        let resolver = KeyResolver::new(paths(Some("thumbs")));
        for id in ["a", "#weird", "with space", "../escape", "x\\y"] {
            let targets = resolver.resolve(id);
            assert_eq!(targets.len(), 2, "identifier {id:?}");
            assert_eq!(targets[0].role, TargetRole::Primary);
            assert_eq!(targets[1].role, TargetRole::Secondary);
        }
    }

    #[test]
    fn test_join_key_separator_handling() {
        assert_eq!(join_key("products", "a.webp"), "products/a.webp");
        assert_eq!(join_key("products/", "a.webp"), "products/a.webp");
        assert_eq!(join_key("products//", "a.webp"), "products/a.webp");
        assert_eq!(join_key("", "a.webp"), "a.webp");
    }

    #[test]
    fn test_backslash_keys_normalize_only_edge_path() {
        let resolver = KeyResolver::new(PathConfig {
            primary_path: "images\\200".to_string(),
            secondary_path: None,
            extension: ".webp".to_string(),
        });
        let target = &resolver.resolve("abc")[0];

        assert_eq!(target.store_key, "images\\200/abc.webp");
        assert_eq!(target.edge_path, "/images/200/abc.webp");
    }
}
