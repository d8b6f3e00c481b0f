//! Catalog helpers shared by the product and category routes.

use crate::config::StorageConfig;

/// Maximum number of images on a product.
pub const MAX_PRODUCT_IMAGES: u64 = 10;

/// Turn image entries into public URLs.
///
/// Absolute `http(s)` URLs are kept as they are. Anything else is treated as
/// an object key in the R2 bucket and joined onto its public URL.
///
/// # Errors
///
/// Returns a message naming the first entry that cannot be resolved: a bare
/// key without storage configured, or an empty or malformed entry.
pub fn resolve_images(
    entries: &[String],
    storage: Option<&StorageConfig>,
) -> Result<Vec<String>, String> {
    entries
        .iter()
        .map(|entry| resolve_image(entry.trim(), storage))
        .collect()
}

fn resolve_image(entry: &str, storage: Option<&StorageConfig>) -> Result<String, String> {
    if entry.is_empty() {
        return Err("Image entries must not be empty".to_owned());
    }

    if entry.starts_with("http://") || entry.starts_with("https://") {
        return url::Url::parse(entry)
            .map(|u| u.to_string())
            .map_err(|e| format!("Invalid image URL '{entry}': {e}"));
    }

    if entry.contains("://") || entry.contains("..") {
        return Err(format!("Invalid image key '{entry}'"));
    }

    storage
        .map(|s| s.public_url_for(entry))
        .ok_or_else(|| format!("Image '{entry}' is not a URL and image storage is not configured"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn storage() -> StorageConfig {
        StorageConfig {
            account_id: "acc".to_owned(),
            access_key_id: "key".to_owned(),
            secret_access_key: SecretString::from("s3cr3t".to_owned()),
            bucket_name: "images".to_owned(),
            public_url: "https://cdn.emporium.test".to_owned(),
        }
    }

    #[test]
    fn test_urls_pass_through() {
        let resolved = resolve_images(&["https://img.example.com/a.png".to_owned()], None).unwrap();
        assert_eq!(resolved, vec!["https://img.example.com/a.png"]);
    }

    #[test]
    fn test_keys_resolve_against_public_url() {
        let storage = storage();
        let resolved = resolve_images(
            &["products/mug.jpg".to_owned(), "/products/cup.jpg".to_owned()],
            Some(&storage),
        )
        .unwrap();
        assert_eq!(
            resolved,
            vec![
                "https://cdn.emporium.test/products/mug.jpg",
                "https://cdn.emporium.test/products/cup.jpg"
            ]
        );
    }

    #[test]
    fn test_key_without_storage_is_rejected() {
        let err = resolve_images(&["products/mug.jpg".to_owned()], None).unwrap_err();
        assert!(err.contains("not configured"));
    }

    #[test]
    fn test_rejects_odd_entries() {
        let storage = storage();
        assert!(resolve_images(&[" ".to_owned()], Some(&storage)).is_err());
        assert!(resolve_images(&["ftp://x/y".to_owned()], Some(&storage)).is_err());
        assert!(resolve_images(&["../secret".to_owned()], Some(&storage)).is_err());
    }
}
