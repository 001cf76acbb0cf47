//! Product image URL resolution.

/// Shown when a product has no image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-image.jpg";

/// Turns stored image references into absolute URLs.
///
/// Stored references come in three shapes: absolute `http(s)` URLs (kept
/// as-is), `/uploads/...` paths, and bare file names that live in the
/// uploads directory.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    base_url: String,
}

impl ImageResolver {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn resolve(&self, image: &str) -> String {
        let image = image.trim();
        if image.is_empty() {
            return PLACEHOLDER_IMAGE.to_owned();
        }
        if image.starts_with("http://") || image.starts_with("https://") {
            return image.to_owned();
        }
        if image.starts_with("/uploads/") {
            return format!("{}{image}", self.base_url);
        }
        format!("{}/uploads/{}", self.base_url, image.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let images = ImageResolver::new("http://localhost:5000/");

        assert_eq!(images.resolve(""), PLACEHOLDER_IMAGE);
        assert_eq!(
            images.resolve("https://cdn.example.com/w.jpg"),
            "https://cdn.example.com/w.jpg"
        );
        assert_eq!(
            images.resolve("/uploads/watch1.jpg"),
            "http://localhost:5000/uploads/watch1.jpg"
        );
        assert_eq!(
            images.resolve("watch2.jpg"),
            "http://localhost:5000/uploads/watch2.jpg"
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let images = ImageResolver::new("http://localhost:5000");
        let once = images.resolve("watch3.jpg");
        assert_eq!(images.resolve(&once), once);
    }
}
