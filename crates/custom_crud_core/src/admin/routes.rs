//! URL construction for the admin page and its submissions.

use crate::admin::action::AdminAction;
use crate::admin::notice::Notice;
use crate::config::AdminConfig;
use crate::model::record::RecordId;
use url::form_urlencoded::Serializer;

/// Name of the query parameter carrying the anti-forgery token.
pub const NONCE_PARAM: &str = "_wpnonce";

/// Paths and slug the admin surface is mounted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRoutes {
    page_path: String,
    post_path: String,
    page_slug: String,
}

impl AdminRoutes {
    pub fn new(
        page_path: impl Into<String>,
        post_path: impl Into<String>,
        page_slug: impl Into<String>,
    ) -> Self {
        Self {
            page_path: page_path.into(),
            post_path: post_path.into(),
            page_slug: page_slug.into(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(
            config.page_path.as_str(),
            config.post_path.as_str(),
            config.page_slug.as_str(),
        )
    }

    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    pub fn post_path(&self) -> &str {
        &self.post_path
    }

    pub fn page_slug(&self) -> &str {
        &self.page_slug
    }

    /// Listing page, optionally with an outcome notice.
    pub fn listing_url(&self, notice: Option<Notice>) -> String {
        let mut query = Serializer::new(String::new());
        query.append_pair("page", &self.page_slug);
        if let Some(notice) = notice {
            query.append_pair("notice", notice.as_str());
        }
        format!("{}?{}", self.page_path, query.finish())
    }

    /// Listing page with the form pre-filled from record `id`.
    pub fn edit_url(&self, id: RecordId) -> String {
        let query = Serializer::new(String::new())
            .append_pair("page", &self.page_slug)
            .append_pair("action", "edit")
            .append_pair("id", &id.to_string())
            .finish();
        format!("{}?{}", self.page_path, query)
    }

    /// Delete link for record `id` carrying `token`.
    pub fn delete_url(&self, id: RecordId, token: &str) -> String {
        let query = Serializer::new(String::new())
            .append_pair("action", AdminAction::DeleteCustomData.as_str())
            .append_pair("id", &id.to_string())
            .append_pair(NONCE_PARAM, token)
            .finish();
        format!("{}?{}", self.post_path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::AdminRoutes;
    use crate::admin::notice::Notice;

    fn routes() -> AdminRoutes {
        AdminRoutes::new("/wp-admin/admin.php", "/wp-admin/admin-post.php", "custom-crud-plugin")
    }

    #[test]
    fn builds_listing_and_edit_urls() {
        let routes = routes();
        assert_eq!(
            routes.listing_url(None),
            "/wp-admin/admin.php?page=custom-crud-plugin"
        );
        assert_eq!(
            routes.listing_url(Some(Notice::Created)),
            "/wp-admin/admin.php?page=custom-crud-plugin&notice=created"
        );
        assert_eq!(
            routes.edit_url(3),
            "/wp-admin/admin.php?page=custom-crud-plugin&action=edit&id=3"
        );
    }

    #[test]
    fn delete_url_targets_post_path_with_token() {
        assert_eq!(
            routes().delete_url(9, "abc-_DEF"),
            "/wp-admin/admin-post.php?action=delete_custom_data&id=9&_wpnonce=abc-_DEF"
        );
    }
}
