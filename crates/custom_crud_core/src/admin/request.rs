//! Raw admin request payloads.
//!
//! Every field is optional text so any query string or form body parses;
//! coercion and validation happen in the controller.

use serde::Deserialize;

/// Query of the listing/edit page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdminPageQuery {
    pub page: Option<String>,
    pub action: Option<String>,
    pub id: Option<String>,
    pub notice: Option<String>,
}

/// Fields of a submission to the post path, from the form body (save) or
/// the query string (delete).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdminPostRequest {
    pub action: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "_wpnonce")]
    pub nonce: Option<String>,
}
