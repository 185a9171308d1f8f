//! Submission actions accepted on the admin post path.

use std::fmt::{Display, Formatter};

/// Action name of the save (insert/update) submission.
pub const ACTION_SAVE: &str = "save_custom_data";
/// Action name of the delete link.
pub const ACTION_DELETE: &str = "delete_custom_data";

/// HTTP method an action arrives with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    Get,
    Post,
}

/// Closed set of actions dispatched on the post path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    SaveCustomData,
    DeleteCustomData,
}

impl AdminAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SaveCustomData => ACTION_SAVE,
            Self::DeleteCustomData => ACTION_DELETE,
        }
    }

    /// Method the action is registered for.
    pub fn method(self) -> SubmitMethod {
        match self {
            Self::SaveCustomData => SubmitMethod::Post,
            Self::DeleteCustomData => SubmitMethod::Get,
        }
    }

    /// Parses an exact action name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            ACTION_SAVE => Some(Self::SaveCustomData),
            ACTION_DELETE => Some(Self::DeleteCustomData),
            _ => None,
        }
    }
}

impl Display for AdminAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{AdminAction, SubmitMethod};

    #[test]
    fn parses_registered_actions_only() {
        assert_eq!(
            AdminAction::parse("save_custom_data"),
            Some(AdminAction::SaveCustomData)
        );
        assert_eq!(
            AdminAction::parse("delete_custom_data"),
            Some(AdminAction::DeleteCustomData)
        );
        assert_eq!(AdminAction::parse("Save_Custom_Data"), None);
        assert_eq!(AdminAction::parse(""), None);
    }

    #[test]
    fn save_is_post_and_delete_is_get() {
        assert_eq!(AdminAction::SaveCustomData.method(), SubmitMethod::Post);
        assert_eq!(AdminAction::DeleteCustomData.method(), SubmitMethod::Get);
    }
}
