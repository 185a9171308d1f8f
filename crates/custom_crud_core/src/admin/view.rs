//! Admin page renderer.
//!
//! # Responsibility
//! - Render the add/edit form and the record listing as one HTML document.
//!
//! # Invariants
//! - Every interpolated value passes through `escape_html`.
//! - Rendering is pure: all data, links and tokens come in through `AdminPageView`.

use crate::admin::action::AdminAction;
use crate::admin::notice::Notice;
use crate::model::record::{Record, RecordId};
use std::fmt::Write;

/// Values shown in the add/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// `0` for a new record.
    pub id: RecordId,
    pub name: String,
    pub email: String,
}

impl From<&Record> for FormState {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }
}

/// One listing row with its pre-built action links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub record: Record,
    pub edit_url: String,
    pub delete_url: String,
}

/// Everything needed to render the admin page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPageView {
    pub title: String,
    pub form_action: String,
    pub notice: Option<Notice>,
    pub form: FormState,
    pub rows: Vec<RowView>,
}

/// Escapes text for HTML element and quoted attribute contexts.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders the full admin page.
pub fn render_admin_page(view: &AdminPageView) -> String {
    let mut html = String::with_capacity(2048 + view.rows.len() * 256);
    let title = escape_html(&view.title);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    html.push_str("</head>\n<body>\n<div class=\"wrap\">\n");
    let _ = writeln!(html, "<h2>{title}</h2>");

    if let Some(notice) = view.notice {
        let class = if notice.is_error() {
            "notice notice-error"
        } else {
            "notice notice-success"
        };
        let _ = writeln!(
            html,
            "<div class=\"{class}\" role=\"status\"><p>{}</p></div>",
            escape_html(notice.message())
        );
    }

    render_form(&mut html, view);
    render_listing(&mut html, &view.rows);

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_form(html: &mut String, view: &AdminPageView) {
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"{}\">",
        escape_html(&view.form_action)
    );
    let _ = writeln!(
        html,
        "<input type=\"hidden\" name=\"action\" value=\"{}\">",
        AdminAction::SaveCustomData.as_str()
    );
    let _ = writeln!(
        html,
        "<input type=\"hidden\" name=\"id\" value=\"{}\">",
        view.form.id
    );
    html.push_str("<table class=\"form-table\">\n");
    let _ = writeln!(
        html,
        "<tr><th>Name</th><td><input type=\"text\" name=\"name\" value=\"{}\" class=\"regular-text\"></td></tr>",
        escape_html(&view.form.name)
    );
    let _ = writeln!(
        html,
        "<tr><th>Email</th><td><input type=\"email\" name=\"email\" value=\"{}\" class=\"regular-text\"></td></tr>",
        escape_html(&view.form.email)
    );
    html.push_str("</table>\n");
    html.push_str(
        "<p class=\"submit\"><input type=\"submit\" class=\"button-primary\" value=\"Save Data\"></p>\n",
    );
    html.push_str("</form>\n");
}

fn render_listing(html: &mut String, rows: &[RowView]) {
    html.push_str("<h2>Existing Records</h2>\n");
    html.push_str("<table class=\"wp-list-table widefat fixed striped\">\n");
    html.push_str("<thead><tr><th>ID</th><th>Name</th><th>Email</th><th>Actions</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for row in rows {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td><a href=\"{}\">Edit</a> | <a href=\"{}\">Delete</a></td></tr>",
            row.record.id,
            escape_html(&row.record.name),
            escape_html(&row.record.email),
            escape_html(&row.edit_url),
            escape_html(&row.delete_url),
        );
    }
    html.push_str("</tbody>\n</table>\n");
}
