//! Admin request dispatch.
//!
//! # Responsibility
//! - Gate every entry point on the required capability.
//! - Build the listing/edit page from current records.
//! - Run save/delete submissions and answer with a redirect plus notice.
//!
//! # Invariants
//! - The controller borrows a connection per call and never stores one.
//! - Save/delete never surface storage errors other than through a notice.
//! - A delete whose token fails verification never reaches storage.

use crate::admin::action::{AdminAction, SubmitMethod};
use crate::admin::notice::Notice;
use crate::admin::request::{AdminPageQuery, AdminPostRequest};
use crate::admin::routes::AdminRoutes;
use crate::admin::view::{render_admin_page, AdminPageView, FormState, RowView};
use crate::config::{AppConfig, ConfigError};
use crate::db::TableName;
use crate::model::record::RecordId;
use crate::model::sanitize::coerce_id;
use crate::repo::record_repo::{RepoError, SqliteRecordRepository};
use crate::security::capability::{AdminPrincipal, Capability};
use crate::security::nonce::{delete_action, NonceIssuer};
use crate::service::record_service::{RecordService, RecordServiceError};
use log::{error, info, warn};
use rusqlite::Connection;

/// Transport-neutral response of an admin entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminResponse {
    /// 200 with an HTML document.
    Page(String),
    /// 303 to the given location.
    Redirect(String),
    /// 403; the principal lacks the required capability.
    Forbidden,
    /// 404; the `page` parameter does not select this admin page.
    NotFound,
    /// 400 with a short reason.
    BadRequest(&'static str),
    /// 500; the page could not be built.
    InternalError,
}

/// Dispatches admin requests against one record table.
#[derive(Debug, Clone)]
pub struct AdminController {
    table: TableName,
    routes: AdminRoutes,
    nonces: NonceIssuer,
    required_capability: Capability,
    page_title: String,
}

impl AdminController {
    pub fn new(
        table: TableName,
        routes: AdminRoutes,
        nonces: NonceIssuer,
        required_capability: Capability,
        page_title: impl Into<String>,
    ) -> Self {
        Self {
            table,
            routes,
            nonces,
            required_capability,
            page_title: page_title.into(),
        }
    }

    /// Builds a controller from validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.table_name()?,
            AdminRoutes::from_config(&config.admin),
            config.nonce_issuer()?,
            config.required_capability()?,
            config.admin.page_title.as_str(),
        ))
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn routes(&self) -> &AdminRoutes {
        &self.routes
    }

    pub fn nonces(&self) -> &NonceIssuer {
        &self.nonces
    }

    /// Renders the listing/edit page.
    pub fn admin_page(
        &self,
        conn: &Connection,
        principal: &AdminPrincipal,
        query: &AdminPageQuery,
    ) -> AdminResponse {
        if !self.authorize(principal, "admin_page") {
            return AdminResponse::Forbidden;
        }
        if query.page.as_deref() != Some(self.routes.page_slug()) {
            return AdminResponse::NotFound;
        }

        match self.build_page(conn, principal, query) {
            Ok(view) => AdminResponse::Page(render_admin_page(&view)),
            Err(err) => {
                error!(
                    "event=admin_page module=admin status=error table={} error={}",
                    self.table, err
                );
                AdminResponse::InternalError
            }
        }
    }

    /// Dispatches a submission on the post path.
    pub fn submit(
        &self,
        conn: &Connection,
        principal: &AdminPrincipal,
        method: SubmitMethod,
        request: &AdminPostRequest,
    ) -> AdminResponse {
        let Some(action) = request.action.as_deref().and_then(AdminAction::parse) else {
            return AdminResponse::BadRequest("unknown action");
        };
        if action.method() != method {
            return AdminResponse::BadRequest("action not allowed for this method");
        }
        if !self.authorize(principal, action.as_str()) {
            return AdminResponse::Forbidden;
        }

        let notice = match action {
            AdminAction::SaveCustomData => self.save(conn, request),
            AdminAction::DeleteCustomData => self.delete(conn, principal, request),
        };
        AdminResponse::Redirect(self.routes.listing_url(Some(notice)))
    }

    fn authorize(&self, principal: &AdminPrincipal, event: &str) -> bool {
        if principal.has_capability(&self.required_capability) {
            return true;
        }
        warn!(
            "event={} module=admin status=rejected reason=missing_capability required={}",
            event, self.required_capability
        );
        false
    }

    fn build_page(
        &self,
        conn: &Connection,
        principal: &AdminPrincipal,
        query: &AdminPageQuery,
    ) -> Result<AdminPageView, RepoError> {
        let service = RecordService::new(SqliteRecordRepository::try_new(conn, &self.table)?);

        let form = match (query.action.as_deref(), query.id.as_deref()) {
            (Some("edit"), Some(raw_id)) => {
                let id = coerce_id(raw_id);
                match service.get(id)? {
                    Some(record) => FormState::from(&record),
                    None => FormState::default(),
                }
            }
            _ => FormState::default(),
        };

        let rows = service
            .list()?
            .into_iter()
            .map(|record| {
                let token = self
                    .nonces
                    .issue(principal.user(), &delete_action(&record.id.to_string()));
                RowView {
                    edit_url: self.routes.edit_url(record.id),
                    delete_url: self.routes.delete_url(record.id, &token),
                    record,
                }
            })
            .collect();

        Ok(AdminPageView {
            title: self.page_title.clone(),
            form_action: self.routes.post_path().to_string(),
            notice: query.notice.as_deref().and_then(Notice::parse),
            form,
            rows,
        })
    }

    fn save(&self, conn: &Connection, request: &AdminPostRequest) -> Notice {
        let id: RecordId = request.id.as_deref().map_or(0, coerce_id);
        let result = SqliteRecordRepository::try_new(conn, &self.table)
            .map_err(RecordServiceError::from)
            .and_then(|repo| {
                RecordService::new(repo).save(
                    id,
                    request.name.as_deref().unwrap_or_default(),
                    request.email.as_deref().unwrap_or_default(),
                )
            });

        match result {
            Ok(outcome) => {
                info!(
                    "event=record_save module=admin status=ok outcome={:?}",
                    outcome
                );
                outcome.into()
            }
            Err(RecordServiceError::Validation(err)) => {
                info!(
                    "event=record_save module=admin status=rejected id={} reason={}",
                    id, err
                );
                err.into()
            }
            Err(RecordServiceError::Repo(err)) => {
                error!(
                    "event=record_save module=admin status=error id={} error={}",
                    id, err
                );
                Notice::StorageError
            }
        }
    }

    fn delete(
        &self,
        conn: &Connection,
        principal: &AdminPrincipal,
        request: &AdminPostRequest,
    ) -> Notice {
        let raw_id = request.id.as_deref().unwrap_or_default();
        let token = request.nonce.as_deref().unwrap_or_default();
        if raw_id.is_empty()
            || self
                .nonces
                .verify(principal.user(), &delete_action(raw_id), token)
                .is_none()
        {
            warn!("event=record_delete module=admin status=rejected reason=token_mismatch");
            return Notice::TokenRejected;
        }

        let id = coerce_id(raw_id);
        let result = SqliteRecordRepository::try_new(conn, &self.table)
            .and_then(|repo| RecordService::new(repo).delete(id));
        match result {
            Ok(outcome) => {
                info!(
                    "event=record_delete module=admin status=ok outcome={:?}",
                    outcome
                );
                outcome.into()
            }
            Err(err) => {
                error!(
                    "event=record_delete module=admin status=error id={} error={}",
                    id, err
                );
                Notice::StorageError
            }
        }
    }
}
