use std::sync::Arc;

use axum::response::Html;
use chrono::{Datelike, Utc};

use crate::error::AppError;
use crate::models::{TennisSessionRepository, UserRepository};
use crate::templates::{DefaultData, TemplateCache, TemplateData, TemplateError};
use crate::web::context::RequestContext;
use crate::web::session::{SessionExt, FLASH};

/// Dependencies shared by every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub tennis_sessions: Arc<dyn TennisSessionRepository>,
    pub templates: Arc<TemplateCache>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tennis_sessions: Arc<dyn TennisSessionRepository>,
        templates: Arc<TemplateCache>,
    ) -> Self {
        Self {
            users,
            tennis_sessions,
            templates,
        }
    }

    /// Renders a page with the per-request defaults filled in.
    ///
    /// The flash message is consumed here, and only for a page that exists.
    pub async fn render(
        &self,
        ctx: &RequestContext,
        name: &str,
        data: TemplateData,
    ) -> Result<Html<String>, AppError> {
        if !self.templates.contains(name) {
            return Err(TemplateError::NotFound(name.to_owned()).into());
        }

        let defaults = DefaultData {
            current_year: Utc::now().year(),
            csrf_token: ctx.csrf_token.clone(),
            authenticated_user: ctx.user.as_deref().cloned(),
            flash: ctx.session.pop_string(FLASH).await?,
        };

        let html = self.templates.render_page(name, &data, &defaults)?;
        Ok(Html(html))
    }
}
