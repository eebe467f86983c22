use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::error::{self, AppError};
use crate::forms::{Form, EMAIL_RX};
use crate::models::ModelError;
use crate::templates::TemplateData;
use crate::web::context::RequestContext;
use crate::web::session::{AUTHENTICATED_USER_ID, FLASH};
use crate::web::state::AppState;

type Submission = Result<axum::Form<Vec<(String, String)>>, FormRejection>;

const EXPIRY_CHOICES: &[&str] = &["365", "7", "1"];

fn parse(submission: Submission) -> Result<Form, AppError> {
    let axum::Form(pairs) = submission.map_err(|_| AppError::Client(StatusCode::BAD_REQUEST))?;
    Ok(Form::new(pairs))
}

fn with_form(form: Form) -> TemplateData {
    TemplateData {
        form: Some(form),
        ..TemplateData::default()
    }
}

pub async fn home(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, AppError> {
    let tennis_sessions = state.tennis_sessions.latest().await?;
    let data = TemplateData {
        tennis_sessions,
        ..TemplateData::default()
    };
    Ok(state.render(&ctx, "home.page.html", data).await?.into_response())
}

pub async fn show_session(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = match id.parse::<i32>() {
        Ok(id) if id >= 1 => id,
        _ => return Ok(error::not_found()),
    };

    let tennis_session = match state.tennis_sessions.get(id).await {
        Ok(tennis_session) => tennis_session,
        Err(ModelError::NoRecord) => return Ok(error::not_found()),
        Err(err) => return Err(err.into()),
    };

    let data = TemplateData {
        tennis_session: Some(tennis_session),
        ..TemplateData::default()
    };
    Ok(state.render(&ctx, "show.page.html", data).await?.into_response())
}

pub async fn create_session_form(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let html = state
        .render(&ctx, "create.page.html", with_form(Form::default()))
        .await?;
    Ok(html.into_response())
}

pub async fn create_session(
    State(state): State<AppState>,
    ctx: RequestContext,
    submission: Submission,
) -> Result<Response, AppError> {
    let mut form = parse(submission)?;
    form.required(&["title", "content", "expires"])
        .max_length("title", 100)
        .permitted_values("expires", EXPIRY_CHOICES);

    if !form.valid() {
        let html = state.render(&ctx, "create.page.html", with_form(form)).await?;
        return Ok(html.into_response());
    }

    let expires_in_days: i64 = form
        .get("expires")
        .parse()
        .map_err(|_| AppError::Client(StatusCode::BAD_REQUEST))?;
    let id = state
        .tennis_sessions
        .insert(form.get("title"), form.get("content"), expires_in_days)
        .await?;
    info!(tennis_session_id = id, "tennis session created");

    ctx.session
        .insert(FLASH, "Tennis session successfully created!")
        .await?;
    Ok(Redirect::to(&format!("/session/{id}")).into_response())
}

pub async fn signup_form(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let html = state
        .render(&ctx, "signup.page.html", with_form(Form::default()))
        .await?;
    Ok(html.into_response())
}

pub async fn signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    submission: Submission,
) -> Result<Response, AppError> {
    let mut form = parse(submission)?;
    form.required(&["name", "email", "password"])
        .max_length("name", 255)
        .max_length("email", 255)
        .matches_pattern("email", &EMAIL_RX)
        .min_length("password", 10);

    if form.valid() {
        match state
            .users
            .insert(form.get("name"), form.get("email"), form.get("password"))
            .await
        {
            Ok(()) => {
                ctx.session
                    .insert(FLASH, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => form.add_error("email", "Address is already in use"),
            Err(err) => return Err(err.into()),
        }
    }

    let html = state.render(&ctx, "signup.page.html", with_form(form)).await?;
    Ok(html.into_response())
}

pub async fn login_form(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let html = state
        .render(&ctx, "login.page.html", with_form(Form::default()))
        .await?;
    Ok(html.into_response())
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    submission: Submission,
) -> Result<Response, AppError> {
    let mut form = parse(submission)?;

    match state
        .users
        .authenticate(form.get("email"), form.get("password"))
        .await
    {
        Ok(id) => {
            // New id on privilege change, so a planted session id is useless.
            ctx.session.cycle_id().await?;
            ctx.session.insert(AUTHENTICATED_USER_ID, id).await?;
            Ok(Redirect::to("/session/create").into_response())
        }
        Err(ModelError::InvalidCredentials) => {
            form.add_error("generic", "Email or Password is incorrect");
            let html = state.render(&ctx, "login.page.html", with_form(form)).await?;
            Ok(html.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(ctx: RequestContext) -> Result<Response, AppError> {
    ctx.session.remove_value(AUTHENTICATED_USER_ID).await?;
    ctx.session
        .insert(FLASH, "You've been logged out successfully!")
        .await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn not_found() -> Response {
    error::not_found()
}
