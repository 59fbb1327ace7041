pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::profile::handlers as profile_handlers;
use crate::resumes::handlers as resume_handlers;
use crate::state::AppState;
use crate::sync::handlers as sync_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile_handlers::handle_get_profile).delete(profile_handlers::handle_wipe),
        )
        .route(
            "/api/v1/profile/contact",
            patch(profile_handlers::handle_update_contact),
        )
        .route(
            "/api/v1/profile/sections/:section",
            put(profile_handlers::handle_replace_section),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resume_handlers::handle_list).post(resume_handlers::handle_create),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resume_handlers::handle_get).delete(resume_handlers::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/content",
            put(resume_handlers::handle_update_content),
        )
        .route(
            "/api/v1/resumes/:id/title",
            patch(resume_handlers::handle_rename),
        )
        .route(
            "/api/v1/resumes/:id/tailor",
            post(resume_handlers::handle_tailor),
        )
        // Drive sync
        .route("/api/v1/sync/backup", post(sync_handlers::handle_backup))
        .route("/api/v1/sync/restore", post(sync_handlers::handle_restore))
        .with_state(state)
}
