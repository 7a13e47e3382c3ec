//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::session::login,
        handlers::session::refresh_token,
        handlers::session::logout,
        handlers::me::me,
        handlers::users::list_users,
        handlers::users::set_role,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::types::TokenResponse,
        handlers::types::UserResponse,
        handlers::types::RegisterForm,
        handlers::types::LoginForm,
        handlers::types::SetRoleForm,
        crate::store::Role,
    )),
    tags(
        (name = "auth", description = "Registration and session lifecycle"),
        (name = "users", description = "User lookup and administration"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_routes() {
        let doc = openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert!(paths.iter().any(|p| p.as_str() == "/{namespace}/login"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/{namespace}/refresh-token"));
        assert!(paths.iter().any(|p| p.as_str() == "/{namespace}/set-role"));
        assert_eq!(paths.len(), 8);
    }
}
