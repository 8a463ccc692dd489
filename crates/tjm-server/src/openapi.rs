use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TJM Pipeline API",
        version = "0.1.0",
        description = "Triggers normalization runs over raw freelance job-offer files."
    ),
    paths(
        crate::routes::process,
        crate::routes::status,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::ProcessBody,
        crate::dto::ProcessResponseBody,
        crate::dto::StatusResponse,
        crate::dto::HealthResponse,
        crate::dto::SinkHealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "pipeline", description = "Batch runs"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer token security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some("Set via TJM_SERVER_API_KEY."))
                        .build(),
                ),
            );
        }
    }
}
