//! OpenAPI documentation for the `/api/v1` surface.
//!
//! The generated document is served as JSON at `/api/v1/openapi.json` and rendered with Scalar at
//! `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer token security scheme, matching `API_AUTHORIZATION_TOKEN`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("API Token")
                        .description(Some(
                            "Shared API token. Include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_API_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "API server")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::health::health,
        api::handlers::files::upload_file,
        api::handlers::files::list_files,
    ),
    components(
        schemas(
            api::models::health::HealthResponse,
            api::models::files::FileAssetResponse,
            api::models::pagination::PageMeta,
            api::models::pagination::PaginatedResponse<api::models::files::FileAssetResponse>,
        )
    ),
    tags(
        (name = "health", description = "Liveness probe."),
        (name = "files", description = "Upload files to object storage and browse their metadata.

Uploaded files are stored under `<folder>/<uuid>.<ext>` and returned with a presigned download URL.
Listing is only available when the service runs in the `local` environment."),
    ),
    info(
        title = "Twiplo API",
        version = "1.0.0",
        description = "File upload service backed by Postgres and S3-compatible object storage.

## Authentication

File endpoints require the shared API token in the `Authorization` header:

```
Authorization: Bearer YOUR_API_TOKEN
```

## Errors

Errors are returned as plain text with an appropriate status code. Internal details are logged
server-side and never included in responses.",
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/health"));
        let files = doc.paths.paths.get("/base/files").expect("files path documented");
        assert!(files.post.is_some());
        assert!(files.get.is_some());

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
        assert!(components.schemas.contains_key("FileAssetResponse"));
    }
}
