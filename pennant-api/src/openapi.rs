//! OpenAPI Specification for the Pennant API
//!
//! This module defines the OpenAPI document for the banner REST API.
//! It uses utoipa to generate the OpenAPI specification from Rust types
//! and route annotations.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{banner, health, user_banner};
use crate::types::{BannerRequest, CreateBannerResponse};

use pennant_core::{Banner, BannerId, FeatureId, TagId};

/// OpenAPI document for the Pennant API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pennant API",
        version = "0.1.0",
        description = "Banner rotation service - per-tag, per-feature banner delivery with cache-aside reads",
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Banners", description = "Banner resolution and management"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        user_banner::get_user_banner,
        banner::list_banners,
        banner::create_banner,
        banner::update_banner,
        banner::delete_banner,
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            Banner,
            BannerId,
            TagId,
            FeatureId,
            BannerRequest,
            CreateBannerResponse,
            ApiError,
            ErrorCode,
            health::HealthResponse,
            health::HealthStatus,
            health::HealthDetails,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer token security scheme to the generated document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
