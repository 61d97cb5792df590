use utoipa::{Modify, OpenApi};

use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        users_handlers::list_users,
        users_handlers::get_user,
        users_handlers::create_user,
        users_handlers::delete_user,
    ),
    components(
        schemas(
            users_dtos::CreateUserDto,
            users_dtos::CreateFileAttachmentDto,
            users_dtos::UserResponseDto,
            users_dtos::FileAttachmentResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
        )
    ),
    tags(
        (name = "users", description = "Users and their file attachments"),
    ),
    info(
        title = "User Records API",
        version = "0.1.0",
        description = "Users and their file attachments",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
