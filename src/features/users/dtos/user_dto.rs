use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::users::models::{FileAttachment, NewFileAttachment, NewUser, User};

/// Request DTO for creating a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, message = "first_name is required"))]
    #[schema(example = "Ada")]
    pub first_name: String,

    #[validate(length(min = 1, message = "last_name is required"))]
    #[schema(example = "Lovelace")]
    pub last_name: String,

    /// Attachments stored with the user, in order
    #[serde(default)]
    #[validate(nested)]
    pub attachs: Vec<CreateFileAttachmentDto>,
}

/// One attachment in a create request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateFileAttachmentDto {
    /// Caller-assigned identifier
    #[schema(example = 1)]
    pub file_id: i64,

    /// Standard base64 of the raw payload
    #[schema(example = "aGVsbG8=")]
    pub file_bytes: String,
}

impl TryFrom<CreateUserDto> for NewUser {
    type Error = AppError;

    /// Decodes every attachment payload; the first undecodable one rejects
    /// the whole request.
    fn try_from(dto: CreateUserDto) -> Result<Self, Self::Error> {
        let attachments = dto
            .attachs
            .into_iter()
            .enumerate()
            .map(|(index, attach)| {
                let file_bytes = BASE64_STANDARD.decode(&attach.file_bytes).map_err(|e| {
                    AppError::Validation(format!(
                        "attachs[{}].file_bytes is not valid base64: {}",
                        index, e
                    ))
                })?;
                Ok(NewFileAttachment {
                    file_id: attach.file_id,
                    file_bytes,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(NewUser {
            first_name: dto.first_name,
            last_name: dto.last_name,
            attachments,
        })
    }
}

/// Response DTO for a user with its attachments
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attachs: Vec<FileAttachmentResponseDto>,
}

/// Response DTO for an attachment; `file_bytes` is standard base64
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileAttachmentResponseDto {
    pub file_id: i64,
    pub file_bytes: String,
}

impl From<FileAttachment> for FileAttachmentResponseDto {
    fn from(a: FileAttachment) -> Self {
        Self {
            file_id: a.file_id,
            file_bytes: BASE64_STANDARD.encode(&a.file_bytes),
        }
    }
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            created_at: u.created_at,
            updated_at: u.updated_at,
            attachs: u.attachments.into_iter().map(Into::into).collect(),
        }
    }
}
