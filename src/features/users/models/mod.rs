mod file_attachment;
mod user;

pub use file_attachment::{FileAttachment, NewFileAttachment};
pub use user::{NewUser, User};
