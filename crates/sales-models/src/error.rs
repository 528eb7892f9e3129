use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("email is not unique")]
    UniqueEmail,

    #[error("authentication failed")]
    AuthenticationFailure,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
