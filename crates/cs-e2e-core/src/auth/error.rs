use thiserror::Error;

use super::Persona;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid JWT token or missing exp claim")]
    InvalidToken,

    #[error("Failed to refresh JWT token for {persona} - cs_jwt cookie not found")]
    MissingSessionCookie { persona: Persona },
}
