use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Token variable used when an auth file has no dedicated persona.
pub const DEFAULT_TOKEN_VAR: &str = "TOKEN";

/// A named test identity with its own credential and authorization scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Persona {
    #[default]
    AdminUser,
    RhelOperator,
    ReadOnly,
    LayeredRepoUser,
    RhelOnlyUser,
    NoSubsUser,
    StableSam,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown persona: {0}")]
pub struct UnknownPersona(pub String);

impl Persona {
    pub const ALL: [Persona; 7] = [
        Persona::AdminUser,
        Persona::RhelOperator,
        Persona::ReadOnly,
        Persona::LayeredRepoUser,
        Persona::RhelOnlyUser,
        Persona::NoSubsUser,
        Persona::StableSam,
    ];

    /// Auth-state file name under the auth directory
    pub fn auth_file(&self) -> &'static str {
        match self {
            Persona::AdminUser => "admin_user.json",
            Persona::RhelOperator => "rhel_operator.json",
            Persona::ReadOnly => "read-only.json",
            Persona::LayeredRepoUser => "layered-repo-user.json",
            Persona::RhelOnlyUser => "rhel-only-user.json",
            Persona::NoSubsUser => "no_subs_user.json",
            Persona::StableSam => "stable_sam.json",
        }
    }

    /// Environment variable CI uses to hand us this persona's starting token
    pub fn env_var(&self) -> &'static str {
        match self {
            Persona::AdminUser => DEFAULT_TOKEN_VAR,
            Persona::RhelOperator => "RHEL_OPERATOR_TOKEN",
            Persona::ReadOnly => "READONLY_USER_TOKEN",
            Persona::LayeredRepoUser => "LAYERED_REPO_USER_TOKEN",
            Persona::RhelOnlyUser => "RHEL_ONLY_USER_TOKEN",
            Persona::NoSubsUser => "NO_SUBS_USER_TOKEN",
            Persona::StableSam => "STABLE_SAM_TOKEN",
        }
    }

    /// File stem, e.g. `admin_user`
    pub fn name(&self) -> &'static str {
        let file = self.auth_file();
        &file[..file.len() - ".json".len()]
    }

    /// Resolve a bare file name or a storage-state path such as
    /// `.auth/stable_sam.json`.
    pub fn from_auth_file(path: &str) -> Option<Self> {
        let file = Path::new(path).file_name()?.to_str()?;
        Self::ALL.into_iter().find(|p| p.auth_file() == file)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Persona {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .or_else(|| Self::from_auth_file(s))
            .ok_or_else(|| UnknownPersona(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_table() {
        assert_eq!(Persona::AdminUser.env_var(), "TOKEN");
        assert_eq!(Persona::ReadOnly.auth_file(), "read-only.json");
        assert_eq!(Persona::ReadOnly.env_var(), "READONLY_USER_TOKEN");
        assert_eq!(Persona::StableSam.name(), "stable_sam");
        assert_eq!(Persona::default(), Persona::AdminUser);
    }

    #[test]
    fn test_from_auth_file_accepts_paths() {
        assert_eq!(Persona::from_auth_file("no_subs_user.json"), Some(Persona::NoSubsUser));
        assert_eq!(
            Persona::from_auth_file(".auth/layered-repo-user.json"),
            Some(Persona::LayeredRepoUser)
        );
        assert_eq!(Persona::from_auth_file(".auth/someone_else.json"), None);
        assert_eq!(Persona::from_auth_file(""), None);
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for persona in Persona::ALL {
            assert_eq!(persona.to_string().parse::<Persona>(), Ok(persona));
        }
        assert_eq!("rhel_operator.json".parse::<Persona>(), Ok(Persona::RhelOperator));
        assert_eq!(
            "nobody".parse::<Persona>(),
            Err(UnknownPersona("nobody".to_string()))
        );
    }
}
