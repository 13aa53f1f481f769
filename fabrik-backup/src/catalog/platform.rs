//! Platform hint normalization.

use std::fmt;

/// Platform a tenant lives on.
///
/// Resolution is total: any hint that is not recognized, including an absent
/// or empty one, resolves to [`Platform::CloudFoundry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    CloudFoundry,
    Kubernetes,
    Sapcp,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Self::CloudFoundry, Self::Kubernetes, Self::Sapcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloudFoundry => "cloudfoundry",
            Self::Kubernetes => "kubernetes",
            Self::Sapcp => "sapcp",
        }
    }

    pub fn resolve(hint: Option<&str>) -> Self {
        let Some(hint) = hint.map(str::trim) else {
            return Self::default();
        };
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str().eq_ignore_ascii_case(hint))
            .unwrap_or_default()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
