use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single revocation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevocationStatus {
    Good,
    Revoked,
    Unknown,
}

impl RevocationStatus {
    /// Good and Revoked end the validator chain; Unknown does not
    pub fn is_decisive(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for RevocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Good => "GOOD",
            Self::Revoked => "REVOKED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// PSD2 roles a third party provider can be authorized for.
///
/// Ordering follows declaration order so role sets iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Psd2Role {
    /// Account information service provider
    Aisp,
    /// Payment initiation service provider
    Pisp,
    /// Card based payment instrument issuer
    Cbpii,
    /// Account servicing payment service provider
    Aspsp,
}

impl Psd2Role {
    pub const ALL: [Psd2Role; 4] = [Self::Aisp, Self::Pisp, Self::Cbpii, Self::Aspsp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aisp => "AISP",
            Self::Pisp => "PISP",
            Self::Cbpii => "CBPII",
            Self::Aspsp => "ASPSP",
        }
    }

    /// Role name as written in the `RolesOfPSP` QC statement (ETSI TS 119 495)
    pub fn from_psd2_name(name: &str) -> Option<Self> {
        match name.trim() {
            "PSP_AI" => Some(Self::Aisp),
            "PSP_PI" => Some(Self::Pisp),
            "PSP_IC" => Some(Self::Cbpii),
            "PSP_AS" => Some(Self::Aspsp),
            _ => None,
        }
    }

    /// Role identifier OID from the `RolesOfPSP` QC statement
    pub fn from_role_oid(oid: &str) -> Option<Self> {
        match oid {
            "0.4.0.19495.1.1" => Some(Self::Aspsp),
            "0.4.0.19495.1.2" => Some(Self::Pisp),
            "0.4.0.19495.1.3" => Some(Self::Aisp),
            "0.4.0.19495.1.4" => Some(Self::Cbpii),
            _ => None,
        }
    }
}

impl fmt::Display for Psd2Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Psd2Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .or_else(|| Self::from_psd2_name(wanted))
            .ok_or_else(|| format!("Unknown PSD2 role: {s}"))
    }
}

/// PSD2 attributes read from an eIDAS qualified certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateContent {
    /// Roles resolved from the role identifier OIDs
    pub psp_roles: Vec<Psd2Role>,
    /// Roles resolved from the role names
    pub psd2_roles: Vec<Psd2Role>,
    pub nca_name: Option<String>,
    pub nca_id: Option<String>,
    pub organization_id: Option<String>,
    pub common_name: Option<String>,
}

impl CertificateContent {
    pub fn has_role(&self, role: Psd2Role) -> bool {
        self.psp_roles.contains(&role) || self.psd2_roles.contains(&role)
    }
}
