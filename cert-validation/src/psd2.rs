//! PSD2 attribute extraction from eIDAS qualified certificates.
//!
//! The roles a TPP holds are carried in the QC statements extension as a
//! `PSD2QcType` statement:
//!
//! ```text
//! PSD2QcType ::= SEQUENCE {
//!     rolesOfPSP  SEQUENCE OF SEQUENCE { roleOfPspOid OID, roleOfPspName UTF8String },
//!     nCAName     UTF8String,
//!     nCAId       UTF8String }
//! ```

use error_common::GatewayError;
use tracing::{debug, warn};
use x509_parser::der_parser::ber::BerObject;
use x509_parser::der_parser::der::parse_der;
use x509_parser::prelude::*;

use crate::certificate::ClientCertificate;
use crate::model::{CertificateContent, Psd2Role};

pub const QC_STATEMENTS_OID: &str = "1.3.6.1.5.5.7.1.3";
pub const PSD2_QC_TYPE_OID: &str = "0.4.0.19495.2";
pub const ORGANIZATION_IDENTIFIER_OID: &str = "2.5.4.97";

/// Read the PSD2 roles, competent authority and organization identifier
///
/// # Errors
///
/// Returns [`GatewayError::MalformedRoleMetadata`] when the certificate has no
/// PSD2 QC statement or the statement cannot be decoded.
pub fn extract_certificate_content(
    cert: &ClientCertificate,
) -> Result<CertificateContent, GatewayError> {
    let x509 = cert
        .x509()
        .map_err(|e| GatewayError::CertificateInvalid(e.to_string()))?;

    let extension = x509
        .extensions()
        .iter()
        .find(|ext| ext.oid.to_id_string() == QC_STATEMENTS_OID)
        .ok_or_else(|| {
            GatewayError::MalformedRoleMetadata(
                "certificate has no QC statements extension".to_string(),
            )
        })?;

    let mut content =
        parse_qc_statements(extension.value).map_err(GatewayError::MalformedRoleMetadata)?;

    content.organization_id = subject_attribute(&x509, ORGANIZATION_IDENTIFIER_OID);
    content.common_name = x509
        .subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(ToString::to_string);

    debug!(
        serial = cert.serial(),
        psp_roles = ?content.psp_roles,
        psd2_roles = ?content.psd2_roles,
        "Extracted PSD2 certificate content"
    );
    Ok(content)
}

fn subject_attribute(cert: &X509Certificate<'_>, oid: &str) -> Option<String> {
    cert.subject()
        .iter_attributes()
        .find(|attr| attr.attr_type().to_id_string() == oid)
        .and_then(|attr| attr.as_str().ok())
        .map(ToString::to_string)
}

fn parse_qc_statements(value: &[u8]) -> Result<CertificateContent, String> {
    let (_, statements) =
        parse_der(value).map_err(|e| format!("invalid QC statements encoding: {e}"))?;
    let statements = statements
        .as_sequence()
        .map_err(|e| format!("QC statements are not a sequence: {e}"))?;

    for statement in statements {
        let Ok(parts) = statement.as_sequence() else {
            continue;
        };
        let mut parts = parts.iter();
        let is_psd2 = parts
            .next()
            .and_then(|id| id.as_oid().ok())
            .is_some_and(|oid| oid.to_id_string() == PSD2_QC_TYPE_OID);
        if !is_psd2 {
            continue;
        }
        let info = parts.next().ok_or("PSD2 QC statement has no content")?;
        return parse_psd2_qc_type(info);
    }

    Err("certificate has no PSD2 QC statement".to_string())
}

fn parse_psd2_qc_type(info: &BerObject<'_>) -> Result<CertificateContent, String> {
    let fields = info
        .as_sequence()
        .map_err(|e| format!("PSD2 QC type is not a sequence: {e}"))?;
    let mut fields = fields.iter();

    let roles = fields
        .next()
        .ok_or("PSD2 QC type has no roles")?
        .as_sequence()
        .map_err(|e| format!("RolesOfPSP is not a sequence: {e}"))?;

    let mut content = CertificateContent::default();
    for role in roles {
        let pair = role
            .as_sequence()
            .map_err(|e| format!("RoleOfPSP is not a sequence: {e}"))?;
        let mut pair = pair.iter();
        let oid = pair
            .next()
            .and_then(|o| o.as_oid().ok())
            .map(|o| o.to_id_string())
            .ok_or("RoleOfPSP has no role identifier")?;
        let name = pair
            .next()
            .and_then(|n| n.as_str().ok())
            .ok_or("RoleOfPSP has no role name")?;

        match Psd2Role::from_role_oid(&oid) {
            Some(role) if !content.psp_roles.contains(&role) => content.psp_roles.push(role),
            Some(_) => {}
            None => warn!(role_oid = %oid, "Ignoring unrecognized PSD2 role identifier"),
        }
        match Psd2Role::from_psd2_name(name) {
            Some(role) if !content.psd2_roles.contains(&role) => content.psd2_roles.push(role),
            Some(_) => {}
            None => warn!(role_name = name, "Ignoring unrecognized PSD2 role name"),
        }
    }

    content.nca_name = fields
        .next()
        .and_then(|f| f.as_str().ok())
        .map(ToString::to_string);
    content.nca_id = fields
        .next()
        .and_then(|f| f.as_str().ok())
        .map(ToString::to_string);

    Ok(content)
}
