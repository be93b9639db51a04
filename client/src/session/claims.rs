use jsonwebtoken::{DecodingKey, Validation, decode};
use shared::types::AccessClaims;

use crate::error::AuthError;

/// Read the claims out of an access token without verifying its signature.
///
/// The client does not hold the signing key. Expiry is not checked either:
/// an expired token is still a valid session that the gateway will refresh
/// on the first 401.
pub fn decode_claims(access: &str) -> Result<AccessClaims, AuthError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessClaims>(access, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::Decode(e.to_string()))
}
