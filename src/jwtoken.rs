use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::models::lobby::User;

/// Reads the claims of a server-issued token.
///
/// The client does not hold the signing secret, so only the claims and the
/// expiry are checked. The server re-validates every token it receives.
pub fn decode_token(token: &str) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub id: String,
    pub nickname: String,
    pub exp: usize,
}

impl Claims {
    pub fn user(&self) -> User {
        User {
            id: self.id.clone(),
            nickname: self.nickname.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) fn issue_token(id: &str, nickname: &str, valid_for: Duration) -> String {
        let claims = Claims {
            id: id.to_string(),
            nickname: nickname.to_string(),
            exp: (Utc::now() + valid_for).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("server-secret".as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn reads_claims_without_the_secret() {
        let token = issue_token("u-1", "ann", Duration::days(1));
        let claims = decode_token(&token).unwrap().claims;
        assert_eq!(claims.user().id, "u-1");
        assert_eq!(claims.user().nickname, "ann");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token("u-1", "ann", Duration::days(-2));
        assert!(decode_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_token("not-a-token").is_err());
    }
}
