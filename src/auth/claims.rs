use serde::{Deserialize, Serialize};

/// JWT payload binding a bearer to one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,      // user ID
    pub email: String, // user email at issue time
    pub iat: i64,      // issued at (unix seconds)
    pub exp: i64,      // expires at (unix seconds), exclusive
    pub iss: String,   // issuer
}
