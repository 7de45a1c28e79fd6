use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact_info: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if !self.email.contains('@') {
            return Err("A valid email is required".to_string());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }
        Ok(())
    }
}

/// Body of a login response. Only the credential is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl LoginResponse {
    /// The credential, if the service sent a non-empty one
    pub fn into_token(self) -> Option<String> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(resp.into_token().as_deref(), Some("abc"));

        let resp: LoginResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.into_token(), None);

        let resp: LoginResponse = serde_json::from_str(r#"{"access_token": ""}"#).unwrap();
        assert_eq!(resp.into_token(), None);
    }

    #[test]
    fn test_signup_validation() {
        let mut req = SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            password: "pw".to_string(),
            contact_info: String::new(),
        };
        assert!(req.validate().is_ok());
        req.email = "ada".to_string();
        assert!(req.validate().is_err());
    }
}
