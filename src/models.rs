use serde::{Deserialize, Deserializer, Serialize};

/// Bearer token claims issued by the identity service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Login name. Older issuers write it as `unique_name`.
    #[serde(default, alias = "unique_name")]
    pub sub: String,
    #[serde(alias = "UserId", deserialize_with = "number_or_string")]
    pub user_id: u64,
    /// The employee record letters are filed under.
    #[serde(alias = "EmployeeId", deserialize_with = "number_or_string")]
    pub employee_id: u64,
    #[serde(deserialize_with = "number_or_string")]
    pub role: u8, // role id
    pub exp: usize,
}

/// Some issuers write numeric claims as strings.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Deserialize<'de>,
    T::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_ids() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": "alice",
            "UserId": "5",
            "EmployeeId": "42",
            "role": "3",
            "exp": 1,
        }))
        .unwrap();
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.employee_id, 42);
        assert_eq!(claims.role, 3);
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let parsed = serde_json::from_value::<Claims>(json!({
            "sub": "alice",
            "user_id": "five",
            "employee_id": 1,
            "role": 3,
            "exp": 1,
        }));
        assert!(parsed.is_err());
    }
}
