use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Request body for create and replace.
///
/// Fields stay loosely typed so each check can report its own error
/// (missing field vs. wrong type) instead of a generic decode failure.
/// Only a JSON object is accepted; arrays and scalars fail to decode.
#[derive(Debug, Default)]
pub struct UserPayload {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub age: Option<Value>,
}

impl<'de> Deserialize<'de> for UserPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            name: fields.remove("name"),
            email: fields.remove("email"),
            age: fields.remove("age"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_fields_are_picked_out() {
        let p: UserPayload =
            serde_json::from_value(json!({"name": "Ada", "age": 36, "extra": true})).unwrap();
        assert_eq!(p.name, Some(json!("Ada")));
        assert_eq!(p.email, None);
        assert_eq!(p.age, Some(json!(36)));
    }

    #[test]
    fn non_objects_are_rejected() {
        for body in [json!(["Ada", "ada@example.com", 36]), json!([1]), json!("Ada"), json!(null)] {
            assert!(serde_json::from_value::<UserPayload>(body.clone()).is_err(), "{body}");
        }
    }
}
