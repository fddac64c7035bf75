use crate::error::DriverError;
use crate::model::PushedImage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Body of a registry push webhook. Only the fields needed to name the pushed image are decoded.
///
/// Every field is optional so that a missing or mistyped key surfaces as a named error
/// instead of a decoding failure.
#[derive(Debug, Default, Deserialize)]
pub struct InboundPayload {
    #[serde(default, deserialize_with = "present")]
    pub push_data: Option<PushData>,
    #[serde(default, deserialize_with = "present")]
    pub repository: Option<Repository>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PushData {
    #[serde(default, deserialize_with = "lenient")]
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    #[serde(default, deserialize_with = "lenient")]
    pub repo_name: Option<String>,
}

/// A key that is present always yields `Some`, falling back to the default shape unless its value
/// is an object. Arrays are not accepted, serde would otherwise fill the fields by position.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    let decoded = match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    };
    Ok(Some(decoded))
}

/// A value of the wrong type is treated as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl InboundPayload {
    pub fn parse(payload: &Value) -> Result<Self, DriverError> {
        if !payload.is_object() {
            return Err(DriverError::BadRequestShape);
        }
        InboundPayload::deserialize(payload).map_err(|_| DriverError::BadRequestShape)
    }

    pub fn pushed_image(&self) -> Result<PushedImage, DriverError> {
        let push_data = self
            .push_data
            .as_ref()
            .ok_or(DriverError::MissingField("push_data"))?;
        let tag = push_data
            .tag
            .as_ref()
            .ok_or(DriverError::MissingField("tag"))?;
        let repository = self
            .repository
            .as_ref()
            .ok_or(DriverError::MissingField("repository"))?;
        let repo_name = repository
            .repo_name
            .as_ref()
            .ok_or(DriverError::MissingField("repo_name"))?;

        Ok(PushedImage {
            repository: repo_name.clone(),
            tag: tag.clone(),
        })
    }
}

/// Extracts the `repo_name:tag` image reference announced by a push webhook body.
pub fn extract_pushed_image(payload: &Value) -> Result<PushedImage, DriverError> {
    InboundPayload::parse(payload)?.pushed_image()
}
