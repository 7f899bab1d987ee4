//! Replication job record
//!
//! A [`Job`] is an identifier plus an open bag of caller-supplied attributes
//! (object name, target, status, ...). The record is kept exactly as it was
//! submitted so that the wire format reproduces the payload.

use crate::error::{ReplicationError, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Key under which the job identifier travels on the wire
pub const JOB_ID_KEY: &str = "job_id";

/// Open attribute mapping of a job
pub type Attributes = Map<String, Value>;

/// A single replication job
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Attributes")]
pub struct Job {
    /// Unique job ID, also present in `record`
    job_id: String,
    /// Wire record: every attribute plus `job_id`
    record: Attributes,
}

impl Job {
    /// Build a job from a raw JSON payload.
    ///
    /// The payload must be a non-empty JSON object. A string `job_id` in the
    /// payload is kept as the job's identity; otherwise a new UUID v4 is
    /// assigned.
    pub fn from_json(payload: Value) -> Result<Self> {
        match payload {
            Value::Object(attributes) => Self::from_attributes(attributes),
            Value::Null => Err(ReplicationError::validation("job payload is missing")),
            other => Err(ReplicationError::validation(format!(
                "job payload must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Build a job from an attribute mapping
    pub fn from_attributes(mut attributes: Attributes) -> Result<Self> {
        if attributes.is_empty() {
            return Err(ReplicationError::validation("job payload is empty"));
        }

        let job_id = match attributes.get(JOB_ID_KEY) {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::String(_)) => {
                return Err(ReplicationError::validation("job_id must not be blank"));
            }
            Some(other) => {
                return Err(ReplicationError::validation(format!(
                    "job_id must be a string, got {}",
                    json_type_name(other)
                )));
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                attributes.insert(JOB_ID_KEY.to_string(), Value::String(id.clone()));
                id
            }
        };

        Ok(Self {
            job_id,
            record: attributes,
        })
    }

    /// Build a job with a caller-chosen identifier.
    ///
    /// Any `job_id` already in `attributes` is replaced.
    pub fn with_id(job_id: impl Into<String>, mut attributes: Attributes) -> Result<Self> {
        let job_id = job_id.into();
        attributes.insert(JOB_ID_KEY.to_string(), Value::String(job_id));
        Self::from_attributes(attributes)
    }

    /// Job identifier
    pub fn id(&self) -> &str {
        &self.job_id
    }

    /// Look up a single attribute
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    /// Caller-supplied attributes, without `job_id`
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.record.iter().filter(|(key, _)| key.as_str() != JOB_ID_KEY)
    }

    /// JSON wire representation: all attributes plus `job_id`
    pub fn to_wire_format(&self) -> Value {
        Value::Object(self.record.clone())
    }
}

impl TryFrom<Attributes> for Job {
    type Error = ReplicationError;

    fn try_from(attributes: Attributes) -> Result<Self> {
        Self::from_attributes(attributes)
    }
}

impl Serialize for Job {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
