//! Multipart body assembly from the compact `key;options;key;options` spec.
//!
//! # Responsibilities
//! - Parse the spec into ordered part descriptors
//! - Pair each descriptor with its slice of the JSON body
//! - Build the `multipart/form-data` form sent upstream
//!
//! # Design Decisions
//! - Parts carry JSON text; `options` is passed through as the filename
//! - An array body supplies one element per part and must match in length
//! - Any other body is reused for every part

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Separator between spec tokens.
pub const SPEC_SEPARATOR: char = ';';

/// Content type of every part: the gateway only ever sends JSON text.
pub const PART_CONTENT_TYPE: &str = "application/json";

/// One `(key, options)` pair of the spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    pub name: String,
    pub options: Option<String>,
}

/// Parsed multipart spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartSpec {
    parts: Vec<PartDescriptor>,
}

/// A part ready to be appended to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPart {
    pub name: String,
    pub options: Option<String>,
    pub json: String,
}

impl MultipartSpec {
    /// Walk the tokens two at a time, stopping at the first empty key.
    pub fn parse(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split(SPEC_SEPARATOR).collect();
        let parts = tokens
            .chunks(2)
            .map_while(|pair| {
                let name = pair[0];
                if name.is_empty() {
                    return None;
                }
                Some(PartDescriptor {
                    name: name.to_string(),
                    options: pair.get(1).map(|o| o.to_string()),
                })
            })
            .collect();

        Self { parts }
    }

    pub fn parts(&self) -> &[PartDescriptor] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Pair each descriptor with its JSON text.
    pub fn plan(&self, body: &Value) -> GatewayResult<Vec<PlannedPart>> {
        if self.parts.is_empty() {
            return Err(GatewayError::InvalidMultipart);
        }

        let elements: Vec<&Value> = match body {
            Value::Array(items) if !items.is_empty() => {
                if items.len() != self.parts.len() {
                    return Err(GatewayError::MultipartBodyMismatch {
                        parts: self.parts.len(),
                        elements: items.len(),
                    });
                }
                items.iter().collect()
            }
            whole => vec![whole; self.parts.len()],
        };

        Ok(self
            .parts
            .iter()
            .zip(elements)
            .map(|(descriptor, element)| PlannedPart {
                name: descriptor.name.clone(),
                options: descriptor.options.clone(),
                json: element.to_string(),
            })
            .collect())
    }
}

impl PlannedPart {
    fn into_part(self) -> GatewayResult<(String, Part)> {
        let mut part = Part::text(self.json).mime_str(PART_CONTENT_TYPE)?;
        if let Some(options) = self.options.filter(|o| !o.is_empty()) {
            part = part.file_name(options);
        }
        Ok((self.name, part))
    }
}

/// Assemble the multipart form in plan order.
pub fn build_form(parts: Vec<PlannedPart>) -> GatewayResult<Form> {
    parts.into_iter().try_fold(Form::new(), |form, planned| {
        let (name, part) = planned.into_part()?;
        Ok(form.part(name, part))
    })
}
