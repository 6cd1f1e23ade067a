use messboard_types::{ImageRef, MenuCategory};
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// A record submission as it arrives from a client.
///
/// Every field is optional at this layer so that a missing field produces a
/// validation message rather than a deserialization failure.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub menu_type: Option<String>,
    pub menu_text: Option<String>,
    pub price: Option<String>,
    pub date: Option<String>,
    pub image: Option<ImageRef>,
}

/// Input that passed validation, with optional fields normalised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidInput {
    pub name: String,
    pub location: String,
    pub phone: String,
    pub menu_type: Option<MenuCategory>,
    pub menu_text: String,
    pub price: Option<String>,
    /// `None` when the client sent no posting date; the engine fills it in.
    pub date: Option<String>,
    pub image: Option<ImageRef>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RecordInput {
    /// Check required fields and normalise the optional ones.
    ///
    /// Required: `name`, `location`, `phone`, `menuText` (non-blank after
    /// trimming). Blank `price`, `menuType` and `date` count as absent.
    pub fn validate(self) -> EngineResult<ValidInput> {
        let name = non_blank(self.name);
        let location = non_blank(self.location);
        let phone = non_blank(self.phone);
        let menu_text = non_blank(self.menu_text);

        let missing: Vec<&str> = [
            ("name", name.is_none()),
            ("location", location.is_none()),
            ("phone", phone.is_none()),
            ("menuText", menu_text.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (Some(name), Some(location), Some(phone), Some(menu_text)) =
            (name, location, phone, menu_text)
        else {
            return Err(EngineError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        };

        let menu_type = non_blank(self.menu_type)
            .map(|raw| raw.parse::<MenuCategory>())
            .transpose()
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        if let Some(image) = &self.image {
            if image.url.trim().is_empty() {
                return Err(EngineError::Validation("image.url must not be empty".into()));
            }
        }

        Ok(ValidInput {
            name,
            location,
            phone,
            menu_type,
            menu_text,
            price: non_blank(self.price),
            date: non_blank(self.date),
            image: self.image,
        })
    }
}
