use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::RecordId;
use crate::temporal::EpochMillis;

/// Menu classification shown as a badge on each posting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCategory {
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
    #[serde(rename = "budget")]
    Budget,
}

impl MenuCategory {
    pub const ALL: [MenuCategory; 3] = [Self::Veg, Self::NonVeg, Self::Budget];

    /// Wire name used in JSON and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veg => "veg",
            Self::NonVeg => "non-veg",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuCategory {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TypeError::InvalidMenuCategory(s.to_string()))
    }
}

/// Reference to an uploaded menu image.
///
/// `url` is what clients display; `id` is the blob-store handle needed to
/// delete the image later. A missing `id` means the image cannot be cleaned
/// up and deletion is skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default, alias = "publicId")]
    pub id: Option<String>,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: Some(id.into()),
        }
    }

    /// Blob-store id if present and non-blank.
    pub fn blob_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// A record as submitted to the store, before an identifier is assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub name: String,
    pub location: String,
    pub phone: String,
    pub menu_type: Option<MenuCategory>,
    pub menu_text: String,
    pub price: Option<String>,
    pub image: Option<ImageRef>,
    pub date: String,
    pub created_at: EpochMillis,
    pub expires_at: EpochMillis,
}

/// A posted menu entry.
///
/// `created_at` and `expires_at` are stamped once at insert and never
/// change. Whether a record is visible is derived purely from `expires_at`
/// and the current time; there is no stored deletion flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub location: String,
    pub phone: String,
    pub menu_type: Option<MenuCategory>,
    pub menu_text: String,
    pub price: Option<String>,
    pub image: Option<ImageRef>,
    pub date: String,
    pub created_at: EpochMillis,
    pub expires_at: EpochMillis,
}

impl Record {
    /// Attach a store-assigned identifier to a draft.
    pub fn from_draft(id: RecordId, draft: RecordDraft) -> Self {
        Self {
            id,
            name: draft.name,
            location: draft.location,
            phone: draft.phone,
            menu_type: draft.menu_type,
            menu_text: draft.menu_text,
            price: draft.price,
            image: draft.image,
            date: draft.date,
            created_at: draft.created_at,
            expires_at: draft.expires_at,
        }
    }

    /// `true` iff `now < expires_at`. The boundary instant itself is expired.
    pub fn is_active_at(&self, now: EpochMillis) -> bool {
        now.is_before(self.expires_at)
    }

    pub fn is_expired_at(&self, now: EpochMillis) -> bool {
        !self.is_active_at(now)
    }

    /// Blob-store id of the attached image, if any.
    pub fn image_blob_id(&self) -> Option<&str> {
        self.image.as_ref().and_then(ImageRef::blob_id)
    }
}

/// Human-readable time left before a record expires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remaining {
    pub text: String,
    pub urgent: bool,
}

/// A record decorated with its remaining time, as returned to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRecord {
    #[serde(flatten)]
    pub record: Record,
    pub remaining: Remaining,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(expires_at: u64) -> Record {
        Record {
            id: RecordId::new(),
            name: "Annapurna Mess".into(),
            location: "FC Road".into(),
            phone: "9800000000".into(),
            menu_type: Some(MenuCategory::Veg),
            menu_text: "Dal, rice, 3 chapati".into(),
            price: Some("Rs 80".into()),
            image: None,
            date: "2024-03-15".into(),
            created_at: EpochMillis::new(0),
            expires_at: EpochMillis::new(expires_at),
        }
    }

    #[test]
    fn menu_category_parse() {
        assert_eq!("veg".parse::<MenuCategory>().unwrap(), MenuCategory::Veg);
        assert_eq!("Non-Veg".parse::<MenuCategory>().unwrap(), MenuCategory::NonVeg);
        assert_eq!(" budget ".parse::<MenuCategory>().unwrap(), MenuCategory::Budget);
        assert!(matches!(
            "vegan".parse::<MenuCategory>(),
            Err(TypeError::InvalidMenuCategory(_))
        ));
    }

    #[test]
    fn menu_category_wire_names() {
        for cat in MenuCategory::ALL {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.as_str()));
        }
    }

    #[test]
    fn active_boundary_is_expired() {
        let r = sample(1_000);
        assert!(r.is_active_at(EpochMillis::new(999)));
        assert!(r.is_expired_at(EpochMillis::new(1_000)));
        assert!(r.is_expired_at(EpochMillis::new(1_001)));
    }

    #[test]
    fn image_blob_id_skips_blank_ids() {
        let mut r = sample(1);
        assert_eq!(r.image_blob_id(), None);

        r.image = Some(ImageRef {
            url: "http://x/a.png".into(),
            id: Some("  ".into()),
        });
        assert_eq!(r.image_blob_id(), None);

        r.image = Some(ImageRef::new("http://x/a.png", "blob-1"));
        assert_eq!(r.image_blob_id(), Some("blob-1"));
    }

    #[test]
    fn image_ref_accepts_public_id_alias() {
        let img: ImageRef =
            serde_json::from_value(json!({"url": "u", "publicId": "menus/abc"})).unwrap();
        assert_eq!(img.blob_id(), Some("menus/abc"));

        let img: ImageRef = serde_json::from_value(json!({"url": "u"})).unwrap();
        assert_eq!(img.id, None);
    }

    #[test]
    fn record_json_shape() {
        let r = sample(18_000_000);
        let v = serde_json::to_value(&r).unwrap();
        for key in [
            "id", "name", "location", "phone", "menuType", "menuText", "price", "image", "date",
            "createdAt", "expiresAt",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert_eq!(v["menuType"], "veg");
        assert_eq!(v["image"], serde_json::Value::Null);
        assert_eq!(v["expiresAt"], 18_000_000);
    }

    #[test]
    fn active_record_flattens() {
        let decorated = ActiveRecord {
            record: sample(10),
            remaining: Remaining {
                text: "Expired".into(),
                urgent: true,
            },
        };
        let v = serde_json::to_value(&decorated).unwrap();
        assert_eq!(v["name"], "Annapurna Mess");
        assert_eq!(v["remaining"]["urgent"], true);
    }

    #[test]
    fn from_draft_keeps_timestamps() {
        let r = sample(5);
        let draft = RecordDraft {
            name: r.name.clone(),
            location: r.location.clone(),
            phone: r.phone.clone(),
            menu_type: r.menu_type,
            menu_text: r.menu_text.clone(),
            price: r.price.clone(),
            image: None,
            date: r.date.clone(),
            created_at: r.created_at,
            expires_at: r.expires_at,
        };
        let rebuilt = Record::from_draft(r.id, draft);
        assert_eq!(rebuilt, r);
    }
}
