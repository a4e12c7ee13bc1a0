use common::error::{AppError, Res};
use serde::Deserialize;

/// Largest number of items accepted by one bulk request.
pub const MAX_BULK_ITEMS: usize = 20;

pub trait Validate {
    fn validate(&self) -> Res<()>;
}

/// Human readable name of a bulk item, echoed back in its result.
pub trait Labeled {
    fn label(&self) -> String;
}

pub fn ensure_id(field: &str, value: &str) -> Res<()> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "{} must be a numeric identifier",
            field
        )));
    }
    Ok(())
}

pub fn ensure_present(field: &str, value: &str) -> Res<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    pub account_id: String,
}

impl Validate for AccountQuery {
    fn validate(&self) -> Res<()> {
        ensure_id("accountId", &self.account_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQuery {
    pub property_id: String,
}

impl Validate for PropertyQuery {
    fn validate(&self) -> Res<()> {
        ensure_id("propertyId", &self.property_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerQuery {
    pub account_id: String,
    pub container_id: String,
}

impl Validate for ContainerQuery {
    fn validate(&self) -> Res<()> {
        ensure_id("accountId", &self.account_id)?;
        ensure_id("containerId", &self.container_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceQuery {
    pub account_id: String,
    pub container_id: String,
    pub workspace_id: String,
}

impl Validate for WorkspaceQuery {
    fn validate(&self) -> Res<()> {
        ensure_id("accountId", &self.account_id)?;
        ensure_id("containerId", &self.container_id)?;
        ensure_id("workspaceId", &self.workspace_id)
    }
}

/// Bulk request body: the parent resource fields next to an `items` array.
#[derive(Debug, Clone, Deserialize)]
pub struct Bulk<P, T> {
    #[serde(flatten)]
    pub parent: P,
    pub items: Vec<T>,
}

impl<P: Validate, T: Validate> Validate for Bulk<P, T> {
    fn validate(&self) -> Res<()> {
        self.parent.validate()?;
        if self.items.is_empty() {
            return Err(AppError::BadRequest("items must not be empty".to_string()));
        }
        if self.items.len() > MAX_BULK_ITEMS {
            return Err(AppError::BadRequest(format!(
                "At most {} items per request",
                MAX_BULK_ITEMS
            )));
        }
        self.items.iter().try_for_each(Validate::validate)
    }
}

/// Identifier of an existing resource, as used by delete and archive bodies.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl Validate for ResourceId {
    fn validate(&self) -> Res<()> {
        ensure_id("id", &self.0)
    }
}

impl Labeled for ResourceId {
    fn label(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_must_be_digits() {
        assert!(ensure_id("accountId", "123").is_ok());
        assert!(ensure_id("accountId", "").is_err());
        assert!(ensure_id("accountId", "12a").is_err());
        assert!(ensure_id("accountId", "accounts/1").is_err());
    }

    #[test]
    fn bulk_reads_parent_fields_beside_items() {
        let body: Bulk<PropertyQuery, ResourceId> =
            serde_json::from_value(json!({ "propertyId": "77", "items": ["1", "2"] })).unwrap();
        assert_eq!(body.parent.property_id, "77");
        assert_eq!(body.items.len(), 2);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn bulk_rejects_empty_and_oversized_bodies() {
        let empty = Bulk {
            parent: AccountQuery {
                account_id: "1".to_string(),
            },
            items: Vec::<ResourceId>::new(),
        };
        assert!(matches!(empty.validate(), Err(AppError::BadRequest(_))));

        let oversized = Bulk {
            parent: AccountQuery {
                account_id: "1".to_string(),
            },
            items: (0..=MAX_BULK_ITEMS)
                .map(|i| ResourceId(i.to_string()))
                .collect(),
        };
        assert!(matches!(oversized.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn bulk_validates_every_item() {
        let body = Bulk {
            parent: AccountQuery {
                account_id: "1".to_string(),
            },
            items: vec![ResourceId("5".to_string()), ResourceId("x".to_string())],
        };
        assert!(body.validate().is_err());
    }
}
