use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product as carried by lifecycle events.
///
/// Delete events only carry the identifier, so `name` and `price` are
/// optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl Product {
    /// Identifier-only product, as sent for deletions.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            price: None,
        }
    }
}

/// Lifecycle action attached to a [`ProductMessage`].
///
/// # Examples
///
/// ```
/// use burstwatch_common::types::ProductAction;
///
/// let action: ProductAction = "delete".parse().unwrap();
/// assert_eq!(action, ProductAction::Delete);
/// assert_eq!(action.to_string(), "delete");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductAction {
    Add,
    Delete,
}

impl std::fmt::Display for ProductAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductAction::Add => write!(f, "add"),
            ProductAction::Delete => write!(f, "delete"),
        }
    }
}

impl std::str::FromStr for ProductAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(ProductAction::Add),
            "delete" => Ok(ProductAction::Delete),
            _ => Err(format!("unknown product action: {s}")),
        }
    }
}

/// One product lifecycle event as delivered to the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMessage {
    pub product: Product,
    pub action: ProductAction,
}

impl ProductMessage {
    pub fn new(product: Product, action: ProductAction) -> Self {
        Self { product, action }
    }

    /// The entity key events are grouped under: the product name.
    ///
    /// Returns `None` when the message carries no usable name (e.g. a
    /// delete, which only has the product id).
    ///
    /// # Examples
    ///
    /// ```
    /// use burstwatch_common::types::{Product, ProductAction, ProductMessage};
    ///
    /// let msg = ProductMessage::new(Product::with_id("42"), ProductAction::Delete);
    /// assert_eq!(msg.entity_key(), None);
    /// ```
    pub fn entity_key(&self) -> Option<&str> {
        self.product
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// An alert raised when a key bursts past its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstAlert {
    pub id: String,
    /// Entity key (product name) that burst
    pub key: String,
    /// Event count for the key at the time of the alert
    pub count: u64,
    pub threshold: i64,
    pub window_secs: i64,
    pub triggered_at: DateTime<Utc>,
}

impl BurstAlert {
    /// Operator-facing alert text.
    pub fn message(&self) -> String {
        format!(
            "ALERT!: Product '{}' has been ordered more than threshold {}; {} times within the last {} seconds!",
            self.key, self.threshold, self.count, self.window_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_message_deserializes_from_wire_shape() {
        let raw = r#"{"product":{"id":"p-1","name":"kettle","price":19.5},"action":"add"}"#;
        let msg: ProductMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.action, ProductAction::Add);
        assert_eq!(msg.product.price, Some(19.5));
        assert_eq!(msg.entity_key(), Some("kettle"));
    }

    #[test]
    fn delete_message_without_name_has_no_key() {
        let raw = r#"{"product":{"id":"p-1"},"action":"delete"}"#;
        let msg: ProductMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.product, Product::with_id("p-1"));
        assert!(msg.entity_key().is_none());
    }

    #[test]
    fn blank_name_has_no_key() {
        let mut product = Product::with_id("p-2");
        product.name = Some("   ".into());
        let msg = ProductMessage::new(product, ProductAction::Add);
        assert!(msg.entity_key().is_none());
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!("update".parse::<ProductAction>().is_err());
        assert_eq!("ADD".parse::<ProductAction>(), Ok(ProductAction::Add));
    }

    #[test]
    fn alert_message_names_key_and_counts() {
        let alert = BurstAlert {
            id: "1".into(),
            key: "kettle".into(),
            count: 4,
            threshold: 3,
            window_secs: 5,
            triggered_at: Utc::now(),
        };
        assert_eq!(
            alert.message(),
            "ALERT!: Product 'kettle' has been ordered more than threshold 3; 4 times within the last 5 seconds!"
        );
    }
}
