use crate::error::{Error, Result};
use crate::record::{Record, RecordId};
use crate::schema::{Field, FieldType, OrderBy, Schema, SortDirection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Catalog category of a menu item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuCategory {
    Appetizers,
    Salads,
    Entrees,
    Sides,
    Desserts,
    Breakfast,
    Lunch,
    Beverages,
}

impl MenuCategory {
    pub const ALL: [MenuCategory; 8] = [
        MenuCategory::Appetizers,
        MenuCategory::Salads,
        MenuCategory::Entrees,
        MenuCategory::Sides,
        MenuCategory::Desserts,
        MenuCategory::Breakfast,
        MenuCategory::Lunch,
        MenuCategory::Beverages,
    ];

    pub const NAMES: &'static [&'static str] = &[
        "appetizers",
        "salads",
        "entrees",
        "sides",
        "desserts",
        "breakfast",
        "lunch",
        "beverages",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Appetizers => "appetizers",
            MenuCategory::Salads => "salads",
            MenuCategory::Entrees => "entrees",
            MenuCategory::Sides => "sides",
            MenuCategory::Desserts => "desserts",
            MenuCategory::Breakfast => "breakfast",
            MenuCategory::Lunch => "lunch",
            MenuCategory::Beverages => "beverages",
        }
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MenuCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::ValidationError(format!("Unknown menu category: {}", s)))
    }
}

/// A catalog entry with a per-unit price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name")]
    pub name: String,
    pub category: MenuCategory,
    pub price: Decimal,
    /// Pricing unit label, e.g. "per person" or "per dozen".
    pub unit: String,
    pub dietary: Vec<String>,
    pub description: String,
}

impl MenuItem {
    /// New unsaved item; the store assigns the id on create.
    pub fn new(name: impl Into<String>, category: MenuCategory, price: Decimal) -> Self {
        MenuItem {
            id: 0,
            name: name.into(),
            category,
            price,
            unit: "per person".to_string(),
            dietary: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_dietary<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial update of a menu item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemPatch {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<MenuCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub static MENU_ITEM_SCHEMA: Schema = Schema {
    kind: "menu_item",
    fields: &[
        Field::required("Name", FieldType::Text),
        Field::required("category", FieldType::Choice(MenuCategory::NAMES)),
        Field::required("price", FieldType::Amount),
        Field::required("unit", FieldType::Text),
        Field::required("dietary", FieldType::TextList),
        Field::required("description", FieldType::Text),
    ],
    order_by: OrderBy {
        field: "category",
        direction: SortDirection::Asc,
    },
};

impl Record for MenuItem {
    type Patch = MenuItemPatch;

    fn schema() -> &'static Schema {
        &MENU_ITEM_SCHEMA
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &MenuItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(unit) = &patch.unit {
            self.unit = unit.clone();
        }
        if let Some(dietary) = &patch.dietary {
            self.dietary = dietary.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
    }

    /// Ascending by category label.
    fn canonical_order(a: &Self, b: &Self) -> Ordering {
        a.category.as_str().cmp(b.category.as_str())
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ValidationError("menu_item: name is required".into()));
        }
        if self.price.is_sign_negative() {
            return Err(Error::ValidationError(format!(
                "menu_item: price must not be negative, got {}",
                self.price
            )));
        }
        Ok(())
    }
}
