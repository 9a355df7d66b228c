//! Tour documents

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::repository::{parse_timestamp, Document, FieldViolation, MemoryCollection, Resource};

/// URL prefix under which tour images are served
pub const IMAGE_PREFIX: &str = "/img/tours/";

/// Fields returned by the top-5 aliases
pub const ALIAS_FIELDS: &str = "name,price,ratingsAverage,summary,difficulty";

/// Collection of tours
pub type Tours = MemoryCollection<Tour>;

fn default_ratings_average() -> Number {
    Number::from_f64(1.0).unwrap_or_else(|| Number::from(1))
}

fn default_ratings_quantity() -> Number {
    Number::from(0)
}

/// A bookable tour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub name: String,
    pub duration: Number,
    pub max_group_size: Number,
    pub difficulty: String,
    #[serde(default = "default_ratings_average")]
    pub ratings_average: Number,
    #[serde(default = "default_ratings_quantity")]
    pub ratings_quantity: Number,
    pub price: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<Number>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<String>,
}

impl Resource for Tour {
    const MODEL: &'static str = "Tour";
    const SINGULAR: &'static str = "tour";
    const PLURAL: &'static str = "tours";
    const REQUIRED: &'static [(&'static str, &'static str)] = &[
        ("name", "A tour must have a name"),
        ("duration", "A tour must have a duration"),
        ("maxGroupSize", "A tour must have a maxGroupSize"),
        ("difficulty", "A tour should have a difficulty"),
        ("price", "A tour must have a price"),
        ("summary", "A tour must have a description"),
        ("imageCover", "A tour must have a cover image"),
    ];
    const HIDDEN: &'static [&'static str] = &["createdAt"];
    const UNIQUE: &'static [&'static str] = &["name"];

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.summary = self.summary.trim().to_string();
        if let Some(description) = self.description.as_mut() {
            *description = description.trim().to_string();
        }
    }

    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if let Some(bad) = self
            .start_dates
            .iter()
            .find(|date| parse_timestamp(date).is_none())
        {
            violations.push(FieldViolation::new(
                "startDates",
                format!("Cast to date failed for value \"{}\"", bad),
            ));
        }
        violations
    }
}

fn public_image(name: &str) -> String {
    if name.starts_with('/') || name.contains("://") {
        name.to_string()
    } else {
        format!("{}{}", IMAGE_PREFIX, name)
    }
}

/// Rewrite bare image file names into the URLs they are served from
pub fn public_image_paths(doc: &mut Document) {
    if let Some(Value::String(cover)) = doc.get_mut("imageCover") {
        *cover = public_image(cover);
    }
    if let Some(Value::Array(images)) = doc.get_mut("images") {
        for image in images.iter_mut() {
            if let Value::String(name) = image {
                *name = public_image(name);
            }
        }
    }
}
