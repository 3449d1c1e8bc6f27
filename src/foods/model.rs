use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Meal slot of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Meal {
    pub fn label(self) -> &'static str {
        match self {
            Meal::Breakfast => "Breakfast",
            Meal::Lunch => "Lunch",
            Meal::Dinner => "Dinner",
            Meal::Snack => "Snack",
        }
    }

    /// Value kept in the `foods.meal` column.
    pub fn db_value(self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Snack => "snack",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Meal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" | "มื้อเช้า" => Ok(Meal::Breakfast),
            "lunch" | "มื้อกลางวัน" => Ok(Meal::Lunch),
            "dinner" | "มื้อเย็น" => Ok(Meal::Dinner),
            "snack" | "ของว่าง" => Ok(Meal::Snack),
            other => anyhow::bail!("unknown meal {:?}", other),
        }
    }
}

impl TryFrom<String> for Meal {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Meal> for String {
    fn from(m: Meal) -> Self {
        m.label().to_string()
    }
}

/// One logged meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodEntry {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub meal: Meal,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Field values submitted by the add and edit forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodFields {
    pub name: String,
    pub meal: Meal,
    pub date: Date,
    pub image_url: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct FoodRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub meal: String,
    pub date: Date,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<FoodRecord> for FoodEntry {
    type Error = anyhow::Error;

    fn try_from(r: FoodRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            meal: r.meal.parse()?,
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            date: r.date,
            image_url: r.image_url,
            created_at: r.created_at,
        })
    }
}
