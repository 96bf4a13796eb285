//! Merchant and product category enums.
//!
//! Both sets are closed: the catalog only ever contains these values, and
//! query filters carrying anything else match nothing.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error parsing a category from its string form.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CategoryError {
    /// The input names no known category.
    #[error("unknown category: {0}")]
    Unknown(String),
}

/// Merchant category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MerchantCategory {
    SmallRestaurant,
    MediumRestaurant,
    LargeRestaurant,
    MerchandiseRestaurant,
    BoothKiosk,
    ConvenienceStore,
}

impl MerchantCategory {
    /// All merchant categories, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::SmallRestaurant,
        Self::MediumRestaurant,
        Self::LargeRestaurant,
        Self::MerchandiseRestaurant,
        Self::BoothKiosk,
        Self::ConvenienceStore,
    ];

    /// Parse the wire form (e.g. `"SmallRestaurant"`).
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::Unknown`] for anything outside the closed set.
    pub fn parse(s: &str) -> Result<Self, CategoryError> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CategoryError::Unknown(s.to_owned()))
    }

    /// The wire form of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmallRestaurant => "SmallRestaurant",
            Self::MediumRestaurant => "MediumRestaurant",
            Self::LargeRestaurant => "LargeRestaurant",
            Self::MerchandiseRestaurant => "MerchandiseRestaurant",
            Self::BoothKiosk => "BoothKiosk",
            Self::ConvenienceStore => "ConvenienceStore",
        }
    }
}

impl fmt::Display for MerchantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MerchantCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Beverage,
    Food,
    Snack,
    Condiments,
    Additions,
}

impl ProductCategory {
    /// All product categories, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Beverage,
        Self::Food,
        Self::Snack,
        Self::Condiments,
        Self::Additions,
    ];

    /// Parse the wire form (e.g. `"Beverage"`).
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::Unknown`] for anything outside the closed set.
    pub fn parse(s: &str) -> Result<Self, CategoryError> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CategoryError::Unknown(s.to_owned()))
    }

    /// The wire form of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beverage => "Beverage",
            Self::Food => "Food",
            Self::Snack => "Snack",
            Self::Condiments => "Condiments",
            Self::Additions => "Additions",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
