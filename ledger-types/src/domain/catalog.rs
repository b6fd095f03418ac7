//! Catalog records owned by external collaborators.
//!
//! The ledger only reads these; it never creates, updates or deletes them.
//! They are referenced from wallets and transactions by id alone.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Blank ids are treated as absent references.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

catalog_id!(
    /// Identifier of a client in the client catalog.
    ClientId
);
catalog_id!(
    /// Identifier of a currency in the currency catalog.
    CurrencyId
);
catalog_id!(
    /// Identifier of an investment fund in the fund catalog.
    FundId
);

/// A client that may own wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
    /// Whether the client is active in the catalog
    pub active: bool,
}

impl Client {
    pub fn new(id: impl Into<ClientId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            active: true,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A currency wallets and funds can be denominated in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub name: String,
    /// ISO-like code, e.g. `USD`
    pub code: String,
}

impl Currency {
    pub fn new(id: impl Into<CurrencyId>, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.into(),
        }
    }
}

/// An investment fund transactions can be earmarked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentFund {
    pub id: FundId,
    pub name: String,
    pub category: String,
    pub currency_id: CurrencyId,
    /// Smallest amount a single investment may carry
    pub min_investment: Decimal,
    pub active: bool,
}

impl InvestmentFund {
    pub fn new(
        id: impl Into<FundId>,
        name: impl Into<String>,
        currency_id: impl Into<CurrencyId>,
        min_investment: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            currency_id: currency_id.into(),
            min_investment,
            active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}
