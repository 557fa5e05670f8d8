//! SeaORM entity models
//!
//! Read-side entities for the affiliation hierarchy

mod affiliation;
mod affiliation_calculation;
mod person;
mod work;

pub use affiliation::{
    Entity as AffiliationEntity,
    Model as AffiliationRow,
};

pub use affiliation_calculation::{
    Entity as AffiliationCalculationEntity,
    Model as AffiliationCalculation,
};

pub use person::{
    Entity as PersonEntity,
    Model as PersonRow,
};

pub use work::{
    Entity as WorkEntity,
    Model as WorkRow,
};
