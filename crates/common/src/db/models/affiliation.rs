//! Affiliation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// Ordered type records as JSONB array
    #[sea_orm(column_type = "JsonBinary")]
    pub types: Json,

    /// Declared relations as JSONB array
    #[sea_orm(column_type = "JsonBinary")]
    pub relations: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub logo: Option<String>,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::affiliation_calculation::Entity")]
    Calculation,
}

impl Related<super::affiliation_calculation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Calculation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
