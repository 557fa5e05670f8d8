//! Work (research product) entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "works")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub year: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub product_type: Option<String>,

    pub citations_count: i64,

    /// Authors with their affiliations at publication time
    #[sea_orm(column_type = "JsonBinary")]
    pub authors: Json,

    /// Research groups credited with the work
    #[sea_orm(column_type = "JsonBinary")]
    pub groups: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
