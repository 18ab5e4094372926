//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "pairs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::candles::Entity")]
    Candles,
}

impl Related<super::candles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Candles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
