use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((7, 2)))", nullable)]
    pub discount: Option<Decimal>,
    pub author: String,
    /// Set to NULL when the owning user is deleted
    pub owner_id: Option<i32>,
    /// Mean of all relation rates, maintained by the rating aggregator.
    /// NULL while nobody has rated the book.
    #[sea_orm(column_type = "Decimal(Some((3, 2)))", nullable)]
    pub rating: Option<Decimal>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Owner,
    #[sea_orm(has_many = "super::user_book_relation::Entity")]
    UserRelations,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::user_book_relation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRelations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
