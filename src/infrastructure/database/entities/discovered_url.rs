// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discovered_urls")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub origin: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub url_path: String,
    pub discovery_type: String,
    pub source_type: String,
    pub tags: Json,
    pub depth: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub discovered_from: Option<String>,
    pub discovery_channel: String,
    pub audit_status: String,
    pub first_seen_at: ChronoDateTimeWithTimeZone,
    pub last_seen_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
