// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discovery_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub task_name: String,
    pub base_url: String,
    pub source_type: String,
    pub tags: Json,
    pub depth: i32,
    pub max_pages: Option<i32>,
    pub strategy_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub strategy_contents: Option<String>,
    pub exclude_suffixes: Json,
    pub execution_interval: i64,
    pub next_execution_time: Option<ChronoDateTimeWithTimeZone>,
    pub last_execution_time: Option<ChronoDateTimeWithTimeZone>,
    pub is_active: bool,
    pub success_counts: i64,
    pub fail_counts: i64,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
