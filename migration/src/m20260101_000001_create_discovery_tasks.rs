// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DiscoveryTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscoveryTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::TaskName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DiscoveryTasks::BaseUrl).string().not_null())
                    .col(
                        ColumnDef::new(DiscoveryTasks::SourceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DiscoveryTasks::Tags).json().not_null())
                    .col(
                        ColumnDef::new(DiscoveryTasks::Depth)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(DiscoveryTasks::MaxPages).integer())
                    .col(ColumnDef::new(DiscoveryTasks::StrategyType).string())
                    .col(ColumnDef::new(DiscoveryTasks::StrategyContents).text())
                    .col(
                        ColumnDef::new(DiscoveryTasks::ExcludeSuffixes)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::ExecutionInterval)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::NextExecutionTime)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::LastExecutionTime)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::SuccessCounts)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::FailCounts)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveryTasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Due-task polling filters on both columns every tick
        manager
            .create_index(
                Index::create()
                    .name("idx_discovery_tasks_active_next")
                    .table(DiscoveryTasks::Table)
                    .col(DiscoveryTasks::IsActive)
                    .col(DiscoveryTasks::NextExecutionTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiscoveryTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DiscoveryTasks {
    Table,
    Id,
    TaskName,
    BaseUrl,
    SourceType,
    Tags,
    Depth,
    MaxPages,
    StrategyType,
    StrategyContents,
    ExcludeSuffixes,
    ExecutionInterval,
    NextExecutionTime,
    LastExecutionTime,
    IsActive,
    SuccessCounts,
    FailCounts,
    CreatedAt,
    UpdatedAt,
}
