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
                    .table(DiscoveredUrls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscoveredUrls::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DiscoveredUrls::Origin).string().not_null())
                    .col(ColumnDef::new(DiscoveredUrls::Url).text().not_null())
                    .col(
                        ColumnDef::new(DiscoveredUrls::UrlPath)
                            .text()
                            .not_null()
                            .default("/"),
                    )
                    .col(
                        ColumnDef::new(DiscoveredUrls::DiscoveryType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveredUrls::SourceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DiscoveredUrls::Tags).json().not_null())
                    .col(
                        ColumnDef::new(DiscoveredUrls::Depth)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DiscoveredUrls::DiscoveredFrom).text())
                    .col(
                        ColumnDef::new(DiscoveredUrls::DiscoveryChannel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveredUrls::AuditStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveredUrls::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscoveredUrls::LastSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_discovered_urls_origin_url")
                    .table(DiscoveredUrls::Table)
                    .col(DiscoveredUrls::Origin)
                    .col(DiscoveredUrls::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discovered_urls_source_last_seen")
                    .table(DiscoveredUrls::Table)
                    .col(DiscoveredUrls::SourceType)
                    .col(DiscoveredUrls::LastSeenAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discovered_urls_origin_audit")
                    .table(DiscoveredUrls::Table)
                    .col(DiscoveredUrls::Origin)
                    .col(DiscoveredUrls::AuditStatus)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiscoveredUrls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DiscoveredUrls {
    Table,
    Id,
    Origin,
    Url,
    UrlPath,
    DiscoveryType,
    SourceType,
    Tags,
    Depth,
    DiscoveredFrom,
    DiscoveryChannel,
    AuditStatus,
    FirstSeenAt,
    LastSeenAt,
}
