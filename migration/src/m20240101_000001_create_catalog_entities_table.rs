use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CatalogEntities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CatalogEntities::Uid)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CatalogEntities::EntityRef)
                            .string_len(512)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CatalogEntities::Kind).string_len(64).not_null())
                    .col(
                        ColumnDef::new(CatalogEntities::Namespace)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CatalogEntities::Name).string_len(255).not_null())
                    .col(ColumnDef::new(CatalogEntities::Body).json().not_null())
                    .col(
                        ColumnDef::new(CatalogEntities::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CatalogEntities::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 按类型过滤的索引
        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_entities_kind")
                    .table(CatalogEntities::Table)
                    .col(CatalogEntities::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CatalogEntities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CatalogEntities {
    Table,
    Uid,
    EntityRef,
    Kind,
    Namespace,
    Name,
    Body,
    CreatedAt,
    UpdatedAt,
}
