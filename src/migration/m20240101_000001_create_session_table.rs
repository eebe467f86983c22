use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HttpSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HttpSessions::Id)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HttpSessions::Data).binary().not_null())
                    .col(
                        ColumnDef::new(HttpSessions::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_http_sessions_expiry_date")
                    .table(HttpSessions::Table)
                    .col(HttpSessions::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HttpSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HttpSessions {
    Table,
    Id,
    Data,
    ExpiryDate,
}
