use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TennisSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TennisSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TennisSessions::Title)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TennisSessions::Content).text().not_null())
                    .col(
                        ColumnDef::new(TennisSessions::Created)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TennisSessions::Expires)
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
                    .name("idx_tennis_sessions_created")
                    .table(TennisSessions::Table)
                    .col(TennisSessions::Created)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TennisSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TennisSessions {
    Table,
    Id,
    Title,
    Content,
    Created,
    Expires,
}
