//! Create question and question_tag tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::Title).string_len(128).not_null())
                    .col(ColumnDef::new(Question::Text).text().not_null())
                    .col(ColumnDef::new(Question::AuthorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Question::CreationDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_author")
                            .from(Question::Table, Question::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: creation_date (for "new" ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_creation_date")
                    .table(Question::Table)
                    .col(Question::CreationDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_author_id")
                    .table(Question::Table)
                    .col(Question::AuthorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuestionTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QuestionTag::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(QuestionTag::TagId).string_len(32).not_null())
                    .primary_key(
                        Index::create()
                            .col(QuestionTag::QuestionId)
                            .col(QuestionTag::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_tag_question")
                            .from(QuestionTag::Table, QuestionTag::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_tag_tag")
                            .from(QuestionTag::Table, QuestionTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: tag_id (for tag search)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_tag_tag_id")
                    .table(QuestionTag::Table)
                    .col(QuestionTag::TagId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestionTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    Title,
    Text,
    AuthorId,
    CreationDate,
}

#[derive(Iden)]
enum QuestionTag {
    Table,
    QuestionId,
    TagId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
}
