//! Create question_vote and answer_vote tables migration.
//!
//! Each table holds at most one row per (user, target) with a vote in -1..=1.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuestionVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuestionVote::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(QuestionVote::QuestionId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(QuestionVote::Vote)
                            .small_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(QuestionVote::Vote).between(-1, 1)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_vote_user")
                            .from(QuestionVote::Table, QuestionVote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_vote_question")
                            .from(QuestionVote::Table, QuestionVote::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, question_id) - one ledger row per user per question
        manager
            .create_index(
                Index::create()
                    .name("idx_question_vote_user_question")
                    .table(QuestionVote::Table)
                    .col(QuestionVote::UserId)
                    .col(QuestionVote::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_vote_question_id")
                    .table(QuestionVote::Table)
                    .col(QuestionVote::QuestionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AnswerVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnswerVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AnswerVote::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(AnswerVote::AnswerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(AnswerVote::Vote)
                            .small_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(AnswerVote::Vote).between(-1, 1)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_vote_user")
                            .from(AnswerVote::Table, AnswerVote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_vote_answer")
                            .from(AnswerVote::Table, AnswerVote::AnswerId)
                            .to(Answer::Table, Answer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, answer_id) - one ledger row per user per answer
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_vote_user_answer")
                    .table(AnswerVote::Table)
                    .col(AnswerVote::UserId)
                    .col(AnswerVote::AnswerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_answer_vote_answer_id")
                    .table(AnswerVote::Table)
                    .col(AnswerVote::AnswerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnswerVote::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuestionVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QuestionVote {
    Table,
    Id,
    UserId,
    QuestionId,
    Vote,
}

#[derive(Iden)]
enum AnswerVote {
    Table,
    Id,
    UserId,
    AnswerId,
    Vote,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
}
