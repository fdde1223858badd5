//! Submissions, events and reports.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Submissions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Submissions::BarangayName).string_len(255).not_null())
                    .col(ColumnDef::new(Submissions::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Submissions::Stage).string_len(10).not_null())
                    .col(ColumnDef::new(Submissions::Tier).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Submissions::SuccessfulEventCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Submissions::MoaPath).text())
                    .col(ColumnDef::new(Submissions::MoaName).string_len(255))
                    .col(ColumnDef::new(Submissions::AgreementExpiresOn).date())
                    .col(ColumnDef::new(Submissions::ReviewedBy).uuid())
                    .col(ColumnDef::new(Submissions::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Submissions::ApprovedBy).uuid())
                    .col(ColumnDef::new(Submissions::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Submissions::RejectedBy).uuid())
                    .col(ColumnDef::new(Submissions::RejectedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Submissions::RejectionReason).text())
                    .col(ColumnDef::new(Submissions::RenewedBy).uuid())
                    .col(ColumnDef::new(Submissions::RenewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Submissions::TierUpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Submissions::AdminNotes).text())
                    .col(ColumnDef::new(Submissions::PreviousSubmissionId).uuid())
                    .col(ColumnDef::new(Submissions::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Submissions::Version).integer().not_null().default(1))
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_previous")
                            .from(Submissions::Table, Submissions::PreviousSubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_status")
                    .table(Submissions::Table)
                    .col(Submissions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::SubmissionId).uuid().not_null())
                    .col(ColumnDef::new(Events::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Events::ExpectedParticipants).integer().not_null())
                    .col(ColumnDef::new(Events::ProposalPath).text())
                    .col(ColumnDef::new(Events::ProposalName).string_len(255))
                    .col(ColumnDef::new(Events::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Events::Success).boolean())
                    .col(ColumnDef::new(Events::ReviewedBy).uuid())
                    .col(ColumnDef::new(Events::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Events::ApprovedBy).uuid())
                    .col(ColumnDef::new(Events::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Events::RejectedBy).uuid())
                    .col(ColumnDef::new(Events::RejectedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Events::RejectionReason).text())
                    .col(ColumnDef::new(Events::CompletedBy).uuid())
                    .col(ColumnDef::new(Events::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Events::CancelledBy).uuid())
                    .col(ColumnDef::new(Events::CancelledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Events::ClearedBy).uuid())
                    .col(ColumnDef::new(Events::ClearedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Events::AdminNotes).text())
                    .col(ColumnDef::new(Events::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Events::Version).integer().not_null().default(1))
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_submission")
                            .from(Events::Table, Events::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_submission")
                    .table(Events::Table)
                    .col(Events::SubmissionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reports::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reports::EventId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Reports::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Reports::CashAllocation)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reports::InKindExpenditure)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::TotalCost).decimal_len(14, 2).not_null())
                    .col(ColumnDef::new(Reports::ReportFilePath).text())
                    .col(ColumnDef::new(Reports::ReportFileName).string_len(255))
                    .col(ColumnDef::new(Reports::SubmittedBy).uuid())
                    .col(ColumnDef::new(Reports::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reports::PreApprovedBy).uuid())
                    .col(ColumnDef::new(Reports::PreApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reports::ReviewedBy).uuid())
                    .col(ColumnDef::new(Reports::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reports::ApprovedBy).uuid())
                    .col(ColumnDef::new(Reports::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reports::ReturnedBy).uuid())
                    .col(ColumnDef::new(Reports::ReturnedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reports::ReturnedReason).text())
                    .col(
                        ColumnDef::new(Reports::FirstClearanceStatus)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::FirstClearedBy).uuid())
                    .col(ColumnDef::new(Reports::FirstClearedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reports::FinalClearanceStatus)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::FinalClearedBy).uuid())
                    .col(ColumnDef::new(Reports::FinalClearedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reports::AdminNotes).text())
                    .col(ColumnDef::new(Reports::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Reports::Version).integer().not_null().default(1))
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reports::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_event")
                            .from(Reports::Table, Reports::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    BarangayName,
    Status,
    Stage,
    Tier,
    SuccessfulEventCount,
    MoaPath,
    MoaName,
    AgreementExpiresOn,
    ReviewedBy,
    ReviewedAt,
    ApprovedBy,
    ApprovedAt,
    RejectedBy,
    RejectedAt,
    RejectionReason,
    RenewedBy,
    RenewedAt,
    TierUpdatedAt,
    AdminNotes,
    PreviousSubmissionId,
    CreatedBy,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    SubmissionId,
    Title,
    ExpectedParticipants,
    ProposalPath,
    ProposalName,
    Status,
    Success,
    ReviewedBy,
    ReviewedAt,
    ApprovedBy,
    ApprovedAt,
    RejectedBy,
    RejectedAt,
    RejectionReason,
    CompletedBy,
    CompletedAt,
    CancelledBy,
    CancelledAt,
    ClearedBy,
    ClearedAt,
    AdminNotes,
    CreatedBy,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    EventId,
    Status,
    CashAllocation,
    InKindExpenditure,
    TotalCost,
    ReportFilePath,
    ReportFileName,
    SubmittedBy,
    SubmittedAt,
    PreApprovedBy,
    PreApprovedAt,
    ReviewedBy,
    ReviewedAt,
    ApprovedBy,
    ApprovedAt,
    ReturnedBy,
    ReturnedAt,
    ReturnedReason,
    FirstClearanceStatus,
    FirstClearedBy,
    FirstClearedAt,
    FinalClearanceStatus,
    FinalClearedBy,
    FinalClearedAt,
    AdminNotes,
    CreatedBy,
    Version,
    CreatedAt,
    UpdatedAt,
}
