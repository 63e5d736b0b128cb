use std::collections::HashSet;

use sea_orm::{Database, DatabaseConnection};

use engine::{
    AssignmentPolicy, AssignmentTarget, CreateAssociationCmd, CreateFeeCmd, Engine, EngineError,
    FeeCategory, MembershipStatus, MoneyCents, PayFeesCmd, PaymentStatus, RecordStatus,
    RegisterMemberCmd, ReviewMembershipCmd, UpdateFeeCmd, WithdrawCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn register(engine: &Engine, name: &str, phone: &str) -> Uuid {
    engine
        .register_member(RegisterMemberCmd::new(name, phone, "pw"))
        .await
        .unwrap()
        .id
}

/// One association whose creator plus `count` extra members are all active.
async fn association_with_members(engine: &Engine, count: usize) -> (Uuid, Uuid, Vec<Uuid>) {
    let creator = register(engine, "Abebe Kebede", "0911000000").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();

    let mut members = Vec::with_capacity(count);
    for i in 0..count {
        let member = register(
            engine,
            &format!("Member {}", i + 1),
            &format!("0911{:06}", i + 1),
        )
        .await;
        engine
            .join_association(association.id, member)
            .await
            .unwrap();
        engine
            .review_membership(ReviewMembershipCmd::new(
                association.id,
                member,
                creator,
                MembershipStatus::Active,
            ))
            .await
            .unwrap();
        members.push(member);
    }
    (association.id, creator, members)
}

fn monthly_dues(association_id: Uuid, creator: Uuid) -> CreateFeeCmd {
    CreateFeeCmd::new(
        association_id,
        creator,
        "Monthly dues",
        FeeCategory::MonthlyFee,
        MoneyCents::new(20_000),
    )
}

#[tokio::test]
async fn all_active_members_policy_fans_out() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 3).await;

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator))
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), members.len() + 1);
    assert!(
        outcome
            .assignments
            .iter()
            .all(|a| a.payment_status == PaymentStatus::NotPaid)
    );
    assert!(outcome.skipped.is_empty());

    let targets: HashSet<_> = outcome
        .assignments
        .iter()
        .filter_map(engine::FeeAssignment::member_id)
        .collect();
    assert_eq!(targets.len(), outcome.assignments.len());
}

#[tokio::test]
async fn supported_member_is_flagged_for_you() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator).supported_member(members[0]))
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), members.len() + 1);
    let for_you: Vec<_> = outcome
        .assignments
        .iter()
        .filter(|a| a.payment_status == PaymentStatus::ForYou)
        .collect();
    assert_eq!(for_you.len(), 1);
    assert_eq!(for_you[0].member_id(), Some(members[0]));
}

#[tokio::test]
async fn supported_member_outside_custom_list_is_appended() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;

    let outcome = engine
        .create_fee(
            monthly_dues(association_id, creator)
                .policy(AssignmentPolicy::CustomMemberList(vec![members[1]]))
                .supported_member(members[0]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), 2);
    assert_eq!(outcome.assignments[0].member_id(), Some(members[1]));
    assert_eq!(outcome.assignments[0].payment_status, PaymentStatus::NotPaid);
    assert_eq!(outcome.assignments[1].member_id(), Some(members[0]));
    assert_eq!(outcome.assignments[1].payment_status, PaymentStatus::ForYou);
}

#[tokio::test]
async fn custom_list_dedupes_and_reports_unknown_ids() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let ghost = Uuid::new_v4();

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator).policy(
            AssignmentPolicy::CustomMemberList(vec![members[0], members[0], ghost]),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.assignments[0].member_id(), Some(members[0]));
    assert_eq!(outcome.skipped, vec![ghost]);
}

#[tokio::test]
async fn no_one_policy_creates_no_assignments() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 2).await;

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator).policy(AssignmentPolicy::NoOne))
        .await
        .unwrap();

    assert!(outcome.assignments.is_empty());
    assert!(outcome.skipped.is_empty());
}

#[tokio::test]
async fn unknown_supported_member_is_invalid_target() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;

    let err = engine
        .create_fee(monthly_dues(association_id, creator).supported_member(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTarget("supported member not exists".to_string())
    );
}

#[tokio::test]
async fn update_fee_preserves_paid_rows() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 3).await;

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator).policy(
            AssignmentPolicy::CustomMemberList(vec![members[0], members[1]]),
        ))
        .await
        .unwrap();
    let fee_id = outcome.fee.id;

    let paid_assignment = outcome
        .assignments
        .iter()
        .find(|a| a.member_id() == Some(members[0]))
        .unwrap()
        .id;
    engine
        .pay_fees(PayFeesCmd::new(members[0], vec![paid_assignment], "cash"))
        .await
        .unwrap();

    let updated = engine
        .update_fee(
            UpdateFeeCmd::new(fee_id, creator)
                .amount(MoneyCents::new(30_000))
                .policy(AssignmentPolicy::CustomMemberList(vec![members[2]])),
        )
        .await
        .unwrap();
    assert_eq!(updated.fee.amount, MoneyCents::new(30_000));
    assert_eq!(updated.assignments.len(), 1);
    assert_eq!(updated.assignments[0].member_id(), Some(members[2]));

    let detail = engine.fee_detail(fee_id, creator).await.unwrap();
    assert_eq!(detail.assignments.len(), 2);
    let kept = detail
        .assignments
        .iter()
        .find(|row| row.assignment.member_id() == Some(members[0]))
        .unwrap();
    assert_eq!(kept.assignment.payment_status, PaymentStatus::Paid);
    assert!(
        detail
            .assignments
            .iter()
            .all(|row| row.assignment.member_id() != Some(members[1]))
    );
}

#[tokio::test]
async fn update_fee_rejects_withdrawal_fees() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;

    let withdrawal = engine
        .withdraw(WithdrawCmd::new(
            association_id,
            creator,
            "Hall rent",
            FeeCategory::Other,
            MoneyCents::new(50_000),
            AssignmentTarget::Association,
        ))
        .await
        .unwrap();

    let err = engine
        .update_fee(UpdateFeeCmd::new(withdrawal.fee.id, creator))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidStatus("not a deposit fee".to_string())
    );
}

#[tokio::test]
async fn deactivate_fee_is_idempotent_and_hides_it() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator))
        .await
        .unwrap();

    let disabled = engine
        .deactivate_fee(outcome.fee.id, creator)
        .await
        .unwrap();
    assert_eq!(disabled.status, RecordStatus::NotActive);

    let again = engine
        .deactivate_fee(outcome.fee.id, creator)
        .await
        .unwrap();
    assert_eq!(again.status, RecordStatus::NotActive);

    assert!(
        engine
            .list_fees(association_id, None, creator)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn create_fee_requires_committee() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, _creator, members) = association_with_members(&engine, 1).await;

    let err = engine
        .create_fee(monthly_dues(association_id, members[0]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("committee role required".to_string())
    );
}

#[tokio::test]
async fn fee_amount_must_be_positive() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;

    let err = engine
        .create_fee(CreateFeeCmd::new(
            association_id,
            creator,
            "Monthly dues",
            FeeCategory::MonthlyFee,
            MoneyCents::ZERO,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("fee amount must be > 0".to_string())
    );
}

#[tokio::test]
async fn list_fees_is_newest_first_and_skips_withdrawals() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;

    for name in ["January dues", "February dues", "March dues"] {
        engine
            .create_fee(CreateFeeCmd::new(
                association_id,
                creator,
                name,
                FeeCategory::MonthlyFee,
                MoneyCents::new(20_000),
            ))
            .await
            .unwrap();
    }
    engine
        .withdraw(WithdrawCmd::new(
            association_id,
            creator,
            "Hall rent",
            FeeCategory::Other,
            MoneyCents::new(50_000),
            AssignmentTarget::Association,
        ))
        .await
        .unwrap();

    let fees = engine
        .list_fees(association_id, Some(2), creator)
        .await
        .unwrap();
    assert_eq!(fees.len(), 2);
    assert_eq!(fees[0].name, "March dues");
    assert_eq!(fees[1].name, "February dues");
}

#[tokio::test]
async fn fee_detail_resolves_assigned_members() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;

    let outcome = engine
        .create_fee(monthly_dues(association_id, creator))
        .await
        .unwrap();

    let detail = engine
        .fee_detail(outcome.fee.id, members[0])
        .await
        .unwrap();
    assert_eq!(detail.fee.name, "Monthly dues");
    assert_eq!(detail.assignments.len(), 2);
    assert!(
        detail
            .assignments
            .iter()
            .all(|row| row.member.is_some())
    );
}
